use chrono::Local;
use fern::Dispatch;
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use std::fs;
use std::path::PathBuf;

const DEFAULT_LOG_DIR: &str = "logs";
const LOG_FILE: &str = "controller.log";

/// Overrides the directory of the log file.
const LOG_DIR_ENV: &str = "CONTROLLER_LOG_DIR";

/// Crates whose debug output drowns the control loop.
const QUIET_TARGETS: [&str; 3] = ["serde", "tokio", "tokio_util"];

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/// Initializes the global logger.
///
/// Call once at the start of `main`. The level comes from `RUST_LOG` (default `info`);
/// `RUST_LOG=debug` additionally prints every device call.
/// Records go to stderr (coloured) and to `controller.log` in `$CONTROLLER_LOG_DIR` or `logs/`.
pub fn init() {
    let log_dir = PathBuf::from(std::env::var(LOG_DIR_ENV).unwrap_or_else(|_| DEFAULT_LOG_DIR.to_string()));
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("Failed to create log directory at '{}': {}", log_dir.display(), e);
    }
    let log_file_path = log_dir.join(LOG_FILE);

    let level = std::env::var("RUST_LOG").ok().and_then(|level| level.parse::<LevelFilter>().ok()).unwrap_or(LevelFilter::Info);

    let mut dispatch = Dispatch::new().level(level);
    for target in QUIET_TARGETS {
        dispatch = dispatch.level_for(target, LevelFilter::Warn);
    }

    let colors = ColoredLevelConfig::new().error(Color::Red).warn(Color::Yellow).info(Color::Green).debug(Color::Blue).trace(Color::BrightBlack);
    dispatch = dispatch.chain(
        Dispatch::new()
            .format(move |out, message, record| out.finish(format_args!("[{} {} {}] {}", timestamp(), colors.color(record.level()), record.target(), message)))
            .chain(std::io::stderr()),
    );

    match fern::log_file(&log_file_path) {
        Ok(file) => {
            dispatch = dispatch.chain(
                Dispatch::new()
                    .format(|out, message, record| out.finish(format_args!("[{} {} {}] {}", timestamp(), record.level(), record.target(), message)))
                    .chain(file),
            );
        }
        Err(e) => eprintln!("Failed to open log file '{}': {}; logging to the console only.", log_file_path.display(), e),
    }

    if let Err(e) = dispatch.apply() {
        eprintln!("Failed to apply logger configuration: {}", e);
        return;
    }

    log::info!("Logger initialized. Logging to console and '{}'.", log_file_path.display());
}
