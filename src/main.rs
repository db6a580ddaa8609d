use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use mpls_te_controller::domain::clock::clock::SystemClock;
use mpls_te_controller::domain::control_plane::controller::Controller;
use mpls_te_controller::domain::device::fabric::SwitchFabric;
use mpls_te_controller::domain::topology::topology::TopologyView;
use mpls_te_controller::{load_inputs, logger};

#[derive(Parser, Debug)]
#[command(name = "mpls-te-controller")]
#[command(about = "MPLS traffic-engineering controller: places flows, provisions backups and watches for link failures", long_about = None)]
struct Args {
    /// Topology JSON document
    #[arg(long)]
    topo: String,

    /// Traffic matrix (CSV with src, dst, tos and rate columns)
    #[arg(long)]
    traffic: String,

    /// Controller configuration JSON document
    #[arg(long)]
    config: Option<String>,

    /// Program in-memory switches instead of real devices
    #[arg(long)]
    dry_run: bool,

    /// Stop the failure monitor after this many seconds instead of waiting for Ctrl-C
    #[arg(long)]
    run_for_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init();

    let inputs = load_inputs(&args.topo, &args.traffic, args.config.as_deref())?;

    if !args.dry_run {
        anyhow::bail!("No device transport is available in this build; rerun with --dry-run to program simulated switches.");
    }

    let topology: Arc<dyn TopologyView> = Arc::new(inputs.topology);
    let (fabric, _switches) = SwitchFabric::simulated(topology.as_ref());
    log::info!("Dry run: programming {} simulated switches.", fabric.len());

    let mut controller = Controller::new(topology, fabric, inputs.config, SystemClock::shared());
    controller.setup(&inputs.flows).await?;

    let monitor = controller.into_monitor()?;
    let cancel = CancellationToken::new();
    let stop = cancel.clone();
    let run_for = args.run_for_secs.map(Duration::from_secs);

    tokio::spawn(async move {
        match run_for {
            Some(duration) => {
                tokio::select! {
                    _ = tokio::time::sleep(duration) => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            None => {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    log::error!("Cannot listen for Ctrl-C: {}", e);
                    return;
                }
            }
        }
        stop.cancel();
    });

    let table = monitor.run(cancel).await;
    let active = table.iter().filter(|s| s.active).count();
    log::info!("Exiting with {} subflows, {} forwarding.", table.len(), active);

    Ok(())
}
