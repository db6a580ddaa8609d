use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct BackupPolicyDto {
    pub tos: u8,
    pub count: u32,
}

/// Tunables of the control loop. Every field is optional in the JSON document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControllerConfigDto {
    pub check_interval_ms: u64,
    pub failure_time_ms: u64,
    pub check_time_ms: u64,
    pub label_offset: u32,
    pub backup_policy: Vec<BackupPolicyDto>,
    pub allow_degraded: bool,
    pub shuffle_candidates: bool,
    pub splits_override: Option<u32>,
    pub device_timeout_ms: u64,
    pub device_retries: u32,
    pub retry_backoff_ms: u64,
    pub breaker_threshold: u32,
    pub breaker_cooldown_ms: u64,
    pub event_log: Option<String>,
}

impl Default for ControllerConfigDto {
    fn default() -> Self {
        Self {
            check_interval_ms: 250,
            failure_time_ms: 500,
            check_time_ms: 10_000,
            label_offset: 16,
            backup_policy: vec![BackupPolicyDto { tos: 128, count: 5 }, BackupPolicyDto { tos: 64, count: 3 }],
            allow_degraded: true,
            shuffle_candidates: false,
            splits_override: None,
            device_timeout_ms: 1_000,
            device_retries: 2,
            retry_backoff_ms: 50,
            breaker_threshold: 3,
            breaker_cooldown_ms: 5_000,
            event_log: None,
        }
    }
}
