use std::time::Duration;

use crate::api::controller_dto::ControllerConfigDto;
use crate::domain::flow::flow::Tier;
use crate::error::{Error, Result};

/// Number of consecutive backups to provision for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupPolicy {
    pub tier: Tier,
    pub count: u32,
}

/// Validated controller tunables.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub check_interval: Duration,

    /// Ticks without traffic before an active subflow fails over.
    pub threshold_fail: u32,

    /// Ticks a failed-over subflow waits before it is put back in service.
    pub threshold_recover: u32,

    pub label_offset: u32,
    pub backup_policy: Vec<BackupPolicy>,
    pub allow_degraded: bool,
    pub shuffle_candidates: bool,
    pub splits_override: Option<u32>,

    pub device_timeout: Duration,
    pub device_retries: u32,
    pub retry_backoff: Duration,
    pub breaker_threshold: u32,
    pub breaker_cooldown_ms: i64,

    /// CSV file receiving failover, recovery and reset events.
    pub event_log: Option<String>,
}

impl ControllerConfig {
    /// `floor(time / interval)`, but at least one tick.
    fn ticks(time_ms: u64, interval_ms: u64) -> u32 {
        u32::try_from(time_ms / interval_ms).unwrap_or(u32::MAX).max(1)
    }

    /// Gold before silver before bronze, matching the placement order.
    pub fn backup_policy_in_priority_order(&self) -> Vec<BackupPolicy> {
        let mut policy = self.backup_policy.clone();
        policy.sort_by(|a, b| b.tier.cmp(&a.tier));
        policy
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        let dto = ControllerConfigDto::default();
        ControllerConfig {
            check_interval: Duration::from_millis(dto.check_interval_ms),
            threshold_fail: Self::ticks(dto.failure_time_ms, dto.check_interval_ms),
            threshold_recover: Self::ticks(dto.check_time_ms, dto.check_interval_ms),
            label_offset: dto.label_offset,
            backup_policy: vec![BackupPolicy { tier: Tier::Gold, count: 5 }, BackupPolicy { tier: Tier::Silver, count: 3 }],
            allow_degraded: dto.allow_degraded,
            shuffle_candidates: dto.shuffle_candidates,
            splits_override: None,
            device_timeout: Duration::from_millis(dto.device_timeout_ms),
            device_retries: dto.device_retries,
            retry_backoff: Duration::from_millis(dto.retry_backoff_ms),
            breaker_threshold: dto.breaker_threshold,
            breaker_cooldown_ms: dto.breaker_cooldown_ms as i64,
            event_log: None,
        }
    }
}

impl TryFrom<ControllerConfigDto> for ControllerConfig {
    type Error = Error;

    fn try_from(dto: ControllerConfigDto) -> Result<Self> {
        if dto.check_interval_ms == 0 {
            return Err(Error::ConfigurationError("checkIntervalMs must be positive".to_string()));
        }
        if dto.breaker_threshold == 0 {
            return Err(Error::ConfigurationError("breakerThreshold must be positive".to_string()));
        }
        if dto.splits_override == Some(0) {
            return Err(Error::ConfigurationError("splitsOverride must be positive when set".to_string()));
        }

        let mut backup_policy: Vec<BackupPolicy> = Vec::new();
        for entry in dto.backup_policy {
            let tier = Tier::from_tos(entry.tos);
            if backup_policy.iter().any(|p| p.tier == tier) {
                return Err(Error::ConfigurationError(format!("backupPolicy lists tier {} twice", tier)));
            }
            backup_policy.push(BackupPolicy { tier, count: entry.count });
        }

        Ok(ControllerConfig {
            check_interval: Duration::from_millis(dto.check_interval_ms),
            threshold_fail: Self::ticks(dto.failure_time_ms, dto.check_interval_ms),
            threshold_recover: Self::ticks(dto.check_time_ms, dto.check_interval_ms),
            label_offset: dto.label_offset,
            backup_policy,
            allow_degraded: dto.allow_degraded,
            shuffle_candidates: dto.shuffle_candidates,
            splits_override: dto.splits_override,
            device_timeout: Duration::from_millis(dto.device_timeout_ms),
            device_retries: dto.device_retries,
            retry_backoff: Duration::from_millis(dto.retry_backoff_ms),
            breaker_threshold: dto.breaker_threshold,
            breaker_cooldown_ms: i64::try_from(dto.breaker_cooldown_ms).unwrap_or(i64::MAX),
            event_log: dto.event_log,
        })
    }
}
