use std::fmt;

use crate::api::traffic_dto::FlowDto;
use crate::domain::utils::id::NodeId;
use crate::error::{Error, Result};

pub const GOLD_TOS: u8 = 128;
pub const SILVER_TOS: u8 = 64;

/// Priority class of a flow.
///
/// The order is significant: a higher tier only competes with traffic of its own tier or above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
}

impl Tier {
    /// Classifies a flow's ToS byte: exactly 128 is gold, exactly 64 is silver, everything else is bronze.
    pub fn from_tos(tos: u8) -> Self {
        match tos {
            GOLD_TOS => Tier::Gold,
            SILVER_TOS => Tier::Silver,
            _ => Tier::Bronze,
        }
    }

    /// Default number of subflows for a flow of `rate_mbps`.
    ///
    /// Gold is split into ~0.33 Mbps units, silver into ~0.5 Mbps units and bronze into 1 Mbps units.
    pub fn default_splits(&self, rate_mbps: f64) -> u32 {
        let units_per_mbps = match self {
            Tier::Gold => 3,
            Tier::Silver => 2,
            Tier::Bronze => 1,
        };

        let rounded = rate_mbps.round().max(0.0) as u32;
        (rounded * units_per_mbps).max(1)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Gold => write!(f, "gold"),
            Tier::Silver => write!(f, "silver"),
            Tier::Bronze => write!(f, "bronze"),
        }
    }
}

/// A classified flow of the traffic matrix. Read-only input of the placement.
#[derive(Debug, Clone, PartialEq)]
pub struct Flow {
    pub source: NodeId,
    pub destination: NodeId,
    pub tos: u8,
    pub tier: Tier,
    /// Requested rate in bit/s.
    pub rate_bps: i64,
}

impl Flow {
    pub fn new(source: impl Into<String>, destination: impl Into<String>, tos: u8, rate_bps: i64) -> Self {
        Flow { source: NodeId::new(source), destination: NodeId::new(destination), tos, tier: Tier::from_tos(tos), rate_bps }
    }

    pub fn rate_mbps(&self) -> f64 {
        self.rate_bps as f64 / 1_000_000.0
    }

    /// Number of subflows this flow is split into, unless `splits_override` asks for a positive count.
    pub fn n_splits(&self, splits_override: Option<u32>) -> u32 {
        match splits_override {
            Some(n) if n > 0 => n,
            _ => self.tier.default_splits(self.rate_mbps()),
        }
    }
}

impl TryFrom<FlowDto> for Flow {
    type Error = Error;

    fn try_from(dto: FlowDto) -> Result<Self> {
        let tos = dto
            .tos
            .trim()
            .parse::<u8>()
            .map_err(|_| Error::ConfigurationError(format!("Flow {} -> {} has invalid tos '{}'", dto.src, dto.dst, dto.tos)))?;

        let rate_bps = parse_rate(&dto.rate)?;

        Ok(Flow::new(dto.src, dto.dst, tos, rate_bps))
    }
}

/// Parses a rate with a trailing unit character (`K`, `M` or `G`, case-insensitive) into bit/s.
///
/// `"4M"` yields `4_000_000`, `"0.5m"` yields `500_000`.
pub fn parse_rate(rate: &str) -> Result<i64> {
    let rate = rate.trim();
    let invalid = || Error::ConfigurationError(format!("Invalid rate '{}'", rate));

    let unit = rate.chars().last().ok_or_else(invalid)?;
    let scale = match unit.to_ascii_uppercase() {
        'K' => 1e3,
        'M' => 1e6,
        'G' => 1e9,
        _ => return Err(invalid()),
    };

    let value: f64 = rate[..rate.len() - unit.len_utf8()].trim().parse().map_err(|_| invalid())?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid());
    }

    Ok((value * scale).round() as i64)
}

/// Splits flows into (gold, silver, bronze) groups, keeping input order inside each group.
pub fn group_flows_by_tier(flows: &[Flow]) -> (Vec<Flow>, Vec<Flow>, Vec<Flow>) {
    let mut gold = Vec::new();
    let mut silver = Vec::new();
    let mut bronze = Vec::new();

    for flow in flows {
        match flow.tier {
            Tier::Gold => gold.push(flow.clone()),
            Tier::Silver => silver.push(flow.clone()),
            Tier::Bronze => bronze.push(flow.clone()),
        }
    }

    (gold, silver, bronze)
}
