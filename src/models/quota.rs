use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use crate::errors::TextockError;

pub const FREE_TIER_LIMIT: u32 = 30;
pub const PREMIUM_TIER_LIMIT: u32 = 100;
pub const ENTERPRISE_TIER_LIMIT: u32 = 1000;

/// Remaining count at or below which the usage message turns into a countdown.
const LOW_REMAINING_THRESHOLD: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum QuotaTier {
    #[default]
    Free,
    Premium,
    Enterprise,
}

impl QuotaTier {
    pub fn limit(&self) -> u32 {
        match self {
            QuotaTier::Free => FREE_TIER_LIMIT,
            QuotaTier::Premium => PREMIUM_TIER_LIMIT,
            QuotaTier::Enterprise => ENTERPRISE_TIER_LIMIT,
        }
    }
}

/// Only the free tier is active.
pub fn current_limit() -> u32 {
    QuotaTier::Free.limit()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageStatus {
    Normal,
    Caution,
    Warning,
    Critical,
}

impl Display for UsageStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UsageStatus::Normal => write!(f, "normal"),
            UsageStatus::Caution => write!(f, "caution"),
            UsageStatus::Warning => write!(f, "warning"),
            UsageStatus::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaSnapshot {
    pub current: u32,
    pub limit: u32,
}

impl QuotaSnapshot {
    pub fn new(current: u32, limit: u32) -> Self {
        Self { current, limit }
    }

    pub fn for_count(current: usize) -> Self {
        Self::new(u32::try_from(current).unwrap_or(u32::MAX), current_limit())
    }

    pub fn percentage(&self) -> f64 {
        if self.limit == 0 {
            return 100.0;
        }
        f64::from(self.current) / f64::from(self.limit) * 100.0
    }

    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.current)
    }

    pub fn reached_limit(&self) -> bool {
        self.current >= self.limit
    }

    pub fn status(&self) -> UsageStatus {
        let used = u64::from(self.current) * 100;
        let at = |percent: u64| used >= u64::from(self.limit) * percent;

        if at(100) {
            UsageStatus::Critical
        } else if at(80) {
            UsageStatus::Warning
        } else if at(60) {
            UsageStatus::Caution
        } else {
            UsageStatus::Normal
        }
    }

    pub fn message(&self) -> String {
        match self.remaining() {
            0 => format!("Template limit reached ({} templates)", self.limit),
            remaining if remaining <= LOW_REMAINING_THRESHOLD => {
                format!("{} more templates can be created", remaining)
            }
            _ => format!("{}/{} templates in use", self.current, self.limit),
        }
    }

    pub fn ensure_can_create(&self) -> Result<(), TextockError> {
        if self.reached_limit() {
            return Err(TextockError::QuotaExceeded { limit: self.limit });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuotaSummary {
    pub current: u32,
    pub limit: u32,
    pub remaining: u32,
    pub percentage: f64,
    pub reached_limit: bool,
    pub status: UsageStatus,
    pub message: String,
}

impl From<QuotaSnapshot> for QuotaSummary {
    fn from(snapshot: QuotaSnapshot) -> Self {
        Self {
            current: snapshot.current,
            limit: snapshot.limit,
            remaining: snapshot.remaining(),
            percentage: snapshot.percentage(),
            reached_limit: snapshot.reached_limit(),
            status: snapshot.status(),
            message: snapshot.message(),
        }
    }
}
