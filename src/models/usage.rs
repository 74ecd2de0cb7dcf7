use serde::{Deserialize, Serialize};
use std::fmt;

/// Entitlement class governing which formats and how many generations a
/// caller is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallerTier {
    Anonymous,
    Free,
    PaidLimited,
    PaidUnlimited,
}

impl fmt::Display for CallerTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallerTier::Anonymous => write!(f, "anonymous"),
            CallerTier::Free => write!(f, "free"),
            CallerTier::PaidLimited => write!(f, "paid-limited"),
            CallerTier::PaidUnlimited => write!(f, "paid-unlimited"),
        }
    }
}

/// Who is asking for a batch. Anonymous callers carry a browser/session key
/// instead of an account id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub id: String,
    pub tier: CallerTier,
}

impl CallerIdentity {
    pub fn new(id: impl Into<String>, tier: CallerTier) -> Self {
        Self {
            id: id.into(),
            tier,
        }
    }

    pub fn anonymous(session_key: impl Into<String>) -> Self {
        Self::new(session_key, CallerTier::Anonymous)
    }
}

/// Per-caller artifact counters. The square (1:1) format is metered
/// separately because it is the only format available to unauthenticated and
/// free callers, on a tighter allowance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub total: u32,
    pub square: u32,
}

impl UsageRecord {
    /// Count one created artifact.
    pub fn record(&mut self, square: bool) {
        self.total += 1;
        if square {
            self.square += 1;
        }
    }
}
