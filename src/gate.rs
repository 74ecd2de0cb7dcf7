//! Usage/entitlement gate.
//!
//! Decides, once before a batch starts, whether the caller may generate the
//! requested formats. Denials are expected outcomes, not failures, and name
//! the exact cap that was hit so the caller can present the right upgrade
//! path.

use crate::config::LimitsConfig;
use crate::models::{CallerTier, Format, UsageRecord};
use serde::Serialize;
use std::fmt;

/// Formats available to anonymous and free callers: the metered square plus
/// one vertical format.
const METERED_TIER_FORMATS: [Format; 2] = [Format::Square, Format::Story];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum DenialReason {
    /// The caller's tier does not include this format at all.
    FormatUnavailable { format: Format, tier: CallerTier },
    /// The separately-metered square allowance is exhausted.
    SquareQuotaExceeded { used: u32, cap: u32 },
    /// The aggregate generation allowance is exhausted.
    AggregateQuotaExceeded { used: u32, cap: u32 },
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::FormatUnavailable { format, tier } => {
                write!(f, "format {} is not available on the {} tier", format, tier)
            }
            DenialReason::SquareQuotaExceeded { used, cap } => {
                write!(f, "square (1:1) quota reached ({} of {})", used, cap)
            }
            DenialReason::AggregateQuotaExceeded { used, cap } => {
                write!(f, "generation quota reached ({} of {})", used, cap)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    Allowed,
    Denied(DenialReason),
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allowed)
    }
}

/// Apply the tier policy table to one batch request. Pure: the caller reads
/// usage beforehand and the gate is not re-checked mid-batch.
pub fn check(
    tier: CallerTier,
    formats: &[Format],
    usage: &UsageRecord,
    limits: &LimitsConfig,
) -> GateDecision {
    // Format availability first: a denial here is actionable regardless of
    // any quota state.
    if matches!(tier, CallerTier::Anonymous | CallerTier::Free) {
        for format in formats {
            if !METERED_TIER_FORMATS.contains(format) {
                return GateDecision::Denied(DenialReason::FormatUnavailable {
                    format: *format,
                    tier,
                });
            }
        }
    }

    match tier {
        CallerTier::Anonymous => {
            let wants_square = formats.iter().any(|f| f.is_square());
            if wants_square && usage.square >= limits.anonymous_square_cap {
                return GateDecision::Denied(DenialReason::SquareQuotaExceeded {
                    used: usage.square,
                    cap: limits.anonymous_square_cap,
                });
            }
        }
        CallerTier::Free => {
            if usage.total >= limits.free_total_cap {
                return GateDecision::Denied(DenialReason::AggregateQuotaExceeded {
                    used: usage.total,
                    cap: limits.free_total_cap,
                });
            }
        }
        CallerTier::PaidLimited => {
            if usage.total >= limits.limited_total_cap {
                return GateDecision::Denied(DenialReason::AggregateQuotaExceeded {
                    used: usage.total,
                    cap: limits.limited_total_cap,
                });
            }
        }
        CallerTier::PaidUnlimited => {}
    }

    GateDecision::Allowed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> LimitsConfig {
        LimitsConfig::default()
    }

    #[test]
    fn anonymous_square_cap_is_metered_separately() {
        // Three square artifacts already produced; aggregate count is low.
        let usage = UsageRecord { total: 3, square: 3 };
        let decision = check(
            CallerTier::Anonymous,
            &[Format::Square],
            &usage,
            &limits(),
        );
        assert_eq!(
            decision,
            GateDecision::Denied(DenialReason::SquareQuotaExceeded { used: 3, cap: 3 })
        );

        // A vertical request from the same caller is still format-allowed.
        let decision = check(CallerTier::Anonymous, &[Format::Story], &usage, &limits());
        assert!(decision.is_allowed());
    }

    #[test]
    fn metered_tiers_cannot_request_landscape() {
        let usage = UsageRecord::default();
        for tier in [CallerTier::Anonymous, CallerTier::Free] {
            let decision = check(tier, &[Format::Square, Format::Landscape], &usage, &limits());
            assert_eq!(
                decision,
                GateDecision::Denied(DenialReason::FormatUnavailable {
                    format: Format::Landscape,
                    tier,
                })
            );
        }
    }

    #[test]
    fn pixel_formats_require_a_paid_tier() {
        let usage = UsageRecord::default();
        let decision = check(
            CallerTier::Free,
            &[Format::Pixels(300, 250)],
            &usage,
            &limits(),
        );
        assert!(matches!(
            decision,
            GateDecision::Denied(DenialReason::FormatUnavailable { .. })
        ));

        let decision = check(
            CallerTier::PaidLimited,
            &[Format::Pixels(300, 250)],
            &usage,
            &limits(),
        );
        assert!(decision.is_allowed());
    }

    #[test]
    fn free_tier_is_metered_on_the_aggregate() {
        let usage = UsageRecord { total: 10, square: 2 };
        let decision = check(CallerTier::Free, &[Format::Square], &usage, &limits());
        assert_eq!(
            decision,
            GateDecision::Denied(DenialReason::AggregateQuotaExceeded { used: 10, cap: 10 })
        );
    }

    #[test]
    fn paid_limited_has_a_larger_cap_and_unlimited_has_none() {
        let heavy = UsageRecord {
            total: 5000,
            square: 5000,
        };
        let decision = check(
            CallerTier::PaidLimited,
            &[Format::Landscape],
            &heavy,
            &limits(),
        );
        assert!(matches!(
            decision,
            GateDecision::Denied(DenialReason::AggregateQuotaExceeded { cap: 100, .. })
        ));

        let decision = check(
            CallerTier::PaidUnlimited,
            &[Format::Landscape],
            &heavy,
            &limits(),
        );
        assert!(decision.is_allowed());
    }

    #[test]
    fn denials_name_the_cap_that_was_hit() {
        let usage = UsageRecord { total: 1, square: 3 };
        let decision = check(
            CallerTier::Anonymous,
            &[Format::Square],
            &usage,
            &limits(),
        );
        let GateDecision::Denied(reason) = decision else {
            panic!("expected denial");
        };
        assert!(reason.to_string().contains("square"));
    }
}
