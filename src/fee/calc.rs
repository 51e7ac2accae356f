//! Pure fee arithmetic.
//!
//! ```text
//! growth    = total_value + quarantined - in_out_delta
//! unsettled = growth - settled_growth
//! fee       = unsettled <= 0 ? 0 : floor(unsettled * rate / 10_000)
//! threshold = floor((total_value + quarantined) * threshold_bp / 10_000)
//! ```

use serde::{Deserialize, Serialize};

use crate::safe_arith::{self, mul_div_floor, saturating_signed};
use crate::vault::{Quarantine, Report, TOTAL_BASIS_POINTS};

/// Total value including the quarantined part.
pub fn effective_total_value(report: &Report, quarantine: Option<&Quarantine>) -> u128 {
    let pending = quarantine.map(|q| q.pending_total_value).unwrap_or_default();
    report.total_value.saturating_add(pending)
}

/// Vault growth since connection, clamped to the `i128` range.
pub fn growth(report: &Report, quarantine: Option<&Quarantine>) -> i128 {
    saturating_signed(effective_total_value(report, quarantine)).saturating_sub(report.in_out_delta)
}

/// Growth not yet paid out or exempted.
pub fn unsettled_growth(growth: i128, settled_growth: i128) -> i128 {
    growth.saturating_sub(settled_growth)
}

/// Fee on `unsettled` at `fee_rate` basis points. Never negative.
pub fn fee(unsettled: i128, fee_rate: u16) -> safe_arith::Result<u128> {
    if unsettled <= 0 {
        return Ok(0);
    }
    mul_div_floor(unsettled.unsigned_abs(), fee_rate.into(), TOTAL_BASIS_POINTS.into())
}

/// Largest fee that may be disbursed without the admin.
pub fn abnormal_fee_threshold(total_value: u128, threshold_bp: u16) -> safe_arith::Result<u128> {
    mul_div_floor(total_value, threshold_bp.into(), TOTAL_BASIS_POINTS.into())
}

/// Every intermediate value of a fee computation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    /// Total value including quarantine.
    pub total_value: u128,
    /// Vault growth.
    pub growth: i128,
    /// Settled growth used.
    pub settled_growth: i128,
    /// `growth - settled_growth`.
    pub unsettled_growth: i128,
    /// Accrued fee in wei.
    pub fee: u128,
    /// Abnormal-fee threshold in wei.
    pub threshold: u128,
}

impl FeeBreakdown {
    /// Compute the fee for a report.
    pub fn compute(
        report: &Report,
        quarantine: Option<&Quarantine>,
        settled_growth: i128,
        fee_rate: u16,
        threshold_bp: u16,
    ) -> safe_arith::Result<Self> {
        let total_value = effective_total_value(report, quarantine);
        let growth = growth(report, quarantine);
        let unsettled_growth = unsettled_growth(growth, settled_growth);
        Ok(Self {
            total_value,
            growth,
            settled_growth,
            unsettled_growth,
            fee: fee(unsettled_growth, fee_rate)?,
            threshold: abnormal_fee_threshold(total_value, threshold_bp)?,
        })
    }

    /// Whether the fee exceeds the threshold.
    pub fn is_abnormal(&self) -> bool {
        self.fee > self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::ETHER;

    #[test]
    fn test_ten_percent_of_ten_ether() {
        let report = Report::new(100 * ETHER, 90 * ETHER as i128, 1);
        let breakdown = FeeBreakdown::compute(&report, None, 0, 1_000, 100).unwrap();
        assert_eq!(breakdown.growth, 10 * ETHER as i128);
        assert_eq!(breakdown.fee, ETHER);
        assert_eq!(breakdown.threshold, ETHER);
        assert!(!breakdown.is_abnormal());
    }

    #[test]
    fn test_negative_growth_has_no_fee() {
        let report = Report::new(80 * ETHER, 90 * ETHER as i128, 1);
        assert_eq!(growth(&report, None), -10 * ETHER as i128);
        assert_eq!(fee(growth(&report, None), 10_000).unwrap(), 0);
        assert_eq!(fee(0, 10_000).unwrap(), 0);
    }

    #[test]
    fn test_quarantine_counts_toward_growth_and_threshold() {
        let report = Report::new(100 * ETHER, 100 * ETHER as i128, 1);
        let quarantine = Quarantine { pending_total_value: 5 * ETHER, start_timestamp: 0 };
        let breakdown = FeeBreakdown::compute(&report, Some(&quarantine), 0, 1_000, 100).unwrap();
        assert_eq!(breakdown.growth, 5 * ETHER as i128);
        assert_eq!(breakdown.total_value, 105 * ETHER);
        assert_eq!(breakdown.threshold, 105 * ETHER / 100);
    }

    #[test]
    fn test_fee_rounds_down() {
        assert_eq!(fee(9_999, 1).unwrap(), 0);
        assert_eq!(fee(10_001, 1).unwrap(), 1);
        assert_eq!(fee(i128::MAX, 10_000).unwrap(), i128::MAX as u128);
    }

    #[test]
    fn test_growth_saturates() {
        let report = Report::new(u128::MAX, i128::MIN, 1);
        assert_eq!(growth(&report, None), i128::MAX);
        assert_eq!(unsettled_growth(i128::MIN, 1), i128::MIN);
    }
}
