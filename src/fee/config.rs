//! Fee engine configuration.

use serde::{Deserialize, Serialize};

use super::FeeError;
use crate::permissions::{validate_confirm_expiry, DEFAULT_CONFIRM_EXPIRY};
use crate::vault::TOTAL_BASIS_POINTS;

/// Default abnormal-fee threshold: 1% of total value.
pub const DEFAULT_ABNORMALLY_HIGH_FEE_THRESHOLD_BP: u16 = 100;

/// Largest single fee exemption, `2^104 - 1` wei.
pub const MAX_SANE_FEE_EXEMPTION: u128 = (1 << 104) - 1;

/// Settings of one vault's fee engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Confirmation window in seconds.
    pub confirm_expiry: u64,
    /// Fee share of total value above which disbursement needs the admin.
    pub abnormally_high_fee_threshold_bp: u16,
    /// Upper bound for a single fee exemption.
    pub max_sane_fee_exemption: u128,
}

impl VaultConfig {
    /// Set the confirmation window.
    pub fn with_confirm_expiry(mut self, confirm_expiry: u64) -> Self {
        self.confirm_expiry = confirm_expiry;
        self
    }

    /// Set the abnormal-fee threshold.
    pub fn with_abnormally_high_fee_threshold_bp(mut self, threshold_bp: u16) -> Self {
        self.abnormally_high_fee_threshold_bp = threshold_bp;
        self
    }

    /// Set the exemption bound.
    pub fn with_max_sane_fee_exemption(mut self, max: u128) -> Self {
        self.max_sane_fee_exemption = max;
        self
    }

    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, FeeError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| FeeError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field against its bounds.
    pub fn validate(&self) -> Result<(), FeeError> {
        validate_confirm_expiry(self.confirm_expiry)
            .map_err(|e| FeeError::InvalidConfig(e.to_string()))?;
        if self.abnormally_high_fee_threshold_bp == 0
            || self.abnormally_high_fee_threshold_bp > TOTAL_BASIS_POINTS
        {
            return Err(FeeError::InvalidConfig(format!(
                "abnormally high fee threshold {} bp out of bounds",
                self.abnormally_high_fee_threshold_bp
            )));
        }
        if self.max_sane_fee_exemption == 0 {
            return Err(FeeError::InvalidConfig("max sane fee exemption is zero".to_string()));
        }
        Ok(())
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            confirm_expiry: DEFAULT_CONFIRM_EXPIRY,
            abnormally_high_fee_threshold_bp: DEFAULT_ABNORMALLY_HIGH_FEE_THRESHOLD_BP,
            max_sane_fee_exemption: MAX_SANE_FEE_EXEMPTION,
        }
    }
}
