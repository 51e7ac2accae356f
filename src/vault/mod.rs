//! Vault-level primitives shared by the hub, permissions and fee modules.
//!
//! ```text
//! Report (oracle)          Quarantine (hub)
//! ├── total_value: u128    ├── pending_total_value: u128
//! ├── in_out_delta: i128   └── start_timestamp: u64
//! └── timestamp: u64
//! ```

mod events;

pub use events::VaultEvent;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Denominator for all basis-point values.
pub const TOTAL_BASIS_POINTS: u16 = 10_000;

/// One ether in wei.
pub const ETHER: u128 = 1_000_000_000_000_000_000;

/// One gwei in wei.
pub const GWEI: u128 = 1_000_000_000;

/// Periodic snapshot of a vault's value, published by the oracle.
///
/// `in_out_delta` is the cumulative net funding (deposits minus withdrawals)
/// since the vault was connected. Reports are never mutated once issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Total value of the vault in wei.
    pub total_value: u128,
    /// Net funding in wei, may be negative.
    pub in_out_delta: i128,
    /// Report timestamp in seconds.
    pub timestamp: u64,
}

impl Report {
    /// Create a new report.
    pub const fn new(total_value: u128, in_out_delta: i128, timestamp: u64) -> Self {
        Self { total_value, in_out_delta, timestamp }
    }
}

/// Value increase held back by the hub until it is confirmed by later reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quarantine {
    /// Total value not yet reflected in the report's `total_value`.
    pub pending_total_value: u128,
    /// When the quarantine started.
    pub start_timestamp: u64,
}

/// Execution context of a single call: who calls and at what time.
///
/// Every mutating operation takes one of these; there is no ambient clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    /// Caller address.
    pub sender: Address,
    /// Block timestamp in seconds.
    pub timestamp: u64,
}

impl CallContext {
    /// Create a new call context.
    pub const fn new(sender: Address, timestamp: u64) -> Self {
        Self { sender, timestamp }
    }
}
