//! Vault hub collaborator interfaces.
//!
//! The hub owns the vault's ether, its liability shares and the oracle reports.
//! The fee engine and the permissions layer only ever talk to it through the
//! traits in this module.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      VaultHub                           │
//! ├─────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────┐  ┌─────────────────────────┐   │
//! │  │   ReportProvider    │  │   VaultOperations       │   │
//! │  │                     │  │                         │   │
//! │  │  - latest_report    │  │  - fund / withdraw      │   │
//! │  │  - is_report_fresh  │  │  - mint / burn shares   │   │
//! │  │  - quarantine       │  │  - rebalance            │   │
//! │  │                     │  │  - exits / withdrawals  │   │
//! │  └─────────────────────┘  └─────────────────────────┘   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Implementations
//!
//! - [`InMemoryVaultHub`]: shared in-memory hub for tests and tooling

mod memory;
mod traits;

pub use memory::InMemoryVaultHub;
pub use traits::{HubError, ReportProvider, VaultHub, VaultOperations};
