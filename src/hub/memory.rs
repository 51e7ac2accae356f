//! In-memory vault hub.
//!
//! This provides a simple in-memory implementation of [`VaultHub`](super::VaultHub)
//! for tests and offline tooling. Shares are valued 1:1 against wei.

use super::traits::{HubError, ReportProvider, VaultOperations};
use crate::beacon::WithdrawalRequest;
use crate::safe_arith::{saturating_signed, SafeArith};
use crate::vault::{Quarantine, Report};
use alloy_primitives::{Address, FixedBytes};
use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock},
};
use tracing::debug;

/// Per-vault ledger kept by the in-memory hub.
#[derive(Debug, Clone, Default)]
struct VaultRecord {
    report: Report,
    report_fresh: bool,
    quarantine: Option<Quarantine>,
    balance: u128,
    in_out_delta: i128,
    liability_shares: u128,
    deposits_paused: bool,
    exit_requests: Vec<FixedBytes<48>>,
    withdrawal_requests: Vec<WithdrawalRequest>,
}

/// In-memory vault hub.
///
/// Clones share the same underlying state, so a test can keep one handle while
/// the engine owns another. Thread-safe via `RwLock`.
///
/// # Example
///
/// ```ignore
/// use staking_vaults::hub::{InMemoryVaultHub, ReportProvider};
///
/// let hub = InMemoryVaultHub::new();
/// hub.connect_vault(vault, 100 * ETHER)?;
/// hub.apply_report(vault, Report::new(100 * ETHER, 90 * ETHER as i128, 1_000))?;
/// let report = hub.latest_report(vault)?;
/// ```
#[derive(Debug, Default, Clone)]
pub struct InMemoryVaultHub {
    /// Vault records indexed by vault address.
    vaults: Arc<RwLock<BTreeMap<Address, VaultRecord>>>,
    /// Ether held by accounts outside the vaults.
    balances: Arc<RwLock<BTreeMap<Address, u128>>>,
}

impl InMemoryVaultHub {
    /// Create a new empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a vault holding `balance` wei. The balance counts as funding.
    pub fn connect_vault(&self, vault: Address, balance: u128) -> Result<(), HubError> {
        let mut vaults = self.vaults_mut()?;
        let in_out_delta = saturating_signed(balance);
        vaults.insert(
            vault,
            VaultRecord {
                report: Report::new(balance, in_out_delta, 0),
                report_fresh: true,
                balance,
                in_out_delta,
                ..Default::default()
            },
        );
        debug!(target: "vaults::hub", %vault, balance, "Connected vault");
        Ok(())
    }

    /// Publish a new oracle report. The report is marked fresh.
    pub fn apply_report(&self, vault: Address, report: Report) -> Result<(), HubError> {
        self.with_vault(vault, |record| {
            record.report = report;
            record.report_fresh = true;
            Ok(())
        })?;
        debug!(target: "vaults::hub", %vault, ?report, "Applied report");
        Ok(())
    }

    /// Mark the latest report as fresh or stale.
    pub fn set_report_fresh(&self, vault: Address, fresh: bool) -> Result<(), HubError> {
        self.with_vault(vault, |record| {
            record.report_fresh = fresh;
            Ok(())
        })
    }

    /// Start or lift a quarantine.
    pub fn set_quarantine(
        &self,
        vault: Address,
        quarantine: Option<Quarantine>,
    ) -> Result<(), HubError> {
        self.with_vault(vault, |record| {
            record.quarantine = quarantine;
            Ok(())
        })
    }

    /// Ether held by the vault.
    pub fn vault_balance(&self, vault: Address) -> Result<u128, HubError> {
        self.read_vault(vault, |record| record.balance)
    }

    /// Live net funding of the vault, not yet reported.
    pub fn in_out_delta(&self, vault: Address) -> Result<i128, HubError> {
        self.read_vault(vault, |record| record.in_out_delta)
    }

    /// Liability shares minted against the vault.
    pub fn liability_shares(&self, vault: Address) -> Result<u128, HubError> {
        self.read_vault(vault, |record| record.liability_shares)
    }

    /// Whether beacon chain deposits are paused.
    pub fn deposits_paused(&self, vault: Address) -> Result<bool, HubError> {
        self.read_vault(vault, |record| record.deposits_paused)
    }

    /// Exit requests recorded for the vault.
    pub fn exit_requests(&self, vault: Address) -> Result<Vec<FixedBytes<48>>, HubError> {
        self.read_vault(vault, |record| record.exit_requests.clone())
    }

    /// Withdrawal requests recorded for the vault.
    pub fn withdrawal_requests(&self, vault: Address) -> Result<Vec<WithdrawalRequest>, HubError> {
        self.read_vault(vault, |record| record.withdrawal_requests.clone())
    }

    /// Whether the vault is connected.
    pub fn is_connected(&self, vault: Address) -> bool {
        self.vaults.read().map(|vaults| vaults.contains_key(&vault)).unwrap_or(false)
    }

    /// Ether held by an outside account.
    pub fn balance_of(&self, account: Address) -> u128 {
        self.balances
            .read()
            .map(|balances| balances.get(&account).copied().unwrap_or_default())
            .unwrap_or_default()
    }

    fn vaults_mut(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, BTreeMap<Address, VaultRecord>>, HubError> {
        self.vaults.write().map_err(|e| HubError::Database(format!("lock poisoned: {}", e)))
    }

    fn read_vault<T>(
        &self,
        vault: Address,
        f: impl FnOnce(&VaultRecord) -> T,
    ) -> Result<T, HubError> {
        let vaults =
            self.vaults.read().map_err(|e| HubError::Database(format!("lock poisoned: {}", e)))?;
        vaults.get(&vault).map(f).ok_or(HubError::VaultNotConnected(vault))
    }

    /// Apply `f` to a copy of the record and store it only if `f` succeeds.
    fn with_vault<T>(
        &self,
        vault: Address,
        f: impl FnOnce(&mut VaultRecord) -> Result<T, HubError>,
    ) -> Result<T, HubError> {
        let mut vaults = self.vaults_mut()?;
        let record = vaults.get_mut(&vault).ok_or(HubError::VaultNotConnected(vault))?;
        let mut updated = record.clone();
        let out = f(&mut updated)?;
        *record = updated;
        Ok(out)
    }

    fn balances_mut(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, BTreeMap<Address, u128>>, HubError> {
        self.balances.write().map_err(|e| HubError::Database(format!("lock poisoned: {}", e)))
    }
}

impl ReportProvider for InMemoryVaultHub {
    fn latest_report(&self, vault: Address) -> Result<Report, HubError> {
        self.read_vault(vault, |record| record.report)
    }

    fn is_report_fresh(&self, vault: Address) -> Result<bool, HubError> {
        self.read_vault(vault, |record| record.report_fresh)
    }

    fn quarantine(&self, vault: Address) -> Result<Option<Quarantine>, HubError> {
        self.read_vault(vault, |record| record.quarantine)
    }
}

impl VaultOperations for InMemoryVaultHub {
    fn fund(&self, vault: Address, amount: u128) -> Result<(), HubError> {
        if amount == 0 {
            return Err(HubError::ZeroArgument("amount"));
        }
        self.with_vault(vault, |record| {
            record.balance = record.balance.safe_add(amount).map_err(|_| HubError::Overflow)?;
            record.in_out_delta = record
                .in_out_delta
                .safe_add(saturating_signed(amount))
                .map_err(|_| HubError::Overflow)?;
            Ok(())
        })
    }

    fn withdraw(&self, vault: Address, recipient: Address, amount: u128) -> Result<(), HubError> {
        if amount == 0 {
            return Err(HubError::ZeroArgument("amount"));
        }
        // Lock order: balances, then vaults. Nothing is written until both sides fit.
        let mut balances = self.balances_mut()?;
        let credited = balances
            .get(&recipient)
            .copied()
            .unwrap_or_default()
            .safe_add(amount)
            .map_err(|_| HubError::Overflow)?;
        self.with_vault(vault, |record| {
            if record.balance < amount {
                return Err(HubError::InsufficientBalance {
                    available: record.balance,
                    requested: amount,
                });
            }
            record.balance -= amount;
            record.in_out_delta = record
                .in_out_delta
                .safe_sub(saturating_signed(amount))
                .map_err(|_| HubError::Overflow)?;
            Ok(())
        })?;
        balances.insert(recipient, credited);
        debug!(target: "vaults::hub", %vault, %recipient, amount, "Withdrawn");
        Ok(())
    }

    fn mint_shares(&self, vault: Address, recipient: Address, shares: u128) -> Result<(), HubError> {
        if shares == 0 {
            return Err(HubError::ZeroArgument("shares"));
        }
        self.with_vault(vault, |record| {
            record.liability_shares =
                record.liability_shares.safe_add(shares).map_err(|_| HubError::Overflow)?;
            Ok(())
        })?;
        debug!(target: "vaults::hub", %vault, %recipient, shares, "Minted shares");
        Ok(())
    }

    fn burn_shares(&self, vault: Address, shares: u128) -> Result<(), HubError> {
        if shares == 0 {
            return Err(HubError::ZeroArgument("shares"));
        }
        self.with_vault(vault, |record| {
            if record.liability_shares < shares {
                return Err(HubError::InsufficientShares {
                    minted: record.liability_shares,
                    requested: shares,
                });
            }
            record.liability_shares -= shares;
            Ok(())
        })
    }

    fn rebalance(&self, vault: Address, shares: u128) -> Result<(), HubError> {
        if shares == 0 {
            return Err(HubError::ZeroArgument("shares"));
        }
        self.with_vault(vault, |record| {
            if record.liability_shares < shares {
                return Err(HubError::InsufficientShares {
                    minted: record.liability_shares,
                    requested: shares,
                });
            }
            if record.balance < shares {
                return Err(HubError::InsufficientBalance {
                    available: record.balance,
                    requested: shares,
                });
            }
            record.liability_shares -= shares;
            record.balance -= shares;
            record.in_out_delta = record
                .in_out_delta
                .safe_sub(saturating_signed(shares))
                .map_err(|_| HubError::Overflow)?;
            Ok(())
        })
    }

    fn pause_beacon_chain_deposits(&self, vault: Address) -> Result<(), HubError> {
        self.with_vault(vault, |record| {
            if record.deposits_paused {
                return Err(HubError::DepositsAlreadyPaused);
            }
            record.deposits_paused = true;
            Ok(())
        })
    }

    fn resume_beacon_chain_deposits(&self, vault: Address) -> Result<(), HubError> {
        self.with_vault(vault, |record| {
            if !record.deposits_paused {
                return Err(HubError::DepositsAlreadyResumed);
            }
            record.deposits_paused = false;
            Ok(())
        })
    }

    fn request_validator_exit(
        &self,
        vault: Address,
        pubkeys: &[FixedBytes<48>],
    ) -> Result<(), HubError> {
        self.with_vault(vault, |record| {
            record.exit_requests.extend_from_slice(pubkeys);
            Ok(())
        })
    }

    fn trigger_validator_withdrawals(
        &self,
        vault: Address,
        requests: &[WithdrawalRequest],
        refund_recipient: Address,
    ) -> Result<(), HubError> {
        self.with_vault(vault, |record| {
            record.withdrawal_requests.extend_from_slice(requests);
            Ok(())
        })?;
        debug!(
            target: "vaults::hub",
            %vault,
            %refund_recipient,
            count = requests.len(),
            "Triggered validator withdrawals"
        );
        Ok(())
    }

    fn voluntary_disconnect(&self, vault: Address) -> Result<(), HubError> {
        let mut vaults = self.vaults_mut()?;
        vaults.remove(&vault).ok_or(HubError::VaultNotConnected(vault))?;
        Ok(())
    }
}
