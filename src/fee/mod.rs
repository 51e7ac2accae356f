//! Node operator fee accounting.
//!
//! The node operator earns `fee_rate` of the vault's growth. Growth that has
//! been paid out or exempted is tracked as *settled growth*; only growth above
//! it accrues a fee.
//!
//! # Architecture
//!
//! ```text
//!  ReportProvider ──▶ FeeBreakdown::compute ──▶ accrued_fee
//!                             │
//!                             ▼
//!                    ┌──────────────────┐   settled = growth   ┌────────────┐
//!  disburse_fee ───▶ │ NodeOperatorFee  │ ───────────────────▶ │ withdraw   │
//!  set_fee_rate ───▶ │  Permissions<H>  │        (last)        │ (VaultHub) │
//!  corrections  ───▶ └──────────────────┘                      └────────────┘
//! ```
//!
//! Every mutating call is atomic: on error, rates, settled growth, roles,
//! confirmations and the event journal are restored.

mod calc;
mod config;
mod error;

pub use calc::{
    abnormal_fee_threshold, effective_total_value, fee, growth, unsettled_growth, FeeBreakdown,
};
pub use config::{VaultConfig, DEFAULT_ABNORMALLY_HIGH_FEE_THRESHOLD_BP, MAX_SANE_FEE_EXEMPTION};
pub use error::FeeError;

use alloy_primitives::{Address, U256};
use alloy_sol_types::{sol, SolCall};
use tracing::{debug, info, warn};

use crate::hub::VaultHub;
use crate::permissions::{Permissions, PermissionsSnapshot, Role, CONFIRMING_ROLES};
use crate::safe_arith::saturating_signed;
use crate::vault::{CallContext, VaultEvent, TOTAL_BASIS_POINTS};

sol! {
    /// Call confirmed when changing the fee rate.
    function setFeeRate(uint256 newFeeRate);

    /// Call confirmed when correcting settled growth.
    function correctSettledGrowth(int128 newSettledGrowth, int128 expectedSettledGrowth);
}

/// Local state restored when a call fails.
struct FeeSnapshot {
    permissions: PermissionsSnapshot,
    fee_rate: u16,
    fee_recipient: Address,
    settled_growth: i128,
    latest_correction_timestamp: u64,
}

/// Node operator fee engine for one vault.
#[derive(Debug)]
pub struct NodeOperatorFee<H> {
    permissions: Permissions<H>,
    config: VaultConfig,
    fee_rate: u16,
    fee_recipient: Address,
    settled_growth: i128,
    latest_correction_timestamp: u64,
}

impl<H: VaultHub> NodeOperatorFee<H> {
    /// Set up the fee engine and its permissions.
    ///
    /// `node_operator_manager` becomes the admin of its own role and of
    /// [`Role::NodeOperatorFeeExempt`].
    pub fn new(
        hub: H,
        vault: Address,
        default_admin: Address,
        node_operator_manager: Address,
        fee_recipient: Address,
        fee_rate: u16,
        config: VaultConfig,
    ) -> Result<Self, FeeError> {
        config.validate()?;
        if fee_rate > TOTAL_BASIS_POINTS {
            return Err(FeeError::FeeRateTooHigh(fee_rate));
        }
        if node_operator_manager.is_zero() {
            return Err(FeeError::ZeroAddress("node_operator_manager"));
        }
        if fee_recipient.is_zero() {
            return Err(FeeError::ZeroAddress("fee_recipient"));
        }

        let mut permissions = Permissions::new(hub, vault, default_admin, config.confirm_expiry)?;
        permissions.grant_unchecked(Role::NodeOperatorManager, node_operator_manager, default_admin);
        permissions.set_role_admin_unchecked(Role::NodeOperatorManager, Role::NodeOperatorManager);
        permissions.set_role_admin_unchecked(Role::NodeOperatorFeeExempt, Role::NodeOperatorManager);
        permissions.emit(VaultEvent::FeeRateSet {
            sender: default_admin,
            old_fee_rate: 0,
            new_fee_rate: fee_rate,
        });
        permissions.emit(VaultEvent::FeeRecipientSet {
            sender: default_admin,
            old_recipient: Address::ZERO,
            new_recipient: fee_recipient,
        });

        info!(target: "vaults::fee", %vault, fee_rate, %fee_recipient, "Initialized node operator fee");
        Ok(Self {
            permissions,
            config,
            fee_rate,
            fee_recipient,
            settled_growth: 0,
            latest_correction_timestamp: 0,
        })
    }

    /// Underlying permissions.
    pub fn permissions(&self) -> &Permissions<H> {
        &self.permissions
    }

    /// Underlying permissions, for role management and vault operations.
    pub fn permissions_mut(&mut self) -> &mut Permissions<H> {
        &mut self.permissions
    }

    /// Engine settings.
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Fee rate in basis points.
    pub fn fee_rate(&self) -> u16 {
        self.fee_rate
    }

    /// Fee recipient.
    pub fn fee_recipient(&self) -> Address {
        self.fee_recipient
    }

    /// Growth already paid out or exempted.
    pub fn settled_growth(&self) -> i128 {
        self.settled_growth
    }

    /// Time of the last manual correction or exemption.
    pub fn latest_correction_timestamp(&self) -> u64 {
        self.latest_correction_timestamp
    }

    /// Roles that must confirm rate changes and corrections.
    pub fn confirming_roles(&self) -> [Role; 2] {
        CONFIRMING_ROLES
    }

    /// Fee computation against the latest report.
    pub fn fee_breakdown(&self) -> Result<FeeBreakdown, FeeError> {
        let vault = self.permissions.vault();
        let hub = self.permissions.hub();
        let report = hub.latest_report(vault)?;
        let quarantine = hub.quarantine(vault)?;
        Ok(FeeBreakdown::compute(
            &report,
            quarantine.as_ref(),
            self.settled_growth,
            self.fee_rate,
            self.config.abnormally_high_fee_threshold_bp,
        )?)
    }

    /// Fee accrued since the last settlement.
    pub fn accrued_fee(&self) -> Result<u128, FeeError> {
        Ok(self.fee_breakdown()?.fee)
    }

    /// Pay the accrued fee to the recipient. Anyone may call.
    ///
    /// Fails with [`FeeError::AbnormallyHighFee`] when the fee exceeds the
    /// threshold; see [`Self::disburse_abnormally_high_fee`].
    pub fn disburse_fee(&mut self, ctx: &CallContext) -> Result<u128, FeeError> {
        self.atomically(|this| this.disburse(ctx, true))
    }

    /// Pay the accrued fee regardless of the threshold. Admin only.
    pub fn disburse_abnormally_high_fee(&mut self, ctx: &CallContext) -> Result<u128, FeeError> {
        self.permissions.check_capability(ctx, Role::DefaultAdmin)?;
        self.atomically(|this| this.disburse(ctx, false))
    }

    /// Change the fee rate after disbursing at the old one.
    ///
    /// Needs a fresh report with no later correction, no quarantine and
    /// confirmation from every confirming role. Returns `false` while
    /// confirmations are pending.
    pub fn set_fee_rate(&mut self, ctx: &CallContext, new_fee_rate: u16) -> Result<bool, FeeError> {
        self.atomically(|this| {
            if new_fee_rate > TOTAL_BASIS_POINTS {
                return Err(FeeError::FeeRateTooHigh(new_fee_rate));
            }
            this.check_rate_change_allowed()?;

            let call = setFeeRateCall { newFeeRate: U256::from(new_fee_rate) }.abi_encode();
            if !this.permissions.collect_confirmations(ctx, &call)? {
                return Ok(false);
            }

            this.disburse(ctx, true)?;
            let old_fee_rate = std::mem::replace(&mut this.fee_rate, new_fee_rate);
            info!(target: "vaults::fee", old_fee_rate, new_fee_rate, "Fee rate set");
            this.permissions.emit(VaultEvent::FeeRateSet {
                sender: ctx.sender,
                old_fee_rate,
                new_fee_rate,
            });
            Ok(true)
        })
    }

    /// Replace settled growth, guarded by the caller's view of the current value.
    ///
    /// Returns `false` while confirmations are pending.
    pub fn correct_settled_growth(
        &mut self,
        ctx: &CallContext,
        new_settled_growth: i128,
        expected_settled_growth: i128,
    ) -> Result<bool, FeeError> {
        self.atomically(|this| {
            if this.settled_growth != expected_settled_growth {
                return Err(FeeError::UnexpectedSettledGrowth {
                    expected: expected_settled_growth,
                    actual: this.settled_growth,
                });
            }

            let call = correctSettledGrowthCall {
                newSettledGrowth: new_settled_growth,
                expectedSettledGrowth: expected_settled_growth,
            }
            .abi_encode();
            if !this.permissions.collect_confirmations(ctx, &call)? {
                return Ok(false);
            }

            if new_settled_growth == this.settled_growth {
                return Err(FeeError::SameSettledGrowth);
            }
            this.set_settled_growth(new_settled_growth);
            this.update_correction_timestamp(ctx.timestamp);
            Ok(true)
        })
    }

    /// Mark `amount` of growth as exempt from the fee, e.g. side deposits.
    pub fn add_fee_exemption(&mut self, ctx: &CallContext, amount: u128) -> Result<(), FeeError> {
        self.permissions.check_capability(ctx, Role::NodeOperatorFeeExempt)?;
        if amount == 0 {
            return Err(FeeError::ZeroArgument("amount"));
        }
        if amount > self.config.max_sane_fee_exemption {
            return Err(FeeError::UnexpectedFeeExemptionAmount(amount));
        }

        let new_settled_growth = self.settled_growth.saturating_add(saturating_signed(amount));
        debug!(target: "vaults::fee", sender = %ctx.sender, amount, "Fee exemption");
        self.set_settled_growth(new_settled_growth);
        self.update_correction_timestamp(ctx.timestamp);
        Ok(())
    }

    /// Change where fees are paid. Node operator manager only.
    pub fn set_fee_recipient(
        &mut self,
        ctx: &CallContext,
        new_recipient: Address,
    ) -> Result<(), FeeError> {
        self.permissions.check_capability(ctx, Role::NodeOperatorManager)?;
        if new_recipient.is_zero() {
            return Err(FeeError::ZeroAddress("fee_recipient"));
        }
        if new_recipient == self.fee_recipient {
            return Err(FeeError::SameRecipient);
        }

        let old_recipient = std::mem::replace(&mut self.fee_recipient, new_recipient);
        info!(target: "vaults::fee", %old_recipient, %new_recipient, "Fee recipient set");
        self.permissions.emit(VaultEvent::FeeRecipientSet {
            sender: ctx.sender,
            old_recipient,
            new_recipient,
        });
        Ok(())
    }

    /// Events emitted since the last call, oldest first.
    pub fn events(&self) -> &[VaultEvent] {
        self.permissions.events()
    }

    /// Drain the event journal.
    pub fn take_events(&mut self) -> Vec<VaultEvent> {
        self.permissions.take_events()
    }

    fn check_rate_change_allowed(&self) -> Result<(), FeeError> {
        let vault = self.permissions.vault();
        let hub = self.permissions.hub();
        if !hub.is_report_fresh(vault)? {
            return Err(FeeError::ReportStale);
        }
        let report = hub.latest_report_timestamp(vault)?;
        if self.latest_correction_timestamp >= report {
            return Err(FeeError::CorrectionAfterReport {
                correction: self.latest_correction_timestamp,
                report,
            });
        }
        if hub.is_quarantined(vault)? {
            return Err(FeeError::VaultQuarantined);
        }
        Ok(())
    }

    fn disburse(&mut self, ctx: &CallContext, enforce_threshold: bool) -> Result<u128, FeeError> {
        let breakdown = self.fee_breakdown()?;
        if enforce_threshold && breakdown.is_abnormal() {
            warn!(
                target: "vaults::fee",
                fee = breakdown.fee,
                threshold = breakdown.threshold,
                "Abnormally high fee"
            );
            return Err(FeeError::AbnormallyHighFee {
                fee: breakdown.fee,
                threshold: breakdown.threshold,
            });
        }

        if breakdown.fee == 0 {
            if breakdown.growth > self.settled_growth {
                self.set_settled_growth(breakdown.growth);
            }
            return Ok(0);
        }

        self.set_settled_growth(breakdown.growth);
        self.permissions.withdraw_unchecked(self.fee_recipient, breakdown.fee)?;
        info!(
            target: "vaults::fee",
            sender = %ctx.sender,
            fee = breakdown.fee,
            recipient = %self.fee_recipient,
            "Fee disbursed"
        );
        self.permissions.emit(VaultEvent::FeeDisbursed {
            sender: ctx.sender,
            fee: breakdown.fee,
            recipient: self.fee_recipient,
        });
        Ok(breakdown.fee)
    }

    fn set_settled_growth(&mut self, new_settled_growth: i128) {
        let old_settled_growth = std::mem::replace(&mut self.settled_growth, new_settled_growth);
        info!(target: "vaults::fee", old_settled_growth, new_settled_growth, "Settled growth set");
        self.permissions.emit(VaultEvent::SettledGrowthSet { old_settled_growth, new_settled_growth });
    }

    fn update_correction_timestamp(&mut self, timestamp: u64) {
        self.latest_correction_timestamp = timestamp;
        self.permissions.emit(VaultEvent::CorrectionTimestampUpdated { timestamp });
    }

    fn atomically<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, FeeError>,
    ) -> Result<T, FeeError> {
        let snapshot = self.snapshot();
        let result = f(self);
        if let Err(err) = &result {
            debug!(target: "vaults::fee", %err, "Call reverted");
            self.restore(snapshot);
        }
        result
    }

    fn snapshot(&self) -> FeeSnapshot {
        FeeSnapshot {
            permissions: self.permissions.snapshot(),
            fee_rate: self.fee_rate,
            fee_recipient: self.fee_recipient,
            settled_growth: self.settled_growth,
            latest_correction_timestamp: self.latest_correction_timestamp,
        }
    }

    fn restore(&mut self, snapshot: FeeSnapshot) {
        self.permissions.restore(snapshot.permissions);
        self.fee_rate = snapshot.fee_rate;
        self.fee_recipient = snapshot.fee_recipient;
        self.settled_growth = snapshot.settled_growth;
        self.latest_correction_timestamp = snapshot.latest_correction_timestamp;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::{HubError, InMemoryVaultHub};
    use crate::permissions::PermissionsError;
    use crate::vault::{Quarantine, Report, ETHER};

    const REPORT_TIME: u64 = 1_000;

    fn vault() -> Address {
        Address::repeat_byte(0xAA)
    }

    fn admin() -> Address {
        Address::repeat_byte(0x01)
    }

    fn operator() -> Address {
        Address::repeat_byte(0x02)
    }

    fn recipient() -> Address {
        Address::repeat_byte(0x03)
    }

    fn stranger() -> Address {
        Address::repeat_byte(0x0F)
    }

    fn ctx(sender: Address) -> CallContext {
        CallContext::new(sender, REPORT_TIME + 10)
    }

    /// 90 ETH funded, 100 ETH reported, 10% fee.
    fn setup() -> (InMemoryVaultHub, NodeOperatorFee<InMemoryVaultHub>) {
        let hub = InMemoryVaultHub::new();
        hub.connect_vault(vault(), 90 * ETHER).unwrap();
        hub.apply_report(vault(), Report::new(100 * ETHER, 90 * ETHER as i128, REPORT_TIME))
            .unwrap();
        let engine = NodeOperatorFee::new(
            hub.clone(),
            vault(),
            admin(),
            operator(),
            recipient(),
            1_000,
            VaultConfig::default(),
        )
        .unwrap();
        (hub, engine)
    }

    #[test]
    fn test_new_sets_up_roles() {
        let (_, engine) = setup();
        let permissions = engine.permissions();
        assert!(permissions.has_role(Role::NodeOperatorManager, operator()));
        assert_eq!(permissions.access().admin_of(Role::NodeOperatorManager), Role::NodeOperatorManager);
        assert_eq!(permissions.access().admin_of(Role::NodeOperatorFeeExempt), Role::NodeOperatorManager);
        assert_eq!(engine.settled_growth(), 0);
        assert_eq!(engine.latest_correction_timestamp(), 0);
    }

    #[test]
    fn test_new_rejects_bad_arguments() {
        let hub = InMemoryVaultHub::new();
        let build = |manager, recipient, rate, config| {
            NodeOperatorFee::new(hub.clone(), vault(), admin(), manager, recipient, rate, config)
                .map(|_| ())
        };
        assert_eq!(
            build(operator(), recipient(), 10_001, VaultConfig::default()),
            Err(FeeError::FeeRateTooHigh(10_001))
        );
        assert_eq!(
            build(Address::ZERO, recipient(), 0, VaultConfig::default()),
            Err(FeeError::ZeroAddress("node_operator_manager"))
        );
        assert_eq!(
            build(operator(), Address::ZERO, 0, VaultConfig::default()),
            Err(FeeError::ZeroAddress("fee_recipient"))
        );
        assert!(matches!(
            build(operator(), recipient(), 0, VaultConfig::default().with_confirm_expiry(0)),
            Err(FeeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_disburse_fee_pays_recipient() {
        let (hub, mut engine) = setup();
        assert_eq!(engine.accrued_fee().unwrap(), ETHER);
        engine.take_events();

        assert_eq!(engine.disburse_fee(&ctx(stranger())).unwrap(), ETHER);
        assert_eq!(hub.balance_of(recipient()), ETHER);
        assert_eq!(hub.vault_balance(vault()).unwrap(), 89 * ETHER);
        assert_eq!(engine.settled_growth(), 10 * ETHER as i128);
        assert_eq!(engine.accrued_fee().unwrap(), 0);

        let events = engine.take_events();
        assert_eq!(
            events,
            vec![
                VaultEvent::SettledGrowthSet {
                    old_settled_growth: 0,
                    new_settled_growth: 10 * ETHER as i128
                },
                VaultEvent::FeeDisbursed { sender: stranger(), fee: ETHER, recipient: recipient() },
            ]
        );
    }

    #[test]
    fn test_zero_fee_advances_settled_growth() {
        let hub = InMemoryVaultHub::new();
        hub.connect_vault(vault(), 90 * ETHER).unwrap();
        hub.apply_report(vault(), Report::new(100 * ETHER, 90 * ETHER as i128, REPORT_TIME))
            .unwrap();
        let mut engine = NodeOperatorFee::new(
            hub.clone(),
            vault(),
            admin(),
            operator(),
            recipient(),
            0,
            VaultConfig::default(),
        )
        .unwrap();
        engine.take_events();

        assert_eq!(engine.disburse_fee(&ctx(stranger())).unwrap(), 0);
        assert_eq!(engine.settled_growth(), 10 * ETHER as i128);
        assert_eq!(hub.balance_of(recipient()), 0);
        assert!(!engine
            .take_events()
            .iter()
            .any(|event| matches!(event, VaultEvent::FeeDisbursed { .. })));
    }

    #[test]
    fn test_negative_growth_disburses_nothing() {
        let (hub, mut engine) = setup();
        hub.apply_report(vault(), Report::new(80 * ETHER, 90 * ETHER as i128, REPORT_TIME + 1))
            .unwrap();
        engine.take_events();

        assert_eq!(engine.disburse_fee(&ctx(stranger())).unwrap(), 0);
        assert_eq!(engine.settled_growth(), 0);
        assert!(engine.events().is_empty());
    }

    #[test]
    fn test_abnormally_high_fee() {
        let (hub, mut engine) = setup();
        // 50 ETH growth at 10% is 5 ETH, threshold is 1 ETH
        hub.apply_report(vault(), Report::new(100 * ETHER, 50 * ETHER as i128, REPORT_TIME + 1))
            .unwrap();
        engine.take_events();

        assert_eq!(
            engine.disburse_fee(&ctx(stranger())),
            Err(FeeError::AbnormallyHighFee { fee: 5 * ETHER, threshold: ETHER })
        );
        assert_eq!(engine.settled_growth(), 0);
        assert!(engine.events().is_empty());

        assert!(matches!(
            engine.disburse_abnormally_high_fee(&ctx(operator())),
            Err(FeeError::Permissions(PermissionsError::AccessControlUnauthorizedAccount { .. }))
        ));
        assert_eq!(engine.disburse_abnormally_high_fee(&ctx(admin())).unwrap(), 5 * ETHER);
        assert_eq!(hub.balance_of(recipient()), 5 * ETHER);
    }

    #[test]
    fn test_failed_withdraw_restores_settled_growth() {
        let (hub, mut engine) = setup();
        engine.permissions_mut().withdraw(&ctx(admin()), stranger(), 90 * ETHER).unwrap();
        engine.take_events();

        assert!(matches!(
            engine.disburse_fee(&ctx(stranger())),
            Err(FeeError::Permissions(PermissionsError::Hub(HubError::InsufficientBalance { .. })))
        ));
        assert_eq!(engine.settled_growth(), 0);
        assert!(engine.events().is_empty());
        assert_eq!(hub.balance_of(recipient()), 0);
    }

    #[test]
    fn test_set_fee_rate_disburses_at_old_rate() {
        let (hub, mut engine) = setup();

        assert!(!engine.set_fee_rate(&ctx(admin()), 500).unwrap());
        assert_eq!(engine.fee_rate(), 1_000);

        assert!(engine.set_fee_rate(&ctx(operator()), 500).unwrap());
        assert_eq!(engine.fee_rate(), 500);
        assert_eq!(hub.balance_of(recipient()), ETHER);
        assert!(engine.events().contains(&VaultEvent::FeeRateSet {
            sender: operator(),
            old_fee_rate: 1_000,
            new_fee_rate: 500
        }));
    }

    #[test]
    fn test_set_fee_rate_preconditions() {
        let (hub, mut engine) = setup();
        assert_eq!(engine.set_fee_rate(&ctx(admin()), 10_001), Err(FeeError::FeeRateTooHigh(10_001)));

        hub.set_report_fresh(vault(), false).unwrap();
        assert_eq!(engine.set_fee_rate(&ctx(admin()), 500), Err(FeeError::ReportStale));
        hub.set_report_fresh(vault(), true).unwrap();

        hub.set_quarantine(
            vault(),
            Some(Quarantine { pending_total_value: ETHER, start_timestamp: REPORT_TIME }),
        )
        .unwrap();
        assert_eq!(engine.set_fee_rate(&ctx(admin()), 500), Err(FeeError::VaultQuarantined));
        hub.set_quarantine(vault(), None).unwrap();

        engine.add_fee_exemption(&ctx(operator()), ETHER).unwrap();
        assert_eq!(
            engine.set_fee_rate(&ctx(admin()), 500),
            Err(FeeError::CorrectionAfterReport { correction: REPORT_TIME + 10, report: REPORT_TIME })
        );
        assert!(engine.permissions().confirmations().is_empty());
    }

    #[test]
    fn test_set_fee_rate_rejects_correction_at_report_time() {
        let (hub, mut engine) = setup();
        engine.add_fee_exemption(&ctx(operator()), ETHER).unwrap();
        hub.apply_report(vault(), Report::new(100 * ETHER, 90 * ETHER as i128, REPORT_TIME + 10))
            .unwrap();

        // same timestamp as the correction: the report may not include it
        assert_eq!(
            engine.set_fee_rate(&ctx(admin()), 500),
            Err(FeeError::CorrectionAfterReport {
                correction: REPORT_TIME + 10,
                report: REPORT_TIME + 10,
            })
        );

        hub.apply_report(vault(), Report::new(100 * ETHER, 90 * ETHER as i128, REPORT_TIME + 11))
            .unwrap();
        assert_eq!(engine.set_fee_rate(&ctx(admin()), 500), Ok(false));
    }

    #[test]
    fn test_set_fee_rate_is_atomic() {
        let (hub, mut engine) = setup();
        hub.apply_report(vault(), Report::new(100 * ETHER, 50 * ETHER as i128, REPORT_TIME + 1))
            .unwrap();

        assert!(!engine.set_fee_rate(&ctx(admin()), 500).unwrap());
        let events = engine.events().len();

        assert!(matches!(
            engine.set_fee_rate(&ctx(operator()), 500),
            Err(FeeError::AbnormallyHighFee { .. })
        ));
        assert_eq!(engine.fee_rate(), 1_000);
        assert_eq!(engine.settled_growth(), 0);
        assert_eq!(engine.events().len(), events);

        let call = setFeeRateCall { newFeeRate: U256::from(500u16) }.abi_encode();
        let pending = engine.permissions().confirmations().pending(&call).unwrap();
        assert!(pending.confirmed_at.contains_key(&Role::DefaultAdmin));
        assert!(!pending.confirmed_at.contains_key(&Role::NodeOperatorManager));
    }

    #[test]
    fn test_correct_settled_growth() {
        let (_, mut engine) = setup();
        let target = 4 * ETHER as i128;

        assert_eq!(
            engine.correct_settled_growth(&ctx(admin()), target, 1),
            Err(FeeError::UnexpectedSettledGrowth { expected: 1, actual: 0 })
        );
        assert!(!engine.correct_settled_growth(&ctx(admin()), target, 0).unwrap());
        assert!(engine.correct_settled_growth(&ctx(operator()), target, 0).unwrap());
        assert_eq!(engine.settled_growth(), target);
        assert_eq!(engine.latest_correction_timestamp(), REPORT_TIME + 10);
        assert_eq!(engine.accrued_fee().unwrap(), 6 * ETHER / 10);

        // the old expected value is now stale
        assert!(matches!(
            engine.correct_settled_growth(&ctx(admin()), 0, 0),
            Err(FeeError::UnexpectedSettledGrowth { .. })
        ));
    }

    #[test]
    fn test_correct_settled_growth_rejects_same_value() {
        let (_, mut engine) = setup();
        assert!(!engine.correct_settled_growth(&ctx(admin()), 0, 0).unwrap());
        assert_eq!(
            engine.correct_settled_growth(&ctx(operator()), 0, 0),
            Err(FeeError::SameSettledGrowth)
        );
        assert_eq!(engine.latest_correction_timestamp(), 0);
    }

    #[test]
    fn test_fee_exemption() {
        let (_, mut engine) = setup();
        let exempter = Address::repeat_byte(0x05);

        assert!(engine.add_fee_exemption(&ctx(exempter), ETHER).is_err());
        engine
            .permissions_mut()
            .grant_role(&ctx(operator()), Role::NodeOperatorFeeExempt, exempter)
            .unwrap();

        engine.add_fee_exemption(&ctx(exempter), 5 * ETHER).unwrap();
        assert_eq!(engine.settled_growth(), 5 * ETHER as i128);
        assert_eq!(engine.accrued_fee().unwrap(), ETHER / 2);
        assert_eq!(engine.latest_correction_timestamp(), REPORT_TIME + 10);

        assert_eq!(engine.add_fee_exemption(&ctx(exempter), 0), Err(FeeError::ZeroArgument("amount")));
        assert_eq!(
            engine.add_fee_exemption(&ctx(exempter), MAX_SANE_FEE_EXEMPTION + 1),
            Err(FeeError::UnexpectedFeeExemptionAmount(MAX_SANE_FEE_EXEMPTION + 1))
        );
    }

    #[test]
    fn test_set_fee_recipient() {
        let (_, mut engine) = setup();
        let new_recipient = Address::repeat_byte(0x06);

        assert!(engine.set_fee_recipient(&ctx(admin()), new_recipient).is_err());
        assert_eq!(
            engine.set_fee_recipient(&ctx(operator()), Address::ZERO),
            Err(FeeError::ZeroAddress("fee_recipient"))
        );
        assert_eq!(engine.set_fee_recipient(&ctx(operator()), recipient()), Err(FeeError::SameRecipient));

        engine.set_fee_recipient(&ctx(operator()), new_recipient).unwrap();
        assert_eq!(engine.fee_recipient(), new_recipient);
        assert_eq!(engine.accrued_fee().unwrap(), ETHER);
    }
}
