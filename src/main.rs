//! vaults - staking vault operator tool
//!
//! Offline checks for validator deposits and node operator fees.
//!
//! ```text
//! vaults verify-deposit deposit.json
//! vaults signing-root --pubkey 0x.. --withdrawal-credentials 0x.. --amount-gwei 32000000000
//! vaults accrued-fee --total-value 100 --in-out-delta 90 --fee-rate 1000
//! vaults deposit-calldata deposit.json
//! ```

use std::path::{Path, PathBuf};

use alloy_primitives::{Address, FixedBytes, B256};
use clap::{Parser, Subcommand};
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use staking_vaults::{
    beacon::MAINNET_DEPOSIT_CONTRACT,
    fee::{FeeBreakdown, VaultConfig},
    ssz::{compute_deposit_domain, deposit_message_signing_root},
    vault::{Quarantine, Report, GWEI},
    BlstPrecompiles, DepositY, VerifiedDeposit,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// vaults - staking vault operator tool
#[derive(Parser, Debug)]
#[command(name = "vaults")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Vault config file (JSON); defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Verify a deposit signature and print its data root
    VerifyDeposit {
        /// Deposit file (JSON)
        path: PathBuf,
    },
    /// Print the signing root of a deposit message
    SigningRoot {
        /// Validator public key, 48 bytes hex
        #[arg(long)]
        pubkey: FixedBytes<48>,
        /// Withdrawal credentials, 32 bytes hex
        #[arg(long)]
        withdrawal_credentials: B256,
        /// Amount in gwei
        #[arg(long, default_value_t = 32_000_000_000)]
        amount_gwei: u64,
        /// Genesis fork version, 4 bytes hex
        #[arg(long, default_value = "0x00000000")]
        fork_version: FixedBytes<4>,
    },
    /// Compute the node operator fee for a report
    AccruedFee {
        /// Reported total value in wei
        #[arg(long)]
        total_value: u128,
        /// Reported net funding in wei
        #[arg(long, allow_hyphen_values = true)]
        in_out_delta: i128,
        /// Quarantined value in wei
        #[arg(long, default_value_t = 0)]
        quarantined: u128,
        /// Settled growth in wei
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        settled_growth: i128,
        /// Fee rate in basis points
        #[arg(long)]
        fee_rate: u16,
    },
    /// Verify a deposit and print the deposit contract transaction
    DepositCalldata {
        /// Deposit file (JSON)
        path: PathBuf,
        /// Deposit contract address
        #[arg(long, default_value_t = MAINNET_DEPOSIT_CONTRACT)]
        contract: Address,
    },
}

/// Deposit file contents.
#[derive(Debug, Deserialize)]
struct DepositInput {
    pubkey: FixedBytes<48>,
    signature: FixedBytes<96>,
    withdrawal_credentials: B256,
    amount_gwei: u64,
    deposit_y: DepositY,
    /// Explicit signing domain; derived from `fork_version` when absent.
    #[serde(default)]
    domain: Option<B256>,
    #[serde(default)]
    fork_version: FixedBytes<4>,
}

impl DepositInput {
    fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&raw).wrap_err_with(|| format!("invalid deposit file {}", path.display()))
    }

    fn domain(&self) -> B256 {
        self.domain.unwrap_or_else(|| compute_deposit_domain(self.fork_version.0))
    }

    fn verify(&self) -> Result<VerifiedDeposit> {
        let amount_wei = u128::from(self.amount_gwei) * GWEI;
        let deposit = VerifiedDeposit::new(
            &BlstPrecompiles,
            self.pubkey,
            self.signature,
            amount_wei,
            &self.deposit_y,
            self.withdrawal_credentials,
            self.domain(),
        )
        .wrap_err("deposit verification failed")?;
        Ok(deposit)
    }
}

#[derive(Debug, Serialize)]
struct VerifyOutput {
    pubkey: FixedBytes<48>,
    amount_gwei: u64,
    deposit_data_root: B256,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .wrap_err_with(|| format!("failed to read {}", path.display()))?;
            VaultConfig::from_json(&raw)?
        }
        None => VaultConfig::default(),
    };

    match cli.command {
        Commands::VerifyDeposit { path } => {
            let input = DepositInput::load(&path)?;
            let deposit = input.verify()?;
            info!(pubkey = %input.pubkey, "Deposit signature valid");
            print_json(&VerifyOutput {
                pubkey: input.pubkey,
                amount_gwei: deposit.data().amount,
                deposit_data_root: deposit.deposit_data_root(),
            })?;
        }
        Commands::SigningRoot { pubkey, withdrawal_credentials, amount_gwei, fork_version } => {
            let domain = compute_deposit_domain(fork_version.0);
            let root = deposit_message_signing_root(
                pubkey.as_slice(),
                amount_gwei,
                withdrawal_credentials,
                domain,
            )?;
            println!("{root}");
        }
        Commands::AccruedFee { total_value, in_out_delta, quarantined, settled_growth, fee_rate } => {
            let report = Report::new(total_value, in_out_delta, 0);
            let quarantine = (quarantined > 0)
                .then_some(Quarantine { pending_total_value: quarantined, start_timestamp: 0 });
            let breakdown = FeeBreakdown::compute(
                &report,
                quarantine.as_ref(),
                settled_growth,
                fee_rate,
                config.abnormally_high_fee_threshold_bp,
            )?;
            if breakdown.is_abnormal() {
                warn!(fee = breakdown.fee, threshold = breakdown.threshold, "Fee above threshold");
            }
            print_json(&breakdown)?;
        }
        Commands::DepositCalldata { path, contract } => {
            let input = DepositInput::load(&path)?;
            let tx = input.verify()?.transaction(contract);
            print_json(&tx)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
