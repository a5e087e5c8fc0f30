//! Main entry point for the EVM deployer.
//!
//! The `deployer` binary signs legacy transactions with a locally held key,
//! submits them over JSON-RPC and waits for the receipt. Contract deployments
//! report the predicted `CREATE` address next to the one the node returns.

use alloy_primitives::U256;
use clap::{Parser, Subcommand};
use deployer_account::LocalAccount;
use deployer_config::Config;
use deployer_delivery::{DeliveryError, DeliveryService, TransactionRequest};
use deployer_tx::{predict_contract_address, SignedTransaction};
use std::path::PathBuf;

mod commands;
mod factory_registry;

use commands::{
	outcome_status, parse_address, parse_data, parse_tx_hash, parse_wei, read_init_code,
	render_balance, render_decoded, render_outcome, render_probe, render_report, select_chain,
};
use factory_registry::{build_account, build_delivery_service, get_registry};

/// Command-line arguments for the deployer.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml", env = "DEPLOYER_CONFIG")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Print the address of the configured account
	Address,
	/// Print the account balance
	Balance {
		/// Chain to query; defaults to the first reachable configured network
		#[arg(long)]
		chain_id: Option<u64>,
	},
	/// Check every configured network's RPC endpoint
	Networks,
	/// Predict the address of the next contract the account deploys
	Predict {
		/// Use this nonce instead of asking the node
		#[arg(long)]
		nonce: Option<u64>,
		#[arg(long)]
		chain_id: Option<u64>,
	},
	/// Send a transaction to an address
	Send {
		/// Recipient address
		#[arg(long)]
		to: String,
		/// Amount in wei (decimal or 0x hex)
		#[arg(long, default_value = "0")]
		value: String,
		/// Calldata as hex
		#[arg(long)]
		data: Option<String>,
		#[arg(long, default_value_t = 21_000)]
		gas_limit: u64,
		#[command(flatten)]
		overrides: Overrides,
	},
	/// Deploy a contract from its creation bytecode
	Deploy {
		/// Creation bytecode as hex
		#[arg(long, conflicts_with = "bytecode_file", required_unless_present = "bytecode_file")]
		bytecode: Option<String>,
		/// File containing the creation bytecode as hex text
		#[arg(long)]
		bytecode_file: Option<PathBuf>,
		/// Amount in wei sent to the constructor
		#[arg(long, default_value = "0")]
		value: String,
		#[arg(long, default_value_t = 3_000_000)]
		gas_limit: u64,
		#[command(flatten)]
		overrides: Overrides,
	},
	/// Resume waiting for the receipt of a broadcast transaction
	Receipt {
		/// Transaction hash
		#[arg(long)]
		hash: String,
		#[arg(long)]
		chain_id: Option<u64>,
	},
	/// Decode a raw signed transaction
	Decode {
		/// Raw transaction as hex
		raw: String,
	},
	/// Generate a new random private key and print its address
	Generate,
}

/// Values normally taken from the node.
#[derive(clap::Args, Debug)]
struct Overrides {
	#[arg(long)]
	chain_id: Option<u64>,
	/// Gas price in wei
	#[arg(long)]
	gas_price: Option<String>,
	#[arg(long)]
	nonce: Option<u64>,
}

impl Overrides {
	fn apply(
		&self,
		mut request: TransactionRequest,
	) -> Result<TransactionRequest, Box<dyn std::error::Error>> {
		if let Some(gas_price) = &self.gas_price {
			request = request.with_gas_price(parse_wei(gas_price)?);
		}
		if let Some(nonce) = self.nonce {
			request = request.with_nonce(nonce);
		}
		Ok(request)
	}
}

/// Main entry point for the deployer.
///
/// Parses arguments, installs logging, and runs one subcommand. `decode` and
/// `generate` work without a configuration file.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.with_writer(std::io::stderr)
		.init();

	match &args.command {
		Command::Decode { raw } => {
			let signed = SignedTransaction::decode_raw(&parse_data(raw)?)?;
			print!("{}", render_decoded(&signed)?);
			return Ok(());
		},
		Command::Generate => {
			let (account, secret) = LocalAccount::generate();
			println!("Address:     {}", account.address().to_checksum(None));
			println!("Private key: {}", secret.expose_secret());
			eprintln!("Store the private key securely. It is not saved anywhere.");
			return Ok(());
		},
		_ => {},
	}

	let config_path = args
		.config
		.to_str()
		.ok_or("configuration path is not valid UTF-8")?;
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.deployer.id);

	run(&config, args.command).await
}

async fn run(config: &Config, command: Command) -> Result<(), Box<dyn std::error::Error>> {
	let registry = get_registry();

	if let Command::Address = command {
		let account = build_account(registry, config)?;
		println!("{}", account.address().await?.to_checksum(None));
		return Ok(());
	}

	let service = build_delivery_service(registry, config)?;

	match command {
		Command::Balance { chain_id } => {
			let chain_id = select_chain(&service, chain_id).await?;
			let address = service.address().await?;
			let balance = service.balance(chain_id, &address).await?;
			println!(
				"{}",
				render_balance(&address, balance, chain_id, config.network(chain_id))
			);
		},
		Command::Networks => {
			let mut results = Vec::new();
			for probe in service.probe_all().await {
				let data = if probe.is_available() {
					service.chain_data(probe.chain_id).await.ok()
				} else {
					None
				};
				results.push((probe, data));
			}
			print!("{}", render_probe(&results));
		},
		Command::Predict { nonce, chain_id } => {
			let address = service.address().await?;
			let nonce = match nonce {
				Some(nonce) => nonce,
				None => {
					let chain_id = select_chain(&service, chain_id).await?;
					service.nonce(chain_id, &address).await?
				},
			};
			println!(
				"{}",
				predict_contract_address(&address, nonce).to_checksum(None)
			);
		},
		Command::Send {
			to,
			value,
			data,
			gas_limit,
			overrides,
		} => {
			let chain_id = select_chain(&service, overrides.chain_id).await?;
			let mut request = TransactionRequest::call(chain_id, parse_address(&to)?, gas_limit)
				.with_value(parse_wei(&value)?);
			if let Some(data) = data {
				request = request.with_data(parse_data(&data)?);
			}
			let request = overrides.apply(request)?;
			deliver(&service, &request).await?;
		},
		Command::Deploy {
			bytecode,
			bytecode_file,
			value,
			gas_limit,
			overrides,
		} => {
			let chain_id = select_chain(&service, overrides.chain_id).await?;
			let init_code = read_init_code(bytecode.as_deref(), bytecode_file.as_deref()).await?;
			let request = TransactionRequest::deployment(chain_id, init_code, gas_limit)
				.with_value(parse_wei(&value)?);
			let request = overrides.apply(request)?;
			deliver(&service, &request).await?;
		},
		Command::Receipt { hash, chain_id } => {
			let chain_id = select_chain(&service, chain_id).await?;
			let hash = parse_tx_hash(&hash)?;
			let outcome = service.confirm(chain_id, &hash).await?;
			print!("{}", render_outcome(&outcome));
			outcome_status(&outcome)?;
		},
		Command::Address | Command::Decode { .. } | Command::Generate => {},
	}

	Ok(())
}

async fn deliver(
	service: &DeliveryService,
	request: &TransactionRequest,
) -> Result<(), Box<dyn std::error::Error>> {
	if request.value > U256::ZERO {
		tracing::info!(value = %request.value, "Transferring value");
	}
	let report = service.deliver(request).await.map_err(|e| {
		if let DeliveryError::Unconfirmed { hash, .. } = &e {
			eprintln!(
				"Resume with: deployer receipt --hash {} --chain-id {}",
				hash, request.chain_id
			);
		}
		e
	})?;
	print!("{}", render_report(&report));
	outcome_status(&report.outcome)?;
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_cli_definition_is_consistent() {
		use clap::CommandFactory;
		Args::command().debug_assert();
	}

	#[test]
	fn test_deploy_requires_bytecode_source() {
		assert!(Args::try_parse_from(["deployer", "deploy"]).is_err());
		assert!(Args::try_parse_from([
			"deployer",
			"deploy",
			"--bytecode",
			"0x6080",
			"--bytecode-file",
			"code.hex"
		])
		.is_err());

		let args = Args::try_parse_from(["deployer", "deploy", "--bytecode", "0x6080"]).unwrap();
		match args.command {
			Command::Deploy {
				bytecode,
				gas_limit,
				..
			} => {
				assert_eq!(bytecode.as_deref(), Some("0x6080"));
				assert_eq!(gas_limit, 3_000_000);
			},
			other => panic!("unexpected command {:?}", other),
		}
	}

	#[test]
	fn test_send_overrides() {
		let args = Args::try_parse_from([
			"deployer",
			"--config",
			"local.toml",
			"send",
			"--to",
			"0x000000000000000000000000000000000000dead",
			"--value",
			"1000",
			"--chain-id",
			"31337",
			"--gas-price",
			"1000000000",
			"--nonce",
			"4",
		])
		.unwrap();
		assert_eq!(args.config, PathBuf::from("local.toml"));

		let Command::Send {
			to,
			gas_limit,
			overrides,
			..
		} = args.command
		else {
			panic!("expected send");
		};
		assert_eq!(gas_limit, 21_000);
		assert_eq!(overrides.chain_id, Some(31337));

		let request = overrides
			.apply(TransactionRequest::call(
				31337,
				parse_address(&to).unwrap(),
				gas_limit,
			))
			.unwrap();
		assert_eq!(request.gas_price, Some(U256::from(1_000_000_000u64)));
		assert_eq!(request.nonce, Some(4));
	}

	#[test]
	fn test_decode_needs_no_config_flag() {
		let args = Args::try_parse_from(["deployer", "decode", "0xf863"]).unwrap();
		assert!(matches!(args.command, Command::Decode { .. }));
	}
}
