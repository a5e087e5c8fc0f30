//! Input parsing and output rendering for the `deployer` subcommands.
//!
//! Everything here is kept free of I/O (apart from reading a bytecode file)
//! so the text the binary prints can be checked in tests.

use alloy_primitives::{Address, Bytes, B256, U256};
use deployer_account::recover_address;
use deployer_delivery::{ConfirmationOutcome, DeliveryReport, DeliveryService, ProbeResult};
use deployer_tx::{predict_contract_address, SignedTransaction};
use deployer_types::{format_units, parse_hex_bytes, ChainData, NetworkConfig, TransactionHash};
use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Failures reported by the command layer itself.
#[derive(Debug, Error)]
pub enum CommandError {
	#[error("Network {0} is not listed in delivery.network_ids")]
	UnknownNetwork(u64),
	#[error("Invalid input: {0}")]
	InvalidInput(String),
	#[error("Transaction {0} reverted")]
	Reverted(TransactionHash),
	#[error(
		"Transaction {hash} has no receipt after {attempts} attempts; \
		resume with `deployer receipt --hash {hash}`"
	)]
	TimedOut {
		hash: TransactionHash,
		attempts: u32,
	},
}

/// Uses the requested chain when it is configured, otherwise the first
/// network that answers with the expected chain id.
pub async fn select_chain(
	service: &DeliveryService,
	requested: Option<u64>,
) -> Result<u64, Box<dyn std::error::Error>> {
	match requested {
		Some(chain_id) if service.network_ids().contains(&chain_id) => Ok(chain_id),
		Some(chain_id) => Err(CommandError::UnknownNetwork(chain_id).into()),
		None => Ok(service.probe().await?),
	}
}

/// Parses a wei amount given in decimal or as `0x` hex.
pub fn parse_wei(input: &str) -> Result<U256, CommandError> {
	U256::from_str(input.trim())
		.map_err(|e| CommandError::InvalidInput(format!("'{}' is not an amount: {}", input, e)))
}

pub fn parse_address(input: &str) -> Result<Address, CommandError> {
	deployer_types::parse_address(input).map_err(|e| CommandError::InvalidInput(e.to_string()))
}

pub fn parse_data(input: &str) -> Result<Bytes, CommandError> {
	parse_hex_bytes(input)
		.map(Bytes::from)
		.map_err(|e| CommandError::InvalidInput(e.to_string()))
}

pub fn parse_tx_hash(input: &str) -> Result<TransactionHash, CommandError> {
	let bytes = parse_hex_bytes(input).map_err(|e| CommandError::InvalidInput(e.to_string()))?;
	if bytes.len() != 32 {
		return Err(CommandError::InvalidInput(format!(
			"transaction hash must be 32 bytes, got {}",
			bytes.len()
		)));
	}
	Ok(TransactionHash(B256::from_slice(&bytes)))
}

/// Contract creation code, either inline hex or a file holding hex text.
pub async fn read_init_code(
	bytecode: Option<&str>,
	file: Option<&Path>,
) -> Result<Bytes, Box<dyn std::error::Error>> {
	let text = match (bytecode, file) {
		(Some(hex), None) => hex.to_string(),
		(None, Some(path)) => tokio::fs::read_to_string(path).await?,
		_ => {
			return Err(CommandError::InvalidInput(
				"provide exactly one of --bytecode or --bytecode-file".into(),
			)
			.into())
		},
	};

	let code = parse_data(&text)?;
	if code.is_empty() {
		return Err(CommandError::InvalidInput("contract bytecode is empty".into()).into());
	}
	Ok(code)
}

/// Maps an outcome onto the process result: only a confirmation succeeds.
pub fn outcome_status(outcome: &ConfirmationOutcome) -> Result<(), CommandError> {
	match outcome {
		ConfirmationOutcome::Confirmed(_) => Ok(()),
		ConfirmationOutcome::Reverted(receipt) => Err(CommandError::Reverted(receipt.hash)),
		ConfirmationOutcome::TimedOut { hash, attempts } => Err(CommandError::TimedOut {
			hash: *hash,
			attempts: *attempts,
		}),
	}
}

pub fn render_balance(
	address: &Address,
	balance: U256,
	chain_id: u64,
	network: Option<&NetworkConfig>,
) -> String {
	let (name, symbol) = network
		.map(|n| (n.name.as_str(), n.native_symbol.as_str()))
		.unwrap_or(("unknown", "ETH"));
	format!(
		"{} on {} ({}): {} {} ({} wei)",
		address.to_checksum(None),
		name,
		chain_id,
		format_units(balance, 18),
		symbol,
		balance
	)
}

/// One line per network. Reachable networks show block height and gas price
/// when the follow-up query succeeded.
pub fn render_probe(results: &[(ProbeResult, Option<ChainData>)]) -> String {
	let mut out = String::new();
	for (result, data) in results {
		let status = match (&result.reported_chain_id, &result.error) {
			_ if result.is_available() => match data {
				Some(data) => format!(
					"ok, block {}, gas {} gwei",
					data.block_number,
					format_units(data.gas_price, 9)
				),
				None => "ok".to_string(),
			},
			(Some(reported), _) => format!("wrong chain (node reports {})", reported),
			(None, Some(error)) => format!("unreachable ({})", error),
			(None, None) => "unreachable".to_string(),
		};
		let _ = writeln!(out, "{:>10}  {:<24} {}", result.chain_id, result.name, status);
	}
	out
}

pub fn render_outcome(outcome: &ConfirmationOutcome) -> String {
	let mut out = String::new();
	let _ = writeln!(out, "Status:       {}", outcome.state());
	match outcome {
		ConfirmationOutcome::Confirmed(receipt) | ConfirmationOutcome::Reverted(receipt) => {
			if let Some(block) = receipt.block_number {
				let _ = writeln!(out, "Block:        {}", block);
			}
			let _ = writeln!(out, "Gas used:     {}", receipt.gas_used);
			if let Some(contract) = receipt.contract_address {
				let _ = writeln!(out, "Contract:     {}", contract.to_checksum(None));
			}
		},
		ConfirmationOutcome::TimedOut { attempts, .. } => {
			let _ = writeln!(out, "Attempts:     {}", attempts);
		},
	}
	out
}

pub fn render_report(report: &DeliveryReport) -> String {
	let mut out = String::new();
	let _ = writeln!(out, "Chain id:     {}", report.chain_id);
	let _ = writeln!(out, "From:         {}", report.sender.to_checksum(None));
	let _ = writeln!(out, "Nonce:        {}", report.nonce);
	let _ = writeln!(out, "Tx hash:      {}", report.hash);
	out.push_str(&render_outcome(&report.outcome));
	if let Some(predicted) = report.predicted_address {
		let _ = writeln!(out, "Predicted:    {}", predicted.to_checksum(None));
	}
	if let Some(mismatch) = &report.prediction_mismatch {
		let actual = mismatch
			.actual
			.map(|a| a.to_checksum(None))
			.unwrap_or_else(|| "none".to_string());
		let _ = writeln!(
			out,
			"WARNING: receipt contract address {} differs from predicted {}",
			actual,
			mismatch.predicted.to_checksum(None)
		);
	}
	if let Some(url) = &report.tx_url {
		let _ = writeln!(out, "Explorer:     {}", url);
	}
	if let Some(url) = &report.address_url {
		let _ = writeln!(out, "Address page: {}", url);
	}
	out
}

/// Describes a raw transaction, including the sender recovered from its
/// signature.
pub fn render_decoded(signed: &SignedTransaction) -> Result<String, Box<dyn std::error::Error>> {
	let tx = &signed.tx;
	let sender = recover_address(signed.signing_hash()?.as_slice(), &signed.signature()?)?;

	let mut out = String::new();
	let _ = writeln!(out, "Hash:         {}", signed.hash());
	let _ = writeln!(out, "Replay prot.: {:?}", signed.replay_protection());
	if tx.chain_id != 0 {
		let _ = writeln!(out, "Chain id:     {}", tx.chain_id);
	}
	let _ = writeln!(out, "From:         {}", sender.to_checksum(None));
	match tx.to {
		Some(to) => {
			let _ = writeln!(out, "To:           {}", to.to_checksum(None));
		},
		None => {
			let created = predict_contract_address(&sender, tx.nonce);
			let _ = writeln!(out, "To:           (contract creation)");
			let _ = writeln!(out, "Creates:      {}", created.to_checksum(None));
		},
	}
	let _ = writeln!(out, "Nonce:        {}", tx.nonce);
	let _ = writeln!(out, "Gas price:    {} gwei", format_units(tx.gas_price, 9));
	let _ = writeln!(out, "Gas limit:    {}", tx.gas_limit);
	let _ = writeln!(out, "Value:        {} ETH", format_units(tx.value, 18));
	let _ = writeln!(out, "Data:         {} bytes", tx.data.len());
	let _ = writeln!(out, "v:            {}", signed.v);
	let _ = writeln!(out, "r:            {:#x}", signed.r);
	let _ = writeln!(out, "s:            {:#x}", signed.s);
	Ok(out)
}

#[cfg(test)]
mod tests {
	use super::*;
	use deployer_types::TransactionReceipt;
	use std::io::Write;

	const HARDHAT_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
	const GOLDEN_RAW: &str = "0xf86380843b9aca0082520894000000000000000000000000000000000000dead808025a003e958d29a15656af2386b65e621c8201587f1c33f149c8e59ba04ed65d80bc9a068a253689110f83ce4159c0abcffd1a3839f3a5c71e659adcfd29f5dce63bacd";
	const GOLDEN_HASH: &str = "0x9cdaaa78145ea92c3ab4b010d6b4aab9d07ff348ce4abf1a63212ad29715e44f";

	fn receipt(success: bool, contract_address: Option<Address>) -> TransactionReceipt {
		TransactionReceipt {
			hash: parse_tx_hash(GOLDEN_HASH).unwrap(),
			block_number: Some(7),
			gas_used: 21_000,
			success,
			contract_address,
		}
	}

	#[test]
	fn test_parse_wei_accepts_decimal_and_hex() {
		assert_eq!(parse_wei("1000").unwrap(), U256::from(1000u64));
		assert_eq!(parse_wei("0x3e8").unwrap(), U256::from(1000u64));
		assert!(parse_wei("1.5").is_err());
		assert!(parse_wei("-1").is_err());
	}

	#[test]
	fn test_parse_tx_hash_length() {
		assert_eq!(parse_tx_hash(GOLDEN_HASH).unwrap().to_string(), GOLDEN_HASH);
		assert!(parse_tx_hash("0x1234").is_err());
	}

	#[test]
	fn test_parse_address_checks_length() {
		assert_eq!(
			parse_address(HARDHAT_ADDRESS).unwrap().to_checksum(None),
			HARDHAT_ADDRESS
		);
		assert!(parse_address("0xdead").is_err());
	}

	#[tokio::test]
	async fn test_read_init_code_inline_and_file() {
		let inline = read_init_code(Some("0x6080"), None).await.unwrap();
		assert_eq!(inline.as_ref(), &[0x60, 0x80]);

		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "0x60806040").unwrap();
		let from_file = read_init_code(None, Some(file.path())).await.unwrap();
		assert_eq!(from_file.as_ref(), &[0x60, 0x80, 0x60, 0x40]);
	}

	#[tokio::test]
	async fn test_read_init_code_rejects_empty_and_ambiguous() {
		assert!(read_init_code(Some("0x"), None).await.is_err());
		assert!(read_init_code(None, None).await.is_err());
		assert!(read_init_code(Some("0x60"), Some(Path::new("code.hex")))
			.await
			.is_err());
	}

	#[test]
	fn test_outcome_status() {
		let confirmed = ConfirmationOutcome::Confirmed(receipt(true, None));
		assert!(outcome_status(&confirmed).is_ok());

		let reverted = ConfirmationOutcome::Reverted(receipt(false, None));
		assert!(matches!(
			outcome_status(&reverted),
			Err(CommandError::Reverted(_))
		));

		let timed_out = ConfirmationOutcome::TimedOut {
			hash: parse_tx_hash(GOLDEN_HASH).unwrap(),
			attempts: 60,
		};
		let err = outcome_status(&timed_out).unwrap_err();
		assert!(err
			.to_string()
			.contains(&format!("deployer receipt --hash {}", GOLDEN_HASH)));
	}

	#[test]
	fn test_render_balance_in_ether() {
		let address = parse_address(HARDHAT_ADDRESS).unwrap();
		let network = NetworkConfig {
			name: "Hardhat".to_string(),
			rpc_url: "http://127.0.0.1:8545".to_string(),
			explorer_url: None,
			native_symbol: "ETH".to_string(),
		};
		let balance = U256::from(1_500_000_000_000_000_000u64);
		assert_eq!(
			render_balance(&address, balance, 31337, Some(&network)),
			format!(
				"{} on Hardhat (31337): 1.5 ETH (1500000000000000000 wei)",
				HARDHAT_ADDRESS
			)
		);
	}

	#[test]
	fn test_render_probe_statuses() {
		let hardhat = ProbeResult {
			chain_id: 31337,
			name: "Hardhat".into(),
			reported_chain_id: Some(31337),
			error: None,
		};
		let results = vec![
			(
				hardhat.clone(),
				Some(ChainData {
					chain_id: 31337,
					gas_price: U256::from(1_500_000_000u64),
					block_number: 42,
				}),
			),
			(hardhat, None),
			(
				ProbeResult {
					chain_id: 1,
					name: "Mainnet".into(),
					reported_chain_id: Some(5),
					error: None,
				},
				None,
			),
			(
				ProbeResult {
					chain_id: 11155111,
					name: "Sepolia".into(),
					reported_chain_id: None,
					error: Some("Network error: connection refused".into()),
				},
				None,
			),
		];
		let out = render_probe(&results);
		let lines: Vec<_> = out.lines().collect();
		assert!(lines[0].ends_with("ok, block 42, gas 1.5 gwei"));
		assert!(lines[1].ends_with("ok"));
		assert!(lines[2].ends_with("wrong chain (node reports 5)"));
		assert!(lines[3].contains("unreachable (Network error: connection refused)"));
	}

	#[test]
	fn test_render_report_with_mismatch() {
		let predicted = parse_address("0x5fbdb2315678afecb367f032d93f642f64180aa3").unwrap();
		let actual = parse_address(HARDHAT_ADDRESS).unwrap();
		let report = DeliveryReport {
			chain_id: 31337,
			sender: actual,
			nonce: 0,
			hash: parse_tx_hash(GOLDEN_HASH).unwrap(),
			outcome: ConfirmationOutcome::Confirmed(receipt(true, Some(actual))),
			predicted_address: Some(predicted),
			prediction_mismatch: Some(deployer_delivery::PredictionMismatch {
				predicted,
				actual: Some(actual),
			}),
			tx_url: Some(format!("https://explorer.local/tx/{}", GOLDEN_HASH)),
			address_url: None,
		};
		let out = render_report(&report);
		assert!(out.contains("Status:       confirmed"));
		assert!(out.contains("Block:        7"));
		assert!(out.contains("Predicted:    0x5FbDB2315678afecb367f032d93F642f64180aa3"));
		assert!(out.contains("WARNING: receipt contract address"));
		assert!(out.contains("Explorer:     https://explorer.local/tx/"));
	}

	#[test]
	fn test_render_decoded_golden_transfer() {
		let raw = parse_data(GOLDEN_RAW).unwrap();
		let signed = SignedTransaction::decode_raw(&raw).unwrap();
		let out = render_decoded(&signed).unwrap();
		assert!(out.contains(&format!("Hash:         {}", GOLDEN_HASH)));
		assert!(out.contains(&format!("From:         {}", HARDHAT_ADDRESS)));
		assert!(out.contains("Chain id:     1"));
		assert!(out.contains("To:           0x000000000000000000000000000000000000dEaD"));
		assert!(out.contains("Gas price:    1 gwei"));
		assert!(out.contains("v:            37"));
	}

	#[tokio::test]
	async fn test_render_decoded_create_without_code() {
		use deployer_account::{AccountService, LocalAccount};
		use deployer_tx::{ReplayProtection, UnsignedTransaction};
		use deployer_types::SecretString;

		let key = SecretString::from(
			"0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
		);
		let account = AccountService::new(Box::new(LocalAccount::from_secret(&key).unwrap()));
		let tx = UnsignedTransaction {
			nonce: 0,
			gas_price: U256::from(1_000_000_000u64),
			gas_limit: 53_000,
			to: None,
			value: U256::ZERO,
			data: Bytes::new(),
			chain_id: 31337,
		};
		let signed = account
			.sign_transaction(&tx, ReplayProtection::Eip155)
			.await
			.unwrap();

		let decoded = SignedTransaction::decode_raw(&signed.encode_raw()).unwrap();
		let out = render_decoded(&decoded).unwrap();
		assert!(out.contains(&format!("From:         {}", HARDHAT_ADDRESS)));
		assert!(out.contains("To:           (contract creation)"));
		assert!(out.contains("Creates:      0x5FbDB2315678afecb367f032d93F642f64180aa3"));
		assert!(out.contains("Data:         0 bytes"));
	}
}
