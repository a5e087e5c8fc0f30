//! Submission and confirmation engine.
//!
//! One call to [`DeliveryService::deliver`] walks a transaction through
//! `Built → Signed → Broadcast → Pending` and ends in exactly one of
//! `Confirmed`, `Reverted` or `TimedOut`. Every step runs sequentially: the
//! nonce is read, the transaction signed, broadcast and polled, and nothing
//! else is in flight for that account meanwhile. Polling is the only step
//! that waits, and it waits through the injected [`Clock`].

use crate::{Clock, DeliveryError, DeliveryInterface, TokioClock};
use alloy_primitives::{Address, Bytes, U256};
use deployer_account::{recover_address, AccountService};
use deployer_tx::{
	predict_contract_address, ReplayProtection, SignedTransaction, UnsignedTransaction,
};
use deployer_types::{
	format_units, ChainData, NetworksConfig, TransactionHash, TransactionReceipt,
};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A progress line is logged at `info` every this many empty polls.
const PROGRESS_EVERY: u32 = 5;

/// Knobs for the submission engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliverySettings {
	/// Delay between two receipt polls.
	pub poll_interval: Duration,
	/// Maximum number of receipt polls before giving up with `TimedOut`.
	pub max_attempts: u32,
	/// Compare the balance against the maximum cost before broadcasting.
	pub check_balance: bool,
	/// How the chain id is bound into signatures.
	pub replay_protection: ReplayProtection,
}

impl Default for DeliverySettings {
	fn default() -> Self {
		Self {
			poll_interval: Duration::from_secs(2),
			max_attempts: 60,
			check_balance: true,
			replay_protection: ReplayProtection::Eip155,
		}
	}
}

/// Where a transaction is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionState {
	Built,
	Signed,
	Broadcast,
	Pending,
	Confirmed,
	Reverted,
	TimedOut,
}

impl fmt::Display for SubmissionState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			SubmissionState::Built => "built",
			SubmissionState::Signed => "signed",
			SubmissionState::Broadcast => "broadcast",
			SubmissionState::Pending => "pending",
			SubmissionState::Confirmed => "confirmed",
			SubmissionState::Reverted => "reverted",
			SubmissionState::TimedOut => "timed_out",
		};
		f.write_str(name)
	}
}

/// What the caller wants sent. Unset nonce and gas price are read from the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
	pub chain_id: u64,
	pub to: Option<Address>,
	pub value: U256,
	pub data: Bytes,
	pub gas_limit: u64,
	pub gas_price: Option<U256>,
	pub nonce: Option<u64>,
}

impl TransactionRequest {
	/// A call or value transfer to `to`.
	pub fn call(chain_id: u64, to: Address, gas_limit: u64) -> Self {
		Self {
			chain_id,
			to: Some(to),
			value: U256::ZERO,
			data: Bytes::new(),
			gas_limit,
			gas_price: None,
			nonce: None,
		}
	}

	/// A contract creation carrying `init_code`.
	pub fn deployment(chain_id: u64, init_code: Bytes, gas_limit: u64) -> Self {
		Self {
			chain_id,
			to: None,
			value: U256::ZERO,
			data: init_code,
			gas_limit,
			gas_price: None,
			nonce: None,
		}
	}

	pub fn with_value(mut self, value: U256) -> Self {
		self.value = value;
		self
	}

	pub fn with_data(mut self, data: Bytes) -> Self {
		self.data = data;
		self
	}

	pub fn with_gas_price(mut self, gas_price: U256) -> Self {
		self.gas_price = Some(gas_price);
		self
	}

	pub fn with_nonce(mut self, nonce: u64) -> Self {
		self.nonce = Some(nonce);
		self
	}
}

/// Terminal result of polling for a receipt.
///
/// None of these are errors: a revert or a timeout is an expected outcome the
/// caller has to handle, and the hash is always available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
	/// The receipt reports success.
	Confirmed(TransactionReceipt),
	/// The receipt reports failed execution.
	Reverted(TransactionReceipt),
	/// No receipt within the attempt budget. The transaction may still land.
	TimedOut {
		hash: TransactionHash,
		attempts: u32,
	},
}

impl ConfirmationOutcome {
	pub fn state(&self) -> SubmissionState {
		match self {
			ConfirmationOutcome::Confirmed(_) => SubmissionState::Confirmed,
			ConfirmationOutcome::Reverted(_) => SubmissionState::Reverted,
			ConfirmationOutcome::TimedOut { .. } => SubmissionState::TimedOut,
		}
	}

	pub fn hash(&self) -> TransactionHash {
		match self {
			ConfirmationOutcome::Confirmed(receipt) | ConfirmationOutcome::Reverted(receipt) => {
				receipt.hash
			},
			ConfirmationOutcome::TimedOut { hash, .. } => *hash,
		}
	}

	pub fn receipt(&self) -> Option<&TransactionReceipt> {
		match self {
			ConfirmationOutcome::Confirmed(receipt) | ConfirmationOutcome::Reverted(receipt) => {
				Some(receipt)
			},
			ConfirmationOutcome::TimedOut { .. } => None,
		}
	}
}

/// The predicted `CREATE` address differs from what the receipt reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredictionMismatch {
	pub predicted: Address,
	pub actual: Option<Address>,
}

/// Everything a caller needs to verify a delivery on an explorer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
	pub chain_id: u64,
	pub sender: Address,
	pub nonce: u64,
	pub hash: TransactionHash,
	pub outcome: ConfirmationOutcome,
	/// Locally predicted address, for contract creations only.
	pub predicted_address: Option<Address>,
	pub prediction_mismatch: Option<PredictionMismatch>,
	pub tx_url: Option<String>,
	pub address_url: Option<String>,
}

impl DeliveryReport {
	pub fn state(&self) -> SubmissionState {
		self.outcome.state()
	}

	/// The deployed address: the receipt's when known, otherwise the prediction.
	pub fn contract_address(&self) -> Option<Address> {
		self.outcome
			.receipt()
			.and_then(|receipt| receipt.contract_address)
			.or(self.predicted_address)
	}
}

/// Result of asking one configured network which chain it serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
	pub chain_id: u64,
	pub name: String,
	pub reported_chain_id: Option<u64>,
	pub error: Option<String>,
}

impl ProbeResult {
	/// Reachable and serving the configured chain.
	pub fn is_available(&self) -> bool {
		self.reported_chain_id == Some(self.chain_id)
	}
}

/// Bookkeeping for one confirmation wait.
#[derive(Debug)]
struct SubmissionAttempt {
	made: u32,
	budget: u32,
}

impl SubmissionAttempt {
	fn new(budget: u32) -> Self {
		Self {
			made: 0,
			budget: budget.max(1),
		}
	}

	/// Starts the next poll, returning its 1-based number, or `None` once the
	/// budget is spent.
	fn next(&mut self) -> Option<u32> {
		if self.exhausted() {
			return None;
		}
		self.made += 1;
		Some(self.made)
	}

	fn exhausted(&self) -> bool {
		self.made >= self.budget
	}
}

/// Drives transactions from one account to the configured networks.
pub struct DeliveryService {
	/// Providers in preference order, keyed by chain id.
	providers: Vec<(u64, Box<dyn DeliveryInterface>)>,
	networks: NetworksConfig,
	account: Arc<AccountService>,
	settings: DeliverySettings,
	clock: Arc<dyn Clock>,
}

impl DeliveryService {
	/// Creates a service that sleeps on the tokio timer.
	pub fn new(
		providers: Vec<(u64, Box<dyn DeliveryInterface>)>,
		networks: NetworksConfig,
		account: Arc<AccountService>,
		settings: DeliverySettings,
	) -> Self {
		Self {
			providers,
			networks,
			account,
			settings,
			clock: Arc::new(TokioClock),
		}
	}

	/// Replaces the clock used between receipt polls.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;
		self
	}

	/// Configured chain ids in preference order.
	pub fn network_ids(&self) -> Vec<u64> {
		self.providers.iter().map(|(chain_id, _)| *chain_id).collect()
	}

	fn provider(&self, chain_id: u64) -> Result<&dyn DeliveryInterface, DeliveryError> {
		self.providers
			.iter()
			.find(|(id, _)| *id == chain_id)
			.map(|(_, provider)| provider.as_ref())
			.ok_or(DeliveryError::NoProviderAvailable)
	}

	fn network_name(&self, chain_id: u64) -> String {
		self.networks
			.get(&chain_id)
			.map(|network| network.name.clone())
			.unwrap_or_else(|| chain_id.to_string())
	}

	/// Address of the sending account.
	pub async fn address(&self) -> Result<Address, DeliveryError> {
		Ok(self.account.address().await?)
	}

	/// Asks every configured network for its chain id.
	pub async fn probe_all(&self) -> Vec<ProbeResult> {
		let mut results = Vec::with_capacity(self.providers.len());
		for (chain_id, provider) in &self.providers {
			let (reported_chain_id, error) = match provider.chain_id().await {
				Ok(reported) => (Some(reported), None),
				Err(e) => (None, Some(e.to_string())),
			};
			results.push(ProbeResult {
				chain_id: *chain_id,
				name: self.network_name(*chain_id),
				reported_chain_id,
				error,
			});
		}
		results
	}

	/// Picks the first configured network that answers with the expected
	/// chain id.
	pub async fn probe(&self) -> Result<u64, DeliveryError> {
		for result in self.probe_all().await {
			if result.is_available() {
				tracing::info!(
					chain_id = result.chain_id,
					network = %result.name,
					"Selected network"
				);
				return Ok(result.chain_id);
			}
			match (&result.reported_chain_id, &result.error) {
				(Some(reported), _) => tracing::warn!(
					chain_id = result.chain_id,
					reported_chain_id = reported,
					network = %result.name,
					"Skipping network reporting a different chain id"
				),
				(None, error) => tracing::warn!(
					chain_id = result.chain_id,
					network = %result.name,
					error = error.as_deref().unwrap_or("unknown"),
					"Skipping unreachable network"
				),
			}
		}
		Err(DeliveryError::NoProviderAvailable)
	}

	/// Balance of `address` on `chain_id`.
	pub async fn balance(&self, chain_id: u64, address: &Address) -> Result<U256, DeliveryError> {
		self.provider(chain_id)?.balance(address).await
	}

	/// Next nonce of `address` on `chain_id`.
	pub async fn nonce(&self, chain_id: u64, address: &Address) -> Result<u64, DeliveryError> {
		self.provider(chain_id)?.nonce(address).await
	}

	/// Current gas price and block height of `chain_id`.
	pub async fn chain_data(&self, chain_id: u64) -> Result<ChainData, DeliveryError> {
		let provider = self.provider(chain_id)?;
		Ok(ChainData {
			chain_id: provider.chain_id().await?,
			gas_price: provider.gas_price().await?,
			block_number: provider.block_number().await?,
		})
	}

	/// Builds and signs a transaction (`Built → Signed`).
	///
	/// Checks the node's chain id, fills nonce and gas price from the node when
	/// the request leaves them unset, compares the balance against the maximum
	/// cost when enabled, and verifies that the signature recovers to the
	/// sending account. Nothing is broadcast.
	pub async fn prepare(
		&self,
		request: &TransactionRequest,
	) -> Result<SignedTransaction, DeliveryError> {
		let provider = self.provider(request.chain_id)?;

		let reported = provider.chain_id().await?;
		if reported != request.chain_id {
			return Err(DeliveryError::Network(format!(
				"node for {} reports chain id {}, expected {}",
				self.network_name(request.chain_id),
				reported,
				request.chain_id
			)));
		}

		let sender = self.account.address().await?;
		let nonce = match request.nonce {
			Some(nonce) => nonce,
			None => provider.nonce(&sender).await?,
		};
		let gas_price = match request.gas_price {
			Some(gas_price) => gas_price,
			None => provider.gas_price().await?,
		};

		let tx = UnsignedTransaction {
			nonce,
			gas_price,
			gas_limit: request.gas_limit,
			to: request.to,
			value: request.value,
			data: request.data.clone(),
			chain_id: request.chain_id,
		};
		let protection = self.settings.replay_protection;
		tx.validate(protection)?;
		tracing::info!(
			state = %SubmissionState::Built,
			chain_id = tx.chain_id,
			nonce,
			gas_price = %format_units(gas_price, 9),
			gas_limit = tx.gas_limit,
			create = tx.is_create(),
			"Transaction built"
		);
		if protection == ReplayProtection::None {
			tracing::warn!(chain_id = tx.chain_id, "Signing without EIP-155 replay protection");
		}

		if self.settings.check_balance {
			let available = provider.balance(&sender).await?;
			let required = tx.max_cost();
			if available < required {
				return Err(DeliveryError::InsufficientFunds {
					required,
					available,
				});
			}
		}

		let signed = self.account.sign_transaction(&tx, protection).await?;
		let recovered = recover_address(signed.signing_hash()?.as_slice(), &signed.signature()?)?;
		if recovered != sender {
			return Err(DeliveryError::SignerMismatch {
				expected: sender,
				recovered,
			});
		}
		tracing::info!(
			state = %SubmissionState::Signed,
			tx_hash = %signed.hash(),
			v = signed.v,
			"Transaction signed"
		);
		Ok(signed)
	}

	/// Submits a signed transaction (`Signed → Broadcast → Pending`).
	pub async fn broadcast(
		&self,
		signed: &SignedTransaction,
	) -> Result<TransactionHash, DeliveryError> {
		let chain_id = signed.tx.chain_id;
		let provider = self.provider(chain_id)?;
		let local = signed.hash();

		tracing::info!(
			state = %SubmissionState::Broadcast,
			tx_hash = %local,
			chain_id,
			"Broadcasting transaction"
		);
		let hash = provider.send_raw_transaction(&signed.encode_raw()).await?;
		if hash != local {
			tracing::warn!(
				tx_hash = %hash,
				local_hash = %local,
				"Node reported a different transaction hash"
			);
		}
		tracing::info!(
			state = %SubmissionState::Pending,
			tx_hash = %hash,
			chain_id,
			"Transaction pending"
		);
		Ok(hash)
	}

	/// Polls for the receipt until it appears or the attempt budget runs out
	/// (`Pending → Confirmed | Reverted | TimedOut`).
	///
	/// Network failures during a poll count as an empty poll. Sleeps happen
	/// only between polls, never after the last one.
	pub async fn confirm(
		&self,
		chain_id: u64,
		hash: &TransactionHash,
	) -> Result<ConfirmationOutcome, DeliveryError> {
		let provider = self.provider(chain_id)?;
		let mut attempt = SubmissionAttempt::new(self.settings.max_attempts);

		while let Some(n) = attempt.next() {
			match provider.receipt(hash).await {
				Ok(Some(receipt)) => return Ok(self.settle(receipt)),
				Ok(None) => {
					tracing::debug!(tx_hash = %hash, attempt = n, "No receipt yet");
					if n % PROGRESS_EVERY == 0 {
						tracing::info!(
							tx_hash = %hash,
							attempt = n,
							max_attempts = attempt.budget,
							"Still waiting for receipt"
						);
					}
				},
				Err(DeliveryError::Network(error)) => {
					tracing::warn!(tx_hash = %hash, attempt = n, %error, "Receipt poll failed");
				},
				Err(e) => return Err(e),
			}
			if !attempt.exhausted() {
				self.clock.sleep(self.settings.poll_interval).await;
			}
		}

		tracing::warn!(
			state = %SubmissionState::TimedOut,
			tx_hash = %hash,
			attempts = attempt.made,
			"No receipt within the attempt budget; the transaction may still confirm"
		);
		Ok(ConfirmationOutcome::TimedOut {
			hash: *hash,
			attempts: attempt.made,
		})
	}

	fn settle(&self, receipt: TransactionReceipt) -> ConfirmationOutcome {
		if receipt.success {
			tracing::info!(
				state = %SubmissionState::Confirmed,
				tx_hash = %receipt.hash,
				block_number = ?receipt.block_number,
				gas_used = receipt.gas_used,
				"Transaction confirmed"
			);
			ConfirmationOutcome::Confirmed(receipt)
		} else {
			tracing::error!(
				state = %SubmissionState::Reverted,
				tx_hash = %receipt.hash,
				block_number = ?receipt.block_number,
				gas_used = receipt.gas_used,
				"Transaction reverted"
			);
			ConfirmationOutcome::Reverted(receipt)
		}
	}

	/// Runs the whole lifecycle for one request.
	///
	/// Errors are returned only for failures before the node accepted the
	/// transaction, or for a broken node during polling. Once a hash exists
	/// the result is a report carrying it.
	pub async fn deliver(
		&self,
		request: &TransactionRequest,
	) -> Result<DeliveryReport, DeliveryError> {
		let signed = self.prepare(request).await?;
		let sender = self.account.address().await?;
		let predicted_address = signed
			.tx
			.is_create()
			.then(|| predict_contract_address(&sender, signed.tx.nonce));
		if let Some(predicted) = predicted_address {
			tracing::info!(predicted = %predicted.to_checksum(None), "Predicted contract address");
		}

		let hash = self.broadcast(&signed).await?;
		let outcome = self
			.confirm(request.chain_id, &hash)
			.await
			.map_err(|source| DeliveryError::Unconfirmed {
				hash,
				source: Box::new(source),
			})?;

		let prediction_mismatch =
			predicted_address.and_then(|predicted| reconcile_prediction(predicted, &outcome));

		let network = self.networks.get(&request.chain_id);
		let tx_url = network.and_then(|n| n.tx_url(&hash.to_string()));
		let address_url = outcome
			.receipt()
			.and_then(|receipt| receipt.contract_address)
			.or(predicted_address)
			.and_then(|address| {
				network.and_then(|n| n.address_url(&address.to_checksum(None)))
			});

		Ok(DeliveryReport {
			chain_id: request.chain_id,
			sender,
			nonce: signed.tx.nonce,
			hash,
			outcome,
			predicted_address,
			prediction_mismatch,
			tx_url,
			address_url,
		})
	}

	/// Deploys `init_code` and reconciles the predicted address with the receipt.
	pub async fn deploy(
		&self,
		chain_id: u64,
		init_code: Bytes,
		gas_limit: u64,
		value: U256,
	) -> Result<DeliveryReport, DeliveryError> {
		let request =
			TransactionRequest::deployment(chain_id, init_code, gas_limit).with_value(value);
		self.deliver(&request).await
	}
}

/// Compares the prediction with a successful receipt. Only confirmed
/// creations are compared.
fn reconcile_prediction(
	predicted: Address,
	outcome: &ConfirmationOutcome,
) -> Option<PredictionMismatch> {
	let ConfirmationOutcome::Confirmed(receipt) = outcome else {
		return None;
	};
	if receipt.contract_address == Some(predicted) {
		return None;
	}
	tracing::warn!(
		predicted = %predicted.to_checksum(None),
		actual = ?receipt.contract_address,
		"Contract address differs from prediction"
	);
	Some(PredictionMismatch {
		predicted,
		actual: receipt.contract_address,
	})
}
