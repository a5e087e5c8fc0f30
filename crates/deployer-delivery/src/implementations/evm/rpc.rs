//! JSON-RPC 2.0 over HTTP.
//!
//! This module provides the concrete [`DeliveryInterface`] used against real
//! nodes. It speaks the handful of `eth_*` methods the engine needs and
//! nothing else. Signing happens before anything reaches this layer, so the
//! node only ever sees `eth_sendRawTransaction`.

use crate::{DeliveryError, DeliveryInterface};
use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use deployer_types::{
	parse_address, parse_hex_bytes, parse_quantity_u256, parse_quantity_u64, with_0x_prefix,
	ConfigSchema, Field, FieldType, NetworkConfig, Schema, TransactionHash, TransactionReceipt,
	ValidationError,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Default per-request timeout.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
	jsonrpc: &'static str,
	id: u64,
	method: &'a str,
	params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
	#[serde(default)]
	result: Option<Value>,
	#[serde(default)]
	error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
	code: i64,
	message: String,
}

/// Receipt fields as the node returns them; everything is a hex string.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
	transaction_hash: String,
	#[serde(default)]
	block_number: Option<String>,
	gas_used: String,
	#[serde(default)]
	status: Option<String>,
	#[serde(default)]
	contract_address: Option<String>,
}

/// A node reachable over HTTP.
pub struct HttpRpcDelivery {
	client: reqwest::Client,
	url: String,
	next_id: AtomicU64,
}

impl HttpRpcDelivery {
	/// Creates a client for `url` with the given per-request timeout.
	pub fn new(url: &str, timeout: Duration) -> Result<Self, DeliveryError> {
		reqwest::Url::parse(url)
			.map_err(|e| DeliveryError::Network(format!("Invalid RPC URL {}: {}", url, e)))?;
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| DeliveryError::Network(format!("Failed to build HTTP client: {}", e)))?;
		Ok(Self {
			client,
			url: url.to_string(),
			next_id: AtomicU64::new(1),
		})
	}

	/// Performs one JSON-RPC call and returns its `result`, which is `None`
	/// when the node answered `null`.
	async fn call(&self, method: &str, params: Value) -> Result<Option<Value>, DeliveryError> {
		let request = RpcRequest {
			jsonrpc: "2.0",
			id: self.next_id.fetch_add(1, Ordering::Relaxed),
			method,
			params,
		};
		tracing::trace!(method, id = request.id, "JSON-RPC request");

		let response = self
			.client
			.post(&self.url)
			.json(&request)
			.send()
			.await
			.map_err(|e| DeliveryError::Network(format!("{} failed: {}", method, e)))?;

		let status = response.status();
		if !status.is_success() {
			return Err(DeliveryError::Network(format!(
				"{} failed: HTTP {}",
				method, status
			)));
		}

		let body: RpcResponse = response
			.json()
			.await
			.map_err(|e| DeliveryError::InvalidResponse(format!("{}: {}", method, e)))?;

		if let Some(error) = body.error {
			return Err(DeliveryError::Rpc {
				code: error.code,
				message: error.message,
			});
		}
		Ok(body.result)
	}

	/// Calls a method whose result must be a hex string.
	async fn call_string(&self, method: &str, params: Value) -> Result<String, DeliveryError> {
		match self.call(method, params).await? {
			Some(Value::String(s)) => Ok(s),
			other => Err(DeliveryError::InvalidResponse(format!(
				"{}: expected a hex string, got {:?}",
				method, other
			))),
		}
	}

	async fn call_u64(&self, method: &str, params: Value) -> Result<u64, DeliveryError> {
		let value = self.call_string(method, params).await?;
		parse_quantity_u64(&value)
			.map_err(|e| DeliveryError::InvalidResponse(format!("{}: {}", method, e)))
	}

	async fn call_u256(&self, method: &str, params: Value) -> Result<U256, DeliveryError> {
		let value = self.call_string(method, params).await?;
		parse_quantity_u256(&value)
			.map_err(|e| DeliveryError::InvalidResponse(format!("{}: {}", method, e)))
	}
}

fn parse_hash(value: &str) -> Result<TransactionHash, DeliveryError> {
	let bytes = parse_hex_bytes(value)
		.map_err(|e| DeliveryError::InvalidResponse(format!("transaction hash: {}", e)))?;
	if bytes.len() != 32 {
		return Err(DeliveryError::InvalidResponse(format!(
			"transaction hash must be 32 bytes, got {}",
			bytes.len()
		)));
	}
	Ok(TransactionHash(B256::from_slice(&bytes)))
}

/// Converts a raw receipt object into a [`TransactionReceipt`].
///
/// Only `status == "0x1"` counts as success. Receipts without a status field
/// (pre-Byzantium) are reported as failed.
fn parse_receipt(value: Value) -> Result<TransactionReceipt, DeliveryError> {
	let raw: RpcReceipt = serde_json::from_value(value)
		.map_err(|e| DeliveryError::InvalidResponse(format!("receipt: {}", e)))?;

	let invalid = |field: &str, e: deployer_types::ConversionError| {
		DeliveryError::InvalidResponse(format!("receipt {}: {}", field, e))
	};

	let block_number = raw
		.block_number
		.as_deref()
		.map(parse_quantity_u64)
		.transpose()
		.map_err(|e| invalid("blockNumber", e))?;
	let gas_used = parse_quantity_u64(&raw.gas_used).map_err(|e| invalid("gasUsed", e))?;
	let success = match raw.status.as_deref() {
		Some(status) => parse_quantity_u64(status).map_err(|e| invalid("status", e))? == 1,
		None => false,
	};
	let contract_address = raw
		.contract_address
		.as_deref()
		.map(parse_address)
		.transpose()
		.map_err(|e| invalid("contractAddress", e))?;

	Ok(TransactionReceipt {
		hash: parse_hash(&raw.transaction_hash)?,
		block_number,
		gas_used,
		success,
		contract_address,
	})
}

fn address_param(address: &Address) -> String {
	with_0x_prefix(&hex::encode(address.as_slice()))
}

/// Configuration schema for the JSON-RPC delivery provider.
///
/// Validates the parts of the `[delivery]` table this implementation reads.
pub struct HttpRpcDeliverySchema;

impl HttpRpcDeliverySchema {
	/// Static validation method for use before instance creation
	pub fn validate_config(config: &toml::Value) -> Result<(), ValidationError> {
		let instance = Self;
		instance.validate(config)
	}
}

impl ConfigSchema for HttpRpcDeliverySchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			// Required fields
			vec![Field::new(
				"network_ids",
				FieldType::Array(Box::new(FieldType::Integer {
					min: Some(1),
					max: None,
				})),
			)
			.with_validator(|value| match value.as_array() {
				Some(arr) if arr.is_empty() => Err("network_ids cannot be empty".to_string()),
				Some(_) => Ok(()),
				None => Err("network_ids must be an array".to_string()),
			})],
			// Optional fields
			vec![Field::new(
				"request_timeout_seconds",
				FieldType::Integer {
					min: Some(1),
					max: Some(300),
				},
			)],
		);

		schema.validate(config)
	}
}

#[async_trait]
impl DeliveryInterface for HttpRpcDelivery {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(HttpRpcDeliverySchema)
	}

	async fn chain_id(&self) -> Result<u64, DeliveryError> {
		self.call_u64("eth_chainId", json!([])).await
	}

	async fn nonce(&self, address: &Address) -> Result<u64, DeliveryError> {
		self.call_u64(
			"eth_getTransactionCount",
			json!([address_param(address), "latest"]),
		)
		.await
	}

	async fn gas_price(&self) -> Result<U256, DeliveryError> {
		self.call_u256("eth_gasPrice", json!([])).await
	}

	async fn balance(&self, address: &Address) -> Result<U256, DeliveryError> {
		self.call_u256("eth_getBalance", json!([address_param(address), "latest"]))
			.await
	}

	async fn block_number(&self) -> Result<u64, DeliveryError> {
		self.call_u64("eth_blockNumber", json!([])).await
	}

	async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TransactionHash, DeliveryError> {
		let raw_hex = with_0x_prefix(&hex::encode(raw));
		let hash = self
			.call_string("eth_sendRawTransaction", json!([raw_hex]))
			.await
			.map_err(|e| match e {
				DeliveryError::Rpc { code, message } => {
					DeliveryError::BroadcastRejected { code, message }
				},
				other => other,
			})?;
		parse_hash(&hash)
	}

	async fn receipt(
		&self,
		hash: &TransactionHash,
	) -> Result<Option<TransactionReceipt>, DeliveryError> {
		match self
			.call("eth_getTransactionReceipt", json!([hash.to_string()]))
			.await?
		{
			None => Ok(None),
			Some(value) => parse_receipt(value).map(Some),
		}
	}
}

/// Factory function to create a JSON-RPC delivery provider from configuration.
///
/// # Parameters
/// - `config`: the `[delivery]` table; `request_timeout_seconds` is optional
/// - `network`: the network whose `rpc_url` this instance will call
pub fn create_http_delivery(
	config: &toml::Value,
	network: &NetworkConfig,
) -> Result<Box<dyn DeliveryInterface>, DeliveryError> {
	HttpRpcDeliverySchema::validate_config(config)
		.map_err(|e| DeliveryError::Network(format!("Invalid configuration: {}", e)))?;

	let timeout = config
		.get("request_timeout_seconds")
		.and_then(|v| v.as_integer())
		.map(|secs| secs as u64)
		.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

	let delivery = HttpRpcDelivery::new(&network.rpc_url, Duration::from_secs(timeout))?;
	tracing::debug!(
		network = %network.name,
		rpc_url = %network.rpc_url,
		"Created JSON-RPC delivery"
	);
	Ok(Box::new(delivery))
}

/// Registry for the JSON-RPC delivery implementation.
pub struct Registry;

impl deployer_types::ImplementationRegistry for Registry {
	const NAME: &'static str = "json_rpc";
	type Factory = crate::DeliveryFactory;

	fn factory() -> Self::Factory {
		create_http_delivery
	}
}

impl crate::DeliveryRegistry for Registry {}
