//!
//! JSON-RPC transport shared by the contract client and the node-backed wallet.
//!

use super::abi::Decoder;
use super::types::LedgerError;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// HTTP JSON-RPC client for an Ethereum-compatible node
#[derive(Clone)]
pub struct RpcTransport {
	/// The underlying HTTP client.
	http_client: Client,
	/// The node's JSON-RPC endpoint.
	rpc_url: String,
	/// Monotonic request id, shared between clones.
	next_id: Arc<AtomicU64>,
}

impl RpcTransport {
	/// Create a transport for the given endpoint.
	///
	/// # Errors
	/// Returns `LedgerError::HttpError` if the HTTP client cannot be built.
	pub fn new(rpc_url: String) -> Result<Self, LedgerError> {
		let http_client = Client::builder().timeout(Duration::from_secs(30)).build()?;

		Ok(Self {
			http_client,
			rpc_url,
			next_id: Arc::new(AtomicU64::new(1)),
		})
	}

	pub fn url(&self) -> &str {
		&self.rpc_url
	}

	/// Execute a JSON-RPC request and return its `result` member.
	///
	/// # Arguments
	/// * `method` - The RPC method name.
	/// * `params` - Positional parameters as a JSON array.
	///
	/// # Returns
	/// The `result` value, which may be `null`, or a `LedgerError` if the request fails
	/// or the node answers with an error object.
	pub async fn request(
		&self,
		method: &str,
		params: serde_json::Value,
	) -> Result<serde_json::Value, LedgerError> {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		let request_body = json!({
			"jsonrpc": "2.0",
			"id": id,
			"method": method,
			"params": params,
		});

		debug!("RPC request #{}: {}", id, method);

		let response = self
			.http_client
			.post(&self.rpc_url)
			.header("Content-Type", "application/json")
			.json(&request_body)
			.send()
			.await?;

		if !response.status().is_success() {
			return Err(LedgerError::RpcError {
				code: i64::from(response.status().as_u16()),
				message: format!("HTTP error: {}", response.status()),
			});
		}

		let mut response_json: serde_json::Value = response.json().await?;

		if let Some(error) = response_json.get("error") {
			let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or(0);
			let message = rpc_error_message(error);
			return Err(LedgerError::RpcError { code, message });
		}

		response_json
			.get_mut("result")
			.map(serde_json::Value::take)
			.ok_or(LedgerError::NoData)
	}
}

/// Build the message for a JSON-RPC error object.
///
/// Nodes often keep `message` generic ("execution reverted") and put the revert reason in
/// `data`, either as plain text or as an ABI-encoded `Error(string)` payload.
pub fn rpc_error_message(error: &serde_json::Value) -> String {
	let message = error
		.get("message")
		.and_then(|m| m.as_str())
		.unwrap_or("Unknown RPC error");

	let reason = match error.get("data").and_then(|d| d.as_str()) {
		Some(data) => match data.strip_prefix("0x") {
			Some(encoded) => decode_revert_payload(encoded),
			None => Some(data.to_string()),
		},
		None => None,
	};

	match reason {
		Some(reason) if !reason.is_empty() => format!("{}: {}", message, reason),
		_ => message.to_string(),
	}
}

/// Decode the reason string from hex `Error(string)` revert data. Other payloads yield `None`.
fn decode_revert_payload(encoded: &str) -> Option<String> {
	let bytes = hex::decode(encoded).ok()?;
	let payload = bytes.strip_prefix(&REVERT_SELECTOR[..])?;
	Decoder::new(payload).string(0).ok()
}

/// Selector of the standard `Error(string)` revert.
const REVERT_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// Parse a hex quantity such as `"0x1a"`.
pub fn parse_quantity(value: &serde_json::Value) -> Option<u64> {
	let digits = value.as_str()?.strip_prefix("0x")?;
	u64::from_str_radix(digits, 16).ok()
}
