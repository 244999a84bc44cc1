//! Transaction request and result shapes.

use serde::{Deserialize, Serialize};

/// Transaction result as returned by the remote service.
///
/// The shape is owned by the service and is not validated locally.
pub type TransactionResult = serde_json::Value;

/// Transaction the user is asked to sign and submit in the popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
	/// Recipient address.
	pub to: String,
	#[serde(default)]
	pub amount: Option<String>,
	#[serde(default)]
	pub data: Option<String>,
	#[serde(default)]
	pub network: Option<String>,
}

impl TransactionRequest {
	pub fn new(to: impl Into<String>) -> Self {
		Self {
			to: to.into(),
			amount: None,
			data: None,
			network: None,
		}
	}

	pub fn amount(mut self, amount: impl Into<String>) -> Self {
		self.amount = Some(amount.into());
		self
	}

	pub fn data(mut self, data: impl Into<String>) -> Self {
		self.data = Some(data.into());
		self
	}

	pub fn network(mut self, network: impl Into<String>) -> Self {
		self.network = Some(network.into());
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn nullable_fields_accept_null_and_missing() {
		let tx: TransactionRequest =
			serde_json::from_str(r#"{"to":"0x1","amount":null,"network":"ll_pegasus"}"#).unwrap();
		assert_eq!(tx.to, "0x1");
		assert_eq!(tx.amount, None);
		assert_eq!(tx.data, None);
		assert_eq!(tx.network.as_deref(), Some("ll_pegasus"));
	}
}
