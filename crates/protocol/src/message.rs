//! Messages posted by the popup back into the host page.
//!
//! The remote surface sends one message per completed flow:
//!
//! 1. Connect flow ends with [`InboundMessage::Login`] carrying the wallet address
//! 2. Send flow ends with [`InboundMessage::TxSent`] carrying the transaction
//!
//! Messages are discriminated by their `type` field and carry their body under
//! `payload`. Anything outside the `zkauth:` namespace belongs to some other
//! script on the page and is not ours to reject.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProtocolError, Result};
use crate::tx::TransactionResult;

/// Prefix shared by every message type of this protocol.
pub const MESSAGE_NAMESPACE: &str = "zkauth:";

/// Message received from the popup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum InboundMessage {
	/// Authentication finished; the user is identified by a wallet address.
	#[serde(rename = "zkauth:login")]
	Login(LoginPayload),
	/// Transaction was signed and submitted.
	#[serde(rename = "zkauth:txSent")]
	TxSent(TxSentPayload),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
	pub wallet_address: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxSentPayload {
	/// Opaque transaction object defined by the remote service.
	pub tx: TransactionResult,
}

/// Discriminant of [`InboundMessage`], used to register interest in a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
	Login,
	TxSent,
}

impl MessageKind {
	/// Wire value of the `type` field.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Login => "zkauth:login",
			Self::TxSent => "zkauth:txSent",
		}
	}
}

impl std::fmt::Display for MessageKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

impl InboundMessage {
	pub fn kind(&self) -> MessageKind {
		match self {
			Self::Login(_) => MessageKind::Login,
			Self::TxSent(_) => MessageKind::TxSent,
		}
	}

	/// Decodes raw message data posted to the page.
	///
	/// Returns `Ok(None)` when the data is not a zkauth message at all (no
	/// string `type`, or a type outside [`MESSAGE_NAMESPACE`]). Returns
	/// [`ProtocolError::InvalidMessage`] when a zkauth-typed message fails its
	/// schema: unknown type or missing payload fields. Field values are passed
	/// through as received.
	pub fn decode(data: &Value) -> Result<Option<Self>> {
		let Some(kind) = data.get("type").and_then(Value::as_str) else {
			return Ok(None);
		};
		if !kind.starts_with(MESSAGE_NAMESPACE) {
			return Ok(None);
		}

		Self::deserialize(data)
			.map(Some)
			.map_err(|e| ProtocolError::invalid_message(kind, e.to_string()))
	}
}
