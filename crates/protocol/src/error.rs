//! Error types for wire-level operations.

use thiserror::Error;

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while building flow URLs or decoding inbound messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
	/// Endpoint is not an absolute http(s) URL.
	#[error("Invalid endpoint '{endpoint}': {reason}")]
	InvalidEndpoint { endpoint: String, reason: String },

	/// A flow URL could not be assembled from the endpoint.
	#[error("URL error: {0}")]
	Url(#[from] url::ParseError),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// Message carries the zkauth namespace but does not match its schema.
	#[error("Invalid '{kind}' message: {reason}")]
	InvalidMessage { kind: String, reason: String },
}

impl ProtocolError {
	pub(crate) fn invalid_message(kind: impl Into<String>, reason: impl Into<String>) -> Self {
		Self::InvalidMessage {
			kind: kind.into(),
			reason: reason.into(),
		}
	}
}
