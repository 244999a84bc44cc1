//! Error types for zkauth flows.

use thiserror::Error;
use zkauth_protocol::ProtocolError;

/// Result type alias for zkauth operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors a flow or façade call can produce.
///
/// Storage failures are not listed: [`SessionStore`](crate::SessionStore)
/// degrades to "not connected" instead of failing. Messages from untrusted
/// origins are not errors either; see [`Dispatch`](crate::Dispatch).
#[derive(Debug, Error)]
pub enum Error {
	/// The host refused to create the popup (blocker policy, no user gesture).
	#[error("Failed to open popup: blocked by the browser or not triggered by a user gesture")]
	PopupBlocked,

	/// The flow was cancelled or dropped before the popup reported back.
	#[error("Flow cancelled before the popup reported back")]
	Cancelled,

	/// Endpoint, flow URL or message encoding problem.
	#[error(transparent)]
	Protocol(#[from] ProtocolError),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Returns true if the popup could not be opened.
	pub fn is_popup_blocked(&self) -> bool {
		matches!(self, Error::PopupBlocked)
	}

	/// Returns true if the flow ended through cancellation.
	pub fn is_cancelled(&self) -> bool {
		matches!(self, Error::Cancelled)
	}
}
