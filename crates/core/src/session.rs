//! [`AuthSession`]: the public façade.

use std::rc::Rc;

use tokio::sync::oneshot;
use zkauth_protocol::{
	DirectProvider, Endpoint, InboundMessage, MessageKind, SiteMetadata, TransactionRequest,
	TransactionResult,
};

use crate::channel::MessageChannel;
use crate::config::AuthConfig;
use crate::error::Result;
use crate::flow::{Flow, FlowGuard};
use crate::popup::{PopupOpener, PopupOrchestrator};
use crate::store::{SessionStore, StorageBackend};

/// Wallet login and transaction signing through the zkauth popup.
///
/// Each flow moves through `Requested → AwaitingMessage → Settled`:
/// the flow URL is built, the popup opened, and a single-shot handler waits
/// on [`channel`](Self::channel) for the message that settles it. A blocked
/// popup settles the flow immediately with
/// [`Error::PopupBlocked`](crate::Error::PopupBlocked) and registers nothing.
///
/// Overlapping calls are not guarded against; each gets its own handler.
pub struct AuthSession {
	site: SiteMetadata,
	endpoint: Endpoint,
	store: SessionStore,
	popups: PopupOrchestrator,
	channel: MessageChannel,
}

impl AuthSession {
	/// Builds a session from `config`, persisting into `storage` and opening
	/// popups through `opener`.
	///
	/// # Errors
	///
	/// Returns [`Error::Protocol`](crate::Error::Protocol) if the configured
	/// endpoint is not an absolute http(s) URL.
	pub fn new(
		config: AuthConfig,
		storage: Rc<dyn StorageBackend>,
		opener: Rc<dyn PopupOpener>,
	) -> Result<Self> {
		let endpoint = config.endpoint()?;
		tracing::debug!(endpoint = %endpoint, origin = endpoint.origin(), "Creating auth session");
		Ok(Self {
			channel: MessageChannel::new(endpoint.origin()),
			site: config.site,
			endpoint,
			store: SessionStore::new(storage),
			popups: PopupOrchestrator::new(opener),
		})
	}

	pub fn site(&self) -> &SiteMetadata {
		&self.site
	}

	pub fn endpoint(&self) -> &Endpoint {
		&self.endpoint
	}

	pub fn store(&self) -> &SessionStore {
		&self.store
	}

	/// Channel the host transport feeds inbound messages into.
	pub fn channel(&self) -> &MessageChannel {
		&self.channel
	}

	/// Returns true if a wallet address is stored.
	pub fn connected(&self) -> bool {
		self.store.has()
	}

	/// Returns the stored wallet address.
	pub fn current_user(&self) -> Option<String> {
		self.store.get()
	}

	/// Opens the connect flow and resolves with the user's wallet address.
	///
	/// `direct` asks the service to skip its provider picker. On success the
	/// address is persisted and the popup closed.
	pub fn connect(&self, direct: Option<DirectProvider>) -> Flow<String> {
		let url = match self.endpoint.connect_url(&self.site, direct) {
			Ok(url) => url,
			Err(err) => return Flow::failed(err.into()),
		};

		let store = self.store.clone();
		self.start_flow(MessageKind::Login, &url, move |message| match message {
			InboundMessage::Login(payload) => {
				tracing::info!(wallet_address = %payload.wallet_address, "Received wallet address");
				store.set(&payload.wallet_address);
				Some(payload.wallet_address)
			}
			other => {
				tracing::warn!(kind = %other.kind(), "Unexpected message for connect flow");
				None
			}
		})
	}

	/// Resolves with the stored address without a popup, or connects.
	///
	/// The stored session is not revalidated against the service.
	pub fn reconnect(&self, direct: Option<DirectProvider>) -> Flow<String> {
		match self.store.get() {
			Some(wallet_address) => {
				tracing::debug!(%wallet_address, "Reusing stored session");
				Flow::ready(wallet_address)
			}
			None => self.connect(direct),
		}
	}

	/// Forgets the stored session.
	pub fn disconnect(&self) {
		self.store.clear();
		tracing::info!("Disconnected");
	}

	/// Opens the send flow and resolves with the transaction object the
	/// service returns. The session is not touched.
	pub fn send_tx(&self, tx: &TransactionRequest) -> Flow<TransactionResult> {
		let url = match self.endpoint.send_url(&self.site, tx) {
			Ok(url) => url,
			Err(err) => return Flow::failed(err.into()),
		};

		self.start_flow(MessageKind::TxSent, &url, |message| match message {
			InboundMessage::TxSent(payload) => {
				tracing::info!("Transaction sent");
				Some(payload.tx)
			}
			other => {
				tracing::warn!(kind = %other.kind(), "Unexpected message for send flow");
				None
			}
		})
	}

	fn start_flow<T, F>(&self, kind: MessageKind, url: &str, extract: F) -> Flow<T>
	where
		T: 'static,
		F: FnOnce(InboundMessage) -> Option<T> + 'static,
	{
		let popup = match self.popups.open(url) {
			Ok(popup) => popup,
			Err(err) => return Flow::failed(err),
		};

		let (tx, rx) = oneshot::channel();
		let guard = Rc::new(FlowGuard::default());
		let weak_guard = Rc::downgrade(&guard);
		let handler_popup = popup.clone();

		let subscription = self.channel.listen_once(kind, move |message| {
			let value = extract(message);
			handler_popup.close();
			if let Some(guard) = weak_guard.upgrade() {
				guard.mark_settled();
			}
			if let Some(value) = value {
				let _ = tx.send(value);
			}
		});
		guard.arm(subscription, popup);

		tracing::debug!(%kind, "Waiting for message from popup");
		Flow::pending(rx, guard)
	}
}

impl std::fmt::Debug for AuthSession {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AuthSession")
			.field("endpoint", &self.endpoint)
			.field("site", &self.site)
			.field("channel", &self.channel)
			.finish()
	}
}
