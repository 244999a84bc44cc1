//! zkauth: wallet login and transaction signing through a remote popup.
//!
//! The host application never touches key material. It opens a popup on the
//! trusted zkauth endpoint, the user authenticates or signs there, and the
//! popup posts a message back into the page. This crate owns that handshake:
//!
//! - [`SessionStore`] persists the wallet address of the connected user
//! - [`PopupOrchestrator`] opens and closes the detached popup
//! - [`MessageChannel`] authenticates inbound messages by origin and routes
//!   them to single-shot handlers
//! - [`AuthSession`] composes the three into `connect`, `reconnect`,
//!   `disconnect` and `send_tx`, each returning a cancellable [`Flow`]
//!
//! # Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use zkauth::{AuthConfig, AuthSession, MemoryBackend, SiteMetadata};
//!
//! let config = AuthConfig::new(SiteMetadata::new("https://app.example", "App"));
//! let session = AuthSession::new(config, Rc::new(MemoryBackend::new()), opener)?;
//!
//! // The host transport forwards every posted message:
//! // session.channel().dispatch(&event_origin, &event_data);
//!
//! let address = session.connect(None).await?;
//! ```
//!
//! Everything is single-threaded: shared state is `Rc`/`RefCell` and nothing
//! blocks. Flows settle when the host feeds the matching message into
//! [`AuthSession::channel`].

pub mod channel;
pub mod config;
pub mod error;
pub mod flow;
pub mod popup;
pub mod session;
pub mod store;

pub use channel::{Dispatch, HandlerId, MessageChannel, Subscription};
pub use config::{AuthConfig, ENDPOINT_ENV};
pub use error::{Error, Result};
pub use flow::{CancelHandle, Flow};
pub use popup::{POPUP_TARGET, Popup, PopupFeatures, PopupOpener, PopupOrchestrator, PopupWindow};
pub use session::AuthSession;
pub use store::{
	FileBackend, MemoryBackend, SESSION_KEY, SessionStore, StorageBackend, StorageError,
	UnavailableBackend,
};

// Re-export wire types for convenience
pub use zkauth_protocol;
pub use zkauth_protocol::{
	DirectProvider, Endpoint, InboundMessage, MessageKind, SiteMetadata, TransactionRequest,
	TransactionResult,
};
