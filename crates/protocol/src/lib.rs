//! Wire types for the zkauth popup handshake.
//!
//! This crate holds the shapes exchanged with the remote authentication
//! service: the outbound flow URLs loaded into the popup and the inbound
//! messages the popup posts back into the host page.
//!
//! Types in this crate are:
//! - **Pure data**: serialization, URL building and schema validation only
//! - **1:1 with the service contract**: field names and query parameter order
//!   match what the remote service expects
//!
//! Session handling, popups and message correlation live in the `zkauth` crate.

pub mod endpoint;
pub mod error;
pub mod message;
pub mod site;
pub mod tx;

pub use endpoint::{DEFAULT_ENDPOINT, Endpoint, FLOW_NETWORK};
pub use error::{ProtocolError, Result};
pub use message::{InboundMessage, LoginPayload, MESSAGE_NAMESPACE, MessageKind, TxSentPayload};
pub use site::{DirectProvider, SiteMetadata};
pub use tx::{TransactionRequest, TransactionResult};
