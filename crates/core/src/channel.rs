//! Inbound message routing.
//!
//! The host page receives messages from every window it talks to. The host
//! transport hands each one to [`MessageChannel::dispatch`] together with the
//! origin the browser reported for the sender. The channel:
//!
//! 1. drops anything whose origin is not the trusted endpoint
//! 2. decodes the data into an [`InboundMessage`], rejecting zkauth messages
//!    that fail their schema
//! 3. hands the message to every single-shot handler registered for its kind
//!
//! Origin comparison is the only authenticity check. Payloads are not signed.
//!
//! Handlers live in an [`IndexMap`] so delivery follows registration order and
//! removal is cheap.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use serde_json::Value;
use zkauth_protocol::{InboundMessage, MessageKind};

/// Unique identifier for message handlers.
pub type HandlerId = u64;

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

fn next_handler_id() -> HandlerId {
	NEXT_HANDLER_ID.fetch_add(1, Ordering::SeqCst)
}

type HandlerFn = Box<dyn FnOnce(InboundMessage)>;

struct HandlerEntry {
	kind: MessageKind,
	handler: HandlerFn,
}

type HandlerMap = Rc<RefCell<IndexMap<HandlerId, HandlerEntry>>>;

/// What [`MessageChannel::dispatch`] did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
	/// Sender origin is not the trusted endpoint.
	Untrusted,
	/// Not a zkauth message.
	Ignored,
	/// zkauth message from the trusted origin that failed schema validation.
	Invalid,
	/// Valid message, but no handler was waiting for its kind.
	Unclaimed,
	/// Valid message handed to this many handlers.
	Delivered(usize),
}

/// Origin-filtered router from inbound messages to single-shot handlers.
///
/// Clones share the same handler registry.
#[derive(Clone)]
pub struct MessageChannel {
	trusted_origin: Rc<str>,
	handlers: HandlerMap,
}

impl MessageChannel {
	/// Creates a channel accepting messages only from `trusted_origin`
	/// (`scheme://host[:port]`, as reported by the browser).
	pub fn new(trusted_origin: impl Into<String>) -> Self {
		Self {
			trusted_origin: Rc::from(trusted_origin.into()),
			handlers: Rc::new(RefCell::new(IndexMap::new())),
		}
	}

	pub fn trusted_origin(&self) -> &str {
		&self.trusted_origin
	}

	/// Registers `on_match` for the next trusted message of `kind`.
	///
	/// The handler runs at most once and is removed before it runs. Dropping
	/// the returned [`Subscription`] unregisters it if it has not fired.
	pub fn listen_once<F>(&self, kind: MessageKind, on_match: F) -> Subscription
	where
		F: FnOnce(InboundMessage) + 'static,
	{
		let id = next_handler_id();
		self.handlers.borrow_mut().insert(
			id,
			HandlerEntry {
				kind,
				handler: Box::new(on_match),
			},
		);
		tracing::debug!(id, %kind, "Registered message handler");
		Subscription::from_handler_map(id, &self.handlers)
	}

	/// Number of handlers still waiting for a message.
	pub fn pending(&self) -> usize {
		self.handlers.borrow().len()
	}

	/// Routes one inbound message. `origin` is the sender origin reported by
	/// the transport, `data` the posted payload.
	pub fn dispatch(&self, origin: &str, data: &Value) -> Dispatch {
		tracing::debug!(origin, %data, "Received message");

		if origin != &*self.trusted_origin {
			tracing::warn!(
				origin,
				trusted = %self.trusted_origin,
				"Ignoring message from unauthorized origin"
			);
			return Dispatch::Untrusted;
		}

		let message = match InboundMessage::decode(data) {
			Ok(Some(message)) => message,
			Ok(None) => return Dispatch::Ignored,
			Err(err) => {
				tracing::warn!(error = %err, "Rejecting malformed message from trusted origin");
				return Dispatch::Invalid;
			}
		};

		let kind = message.kind();
		// Detach matching handlers before running them so a handler may
		// register or drop subscriptions without re-borrowing the map.
		let matched: Vec<HandlerEntry> = {
			let mut handlers = self.handlers.borrow_mut();
			let ids: Vec<HandlerId> = handlers
				.iter()
				.filter(|(_, entry)| entry.kind == kind)
				.map(|(id, _)| *id)
				.collect();
			ids.iter().filter_map(|id| handlers.shift_remove(id)).collect()
		};

		if matched.is_empty() {
			tracing::debug!(%kind, "No handler waiting for message");
			return Dispatch::Unclaimed;
		}

		let delivered = matched.len();
		for entry in matched {
			(entry.handler)(message.clone());
		}
		Dispatch::Delivered(delivered)
	}
}

impl std::fmt::Debug for MessageChannel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MessageChannel")
			.field("trusted_origin", &self.trusted_origin)
			.field("pending", &self.pending())
			.finish()
	}
}

/// RAII handle that unregisters a message handler on drop.
///
/// Holds a weak reference to the handler map, so dropping after the channel
/// is gone, or after the handler already fired, is a no-op.
pub struct Subscription {
	id: HandlerId,
	dropper: Option<Rc<dyn Fn(HandlerId)>>,
}

impl Subscription {
	fn from_handler_map(id: HandlerId, handlers: &HandlerMap) -> Self {
		let weak: Weak<RefCell<IndexMap<HandlerId, HandlerEntry>>> = Rc::downgrade(handlers);
		let dropper = Rc::new(move |id: HandlerId| {
			if let Some(map) = weak.upgrade() {
				// Take the entry out first so its closure drops after the borrow ends.
				let removed = map.borrow_mut().shift_remove(&id);
				drop(removed);
			}
		});
		Self {
			id,
			dropper: Some(dropper),
		}
	}

	/// Returns this subscription's handler ID.
	pub fn id(&self) -> HandlerId {
		self.id
	}

	/// Explicitly unsubscribes. Equivalent to dropping.
	pub fn unsubscribe(mut self) {
		if let Some(dropper) = self.dropper.take() {
			(dropper)(self.id);
		}
	}

	/// Leaves the handler registered until a matching message arrives.
	pub fn detach(mut self) {
		self.dropper = None;
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(dropper) = self.dropper.take() {
			(dropper)(self.id);
		}
	}
}

impl std::fmt::Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription")
			.field("id", &self.id)
			.field("active", &self.dropper.is_some())
			.finish()
	}
}
