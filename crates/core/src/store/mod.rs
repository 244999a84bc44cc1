//! Persisted session: the wallet address of the connected user.
//!
//! A single string under [`SESSION_KEY`] is the whole session. Its presence
//! is the only signal of "connected"; there is no expiry.
//!
//! Backends:
//! * [`MemoryBackend`]: process-local map (tests, hosts without durable storage)
//! * [`FileBackend`]: JSON key-value file for native hosts
//! * [`UnavailableBackend`]: storage that is disabled; every call fails
//!
//! The browser `localStorage` backend lives in `zkauth-web`.

use std::rc::Rc;

mod backend;
mod file;

pub use backend::{MemoryBackend, StorageBackend, StorageError, UnavailableBackend};
pub use file::FileBackend;

/// Key the wallet address is stored under.
pub const SESSION_KEY: &str = "zkauth:current_user";

/// Repository for the current session.
///
/// Storage failures never escape: reads degrade to "not connected" and writes
/// become no-ops, both logged at `warn`. The connect flow can always be
/// retried.
#[derive(Clone)]
pub struct SessionStore {
	backend: Rc<dyn StorageBackend>,
}

impl SessionStore {
	pub fn new(backend: Rc<dyn StorageBackend>) -> Self {
		Self { backend }
	}

	/// Returns true if a session is stored.
	pub fn has(&self) -> bool {
		self.get().is_some()
	}

	/// Returns the stored wallet address.
	pub fn get(&self) -> Option<String> {
		match self.backend.get_item(SESSION_KEY) {
			Ok(value) => value,
			Err(err) => {
				tracing::warn!(error = %err, "Session storage unavailable, treating as disconnected");
				None
			}
		}
	}

	/// Overwrites the stored wallet address.
	pub fn set(&self, wallet_address: &str) {
		if let Err(err) = self.backend.set_item(SESSION_KEY, wallet_address) {
			tracing::warn!(error = %err, "Failed to persist session");
		}
	}

	/// Removes the stored wallet address.
	pub fn clear(&self) {
		if let Err(err) = self.backend.remove_item(SESSION_KEY) {
			tracing::warn!(error = %err, "Failed to clear session");
		}
	}
}

impl std::fmt::Debug for SessionStore {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SessionStore")
			.field("connected", &self.has())
			.finish()
	}
}
