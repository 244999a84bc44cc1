use std::cell::RefCell;
use std::collections::HashMap;

use thiserror::Error;

/// Errors a storage backend can report.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Storage is disabled or not present in this environment.
	#[error("storage unavailable: {0}")]
	Unavailable(String),

	/// The store refused the operation (quota exceeded, security policy).
	#[error("storage operation rejected: {0}")]
	Rejected(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

/// String key-value slot the session is persisted in.
pub trait StorageBackend {
	fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

	fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

	/// Removing an absent key succeeds.
	fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process backend. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryBackend {
	items: RefCell<HashMap<String, String>>,
}

impl MemoryBackend {
	pub fn new() -> Self {
		Self::default()
	}
}

impl StorageBackend for MemoryBackend {
	fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
		Ok(self.items.borrow().get(key).cloned())
	}

	fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
		self.items
			.borrow_mut()
			.insert(key.to_string(), value.to_string());
		Ok(())
	}

	fn remove_item(&self, key: &str) -> Result<(), StorageError> {
		self.items.borrow_mut().remove(key);
		Ok(())
	}
}

/// Backend for environments where storage is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableBackend;

impl StorageBackend for UnavailableBackend {
	fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
		Err(StorageError::Unavailable("storage disabled".into()))
	}

	fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
		Err(StorageError::Unavailable("storage disabled".into()))
	}

	fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
		Err(StorageError::Unavailable("storage disabled".into()))
	}
}
