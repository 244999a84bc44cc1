//! JSON file backend for native hosts.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::backend::{StorageBackend, StorageError};

/// Durable key-value file, rewritten on every change.
///
/// The default location follows XDG: `$XDG_CONFIG_HOME/zkauth/storage.json`,
/// else `~/.config/zkauth/storage.json`.
#[derive(Debug, Clone)]
pub struct FileBackend {
	path: PathBuf,
}

impl FileBackend {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	/// Backend at the default per-user location.
	pub fn at_default_location() -> Self {
		Self::new(default_path())
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
		match fs::read_to_string(&self.path) {
			Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
			Ok(content) => Ok(serde_json::from_str(&content)?),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
			Err(err) => Err(err.into()),
		}
	}

	fn save(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent)?;
		}
		fs::write(&self.path, serde_json::to_string_pretty(items)?)?;
		#[cfg(unix)]
		{
			use std::os::unix::fs::PermissionsExt;
			fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
		}
		Ok(())
	}
}

impl StorageBackend for FileBackend {
	fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
		Ok(self.load()?.remove(key))
	}

	fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
		let mut items = self.load()?;
		items.insert(key.to_string(), value.to_string());
		self.save(&items)
	}

	fn remove_item(&self, key: &str) -> Result<(), StorageError> {
		let mut items = self.load()?;
		if items.remove(key).is_some() {
			self.save(&items)?;
		}
		Ok(())
	}
}

fn default_path() -> PathBuf {
	let config_home = std::env::var_os("XDG_CONFIG_HOME")
		.map(PathBuf::from)
		.or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
		.unwrap_or_else(|| PathBuf::from("."));

	config_home.join("zkauth").join("storage.json")
}
