//! Detached popup surface on the trusted endpoint.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::error::{Error, Result};

/// Window name every flow popup is opened under.
///
/// Reusing one name makes a second flow navigate the existing popup instead
/// of stacking windows.
pub const POPUP_TARGET: &str = "PopupWindow";

/// Window features requested for the popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupFeatures {
	pub width: u32,
	pub height: u32,
	pub scrollbars: bool,
	pub resizable: bool,
}

impl Default for PopupFeatures {
	fn default() -> Self {
		Self {
			width: 600,
			height: 400,
			scrollbars: true,
			resizable: true,
		}
	}
}

/// Renders the `window.open` feature string.
impl fmt::Display for PopupFeatures {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let flag = |on: bool| if on { "yes" } else { "no" };
		write!(
			f,
			"width={},height={},scrollbars={},resizable={}",
			self.width,
			self.height,
			flag(self.scrollbars),
			flag(self.resizable)
		)
	}
}

/// Host capability to spawn a top-level window.
pub trait PopupOpener {
	/// Opens `url` in a new window. Returns `None` when the host refuses.
	fn open(&self, url: &str, target: &str, features: &PopupFeatures) -> Option<Box<dyn PopupWindow>>;
}

/// A window spawned by a [`PopupOpener`].
pub trait PopupWindow {
	/// Requests the window to close. Must tolerate an already closed window.
	fn close(&self);
}

/// Opens flow popups with fixed features.
#[derive(Clone)]
pub struct PopupOrchestrator {
	opener: Rc<dyn PopupOpener>,
	features: PopupFeatures,
}

impl PopupOrchestrator {
	pub fn new(opener: Rc<dyn PopupOpener>) -> Self {
		Self {
			opener,
			features: PopupFeatures::default(),
		}
	}

	pub fn features(&self) -> &PopupFeatures {
		&self.features
	}

	/// Opens a popup navigated to `url`.
	///
	/// # Errors
	///
	/// Returns [`Error::PopupBlocked`] if the host refused to create the window.
	pub fn open(&self, url: &str) -> Result<Popup> {
		match self.opener.open(url, POPUP_TARGET, &self.features) {
			Some(window) => {
				tracing::debug!(url, "Opened popup");
				Ok(Popup {
					inner: Rc::new(PopupInner {
						window,
						closed: Cell::new(false),
					}),
				})
			}
			None => {
				tracing::warn!(url, "Popup blocked");
				Err(Error::PopupBlocked)
			}
		}
	}
}

impl fmt::Debug for PopupOrchestrator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PopupOrchestrator")
			.field("features", &self.features)
			.finish()
	}
}

struct PopupInner {
	window: Box<dyn PopupWindow>,
	closed: Cell<bool>,
}

/// Handle to an open popup. Clones refer to the same window.
#[derive(Clone)]
pub struct Popup {
	inner: Rc<PopupInner>,
}

impl Popup {
	/// Closes the window. Only the first call reaches the host.
	pub fn close(&self) {
		if !self.inner.closed.replace(true) {
			self.inner.window.close();
		}
	}

	pub fn is_closed(&self) -> bool {
		self.inner.closed.get()
	}
}

impl fmt::Debug for Popup {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Popup")
			.field("closed", &self.is_closed())
			.finish()
	}
}
