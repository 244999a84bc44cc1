//! `window.open` popups.

use web_sys::Window;
use zkauth::{PopupFeatures, PopupOpener, PopupWindow};

use crate::describe_js_error;

/// Opens flow popups with `window.open`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowOpener;

impl PopupOpener for WindowOpener {
    fn open(&self, url: &str, target: &str, features: &PopupFeatures) -> Option<Box<dyn PopupWindow>> {
        let window = web_sys::window()?;
        match window.open_with_url_and_target_and_features(url, target, &features.to_string()) {
            Ok(Some(popup)) => Some(Box::new(BrowserPopup(popup))),
            Ok(None) => None,
            Err(err) => {
                tracing::warn!(error = %describe_js_error(&err), "window.open failed");
                None
            }
        }
    }
}

/// Window returned by `window.open`.
pub struct BrowserPopup(Window);

impl PopupWindow for BrowserPopup {
    fn close(&self) {
        // Throws only for windows we do not own; nothing to recover.
        let _ = self.0.close();
    }
}
