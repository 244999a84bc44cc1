//! Feeds window `message` events into a [`MessageChannel`].

use serde_json::Value;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{MessageEvent, Window};
use zkauth::MessageChannel;

/// Registered `message` listener. Removed from the window on drop.
pub struct MessageBridge {
    window: Window,
    listener: Closure<dyn FnMut(MessageEvent)>,
}

impl MessageBridge {
    /// Starts forwarding every message posted to this window, with the
    /// browser-reported sender origin, to `channel`.
    pub fn attach(channel: MessageChannel) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;

        let listener = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            // Data that does not map to JSON still goes through the origin check.
            let data: Value = serde_wasm_bindgen::from_value(event.data()).unwrap_or(Value::Null);
            channel.dispatch(&event.origin(), &data);
        });
        window.add_event_listener_with_callback("message", listener.as_ref().unchecked_ref())?;

        tracing::debug!("Listening for popup messages");
        Ok(Self { window, listener })
    }
}

impl Drop for MessageBridge {
    fn drop(&mut self) {
        let _ = self
            .window
            .remove_event_listener_with_callback("message", self.listener.as_ref().unchecked_ref());
    }
}
