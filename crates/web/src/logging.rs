use std::cell::RefCell;
use std::io;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};
use wasm_bindgen::JsValue;

const DEFAULT_FILTER: &str = "info";

thread_local! {
    static FILTER: RefCell<Option<reload::Handle<EnvFilter, Registry>>> = const { RefCell::new(None) };
}

/// Installs a console subscriber, or updates the filter of the one already
/// installed.
///
/// `filter` takes `EnvFilter` directives such as `"zkauth=debug"`; invalid
/// directives fall back to `info`. Once installed, `None` leaves the current
/// filter alone, so the default set up by `ZkAuth` never overrides a filter
/// chosen through `initLogging`, and a later `initLogging` still applies.
pub fn init_logging(filter: Option<&str>) {
    let env_filter = EnvFilter::try_new(filter.unwrap_or(DEFAULT_FILTER))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    FILTER.with(|slot| {
        let mut slot = slot.borrow_mut();
        if let Some(handle) = slot.as_ref() {
            if filter.is_some() {
                if let Err(err) = handle.reload(env_filter) {
                    tracing::warn!(error = %err, "Failed to update log filter");
                }
            }
            return;
        }

        let (filter_layer, handle) = reload::Layer::new(env_filter);
        // No clock on wasm32-unknown-unknown, so no timestamps.
        let installed = tracing_subscriber::registry()
            .with(filter_layer)
            .with(
                fmt::layer()
                    .with_writer(ConsoleWriter::default)
                    .without_time()
                    .with_target(true)
                    .with_level(true),
            )
            .try_init()
            .is_ok();
        if installed {
            *slot = Some(handle);
        }
    });
}

#[cfg(test)]
fn current_filter() -> Option<String> {
    FILTER.with(|slot| {
        slot.borrow()
            .as_ref()
            .and_then(|handle| handle.with_current(ToString::to_string).ok())
    })
}

/// Buffers one formatted event and emits it as a single console line.
#[derive(Default)]
struct ConsoleWriter {
    buf: Vec<u8>,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let line = String::from_utf8_lossy(&self.buf);
        web_sys::console::log_1(&JsValue::from_str(line.trim_end()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_filter_replaces_default() {
        init_logging(None);
        assert!(current_filter().is_some_and(|f| f.contains("info")));

        init_logging(Some("zkauth=debug"));
        assert!(current_filter().is_some_and(|f| f.contains("zkauth=debug")));

        init_logging(None);
        assert!(current_filter().is_some_and(|f| f.contains("zkauth=debug")));
    }
}
