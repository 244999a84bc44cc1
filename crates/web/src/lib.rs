//! Browser bindings for zkauth.
//!
//! Wires the core handshake to the browser: `localStorage` for the session,
//! `window.open` for the popup and the window `message` event for replies.
//! The exported `ZkAuth` class mirrors the JS API host pages already use:
//!
//! ```js
//! const auth = new ZkAuth({ url: location.origin, title: "App" });
//! const address = await auth.reconnect();
//! const tx = await auth.sendTx({ to, amount: "1", data: null, network: null });
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Promise;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use zkauth::{
    AuthConfig, AuthSession, CancelHandle, DirectProvider, Flow, SiteMetadata, TransactionRequest,
};

mod bridge;
mod logging;
mod popup;
mod storage;

pub use bridge::MessageBridge;
pub use logging::init_logging;
pub use popup::{BrowserPopup, WindowOpener};
pub use storage::LocalStorage;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}

/// Installs console logging with an optional `EnvFilter` directive. May be
/// called before or after constructing `ZkAuth`; the latest filter wins.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging_js(filter: Option<String>) {
    init_logging(filter.as_deref());
}

/// JS handle to an [`AuthSession`] bound to this window.
#[wasm_bindgen]
pub struct ZkAuth {
    session: Rc<AuthSession>,
    pending: RefCell<Vec<CancelHandle>>,
    _bridge: MessageBridge,
}

#[wasm_bindgen]
impl ZkAuth {
    /// `site` is `{url, title, description?, iconUrl?}`; `endpoint` defaults
    /// to the production service.
    #[wasm_bindgen(constructor)]
    pub fn new(site: JsValue, endpoint: Option<String>) -> Result<ZkAuth, JsError> {
        init_logging(None);

        let site: SiteMetadata = serde_wasm_bindgen::from_value(site)?;
        let mut config = AuthConfig::new(site);
        if let Some(endpoint) = endpoint {
            config = config.with_endpoint(endpoint);
        }

        let session = Rc::new(AuthSession::new(
            config,
            Rc::new(LocalStorage),
            Rc::new(WindowOpener),
        )?);
        let bridge = MessageBridge::attach(session.channel().clone())
            .map_err(|err| JsError::new(&describe_js_error(&err)))?;

        Ok(Self {
            session,
            pending: RefCell::new(Vec::new()),
            _bridge: bridge,
        })
    }

    pub fn connected(&self) -> bool {
        self.session.connected()
    }

    #[wasm_bindgen(js_name = currentUser)]
    pub fn current_user(&self) -> Option<String> {
        self.session.current_user()
    }

    /// Resolves with the wallet address once the popup reports a login.
    pub fn connect(&self, direct: Option<String>) -> Result<Promise, JsError> {
        let direct = parse_direct(direct.as_deref())?;
        Ok(self.track(self.session.connect(direct), |address| Ok(address.into())))
    }

    /// Resolves with the stored address, or connects.
    pub fn reconnect(&self, direct: Option<String>) -> Result<Promise, JsError> {
        let direct = parse_direct(direct.as_deref())?;
        Ok(self.track(self.session.reconnect(direct), |address| Ok(address.into())))
    }

    pub fn disconnect(&self) {
        self.session.disconnect();
    }

    /// `tx` is `{to, amount, data, network}`; resolves with the service's tx object.
    #[wasm_bindgen(js_name = sendTx)]
    pub fn send_tx(&self, tx: JsValue) -> Result<Promise, JsError> {
        let tx: TransactionRequest = serde_wasm_bindgen::from_value(tx)?;
        Ok(self.track(self.session.send_tx(&tx), |tx| {
            Ok(tx.serialize(&serde_wasm_bindgen::Serializer::json_compatible())?)
        }))
    }

    /// Cancels every pending flow; their promises reject.
    pub fn cancel(&self) {
        for handle in self.pending.borrow_mut().drain(..) {
            handle.cancel();
        }
    }
}

impl ZkAuth {
    fn track<T, F>(&self, flow: Flow<T>, to_js: F) -> Promise
    where
        T: 'static,
        F: FnOnce(T) -> Result<JsValue, JsValue> + 'static,
    {
        {
            let mut pending = self.pending.borrow_mut();
            pending.retain(CancelHandle::is_active);
            pending.push(flow.cancel_handle());
        }

        future_to_promise(async move {
            let value = flow.await.map_err(|err| JsValue::from(JsError::from(err)))?;
            to_js(value)
        })
    }
}

fn parse_direct(direct: Option<&str>) -> Result<Option<DirectProvider>, JsError> {
    match direct {
        None => Ok(None),
        Some(name) => DirectProvider::from_name(name)
            .map(Some)
            .ok_or_else(|| JsError::new(&format!("Unsupported direct provider: {name}"))),
    }
}

pub(crate) fn describe_js_error(err: &JsValue) -> String {
    err.as_string()
        .or_else(|| js_sys::JSON::stringify(err).ok()?.as_string())
        .unwrap_or_else(|| format!("{:?}", err))
}
