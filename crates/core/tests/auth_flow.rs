//! End-to-end flows against a scripted popup host.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::{Value, json};
use zkauth::{
	AuthConfig, AuthSession, DirectProvider, Dispatch, MemoryBackend, PopupFeatures, PopupOpener,
	PopupWindow, SESSION_KEY, SiteMetadata, StorageBackend, TransactionRequest,
	UnavailableBackend,
};

const ENDPOINT: &str = "https://auth.example";

#[derive(Default)]
struct ScriptedOpener {
	opened: RefCell<Vec<String>>,
	closes: Rc<Cell<usize>>,
	blocked: Cell<bool>,
}

struct ScriptedWindow(Rc<Cell<usize>>);

impl PopupWindow for ScriptedWindow {
	fn close(&self) {
		self.0.set(self.0.get() + 1);
	}
}

impl PopupOpener for ScriptedOpener {
	fn open(&self, url: &str, _target: &str, _features: &PopupFeatures) -> Option<Box<dyn PopupWindow>> {
		if self.blocked.get() {
			return None;
		}
		self.opened.borrow_mut().push(url.to_string());
		Some(Box::new(ScriptedWindow(Rc::clone(&self.closes))))
	}
}

struct Harness {
	session: AuthSession,
	storage: Rc<MemoryBackend>,
	opener: Rc<ScriptedOpener>,
}

impl Harness {
	fn new() -> Self {
		let _ = tracing_subscriber::fmt().with_test_writer().try_init();

		let storage = Rc::new(MemoryBackend::new());
		let opener = Rc::new(ScriptedOpener::default());
		let config =
			AuthConfig::new(SiteMetadata::new("https://app.example", "App")).with_endpoint(ENDPOINT);
		let session = AuthSession::new(config, storage.clone(), opener.clone()).unwrap();
		Self {
			session,
			storage,
			opener,
		}
	}

	fn post(&self, origin: &str, data: Value) -> Dispatch {
		self.session.channel().dispatch(origin, &data)
	}

	fn opened(&self) -> Vec<String> {
		self.opener.opened.borrow().clone()
	}

	fn closes(&self) -> usize {
		self.opener.closes.get()
	}
}

fn login(address: &str) -> Value {
	json!({"type": "zkauth:login", "payload": {"walletAddress": address}})
}

fn query(url: &str) -> HashMap<String, String> {
	url::Url::parse(url)
		.unwrap()
		.query_pairs()
		.map(|(k, v)| (k.into_owned(), v.into_owned()))
		.collect()
}

#[tokio::test]
async fn connect_opens_popup_and_resolves_on_login() {
	let h = Harness::new();
	assert!(!h.session.connected());

	let flow = h.session.connect(None);
	assert_eq!(
		h.opened(),
		[
			"https://auth.example/flow/connect?network=ll_pegasus&flow=true\
			 &redirect=https%3A%2F%2Fapp.example\
			 &site=%7B%22url%22%3A%22https%3A%2F%2Fapp.example%22%2C%22title%22%3A%22App%22%7D"
		]
	);
	assert!(!flow.is_settled());

	assert_eq!(h.post(ENDPOINT, login("0xABC")), Dispatch::Delivered(1));
	assert!(flow.is_settled());
	assert_eq!(flow.await.unwrap(), "0xABC");

	assert!(h.session.connected());
	assert_eq!(h.session.current_user().as_deref(), Some("0xABC"));
	assert_eq!(h.storage.get_item(SESSION_KEY).unwrap().as_deref(), Some("0xABC"));
	assert_eq!(h.closes(), 1);
	assert_eq!(h.session.channel().pending(), 0);
}

#[tokio::test]
async fn connect_passes_direct_provider() {
	let h = Harness::new();
	let _flow = h.session.connect(Some(DirectProvider::Google));
	assert_eq!(query(&h.opened()[0])["direct"], "google");
}

#[tokio::test]
async fn login_from_other_origin_changes_nothing() {
	let h = Harness::new();
	let flow = h.session.connect(None);

	assert_eq!(h.post("https://evil.example", login("0xEVIL")), Dispatch::Untrusted);
	assert!(!flow.is_settled());
	assert!(!h.session.connected());
	assert_eq!(h.closes(), 0);

	h.post(ENDPOINT, login("0xABC"));
	assert_eq!(flow.await.unwrap(), "0xABC");
}

#[tokio::test]
async fn second_login_has_no_effect() {
	let h = Harness::new();
	let flow = h.session.connect(None);

	h.post(ENDPOINT, login("0x1"));
	assert_eq!(h.post(ENDPOINT, login("0x2")), Dispatch::Unclaimed);

	assert_eq!(flow.await.unwrap(), "0x1");
	assert_eq!(h.session.current_user().as_deref(), Some("0x1"));
	assert_eq!(h.closes(), 1);
}

#[tokio::test]
async fn malformed_login_is_rejected_and_flow_keeps_waiting() {
	let h = Harness::new();
	let flow = h.session.connect(None);

	let bad = json!({"type": "zkauth:login", "payload": {"walletAddress": 42}});
	assert_eq!(h.post(ENDPOINT, bad), Dispatch::Invalid);
	assert!(!flow.is_settled());
	assert!(!h.session.connected());

	h.post(ENDPOINT, login("0xABC"));
	assert_eq!(flow.await.unwrap(), "0xABC");
}

#[tokio::test]
async fn login_address_is_stored_as_received() {
	let h = Harness::new();
	let flow = h.session.connect(None);

	assert_eq!(h.post(ENDPOINT, login("")), Dispatch::Delivered(1));
	assert!(flow.is_settled());
	assert_eq!(flow.await.unwrap(), "");
	assert_eq!(h.storage.get_item(SESSION_KEY).unwrap().as_deref(), Some(""));
	assert_eq!(h.closes(), 1);
}

#[tokio::test]
async fn send_tx_resolves_with_null_tx() {
	let h = Harness::new();
	let flow = h.session.send_tx(&TransactionRequest::new("0xdead"));

	let sent = json!({"type": "zkauth:txSent", "payload": {"tx": null}});
	assert_eq!(h.post(ENDPOINT, sent), Dispatch::Delivered(1));
	assert_eq!(flow.await.unwrap(), Value::Null);
	assert_eq!(h.session.channel().pending(), 0);
}

#[tokio::test]
async fn blocked_popup_rejects_immediately() {
	let h = Harness::new();
	h.storage.set_item(SESSION_KEY, "0xOLD").unwrap();
	h.opener.blocked.set(true);

	let flow = h.session.connect(None);
	assert!(flow.is_settled());
	assert!(flow.await.unwrap_err().is_popup_blocked());

	assert_eq!(h.session.channel().pending(), 0);
	assert_eq!(h.session.current_user().as_deref(), Some("0xOLD"));
}

#[tokio::test]
async fn blocked_popup_leaves_empty_store_empty() {
	let h = Harness::new();
	h.opener.blocked.set(true);

	let err = h.session.connect(None).await.unwrap_err();
	assert!(err.is_popup_blocked());
	assert!(!h.session.connected());
}

#[tokio::test]
async fn reconnect_uses_stored_session_without_popup() {
	let h = Harness::new();
	h.storage.set_item(SESSION_KEY, "0xABC").unwrap();

	let address = h.session.reconnect(None).await.unwrap();
	assert_eq!(address, "0xABC");
	assert!(h.opened().is_empty());
	assert_eq!(h.session.channel().pending(), 0);
}

#[tokio::test]
async fn reconnect_without_session_connects() {
	let h = Harness::new();

	let flow = h.session.reconnect(Some(DirectProvider::Google));
	assert_eq!(h.opened().len(), 1);
	assert!(h.opened()[0].contains("/flow/connect?"));

	h.post(ENDPOINT, login("0xNEW"));
	assert_eq!(flow.await.unwrap(), "0xNEW");
}

#[tokio::test]
async fn disconnect_always_disconnects() {
	let h = Harness::new();
	h.session.disconnect();
	assert!(!h.session.connected());

	let flow = h.session.connect(None);
	h.post(ENDPOINT, login("0xABC"));
	flow.await.unwrap();
	assert!(h.session.connected());

	h.session.disconnect();
	assert!(!h.session.connected());
	assert_eq!(h.session.current_user(), None);
}

#[tokio::test]
async fn send_tx_resolves_with_opaque_tx() {
	let h = Harness::new();
	let request = TransactionRequest::new("0xdead")
		.amount("10")
		.data("0x00")
		.network("ll_pegasus");

	let flow = h.session.send_tx(&request);
	let opened = h.opened();
	let url = &opened[0];
	assert!(url.starts_with("https://auth.example/flow/send?"));
	let params = query(url);
	assert_eq!(params["network"], "ll_pegasus");
	assert_eq!(params["to"], "0xdead");
	assert_eq!(params["amount"], "10");
	assert_eq!(params["data"], "0x00");
	assert_eq!(params["redirect"], "https://app.example");
	assert_eq!(params["site"], r#"{"url":"https://app.example","title":"App"}"#);
	assert_eq!(params["flow"], "true");

	// A login message does not settle a send flow.
	assert_eq!(h.post(ENDPOINT, login("0xABC")), Dispatch::Unclaimed);

	let tx = json!({"hash": "0xfeed", "status": "pending"});
	h.post(ENDPOINT, json!({"type": "zkauth:txSent", "payload": {"tx": tx}}));
	assert_eq!(flow.await.unwrap(), tx);

	assert!(!h.session.connected());
	assert_eq!(h.closes(), 1);
}

#[tokio::test]
async fn send_tx_ignores_untrusted_origin() {
	let h = Harness::new();
	let flow = h.session.send_tx(&TransactionRequest::new("0xdead"));

	let sent = json!({"type": "zkauth:txSent", "payload": {"tx": {"hash": "0x1"}}});
	assert_eq!(h.post("https://evil.example", sent.clone()), Dispatch::Untrusted);
	assert!(!flow.is_settled());

	h.post(ENDPOINT, sent);
	assert_eq!(flow.await.unwrap(), json!({"hash": "0x1"}));
}

#[tokio::test]
async fn cancel_closes_popup_and_unregisters() {
	let h = Harness::new();
	let flow = h.session.connect(None);
	let handle = flow.cancel_handle();
	assert!(handle.is_active());

	handle.cancel();
	assert_eq!(h.closes(), 1);
	assert_eq!(h.session.channel().pending(), 0);
	assert!(flow.await.unwrap_err().is_cancelled());

	assert_eq!(h.post(ENDPOINT, login("0xLATE")), Dispatch::Unclaimed);
	assert!(!h.session.connected());
}

#[tokio::test]
async fn dropping_flow_cancels_it() {
	let h = Harness::new();
	let flow = h.session.send_tx(&TransactionRequest::new("0xdead"));
	assert_eq!(h.session.channel().pending(), 1);

	drop(flow);
	assert_eq!(h.session.channel().pending(), 0);
	assert_eq!(h.closes(), 1);
}

#[tokio::test]
async fn cancel_after_settlement_is_noop() {
	let h = Harness::new();
	let flow = h.session.connect(None);
	let handle = flow.cancel_handle();

	h.post(ENDPOINT, login("0xABC"));
	handle.cancel();

	assert_eq!(flow.await.unwrap(), "0xABC");
	assert_eq!(h.closes(), 1);
}

#[tokio::test]
async fn unavailable_storage_still_completes_flow() {
	let opener = Rc::new(ScriptedOpener::default());
	let config =
		AuthConfig::new(SiteMetadata::new("https://app.example", "App")).with_endpoint(ENDPOINT);
	let session = AuthSession::new(config, Rc::new(UnavailableBackend), opener).unwrap();

	let flow = session.connect(None);
	session.channel().dispatch(ENDPOINT, &login("0xABC"));
	assert_eq!(flow.await.unwrap(), "0xABC");
	assert!(!session.connected());
	session.disconnect();
}

#[test]
fn invalid_endpoint_fails_construction() {
	let config = AuthConfig::new(SiteMetadata::new("https://app.example", "App"))
		.with_endpoint("javascript:alert(1)");
	let result = AuthSession::new(
		config,
		Rc::new(MemoryBackend::new()),
		Rc::new(ScriptedOpener::default()),
	);
	assert!(result.is_err());
}
