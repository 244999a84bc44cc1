//! Trusted endpoint and the flow URLs built on it.
//!
//! The popup is navigated to one of two flows:
//!
//! - `{endpoint}/flow/connect?network=ll_pegasus&flow=true&redirect=…&site=…[&direct=google]`
//! - `{endpoint}/flow/send?network=…&to=…&amount=…&data=…&site=…&redirect=…&flow=true`
//!
//! Query values are `application/x-www-form-urlencoded`, the same encoding a
//! browser `URLSearchParams` produces.

use url::Url;

use crate::error::{ProtocolError, Result};
use crate::site::{DirectProvider, SiteMetadata};
use crate::tx::TransactionRequest;

/// Production deployment of the remote authentication service.
pub const DEFAULT_ENDPOINT: &str = "https://s0sco0ogg88ckokk8ck00kwc.5.223.44.80.sslip.io";

/// Network identifier sent with every connect flow.
pub const FLOW_NETWORK: &str = "ll_pegasus";

const CONNECT_FLOW: &str = "connect";
const SEND_FLOW: &str = "send";

/// Validated base URL of the remote service.
///
/// Holds both the base used for flow URLs and the origin
/// (`scheme://host[:port]`) that inbound messages must report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
	base: String,
	origin: String,
}

impl Endpoint {
	/// Parses an absolute `http`/`https` endpoint. A trailing `/` is dropped.
	///
	/// The endpoint may carry a path prefix but no query or fragment, since
	/// flow paths are appended to it.
	pub fn parse(raw: &str) -> Result<Self> {
		let base = raw.trim().trim_end_matches('/');
		let url = Url::parse(base).map_err(|e| invalid_endpoint(raw, e.to_string()))?;

		match url.scheme() {
			"http" | "https" => {}
			other => return Err(invalid_endpoint(raw, format!("unsupported scheme '{other}'"))),
		}
		if url.host_str().is_none() {
			return Err(invalid_endpoint(raw, "missing host"));
		}
		if url.query().is_some() {
			return Err(invalid_endpoint(raw, "query not allowed"));
		}
		if url.fragment().is_some() {
			return Err(invalid_endpoint(raw, "fragment not allowed"));
		}

		Ok(Self {
			base: base.to_string(),
			origin: url.origin().ascii_serialization(),
		})
	}

	pub fn base(&self) -> &str {
		&self.base
	}

	/// Origin inbound messages are compared against.
	pub fn origin(&self) -> &str {
		&self.origin
	}

	/// URL of the connect (login) flow.
	pub fn connect_url(&self, site: &SiteMetadata, direct: Option<DirectProvider>) -> Result<String> {
		let site_json = site.to_json()?;
		let mut params = vec![
			("network", FLOW_NETWORK),
			("flow", "true"),
			("redirect", site.url.as_str()),
			("site", site_json.as_str()),
		];
		if let Some(direct) = direct {
			params.push(("direct", direct.as_str()));
		}
		self.flow_url(CONNECT_FLOW, &params)
	}

	/// URL of the send-transaction flow. Absent optional fields are omitted.
	pub fn send_url(&self, site: &SiteMetadata, tx: &TransactionRequest) -> Result<String> {
		let site_json = site.to_json()?;
		let mut params = Vec::with_capacity(7);
		if let Some(network) = tx.network.as_deref() {
			params.push(("network", network));
		}
		params.push(("to", tx.to.as_str()));
		if let Some(amount) = tx.amount.as_deref() {
			params.push(("amount", amount));
		}
		if let Some(data) = tx.data.as_deref() {
			params.push(("data", data));
		}
		params.push(("site", site_json.as_str()));
		params.push(("redirect", site.url.as_str()));
		params.push(("flow", "true"));
		self.flow_url(SEND_FLOW, &params)
	}

	fn flow_url(&self, flow: &str, params: &[(&str, &str)]) -> Result<String> {
		let mut url = Url::parse(&self.base)?;
		url.path_segments_mut()
			.map_err(|()| invalid_endpoint(&self.base, "cannot be a base"))?
			.pop_if_empty()
			.extend(["flow", flow]);
		url.query_pairs_mut().extend_pairs(params.iter().copied());
		Ok(url.into())
	}
}

impl Default for Endpoint {
	fn default() -> Self {
		Self {
			base: DEFAULT_ENDPOINT.to_string(),
			origin: DEFAULT_ENDPOINT.to_string(),
		}
	}
}

impl std::fmt::Display for Endpoint {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.base)
	}
}

fn invalid_endpoint(endpoint: &str, reason: impl Into<String>) -> ProtocolError {
	ProtocolError::InvalidEndpoint {
		endpoint: endpoint.to_string(),
		reason: reason.into(),
	}
}
