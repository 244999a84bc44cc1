//! Façade configuration.

use serde::{Deserialize, Serialize};
use zkauth_protocol::{DEFAULT_ENDPOINT, Endpoint, SiteMetadata};

use crate::error::Result;

/// Environment variable that overrides the endpoint in [`AuthConfig::from_env`].
pub const ENDPOINT_ENV: &str = "ZKAUTH_ENDPOINT";

/// Settings supplied by the embedding application.
///
/// `endpoint` defaults to the production deployment. Validation happens when
/// an [`AuthSession`](crate::AuthSession) is built from the config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
	#[serde(default = "default_endpoint")]
	pub endpoint: String,
	pub site: SiteMetadata,
}

fn default_endpoint() -> String {
	DEFAULT_ENDPOINT.to_string()
}

impl AuthConfig {
	pub fn new(site: SiteMetadata) -> Self {
		Self {
			endpoint: default_endpoint(),
			site,
		}
	}

	pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
		self.endpoint = endpoint.into();
		self
	}

	/// Builds a config whose endpoint may be overridden by [`ENDPOINT_ENV`].
	pub fn from_env(site: SiteMetadata) -> Self {
		Self::new(site).with_endpoint_override(std::env::var(ENDPOINT_ENV).ok())
	}

	/// Parses a JSON config such as `{"endpoint": "...", "site": {...}}`.
	pub fn from_json(json: &str) -> Result<Self> {
		Ok(serde_json::from_str(json)?)
	}

	/// Parses and validates the endpoint.
	pub fn endpoint(&self) -> Result<Endpoint> {
		Ok(Endpoint::parse(&self.endpoint)?)
	}

	fn with_endpoint_override(self, value: Option<String>) -> Self {
		match value {
			Some(endpoint) if !endpoint.trim().is_empty() => self.with_endpoint(endpoint),
			_ => self,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn site() -> SiteMetadata {
		SiteMetadata::new("https://app.example", "App")
	}

	#[test]
	fn new_uses_default_endpoint() {
		let config = AuthConfig::new(site());
		assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
		assert_eq!(config.endpoint().unwrap().origin(), DEFAULT_ENDPOINT);
	}

	#[test]
	fn from_json_fills_default_endpoint() {
		let config =
			AuthConfig::from_json(r#"{"site":{"url":"https://app.example","title":"App"}}"#)
				.unwrap();
		assert_eq!(config, AuthConfig::new(site()));
	}

	#[test]
	fn from_json_reads_endpoint_and_icon() {
		let config = AuthConfig::from_json(
			r#"{"endpoint":"https://auth.example/","site":{"url":"https://app.example","title":"App","iconUrl":"https://app.example/i.png"}}"#,
		)
		.unwrap();
		assert_eq!(config.endpoint().unwrap().base(), "https://auth.example");
		assert_eq!(config.site.icon_url.as_deref(), Some("https://app.example/i.png"));
	}

	#[test]
	fn from_json_requires_site() {
		assert!(AuthConfig::from_json(r#"{"endpoint":"https://auth.example"}"#).is_err());
	}

	#[test]
	fn endpoint_override_ignores_blank_values() {
		let config = AuthConfig::new(site()).with_endpoint_override(Some("  ".into()));
		assert_eq!(config.endpoint, DEFAULT_ENDPOINT);

		let config = AuthConfig::new(site()).with_endpoint_override(None);
		assert_eq!(config.endpoint, DEFAULT_ENDPOINT);

		let config =
			AuthConfig::new(site()).with_endpoint_override(Some("https://auth.example".into()));
		assert_eq!(config.endpoint, "https://auth.example");
	}

	#[test]
	fn invalid_endpoint_is_reported() {
		let config = AuthConfig::new(site()).with_endpoint("auth.example");
		assert!(config.endpoint().is_err());
	}
}
