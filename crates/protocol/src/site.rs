//! Descriptor of the embedding application.

use serde::{Deserialize, Serialize};

/// Branding the remote service shows on its consent screen.
///
/// Serialized to JSON and passed verbatim as the `site` query parameter of
/// every flow. Absent optional fields are omitted from the JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteMetadata {
	/// Origin or landing URL of the application, also used as the flow redirect.
	pub url: String,
	/// Display name.
	pub title: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub icon_url: Option<String>,
}

impl SiteMetadata {
	pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			title: title.into(),
			description: None,
			icon_url: None,
		}
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	pub fn with_icon_url(mut self, icon_url: impl Into<String>) -> Self {
		self.icon_url = Some(icon_url.into());
		self
	}

	/// JSON form sent in the `site` query parameter.
	pub fn to_json(&self) -> crate::Result<String> {
		Ok(serde_json::to_string(self)?)
	}
}

/// Identity provider the remote service should jump straight to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectProvider {
	Google,
}

impl DirectProvider {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Google => "google",
		}
	}

	/// Parses the provider hint accepted by the JS API.
	pub fn from_name(name: &str) -> Option<Self> {
		match name {
			"google" => Some(Self::Google),
			_ => None,
		}
	}
}
