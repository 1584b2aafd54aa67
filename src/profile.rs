//! Normalized user profile documents.
//!
//! Producteca returns an unstructured JSON object from its profile endpoint.
//! No schema is validated or enforced beyond a successful parse; the strategy
//! only augments the document with the provider name and the access token used
//! to fetch it before handing it to the verify callback.

// crates.io
use serde_json::Value;
// self
use crate::_prelude::*;

/// Constant identifying the profile source, also the registered strategy name.
pub const PROVIDER_NAME: &str = "producteca";

/// Raw JSON object type carried inside a [`Profile`].
pub type JsonMap = serde_json::Map<String, Value>;

/// User-identity document handed to the host framework's verify callback.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Profile {
	/// Constant string identifying the source (always [`PROVIDER_NAME`]).
	pub provider: String,
	/// Access token used to fetch the profile.
	#[serde(rename = "accessToken")]
	pub access_token: String,
	/// Raw provider document, flattened alongside the augmented fields.
	#[serde(flatten)]
	pub document: JsonMap,
}
impl Profile {
	/// Augments a fetched document with the provider name and access token.
	///
	/// Homonymous keys in the raw document are replaced, never merged.
	pub(crate) fn from_document(mut document: JsonMap, access_token: &str) -> Self {
		document.remove("provider");
		document.remove("accessToken");

		Self { provider: PROVIDER_NAME.into(), access_token: access_token.to_owned(), document }
	}

	/// Looks up a field of the raw provider document.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.document.get(key)
	}

	/// Returns the provider-assigned user identifier, when present as a string.
	pub fn id(&self) -> Option<&str> {
		self.get("id").and_then(Value::as_str)
	}
}
