//! Strategy configuration: credentials, callback, and Producteca endpoint defaults.
//!
//! [`Config`] is immutable after construction and owned exclusively by the
//! strategy instance. The builder fills in the three fixed Producteca endpoint
//! URLs whenever the caller does not override them; an explicitly supplied
//! endpoint replaces the default exactly.

// self
use crate::{_prelude::*, error::ConfigError};

/// Default authorization endpoint published by Producteca.
pub const DEFAULT_AUTHORIZATION_URL: &str = "http://auth.producteca.com/oauth/authorise";
/// Default token endpoint published by Producteca.
pub const DEFAULT_TOKEN_URL: &str = "http://auth.producteca.com/oauth/token";
/// Default profile endpoint published by Producteca.
pub const DEFAULT_PROFILE_URL: &str = "http://auth.producteca.com/users/me";

/// Endpoint set used by the strategy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
	/// Authorization endpoint the end-user is redirected to.
	pub authorization: Url,
	/// Token endpoint used for the authorization-code exchange.
	pub token: Url,
	/// Profile endpoint queried after a successful exchange.
	pub profile: Url,
}

/// Immutable strategy configuration.
#[derive(Clone)]
pub struct Config {
	/// OAuth 2.0 client identifier issued by Producteca.
	pub client_id: String,
	/// Confidential client secret issued by Producteca.
	pub client_secret: String,
	/// URI Producteca redirects back to after granting authorization.
	pub callback_url: Url,
	/// Endpoint definitions, defaulted unless overridden.
	pub endpoints: Endpoints,
}
impl Config {
	/// Creates a new builder seeded with the required credentials and callback.
	pub fn builder(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		callback_url: Url,
	) -> ConfigBuilder {
		ConfigBuilder::new(client_id, client_secret, callback_url)
	}
}
impl Debug for Config {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Config")
			.field("client_id", &self.client_id)
			.field("client_secret_set", &!self.client_secret.is_empty())
			.field("callback_url", &self.callback_url)
			.field("endpoints", &self.endpoints)
			.finish()
	}
}

/// Builder for [`Config`] values.
#[derive(Debug)]
pub struct ConfigBuilder {
	/// OAuth 2.0 client identifier issued by Producteca.
	pub client_id: String,
	/// Confidential client secret issued by Producteca.
	pub client_secret: String,
	/// URI Producteca redirects back to after granting authorization.
	pub callback_url: Url,
	/// Optional authorization endpoint override.
	pub authorization_url: Option<Url>,
	/// Optional token endpoint override.
	pub token_url: Option<Url>,
	/// Optional profile endpoint override.
	pub profile_url: Option<Url>,
}
impl ConfigBuilder {
	/// Creates a new builder seeded with the required credentials and callback.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		callback_url: Url,
	) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: client_secret.into(),
			callback_url,
			authorization_url: None,
			token_url: None,
			profile_url: None,
		}
	}

	/// Overrides the authorization endpoint.
	pub fn authorization_url(mut self, url: Url) -> Self {
		self.authorization_url = Some(url);

		self
	}

	/// Overrides the token endpoint.
	pub fn token_url(mut self, url: Url) -> Self {
		self.token_url = Some(url);

		self
	}

	/// Overrides the profile endpoint.
	pub fn profile_url(mut self, url: Url) -> Self {
		self.profile_url = Some(url);

		self
	}

	/// Consumes the builder, filling in the Producteca defaults for any
	/// endpoint the caller did not override.
	pub fn build(self) -> Result<Config, ConfigError> {
		let authorization = resolve_endpoint(
			"authorization",
			self.authorization_url,
			DEFAULT_AUTHORIZATION_URL,
		)?;
		let token = resolve_endpoint("token", self.token_url, DEFAULT_TOKEN_URL)?;
		let profile = resolve_endpoint("profile", self.profile_url, DEFAULT_PROFILE_URL)?;

		Ok(Config {
			client_id: self.client_id,
			client_secret: self.client_secret,
			callback_url: self.callback_url,
			endpoints: Endpoints { authorization, token, profile },
		})
	}
}

fn resolve_endpoint(
	name: &'static str,
	supplied: Option<Url>,
	default: &str,
) -> Result<Url, ConfigError> {
	match supplied {
		Some(url) => Ok(url),
		None => Url::parse(default)
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: name, source }),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse config test URL.")
	}

	#[test]
	fn build_applies_the_three_producteca_defaults() {
		let config = Config::builder("client-id", "shhh", url("https://app.example.com/cb"))
			.build()
			.expect("Config with defaults should build successfully.");

		assert_eq!(config.endpoints.authorization.as_str(), DEFAULT_AUTHORIZATION_URL);
		assert_eq!(config.endpoints.token.as_str(), DEFAULT_TOKEN_URL);
		assert_eq!(config.endpoints.profile.as_str(), DEFAULT_PROFILE_URL);
		assert_eq!(config.client_id, "client-id");
		assert_eq!(config.callback_url.as_str(), "https://app.example.com/cb");
	}

	#[test]
	fn explicit_endpoints_override_defaults_exactly() {
		let config = Config::builder("client-id", "shhh", url("https://app.example.com/cb"))
			.authorization_url(url("https://sso.example.com/authorize"))
			.token_url(url("https://sso.example.com/token"))
			.profile_url(url("https://sso.example.com/me"))
			.build()
			.expect("Config with overrides should build successfully.");

		assert_eq!(config.endpoints.authorization.as_str(), "https://sso.example.com/authorize");
		assert_eq!(config.endpoints.token.as_str(), "https://sso.example.com/token");
		assert_eq!(config.endpoints.profile.as_str(), "https://sso.example.com/me");
	}

	#[test]
	fn partial_overrides_keep_remaining_defaults() {
		let config = Config::builder("client-id", "shhh", url("https://app.example.com/cb"))
			.profile_url(url("https://sso.example.com/me"))
			.build()
			.expect("Config with a partial override should build successfully.");

		assert_eq!(config.endpoints.authorization.as_str(), DEFAULT_AUTHORIZATION_URL);
		assert_eq!(config.endpoints.token.as_str(), DEFAULT_TOKEN_URL);
		assert_eq!(config.endpoints.profile.as_str(), "https://sso.example.com/me");
	}

	#[test]
	fn debug_hides_the_client_secret() {
		let config = Config::builder("client-id", "shhh", url("https://app.example.com/cb"))
			.build()
			.expect("Config should build successfully.");
		let rendered = format!("{config:?}");

		assert!(!rendered.contains("shhh"));
		assert!(rendered.contains("client_secret_set"));
	}
}
