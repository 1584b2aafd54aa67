//! Internal OAuth client facade over the generic `oauth2` crate.
//!
//! The facade owns the configured `oauth2` client and performs the
//! authorization-code exchange on behalf of the strategy. The handshake
//! protocol itself (code-for-token POST, error payloads) is entirely the
//! `oauth2` crate's responsibility; this module only wires configuration in
//! and maps failures out into the crate taxonomy.

pub use oauth2;

// crates.io
use oauth2::{
	AuthUrl, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, RedirectUrl, RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError},
};
// self
use crate::{
	_prelude::*,
	config::Config,
	error::{ConfigError, TransportError},
	http::StrategyHttpClient,
};

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Access token material obtained from a successful authorization-code exchange.
///
/// Producteca never issues refresh tokens, so the set carries only the access
/// token and an optional expiry instant (the provider may omit `expires_in`).
#[derive(Clone, Debug)]
pub struct TokenSet {
	/// Access token proving authorization to call protected endpoints.
	pub access_token: String,
	/// Expiry instant, when the token endpoint reported one.
	pub expires_at: Option<OffsetDateTime>,
}
impl TokenSet {
	/// Checks whether the token is known to be expired at `now`.
	///
	/// Tokens without a reported expiry are never considered expired here.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		matches!(self.expires_at, Some(at) if at <= now)
	}
}

pub(crate) struct ExchangeFacade<C>
where
	C: ?Sized + StrategyHttpClient,
{
	oauth_client: ConfiguredBasicClient,
	http_client: Arc<C>,
}
impl<C> ExchangeFacade<C>
where
	C: ?Sized + StrategyHttpClient,
{
	pub(crate) fn from_config(config: &Config, http_client: Arc<C>) -> Result<Self> {
		let auth_url = AuthUrl::new(config.endpoints.authorization.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "authorization", source })?;
		let token_url = TokenUrl::new(config.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "token", source })?;
		let redirect_url = RedirectUrl::new(config.callback_url.to_string())
			.map_err(|source| ConfigError::InvalidCallback { source })?;
		let oauth_client = BasicClient::new(ClientId::new(config.client_id.clone()))
			.set_client_secret(ClientSecret::new(config.client_secret.clone()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url)
			.set_redirect_uri(redirect_url);

		Ok(Self { oauth_client, http_client })
	}

	pub(crate) async fn exchange_code(&self, code: &str) -> Result<TokenSet> {
		let handle = self.http_client.token_handle();
		let response = self
			.oauth_client
			.exchange_code(AuthorizationCode::new(code.to_owned()))
			.request_async(&handle)
			.await
			.map_err(map_request_error)?;
		let issued_at = OffsetDateTime::now_utc();
		let expires_at = response
			.expires_in()
			.and_then(|duration| i64::try_from(duration.as_secs()).ok())
			.map(|secs| issued_at + Duration::seconds(secs));

		// Any refresh token in the response is dropped: the provider contract
		// treats refresh tokens as always absent.
		Ok(TokenSet { access_token: response.access_token().secret().to_owned(), expires_at })
	}
}

fn map_request_error<E>(err: BasicRequestTokenError<HttpClientError<E>>) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		RequestTokenError::ServerResponse(response) => map_server_response_error(response),
		RequestTokenError::Request(error) => map_transport_error(error),
		RequestTokenError::Parse(source, _body) => Error::TokenResponseParse { source },
		RequestTokenError::Other(message) => Error::TokenEndpoint {
			message: format!("Token endpoint returned an unexpected response: {message}"),
			status: None,
		},
	}
}

fn map_server_response_error(response: BasicErrorResponse) -> Error {
	let code = response.error().as_ref().to_string();
	let message = if let Some(description) = response.error_description() {
		format!("Token endpoint returned an OAuth error: {description}")
	} else {
		format!("Token endpoint returned an OAuth error: {code}")
	};

	if code.eq_ignore_ascii_case("invalid_grant") || code.eq_ignore_ascii_case("access_denied") {
		Error::InvalidGrant { reason: message }
	} else if code.eq_ignore_ascii_case("invalid_client")
		|| code.eq_ignore_ascii_case("unauthorized_client")
	{
		Error::InvalidClient { reason: message }
	} else {
		Error::TokenEndpoint { message, status: None }
	}
}

fn map_transport_error<E>(err: HttpClientError<E>) -> Error
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		HttpClientError::Reqwest(inner) => TransportError::network(*inner).into(),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => Error::TokenEndpoint {
			message: format!("HTTP client error occurred while calling the token endpoint: {message}"),
			status: None,
		},
		_ => Error::TokenEndpoint {
			message: "HTTP client error occurred while calling the token endpoint.".into(),
			status: None,
		},
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use super::*;
	use crate::http::ReqwestHttpClient;

	fn config() -> Config {
		Config::builder(
			"client-id",
			"secret",
			Url::parse("https://app.example.com/callback")
				.expect("Failed to parse callback URL fixture."),
		)
		.build()
		.expect("Config fixture should build successfully.")
	}

	#[test]
	fn builds_facade_from_default_config() {
		let result = <ExchangeFacade<ReqwestHttpClient>>::from_config(
			&config(),
			Arc::new(ReqwestHttpClient::default()),
		);

		assert!(result.is_ok());
	}

	#[test]
	fn token_set_expiry_checks_respect_missing_expiry() {
		let now = OffsetDateTime::now_utc();
		let open_ended = TokenSet { access_token: "tok".into(), expires_at: None };
		let expired =
			TokenSet { access_token: "tok".into(), expires_at: Some(now - Duration::seconds(1)) };
		let live =
			TokenSet { access_token: "tok".into(), expires_at: Some(now + Duration::seconds(60)) };

		assert!(!open_ended.is_expired_at(now));
		assert!(expired.is_expired_at(now));
		assert!(!live.is_expired_at(now));
	}
}
