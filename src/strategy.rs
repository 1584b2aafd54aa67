//! The Producteca authentication strategy.
//!
//! The strategy authenticates requests by delegating to Producteca using the
//! OAuth 2.0 authorization-code flow. Applications supply a [`Verify`]
//! implementation which receives the access token, an always-absent refresh
//! token, and the normalized [`Profile`], and resolves to an application-level
//! principal outcome.
//!
//! Every operation is stateless with respect to other calls: the configuration
//! is read-only after construction and no state is shared across invocations,
//! so a strategy can be placed behind `Arc` and called concurrently.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;
use crate::{
	_prelude::*,
	config::Config,
	error::ProfileError,
	http::StrategyHttpClient,
	oauth::{ExchangeFacade, TokenSet},
	obs::{StageKind, StageSpan},
	profile::{JsonMap, PROVIDER_NAME, Profile},
};

const STATE_LEN: usize = 32;

/// Strategy specialized for the crate's default reqwest transport stack.
#[cfg(feature = "reqwest")]
pub type ReqwestStrategy<U> = ProductecaStrategy<U, ReqwestHttpClient>;

/// Boxed future resolving to a verify-callback outcome.
pub type VerifyFuture<'a, U> = Pin<Box<dyn Future<Output = Result<AuthOutcome<U>>> + 'a + Send>>;

/// Application-level result of verifying an authenticated identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthOutcome<U> {
	/// Credentials are valid and mapped to an application principal.
	Authenticated(U),
	/// Credentials are not valid for this application; no error occurred.
	Rejected,
}

/// Host-supplied callback mapping `(access token, refresh token, profile)` to
/// an application principal.
///
/// The refresh token argument is always `None` for this provider; it is kept
/// in the signature so hosts can reuse verify implementations across
/// strategies. Plain closures returning `Result<AuthOutcome<U>>` implement the
/// trait via the blanket impl; implement it manually when verification needs
/// to await (e.g., a database lookup).
pub trait Verify<U>: Send + Sync {
	/// Maps the authenticated identity to an application-level outcome.
	fn verify<'a>(
		&'a self,
		access_token: &'a str,
		refresh_token: Option<&'a str>,
		profile: &'a Profile,
	) -> VerifyFuture<'a, U>
	where
		U: 'a;
}
impl<U, F> Verify<U> for F
where
	U: Send,
	F: Send + Sync + Fn(&str, Option<&str>, &Profile) -> Result<AuthOutcome<U>>,
{
	fn verify<'a>(
		&'a self,
		access_token: &'a str,
		refresh_token: Option<&'a str>,
		profile: &'a Profile,
	) -> VerifyFuture<'a, U>
	where
		U: 'a,
	{
		let outcome = self(access_token, refresh_token, profile);

		Box::pin(async move { outcome })
	}
}

/// Authorization handshake metadata returned by
/// [`ProductecaStrategy::start_authorization`].
#[derive(Clone, Debug)]
pub struct AuthorizationSession {
	/// Opaque state value that must round-trip via the redirect handler.
	pub state: String,
	/// Fully-formed authorize URL that callers should send end-users to.
	pub authorize_url: Url,
}
impl AuthorizationSession {
	/// Validates the returned `state` parameter after the authorization redirect.
	pub fn validate_state(&self, returned_state: &str) -> Result<()> {
		if returned_state == self.state {
			Ok(())
		} else {
			Err(Error::InvalidGrant { reason: "Authorization state mismatch.".into() })
		}
	}
}

/// Pluggable authentication strategy for the Producteca identity provider.
///
/// The strategy owns its configuration, delegates the code-for-token exchange
/// to the generic `oauth2` facade, and implements the single first-party
/// operation: fetch-and-normalize the user profile.
pub struct ProductecaStrategy<U, C>
where
	C: ?Sized + StrategyHttpClient,
{
	config: Config,
	facade: ExchangeFacade<C>,
	http_client: Arc<C>,
	verify: Arc<dyn Verify<U>>,
}
impl<U, C> ProductecaStrategy<U, C>
where
	C: ?Sized + StrategyHttpClient,
{
	/// Fixed name used by host-framework strategy registries.
	pub const NAME: &'static str = PROVIDER_NAME;

	/// Creates a strategy that reuses the caller-provided transport.
	pub fn with_http_client(
		config: Config,
		verify: Arc<dyn Verify<U>>,
		http_client: impl Into<Arc<C>>,
	) -> Result<Self> {
		let http_client = http_client.into();
		let facade = ExchangeFacade::from_config(&config, Arc::clone(&http_client))?;

		Ok(Self { config, facade, http_client, verify })
	}

	/// Returns the registered strategy name, regardless of configuration.
	pub fn name(&self) -> &'static str {
		Self::NAME
	}

	/// Returns the immutable strategy configuration.
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Builds the authorization redirect for a new handshake.
	pub fn start_authorization(&self) -> AuthorizationSession {
		let _guard = StageSpan::new(StageKind::Authorization).entered();
		let state = random_string(STATE_LEN);
		let authorize_url = build_authorize_url(&self.config, &state);

		AuthorizationSession { state, authorize_url }
	}

	/// Exchanges an authorization code for a [`TokenSet`].
	///
	/// Exposed for hosts that orchestrate the redirect handler themselves;
	/// [`ProductecaStrategy::authenticate`] wraps the full sequence.
	pub async fn exchange_code(&self, code: &str) -> Result<TokenSet> {
		let span = StageSpan::new(StageKind::Exchange);

		span.instrument(self.facade.exchange_code(code)).await
	}

	/// Retrieves and normalizes the user profile from Producteca.
	///
	/// One authenticated `GET`, one parse, one augmentation. Transport and
	/// parse failures are surfaced immediately; there is no retry and no
	/// validation of the document shape.
	pub async fn user_profile(&self, access_token: &str) -> Result<Profile> {
		let span = StageSpan::new(StageKind::Profile);

		span.instrument(self.fetch_profile(access_token)).await
	}

	/// Runs the full authentication attempt for a redirect-handler callback:
	/// code exchange, profile fetch, then the verify callback.
	pub async fn authenticate(&self, code: &str) -> Result<AuthOutcome<U>> {
		let token_set = self.exchange_code(code).await?;
		let profile = self.user_profile(&token_set.access_token).await?;

		self.verify.verify(&token_set.access_token, None, &profile).await
	}

	async fn fetch_profile(&self, access_token: &str) -> Result<Profile> {
		let response =
			self.http_client.fetch_profile(&self.config.endpoints.profile, access_token).await?;
		let mut deserializer = serde_json::Deserializer::from_slice(&response.body);
		let document: JsonMap = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| ProfileError::Malformed { source })?;

		Ok(Profile::from_document(document, access_token))
	}
}
#[cfg(feature = "reqwest")]
impl<U> ProductecaStrategy<U, ReqwestHttpClient> {
	/// Creates a new strategy backed by the crate's default reqwest transport.
	pub fn new(config: Config, verify: Arc<dyn Verify<U>>) -> Result<Self> {
		Self::with_http_client(config, verify, ReqwestHttpClient::default())
	}
}
impl<U, C> Debug for ProductecaStrategy<U, C>
where
	C: ?Sized + StrategyHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProductecaStrategy")
			.field("name", &Self::NAME)
			.field("config", &self.config)
			.finish()
	}
}

fn build_authorize_url(config: &Config, state: &str) -> Url {
	let mut url = config.endpoints.authorization.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("response_type", "code");
	pairs.append_pair("client_id", &config.client_id);
	pairs.append_pair("redirect_uri", config.callback_url.as_str());
	pairs.append_pair("state", state);

	drop(pairs);

	url
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// std
	use std::collections::HashMap;
	// self
	use super::*;
	use crate::config::{DEFAULT_AUTHORIZATION_URL, DEFAULT_PROFILE_URL, DEFAULT_TOKEN_URL};

	fn reject_all(_: &str, _: Option<&str>, _: &Profile) -> Result<AuthOutcome<String>> {
		Ok(AuthOutcome::Rejected)
	}

	fn strategy() -> ReqwestStrategy<String> {
		let config = Config::builder(
			"client-id",
			"secret",
			Url::parse("https://app.example.com/callback")
				.expect("Failed to parse callback URL fixture."),
		)
		.build()
		.expect("Config fixture should build successfully.");

		ProductecaStrategy::new(config, Arc::new(reject_all))
			.expect("Strategy fixture should build successfully.")
	}

	#[test]
	fn name_is_fixed_regardless_of_configuration() {
		let strategy = strategy();

		assert_eq!(strategy.name(), "producteca");

		let overridden = Config::builder(
			"other-client",
			"other-secret",
			Url::parse("https://other.example.com/cb")
				.expect("Failed to parse callback URL fixture."),
		)
		.authorization_url(
			Url::parse("https://sso.example.com/authorize")
				.expect("Failed to parse override URL fixture."),
		)
		.build()
		.expect("Config fixture should build successfully.");
		let overridden: ReqwestStrategy<String> =
			ProductecaStrategy::new(overridden, Arc::new(reject_all))
				.expect("Strategy fixture should build successfully.");

		assert_eq!(overridden.name(), "producteca");
	}

	#[test]
	fn default_config_points_at_producteca_endpoints() {
		let strategy = strategy();

		assert_eq!(strategy.config().endpoints.authorization.as_str(), DEFAULT_AUTHORIZATION_URL);
		assert_eq!(strategy.config().endpoints.token.as_str(), DEFAULT_TOKEN_URL);
		assert_eq!(strategy.config().endpoints.profile.as_str(), DEFAULT_PROFILE_URL);
	}

	#[test]
	fn authorize_url_carries_code_flow_parameters() {
		let strategy = strategy();
		let session = strategy.start_authorization();

		assert_eq!(session.state.len(), STATE_LEN);

		let pairs: HashMap<_, _> = session.authorize_url.query_pairs().into_owned().collect();

		assert_eq!(pairs.get("response_type"), Some(&"code".into()));
		assert_eq!(pairs.get("client_id"), Some(&"client-id".into()));
		assert_eq!(pairs.get("redirect_uri"), Some(&"https://app.example.com/callback".into()));
		assert_eq!(pairs.get("state"), Some(&session.state));
	}

	#[test]
	fn session_state_validation_errors_on_mismatch() {
		let session = strategy().start_authorization();

		assert!(session.validate_state(session.state.as_str()).is_ok());

		let err = session.validate_state("other").expect_err("State mismatch should fail.");

		assert!(matches!(err, Error::InvalidGrant { .. }));
	}

	#[tokio::test]
	async fn closure_verify_receives_an_absent_refresh_token() {
		let verify = |_: &str, refresh: Option<&str>, _: &Profile| -> Result<AuthOutcome<String>> {
			assert!(refresh.is_none());

			Ok(AuthOutcome::Authenticated("user-1".into()))
		};
		let profile = Profile::from_document(JsonMap::new(), "tok1");
		let outcome = verify
			.verify("tok1", None, &profile)
			.await
			.expect("Verify closure should succeed.");

		assert_eq!(outcome, AuthOutcome::Authenticated("user-1".into()));
	}
}
