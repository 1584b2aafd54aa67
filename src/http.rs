//! Transport primitives for the Producteca strategy.
//!
//! The module exposes [`StrategyHttpClient`], the crate's only dependency on an
//! HTTP stack. Implementations provide two capabilities: a short-lived
//! [`AsyncHttpClient`] handle used by the `oauth2` facade for the
//! code-for-token POST, and an authenticated `GET` primitive used to retrieve
//! the user profile after a successful exchange.

// std
use std::ops::Deref;
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
// self
use crate::{_prelude::*, error::TransportError};

const BODY_PREVIEW_LIMIT: usize = 256;

/// Boxed future resolving to a raw profile response.
pub type ProfileFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ProfileResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing the strategy's two
/// outbound calls: the token exchange and the profile retrieval.
///
/// Implementations must be `Send + Sync + 'static` so a strategy can be shared
/// behind `Arc` without additional wrappers.
///
/// # Profile Contract
///
/// - The access token is carried as a bearer `Authorization` header.
/// - Non-2xx responses must resolve to [`TransportError::UnexpectedStatus`];
///   the strategy never inspects the status of a successful response.
/// - Exactly one attempt per call. Retry and timeout policy belong to the
///   underlying transport, not to this trait.
pub trait StrategyHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle consumed by the `oauth2` facade.
	///
	/// The request future returned by [`AsyncHttpClient::call`] must be `Send`
	/// so the facade's boxed futures inherit the same guarantee.
	type TokenHandle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds a handle for a single token-endpoint request.
	fn token_handle(&self) -> Self::TokenHandle;

	/// Performs one authenticated `GET` against the profile endpoint.
	fn fetch_profile<'a>(&'a self, url: &'a Url, access_token: &'a str) -> ProfileFuture<'a>;
}

/// Raw profile response handed back to the strategy for parsing.
#[derive(Clone, Debug)]
pub struct ProfileResponse {
	/// HTTP status code (always 2xx; other statuses become errors).
	pub status: u16,
	/// Raw response body.
	pub body: Vec<u8>,
}

/// Truncates a response body for inclusion in error values.
pub(crate) fn truncate_preview(body: String) -> String {
	if body.chars().count() <= BODY_PREVIEW_LIMIT {
		return body;
	}

	let mut buf = String::new();

	for (idx, ch) in body.chars().enumerate() {
		if idx >= BODY_PREVIEW_LIMIT {
			buf.push('…');

			break;
		}
		buf.push(ch);
	}

	buf
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one
/// place. Token requests should not follow redirects, matching OAuth 2.0
/// guidance that token endpoints return results directly; configure any custom
/// [`ReqwestClient`] accordingly.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl StrategyHttpClient for ReqwestHttpClient {
	type TokenHandle = ReqwestTokenHandle;
	type TransportError = ReqwestError;

	fn token_handle(&self) -> Self::TokenHandle {
		ReqwestTokenHandle(Arc::new(self.0.clone()))
	}

	fn fetch_profile<'a>(&'a self, url: &'a Url, access_token: &'a str) -> ProfileFuture<'a> {
		Box::pin(async move {
			let response = self
				.0
				.get(url.clone())
				.bearer_auth(access_token)
				.send()
				.await
				.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let body = response.bytes().await.map_err(TransportError::from)?.to_vec();

			if !(200..300).contains(&status) {
				return Err(TransportError::UnexpectedStatus {
					status,
					body_preview: truncate_preview(String::from_utf8_lossy(&body).into_owned()),
				});
			}

			Ok(ProfileResponse { status, body })
		})
	}
}

/// Token-exchange handle returned by [`ReqwestHttpClient`] that satisfies the
/// `oauth2` crate's [`AsyncHttpClient`] contract.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestTokenHandle(Arc<ReqwestClient>);
#[cfg(feature = "reqwest")]
impl<'c> AsyncHttpClient<'c> for ReqwestTokenHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = Arc::clone(&self.0);

		Box::pin(async move {
			let response =
				client.execute(request.try_into().map_err(Box::new)?).await.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}
