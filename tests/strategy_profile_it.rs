#![cfg(feature = "reqwest")]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use serde_json::json;
use url::Url;
// self
use producteca_strategy::{
	_preludet::build_reqwest_test_strategy,
	config::Config,
	error::{Error, ProfileError, Result, TransportError},
	profile::Profile,
	strategy::{AuthOutcome, ReqwestStrategy},
};

const CLIENT_ID: &str = "client-it";
const CLIENT_SECRET: &str = "secret-it";

fn reject_all(_: &str, _: Option<&str>, _: &Profile) -> Result<AuthOutcome<String>> {
	Ok(AuthOutcome::Rejected)
}

fn build_config(profile_url: &str) -> Config {
	Config::builder(
		CLIENT_ID,
		CLIENT_SECRET,
		Url::parse("https://app.example.com/callback")
			.expect("Callback URL should parse successfully."),
	)
	.profile_url(Url::parse(profile_url).expect("Mock profile endpoint should parse successfully."))
	.build()
	.expect("Config should build successfully.")
}

fn build_strategy(profile_url: &str) -> ReqwestStrategy<String> {
	build_reqwest_test_strategy(build_config(profile_url), Arc::new(reject_all))
}

#[tokio::test]
async fn user_profile_normalizes_valid_documents() {
	let server = MockServer::start_async().await;
	let strategy = build_strategy(&server.url("/users/me"));
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/users/me").header("authorization", "Bearer tok1");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":\"123\",\"name\":\"Ana\"}");
		})
		.await;
	let profile =
		strategy.user_profile("tok1").await.expect("Profile retrieval should succeed.");

	mock.assert_async().await;

	assert_eq!(profile.provider, "producteca");
	assert_eq!(profile.access_token, "tok1");
	assert_eq!(profile.id(), Some("123"));
	assert_eq!(profile.get("name"), Some(&json!("Ana")));

	let value = serde_json::to_value(&profile).expect("Profile should serialize to JSON.");

	assert_eq!(
		value,
		json!({"id": "123", "name": "Ana", "provider": "producteca", "accessToken": "tok1"}),
	);
}

#[tokio::test]
async fn user_profile_surfaces_non_success_statuses_as_transport_errors() {
	let server = MockServer::start_async().await;
	let strategy = build_strategy(&server.url("/users/me"));
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/users/me");
			then.status(500).body("upstream exploded");
		})
		.await;
	let err = strategy
		.user_profile("tok1")
		.await
		.expect_err("Non-2xx responses should surface as transport errors.");

	mock.assert_async().await;

	match err {
		Error::Transport(TransportError::UnexpectedStatus { status, body_preview }) => {
			assert_eq!(status, 500);
			assert_eq!(body_preview, "upstream exploded");
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}
}

#[tokio::test]
async fn user_profile_surfaces_malformed_documents_as_parse_errors() {
	let server = MockServer::start_async().await;
	let strategy = build_strategy(&server.url("/users/me"));
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/users/me");
			then.status(200).body("not-json");
		})
		.await;
	let err = strategy
		.user_profile("tok1")
		.await
		.expect_err("Unparsable bodies should surface as profile errors.");

	mock.assert_async().await;

	assert!(matches!(err, Error::Profile(ProfileError::Malformed { .. })));
}

#[tokio::test]
async fn user_profile_surfaces_network_failures() {
	// Discard-protocol port; nothing is listening there.
	let strategy = build_strategy("http://127.0.0.1:9/users/me");
	let err = strategy
		.user_profile("tok1")
		.await
		.expect_err("Unreachable endpoints should surface as network errors.");

	assert!(matches!(err, Error::Transport(TransportError::Network { .. })));
}
