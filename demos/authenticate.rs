//! Walks through constructing the Producteca strategy, launching an authorization
//! session, and the calls a redirect handler would later make.

// std
use std::{collections::HashMap, sync::Arc};
// crates.io
use color_eyre::Result;
use url::Url;
// self
use producteca_strategy::{
	config::Config,
	profile::Profile,
	strategy::{AuthOutcome, ProductecaStrategy, ReqwestStrategy},
};

fn main() -> Result<()> {
	color_eyre::install()?;

	let config = Config::builder(
		"2288989987133514",
		"shhh-its-a-secret",
		Url::parse("https://www.example.net/auth/producteca/callback")?,
	)
	.build()?;
	let verify = |_access_token: &str,
	              _refresh_token: Option<&str>,
	              profile: &Profile|
	 -> producteca_strategy::error::Result<AuthOutcome<String>> {
		// Look up or create the application user here.
		Ok(match profile.id() {
			Some(id) => AuthOutcome::Authenticated(format!("user-{id}")),
			None => AuthOutcome::Rejected,
		})
	};
	let strategy: ReqwestStrategy<String> = ProductecaStrategy::new(config, Arc::new(verify))?;
	let session = strategy.start_authorization();

	println!("Send your user to {}.", &session.authorize_url);

	let mut sessions: HashMap<String, _> = HashMap::new();

	sessions.insert(session.state.clone(), session.clone());

	// Simulate the redirect handler looking up the stored session by `state`.
	let returned_state = session.state.clone();

	if let Some(stashed) = sessions.remove(&returned_state) {
		stashed.validate_state(&returned_state)?;
		println!(
			"Validated state; call `ProductecaStrategy::authenticate` with the returned code."
		);
		println!(
			"The `{}` strategy then fetches and normalizes the profile for your verify callback.",
			strategy.name()
		);
	} else {
		eprintln!("State `{returned_state}` was not recognized.");
	}

	Ok(())
}
