#![cfg(all(feature = "reqwest", feature = "test"))]

// crates.io
use httpmock::prelude::*;
// self
use reddit_purge::{
	_preludet::*,
	flows::CallbackParams,
	store::{SecretStore, keys},
};

const TOKEN_BODY: &str = "{\"access_token\":\"access-authorized\",\"refresh_token\":\"refresh-authorized\",\"token_type\":\"bearer\",\"expires_in\":3600,\"scope\":\"identity history edit read\"}";

#[tokio::test]
async fn authorization_code_exchange_binds_the_identity() {
	let server = MockServer::start_async().await;
	let (engine, store) = build_reqwest_test_engine(mock_server_config(&server.base_url()));
	let attempt = engine.begin_authorization();

	// Public-client Basic credential: client id as username, empty password.
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/v1/access_token")
				.header("authorization", "Basic Y2xpZW50LWl0Og==")
				.body_includes("grant_type=authorization_code")
				.body_includes("code=code-authorized")
				.body_includes("code_verifier=");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let identity_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/v1/me")
				.header("authorization", "Bearer access-authorized");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"name\":\"demo_user\",\"id\":\"abc123\"}");
		})
		.await;
	let callback = CallbackParams {
		code: Some("code-authorized".into()),
		state: Some(attempt.state.clone()),
		error: None,
	};
	let session = engine
		.complete_authorization(attempt, callback)
		.await
		.expect("Authorization completion should succeed.");

	token_mock.assert_async().await;
	identity_mock.assert_async().await;

	assert_eq!(session.username.as_deref(), Some("demo_user"));
	assert_eq!(
		session.access_token.as_ref().map(|secret| secret.expose()),
		Some("access-authorized")
	);
	assert_eq!(
		session.refresh_token.as_ref().map(|secret| secret.expose()),
		Some("refresh-authorized")
	);
	assert!(session.logged_in());

	let stored_expiry = store
		.get(keys::EXPIRY_MS)
		.await
		.expect("Reading the expiry should succeed.")
		.expect("Expiry should be persisted after login.");
	let expiry_ms: i64 = stored_expiry.parse().expect("Persisted expiry should be epoch millis.");
	let now_ms = OffsetDateTime::now_utc().unix_timestamp() * 1_000;

	// expires_in=3600 lands roughly an hour ahead of now.
	assert!((expiry_ms - now_ms - 3_600_000).abs() < 60_000);
}

#[tokio::test]
async fn state_mismatch_fails_before_the_token_endpoint() {
	let server = MockServer::start_async().await;
	let (engine, _) = build_reqwest_test_engine(mock_server_config(&server.base_url()));
	let attempt = engine.begin_authorization();
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/access_token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let callback = CallbackParams {
		code: Some("code-forged".into()),
		state: Some("forged-state".into()),
		error: None,
	};
	let err = engine
		.complete_authorization(attempt, callback)
		.await
		.expect_err("A forged state should abort the flow.");

	assert!(matches!(err, Error::StateMismatch));

	token_mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn provider_denial_reports_the_upstream_reason() {
	let server = MockServer::start_async().await;
	let (engine, _) = build_reqwest_test_engine(mock_server_config(&server.base_url()));
	let attempt = engine.begin_authorization();
	let callback = CallbackParams {
		code: None,
		state: Some(attempt.state.clone()),
		error: Some("access_denied".into()),
	};
	let err = engine
		.complete_authorization(attempt, callback)
		.await
		.expect_err("A provider denial should abort the flow.");

	assert!(matches!(
		err,
		Error::MissingAuthorizationCode { reason: Some(ref reason) } if reason == "access_denied"
	));
}

#[tokio::test]
async fn authorize_url_round_trips_through_callback_parsing() {
	let server = MockServer::start_async().await;
	let (engine, _) = build_reqwest_test_engine(mock_server_config(&server.base_url()));
	let attempt = engine.begin_authorization();

	// Simulated provider redirect carrying the original state back.
	let redirect = Url::parse(&format!(
		"testapp://auth?state={}&code=code-round-trip",
		attempt.state
	))
	.expect("Redirect URL fixture should parse.");
	let params = CallbackParams::from_redirect_url(&redirect);

	assert_eq!(params.state.as_deref(), Some(attempt.state.as_str()));
	assert_eq!(params.code.as_deref(), Some("code-round-trip"));
	assert!(attempt.validate_state(params.state.as_deref().unwrap_or_default()).is_ok());
}
