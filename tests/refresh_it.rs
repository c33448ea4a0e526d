#![cfg(all(feature = "reqwest", feature = "test"))]

// crates.io
use httpmock::prelude::*;
// self
use reddit_purge::{
	_preludet::*,
	auth::TokenSecret,
	store::{MemoryStore, SecretStore, keys},
};

const ROTATED_BODY: &str = "{\"access_token\":\"access-rotated\",\"refresh_token\":\"refresh-rotated\",\"token_type\":\"bearer\",\"expires_in\":3600}";

async fn seed_session(store: &MemoryStore, access: &str, refresh: Option<&str>, expires_in: Duration) {
	let expiry_ms = ((OffsetDateTime::now_utc() + expires_in).unix_timestamp() * 1_000).to_string();

	store.set(keys::ACCESS_TOKEN, access).await.expect("Seeding the access token should succeed.");
	store.set(keys::EXPIRY_MS, &expiry_ms).await.expect("Seeding the expiry should succeed.");
	store.set(keys::USERNAME, "tester").await.expect("Seeding the username should succeed.");

	if let Some(refresh) = refresh {
		store
			.set(keys::REFRESH_TOKEN, refresh)
			.await
			.expect("Seeding the refresh token should succeed.");
	}
}

#[tokio::test]
async fn token_read_inside_the_skew_window_refreshes_first() {
	let server = MockServer::start_async().await;
	let (engine, store) = build_reqwest_test_engine(mock_server_config(&server.base_url()));

	// 30s left with a 60s skew: the next read must rotate.
	seed_session(&store, "access-stale", Some("refresh-stale"), Duration::seconds(30)).await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/v1/access_token")
				.body_includes("grant_type=refresh_token")
				.body_includes("refresh_token=refresh-stale");
			then.status(200).header("content-type", "application/json").body(ROTATED_BODY);
		})
		.await;
	let token = engine
		.current_valid_token()
		.await
		.expect("Token read should succeed after the refresh.");

	mock.assert_async().await;

	assert_eq!(token.expose(), "access-rotated");
	assert_eq!(
		store.get(keys::REFRESH_TOKEN).await.expect("Reading the refresh token should succeed."),
		Some("refresh-rotated".into())
	);
	assert_eq!(engine.refresh_metrics.attempts(), 1);
	assert_eq!(engine.refresh_metrics.successes(), 1);
}

#[tokio::test]
async fn token_read_outside_the_skew_window_skips_the_exchange() {
	let server = MockServer::start_async().await;
	let (engine, store) = build_reqwest_test_engine(mock_server_config(&server.base_url()));

	seed_session(&store, "access-fresh", Some("refresh-fresh"), Duration::hours(1)).await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/access_token");
			then.status(200).header("content-type", "application/json").body(ROTATED_BODY);
		})
		.await;
	let token = engine.current_valid_token().await.expect("Fresh token read should succeed.");

	assert_eq!(token.expose(), "access-fresh");

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn concurrent_reads_share_a_single_exchange() {
	let server = MockServer::start_async().await;
	let (engine, store) = build_reqwest_test_engine(mock_server_config(&server.base_url()));

	seed_session(&store, "access-racing", Some("refresh-racing"), Duration::seconds(5)).await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/access_token");
			then.status(200)
				.header("content-type", "application/json")
				.body(ROTATED_BODY)
				.delay(std::time::Duration::from_millis(100));
		})
		.await;
	let (first, second): (Result<TokenSecret>, Result<TokenSecret>) =
		tokio::join!(engine.current_valid_token(), engine.current_valid_token());
	let first = first.expect("First concurrent read should succeed.");
	let second = second.expect("Second concurrent read should succeed.");

	assert_eq!(first.expose(), "access-rotated");
	assert_eq!(second.expose(), "access-rotated");

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn failed_refresh_surfaces_the_stale_token() {
	let server = MockServer::start_async().await;
	let (engine, store) = build_reqwest_test_engine(mock_server_config(&server.base_url()));

	seed_session(&store, "access-stale", Some("refresh-dead"), Duration::seconds(10)).await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/access_token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\"}");
		})
		.await;

	// The read itself succeeds; the downstream call is the one that will observe
	// the provider's rejection.
	let token = engine
		.current_valid_token()
		.await
		.expect("A failed refresh should not fail the token read.");

	mock.assert_async().await;

	assert_eq!(token.expose(), "access-stale");
	assert_eq!(engine.refresh_metrics.failures(), 1);
}

#[tokio::test]
async fn explicit_refresh_surfaces_failures() {
	let server = MockServer::start_async().await;
	let (engine, store) = build_reqwest_test_engine(mock_server_config(&server.base_url()));

	seed_session(&store, "access-any", Some("refresh-dead"), Duration::hours(1)).await;

	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/access_token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\"}");
		})
		.await;
	let err = engine
		.refresh_session()
		.await
		.expect_err("An explicit refresh should surface the provider rejection.");

	assert!(matches!(err, Error::RefreshFailed { .. }));
}

#[tokio::test]
async fn session_without_refresh_token_is_surfaced_untouched() {
	let server = MockServer::start_async().await;
	let (engine, store) = build_reqwest_test_engine(mock_server_config(&server.base_url()));

	seed_session(&store, "access-orphan", None, Duration::seconds(1)).await;

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/access_token");
			then.status(200).header("content-type", "application/json").body(ROTATED_BODY);
		})
		.await;
	let token = engine
		.current_valid_token()
		.await
		.expect("A session without rotation material should still surface its token.");

	assert_eq!(token.expose(), "access-orphan");

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn logout_clears_every_persisted_key() {
	let server = MockServer::start_async().await;
	let (engine, store) = build_reqwest_test_engine(mock_server_config(&server.base_url()));

	seed_session(&store, "access-gone", Some("refresh-gone"), Duration::hours(1)).await;
	engine.logout().await.expect("Logout should succeed.");

	assert!(!engine.logged_in().await.expect("Session inspection should succeed."));
	assert_eq!(
		store.get(keys::USERNAME).await.expect("Reading the username should succeed."),
		None
	);

	// Idempotent on an already-empty store.
	engine.logout().await.expect("A second logout should also succeed.");
}
