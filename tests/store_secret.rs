// std
use std::{
	env, fs,
	path::PathBuf,
	process,
	time::{SystemTime, UNIX_EPOCH},
};
// self
use reddit_purge::store::{FileStore, MemoryStore, SecretStore, keys};

async fn exercise_contract(store: &dyn SecretStore) {
	assert_eq!(
		store.get(keys::ACCESS_TOKEN).await.expect("Reading a missing key should succeed."),
		None
	);

	store
		.set(keys::ACCESS_TOKEN, "access-contract")
		.await
		.expect("Setting a value should succeed.");
	store.set(keys::USERNAME, "contract_user").await.expect("Setting a value should succeed.");

	assert_eq!(
		store.get(keys::ACCESS_TOKEN).await.expect("Reading a stored key should succeed."),
		Some("access-contract".into())
	);

	store
		.set(keys::ACCESS_TOKEN, "access-replaced")
		.await
		.expect("Overwriting a value should succeed.");

	assert_eq!(
		store.get(keys::ACCESS_TOKEN).await.expect("Reading a replaced key should succeed."),
		Some("access-replaced".into())
	);

	store.remove(keys::USERNAME).await.expect("Removing a key should succeed.");
	store.remove(keys::USERNAME).await.expect("Removing an absent key should also succeed.");

	assert_eq!(
		store.get(keys::USERNAME).await.expect("Reading a removed key should succeed."),
		None
	);

	store.clear().await.expect("Clearing the store should succeed.");

	assert_eq!(
		store.get(keys::ACCESS_TOKEN).await.expect("Reading after clear should succeed."),
		None
	);

	store.clear().await.expect("Clearing an empty store should also succeed.");
}

fn temp_path(label: &str) -> PathBuf {
	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System clock should be past the epoch.")
		.as_nanos();
	let unique = format!("reddit_purge_{label}_{}_{nanos}.json", process::id());

	env::temp_dir().join(unique)
}

#[tokio::test]
async fn memory_store_honors_the_contract() {
	exercise_contract(&MemoryStore::default()).await;
}

#[tokio::test]
async fn file_store_honors_the_contract() {
	let path = temp_path("contract");
	let store = FileStore::open(&path).expect("Opening the file store should succeed.");

	exercise_contract(&store).await;

	fs::remove_file(&path).unwrap_or_else(|e| {
		panic!("Failed to remove the temporary snapshot {}: {e}", path.display())
	});
}

#[tokio::test]
async fn file_store_survives_a_reopen() {
	let path = temp_path("reopen");

	{
		let store = FileStore::open(&path).expect("Opening the file store should succeed.");

		store
			.set(keys::REFRESH_TOKEN, "refresh-durable")
			.await
			.expect("Setting a value should succeed.");
	}

	let reopened = FileStore::open(&path).expect("Reopening the file store should succeed.");

	assert_eq!(
		reopened
			.get(keys::REFRESH_TOKEN)
			.await
			.expect("Reading after reopen should succeed."),
		Some("refresh-durable".into())
	);

	fs::remove_file(&path).unwrap_or_else(|e| {
		panic!("Failed to remove the temporary snapshot {}: {e}", path.display())
	});
}
