//! Shared helpers for the integration tests.

pub mod fixtures;

use taglink_domain::OwnerSchema;
use taglink_storage::{Result, db::Db};

pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_test_writer()
		.try_init();
}

/// In-memory database with one owner type's tag and link tables bootstrapped.
pub async fn tag_db(owner: &OwnerSchema) -> Result<Db> {
	let db = Db::in_memory().await?;

	db.ensure_schema(owner).await?;

	Ok(db)
}
