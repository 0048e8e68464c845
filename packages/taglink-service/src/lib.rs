//! Tag services on top of the link storage: association writes with usage
//! accounting, selectivity-planned filter queries, and host-entity lifecycle
//! synchronization.

pub mod assoc;
pub mod filter;
pub mod lifecycle;

mod error;
pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

use sqlx::sqlite::SqliteRow;
use taglink_domain::{OwnerSchema, TagScope};
use taglink_storage::db::Db;

/// Contract an entity type implements so its rows can carry tag links.
///
/// `sync_values` must return one entry per schema `sync_columns` entry with
/// the entity's current column values; the default suits schemas that sync
/// nothing.
pub trait TaggedEntity: for<'r> sqlx::FromRow<'r, SqliteRow> + Send + Unpin {
	fn schema() -> &'static OwnerSchema;

	fn key(&self) -> i64;

	fn sync_values(&self) -> Vec<(&'static str, Option<String>)> {
		Vec::new()
	}

	fn tag_scope(&self) -> TagScope {
		TagScope::unscoped()
	}
}

pub struct TagService {
	db: Db,
}
impl TagService {
	pub fn new(db: Db) -> Self {
		Self { db }
	}

	pub fn db(&self) -> &Db {
		&self.db
	}

	/// Idempotent bootstrap of one owner type's tag and link tables.
	pub async fn ensure_schema<E>(&self) -> Result<()>
	where
		E: TaggedEntity,
	{
		Ok(self.db.ensure_schema(E::schema()).await?)
	}

	pub fn query<E>(&self) -> filter::TagQuery<'_, E>
	where
		E: TaggedEntity,
	{
		filter::TagQuery::new(self)
	}
}
