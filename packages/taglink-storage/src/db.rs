use std::str::FromStr;

use sqlx::{
	SqlitePool,
	sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use taglink_domain::OwnerSchema;

use crate::{Result, schema};

pub struct Db {
	pub pool: SqlitePool,
}
impl Db {
	pub async fn connect(cfg: &taglink_config::Sqlite) -> Result<Self> {
		let options = SqliteConnectOptions::from_str(&cfg.path)?.create_if_missing(true);
		let pool = SqlitePoolOptions::new()
			.max_connections(cfg.pool_max_conns)
			.connect_with(options)
			.await?;

		Ok(Self { pool })
	}

	/// Single-connection in-memory database, used by the testkit.
	pub async fn in_memory() -> Result<Self> {
		let pool = SqlitePoolOptions::new()
			.max_connections(1)
			.connect("sqlite::memory:")
			.await?;

		Ok(Self { pool })
	}

	pub async fn ensure_schema(&self, owner: &OwnerSchema) -> Result<()> {
		let sql = schema::render_schema(owner);

		for statement in sql.split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&self.pool).await?;
		}

		Ok(())
	}
}
