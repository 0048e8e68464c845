//! Canonical owner types for tests: a soft-deleting `posts` owner whose link
//! rows soft-delete alongside it, and a hard-deleting `users` owner.

use taglink_domain::OwnerSchema;
use taglink_storage::{Result, db::Db};

pub const POST: OwnerSchema = OwnerSchema {
	table: "posts",
	key_column: "id",
	link_table: "post_tags",
	tag_table: "tags",
	sync_columns: &["deleted_at"],
	deleted_at_column: Some("deleted_at"),
	tag_scope_column: None,
};
pub const USER: OwnerSchema = OwnerSchema {
	table: "users",
	key_column: "id",
	link_table: "user_tags",
	tag_table: "user_tag_names",
	sync_columns: &[],
	deleted_at_column: None,
	tag_scope_column: None,
};

pub async fn create_post_table(db: &Db) -> Result<()> {
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS posts (\
		id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT NOT NULL, deleted_at TEXT)",
	)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn insert_post(db: &Db, title: &str) -> Result<i64> {
	let result =
		sqlx::query("INSERT INTO posts (title) VALUES (?)").bind(title).execute(&db.pool).await?;

	Ok(result.last_insert_rowid())
}

pub async fn set_post_deleted(db: &Db, id: i64, deleted_at: Option<&str>) -> Result<()> {
	sqlx::query("UPDATE posts SET deleted_at = ? WHERE id = ?")
		.bind(deleted_at)
		.bind(id)
		.execute(&db.pool)
		.await?;

	Ok(())
}

pub async fn create_user_table(db: &Db) -> Result<()> {
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS users (\
		id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL)",
	)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn insert_user(db: &Db, name: &str) -> Result<i64> {
	let result =
		sqlx::query("INSERT INTO users (name) VALUES (?)").bind(name).execute(&db.pool).await?;

	Ok(result.last_insert_rowid())
}
