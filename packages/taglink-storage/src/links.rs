use sqlx::QueryBuilder;
use time::OffsetDateTime;

use taglink_domain::OwnerSchema;

use crate::{
	Result,
	db::Db,
	models::{TagLink, TaggedValue},
};

const LINK_COLUMNS: &str = "id, owner_id, tag_id, value, tag_created_at, tag_updated_at";

/// Owner column values denormalized onto link rows.
pub type SyncValues = [(&'static str, Option<String>)];

pub async fn find(
	db: &Db,
	owner: &OwnerSchema,
	owner_id: i64,
	tag_id: i64,
) -> Result<Option<TagLink>> {
	Ok(sqlx::query_as::<_, TagLink>(&format!(
		"SELECT {LINK_COLUMNS} FROM {} WHERE owner_id = ? AND tag_id = ?",
		owner.link_table,
	))
	.bind(owner_id)
	.bind(tag_id)
	.fetch_optional(&db.pool)
	.await?)
}

/// Every link row of an owner, soft-deleted ones included.
pub async fn for_owner(db: &Db, owner: &OwnerSchema, owner_id: i64) -> Result<Vec<TagLink>> {
	Ok(sqlx::query_as::<_, TagLink>(&format!(
		"SELECT {LINK_COLUMNS} FROM {} WHERE owner_id = ? ORDER BY id",
		owner.link_table,
	))
	.bind(owner_id)
	.fetch_all(&db.pool)
	.await?)
}

pub async fn tag_ids_for_owner(db: &Db, owner: &OwnerSchema, owner_id: i64) -> Result<Vec<i64>> {
	Ok(sqlx::query_scalar::<_, i64>(&format!(
		"SELECT tag_id FROM {} WHERE owner_id = ? ORDER BY id",
		owner.link_table,
	))
	.bind(owner_id)
	.fetch_all(&db.pool)
	.await?)
}

pub async fn insert(
	db: &Db,
	owner: &OwnerSchema,
	owner_id: i64,
	tag_id: i64,
	value: &str,
	sync: &SyncValues,
) -> Result<()> {
	let now = OffsetDateTime::now_utc();
	let mut builder =
		QueryBuilder::new(format!("INSERT INTO {} (owner_id, tag_id, value", owner.link_table));

	for (column, _) in sync {
		builder.push(format!(", {column}"));
	}

	builder.push(", tag_created_at, tag_updated_at) VALUES (");

	{
		let mut values = builder.separated(", ");

		values.push_bind(owner_id);
		values.push_bind(tag_id);
		values.push_bind(value.to_string());

		for (_, sync_value) in sync {
			values.push_bind(sync_value.clone());
		}

		values.push_bind(now);
		values.push_bind(now);
	}

	builder.push(")");
	builder.build().execute(&db.pool).await?;

	Ok(())
}

pub async fn update_value(
	db: &Db,
	owner: &OwnerSchema,
	owner_id: i64,
	tag_id: i64,
	value: &str,
	sync: &SyncValues,
) -> Result<()> {
	let mut builder = QueryBuilder::new(format!("UPDATE {} SET value = ", owner.link_table));

	builder.push_bind(value.to_string());

	for (column, sync_value) in sync {
		builder.push(format!(", {column} = "));
		builder.push_bind(sync_value.clone());
	}

	builder.push(", tag_updated_at = ");
	builder.push_bind(OffsetDateTime::now_utc());
	builder.push(" WHERE owner_id = ");
	builder.push_bind(owner_id);
	builder.push(" AND tag_id = ");
	builder.push_bind(tag_id);
	builder.build().execute(&db.pool).await?;

	Ok(())
}

/// Returns whether a row was actually removed.
pub async fn delete(db: &Db, owner: &OwnerSchema, owner_id: i64, tag_id: i64) -> Result<bool> {
	let result = sqlx::query(&format!(
		"DELETE FROM {} WHERE owner_id = ? AND tag_id = ?",
		owner.link_table,
	))
	.bind(owner_id)
	.bind(tag_id)
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected() > 0)
}

pub async fn delete_for_owner(db: &Db, owner: &OwnerSchema, owner_id: i64) -> Result<u64> {
	let result =
		sqlx::query(&format!("DELETE FROM {} WHERE owner_id = ?", owner.link_table))
			.bind(owner_id)
			.execute(&db.pool)
			.await?;

	Ok(result.rows_affected())
}

pub async fn sync_owner_columns(
	db: &Db,
	owner: &OwnerSchema,
	owner_id: i64,
	sync: &SyncValues,
) -> Result<()> {
	if sync.is_empty() {
		return Ok(());
	}

	let mut builder = QueryBuilder::new(format!("UPDATE {} SET ", owner.link_table));

	for (i, (column, sync_value)) in sync.iter().enumerate() {
		if i > 0 {
			builder.push(", ");
		}

		builder.push(format!("{column} = "));
		builder.push_bind(sync_value.clone());
	}

	builder.push(" WHERE owner_id = ");
	builder.push_bind(owner_id);
	builder.build().execute(&db.pool).await?;

	Ok(())
}

/// Live tag name/value pairs for one owner, in link insertion order.
pub async fn tagged_values(db: &Db, owner: &OwnerSchema, owner_id: i64) -> Result<Vec<TaggedValue>> {
	let mut sql = format!(
		"SELECT l.owner_id AS owner_id, l.tag_id AS tag_id, t.name AS name, l.value AS value \
		FROM {} AS l JOIN {} AS t ON t.id = l.tag_id WHERE l.owner_id = ?",
		owner.link_table, owner.tag_table,
	);

	if owner.links_soft_delete()
		&& let Some(column) = owner.deleted_at_column
	{
		sql.push_str(&format!(" AND l.{column} IS NULL"));
	}

	sql.push_str(" ORDER BY l.id");

	Ok(sqlx::query_as::<_, TaggedValue>(&sql).bind(owner_id).fetch_all(&db.pool).await?)
}

/// Live tag name/value pairs for a set of owners, in link insertion order.
pub async fn tagged_values_for_owners(
	db: &Db,
	owner: &OwnerSchema,
	owner_ids: &[i64],
) -> Result<Vec<TaggedValue>> {
	if owner_ids.is_empty() {
		return Ok(Vec::new());
	}

	let mut builder = QueryBuilder::new(format!(
		"SELECT l.owner_id AS owner_id, l.tag_id AS tag_id, t.name AS name, l.value AS value \
		FROM {} AS l JOIN {} AS t ON t.id = l.tag_id WHERE l.owner_id IN (",
		owner.link_table, owner.tag_table,
	));

	{
		let mut separated = builder.separated(", ");

		for owner_id in owner_ids {
			separated.push_bind(*owner_id);
		}
	}

	builder.push(")");

	if owner.links_soft_delete()
		&& let Some(column) = owner.deleted_at_column
	{
		builder.push(format!(" AND l.{column} IS NULL"));
	}

	builder.push(" ORDER BY l.id");

	Ok(builder.build_query_as::<TaggedValue>().fetch_all(&db.pool).await?)
}
