use std::collections::HashMap;

use sqlx::{QueryBuilder, Sqlite};
use time::OffsetDateTime;

use taglink_domain::{FilterGroup, OwnerSchema, ResolvedCriterion, TagRef, TagScope};

use crate::{Error, Result, db::Db, models::Tag};

const TAG_COLUMNS: &str = "id, name, usage_count, created_at, updated_at, deleted_at";

pub async fn find_by_id(
	db: &Db,
	owner: &OwnerSchema,
	scope: &TagScope,
	id: i64,
) -> Result<Option<Tag>> {
	let mut builder = QueryBuilder::new(format!(
		"SELECT {TAG_COLUMNS} FROM {} WHERE deleted_at IS NULL AND id = ",
		owner.tag_table,
	));

	builder.push_bind(id);
	push_scope(&mut builder, owner, scope);

	Ok(builder.build_query_as::<Tag>().fetch_optional(&db.pool).await?)
}

pub async fn find_by_name(
	db: &Db,
	owner: &OwnerSchema,
	scope: &TagScope,
	name: &str,
) -> Result<Option<Tag>> {
	let mut builder = QueryBuilder::new(format!(
		"SELECT {TAG_COLUMNS} FROM {} WHERE deleted_at IS NULL AND name = ",
		owner.tag_table,
	));

	builder.push_bind(name.to_string());
	push_scope(&mut builder, owner, scope);

	Ok(builder.build_query_as::<Tag>().fetch_optional(&db.pool).await?)
}

/// Find a tag by name or create it with a zero usage counter.
///
/// Creation persists immediately, independent of whether any association
/// follows. Two callers racing on the same new name are reconciled by the
/// unique name index: the lost insert is retried as a lookup.
pub async fn find_or_create(
	db: &Db,
	owner: &OwnerSchema,
	scope: &TagScope,
	name: &str,
) -> Result<Tag> {
	let name = name.trim();

	if name.is_empty() {
		return Err(Error::InvalidArgument("tag name must not be empty".to_string()));
	}
	if let Some(tag) = find_by_name(db, owner, scope, name).await? {
		return Ok(tag);
	}

	let now = OffsetDateTime::now_utc();
	let scoped = owner.tag_scope_column.zip(scope.value());
	let mut builder = QueryBuilder::new(format!("INSERT INTO {} (name", owner.tag_table));

	if let Some((column, _)) = scoped {
		builder.push(format!(", {column}"));
	}

	builder.push(", usage_count, created_at, updated_at) VALUES (");

	{
		let mut values = builder.separated(", ");

		values.push_bind(name.to_string());

		if let Some((_, value)) = scoped {
			values.push_bind(value.to_string());
		}

		values.push_bind(0_i64);
		values.push_bind(now);
		values.push_bind(now);
	}

	builder.push(") ON CONFLICT (name) DO NOTHING");

	let result = builder.build().execute(&db.pool).await?;

	if result.rows_affected() == 1 {
		tracing::debug!(table = owner.tag_table, name, "created tag");
	}
	if let Some(tag) = find_by_name(db, owner, scope, name).await? {
		return Ok(tag);
	}

	// The name row exists but is invisible to the scoped live lookup
	// (soft-deleted, or created under another scope).
	find_any_by_name(db, owner, name)
		.await?
		.ok_or_else(|| Error::NotFound(format!("tag missing after insert; name={name}")))
}

/// Resolve every criterion of a filter specification in one query.
///
/// Unresolved criteria are dropped from their group only; the caller decides
/// what an empty group means.
pub async fn resolve_criteria(
	db: &Db,
	owner: &OwnerSchema,
	scope: &TagScope,
	groups: &[FilterGroup],
) -> Result<Vec<Vec<ResolvedCriterion>>> {
	let mut ids = Vec::new();
	let mut names = Vec::new();

	for group in groups {
		for criterion in &group.criteria {
			match &criterion.tag {
				TagRef::Id(id) => ids.push(*id),
				TagRef::Name(name) => names.push(name.clone()),
			}
		}
	}

	if ids.is_empty() && names.is_empty() {
		return Ok(groups.iter().map(|_| Vec::new()).collect());
	}

	let mut builder = QueryBuilder::new(format!(
		"SELECT id, name, usage_count FROM {} WHERE deleted_at IS NULL",
		owner.tag_table,
	));

	push_scope(&mut builder, owner, scope);
	builder.push(" AND (");

	if !ids.is_empty() {
		builder.push("id IN (");

		let mut separated = builder.separated(", ");

		for id in &ids {
			separated.push_bind(*id);
		}

		builder.push(")");
	}
	if !names.is_empty() {
		if !ids.is_empty() {
			builder.push(" OR ");
		}

		builder.push("name IN (");

		let mut separated = builder.separated(", ");

		for name in &names {
			separated.push_bind(name.clone());
		}

		builder.push(")");
	}

	builder.push(")");

	let rows: Vec<(i64, String, i64)> = builder.build_query_as().fetch_all(&db.pool).await?;
	let mut by_id = HashMap::new();
	let mut by_name = HashMap::new();

	for (id, name, usage_count) in rows {
		by_id.insert(id, (id, usage_count));
		by_name.insert(name, (id, usage_count));
	}

	let resolved = groups
		.iter()
		.map(|group| {
			group
				.criteria
				.iter()
				.filter_map(|criterion| {
					let (tag_id, usage_count) = match &criterion.tag {
						TagRef::Id(id) => *by_id.get(id)?,
						TagRef::Name(name) => *by_name.get(name.as_str())?,
					};

					Some(ResolvedCriterion { tag_id, usage_count, cmp: criterion.cmp.clone() })
				})
				.collect()
		})
		.collect();

	Ok(resolved)
}

/// Atomic in-place increment; never a read-modify-write round trip.
pub async fn increment_usage(db: &Db, owner: &OwnerSchema, tag_id: i64) -> Result<()> {
	sqlx::query(&format!(
		"UPDATE {} SET usage_count = usage_count + 1, updated_at = ? WHERE id = ?",
		owner.tag_table,
	))
	.bind(OffsetDateTime::now_utc())
	.bind(tag_id)
	.execute(&db.pool)
	.await?;

	Ok(())
}

/// Atomic in-place decrement. A decrement that would go below zero means an
/// upstream consistency bug and surfaces as [`Error::CounterUnderflow`]
/// instead of being clamped.
pub async fn decrement_usage(db: &Db, owner: &OwnerSchema, tag_id: i64) -> Result<()> {
	let result = sqlx::query(&format!(
		"UPDATE {} SET usage_count = usage_count - 1, updated_at = ? WHERE id = ? AND usage_count > 0",
		owner.tag_table,
	))
	.bind(OffsetDateTime::now_utc())
	.bind(tag_id)
	.execute(&db.pool)
	.await?;

	if result.rows_affected() == 0 {
		return Err(Error::CounterUnderflow(format!(
			"table={} tag_id={tag_id}",
			owner.tag_table,
		)));
	}

	Ok(())
}

pub async fn list_recent(
	db: &Db,
	owner: &OwnerSchema,
	scope: &TagScope,
	limit: i64,
) -> Result<Vec<Tag>> {
	list(db, owner, scope, "created_at DESC, id DESC", limit).await
}

pub async fn list_popular(
	db: &Db,
	owner: &OwnerSchema,
	scope: &TagScope,
	limit: i64,
) -> Result<Vec<Tag>> {
	list(db, owner, scope, "usage_count DESC, created_at ASC", limit).await
}

pub async fn list_alphabetical(
	db: &Db,
	owner: &OwnerSchema,
	scope: &TagScope,
	limit: i64,
) -> Result<Vec<Tag>> {
	list(db, owner, scope, "name ASC", limit).await
}

async fn list(
	db: &Db,
	owner: &OwnerSchema,
	scope: &TagScope,
	order: &str,
	limit: i64,
) -> Result<Vec<Tag>> {
	let mut builder = QueryBuilder::new(format!(
		"SELECT {TAG_COLUMNS} FROM {} WHERE deleted_at IS NULL",
		owner.tag_table,
	));

	push_scope(&mut builder, owner, scope);
	builder.push(format!(" ORDER BY {order} LIMIT "));
	builder.push_bind(limit);

	Ok(builder.build_query_as::<Tag>().fetch_all(&db.pool).await?)
}

async fn find_any_by_name(db: &Db, owner: &OwnerSchema, name: &str) -> Result<Option<Tag>> {
	Ok(sqlx::query_as::<_, Tag>(&format!(
		"SELECT {TAG_COLUMNS} FROM {} WHERE name = ?",
		owner.tag_table,
	))
	.bind(name.to_string())
	.fetch_optional(&db.pool)
	.await?)
}

fn push_scope(builder: &mut QueryBuilder<'_, Sqlite>, owner: &OwnerSchema, scope: &TagScope) {
	if let Some(column) = owner.tag_scope_column
		&& let Some(value) = scope.value()
	{
		builder.push(format!(" AND {column} = "));
		builder.push_bind(value.to_string());
	}
}
