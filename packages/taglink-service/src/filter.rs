//! Filter queries over tagged entities.
//!
//! A query collects filter groups, resolves them against the tag registry,
//! compiles a selectivity-ordered self-join plan over the link table, fetches
//! matching owner ids, then hydrates full entity rows in plan order.

use std::{collections::HashMap, marker::PhantomData};

use sqlx::QueryBuilder;

use taglink_domain::{
	Bind, Cmp, FilterCriterion, FilterGroup, QueryPlan, SelectSql, TagRef, TagScope, build_plan,
};
use taglink_storage::{db::Db, links, models::TaggedValue, tags};

use crate::{Error, Result, TagService, TaggedEntity};

/// One page of a paginated fetch.
#[derive(Clone, Debug, serde::Serialize)]
pub struct Page<E> {
	pub items: Vec<E>,
	pub total: i64,
	pub page: i64,
	pub per_page: i64,
}

pub struct TagQuery<'a, E> {
	service: &'a TagService,
	scope: TagScope,
	groups: Vec<FilterGroup>,
	_marker: PhantomData<E>,
}

impl<'a, E> TagQuery<'a, E>
where
	E: TaggedEntity,
{
	pub(crate) fn new(service: &'a TagService) -> Self {
		Self { service, scope: TagScope::unscoped(), groups: Vec::new(), _marker: PhantomData }
	}

	pub fn scoped(mut self, scope: TagScope) -> Self {
		self.scope = scope;

		self
	}

	/// Require a tag to be present, regardless of its value.
	pub fn with_tag(self, tag: impl Into<TagRef>) -> Self {
		self.group(FilterGroup::single(FilterCriterion::of(tag)))
	}

	/// Require a tag with a value comparison.
	pub fn where_tag(self, tag: impl Into<TagRef>, cmp: Cmp, value: impl Into<String>) -> Self {
		self.group(FilterGroup::single(FilterCriterion::compare(tag, cmp, value)))
	}

	/// Require at least one of the given tags to be present.
	pub fn with_any_tags<T>(self, tags: impl IntoIterator<Item = T>) -> Self
	where
		T: Into<TagRef>,
	{
		self.group(FilterGroup::any(tags.into_iter().map(FilterCriterion::of).collect()))
	}

	/// Require at least one of the given criteria to match.
	pub fn where_any_tags(self, criteria: Vec<FilterCriterion>) -> Self {
		self.group(FilterGroup::any(criteria))
	}

	fn group(mut self, group: FilterGroup) -> Self {
		self.groups.push(group);

		self
	}

	pub async fn fetch(self) -> Result<Vec<E>> {
		let ids = match self.plan().await? {
			Some(plan) => run_ids(self.service.db(), &plan.render_ids(None, None)).await?,
			None => return Ok(Vec::new()),
		};

		self.hydrate(&ids).await
	}

	pub async fn first(self) -> Result<Option<E>> {
		let ids = match self.plan().await? {
			Some(plan) => run_ids(self.service.db(), &plan.render_ids(Some(1), None)).await?,
			None => return Ok(None),
		};

		Ok(self.hydrate(&ids).await?.into_iter().next())
	}

	pub async fn count(self) -> Result<i64> {
		match self.plan().await? {
			Some(plan) => run_count(self.service.db(), &plan.render_count()).await,
			None => Ok(0),
		}
	}

	/// `page` starts at 1. `total` counts matches across all pages.
	pub async fn paginate(self, page: i64, per_page: i64) -> Result<Page<E>> {
		if page < 1 {
			return Err(Error::InvalidRequest(format!("page starts at 1, got {page}")));
		}
		if per_page < 1 {
			return Err(Error::InvalidRequest(format!(
				"per_page must be positive, got {per_page}",
			)));
		}

		let Some(plan) = self.plan().await? else {
			return Ok(Page { items: Vec::new(), total: 0, page, per_page });
		};
		let db = self.service.db();
		let total = run_count(db, &plan.render_count()).await?;
		let ids = run_ids(db, &plan.render_ids(Some(per_page), Some((page - 1) * per_page))).await?;
		let items = self.hydrate(&ids).await?;

		Ok(Page { items, total, page, per_page })
	}

	/// Fetch matches together with each entity's live tag values, resolved in
	/// one extra query instead of one per entity.
	pub async fn fetch_with_tags(self) -> Result<Vec<(E, Vec<TaggedValue>)>> {
		let schema = E::schema();
		let db = self.service.db();
		let items = self.fetch().await?;
		let ids = items.iter().map(TaggedEntity::key).collect::<Vec<_>>();
		let mut grouped: HashMap<i64, Vec<TaggedValue>> = HashMap::new();

		for value in links::tagged_values_for_owners(db, schema, &ids).await? {
			grouped.entry(value.owner_id).or_default().push(value);
		}

		Ok(items
			.into_iter()
			.map(|item| {
				let values = grouped.remove(&item.key()).unwrap_or_default();

				(item, values)
			})
			.collect())
	}

	async fn plan(&self) -> Result<Option<QueryPlan>> {
		let schema = E::schema();
		let resolved =
			tags::resolve_criteria(self.service.db(), schema, &self.scope, &self.groups).await?;
		match build_plan(schema, resolved) {
			Some(plan) => {
				tracing::debug!(
					table = schema.table,
					joins = plan.joins.len(),
					distinct = plan.distinct,
					"compiled filter plan",
				);

				Ok(Some(plan))
			},
			None => {
				tracing::debug!(table = schema.table, "unsatisfiable filter; returning empty");

				Ok(None)
			},
		}
	}

	async fn hydrate(&self, ids: &[i64]) -> Result<Vec<E>> {
		if ids.is_empty() {
			return Ok(Vec::new());
		}

		let schema = E::schema();
		let mut builder = QueryBuilder::new(format!(
			"SELECT * FROM {} WHERE {} IN (",
			schema.table, schema.key_column,
		));

		{
			let mut separated = builder.separated(", ");

			for id in ids {
				separated.push_bind(*id);
			}
		}

		builder.push(")");

		let rows: Vec<E> =
			builder.build_query_as().fetch_all(&self.service.db().pool).await?;
		// Restore plan order with a single position map pass.
		let position =
			ids.iter().enumerate().map(|(i, id)| (*id, i)).collect::<HashMap<_, _>>();
		let mut slots = Vec::with_capacity(ids.len());

		slots.resize_with(ids.len(), || None);

		for row in rows {
			if let Some(&i) = position.get(&row.key()) {
				slots[i] = Some(row);
			}
		}

		Ok(slots.into_iter().flatten().collect())
	}
}

async fn run_ids(db: &Db, select: &SelectSql) -> Result<Vec<i64>> {
	let mut query = sqlx::query_scalar::<_, i64>(&select.sql);

	for bind in &select.binds {
		query = match bind {
			Bind::Id(id) => query.bind(*id),
			Bind::Text(text) => query.bind(text.clone()),
		};
	}

	Ok(query.fetch_all(&db.pool).await?)
}

async fn run_count(db: &Db, select: &SelectSql) -> Result<i64> {
	let mut query = sqlx::query_scalar::<_, i64>(&select.sql);

	for bind in &select.binds {
		query = match bind {
			Bind::Id(id) => query.bind(*id),
			Bind::Text(text) => query.bind(text.clone()),
		};
	}

	Ok(query.fetch_one(&db.pool).await?)
}
