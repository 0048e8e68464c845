//! Association writes with usage accounting, plus per-entity reads.

use taglink_domain::{OwnerSchema, TagRef, TagScope};
use taglink_storage::{
	links,
	models::{Tag, TaggedValue},
	tags,
};

use crate::{Result, TagService, TaggedEntity};

impl TagService {
	/// Attach, update or remove one tag value on an entity.
	///
	/// `Some(value)` inserts the link (incrementing the tag's usage counter)
	/// or updates it in place (counter unchanged). `None` removes an existing
	/// link and decrements, and is otherwise a no-op; a tag referenced by
	/// name is still registered either way. Unknown tag ids are ignored.
	pub async fn set_tag<E>(
		&self,
		entity: &E,
		tag: impl Into<TagRef>,
		value: Option<&str>,
	) -> Result<()>
	where
		E: TaggedEntity,
	{
		let schema = E::schema();
		let Some(tag) = self.resolve_for_write(schema, &entity.tag_scope(), tag.into()).await?
		else {
			return Ok(());
		};
		let existing = links::find(self.db(), schema, entity.key(), tag.id).await?;

		match (existing, value) {
			(Some(_), Some(value)) =>
				links::update_value(
					self.db(),
					schema,
					entity.key(),
					tag.id,
					value,
					&entity.sync_values(),
				)
				.await?,
			(None, Some(value)) => {
				links::insert(
					self.db(),
					schema,
					entity.key(),
					tag.id,
					value,
					&entity.sync_values(),
				)
				.await?;
				tags::increment_usage(self.db(), schema, tag.id).await?;
			},
			(Some(_), None) =>
				if links::delete(self.db(), schema, entity.key(), tag.id).await? {
					tags::decrement_usage(self.db(), schema, tag.id).await?;
				},
			(None, None) => (),
		}

		Ok(())
	}

	/// Apply a batch of independent single-tag writes in order.
	///
	/// There is no batch transaction: an error aborts the remainder while
	/// already-applied entries stay persisted.
	pub async fn set_tags<E>(
		&self,
		entity: &E,
		entries: Vec<(TagRef, Option<String>)>,
	) -> Result<()>
	where
		E: TaggedEntity,
	{
		for (tag, value) in entries {
			self.set_tag(entity, tag, value.as_deref()).await?;
		}

		Ok(())
	}

	/// Remove one association if present; unknown tags are a no-op.
	pub async fn unset_tag<E>(&self, entity: &E, tag: impl Into<TagRef>) -> Result<()>
	where
		E: TaggedEntity,
	{
		let schema = E::schema();
		let Some(tag) = self.resolve_for_read(schema, &entity.tag_scope(), tag.into()).await?
		else {
			return Ok(());
		};

		if links::delete(self.db(), schema, entity.key(), tag.id).await? {
			tags::decrement_usage(self.db(), schema, tag.id).await?;
		}

		Ok(())
	}

	pub async fn unset_tags<E>(&self, entity: &E, refs: Vec<TagRef>) -> Result<()>
	where
		E: TaggedEntity,
	{
		for tag in refs {
			self.unset_tag(entity, tag).await?;
		}

		Ok(())
	}

	/// Remove every association of an entity.
	pub async fn unset_all<E>(&self, entity: &E) -> Result<()>
	where
		E: TaggedEntity,
	{
		let schema = E::schema();

		// Only live links still hold a counter reference; soft-deleted rows
		// were decremented when the owner went away.
		for value in links::tagged_values(self.db(), schema, entity.key()).await? {
			tags::decrement_usage(self.db(), schema, value.tag_id).await?;
		}

		links::delete_for_owner(self.db(), schema, entity.key()).await?;

		Ok(())
	}

	/// Live tag name/value pairs of an entity, in association order.
	pub async fn tags_for<E>(&self, entity: &E) -> Result<Vec<TaggedValue>>
	where
		E: TaggedEntity,
	{
		Ok(links::tagged_values(self.db(), E::schema(), entity.key()).await?)
	}

	pub async fn tag_value<E>(&self, entity: &E, tag: impl Into<TagRef>) -> Result<Option<String>>
	where
		E: TaggedEntity,
	{
		let values = self.tags_for(entity).await?;
		let found = match tag.into() {
			TagRef::Id(id) => values.into_iter().find(|value| value.tag_id == id),
			TagRef::Name(name) => values.into_iter().find(|value| value.name == name),
		};

		Ok(found.map(|value| value.value))
	}

	pub async fn has_tag<E>(&self, entity: &E, tag: impl Into<TagRef>) -> Result<bool>
	where
		E: TaggedEntity,
	{
		Ok(self.tag_value(entity, tag).await?.is_some())
	}

	pub async fn recent_tags<E>(&self, scope: &TagScope, limit: i64) -> Result<Vec<Tag>>
	where
		E: TaggedEntity,
	{
		Ok(tags::list_recent(self.db(), E::schema(), scope, limit).await?)
	}

	pub async fn popular_tags<E>(&self, scope: &TagScope, limit: i64) -> Result<Vec<Tag>>
	where
		E: TaggedEntity,
	{
		Ok(tags::list_popular(self.db(), E::schema(), scope, limit).await?)
	}

	pub async fn alphabetical_tags<E>(&self, scope: &TagScope, limit: i64) -> Result<Vec<Tag>>
	where
		E: TaggedEntity,
	{
		Ok(tags::list_alphabetical(self.db(), E::schema(), scope, limit).await?)
	}

	async fn resolve_for_write(
		&self,
		schema: &OwnerSchema,
		scope: &TagScope,
		tag: TagRef,
	) -> Result<Option<Tag>> {
		match tag {
			TagRef::Name(name) =>
				Ok(Some(tags::find_or_create(self.db(), schema, scope, &name).await?)),
			TagRef::Id(id) => {
				let tag = tags::find_by_id(self.db(), schema, scope, id).await?;

				if tag.is_none() {
					tracing::debug!(table = schema.tag_table, id, "ignoring unknown tag id");
				}

				Ok(tag)
			},
		}
	}

	async fn resolve_for_read(
		&self,
		schema: &OwnerSchema,
		scope: &TagScope,
		tag: TagRef,
	) -> Result<Option<Tag>> {
		Ok(match tag {
			TagRef::Name(name) => tags::find_by_name(self.db(), schema, scope, &name).await?,
			TagRef::Id(id) => tags::find_by_id(self.db(), schema, scope, id).await?,
		})
	}
}
