//! Host-entity lifecycle synchronization.
//!
//! The owning entity layer calls [`TagService::notify`] explicitly after each
//! transition; there are no implicit persistence hooks. The entity must be
//! passed in its post-transition state so `sync_values` reflects the columns
//! to denormalize.

use taglink_domain::OwnerEvent;
use taglink_storage::{links, tags};

use crate::{Result, TagService, TaggedEntity};

impl TagService {
	pub async fn notify<E>(&self, entity: &E, event: OwnerEvent) -> Result<()>
	where
		E: TaggedEntity,
	{
		match event {
			OwnerEvent::Saved => self.owner_saved(entity).await,
			OwnerEvent::Deleted => self.owner_deleted(entity).await,
			OwnerEvent::Restored => self.owner_restored(entity).await,
		}
	}

	/// Re-denormalize the owner's sync columns onto its link rows.
	async fn owner_saved<E>(&self, entity: &E) -> Result<()>
	where
		E: TaggedEntity,
	{
		let schema = E::schema();

		Ok(links::sync_owner_columns(self.db(), schema, entity.key(), &entity.sync_values())
			.await?)
	}

	async fn owner_deleted<E>(&self, entity: &E) -> Result<()>
	where
		E: TaggedEntity,
	{
		let schema = E::schema();
		let db = self.db();

		if schema.links_soft_delete() {
			// Counters drop while the rows stay for restoration. The live read
			// must precede the sync or nothing would still count as live.
			let live = links::tagged_values(db, schema, entity.key()).await?;

			links::sync_owner_columns(db, schema, entity.key(), &entity.sync_values()).await?;
			tracing::debug!(
				table = schema.table,
				owner_id = entity.key(),
				links = live.len(),
				"soft-detached links",
			);

			for value in live {
				tags::decrement_usage(db, schema, value.tag_id).await?;
			}

			Ok(())
		} else {
			self.unset_all(entity).await
		}
	}

	async fn owner_restored<E>(&self, entity: &E) -> Result<()>
	where
		E: TaggedEntity,
	{
		let schema = E::schema();
		let db = self.db();

		links::sync_owner_columns(db, schema, entity.key(), &entity.sync_values()).await?;

		if schema.links_soft_delete() {
			for value in links::tagged_values(db, schema, entity.key()).await? {
				tags::increment_usage(db, schema, value.tag_id).await?;
			}
		}

		Ok(())
	}
}
