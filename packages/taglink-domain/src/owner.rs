/// Contract an owning entity type supplies so its links and tags can be
/// stored and queried. The core never inspects the entity itself beyond this.
#[derive(Clone, Copy, Debug)]
pub struct OwnerSchema {
	/// Entity table holding the full rows hydrated after a filtered id fetch.
	pub table: &'static str,
	/// Primary key column of `table`.
	pub key_column: &'static str,
	/// Link table joining owners to tags.
	pub link_table: &'static str,
	/// Tag table backing this owner type.
	pub tag_table: &'static str,
	/// Owner columns denormalized onto every link row on save.
	pub sync_columns: &'static [&'static str],
	/// Soft-delete timestamp column, when the owner type soft-deletes.
	pub deleted_at_column: Option<&'static str>,
	/// Optional column scoping tag lookups and creation (e.g. per tenant).
	pub tag_scope_column: Option<&'static str>,
}
impl OwnerSchema {
	/// Link rows are soft-deleted alongside the owner when the owner
	/// soft-deletes and its deletion column is among the synced columns.
	pub fn links_soft_delete(&self) -> bool {
		self.deleted_at_column.is_some_and(|column| self.sync_columns.contains(&column))
	}
}

/// Host-entity lifecycle notifications the sync layer subscribes to.
///
/// The owning entity abstraction calls these explicitly; there are no
/// implicit persistence hooks.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OwnerEvent {
	Saved,
	Deleted,
	Restored,
}

/// Always-present tag query/creation context. Unscoped is a no-op; a scoped
/// value is matched against the owner schema's `tag_scope_column`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TagScope(Option<String>);
impl TagScope {
	pub const fn unscoped() -> Self {
		Self(None)
	}

	pub fn of(value: impl Into<String>) -> Self {
		Self(Some(value.into()))
	}

	pub fn value(&self) -> Option<&str> {
		self.0.as_deref()
	}
}
