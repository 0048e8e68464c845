use time::OffsetDateTime;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Tag {
	pub id: i64,
	pub name: String,
	pub usage_count: i64,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub deleted_at: Option<OffsetDateTime>,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct TagLink {
	pub id: i64,
	pub owner_id: i64,
	pub tag_id: i64,
	pub value: String,
	pub tag_created_at: OffsetDateTime,
	pub tag_updated_at: OffsetDateTime,
}

/// One owner's tag name and link value, as hydrated by the read helpers.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct TaggedValue {
	pub owner_id: i64,
	pub tag_id: i64,
	pub name: String,
	pub value: String,
}
