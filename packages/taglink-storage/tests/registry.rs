use taglink_domain::{Cmp, FilterCriterion, FilterGroup, OwnerSchema, TagScope};
use taglink_storage::{Error, db::Db, links, tags};

const POST: OwnerSchema = OwnerSchema {
	table: "posts",
	key_column: "id",
	link_table: "post_tags",
	tag_table: "tags",
	sync_columns: &["deleted_at"],
	deleted_at_column: Some("deleted_at"),
	tag_scope_column: None,
};
const TENANT: OwnerSchema = OwnerSchema {
	table: "documents",
	key_column: "id",
	link_table: "document_tags",
	tag_table: "document_tag_names",
	sync_columns: &[],
	deleted_at_column: None,
	tag_scope_column: Some("tenant"),
};

async fn database(owner: &OwnerSchema) -> Db {
	let db = Db::in_memory().await.unwrap();

	db.ensure_schema(owner).await.unwrap();

	db
}

#[tokio::test]
async fn find_or_create_is_idempotent() {
	let db = database(&POST).await;
	let scope = TagScope::unscoped();
	let created = tags::find_or_create(&db, &POST, &scope, "color").await.unwrap();

	assert_eq!(created.name, "color");
	assert_eq!(created.usage_count, 0);

	let again = tags::find_or_create(&db, &POST, &scope, "color").await.unwrap();

	assert_eq!(again.id, created.id);
}

#[tokio::test]
async fn find_or_create_rejects_blank_name() {
	let db = database(&POST).await;
	let result = tags::find_or_create(&db, &POST, &TagScope::unscoped(), "   ").await;

	assert!(matches!(result, Err(Error::InvalidArgument(_))));
}

#[tokio::test]
async fn tag_exists_without_any_link() {
	let db = database(&POST).await;
	let scope = TagScope::unscoped();

	tags::find_or_create(&db, &POST, &scope, "draft").await.unwrap();

	let found = tags::find_by_name(&db, &POST, &scope, "draft").await.unwrap().unwrap();

	assert_eq!(found.usage_count, 0);
}

#[tokio::test]
async fn resolve_drops_unknown_references() {
	let db = database(&POST).await;
	let scope = TagScope::unscoped();
	let color = tags::find_or_create(&db, &POST, &scope, "color").await.unwrap();
	let size = tags::find_or_create(&db, &POST, &scope, "size").await.unwrap();
	let groups = vec![
		FilterGroup::any(vec![
			FilterCriterion::compare("color", Cmp::Eq, "red"),
			FilterCriterion::of("missing"),
		]),
		FilterGroup::single(FilterCriterion::of(size.id)),
		FilterGroup::single(FilterCriterion::of(999_i64)),
	];
	let resolved = tags::resolve_criteria(&db, &POST, &scope, &groups).await.unwrap();

	assert_eq!(resolved.len(), 3);
	assert_eq!(resolved[0].len(), 1);
	assert_eq!(resolved[0][0].tag_id, color.id);
	assert_eq!(resolved[0][0].cmp, Some((Cmp::Eq, "red".to_string())));
	assert_eq!(resolved[1].len(), 1);
	assert_eq!(resolved[1][0].tag_id, size.id);
	assert!(resolved[2].is_empty());
}

#[tokio::test]
async fn usage_counter_round_trip() {
	let db = database(&POST).await;
	let scope = TagScope::unscoped();
	let tag = tags::find_or_create(&db, &POST, &scope, "color").await.unwrap();

	tags::increment_usage(&db, &POST, tag.id).await.unwrap();
	tags::increment_usage(&db, &POST, tag.id).await.unwrap();
	tags::decrement_usage(&db, &POST, tag.id).await.unwrap();

	let tag = tags::find_by_id(&db, &POST, &scope, tag.id).await.unwrap().unwrap();

	assert_eq!(tag.usage_count, 1);
}

#[tokio::test]
async fn decrement_below_zero_is_fatal() {
	let db = database(&POST).await;
	let tag = tags::find_or_create(&db, &POST, &TagScope::unscoped(), "color").await.unwrap();
	let result = tags::decrement_usage(&db, &POST, tag.id).await;

	assert!(matches!(result, Err(Error::CounterUnderflow(_))));
}

#[tokio::test]
async fn link_round_trip() {
	let db = database(&POST).await;
	let tag = tags::find_or_create(&db, &POST, &TagScope::unscoped(), "color").await.unwrap();
	let sync = [("deleted_at", None)];

	links::insert(&db, &POST, 1, tag.id, "red", &sync).await.unwrap();

	let link = links::find(&db, &POST, 1, tag.id).await.unwrap().unwrap();

	assert_eq!(link.value, "red");

	links::update_value(&db, &POST, 1, tag.id, "blue", &sync).await.unwrap();

	let values = links::tagged_values(&db, &POST, 1).await.unwrap();

	assert_eq!(values.len(), 1);
	assert_eq!(values[0].name, "color");
	assert_eq!(values[0].value, "blue");

	assert!(links::delete(&db, &POST, 1, tag.id).await.unwrap());
	assert!(!links::delete(&db, &POST, 1, tag.id).await.unwrap());
}

#[tokio::test]
async fn soft_deleted_links_are_hidden_from_reads() {
	let db = database(&POST).await;
	let scope = TagScope::unscoped();
	let tag = tags::find_or_create(&db, &POST, &scope, "color").await.unwrap();
	let sync = [("deleted_at", None)];

	links::insert(&db, &POST, 1, tag.id, "red", &sync).await.unwrap();
	links::insert(&db, &POST, 2, tag.id, "blue", &sync).await.unwrap();
	links::sync_owner_columns(&db, &POST, 2, &[("deleted_at", Some("2026-01-01".to_string()))])
		.await
		.unwrap();

	assert!(links::tagged_values(&db, &POST, 2).await.unwrap().is_empty());
	// The raw rows survive for restoration.
	assert_eq!(links::for_owner(&db, &POST, 2).await.unwrap().len(), 1);

	let values = links::tagged_values_for_owners(&db, &POST, &[1, 2]).await.unwrap();

	assert_eq!(values.len(), 1);
	assert_eq!(values[0].owner_id, 1);
}

#[tokio::test]
async fn scoped_lookups_are_isolated() {
	let db = database(&TENANT).await;
	let scope_a = TagScope::of("acme");

	tags::find_or_create(&db, &TENANT, &scope_a, "env").await.unwrap();

	assert!(tags::find_by_name(&db, &TENANT, &scope_a, "env").await.unwrap().is_some());
	assert!(tags::find_by_name(&db, &TENANT, &TagScope::of("globex"), "env")
		.await
		.unwrap()
		.is_none());
	// Unscoped lookups see every scope.
	assert!(
		tags::find_by_name(&db, &TENANT, &TagScope::unscoped(), "env").await.unwrap().is_some()
	);
}

#[tokio::test]
async fn listings_are_ordered() {
	let db = database(&POST).await;
	let scope = TagScope::unscoped();
	let banana = tags::find_or_create(&db, &POST, &scope, "banana").await.unwrap();

	tags::find_or_create(&db, &POST, &scope, "apple").await.unwrap();
	tags::find_or_create(&db, &POST, &scope, "cherry").await.unwrap();
	tags::increment_usage(&db, &POST, banana.id).await.unwrap();

	let alpha = tags::list_alphabetical(&db, &POST, &scope, 10).await.unwrap();
	let names = alpha.iter().map(|tag| tag.name.as_str()).collect::<Vec<_>>();

	assert_eq!(names, ["apple", "banana", "cherry"]);

	let popular = tags::list_popular(&db, &POST, &scope, 1).await.unwrap();

	assert_eq!(popular[0].name, "banana");

	let recent = tags::list_recent(&db, &POST, &scope, 10).await.unwrap();

	assert_eq!(recent[0].name, "cherry");
}
