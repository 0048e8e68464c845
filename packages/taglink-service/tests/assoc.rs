mod common;

use common::{new_post, post_service};
use taglink_domain::{TagRef, TagScope};
use taglink_service::Error;
use taglink_storage::{Error as StorageError, tags};
use taglink_testkit::fixtures::POST;

#[tokio::test]
async fn set_and_read_value() {
	let service = post_service().await;
	let post = new_post(&service, "intro").await;

	service.set_tag(&post, "color", Some("red")).await.unwrap();

	assert_eq!(service.tag_value(&post, "color").await.unwrap().as_deref(), Some("red"));
	assert!(service.has_tag(&post, "color").await.unwrap());
	assert_eq!(service.tags_for(&post).await.unwrap().len(), 1);
}

#[tokio::test]
async fn counter_tracks_links_not_writes() {
	let service = post_service().await;
	let first = new_post(&service, "first").await;
	let second = new_post(&service, "second").await;
	let usage = async |name: &str| {
		tags::find_by_name(service.db(), &POST, &TagScope::unscoped(), name)
			.await
			.unwrap()
			.unwrap()
			.usage_count
	};

	service.set_tag(&first, "color", Some("red")).await.unwrap();

	assert_eq!(usage("color").await, 1);

	// Updating in place is not a new link.
	service.set_tag(&first, "color", Some("blue")).await.unwrap();

	assert_eq!(usage("color").await, 1);
	assert_eq!(service.tag_value(&first, "color").await.unwrap().as_deref(), Some("blue"));

	service.set_tag(&second, "color", Some("green")).await.unwrap();

	assert_eq!(usage("color").await, 2);

	service.unset_tag(&first, "color").await.unwrap();

	assert_eq!(usage("color").await, 1);
}

#[tokio::test]
async fn null_write_registers_tag_without_link() {
	let service = post_service().await;
	let post = new_post(&service, "intro").await;

	service.set_tag(&post, "draft", None).await.unwrap();

	assert!(!service.has_tag(&post, "draft").await.unwrap());

	let tag = tags::find_by_name(service.db(), &POST, &TagScope::unscoped(), "draft")
		.await
		.unwrap()
		.unwrap();

	assert_eq!(tag.usage_count, 0);
}

#[tokio::test]
async fn null_write_removes_existing_link() {
	let service = post_service().await;
	let post = new_post(&service, "intro").await;

	service.set_tag(&post, "color", Some("red")).await.unwrap();
	service.set_tag(&post, "color", None).await.unwrap();

	assert!(!service.has_tag(&post, "color").await.unwrap());

	let tag = tags::find_by_name(service.db(), &POST, &TagScope::unscoped(), "color")
		.await
		.unwrap()
		.unwrap();

	assert_eq!(tag.usage_count, 0);
}

#[tokio::test]
async fn unknown_tag_id_is_ignored() {
	let service = post_service().await;
	let post = new_post(&service, "intro").await;

	service.set_tag(&post, 999_i64, Some("x")).await.unwrap();
	service.unset_tag(&post, 999_i64).await.unwrap();

	assert!(service.tags_for(&post).await.unwrap().is_empty());
}

#[tokio::test]
async fn batch_aborts_without_rolling_back() {
	let service = post_service().await;
	let post = new_post(&service, "intro").await;
	let result = service
		.set_tags(
			&post,
			vec![
				(TagRef::from("color"), Some("red".to_string())),
				(TagRef::from("   "), Some("x".to_string())),
				(TagRef::from("size"), Some("L".to_string())),
			],
		)
		.await;

	assert!(result.is_err());
	// The entry before the failure stays applied; the one after never ran.
	assert!(service.has_tag(&post, "color").await.unwrap());
	assert!(!service.has_tag(&post, "size").await.unwrap());
}

#[tokio::test]
async fn unset_all_detaches_and_decrements() {
	let service = post_service().await;
	let post = new_post(&service, "intro").await;

	service.set_tag(&post, "color", Some("red")).await.unwrap();
	service.set_tag(&post, "size", Some("L")).await.unwrap();
	service.unset_all(&post).await.unwrap();

	assert!(service.tags_for(&post).await.unwrap().is_empty());

	for name in ["color", "size"] {
		let tag = tags::find_by_name(service.db(), &POST, &TagScope::unscoped(), name)
			.await
			.unwrap()
			.unwrap();

		assert_eq!(tag.usage_count, 0);
	}
}

#[tokio::test]
async fn counter_underflow_is_surfaced() {
	let service = post_service().await;
	let post = new_post(&service, "intro").await;

	service.set_tag(&post, "color", Some("red")).await.unwrap();
	// Corrupt the counter to simulate an upstream accounting bug.
	sqlx::query("UPDATE tags SET usage_count = 0")
		.execute(&service.db().pool)
		.await
		.unwrap();

	let result = service.unset_tag(&post, "color").await;

	assert!(matches!(result, Err(Error::Storage(StorageError::CounterUnderflow(_)))));
}

#[tokio::test]
async fn tag_listings_through_service() {
	let service = post_service().await;
	let post = new_post(&service, "intro").await;
	let scope = TagScope::unscoped();

	service.set_tag(&post, "banana", Some("1")).await.unwrap();
	service.set_tag(&post, "apple", Some("1")).await.unwrap();

	let names = service
		.alphabetical_tags::<common::Post>(&scope, 10)
		.await
		.unwrap()
		.into_iter()
		.map(|tag| tag.name)
		.collect::<Vec<_>>();

	assert_eq!(names, ["apple", "banana"]);
	assert_eq!(service.popular_tags::<common::Post>(&scope, 10).await.unwrap().len(), 2);
	assert_eq!(service.recent_tags::<common::Post>(&scope, 1).await.unwrap().len(), 1);
}
