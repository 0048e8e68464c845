#![allow(dead_code)]

use taglink_domain::OwnerSchema;
use taglink_service::{TagService, TaggedEntity};
use taglink_testkit::fixtures;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Post {
	pub id: i64,
	pub title: String,
	pub deleted_at: Option<String>,
}
impl TaggedEntity for Post {
	fn schema() -> &'static OwnerSchema {
		&fixtures::POST
	}

	fn key(&self) -> i64 {
		self.id
	}

	fn sync_values(&self) -> Vec<(&'static str, Option<String>)> {
		vec![("deleted_at", self.deleted_at.clone())]
	}
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct User {
	pub id: i64,
	pub name: String,
}
impl TaggedEntity for User {
	fn schema() -> &'static OwnerSchema {
		&fixtures::USER
	}

	fn key(&self) -> i64 {
		self.id
	}
}

pub async fn post_service() -> TagService {
	taglink_testkit::init_tracing();

	let db = taglink_testkit::tag_db(&fixtures::POST).await.unwrap();

	fixtures::create_post_table(&db).await.unwrap();

	TagService::new(db)
}

pub async fn new_post(service: &TagService, title: &str) -> Post {
	let id = fixtures::insert_post(service.db(), title).await.unwrap();

	Post { id, title: title.to_string(), deleted_at: None }
}

pub async fn user_service() -> TagService {
	taglink_testkit::init_tracing();

	let db = taglink_testkit::tag_db(&fixtures::USER).await.unwrap();

	fixtures::create_user_table(&db).await.unwrap();

	TagService::new(db)
}

pub async fn new_user(service: &TagService, name: &str) -> User {
	let id = fixtures::insert_user(service.db(), name).await.unwrap();

	User { id, name: name.to_string() }
}
