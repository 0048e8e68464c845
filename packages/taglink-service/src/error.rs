#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Domain(#[from] taglink_domain::Error),
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error(transparent)]
	Storage(#[from] taglink_storage::Error),

	#[error("invalid request; {0}")]
	InvalidRequest(String),
}
