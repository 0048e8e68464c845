use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub sqlite: Sqlite,
}

#[derive(Debug, Deserialize)]
pub struct Sqlite {
	pub path: String,
	pub pool_max_conns: u32,
}
