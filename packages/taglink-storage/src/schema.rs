use taglink_domain::OwnerSchema;

/// Render the DDL for one owner type's tag and link tables.
///
/// Statements are `;`-separated and idempotent so bootstrap can run on every
/// startup.
pub fn render_schema(owner: &OwnerSchema) -> String {
	format!("{}{}", render_tag_table(owner), render_link_table(owner))
}

fn render_tag_table(owner: &OwnerSchema) -> String {
	let table = owner.tag_table;
	let scope_column = owner
		.tag_scope_column
		.map(|column| format!("\n\t{column} TEXT,"))
		.unwrap_or_default();

	// The composite indexes back the newest / recently-updated /
	// alphabetical / most-used listing access patterns.
	format!(
		"\
CREATE TABLE IF NOT EXISTS {table} (
	id INTEGER PRIMARY KEY AUTOINCREMENT,
	name TEXT NOT NULL,{scope_column}
	usage_count INTEGER NOT NULL DEFAULT 0,
	created_at TEXT NOT NULL,
	updated_at TEXT NOT NULL,
	deleted_at TEXT
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_name_{table} ON {table} (name);
CREATE INDEX IF NOT EXISTS newest_{table} ON {table} (created_at, deleted_at, usage_count);
CREATE INDEX IF NOT EXISTS updated_{table} ON {table} (updated_at, deleted_at, usage_count, created_at);
CREATE INDEX IF NOT EXISTS alpha_{table} ON {table} (name, deleted_at, usage_count, created_at);
CREATE INDEX IF NOT EXISTS popular_{table} ON {table} (usage_count, deleted_at, created_at);
"
	)
}

fn render_link_table(owner: &OwnerSchema) -> String {
	let table = owner.link_table;
	let sync_columns = owner
		.sync_columns
		.iter()
		.map(|column| format!("\n\t{column} TEXT,"))
		.collect::<String>();

	format!(
		"\
CREATE TABLE IF NOT EXISTS {table} (
	id INTEGER PRIMARY KEY AUTOINCREMENT,
	owner_id INTEGER NOT NULL,
	tag_id INTEGER NOT NULL,
	value TEXT NOT NULL,{sync_columns}
	tag_created_at TEXT NOT NULL,
	tag_updated_at TEXT NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS owner_tag_{table} ON {table} (owner_id, tag_id);
CREATE INDEX IF NOT EXISTS tag_value_{table} ON {table} (tag_id, value, owner_id);
"
	)
}
