use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Reference to a tag, by persisted id or by exact name.
///
/// This is the closed form every polymorphic caller input is normalized into
/// before any planning happens; internal logic never sees raw input.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum TagRef {
	Id(i64),
	Name(String),
}
impl From<i64> for TagRef {
	fn from(id: i64) -> Self {
		Self::Id(id)
	}
}
impl From<&str> for TagRef {
	fn from(name: &str) -> Self {
		Self::Name(name.to_string())
	}
}
impl From<String> for TagRef {
	fn from(name: String) -> Self {
		Self::Name(name)
	}
}

/// Whitelisted comparison operators for value predicates.
///
/// Everything else is rejected before any SQL is rendered; only the
/// enum-mapped operator text is ever interpolated into a predicate.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cmp {
	Eq,
	Ne,
	Lt,
	Le,
	Gt,
	Ge,
	Like,
}
impl Cmp {
	pub fn parse(op: &str) -> Result<Self> {
		match op.trim() {
			"=" => Ok(Self::Eq),
			"!=" => Ok(Self::Ne),
			"<" => Ok(Self::Lt),
			"<=" => Ok(Self::Le),
			">" => Ok(Self::Gt),
			">=" => Ok(Self::Ge),
			op if op.eq_ignore_ascii_case("like") => Ok(Self::Like),
			op => Err(Error::InvalidOperator(op.to_string())),
		}
	}

	pub const fn as_sql(self) -> &'static str {
		match self {
			Self::Eq => "=",
			Self::Ne => "!=",
			Self::Lt => "<",
			Self::Le => "<=",
			Self::Gt => ">",
			Self::Ge => ">=",
			Self::Like => "LIKE",
		}
	}
}

/// One match condition: a tag reference plus an optional value comparison.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FilterCriterion {
	pub tag: TagRef,
	pub cmp: Option<(Cmp, String)>,
}
impl FilterCriterion {
	pub fn of(tag: impl Into<TagRef>) -> Self {
		Self { tag: tag.into(), cmp: None }
	}

	pub fn compare(tag: impl Into<TagRef>, cmp: Cmp, value: impl Into<String>) -> Self {
		Self { tag: tag.into(), cmp: Some((cmp, value.into())) }
	}
}

/// An OR-set of criteria; groups passed together are AND-ed.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FilterGroup {
	pub criteria: Vec<FilterCriterion>,
}
impl FilterGroup {
	pub fn single(criterion: FilterCriterion) -> Self {
		Self { criteria: vec![criterion] }
	}

	pub fn any(criteria: Vec<FilterCriterion>) -> Self {
		Self { criteria }
	}
}
