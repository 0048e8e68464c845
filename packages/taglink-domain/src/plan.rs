use crate::{Cmp, OwnerSchema};

/// Added to a group's cost when it keeps more than one criterion, so OR
/// groups are never picked as the anchor ahead of a single-criterion group.
pub const OR_GROUP_PENALTY: i64 = 100_000_000;

/// A criterion whose tag reference has been resolved against the registry,
/// carrying the tag's live usage counter for selectivity ranking.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedCriterion {
	pub tag_id: i64,
	pub usage_count: i64,
	pub cmp: Option<(Cmp, String)>,
}

/// A resolved, non-empty filter group inside a compiled plan.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlanGroup {
	pub criteria: Vec<ResolvedCriterion>,
}
impl PlanGroup {
	pub fn is_or(&self) -> bool {
		self.criteria.len() > 1
	}
}

/// Parameter bound into a rendered statement, in placeholder order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Bind {
	Id(i64),
	Text(String),
}

/// A rendered statement plus its ordered bind list.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SelectSql {
	pub sql: String,
	pub binds: Vec<Bind>,
}

/// Compiled filter plan: one anchor group applied as base-relation
/// predicates, plus one self-join of the link table per remaining group.
///
/// Built once from resolved groups and never mutated afterwards.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QueryPlan {
	pub anchor: PlanGroup,
	pub joins: Vec<PlanGroup>,
	pub distinct: bool,
	link_table: &'static str,
	base_deleted_column: Option<&'static str>,
}

/// Rank resolved groups by selectivity and compile them into a plan.
///
/// Cost of a group is the maximum usage counter among its members (an OR
/// group must cover the union, so its most common member is the pessimistic
/// proxy), plus [`OR_GROUP_PENALTY`] for multi-criterion groups. The sort is
/// stable, so plans are reproducible for a fixed input.
///
/// Returns `None` when there are no groups or any group resolved to empty:
/// an AND over an unsatisfiable group can never match, so the whole query
/// short-circuits to an empty result without touching the link table.
pub fn build_plan(
	schema: &OwnerSchema,
	groups: Vec<Vec<ResolvedCriterion>>,
) -> Option<QueryPlan> {
	if groups.is_empty() {
		return None;
	}

	let mut costed = Vec::with_capacity(groups.len());

	for criteria in groups {
		if criteria.is_empty() {
			return None;
		}

		let mut cost = criteria.iter().map(|criterion| criterion.usage_count).max().unwrap_or(0);

		if criteria.len() > 1 {
			cost += OR_GROUP_PENALTY;
		}

		costed.push((cost, PlanGroup { criteria }));
	}

	costed.sort_by_key(|(cost, _)| *cost);

	let mut groups = costed.into_iter().map(|(_, group)| group);
	let anchor = groups.next()?;
	let joins = groups.collect::<Vec<_>>();
	let distinct = anchor.is_or() || joins.iter().any(PlanGroup::is_or);

	Some(QueryPlan {
		anchor,
		joins,
		distinct,
		link_table: schema.link_table,
		base_deleted_column: if schema.links_soft_delete() {
			schema.deleted_at_column
		} else {
			None
		},
	})
}

impl QueryPlan {
	/// Render the owner-id fetch. Deduplication is rendered as
	/// `GROUP BY m.owner_id` ordered by first link occurrence; the
	/// non-distinct path orders by link id. Both are deterministic.
	pub fn render_ids(&self, limit: Option<i64>, offset: Option<i64>) -> SelectSql {
		let mut select = self.render("SELECT m.owner_id");

		if self.distinct {
			select.sql.push_str("\nGROUP BY m.owner_id\nORDER BY MIN(m.id)");
		} else {
			select.sql.push_str("\nORDER BY m.id");
		}
		if let Some(limit) = limit {
			select.sql.push_str("\nLIMIT ?");
			select.binds.push(Bind::Id(limit));

			if let Some(offset) = offset {
				select.sql.push_str(" OFFSET ?");
				select.binds.push(Bind::Id(offset));
			}
		}

		select
	}

	/// Render the count variant of the same plan.
	pub fn render_count(&self) -> SelectSql {
		if self.distinct {
			self.render("SELECT COUNT(DISTINCT m.owner_id)")
		} else {
			self.render("SELECT COUNT(*)")
		}
	}

	fn render(&self, head: &str) -> SelectSql {
		let mut sql = format!("{head}\nFROM {} AS m", self.link_table);
		let mut binds = Vec::new();

		// Single-criterion join groups carry their predicates in the ON
		// clause: the joined side is restricted to one tag id, so each owner
		// matches at most one row and no dedup is needed for them. OR groups
		// must not widen the ON clause (an inclusive OR join condition
		// multiplies matches); they join on owner equality alone and filter
		// post-join below.
		for (i, group) in self.joins.iter().enumerate() {
			sql.push_str(&format!(
				"\nJOIN {} AS m{i} ON m.owner_id = m{i}.owner_id",
				self.link_table,
			));

			if let [criterion] = group.criteria.as_slice() {
				sql.push_str(&format!(" AND m{i}.tag_id = ?"));
				binds.push(Bind::Id(criterion.tag_id));

				if let Some((cmp, value)) = &criterion.cmp {
					sql.push_str(&format!(" AND m{i}.value {} ?", cmp.as_sql()));
					binds.push(Bind::Text(value.clone()));
				}
			}
		}

		let mut predicates = Vec::new();

		if let Some(column) = self.base_deleted_column {
			predicates.push(format!("m.{column} IS NULL"));
		}
		if let [criterion] = self.anchor.criteria.as_slice() {
			predicates.push("m.tag_id = ?".to_string());
			binds.push(Bind::Id(criterion.tag_id));

			if let Some((cmp, value)) = &criterion.cmp {
				predicates.push(format!("m.value {} ?", cmp.as_sql()));
				binds.push(Bind::Text(value.clone()));
			}
		} else {
			predicates.push(or_block("m", &self.anchor.criteria, &mut binds));
		}
		for (i, group) in self.joins.iter().enumerate() {
			if group.is_or() {
				predicates.push(or_block(&format!("m{i}"), &group.criteria, &mut binds));
			}
		}

		sql.push_str("\nWHERE ");
		sql.push_str(&predicates.join(" AND "));

		SelectSql { sql, binds }
	}
}

fn or_block(alias: &str, criteria: &[ResolvedCriterion], binds: &mut Vec<Bind>) -> String {
	let alternatives = criteria
		.iter()
		.map(|criterion| {
			binds.push(Bind::Id(criterion.tag_id));

			if let Some((cmp, value)) = &criterion.cmp {
				binds.push(Bind::Text(value.clone()));

				format!("({alias}.tag_id = ? AND {alias}.value {} ?)", cmp.as_sql())
			} else {
				format!("{alias}.tag_id = ?")
			}
		})
		.collect::<Vec<_>>();

	format!("({})", alternatives.join(" OR "))
}
