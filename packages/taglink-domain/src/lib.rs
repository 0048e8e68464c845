mod criteria;
mod error;
mod owner;
pub mod plan;

pub use criteria::{Cmp, FilterCriterion, FilterGroup, TagRef};
pub use error::{Error, Result};
pub use owner::{OwnerEvent, OwnerSchema, TagScope};
pub use plan::{Bind, OR_GROUP_PENALTY, PlanGroup, QueryPlan, ResolvedCriterion, SelectSql, build_plan};
