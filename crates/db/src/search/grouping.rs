//! Grouping engine pieces: bucket discovery SQL, per-bucket restriction and
//! the sink buckets are emitted through.
//!
//! Discovery aggregates the filtered relation by the group key and returns
//! buckets in a fixed order, with the "no value" bucket last. Each bucket is
//! then answered by the same page plan plus one restricting predicate.

use async_trait::async_trait;
use tasklane_core::issue_fields::GroupBy;

use super::plan::{
    display_name_expr, priority_rank_expr, state_ordinal_expr, BindValue, IssueQuery, Relation,
    ASSIGNEES, LABELS, SPRINTS, WATCHERS,
};
use crate::models::issue::GroupBucketRow;
use crate::models::issue_view::{GroupKey, IssueGroup};

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

const BUCKET_COUNT: &str = "COUNT(DISTINCT i.id) AS bucket_count";

/// SQL listing the buckets of `plan` for `group_by`, in emission order.
pub fn build_discovery_sql(plan: &IssueQuery, group_by: GroupBy) -> (String, Vec<BindValue>) {
    match group_by {
        GroupBy::Priority => plan.build_grouped_sql(
            &format!(
                "NULL::bigint AS group_id, i.priority AS group_value, i.priority AS group_label, {BUCKET_COUNT}"
            ),
            "",
            &format!(
                "GROUP BY i.priority ORDER BY {} DESC",
                priority_rank_expr("i.priority")
            ),
        ),
        GroupBy::Author => plan.build_grouped_sql(
            &user_bucket_select(),
            "LEFT JOIN users g ON g.id = i.created_by_id",
            USER_BUCKET_TAIL,
        ),
        GroupBy::State => plan.build_grouped_sql(
            &format!("g.id AS group_id, NULL::text AS group_value, g.name AS group_label, {BUCKET_COUNT}"),
            "LEFT JOIN states g ON g.id = i.state_id",
            &format!(
                "GROUP BY g.id, g.name, g.group_name, g.sequence \
                 ORDER BY g.id IS NULL, {}, g.sequence, g.name, g.id",
                state_ordinal_expr("g.group_name")
            ),
        ),
        GroupBy::Assignees => plan.build_grouped_sql(
            &user_bucket_select(),
            &relation_join(ASSIGNEES, "users"),
            USER_BUCKET_TAIL,
        ),
        GroupBy::Watchers => plan.build_grouped_sql(
            &user_bucket_select(),
            &relation_join(WATCHERS, "users"),
            USER_BUCKET_TAIL,
        ),
        GroupBy::Labels => plan.build_grouped_sql(
            NAMED_BUCKET_SELECT,
            &relation_join(LABELS, "labels"),
            NAMED_BUCKET_TAIL,
        ),
        GroupBy::Sprints => plan.build_grouped_sql(
            NAMED_BUCKET_SELECT,
            &relation_join(SPRINTS, "sprints"),
            NAMED_BUCKET_TAIL,
        ),
    }
}

const USER_BUCKET_TAIL: &str =
    "GROUP BY g.id, g.last_name, g.email ORDER BY g.id IS NULL, group_label, g.id";

const NAMED_BUCKET_SELECT: &str =
    "g.id AS group_id, NULL::text AS group_value, g.name AS group_label, COUNT(DISTINCT i.id) AS bucket_count";

const NAMED_BUCKET_TAIL: &str = "GROUP BY g.id, g.name ORDER BY g.id IS NULL, g.name, g.id";

fn user_bucket_select() -> String {
    format!(
        "g.id AS group_id, NULL::text AS group_value, {} AS group_label, {BUCKET_COUNT}",
        display_name_expr("g")
    )
}

fn relation_join(relation: Relation, target: &str) -> String {
    format!(
        "LEFT JOIN {} gr ON gr.issue_id = i.id LEFT JOIN {target} g ON g.id = gr.{}",
        relation.table, relation.column
    )
}

// ---------------------------------------------------------------------------
// Buckets
// ---------------------------------------------------------------------------

/// Key of a discovered bucket.
pub fn group_key(row: &GroupBucketRow) -> GroupKey {
    match (row.group_id, &row.group_value) {
        (Some(id), _) => GroupKey::Id(id),
        (None, Some(value)) => GroupKey::Value(value.clone()),
        (None, None) => GroupKey::None,
    }
}

/// Narrow `query` to the issues in bucket `key`.
pub fn restrict_to_bucket(query: &mut IssueQuery, group_by: GroupBy, key: &GroupKey) {
    if let Some(relation) = bucket_relation(group_by) {
        let predicate = match key {
            GroupKey::Id(id) => relation.matches_one(query.bind(BindValue::BigInt(*id))),
            GroupKey::Value(_) | GroupKey::None => relation.absent(),
        };
        query.push_predicate(predicate);
        return;
    }

    let column = match group_by {
        GroupBy::Priority => "i.priority",
        GroupBy::Author => "i.created_by_id",
        _ => "i.state_id",
    };
    let predicate = match key {
        GroupKey::Id(id) => format!("{column} = ${}", query.bind(BindValue::BigInt(*id))),
        GroupKey::Value(value) => format!("{column} = ${}", query.bind(BindValue::Text(value.clone()))),
        GroupKey::None => format!("{column} IS NULL"),
    };
    query.push_predicate(predicate);
}

fn bucket_relation(group_by: GroupBy) -> Option<Relation> {
    match group_by {
        GroupBy::Assignees => Some(ASSIGNEES),
        GroupBy::Watchers => Some(WATCHERS),
        GroupBy::Labels => Some(LABELS),
        GroupBy::Sprints => Some(SPRINTS),
        GroupBy::Priority | GroupBy::Author | GroupBy::State => None,
    }
}

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Error returned by a [`GroupSink`]; aborts the remaining buckets.
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// Receives grouped buckets one at a time, in discovery order.
#[async_trait]
pub trait GroupSink: Send {
    async fn emit(&mut self, group: IssueGroup) -> Result<(), SinkError>;
}

/// Sink that keeps every bucket in memory.
#[derive(Debug, Default)]
pub struct CollectSink {
    groups: Vec<IssueGroup>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_groups(self) -> Vec<IssueGroup> {
        self.groups
    }
}

#[async_trait]
impl GroupSink for CollectSink {
    async fn emit(&mut self, group: IssueGroup) -> Result<(), SinkError> {
        self.groups.push(group);
        Ok(())
    }
}
