//! The query plan shared by every issue search path.
//!
//! An [`IssueQuery`] collects ANDed predicates, extra projections, ordering
//! terms and positional bind values. Filter, sort and full-text stages push
//! into it; the renderers turn it into SQL plus the values to bind, in the
//! order their `$n` placeholders were handed out.

use tasklane_core::issue_fields::{Priority, StateGroup, ABSENT_PRIORITY_RANK};

/// A value bound to a `$n` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    BigInt(i64),
    BigIntArray(Vec<i64>),
    IntArray(Vec<i32>),
    Text(String),
    TextArray(Vec<String>),
}

/// Base relation every search reads from.
pub(crate) const FROM_CLAUSE: &str = "issues i JOIN projects p ON p.id = i.project_id";

/// Issue columns selected by page queries, matching `IssueRow`.
const ISSUE_COLUMNS: &str = "\
    i.id, i.workspace_id, i.project_id, i.sequence_id, i.name, i.priority, \
    i.state_id, i.created_by_id, i.parent_id, i.is_draft, i.pinned, \
    i.start_date, i.target_date, i.completed_at, i.created_at, i.updated_at";

/// Placeholders handed out for the text query, read by the full-text stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextBinds {
    /// `$n` holding the tsquery string.
    pub tsquery: Option<usize>,
    /// `$n` pair holding reference identifiers and sequence ids.
    pub refs: Option<(usize, usize)>,
}

#[derive(Debug, Clone)]
pub struct IssueQuery {
    predicates: Vec<String>,
    projections: Vec<String>,
    order_by: Vec<String>,
    binds: Vec<BindValue>,
    pub(crate) text: TextBinds,
}

impl Default for IssueQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl IssueQuery {
    /// A plan over live (not soft-deleted) issues.
    pub fn new() -> Self {
        Self {
            predicates: vec!["i.deleted_at IS NULL".to_string()],
            projections: Vec::new(),
            order_by: Vec::new(),
            binds: Vec::new(),
            text: TextBinds::default(),
        }
    }

    /// Register a bind value and return its 1-based placeholder index.
    pub fn bind(&mut self, value: BindValue) -> usize {
        self.binds.push(value);
        self.binds.len()
    }

    pub fn push_predicate(&mut self, predicate: impl Into<String>) {
        self.predicates.push(predicate.into());
    }

    /// Push the OR of `arms` as one predicate. No arms adds nothing.
    pub fn push_any(&mut self, arms: Vec<String>) {
        match arms.len() {
            0 => {}
            1 => self.predicates.extend(arms),
            _ => self.predicates.push(format!("({})", arms.join(" OR "))),
        }
    }

    pub fn push_projection(&mut self, projection: impl Into<String>) {
        self.projections.push(projection.into());
    }

    pub fn push_order(&mut self, term: impl Into<String>) {
        self.order_by.push(term.into());
    }

    pub fn predicates(&self) -> &[String] {
        &self.predicates
    }

    pub fn projections(&self) -> &[String] {
        &self.projections
    }

    pub fn order_terms(&self) -> &[String] {
        &self.order_by
    }

    pub fn where_clause(&self) -> String {
        self.predicates.join(" AND ")
    }

    // -----------------------------------------------------------------------
    // Renderers
    // -----------------------------------------------------------------------

    /// Number of matching rows.
    pub fn build_count_sql(&self) -> (String, Vec<BindValue>) {
        let sql = format!(
            "SELECT COUNT(*) FROM {FROM_CLAUSE} WHERE {}",
            self.where_clause()
        );
        (sql, self.binds.clone())
    }

    /// One ordered page with the unpaginated total in `all_count`.
    pub fn build_page_sql(&self, limit: i64, offset: i64) -> (String, Vec<BindValue>) {
        let mut binds = self.binds.clone();
        binds.push(BindValue::BigInt(limit));
        let limit_idx = binds.len();
        binds.push(BindValue::BigInt(offset));
        let offset_idx = binds.len();

        let mut select = format!("{ISSUE_COLUMNS}, COUNT(*) OVER() AS all_count");
        for projection in &self.projections {
            select.push_str(", ");
            select.push_str(projection);
        }

        let order = if self.order_by.is_empty() {
            "i.id ASC".to_string()
        } else {
            self.order_by.join(", ")
        };

        let sql = format!(
            "SELECT {select} FROM {FROM_CLAUSE} WHERE {} ORDER BY {order} LIMIT ${limit_idx} OFFSET ${offset_idx}",
            self.where_clause()
        );
        (sql, binds)
    }

    /// Aggregate over the filtered relation with extra joins, used by bucket
    /// discovery. `tail` carries `GROUP BY` / `ORDER BY`.
    pub fn build_grouped_sql(&self, select: &str, joins: &str, tail: &str) -> (String, Vec<BindValue>) {
        let sql = format!(
            "SELECT {select} FROM {FROM_CLAUSE} {joins} WHERE {} {tail}",
            self.where_clause()
        );
        (sql, self.binds.clone())
    }
}

/// Bind every value in order onto a `sqlx` query builder.
macro_rules! bind_values {
    ($query:expr, $binds:expr) => {{
        let mut query = $query;
        for value in $binds {
            query = match value {
                $crate::search::plan::BindValue::BigInt(v) => query.bind(v),
                $crate::search::plan::BindValue::BigIntArray(vs) => query.bind(vs),
                $crate::search::plan::BindValue::IntArray(vs) => query.bind(vs),
                $crate::search::plan::BindValue::Text(v) => query.bind(v),
                $crate::search::plan::BindValue::TextArray(vs) => query.bind(vs),
            };
        }
        query
    }};
}
pub(crate) use bind_values;

// ---------------------------------------------------------------------------
// Join tables
// ---------------------------------------------------------------------------

/// A many-to-many table hanging off `issues` by `issue_id`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Relation {
    pub table: &'static str,
    pub column: &'static str,
}

pub(crate) const ASSIGNEES: Relation = Relation {
    table: "issue_assignees",
    column: "assignee_id",
};

pub(crate) const WATCHERS: Relation = Relation {
    table: "issue_watchers",
    column: "watcher_id",
};

pub(crate) const LABELS: Relation = Relation {
    table: "issue_labels",
    column: "label_id",
};

pub(crate) const SPRINTS: Relation = Relation {
    table: "sprint_issues",
    column: "sprint_id",
};

impl Relation {
    /// Issue has a related row whose id is in the array at `$param`.
    pub fn matches_any(self, param: usize) -> String {
        format!(
            "EXISTS (SELECT 1 FROM {} r WHERE r.issue_id = i.id AND r.{} = ANY(${param}))",
            self.table, self.column
        )
    }

    /// Issue has a related row whose id equals `$param`.
    pub fn matches_one(self, param: usize) -> String {
        format!(
            "EXISTS (SELECT 1 FROM {} r WHERE r.issue_id = i.id AND r.{} = ${param})",
            self.table, self.column
        )
    }

    /// Issue has no related row at all.
    pub fn absent(self) -> String {
        format!(
            "NOT EXISTS (SELECT 1 FROM {} r WHERE r.issue_id = i.id)",
            self.table
        )
    }
}

// ---------------------------------------------------------------------------
// Shared expressions
// ---------------------------------------------------------------------------

/// Ladder rank of a priority column; `NULL` ranks lowest.
pub(crate) fn priority_rank_expr(column: &str) -> String {
    let arms: String = Priority::ALL
        .iter()
        .map(|p| format!(" WHEN '{}' THEN {}", p.as_str(), p.rank()))
        .collect();
    format!("CASE {column}{arms} ELSE {ABSENT_PRIORITY_RANK} END")
}

/// Workflow ordinal of a state group column.
pub(crate) fn state_ordinal_expr(column: &str) -> String {
    let arms: String = StateGroup::ALL
        .iter()
        .map(|g| format!(" WHEN '{}' THEN {}", g.as_str(), g.ordinal()))
        .collect();
    format!("CASE {column}{arms} ELSE 0 END")
}

/// Sortable user name: last name when set, otherwise email.
pub(crate) fn display_name_expr(alias: &str) -> String {
    format!("COALESCE(NULLIF({alias}.last_name, ''), {alias}.email)")
}
