//! Filter compiler: turns a validated search and its scope into predicates.
//!
//! Each dimension is ANDed with the others. Within a dimension the accepted
//! values are ORed, and the "no value" sentinel adds an OR arm for rows with
//! nothing in that dimension. Unspecified dimensions add nothing.
//!
//! The stages run in a fixed order and are shared by the flat, count and
//! grouped paths, so all three always filter identically.

use tasklane_core::issue_fields::StateGroup;
use tasklane_core::issue_search::{IdFilter, IssueSearch, ScopeKind, SearchScope, ValueFilter};
use tasklane_core::search::TEXT_SEARCH_CONFIG;

use super::plan::{BindValue, IssueQuery, Relation, TextBinds, ASSIGNEES, LABELS, SPRINTS, WATCHERS};

type FilterStage = fn(&IssueSearch, &SearchScope, &mut IssueQuery);

const FILTER_STAGES: &[FilterStage] = &[
    scope,
    lifecycle,
    only_active,
    column_dimensions,
    relation_dimensions,
    workspace_slugs,
    priorities,
    caller_filters,
    text,
];

/// Run every filter stage against `query`.
pub fn apply_filters(search: &IssueSearch, scope: &SearchScope, query: &mut IssueQuery) {
    for stage in FILTER_STAGES {
        stage(search, scope, query);
    }
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

fn scope(_search: &IssueSearch, scope: &SearchScope, query: &mut IssueQuery) {
    match scope.kind {
        ScopeKind::Project {
            workspace_id,
            project_id,
        } => {
            let p = query.bind(BindValue::BigInt(project_id));
            query.push_predicate(format!("i.project_id = ${p}"));
            let w = query.bind(BindValue::BigInt(workspace_id));
            query.push_predicate(format!("i.workspace_id = ${w}"));
        }
        ScopeKind::Global => {
            let u = query.bind(BindValue::BigInt(scope.user_id));
            query.push_predicate(format!(
                "i.workspace_id IN (SELECT wm.workspace_id FROM workspace_members wm WHERE wm.member_id = ${u})"
            ));
            query.push_predicate(format!(
                "i.project_id IN (SELECT pm.project_id FROM project_members pm WHERE pm.member_id = ${u})"
            ));
        }
    }
}

fn lifecycle(search: &IssueSearch, _scope: &SearchScope, query: &mut IssueQuery) {
    if !search.draft {
        query.push_predicate("NOT i.is_draft");
    }
    if search.hide_sub_issues {
        query.push_predicate("i.parent_id IS NULL");
    }
    if search.only_pinned {
        query.push_predicate("i.pinned");
    }
}

fn only_active(search: &IssueSearch, _scope: &SearchScope, query: &mut IssueQuery) {
    if !search.only_active {
        return;
    }
    let groups = StateGroup::INACTIVE
        .iter()
        .map(|g| g.as_str().to_string())
        .collect();
    let g = query.bind(BindValue::TextArray(groups));
    query.push_predicate(format!(
        "NOT EXISTS (SELECT 1 FROM states s WHERE s.id = i.state_id AND s.group_name = ANY(${g}))"
    ));
}

fn column_dimensions(search: &IssueSearch, _scope: &SearchScope, query: &mut IssueQuery) {
    let f = &search.filters;
    id_column(query, "i.created_by_id", &f.author_ids);
    id_column(query, "i.workspace_id", &f.workspace_ids);
    id_column(query, "i.project_id", &f.project_ids);
    id_column(query, "i.state_id", &f.state_ids);
}

fn relation_dimensions(search: &IssueSearch, _scope: &SearchScope, query: &mut IssueQuery) {
    let f = &search.filters;
    id_relation(query, ASSIGNEES, &f.assignee_ids);
    id_relation(query, WATCHERS, &f.watcher_ids);
    id_relation(query, LABELS, &f.label_ids);
    id_relation(query, SPRINTS, &f.sprint_ids);
}

fn workspace_slugs(search: &IssueSearch, _scope: &SearchScope, query: &mut IssueQuery) {
    let slugs = &search.filters.workspace_slugs;
    value_column(query, slugs, "i.workspace_id", |n| {
        format!("i.workspace_id IN (SELECT w.id FROM workspaces w WHERE w.slug = ANY(${n}))")
    });
}

fn priorities(search: &IssueSearch, _scope: &SearchScope, query: &mut IssueQuery) {
    let filter = &search.filters.priorities;
    let names = ValueFilter {
        values: filter.values.iter().map(|p| p.as_str().to_string()).collect(),
        include_none: filter.include_none,
    };
    value_column(query, &names, "i.priority", |n| format!("i.priority = ANY(${n})"));
}

/// The "assigned to me", "watched by me" and "authored by me" toggles.
fn caller_filters(search: &IssueSearch, scope: &SearchScope, query: &mut IssueQuery) {
    let f = &search.filters;
    if f.assigned_to_me {
        let u = query.bind(BindValue::BigInt(scope.user_id));
        query.push_predicate(ASSIGNEES.matches_one(u));
    }
    if f.watched_by_me {
        let u = query.bind(BindValue::BigInt(scope.user_id));
        query.push_predicate(WATCHERS.matches_one(u));
    }
    if f.authored_by_me {
        let u = query.bind(BindValue::BigInt(scope.user_id));
        query.push_predicate(format!("i.created_by_id = ${u}"));
    }
}

/// Text match over the token column, or a direct `IDENT-123` hit.
fn text(search: &IssueSearch, _scope: &SearchScope, query: &mut IssueQuery) {
    let Some(text) = &search.text else {
        return;
    };
    if text.is_unmatchable() {
        query.push_predicate("FALSE");
        return;
    }

    let mut binds = TextBinds::default();
    let mut arms = Vec::new();

    if let Some(tsquery) = &text.tsquery {
        let q = query.bind(BindValue::Text(tsquery.clone()));
        arms.push(format!(
            "i.tokens @@ to_tsquery('{TEXT_SEARCH_CONFIG}', ${q})"
        ));
        binds.tsquery = Some(q);
    }

    if !text.refs.is_empty() {
        let idents = text.refs.iter().map(|r| r.identifier.clone()).collect();
        let seqs = text.refs.iter().map(|r| r.sequence_id).collect();
        let a = query.bind(BindValue::TextArray(idents));
        let b = query.bind(BindValue::IntArray(seqs));
        arms.push(issue_ref_match(a, b));
        binds.refs = Some((a, b));
    }

    query.text = binds;
    query.push_any(arms);
}

/// Issue is addressed by one of the `(identifier, sequence_id)` pairs.
pub(crate) fn issue_ref_match(idents: usize, seqs: usize) -> String {
    format!(
        "EXISTS (SELECT 1 FROM unnest(${idents}::text[], ${seqs}::int[]) AS r(identifier, sequence_id) \
         WHERE r.identifier = upper(p.identifier) AND r.sequence_id = i.sequence_id)"
    )
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn id_column(query: &mut IssueQuery, column: &str, filter: &IdFilter) {
    value_column(query, filter, column, |n| format!("{column} = ANY(${n})"));
}

/// Column-backed dimension: `matches(values) OR column IS NULL`.
fn value_column<T, F>(query: &mut IssueQuery, filter: &ValueFilter<T>, null_column: &str, matches: F)
where
    T: Clone,
    Vec<T>: IntoBind,
    F: Fn(usize) -> String,
{
    if filter.is_unconstrained() {
        return;
    }
    let mut arms = Vec::new();
    if !filter.values.is_empty() {
        let n = query.bind(filter.values.clone().into_bind());
        arms.push(matches(n));
    }
    if filter.include_none {
        arms.push(format!("{null_column} IS NULL"));
    }
    query.push_any(arms);
}

/// Join-table dimension: `has matching row OR has no row at all`.
fn id_relation(query: &mut IssueQuery, relation: Relation, filter: &IdFilter) {
    if filter.is_unconstrained() {
        return;
    }
    let mut arms = Vec::new();
    if !filter.values.is_empty() {
        let n = query.bind(BindValue::BigIntArray(filter.values.clone()));
        arms.push(relation.matches_any(n));
    }
    if filter.include_none {
        arms.push(relation.absent());
    }
    query.push_any(arms);
}

/// Array filter values that can be bound directly.
trait IntoBind {
    fn into_bind(self) -> BindValue;
}

impl IntoBind for Vec<i64> {
    fn into_bind(self) -> BindValue {
        BindValue::BigIntArray(self)
    }
}

impl IntoBind for Vec<String> {
    fn into_bind(self) -> BindValue {
        BindValue::TextArray(self)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use tasklane_core::issue_search::{IdFilter, PriorityFilter, SearchParams};
    use tasklane_core::issue_fields::Priority;

    use super::*;

    fn compile(params: SearchParams, scope: SearchScope) -> IssueQuery {
        let search = params.validate().unwrap();
        let mut query = IssueQuery::new();
        apply_filters(&search, &scope, &mut query);
        query
    }

    fn project_scope() -> SearchScope {
        SearchScope::project(1, 10, 100)
    }

    #[test]
    fn defaults_restrict_scope_and_drafts_only() {
        let q = compile(SearchParams::default(), project_scope());
        assert_eq!(
            q.predicates(),
            [
                "i.deleted_at IS NULL",
                "i.project_id = $1",
                "i.workspace_id = $2",
                "NOT i.is_draft",
            ]
        );
    }

    #[test]
    fn draft_flag_lifts_draft_exclusion() {
        let mut params = SearchParams::default();
        params.draft = true;
        let q = compile(params, project_scope());
        assert!(!q.predicates().iter().any(|p| p.contains("is_draft")));
    }

    #[test]
    fn global_scope_uses_both_memberships() {
        let q = compile(SearchParams::default(), SearchScope::global(9));
        let where_clause = q.where_clause();
        assert!(where_clause.contains("FROM workspace_members wm WHERE wm.member_id = $1"));
        assert!(where_clause.contains("FROM project_members pm WHERE pm.member_id = $1"));
    }

    #[test]
    fn sentinel_on_relation_is_ored_with_absence() {
        let mut params = SearchParams::default();
        params.filters.assignee_ids = IdFilter::of([5]).or_none();
        let q = compile(params, project_scope());
        let last = q.predicates().last().unwrap();
        assert_eq!(
            last,
            "(EXISTS (SELECT 1 FROM issue_assignees r WHERE r.issue_id = i.id AND r.assignee_id = ANY($3)) \
             OR NOT EXISTS (SELECT 1 FROM issue_assignees r WHERE r.issue_id = i.id))"
        );
    }

    #[test]
    fn sentinel_only_matches_missing_values() {
        let mut params = SearchParams::default();
        params.filters.state_ids = IdFilter::default().or_none();
        let q = compile(params, project_scope());
        assert_eq!(q.predicates().last().unwrap(), "i.state_id IS NULL");
    }

    #[test]
    fn each_dimension_is_its_own_conjunct() {
        let mut params = SearchParams::default();
        params.filters.label_ids = IdFilter::of([1, 2]);
        params.filters.state_ids = IdFilter::of([3]);
        let q = compile(params, project_scope());
        // scope (2) + draft + state + labels
        assert_eq!(q.predicates().len(), 6);
        assert!(q.predicates().contains(&"i.state_id = ANY($3)".to_string()));
    }

    #[test]
    fn priorities_bind_names() {
        let mut params = SearchParams::default();
        params.filters.priorities = PriorityFilter::of([Priority::Urgent]).or_none();
        let search = params.validate().unwrap();
        let mut q = IssueQuery::new();
        apply_filters(&search, &project_scope(), &mut q);
        assert_eq!(
            q.predicates().last().unwrap(),
            "(i.priority = ANY($3) OR i.priority IS NULL)"
        );
        let (_, binds) = q.build_count_sql();
        assert_eq!(binds[2], BindValue::TextArray(vec!["urgent".into()]));
    }

    #[test]
    fn only_active_excludes_closed_groups() {
        let mut params = SearchParams::default();
        params.only_active = true;
        let q = compile(params, project_scope());
        let (_, binds) = q.build_count_sql();
        assert!(q.where_clause().contains("s.group_name = ANY($3)"));
        assert_eq!(
            binds[2],
            BindValue::TextArray(vec!["cancelled".into(), "completed".into()])
        );
    }

    #[test]
    fn hide_sub_issues_and_pinned() {
        let mut params = SearchParams::default();
        params.hide_sub_issues = true;
        params.only_pinned = true;
        let q = compile(params, project_scope());
        assert!(q.predicates().contains(&"i.parent_id IS NULL".to_string()));
        assert!(q.predicates().contains(&"i.pinned".to_string()));
    }

    #[test]
    fn caller_filters_bind_the_caller() {
        let mut params = SearchParams::default();
        params.filters.authored_by_me = true;
        let q = compile(params, SearchScope::project(42, 10, 100));
        let (_, binds) = q.build_count_sql();
        assert_eq!(q.predicates().last().unwrap(), "i.created_by_id = $3");
        assert_eq!(binds[2], BindValue::BigInt(42));
    }

    #[test]
    fn text_query_uses_token_column_and_refs() {
        let mut params = SearchParams::default();
        params.filters.search_query = "PROJ-42 fix".into();
        let q = compile(params, project_scope());
        let last = q.predicates().last().unwrap();
        assert!(last.starts_with("(i.tokens @@ to_tsquery('english', $3) OR EXISTS"));
        assert_eq!(q.text.tsquery, Some(3));
        assert_eq!(q.text.refs, Some((4, 5)));
    }

    #[test]
    fn punctuation_only_text_matches_nothing() {
        let mut params = SearchParams::default();
        params.filters.search_query = "?!".into();
        let q = compile(params, project_scope());
        assert_eq!(q.predicates().last().unwrap(), "FALSE");
    }
}
