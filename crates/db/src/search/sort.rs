//! Sort resolver: maps a [`SortKey`] onto ORDER BY terms.
//!
//! Direct keys order by an issue column. Derived keys project a correlated
//! value under an alias and order by the alias. Every ordering ends with
//! `i.id` so pages never overlap.

use tasklane_core::issue_fields::SortKey;
use tasklane_core::issue_search::IssueSearch;

use super::plan::{display_name_expr, priority_rank_expr, state_ordinal_expr, IssueQuery};

/// Push the projections and ORDER BY terms for the search's sort key.
///
/// Must run after the full-text stage: `search_rank` orders by its alias.
pub fn apply_sort(search: &IssueSearch, query: &mut IssueQuery) {
    let dir = if search.desc { "DESC" } else { "ASC" };
    let sort = search.effective_sort();

    match sort {
        SortKey::SearchRank => query.push_order("search_rank DESC"),
        SortKey::Priority => {
            query.push_projection(format!("{} AS priority_rank", priority_rank_expr("i.priority")));
            query.push_order(format!("priority_rank {dir}"));
        }
        SortKey::Author => derived(query, author_sort(), "author_sort", dir),
        SortKey::State => derived(query, state_sort(), "state_sort", dir),
        SortKey::Labels => derived(query, labels_sort(), "labels_sort", dir),
        SortKey::Assignees => derived(query, user_list_sort("issue_assignees", "assignee_id"), "assignees_sort", dir),
        SortKey::Watchers => derived(query, user_list_sort("issue_watchers", "watcher_id"), "watchers_sort", dir),
        direct => {
            if let Some(column) = direct_column(direct) {
                query.push_order(format!("{column} {dir}"));
            }
        }
    }

    match sort {
        SortKey::Id => {}
        // Rank always sorts descending; equal ranks keep one fixed order.
        SortKey::SearchRank => query.push_order("i.id ASC"),
        _ => query.push_order(format!("i.id {dir}")),
    }
}

/// Issue column for keys that need no derived value.
fn direct_column(sort: SortKey) -> Option<&'static str> {
    let column = match sort {
        SortKey::Id => "i.id",
        SortKey::SequenceId => "i.sequence_id",
        SortKey::Name => "i.name",
        SortKey::CreatedAt => "i.created_at",
        SortKey::UpdatedAt => "i.updated_at",
        SortKey::StartDate => "i.start_date",
        SortKey::TargetDate => "i.target_date",
        SortKey::CompletedAt => "i.completed_at",
        _ => return None,
    };
    Some(column)
}

fn derived(query: &mut IssueQuery, expr: String, alias: &str, dir: &str) {
    query.push_projection(format!("({expr}) AS {alias}"));
    query.push_order(format!("{alias} {dir}"));
}

fn author_sort() -> String {
    format!(
        "SELECT {} FROM users u WHERE u.id = i.created_by_id",
        display_name_expr("u")
    )
}

/// Group ordinal, then name and color so equal groups still order stably.
fn state_sort() -> String {
    format!(
        "SELECT concat({}, '-', s.name, '-', s.color) FROM states s WHERE s.id = i.state_id",
        state_ordinal_expr("s.group_name")
    )
}

fn labels_sort() -> String {
    "SELECT string_agg(l.name, ', ' ORDER BY l.name) FROM issue_labels il \
     JOIN labels l ON l.id = il.label_id WHERE il.issue_id = i.id"
        .to_string()
}

fn user_list_sort(table: &str, column: &str) -> String {
    let name = display_name_expr("u");
    format!(
        "SELECT string_agg({name}, ', ' ORDER BY {name}) FROM {table} r \
         JOIN users u ON u.id = r.{column} WHERE r.issue_id = i.id"
    )
}
