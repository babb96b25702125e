//! Full-text adapter: rank and highlight projections for text searches.
//!
//! Reads the placeholders bound by the filter compiler's text stage, so it
//! runs after the filters on the same plan.

use tasklane_core::issue_search::IssueSearch;
use tasklane_core::search::{
    DESCRIPTION_HEADLINE_OPTIONS, DESCRIPTION_HIGHLIGHT_CHARS, ISSUE_REF_RANK_BOOST,
    NAME_HEADLINE_OPTIONS, TEXT_SEARCH_CONFIG,
};

use super::filters::issue_ref_match;
use super::plan::IssueQuery;

/// Project `search_rank` and, unless `light_search`, highlighted fragments.
pub fn apply_text_projections(search: &IssueSearch, query: &mut IssueQuery) {
    if search.text.is_none() {
        return;
    }
    let binds = query.text;

    let mut rank_terms = Vec::new();
    if let Some(q) = binds.tsquery {
        rank_terms.push(format!(
            "COALESCE(ts_rank(i.tokens, to_tsquery('{TEXT_SEARCH_CONFIG}', ${q})), 0)"
        ));
    }
    if let Some((idents, seqs)) = binds.refs {
        rank_terms.push(format!(
            "CASE WHEN {} THEN {ISSUE_REF_RANK_BOOST:.1} ELSE 0 END",
            issue_ref_match(idents, seqs)
        ));
    }
    let rank = if rank_terms.is_empty() {
        "0".to_string()
    } else {
        rank_terms.join(" + ")
    };
    query.push_projection(format!("({rank})::real AS search_rank"));

    if search.light_search {
        return;
    }
    match binds.tsquery {
        Some(q) => {
            query.push_projection(format!(
                "ts_headline('{TEXT_SEARCH_CONFIG}', i.name, to_tsquery('{TEXT_SEARCH_CONFIG}', ${q}), '{NAME_HEADLINE_OPTIONS}') AS name_highlighted"
            ));
            query.push_projection(format!(
                "ts_headline('{TEXT_SEARCH_CONFIG}', left(i.description_stripped, {DESCRIPTION_HIGHLIGHT_CHARS}), \
                 to_tsquery('{TEXT_SEARCH_CONFIG}', ${q}), '{DESCRIPTION_HEADLINE_OPTIONS}') AS description_highlighted"
            ));
        }
        None => {
            query.push_projection("NULL::text AS name_highlighted");
            query.push_projection("NULL::text AS description_highlighted");
        }
    }
}

/// Project per-row aggregate counts (full view only).
pub fn apply_aggregates(search: &IssueSearch, query: &mut IssueQuery) {
    if search.light_search {
        return;
    }
    query.push_projection(
        "(SELECT COUNT(*) FROM issues c WHERE c.parent_id = i.id AND c.deleted_at IS NULL) AS sub_issues_count",
    );
    query.push_projection("(SELECT COUNT(*) FROM issue_links l WHERE l.issue_id = i.id) AS link_count");
    query.push_projection(
        "(SELECT COUNT(*) FROM issue_attachments a WHERE a.issue_id = i.id) AS attachment_count",
    );
    query.push_projection(
        "(SELECT COUNT(*) FROM linked_issues li WHERE li.issue_id1 = i.id OR li.issue_id2 = i.id) AS linked_issues_count",
    );
    query.push_projection(
        "(SELECT COUNT(*) FROM issue_comments cm WHERE cm.issue_id = i.id) AS comments_count",
    );
}
