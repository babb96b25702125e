//! Closed vocabularies for issue fields used by search: priorities, state
//! groups, sort keys and group keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

/// Issue priority. An issue without a priority stores `NULL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Urgent,
    High,
    Medium,
    Low,
}

/// Rank given to issues without a priority.
pub const ABSENT_PRIORITY_RANK: i32 = 1;

impl Priority {
    /// Every priority, most important first.
    pub const ALL: [Priority; 4] = [Self::Urgent, Self::High, Self::Medium, Self::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Position on the sort ladder: urgent=5, high=4, medium=3, low=2.
    pub fn rank(self) -> i32 {
        match self {
            Self::Urgent => 5,
            Self::High => 4,
            Self::Medium => 3,
            Self::Low => 2,
        }
    }

    /// Ladder rank for an optional priority; absent ranks lowest.
    pub fn rank_of(priority: Option<Priority>) -> i32 {
        priority.map_or(ABSENT_PRIORITY_RANK, Priority::rank)
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "urgent" => Ok(Self::Urgent),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(format!("unknown priority '{other}'")),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// State groups
// ---------------------------------------------------------------------------

/// The workflow group a project state belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateGroup {
    Backlog,
    Unstarted,
    Started,
    Completed,
    Cancelled,
}

impl StateGroup {
    /// Groups in workflow order.
    pub const ALL: [StateGroup; 5] = [
        Self::Backlog,
        Self::Unstarted,
        Self::Started,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Groups excluded by the "only active" filter.
    pub const INACTIVE: [StateGroup; 2] = [Self::Cancelled, Self::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::Unstarted => "unstarted",
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Ordinal used when sorting or grouping by state.
    pub fn ordinal(self) -> i32 {
        match self {
            Self::Backlog => 1,
            Self::Unstarted => 2,
            Self::Started => 3,
            Self::Completed => 4,
            Self::Cancelled => 5,
        }
    }
}

// ---------------------------------------------------------------------------
// Sort keys
// ---------------------------------------------------------------------------

/// Supported `order_by` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Id,
    SequenceId,
    Name,
    CreatedAt,
    UpdatedAt,
    StartDate,
    TargetDate,
    CompletedAt,
    Priority,
    Author,
    State,
    Labels,
    Assignees,
    Watchers,
    SearchRank,
}

impl SortKey {
    pub const DEFAULT: SortKey = SortKey::SequenceId;

    /// Parse an `order_by` value. A legacy leading `-`/`+` is stripped and
    /// does not affect direction; blank input selects [`SortKey::DEFAULT`].
    pub fn parse(raw: &str) -> Option<Self> {
        let key = raw.trim().trim_start_matches(['-', '+']);
        let parsed = match key {
            "" => Self::DEFAULT,
            "id" => Self::Id,
            "sequence_id" => Self::SequenceId,
            "name" => Self::Name,
            "created_at" => Self::CreatedAt,
            "updated_at" => Self::UpdatedAt,
            "start_date" => Self::StartDate,
            "target_date" => Self::TargetDate,
            "completed_at" => Self::CompletedAt,
            "priority" => Self::Priority,
            "author" => Self::Author,
            "state" => Self::State,
            "labels" => Self::Labels,
            "assignees" => Self::Assignees,
            "watchers" => Self::Watchers,
            "search_rank" => Self::SearchRank,
            _ => return None,
        };
        Some(parsed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::SequenceId => "sequence_id",
            Self::Name => "name",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::StartDate => "start_date",
            Self::TargetDate => "target_date",
            Self::CompletedAt => "completed_at",
            Self::Priority => "priority",
            Self::Author => "author",
            Self::State => "state",
            Self::Labels => "labels",
            Self::Assignees => "assignees",
            Self::Watchers => "watchers",
            Self::SearchRank => "search_rank",
        }
    }
}

// ---------------------------------------------------------------------------
// Group keys
// ---------------------------------------------------------------------------

/// Supported `group_by` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    Priority,
    Author,
    State,
    Labels,
    Assignees,
    Watchers,
    Sprints,
}

impl GroupBy {
    pub const ALL: [GroupBy; 7] = [
        Self::Priority,
        Self::Author,
        Self::State,
        Self::Labels,
        Self::Assignees,
        Self::Watchers,
        Self::Sprints,
    ];

    /// Parse a non-blank `group_by` value.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "priority" => Some(Self::Priority),
            "author" => Some(Self::Author),
            "state" => Some(Self::State),
            "labels" => Some(Self::Labels),
            "assignees" => Some(Self::Assignees),
            "watchers" => Some(Self::Watchers),
            "sprints" => Some(Self::Sprints),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Priority => "priority",
            Self::Author => "author",
            Self::State => "state",
            Self::Labels => "labels",
            Self::Assignees => "assignees",
            Self::Watchers => "watchers",
            Self::Sprints => "sprints",
        }
    }

    /// `true` when an issue belongs to exactly one bucket.
    ///
    /// Bucket counts of a single-valued grouping sum to the ungrouped total.
    pub fn is_single_valued(self) -> bool {
        matches!(self, Self::Priority | Self::Author | Self::State)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_ladder_is_strictly_descending() {
        let ranks: Vec<i32> = Priority::ALL.iter().map(|p| p.rank()).collect();
        assert_eq!(ranks, vec![5, 4, 3, 2]);
        assert_eq!(Priority::rank_of(None), 1);
        assert!(Priority::rank_of(Some(Priority::Low)) > Priority::rank_of(None));
    }

    #[test]
    fn priority_round_trips_through_str() {
        for p in Priority::ALL {
            assert_eq!(p.as_str().parse::<Priority>(), Ok(p));
        }
        assert!("critical".parse::<Priority>().is_err());
    }

    #[test]
    fn inactive_groups_are_completed_and_cancelled() {
        assert!(StateGroup::INACTIVE.contains(&StateGroup::Completed));
        assert!(StateGroup::INACTIVE.contains(&StateGroup::Cancelled));
        assert!(!StateGroup::INACTIVE.contains(&StateGroup::Started));
    }

    #[test]
    fn sort_key_strips_legacy_sign() {
        assert_eq!(SortKey::parse("-priority"), Some(SortKey::Priority));
        assert_eq!(SortKey::parse("+name"), Some(SortKey::Name));
        assert_eq!(SortKey::parse("created_at"), Some(SortKey::CreatedAt));
    }

    #[test]
    fn sort_key_blank_selects_default() {
        assert_eq!(SortKey::parse(""), Some(SortKey::SequenceId));
        assert_eq!(SortKey::parse("-"), Some(SortKey::SequenceId));
    }

    #[test]
    fn sort_key_rejects_unknown_columns() {
        assert_eq!(SortKey::parse("tokens"), None);
        assert_eq!(SortKey::parse("name; DROP TABLE issues"), None);
    }

    #[test]
    fn sort_key_as_str_parses_back() {
        for raw in ["id", "labels", "search_rank", "completed_at"] {
            assert_eq!(SortKey::parse(raw).map(SortKey::as_str), Some(raw));
        }
    }

    #[test]
    fn group_by_parses_known_keys() {
        for g in GroupBy::ALL {
            assert_eq!(GroupBy::parse(g.as_str()), Some(g));
        }
        assert_eq!(GroupBy::parse(""), None);
        assert_eq!(GroupBy::parse("sequence_id"), None);
    }

    #[test]
    fn only_scalar_groupings_are_single_valued() {
        assert!(GroupBy::State.is_single_valued());
        assert!(!GroupBy::Labels.is_single_valued());
    }
}
