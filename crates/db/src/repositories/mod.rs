//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod issue_relation_repo;
pub mod issue_search_repo;
pub mod membership_repo;

pub use issue_relation_repo::IssueRelationRepo;
pub use issue_search_repo::IssueSearchRepo;
pub use membership_repo::MembershipRepo;
