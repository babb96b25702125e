pub mod issue_search;
