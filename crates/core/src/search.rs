//! Full-text query helpers for issue search.
//!
//! Turns free text typed by a user into the pieces the query plan needs:
//! a sanitized PostgreSQL `tsquery` string over all the words, and the
//! list of issue references (`PROJ-42`) mentioned in the text.

use std::sync::LazyLock;

use regex::Regex;

// ---------------------------------------------------------------------------
// Highlighting
// ---------------------------------------------------------------------------

/// Text search configuration used for both the token column and queries.
pub const TEXT_SEARCH_CONFIG: &str = "english";

/// Maximum number of description characters fed into `ts_headline`.
///
/// Highlighting a full description is expensive; fragments are taken from a
/// bounded prefix only.
pub const DESCRIPTION_HIGHLIGHT_CHARS: i64 = 2000;

/// `ts_headline` options for the issue name (whole name, marked up).
pub const NAME_HEADLINE_OPTIONS: &str = "StartSel=<mark>, StopSel=</mark>, HighlightAll=true";

/// `ts_headline` options for the description (context windows around hits).
pub const DESCRIPTION_HEADLINE_OPTIONS: &str =
    "StartSel=<mark>, StopSel=</mark>, MaxFragments=3, MaxWords=20, MinWords=5, FragmentDelimiter=\" ... \"";

/// Rank added to an issue addressed directly by reference (`PROJ-42`).
///
/// `ts_rank` stays well below this value, so a referenced issue always sorts
/// above plain text matches.
pub const ISSUE_REF_RANK_BOOST: f32 = 10.0;

// ---------------------------------------------------------------------------
// Issue references
// ---------------------------------------------------------------------------

static ISSUE_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z0-9]*)-([0-9]{1,9})$").expect("valid regex")
});

/// A `PROJECT-SEQUENCE` reference found in a text query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRef {
    /// Project identifier, upper-cased.
    pub identifier: String,
    pub sequence_id: i32,
}

/// A text query: its words as a `tsquery`, plus the issue references it
/// mentions.
///
/// Reference-shaped tokens stay in the word list too, so `utf-8` still
/// matches text; the reference only adds a direct hit and a rank boost.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextQuery {
    /// `tsquery` over every word, if any survive sanitizing.
    pub tsquery: Option<String>,
    /// Issue references mentioned in the text.
    pub refs: Vec<IssueRef>,
}

impl TextQuery {
    /// Parse user text. Returns `None` when the input is blank.
    ///
    /// # Examples
    ///
    /// ```
    /// use tasklane_core::search::TextQuery;
    /// let q = TextQuery::parse("PROJ-42 fix").unwrap();
    /// assert_eq!(q.refs[0].identifier, "PROJ");
    /// assert_eq!(q.refs[0].sequence_id, 42);
    /// assert_eq!(q.tsquery.as_deref(), Some("PROJ & 42 & fix:*"));
    /// ```
    pub fn parse(text: &str) -> Option<Self> {
        let raw = text.trim();
        if raw.is_empty() {
            return None;
        }

        let mut refs = Vec::new();
        for token in raw.split_whitespace() {
            let bare = token.trim_matches(|c: char| !c.is_alphanumeric() && c != '-');
            if let Some(issue_ref) = parse_issue_ref(bare) {
                if !refs.contains(&issue_ref) {
                    refs.push(issue_ref);
                }
            }
        }

        Some(Self {
            tsquery: build_tsquery(raw),
            refs,
        })
    }

    /// `true` when the text can never match anything (only punctuation).
    pub fn is_unmatchable(&self) -> bool {
        self.tsquery.is_none() && self.refs.is_empty()
    }
}

/// Parse a single `IDENT-123` token.
pub fn parse_issue_ref(token: &str) -> Option<IssueRef> {
    let caps = ISSUE_REF_RE.captures(token)?;
    let sequence_id = caps[2].parse().ok()?;
    Some(IssueRef {
        identifier: caps[1].to_ascii_uppercase(),
        sequence_id,
    })
}

// ---------------------------------------------------------------------------
// tsquery construction
// ---------------------------------------------------------------------------

/// Sanitize user input into a list of terms suitable for tsquery construction.
///
/// Splits on every character that is not alphanumeric or `_`, so `e-mail`
/// yields `e` and `mail`, the same parts the text parser indexes for a
/// hyphenated word.
///
/// Returns `None` if the input yields no usable terms.
fn sanitize_terms(query: &str) -> Option<Vec<&str>> {
    let terms: Vec<&str> = query
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|t| !t.is_empty())
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms)
    }
}

/// Sanitize and convert user input into a PostgreSQL `tsquery` string.
///
/// - Terms are joined with `&` (AND).
/// - The last term is a prefix match so partially typed words still hit.
/// - Empty or whitespace-only input returns `None`.
///
/// # Examples
///
/// ```
/// use tasklane_core::search::build_tsquery;
/// assert_eq!(build_tsquery("login crash"), Some("login & crash:*".to_string()));
/// assert_eq!(build_tsquery("  "), None);
/// ```
pub fn build_tsquery(query: &str) -> Option<String> {
    let terms = sanitize_terms(query)?;
    let (last, exact) = terms.split_last()?;
    if exact.is_empty() {
        return Some(format!("{last}:*"));
    }
    Some(format!("{} & {last}:*", exact.join(" & ")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
