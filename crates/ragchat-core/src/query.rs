//! Query DSL for searching the stored corpus.

use chrono::{DateTime, Utc};

/// Result limit when neither the caller nor a `limit:` token sets one.
pub const DEFAULT_LIMIT: usize = 10;

/// A parsed search query with semantic text and metadata filters.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// The core semantic query string
    pub raw_query: String,
    /// Filter by source site (host[:port])
    pub source: Option<String>,
    /// Filter by URL substring
    pub url_pattern: Option<String>,
    /// Only chunks crawled after this instant
    pub after: Option<DateTime<Utc>>,
    /// Only chunks crawled before this instant
    pub before: Option<DateTime<Utc>>,
    /// Maximum number of results
    pub limit: usize,
}

impl SearchQuery {
    /// Create a new search query from a raw input string.
    ///
    /// Example: "fever in children source:www.example.com url:/forums limit:5"
    pub fn parse(input: &str) -> Self {
        Self::parse_with_limit(input, DEFAULT_LIMIT)
    }

    /// Parse `input`, using `limit` unless the query carries a `limit:` token.
    pub fn parse_with_limit(input: &str, limit: usize) -> Self {
        let mut query = SearchQuery {
            limit,
            ..Default::default()
        };

        let mut semantic_parts = Vec::new();

        for token in input.split_whitespace() {
            if let Some((key, value)) = token.split_once(':') {
                match key.to_lowercase().as_str() {
                    "source" | "site" => query.source = Some(value.to_string()),
                    "url" | "path" => query.url_pattern = Some(value.to_string()),
                    "after" => {
                        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
                            query.after = Some(dt.with_timezone(&Utc));
                        }
                    }
                    "before" => {
                        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
                            query.before = Some(dt.with_timezone(&Utc));
                        }
                    }
                    "limit" => {
                        if let Ok(l) = value.parse::<usize>() {
                            query.limit = l;
                        }
                    }
                    // Unknown prefixes (including "http") stay part of the text
                    _ => semantic_parts.push(token),
                }
            } else {
                semantic_parts.push(token);
            }
        }

        query.raw_query = semantic_parts.join(" ");
        query
    }

    /// A plain query without filters.
    pub fn text(raw_query: &str, limit: usize) -> Self {
        Self {
            raw_query: raw_query.to_string(),
            limit,
            ..Default::default()
        }
    }
}
