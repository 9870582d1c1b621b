//! Showcase request and result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::paginator::PageMeta;
use super::sort::{SortKey, SortOption};

/// Raw showcase query string. Every field is optional free text so that
/// extraction itself never rejects a request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShowcaseQuery {
    /// Free-text search term.
    pub q: Option<String>,
    /// Requested sort key.
    pub sort: Option<String>,
    /// Owner filter (user id).
    pub owner: Option<String>,
    /// Requested page number.
    pub page: Option<String>,
}

/// Validated showcase filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowcaseFilter {
    /// Search term with surrounding whitespace removed; `None` when absent
    /// or blank.
    pub search: Option<String>,
    /// Owner to restrict to.
    pub owner: Option<Uuid>,
    /// Effective sort key.
    pub sort: SortKey,
}

impl ShowcaseFilter {
    /// Validate a raw query. Malformed values fall back to "no filter" or
    /// the default sort; nothing here can fail.
    pub fn from_query(query: &ShowcaseQuery) -> Self {
        let search = query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let owner = query
            .owner
            .as_deref()
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok());

        Self {
            search,
            owner,
            sort: SortKey::resolve(query.sort.as_deref()),
        }
    }
}

impl Default for ShowcaseFilter {
    fn default() -> Self {
        Self {
            search: None,
            owner: None,
            sort: SortKey::DEFAULT,
        }
    }
}

/// Public card of a shirt together with its owner's display name.
///
/// Purchase details, value and notes are never loaded for the showcase.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ShowcaseEntry {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub team: String,
    pub player: String,
    pub season: String,
    pub photo_uri: String,
    pub created: DateTime<Utc>,
    pub owner_name: String,
}

/// Collector offered in the owner filter.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, sqlx::FromRow)]
pub struct OwnerOption {
    pub id: Uuid,
    pub name: String,
}

/// One resolved page of the showcase.
#[derive(Debug, Clone, Serialize)]
pub struct ShowcasePage {
    pub entries: Vec<ShowcaseEntry>,
    pub pager: PageMeta,
    /// Effective sort key in query-string form.
    pub sort: String,
    pub sort_options: Vec<SortOption>,
    pub search: Option<String>,
    pub owner: Option<Uuid>,
    /// Collectors with at least one public shirt.
    pub owners: Vec<OwnerOption>,
}
