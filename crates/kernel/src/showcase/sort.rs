//! Allow-listed sort keys for the public showcase.
//!
//! The `sort` query parameter is never interpolated into SQL. It is matched
//! against a closed set of keys; anything else resolves to the default.

use serde::Serialize;

/// Sortable shirt columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Player,
    Team,
    Season,
    Created,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// A validated sort key: one of eight allow-listed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortField {
    /// Column name in the `shirt` table, and the query-string spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Player => "player",
            SortField::Team => "team",
            SortField::Season => "season",
            SortField::Created => "created",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "player" => Some(SortField::Player),
            "team" => Some(SortField::Team),
            "season" => Some(SortField::Season),
            "created" => Some(SortField::Created),
            _ => None,
        }
    }
}

impl SortKey {
    /// Newest shirts first.
    pub const DEFAULT: SortKey = SortKey {
        field: SortField::Created,
        direction: SortDirection::Desc,
    };

    /// Every accepted key, in the order offered to visitors.
    pub const ALL: [SortKey; 8] = [
        SortKey::DEFAULT,
        SortKey::new(SortField::Created, SortDirection::Asc),
        SortKey::new(SortField::Player, SortDirection::Asc),
        SortKey::new(SortField::Player, SortDirection::Desc),
        SortKey::new(SortField::Team, SortDirection::Asc),
        SortKey::new(SortField::Team, SortDirection::Desc),
        SortKey::new(SortField::Season, SortDirection::Desc),
        SortKey::new(SortField::Season, SortDirection::Asc),
    ];

    pub const fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Parse an exact allow-listed value (`team`, `-team`, ...).
    pub fn parse(raw: &str) -> Option<Self> {
        let (direction, name) = match raw.strip_prefix('-') {
            Some(rest) => (SortDirection::Desc, rest),
            None => (SortDirection::Asc, raw),
        };
        SortField::from_name(name).map(|field| Self { field, direction })
    }

    /// Resolve a request value, falling back to [`SortKey::DEFAULT`].
    pub fn resolve(raw: Option<&str>) -> Self {
        raw.and_then(Self::parse).unwrap_or(Self::DEFAULT)
    }

    /// Query-string form, `-` prefixed when descending.
    pub fn as_param(&self) -> String {
        match self.direction {
            SortDirection::Asc => self.field.as_str().to_string(),
            SortDirection::Desc => format!("-{}", self.field.as_str()),
        }
    }

    /// Human-readable label for the sort selector.
    pub fn label(&self) -> &'static str {
        match (self.field, self.direction) {
            (SortField::Created, SortDirection::Desc) => "Newest first",
            (SortField::Created, SortDirection::Asc) => "Oldest first",
            (SortField::Player, SortDirection::Asc) => "Player (A-Z)",
            (SortField::Player, SortDirection::Desc) => "Player (Z-A)",
            (SortField::Team, SortDirection::Asc) => "Team (A-Z)",
            (SortField::Team, SortDirection::Desc) => "Team (Z-A)",
            (SortField::Season, SortDirection::Desc) => "Season (latest)",
            (SortField::Season, SortDirection::Asc) => "Season (earliest)",
        }
    }
}

impl Default for SortKey {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Sort choice rendered in the showcase selector.
#[derive(Debug, Clone, Serialize)]
pub struct SortOption {
    pub value: String,
    pub label: &'static str,
    pub selected: bool,
}

/// Build the selector entries, marking the effective key.
pub fn sort_options(current: SortKey) -> Vec<SortOption> {
    SortKey::ALL
        .iter()
        .map(|key| SortOption {
            value: key.as_param(),
            label: key.label(),
            selected: *key == current,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_has_eight_distinct_values() {
        let params: std::collections::HashSet<String> =
            SortKey::ALL.iter().map(SortKey::as_param).collect();
        assert_eq!(params.len(), 8);
        for field in ["player", "team", "season", "created"] {
            assert!(params.contains(field));
            assert!(params.contains(&format!("-{field}")));
        }
    }

    #[test]
    fn every_allowed_value_parses_back_to_itself() {
        for key in SortKey::ALL {
            assert_eq!(SortKey::parse(&key.as_param()), Some(key));
        }
    }

    #[test]
    fn descending_prefix() {
        let key = SortKey::parse("-player").unwrap_or_default();
        assert_eq!(key.field, SortField::Player);
        assert_eq!(key.direction, SortDirection::Desc);
    }

    #[test]
    fn unknown_values_fall_back_to_newest_first() {
        for raw in [
            "",
            "-",
            "--created",
            "owner_id",
            "Player",
            "created; DROP TABLE shirt",
            "estimated_value",
            " team",
        ] {
            assert_eq!(SortKey::resolve(Some(raw)), SortKey::DEFAULT, "{raw:?}");
        }
    }

    #[test]
    fn missing_value_falls_back_to_newest_first() {
        assert_eq!(SortKey::resolve(None), SortKey::DEFAULT);
        assert_eq!(SortKey::DEFAULT.as_param(), "-created");
    }

    #[test]
    fn options_mark_exactly_one_selected() {
        let options = sort_options(SortKey::new(SortField::Team, SortDirection::Desc));
        let selected: Vec<_> = options.iter().filter(|o| o.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].value, "-team");
    }
}
