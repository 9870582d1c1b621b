//! Collection statistics for a single owner.
//!
//! Computed over every shirt the owner has, public and private alike. The
//! owner's collection is loaded once and aggregated in memory.

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Shirt;

/// Number of teams reported in [`CollectionStats::top_teams`].
pub const TOP_TEAMS: usize = 5;

/// Team and how many shirts of it the owner has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamCount {
    pub team: String,
    pub count: u64,
}

/// Season label and how many shirts carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonCount {
    pub season: String,
    pub count: u64,
}

/// Summary of one owner's collection.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionStats {
    pub total: u64,
    pub public_count: u64,
    pub private_count: u64,
    /// Earliest inserted shirt, `None` for an empty collection.
    pub first: Option<Shirt>,
    /// Latest inserted shirt, `None` for an empty collection.
    pub last: Option<Shirt>,
    /// Most collected teams, count descending then team name ascending.
    pub top_teams: Vec<TeamCount>,
    /// Every season with its count, ordered by season label descending.
    pub seasons: Vec<SeasonCount>,
}

impl CollectionStats {
    /// Load and aggregate the collection of `owner_id`.
    pub async fn for_owner(pool: &PgPool, owner_id: Uuid) -> Result<Self> {
        let shirts = Shirt::list_by_owner(pool, owner_id).await?;
        Ok(Self::compute(&shirts))
    }

    /// Aggregate an owner's shirts.
    pub fn compute(shirts: &[Shirt]) -> Self {
        let public_count = shirts.iter().filter(|s| s.is_public).count() as u64;
        let private_count = shirts.iter().filter(|s| !s.is_public).count() as u64;

        // UUIDv7 ids sort in insertion order.
        let first = shirts.iter().min_by_key(|s| s.id).cloned();
        let last = shirts.iter().max_by_key(|s| s.id).cloned();

        Self {
            total: shirts.len() as u64,
            public_count,
            private_count,
            first,
            last,
            top_teams: top_teams(shirts, TOP_TEAMS),
            seasons: seasons(shirts),
        }
    }
}

fn top_teams(shirts: &[Shirt], limit: usize) -> Vec<TeamCount> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for shirt in shirts {
        *counts.entry(shirt.team.as_str()).or_default() += 1;
    }

    let mut teams: Vec<TeamCount> = counts
        .into_iter()
        .map(|(team, count)| TeamCount {
            team: team.to_string(),
            count,
        })
        .collect();
    teams.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.team.cmp(&b.team)));
    teams.truncate(limit);
    teams
}

fn seasons(shirts: &[Shirt]) -> Vec<SeasonCount> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for shirt in shirts {
        *counts.entry(shirt.season.as_str()).or_default() += 1;
    }

    counts
        .into_iter()
        .rev()
        .map(|(season, count)| SeasonCount {
            season: season.to_string(),
            count,
        })
        .collect()
}
