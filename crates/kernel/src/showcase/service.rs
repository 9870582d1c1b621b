//! Showcase execution against PostgreSQL.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::debug;

use super::paginator::{PAGE_SIZE, Paginator};
use super::query_builder::ShowcaseQueryBuilder;
use super::sort::sort_options;
use super::types::{OwnerOption, ShowcaseEntry, ShowcaseFilter, ShowcasePage, ShowcaseQuery};

/// Runs showcase queries. Holds no per-request state.
pub struct ShowcaseService {
    pool: PgPool,
}

impl ShowcaseService {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }

    /// Resolve a raw query into one page of public shirts.
    ///
    /// Filters are counted first so the page number can be clamped before
    /// the page itself is fetched.
    pub async fn page(&self, query: &ShowcaseQuery) -> Result<ShowcasePage> {
        let filter = ShowcaseFilter::from_query(query);
        let builder = ShowcaseQueryBuilder::new(&filter);

        let count_sql = builder.build_count();
        let total: i64 = sqlx::query_scalar(&count_sql)
            .fetch_one(&self.pool)
            .await
            .context("failed to count showcase shirts")?;

        let paginator = Paginator::new(u64::try_from(total).unwrap_or(0), PAGE_SIZE);
        let page = paginator.resolve_page(query.page.as_deref());

        let page_sql = builder.build(page, paginator.per_page());
        debug!(sql = %page_sql, page, total, "showcase query");

        let entries = sqlx::query_as::<_, ShowcaseEntry>(&page_sql)
            .fetch_all(&self.pool)
            .await
            .context("failed to load showcase page")?;

        let owners = self.owners().await?;

        Ok(ShowcasePage {
            entries,
            pager: paginator.meta(page),
            sort: filter.sort.as_param(),
            sort_options: sort_options(filter.sort),
            search: filter.search,
            owner: filter.owner,
            owners,
        })
    }

    /// Collectors with at least one public shirt.
    pub async fn owners(&self) -> Result<Vec<OwnerOption>> {
        let owners = sqlx::query_as::<_, OwnerOption>(&ShowcaseQueryBuilder::build_owners())
            .fetch_all(&self.pool)
            .await
            .context("failed to load showcase owners")?;

        Ok(owners)
    }
}
