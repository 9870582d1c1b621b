//! Public showcase: filtered, sorted, paginated listing of public shirts.
//!
//! Request parameters are validated into a [`ShowcaseFilter`] (search term,
//! owner, allow-listed sort key), turned into SQL by the
//! [`ShowcaseQueryBuilder`], and paginated with a fixed page size of
//! [`PAGE_SIZE`].

pub mod paginator;
pub mod query_builder;
pub mod service;
pub mod sort;
pub mod types;

pub use paginator::{PAGE_SIZE, PageMeta, Paginator};
pub use query_builder::ShowcaseQueryBuilder;
pub use service::ShowcaseService;
pub use sort::{SortDirection, SortField, SortKey};
pub use types::{OwnerOption, ShowcaseEntry, ShowcaseFilter, ShowcasePage, ShowcaseQuery};
