//! Showcase query builder using SeaQuery.
//!
//! Generates the SQL for one showcase page:
//! - visibility predicate (always applied)
//! - optional owner restriction
//! - optional case-insensitive search across team, player and season
//! - allow-listed ordering with an `id` tiebreak
//! - LIMIT/OFFSET pagination

use sea_query::{
    Alias, Asterisk, BinOper, Cond, Expr, ExprTrait, Func, Iden, Order, PostgresQueryBuilder,
    Query, SelectStatement, SimpleExpr,
};

use super::sort::{SortDirection, SortField};
use super::types::ShowcaseFilter;

#[derive(Iden)]
#[iden = "shirt"]
enum ShirtIden {
    Table,
    Id,
    OwnerId,
    Team,
    Player,
    Season,
    PhotoUri,
    IsPublic,
    Created,
}

#[derive(Iden)]
#[iden = "users"]
enum UsersIden {
    Table,
    Id,
    Name,
}

/// Query builder for the public showcase.
pub struct ShowcaseQueryBuilder<'a> {
    filter: &'a ShowcaseFilter,
}

impl<'a> ShowcaseQueryBuilder<'a> {
    pub fn new(filter: &'a ShowcaseFilter) -> Self {
        Self { filter }
    }

    /// Build the page SELECT. `page` must already be resolved against the
    /// page count so that the OFFSET never runs past the last row.
    pub fn build(&self, page: u32, per_page: u32) -> String {
        let mut query = Query::select();

        query
            .columns([
                (ShirtIden::Table, ShirtIden::Id),
                (ShirtIden::Table, ShirtIden::OwnerId),
                (ShirtIden::Table, ShirtIden::Team),
                (ShirtIden::Table, ShirtIden::Player),
                (ShirtIden::Table, ShirtIden::Season),
                (ShirtIden::Table, ShirtIden::PhotoUri),
                (ShirtIden::Table, ShirtIden::Created),
            ])
            .expr_as(
                Expr::col((UsersIden::Table, UsersIden::Name)),
                Alias::new("owner_name"),
            )
            .from(ShirtIden::Table)
            .inner_join(
                UsersIden::Table,
                Expr::col((ShirtIden::Table, ShirtIden::OwnerId))
                    .equals((UsersIden::Table, UsersIden::Id)),
            );

        self.add_filters(&mut query);
        self.add_sort(&mut query);

        let offset = u64::from(page.saturating_sub(1)) * u64::from(per_page);
        query.limit(u64::from(per_page));
        query.offset(offset);

        query.to_string(PostgresQueryBuilder)
    }

    /// Build a COUNT query over the same filters.
    pub fn build_count(&self) -> String {
        let mut query = Query::select();

        query
            .expr(Expr::col(Asterisk).count())
            .from(ShirtIden::Table);

        self.add_filters(&mut query);

        query.to_string(PostgresQueryBuilder)
    }

    /// Build the owner-filter choices: every collector with at least one
    /// public shirt, once each, by name. Independent of the active filters.
    pub fn build_owners() -> String {
        let mut query = Query::select();

        query
            .distinct()
            .columns([
                (UsersIden::Table, UsersIden::Id),
                (UsersIden::Table, UsersIden::Name),
            ])
            .from(UsersIden::Table)
            .inner_join(
                ShirtIden::Table,
                Expr::col((ShirtIden::Table, ShirtIden::OwnerId))
                    .equals((UsersIden::Table, UsersIden::Id)),
            )
            .and_where(Expr::col((ShirtIden::Table, ShirtIden::IsPublic)).eq(true))
            .order_by((UsersIden::Table, UsersIden::Name), Order::Asc)
            .order_by((UsersIden::Table, UsersIden::Id), Order::Asc);

        query.to_string(PostgresQueryBuilder)
    }

    /// Add WHERE conditions. Visibility comes first and is not optional.
    fn add_filters(&self, query: &mut SelectStatement) {
        query.and_where(Expr::col((ShirtIden::Table, ShirtIden::IsPublic)).eq(true));

        if let Some(owner) = self.filter.owner {
            query.and_where(Expr::col((ShirtIden::Table, ShirtIden::OwnerId)).eq(owner));
        }

        if let Some(ref term) = self.filter.search {
            query.cond_where(search_condition(term));
        }
    }

    /// Add ORDER BY for the effective sort key plus an `id` tiebreak in the
    /// same direction, so equal keys never shuffle between pages.
    fn add_sort(&self, query: &mut SelectStatement) {
        let sort = self.filter.sort;
        let order = match sort.direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        };

        let column = match sort.field {
            SortField::Player => ShirtIden::Player,
            SortField::Team => ShirtIden::Team,
            SortField::Season => ShirtIden::Season,
            SortField::Created => ShirtIden::Created,
        };

        query.order_by((ShirtIden::Table, column), order.clone());
        query.order_by((ShirtIden::Table, ShirtIden::Id), order);
    }
}

/// `UPPER(team) LIKE UPPER('%term%') OR UPPER(player) LIKE ... OR UPPER(season) LIKE ...`
///
/// Both sides are folded by PostgreSQL. Upper case maps `σ` and a final `ς`
/// to the same letter, which lower case does not.
fn search_condition(term: &str) -> Cond {
    let pattern = format!("%{}%", escape_like_wildcards(term));

    [ShirtIden::Team, ShirtIden::Player, ShirtIden::Season]
        .into_iter()
        .fold(Cond::any(), |cond, column| {
            let folded: SimpleExpr = Func::upper(Expr::col((ShirtIden::Table, column))).into();
            let needle: SimpleExpr = Func::upper(Expr::val(pattern.as_str())).into();
            cond.add(folded.binary(BinOper::Like, needle))
        })
}

/// Escape SQL LIKE wildcard characters (`%`, `_`, `\`) in a value.
fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
