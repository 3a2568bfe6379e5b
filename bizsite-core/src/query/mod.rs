//! Filtered, ordered, paginated reads shared by every content entity.
//!
//! A [`ListQuery`] names the filter, the order and the page; [`paginate`]
//! turns it into a count query and a slice query over the entity's table.

pub mod filters;
pub mod page;

pub use filters::{
    ActiveFilter, BlogFilter, Discriminator, MessageFilter, ProjectFilter, PublishedFilter,
    ReadFilter, TestimonialFilter,
};
pub use page::{Page, PageMeta, PageRequest, DEFAULT_PER_PAGE, MAX_PER_PAGE};

use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

/// An entity stored in its own table with a creation timestamp column.
pub trait Listed: for<'r> FromRow<'r, SqliteRow> + Send + Unpin {
    const TABLE: &'static str;
    const CREATED_COLUMN: &'static str;
}

/// Equality predicates for one entity family.
pub trait FilterSpec {
    type Entity: Listed;

    /// Appends ` AND column = ?` clauses to a query ending in a WHERE clause.
    fn push_predicates(&self, qb: &mut QueryBuilder<'_, Sqlite>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// Sort key; ties are broken by `id` in the same direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub column: &'static str,
    pub direction: Direction,
}

impl Order {
    pub fn asc(column: &'static str) -> Self {
        Self {
            column,
            direction: Direction::Asc,
        }
    }

    pub fn desc(column: &'static str) -> Self {
        Self {
            column,
            direction: Direction::Desc,
        }
    }

    /// Newest rows first.
    pub fn newest<T: Listed>() -> Self {
        Self::desc(T::CREATED_COLUMN)
    }

    fn to_sql(self) -> String {
        let dir = self.direction.as_sql();
        format!("{} {}, id {}", self.column, dir, dir)
    }
}

/// One list request: what to match, how to sort, which page.
#[derive(Debug, Clone)]
pub struct ListQuery<F: FilterSpec> {
    pub filter: F,
    pub order: Order,
    pub page: PageRequest,
}

impl<F: FilterSpec> ListQuery<F> {
    /// Newest-first query for `filter`.
    pub fn new(filter: F, page: PageRequest) -> Self {
        Self {
            filter,
            order: Order::newest::<F::Entity>(),
            page,
        }
    }

    pub fn ordered_by(mut self, order: Order) -> Self {
        self.order = order;
        self
    }
}

/// Runs `query` and returns the requested slice plus pagination metadata.
///
/// The count and the slice are read inside one transaction so that the
/// metadata describes the same snapshot as the items. A page past the end
/// yields an empty item list.
pub async fn paginate<F: FilterSpec>(
    pool: &SqlitePool,
    query: &ListQuery<F>,
) -> Result<Page<F::Entity>, sqlx::Error> {
    let table = <F::Entity as Listed>::TABLE;
    let mut tx = pool.begin().await?;

    let mut count = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) FROM {} WHERE 1 = 1", table));
    query.filter.push_predicates(&mut count);
    let (total,): (i64,) = count.build_query_as().fetch_one(&mut *tx).await?;

    let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT * FROM {} WHERE 1 = 1", table));
    query.filter.push_predicates(&mut select);
    select.push(" ORDER BY ").push(query.order.to_sql());
    select
        .push(" LIMIT ")
        .push_bind(query.page.per_page)
        .push(" OFFSET ")
        .push_bind(query.page.offset());
    let items = select
        .build_query_as::<F::Entity>()
        .fetch_all(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(Page {
        items,
        meta: PageMeta::new(query.page, total),
    })
}

/// Every row matching `filter` in `order`, optionally capped at `limit`.
pub async fn fetch_all<F: FilterSpec>(
    pool: &SqlitePool,
    filter: &F,
    order: Order,
    limit: Option<i64>,
) -> Result<Vec<F::Entity>, sqlx::Error> {
    let table = <F::Entity as Listed>::TABLE;
    let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT * FROM {} WHERE 1 = 1", table));
    filter.push_predicates(&mut select);
    select.push(" ORDER BY ").push(order.to_sql());
    if let Some(limit) = limit {
        select.push(" LIMIT ").push_bind(limit);
    }
    select.build_query_as::<F::Entity>().fetch_all(pool).await
}

/// Number of rows matching `filter`.
pub async fn count<F: FilterSpec>(pool: &SqlitePool, filter: &F) -> Result<i64, sqlx::Error> {
    let table = <F::Entity as Listed>::TABLE;
    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) FROM {} WHERE 1 = 1", table));
    filter.push_predicates(&mut qb);
    let (total,): (i64,) = qb.build_query_as().fetch_one(pool).await?;
    Ok(total)
}

/// One bucket of a grouped count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct GroupCount {
    pub value: String,
    pub count: i64,
}

/// Grouped count over a discriminator column of `T`'s table, skipping NULL
/// and empty values. Largest groups first.
pub async fn group_count<T: Listed>(
    pool: &SqlitePool,
    column: &'static str,
) -> Result<Vec<GroupCount>, sqlx::Error> {
    let sql = format!(
        "SELECT {col} AS value, COUNT(*) AS count FROM {table} \
         WHERE {col} IS NOT NULL AND TRIM({col}) <> '' \
         GROUP BY {col} ORDER BY count DESC, value ASC",
        col = column,
        table = T::TABLE,
    );
    sqlx::query_as::<_, GroupCount>(&sql).fetch_all(pool).await
}
