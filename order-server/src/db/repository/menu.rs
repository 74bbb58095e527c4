//! Menu item price lookup

use super::RepoResult;
use sqlx::{QueryBuilder, Sqlite};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MenuItemPrice {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub is_available: bool,
}

/// Fetch the given menu items, restricted to one restaurant's menu.
///
/// Ids that do not belong to the restaurant are simply absent from the result.
pub async fn find_for_restaurant(
    conn: impl sqlx::Executor<'_, Database = Sqlite>,
    restaurant_id: i64,
    ids: &[i64],
) -> RepoResult<Vec<MenuItemPrice>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT id, name, price, is_available FROM menu_items WHERE restaurant_id = ",
    );
    qb.push_bind(restaurant_id);
    qb.push(" AND id IN (");
    let mut sep = qb.separated(", ");
    for id in ids {
        sep.push_bind(*id);
    }
    sep.push_unseparated(")");

    let items = qb.build_query_as::<MenuItemPrice>().fetch_all(conn).await?;
    Ok(items)
}
