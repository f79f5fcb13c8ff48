use crate::entities::{brands, polishes, prelude::*};
use sea_orm::sea_query::{Alias, Expr, JoinType, Order, Query};
use sea_orm::{Condition, ConnectionTrait, DatabaseConnection, EntityTrait, FromQueryResult};
use serde::Serialize;

pub struct BrandRepository {
    conn: DatabaseConnection,
}

/// Brand joined with how many polishes the calling user filed under it.
#[derive(Debug, Clone, FromQueryResult, Serialize)]
pub struct BrandRow {
    pub id: i32,
    pub name: String,
    pub website_url: Option<String>,
    pub logo_url: Option<String>,
    pub created_at: String,
    pub polish_count: i64,
}

impl BrandRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// All brands with per-user polish counts, alphabetical. The user
    /// filter lives in the join condition so brands the user has not
    /// touched still show up with a zero count.
    pub async fn list_with_counts(&self, user_id: i32) -> anyhow::Result<Vec<BrandRow>> {
        let stmt = Query::select()
            .columns([
                (Brands, brands::Column::Id),
                (Brands, brands::Column::Name),
                (Brands, brands::Column::WebsiteUrl),
                (Brands, brands::Column::LogoUrl),
                (Brands, brands::Column::CreatedAt),
            ])
            .expr_as(
                Expr::col((Polishes, polishes::Column::Id)).count(),
                Alias::new("polish_count"),
            )
            .from(Brands)
            .join(
                JoinType::LeftJoin,
                Polishes,
                Condition::all()
                    .add(
                        Expr::col((Polishes, polishes::Column::BrandId))
                            .equals((Brands, brands::Column::Id)),
                    )
                    .add(Expr::col((Polishes, polishes::Column::UserId)).eq(user_id)),
            )
            .add_group_by([
                Expr::col((Brands, brands::Column::Id)).into(),
                Expr::col((Brands, brands::Column::Name)).into(),
                Expr::col((Brands, brands::Column::WebsiteUrl)).into(),
                Expr::col((Brands, brands::Column::LogoUrl)).into(),
                Expr::col((Brands, brands::Column::CreatedAt)).into(),
            ])
            .order_by((Brands, brands::Column::Name), Order::Asc)
            .to_owned();

        let backend = self.conn.get_database_backend();
        let rows = BrandRow::find_by_statement(backend.build(&stmt))
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: i32) -> anyhow::Result<Option<brands::Model>> {
        let brand = Brands::find_by_id(id).one(&self.conn).await?;
        Ok(brand)
    }
}
