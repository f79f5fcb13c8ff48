use std::collections::BTreeMap;

use crate::entities::{brands, polish_usage, polishes, prelude::*};
use crate::services::color::color_family;
use sea_orm::sea_query::{Alias, Expr, Func, JoinType, Order, Query};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QuerySelect,
};
use serde::Serialize;

use super::polish::{self, PolishListRow};

pub struct AnalyticsRepository {
    conn: DatabaseConnection,
}

#[derive(Debug, Clone, FromQueryResult, Serialize)]
pub struct OverviewRow {
    pub total_polishes: i64,
    pub total_value: Option<f64>,
    pub average_price: Option<f64>,
}

#[derive(Debug, Clone, FromQueryResult, Serialize)]
pub struct BrandDistributionRow {
    pub brand: Option<String>,
    pub count: i64,
    pub total_value: Option<f64>,
}

#[derive(Debug, Clone, FromQueryResult, Serialize)]
pub struct FinishDistributionRow {
    pub finish_type: String,
    pub count: i64,
    pub average_price: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColorFamilyCount {
    pub family: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthCount {
    /// `YYYY-MM`.
    pub month: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct CollectionAnalytics {
    pub overview: OverviewRow,
    pub brands: Vec<BrandDistributionRow>,
    pub finishes: Vec<FinishDistributionRow>,
    pub colors: Vec<ColorFamilyCount>,
    pub most_used: Vec<PolishListRow>,
    pub least_used: Vec<PolishListRow>,
    pub never_used: Vec<PolishListRow>,
    pub usage_by_month: Vec<MonthCount>,
    pub growth: Vec<MonthCount>,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub total_polishes: u64,
    pub total_favorites: u64,
    pub total_rated: u64,
    pub distinct_brands: i64,
    pub recent_usage: u64,
}

impl AnalyticsRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn collection_analytics(&self, user_id: i32) -> anyhow::Result<CollectionAnalytics> {
        Ok(CollectionAnalytics {
            overview: self.overview(user_id).await?,
            brands: self.brand_distribution(user_id).await?,
            finishes: self.finish_distribution(user_id).await?,
            colors: self.color_distribution(user_id).await?,
            most_used: self.most_used(user_id).await?,
            least_used: self.least_used(user_id).await?,
            never_used: self.never_used(user_id).await?,
            usage_by_month: self.usage_by_month(user_id).await?,
            growth: self.growth(user_id).await?,
        })
    }

    async fn overview(&self, user_id: i32) -> anyhow::Result<OverviewRow> {
        let stmt = Query::select()
            .expr_as(
                Expr::col((Polishes, polishes::Column::Id)).count(),
                Alias::new("total_polishes"),
            )
            .expr_as(
                Expr::col((Polishes, polishes::Column::PurchasePrice)).sum(),
                Alias::new("total_value"),
            )
            .expr_as(
                Func::avg(Expr::col((Polishes, polishes::Column::PurchasePrice))),
                Alias::new("average_price"),
            )
            .from(Polishes)
            .cond_where(user_condition(user_id))
            .to_owned();

        let backend = self.conn.get_database_backend();
        let row = OverviewRow::find_by_statement(backend.build(&stmt))
            .one(&self.conn)
            .await?;

        Ok(row.unwrap_or(OverviewRow {
            total_polishes: 0,
            total_value: None,
            average_price: None,
        }))
    }

    async fn brand_distribution(&self, user_id: i32) -> anyhow::Result<Vec<BrandDistributionRow>> {
        let stmt = Query::select()
            .expr_as(
                Expr::col((Brands, brands::Column::Name)),
                Alias::new("brand"),
            )
            .expr_as(
                Expr::col((Polishes, polishes::Column::Id)).count(),
                Alias::new("count"),
            )
            .expr_as(
                Expr::col((Polishes, polishes::Column::PurchasePrice)).sum(),
                Alias::new("total_value"),
            )
            .from(Polishes)
            .join(
                JoinType::LeftJoin,
                Brands,
                Expr::col((Polishes, polishes::Column::BrandId))
                    .equals((Brands, brands::Column::Id)),
            )
            .cond_where(user_condition(user_id))
            .group_by_col((Brands, brands::Column::Name))
            .order_by_expr(
                Expr::col((Polishes, polishes::Column::Id)).count(),
                Order::Desc,
            )
            .to_owned();

        let backend = self.conn.get_database_backend();
        let mut rows = BrandDistributionRow::find_by_statement(backend.build(&stmt))
            .all(&self.conn)
            .await?;

        // Brandless polishes group under a NULL name.
        for row in &mut rows {
            if row.brand.is_none() {
                row.brand = Some("Unknown".to_string());
            }
        }

        Ok(rows)
    }

    async fn finish_distribution(
        &self,
        user_id: i32,
    ) -> anyhow::Result<Vec<FinishDistributionRow>> {
        let stmt = Query::select()
            .column((Polishes, polishes::Column::FinishType))
            .expr_as(
                Expr::col((Polishes, polishes::Column::Id)).count(),
                Alias::new("count"),
            )
            .expr_as(
                Func::avg(Expr::col((Polishes, polishes::Column::PurchasePrice))),
                Alias::new("average_price"),
            )
            .from(Polishes)
            .cond_where(user_condition(user_id))
            .group_by_col((Polishes, polishes::Column::FinishType))
            .order_by_expr(
                Expr::col((Polishes, polishes::Column::Id)).count(),
                Order::Desc,
            )
            .to_owned();

        let backend = self.conn.get_database_backend();
        let rows = FinishDistributionRow::find_by_statement(backend.build(&stmt))
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    /// Color families are computed here rather than in SQL so the
    /// buckets stay consistent with the one hue partition in
    /// `services::color`.
    async fn color_distribution(&self, user_id: i32) -> anyhow::Result<Vec<ColorFamilyCount>> {
        let hexes: Vec<String> = Polishes::find()
            .select_only()
            .column(polishes::Column::ColorHex)
            .filter(polishes::Column::UserId.eq(user_id))
            .filter(polishes::Column::ColorHex.is_not_null())
            .into_tuple()
            .all(&self.conn)
            .await?;

        let mut counts: BTreeMap<&'static str, i64> = BTreeMap::new();
        for hex in &hexes {
            *counts.entry(color_family(hex)).or_insert(0) += 1;
        }

        let mut families: Vec<ColorFamilyCount> = counts
            .into_iter()
            .map(|(family, count)| ColorFamilyCount {
                family: family.to_string(),
                count,
            })
            .collect();
        families.sort_by(|a, b| b.count.cmp(&a.count).then(a.family.cmp(&b.family)));
        Ok(families)
    }

    async fn most_used(&self, user_id: i32) -> anyhow::Result<Vec<PolishListRow>> {
        let mut stmt = polish::joined_select();
        stmt.cond_where(
            user_condition(user_id).add(
                Expr::col((Alias::new(polish::USAGE_COUNTS), Alias::new("usage_count"))).gt(0),
            ),
        )
        .order_by(
            (Alias::new(polish::USAGE_COUNTS), Alias::new("usage_count")),
            Order::Desc,
        )
        .order_by(
            (Alias::new(polish::LAST_USAGE), Alias::new("last_used_at")),
            Order::Desc,
        )
        .limit(5);

        self.fetch_rows(&stmt).await
    }

    async fn least_used(&self, user_id: i32) -> anyhow::Result<Vec<PolishListRow>> {
        let mut stmt = polish::joined_select();
        stmt.cond_where(user_condition(user_id))
            .order_by_expr(
                Func::coalesce([
                    Expr::col((Alias::new(polish::USAGE_COUNTS), Alias::new("usage_count")))
                        .into(),
                    Expr::val(0i64).into(),
                ])
                .into(),
                Order::Asc,
            )
            .order_by((Polishes, polishes::Column::CreatedAt), Order::Asc)
            .limit(5);

        self.fetch_rows(&stmt).await
    }

    async fn never_used(&self, user_id: i32) -> anyhow::Result<Vec<PolishListRow>> {
        let mut stmt = polish::joined_select();
        stmt.cond_where(
            user_condition(user_id).add(
                Expr::col((Alias::new(polish::USAGE_COUNTS), Alias::new("usage_count")))
                    .is_null(),
            ),
        )
        .order_by((Polishes, polishes::Column::CreatedAt), Order::Asc)
        .limit(10);

        self.fetch_rows(&stmt).await
    }

    async fn usage_by_month(&self, user_id: i32) -> anyhow::Result<Vec<MonthCount>> {
        let timestamps: Vec<String> = PolishUsage::find()
            .select_only()
            .column(polish_usage::Column::UsedAt)
            .filter(polish_usage::Column::UserId.eq(user_id))
            .filter(polish_usage::Column::UsedAt.gte(trailing_year_cutoff()))
            .into_tuple()
            .all(&self.conn)
            .await?;

        Ok(bucket_by_month(&timestamps))
    }

    async fn growth(&self, user_id: i32) -> anyhow::Result<Vec<MonthCount>> {
        let timestamps: Vec<String> = Polishes::find()
            .select_only()
            .column(polishes::Column::CreatedAt)
            .filter(polishes::Column::UserId.eq(user_id))
            .filter(polishes::Column::CreatedAt.gte(trailing_year_cutoff()))
            .into_tuple()
            .all(&self.conn)
            .await?;

        Ok(bucket_by_month(&timestamps))
    }

    pub async fn summary(&self, user_id: i32) -> anyhow::Result<AnalyticsSummary> {
        let total_polishes = Polishes::find()
            .filter(polishes::Column::UserId.eq(user_id))
            .count(&self.conn)
            .await?;

        let total_favorites = Polishes::find()
            .filter(polishes::Column::UserId.eq(user_id))
            .filter(polishes::Column::IsFavorite.eq(true))
            .count(&self.conn)
            .await?;

        let total_rated = Polishes::find()
            .filter(polishes::Column::UserId.eq(user_id))
            .filter(polishes::Column::Rating.is_not_null())
            .count(&self.conn)
            .await?;

        let distinct_stmt = Query::select()
            .expr_as(
                Expr::col((Polishes, polishes::Column::BrandId)).count_distinct(),
                Alias::new("distinct_brands"),
            )
            .from(Polishes)
            .cond_where(user_condition(user_id))
            .to_owned();

        let backend = self.conn.get_database_backend();
        let distinct_brands = self
            .conn
            .query_one(backend.build(&distinct_stmt))
            .await?
            .map_or(Ok(0i64), |row| row.try_get::<i64>("", "distinct_brands"))?;

        let thirty_days_ago = (chrono::Utc::now() - chrono::Duration::days(30)).to_rfc3339();
        let recent_usage = PolishUsage::find()
            .filter(polish_usage::Column::UserId.eq(user_id))
            .filter(polish_usage::Column::UsedAt.gte(thirty_days_ago))
            .count(&self.conn)
            .await?;

        Ok(AnalyticsSummary {
            total_polishes,
            total_favorites,
            total_rated,
            distinct_brands,
            recent_usage,
        })
    }

    async fn fetch_rows(
        &self,
        stmt: &sea_orm::sea_query::SelectStatement,
    ) -> anyhow::Result<Vec<PolishListRow>> {
        let backend = self.conn.get_database_backend();
        let rows = PolishListRow::find_by_statement(backend.build(stmt))
            .all(&self.conn)
            .await?;
        Ok(rows)
    }
}

fn user_condition(user_id: i32) -> Condition {
    Condition::all().add(Expr::col((Polishes, polishes::Column::UserId)).eq(user_id))
}

/// Start of the month eleven months back, so buckets span a rolling
/// twelve-month window including the current month.
fn trailing_year_cutoff() -> String {
    use chrono::{Datelike, TimeZone, Utc};

    let now = Utc::now();
    let months = i32::try_from(now.month()).unwrap_or(1) - 1;
    let (year, month) = if months >= 11 {
        (now.year(), now.month() - 11)
    } else {
        (now.year() - 1, now.month() + 1)
    };

    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .map_or_else(String::new, |dt| dt.to_rfc3339())
}

/// Folds RFC 3339 timestamps into sorted `YYYY-MM` counts.
fn bucket_by_month(timestamps: &[String]) -> Vec<MonthCount> {
    let mut counts: BTreeMap<&str, i64> = BTreeMap::new();
    for ts in timestamps {
        if ts.len() >= 7 {
            *counts.entry(&ts[..7]).or_insert(0) += 1;
        }
    }

    counts
        .into_iter()
        .map(|(month, count)| MonthCount {
            month: month.to_string(),
            count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_by_month() {
        let timestamps = vec![
            "2026-07-01T10:00:00+00:00".to_string(),
            "2026-07-15T10:00:00+00:00".to_string(),
            "2026-08-02T10:00:00+00:00".to_string(),
            "bad".to_string(),
        ];

        let buckets = bucket_by_month(&timestamps);
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].month, "2026-07");
        assert_eq!(buckets[0].count, 2);
        assert_eq!(buckets[1].month, "2026-08");
        assert_eq!(buckets[1].count, 1);
    }

    #[test]
    fn test_trailing_year_cutoff_is_month_start() {
        let cutoff = trailing_year_cutoff();
        assert!(cutoff.contains("-01T00:00:00"));
    }
}
