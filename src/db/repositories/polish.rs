use crate::entities::{brands, polish_usage, polishes, prelude::*};
use sea_orm::sea_query::{
    Alias, Expr, Func, JoinType, NullOrdering, Order, Query, SelectStatement,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::info;

pub struct PolishRepository {
    conn: DatabaseConnection,
}

/// Filter set for the polish listing. Every field is optional; the
/// same struct drives both the page query and the total count.
#[derive(Debug, Default, Clone)]
pub struct PolishFilter {
    pub brand_id: Option<i32>,
    pub finish_type: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub favorites_only: bool,
    pub rated_only: bool,
    pub rating_min: Option<i32>,
    pub tags: Vec<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Brand,
    PurchaseDate,
    CreatedAt,
    LastUsed,
}

impl SortField {
    /// Whitelist lookup. Anything unrecognized falls back to the
    /// default sort rather than erroring.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "name" => Self::Name,
            "brand" => Self::Brand,
            "purchase_date" => Self::PurchaseDate,
            "last_used" => Self::LastUsed,
            _ => Self::CreatedAt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("asc") {
            Self::Asc
        } else {
            Self::Desc
        }
    }

    const fn to_order(self) -> Order {
        match self {
            Self::Asc => Order::Asc,
            Self::Desc => Order::Desc,
        }
    }
}

/// One listing row: the polish, its brand, and derived usage columns.
#[derive(Debug, Clone, FromQueryResult, Serialize)]
pub struct PolishListRow {
    pub id: i32,
    pub user_id: i32,
    pub brand_id: Option<i32>,
    pub name: String,
    pub color_hex: Option<String>,
    pub finish_type: String,
    pub collection_name: Option<String>,
    pub purchase_date: Option<String>,
    pub purchase_price: Option<f64>,
    pub purchase_location: Option<String>,
    pub notes: Option<String>,
    pub rating: Option<i32>,
    pub is_favorite: bool,
    pub custom_tags: Option<String>,
    pub bottle_image_url: Option<String>,
    pub swatch_image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub brand_name: Option<String>,
    pub brand_website: Option<String>,
    pub brand_logo: Option<String>,
    pub last_used_at: Option<String>,
    pub usage_count: Option<i64>,
}

#[derive(Debug)]
pub struct PolishPage {
    pub rows: Vec<PolishListRow>,
    pub total: u64,
}

#[derive(Debug, Clone, Default)]
pub struct NewPolish {
    pub brand_id: Option<i32>,
    pub name: String,
    pub color_hex: Option<String>,
    pub finish_type: String,
    pub collection_name: Option<String>,
    pub purchase_date: Option<String>,
    pub purchase_price: Option<f64>,
    pub purchase_location: Option<String>,
    pub notes: Option<String>,
    pub rating: Option<i32>,
    pub is_favorite: bool,
    pub custom_tags: Vec<String>,
}

/// Partial update: only `Some` fields are written.
#[derive(Debug, Clone, Default)]
pub struct PolishUpdate {
    pub brand_id: Option<i32>,
    pub name: Option<String>,
    pub color_hex: Option<String>,
    pub finish_type: Option<String>,
    pub collection_name: Option<String>,
    pub purchase_date: Option<String>,
    pub purchase_price: Option<f64>,
    pub purchase_location: Option<String>,
    pub notes: Option<String>,
    pub rating: Option<i32>,
    pub is_favorite: Option<bool>,
    pub custom_tags: Option<Vec<String>>,
    pub bottle_image_url: Option<String>,
    pub swatch_image_url: Option<String>,
}

impl PolishUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.brand_id.is_none()
            && self.name.is_none()
            && self.color_hex.is_none()
            && self.finish_type.is_none()
            && self.collection_name.is_none()
            && self.purchase_date.is_none()
            && self.purchase_price.is_none()
            && self.purchase_location.is_none()
            && self.notes.is_none()
            && self.rating.is_none()
            && self.is_favorite.is_none()
            && self.custom_tags.is_none()
            && self.bottle_image_url.is_none()
            && self.swatch_image_url.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewUsage {
    pub used_at: Option<String>,
    pub occasion: Option<String>,
    pub notes: Option<String>,
}

pub(crate) const LAST_USAGE: &str = "last_usage";
pub(crate) const USAGE_COUNTS: &str = "usage_counts";

/// MAX(used_at) per polish.
fn last_usage_select() -> SelectStatement {
    Query::select()
        .column(polish_usage::Column::PolishId)
        .expr_as(
            Expr::col(polish_usage::Column::UsedAt).max(),
            Alias::new("last_used_at"),
        )
        .from(PolishUsage)
        .group_by_col(polish_usage::Column::PolishId)
        .to_owned()
}

/// COUNT(*) per polish.
fn usage_count_select() -> SelectStatement {
    Query::select()
        .column(polish_usage::Column::PolishId)
        .expr_as(
            Expr::col(polish_usage::Column::Id).count(),
            Alias::new("usage_count"),
        )
        .from(PolishUsage)
        .group_by_col(polish_usage::Column::PolishId)
        .to_owned()
}

/// Select base shared by the listing and the analytics usage reports:
/// polishes joined with brands and the two usage derived tables, no
/// WHERE or ORDER applied yet.
pub(crate) fn joined_select() -> SelectStatement {
    Query::select()
        .columns([
            (Polishes, polishes::Column::Id),
            (Polishes, polishes::Column::UserId),
            (Polishes, polishes::Column::BrandId),
            (Polishes, polishes::Column::Name),
            (Polishes, polishes::Column::ColorHex),
            (Polishes, polishes::Column::FinishType),
            (Polishes, polishes::Column::CollectionName),
            (Polishes, polishes::Column::PurchaseDate),
            (Polishes, polishes::Column::PurchasePrice),
            (Polishes, polishes::Column::PurchaseLocation),
            (Polishes, polishes::Column::Notes),
            (Polishes, polishes::Column::Rating),
            (Polishes, polishes::Column::IsFavorite),
            (Polishes, polishes::Column::CustomTags),
            (Polishes, polishes::Column::BottleImageUrl),
            (Polishes, polishes::Column::SwatchImageUrl),
            (Polishes, polishes::Column::CreatedAt),
            (Polishes, polishes::Column::UpdatedAt),
        ])
        .expr_as(
            Expr::col((Brands, brands::Column::Name)),
            Alias::new("brand_name"),
        )
        .expr_as(
            Expr::col((Brands, brands::Column::WebsiteUrl)),
            Alias::new("brand_website"),
        )
        .expr_as(
            Expr::col((Brands, brands::Column::LogoUrl)),
            Alias::new("brand_logo"),
        )
        .expr_as(
            Expr::col((Alias::new(LAST_USAGE), Alias::new("last_used_at"))),
            Alias::new("last_used_at"),
        )
        .expr_as(
            Expr::col((Alias::new(USAGE_COUNTS), Alias::new("usage_count"))),
            Alias::new("usage_count"),
        )
        .from(Polishes)
        .join(
            JoinType::LeftJoin,
            Brands,
            Expr::col((Polishes, polishes::Column::BrandId)).equals((Brands, brands::Column::Id)),
        )
        .join_subquery(
            JoinType::LeftJoin,
            last_usage_select(),
            Alias::new(LAST_USAGE),
            Expr::col((Polishes, polishes::Column::Id))
                .equals((Alias::new(LAST_USAGE), polish_usage::Column::PolishId)),
        )
        .join_subquery(
            JoinType::LeftJoin,
            usage_count_select(),
            Alias::new(USAGE_COUNTS),
            Expr::col((Polishes, polishes::Column::Id))
                .equals((Alias::new(USAGE_COUNTS), polish_usage::Column::PolishId)),
        )
        .to_owned()
}

/// The WHERE condition for a user's filtered listing. Both the page
/// query and the count query call this with the same inputs, so the
/// reported total always matches the filtered rows.
fn filter_condition(user_id: i32, filter: &PolishFilter) -> Condition {
    let mut cond = Condition::all()
        .add(Expr::col((Polishes, polishes::Column::UserId)).eq(user_id));

    if let Some(brand_id) = filter.brand_id {
        cond = cond.add(Expr::col((Polishes, polishes::Column::BrandId)).eq(brand_id));
    }

    if let Some(finish) = &filter.finish_type {
        cond = cond.add(Expr::col((Polishes, polishes::Column::FinishType)).eq(finish.clone()));
    }

    if let Some(min) = filter.price_min {
        cond = cond.add(Expr::col((Polishes, polishes::Column::PurchasePrice)).gte(min));
    }

    if let Some(max) = filter.price_max {
        cond = cond.add(Expr::col((Polishes, polishes::Column::PurchasePrice)).lte(max));
    }

    if filter.favorites_only {
        cond = cond.add(Expr::col((Polishes, polishes::Column::IsFavorite)).eq(true));
    }

    if filter.rated_only {
        cond = cond.add(Expr::col((Polishes, polishes::Column::Rating)).is_not_null());
    }

    if let Some(rating_min) = filter.rating_min {
        cond = cond.add(Expr::col((Polishes, polishes::Column::Rating)).gte(rating_min));
    }

    if !filter.tags.is_empty() {
        // Tags live as a JSON array of strings, so containment of the
        // quoted tag is an ANY-match over the list.
        let mut any_tag = Condition::any();
        for tag in &filter.tags {
            any_tag = any_tag.add(
                Expr::col((Polishes, polishes::Column::CustomTags))
                    .like(format!("%\"{tag}\"%")),
            );
        }
        cond = cond.add(any_tag);
    }

    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search.to_lowercase());
        cond = cond.add(
            Condition::any()
                .add(lowered((Polishes, polishes::Column::Name), &pattern))
                .add(lowered((Polishes, polishes::Column::CollectionName), &pattern))
                .add(lowered((Polishes, polishes::Column::Notes), &pattern))
                .add(lowered((Brands, brands::Column::Name), &pattern)),
        );
    }

    cond
}

fn lowered<C>(col: C, pattern: &str) -> sea_orm::sea_query::SimpleExpr
where
    C: sea_orm::sea_query::IntoColumnRef,
{
    Expr::expr(Func::lower(Expr::col(col))).like(pattern)
}

impl PolishRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(
        &self,
        user_id: i32,
        filter: &PolishFilter,
        sort: SortField,
        order: SortOrder,
        limit: u64,
        offset: u64,
    ) -> anyhow::Result<PolishPage> {
        let backend = self.conn.get_database_backend();

        let mut stmt = joined_select();
        stmt.cond_where(filter_condition(user_id, filter));

        match sort {
            SortField::Name => {
                stmt.order_by((Polishes, polishes::Column::Name), order.to_order());
            }
            SortField::Brand => {
                stmt.order_by((Brands, brands::Column::Name), order.to_order());
            }
            SortField::PurchaseDate => {
                stmt.order_by((Polishes, polishes::Column::PurchaseDate), order.to_order());
            }
            SortField::CreatedAt => {
                stmt.order_by((Polishes, polishes::Column::CreatedAt), order.to_order());
            }
            SortField::LastUsed => {
                // Never-used polishes sort after everything else in
                // either direction.
                stmt.order_by_with_nulls(
                    (Alias::new(LAST_USAGE), Alias::new("last_used_at")),
                    order.to_order(),
                    NullOrdering::Last,
                );
            }
        }
        stmt.limit(limit).offset(offset);

        let rows = PolishListRow::find_by_statement(backend.build(&stmt))
            .all(&self.conn)
            .await?;

        let count_stmt = Query::select()
            .expr_as(
                Expr::col((Polishes, polishes::Column::Id)).count(),
                Alias::new("total"),
            )
            .from(Polishes)
            .join(
                JoinType::LeftJoin,
                Brands,
                Expr::col((Polishes, polishes::Column::BrandId))
                    .equals((Brands, brands::Column::Id)),
            )
            .cond_where(filter_condition(user_id, filter))
            .to_owned();

        let total = self
            .conn
            .query_one(backend.build(&count_stmt))
            .await?
            .map_or(Ok(0i64), |row| row.try_get::<i64>("", "total"))?;

        Ok(PolishPage {
            rows,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    pub async fn get(&self, user_id: i32, id: i32) -> anyhow::Result<Option<PolishListRow>> {
        let backend = self.conn.get_database_backend();

        let mut stmt = joined_select();
        stmt.cond_where(
            Condition::all()
                .add(Expr::col((Polishes, polishes::Column::UserId)).eq(user_id))
                .add(Expr::col((Polishes, polishes::Column::Id)).eq(id)),
        );

        let row = PolishListRow::find_by_statement(backend.build(&stmt))
            .one(&self.conn)
            .await?;
        Ok(row)
    }

    pub async fn exists(&self, user_id: i32, id: i32) -> anyhow::Result<bool> {
        let count = Polishes::find()
            .filter(polishes::Column::UserId.eq(user_id))
            .filter(polishes::Column::Id.eq(id))
            .count(&self.conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn create(&self, user_id: i32, new: NewPolish) -> anyhow::Result<PolishListRow> {
        let now = chrono::Utc::now().to_rfc3339();
        let tags = serde_json::to_string(&new.custom_tags)?;

        let model = polishes::ActiveModel {
            user_id: Set(user_id),
            brand_id: Set(new.brand_id),
            name: Set(new.name),
            color_hex: Set(new.color_hex),
            finish_type: Set(new.finish_type),
            collection_name: Set(new.collection_name),
            purchase_date: Set(new.purchase_date),
            purchase_price: Set(new.purchase_price),
            purchase_location: Set(new.purchase_location),
            notes: Set(new.notes),
            rating: Set(new.rating),
            is_favorite: Set(new.is_favorite),
            custom_tags: Set(Some(tags)),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let inserted = model.insert(&self.conn).await?;
        info!(user_id, polish_id = inserted.id, "Added polish");

        self.get(user_id, inserted.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("polish row missing after insert"))
    }

    pub async fn update(
        &self,
        user_id: i32,
        id: i32,
        update: PolishUpdate,
    ) -> anyhow::Result<Option<PolishListRow>> {
        let Some(existing) = Polishes::find_by_id(id)
            .filter(polishes::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await?
        else {
            return Ok(None);
        };

        let mut active: polishes::ActiveModel = existing.into();

        if let Some(brand_id) = update.brand_id {
            active.brand_id = Set(Some(brand_id));
        }
        if let Some(name) = update.name {
            active.name = Set(name);
        }
        if let Some(color_hex) = update.color_hex {
            active.color_hex = Set(Some(color_hex));
        }
        if let Some(finish_type) = update.finish_type {
            active.finish_type = Set(finish_type);
        }
        if let Some(collection_name) = update.collection_name {
            active.collection_name = Set(Some(collection_name));
        }
        if let Some(purchase_date) = update.purchase_date {
            active.purchase_date = Set(Some(purchase_date));
        }
        if let Some(purchase_price) = update.purchase_price {
            active.purchase_price = Set(Some(purchase_price));
        }
        if let Some(purchase_location) = update.purchase_location {
            active.purchase_location = Set(Some(purchase_location));
        }
        if let Some(notes) = update.notes {
            active.notes = Set(Some(notes));
        }
        if let Some(rating) = update.rating {
            active.rating = Set(Some(rating));
        }
        if let Some(is_favorite) = update.is_favorite {
            active.is_favorite = Set(is_favorite);
        }
        if let Some(tags) = update.custom_tags {
            active.custom_tags = Set(Some(serde_json::to_string(&tags)?));
        }
        if let Some(url) = update.bottle_image_url {
            active.bottle_image_url = Set(Some(url));
        }
        if let Some(url) = update.swatch_image_url {
            active.swatch_image_url = Set(Some(url));
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active.update(&self.conn).await?;
        self.get(user_id, updated.id).await
    }

    /// Removes the polish together with its usage history and any
    /// collection memberships, atomically.
    pub async fn delete(&self, user_id: i32, id: i32) -> anyhow::Result<bool> {
        if !self.exists(user_id, id).await? {
            return Ok(false);
        }

        let txn = self.conn.begin().await?;

        PolishUsage::delete_many()
            .filter(polish_usage::Column::PolishId.eq(id))
            .exec(&txn)
            .await?;

        CollectionPolishes::delete_many()
            .filter(crate::entities::collection_polishes::Column::PolishId.eq(id))
            .exec(&txn)
            .await?;

        Polishes::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        info!(user_id, polish_id = id, "Deleted polish");
        Ok(true)
    }

    /// Logs one wear of a polish. Returns `None` when the polish does
    /// not belong to the user.
    pub async fn record_usage(
        &self,
        user_id: i32,
        polish_id: i32,
        usage: NewUsage,
    ) -> anyhow::Result<Option<polish_usage::Model>> {
        if !self.exists(user_id, polish_id).await? {
            return Ok(None);
        }

        let model = polish_usage::ActiveModel {
            polish_id: Set(polish_id),
            user_id: Set(user_id),
            used_at: Set(usage
                .used_at
                .unwrap_or_else(|| chrono::Utc::now().to_rfc3339())),
            occasion: Set(usage.occasion),
            notes: Set(usage.notes),
            ..Default::default()
        };

        let inserted = model.insert(&self.conn).await?;
        Ok(Some(inserted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_field_whitelist() {
        assert_eq!(SortField::parse("name"), SortField::Name);
        assert_eq!(SortField::parse("brand"), SortField::Brand);
        assert_eq!(SortField::parse("purchase_date"), SortField::PurchaseDate);
        assert_eq!(SortField::parse("last_used"), SortField::LastUsed);
        assert_eq!(SortField::parse("created_at"), SortField::CreatedAt);
    }

    #[test]
    fn test_sort_field_fallback() {
        assert_eq!(SortField::parse("price; DROP TABLE"), SortField::CreatedAt);
        assert_eq!(SortField::parse(""), SortField::CreatedAt);
    }

    #[test]
    fn test_sort_order_defaults_to_desc() {
        assert_eq!(SortOrder::parse("asc"), SortOrder::Asc);
        assert_eq!(SortOrder::parse("ASC"), SortOrder::Asc);
        assert_eq!(SortOrder::parse("desc"), SortOrder::Desc);
        assert_eq!(SortOrder::parse("sideways"), SortOrder::Desc);
    }

    #[test]
    fn test_update_is_empty() {
        assert!(PolishUpdate::default().is_empty());

        let update = PolishUpdate {
            rating: Some(5),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
