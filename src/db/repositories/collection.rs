use crate::entities::{brands, collection_polishes, custom_collections, polishes, prelude::*};
use sea_orm::sea_query::{Alias, Expr, JoinType, OnConflict, Order, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, QueryFilter, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::info;

pub struct CollectionRepository {
    conn: DatabaseConnection,
}

/// Collection with its member count, for the overview listing.
#[derive(Debug, Clone, FromQueryResult, Serialize)]
pub struct CollectionRow {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub polish_count: i64,
}

/// Member polish joined with its brand, plus when it was added.
#[derive(Debug, Clone, FromQueryResult, Serialize)]
pub struct CollectionMemberRow {
    pub id: i32,
    pub brand_id: Option<i32>,
    pub name: String,
    pub color_hex: Option<String>,
    pub finish_type: String,
    pub rating: Option<i32>,
    pub is_favorite: bool,
    pub bottle_image_url: Option<String>,
    pub swatch_image_url: Option<String>,
    pub brand_name: Option<String>,
    pub added_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct CollectionUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

impl CollectionUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.color.is_none()
    }
}

impl CollectionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self, user_id: i32) -> anyhow::Result<Vec<CollectionRow>> {
        let stmt = Query::select()
            .columns([
                (CustomCollections, custom_collections::Column::Id),
                (CustomCollections, custom_collections::Column::UserId),
                (CustomCollections, custom_collections::Column::Name),
                (CustomCollections, custom_collections::Column::Description),
                (CustomCollections, custom_collections::Column::Color),
                (CustomCollections, custom_collections::Column::CreatedAt),
                (CustomCollections, custom_collections::Column::UpdatedAt),
            ])
            .expr_as(
                Expr::col((CollectionPolishes, collection_polishes::Column::PolishId)).count(),
                Alias::new("polish_count"),
            )
            .from(CustomCollections)
            .join(
                JoinType::LeftJoin,
                CollectionPolishes,
                Expr::col((CollectionPolishes, collection_polishes::Column::CollectionId))
                    .equals((CustomCollections, custom_collections::Column::Id)),
            )
            .cond_where(
                Condition::all().add(
                    Expr::col((CustomCollections, custom_collections::Column::UserId)).eq(user_id),
                ),
            )
            .add_group_by([
                Expr::col((CustomCollections, custom_collections::Column::Id)).into(),
                Expr::col((CustomCollections, custom_collections::Column::UserId)).into(),
                Expr::col((CustomCollections, custom_collections::Column::Name)).into(),
                Expr::col((CustomCollections, custom_collections::Column::Description)).into(),
                Expr::col((CustomCollections, custom_collections::Column::Color)).into(),
                Expr::col((CustomCollections, custom_collections::Column::CreatedAt)).into(),
                Expr::col((CustomCollections, custom_collections::Column::UpdatedAt)).into(),
            ])
            .order_by(
                (CustomCollections, custom_collections::Column::CreatedAt),
                Order::Desc,
            )
            .to_owned();

        let backend = self.conn.get_database_backend();
        let rows = CollectionRow::find_by_statement(backend.build(&stmt))
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn get(
        &self,
        user_id: i32,
        id: i32,
    ) -> anyhow::Result<Option<custom_collections::Model>> {
        let collection = CustomCollections::find_by_id(id)
            .filter(custom_collections::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await?;
        Ok(collection)
    }

    pub async fn members(&self, collection_id: i32) -> anyhow::Result<Vec<CollectionMemberRow>> {
        let stmt = Query::select()
            .columns([
                (Polishes, polishes::Column::Id),
                (Polishes, polishes::Column::BrandId),
                (Polishes, polishes::Column::Name),
                (Polishes, polishes::Column::ColorHex),
                (Polishes, polishes::Column::FinishType),
                (Polishes, polishes::Column::Rating),
                (Polishes, polishes::Column::IsFavorite),
                (Polishes, polishes::Column::BottleImageUrl),
                (Polishes, polishes::Column::SwatchImageUrl),
            ])
            .expr_as(
                Expr::col((Brands, brands::Column::Name)),
                Alias::new("brand_name"),
            )
            .column((CollectionPolishes, collection_polishes::Column::AddedAt))
            .from(CollectionPolishes)
            .join(
                JoinType::InnerJoin,
                Polishes,
                Expr::col((CollectionPolishes, collection_polishes::Column::PolishId))
                    .equals((Polishes, polishes::Column::Id)),
            )
            .join(
                JoinType::LeftJoin,
                Brands,
                Expr::col((Polishes, polishes::Column::BrandId))
                    .equals((Brands, brands::Column::Id)),
            )
            .cond_where(
                Condition::all().add(
                    Expr::col((CollectionPolishes, collection_polishes::Column::CollectionId))
                        .eq(collection_id),
                ),
            )
            .order_by(
                (CollectionPolishes, collection_polishes::Column::AddedAt),
                Order::Desc,
            )
            .to_owned();

        let backend = self.conn.get_database_backend();
        let rows = CollectionMemberRow::find_by_statement(backend.build(&stmt))
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn create(
        &self,
        user_id: i32,
        name: String,
        description: Option<String>,
        color: Option<String>,
    ) -> anyhow::Result<custom_collections::Model> {
        let now = chrono::Utc::now().to_rfc3339();
        let model = custom_collections::ActiveModel {
            user_id: Set(user_id),
            name: Set(name),
            description: Set(description),
            color: Set(color),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let inserted = model.insert(&self.conn).await?;
        info!(user_id, collection_id = inserted.id, "Created collection");
        Ok(inserted)
    }

    pub async fn update(
        &self,
        user_id: i32,
        id: i32,
        update: CollectionUpdate,
    ) -> anyhow::Result<Option<custom_collections::Model>> {
        let Some(existing) = self.get(user_id, id).await? else {
            return Ok(None);
        };

        let mut active: custom_collections::ActiveModel = existing.into();
        if let Some(name) = update.name {
            active.name = Set(name);
        }
        if let Some(description) = update.description {
            active.description = Set(Some(description));
        }
        if let Some(color) = update.color {
            active.color = Set(Some(color));
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active.update(&self.conn).await?;
        Ok(Some(updated))
    }

    /// Removes the collection and its membership rows. Member polishes
    /// themselves are untouched.
    pub async fn delete(&self, user_id: i32, id: i32) -> anyhow::Result<bool> {
        if self.get(user_id, id).await?.is_none() {
            return Ok(false);
        }

        let txn = self.conn.begin().await?;

        CollectionPolishes::delete_many()
            .filter(collection_polishes::Column::CollectionId.eq(id))
            .exec(&txn)
            .await?;

        CustomCollections::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        info!(user_id, collection_id = id, "Deleted collection");
        Ok(true)
    }

    /// Adding an existing member is a quiet no-op; the composite key
    /// plus `ON CONFLICT DO NOTHING` keeps it idempotent.
    pub async fn add_polish(&self, collection_id: i32, polish_id: i32) -> anyhow::Result<()> {
        let model = collection_polishes::ActiveModel {
            collection_id: Set(collection_id),
            polish_id: Set(polish_id),
            added_at: Set(chrono::Utc::now().to_rfc3339()),
        };

        CollectionPolishes::insert(model)
            .on_conflict(
                OnConflict::columns([
                    collection_polishes::Column::CollectionId,
                    collection_polishes::Column::PolishId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        Ok(())
    }

    pub async fn remove_polish(&self, collection_id: i32, polish_id: i32) -> anyhow::Result<bool> {
        let result = CollectionPolishes::delete_many()
            .filter(collection_polishes::Column::CollectionId.eq(collection_id))
            .filter(collection_polishes::Column::PolishId.eq(polish_id))
            .exec(&self.conn)
            .await?;

        Ok(result.rows_affected > 0)
    }
}
