use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::analytics::{
    AnalyticsSummary, BrandDistributionRow, CollectionAnalytics, ColorFamilyCount,
    FinishDistributionRow, MonthCount, OverviewRow,
};
pub use repositories::brand::BrandRow;
pub use repositories::collection::{CollectionMemberRow, CollectionRow, CollectionUpdate};
pub use repositories::polish::{
    NewPolish, NewUsage, PolishFilter, PolishListRow, PolishPage, PolishUpdate, SortField,
    SortOrder,
};
pub use repositories::user::NewUser;

use repositories::analytics::AnalyticsRepository;
use repositories::brand::BrandRepository;
use repositories::collection::CollectionRepository;
use repositories::polish::PolishRepository;
use repositories::user::UserRepository;

use crate::entities::{custom_collections, polish_usage, users};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if let Some(path_str) = db_url.strip_prefix("sqlite:")
            && !path_str.contains(":memory:")
        {
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut options = ConnectOptions::new(db_url.to_string());
        options
            .max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(8))
            .acquire_timeout(Duration::from_secs(8))
            .sqlx_logging(false);

        let conn = Database::connect(options).await?;

        info!("Running database migrations");
        migrator::Migrator::up(&conn, None).await?;

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        self.conn
            .execute(Statement::from_string(
                self.conn.get_database_backend(),
                "SELECT 1".to_string(),
            ))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> UserRepository {
        UserRepository::new(self.conn.clone())
    }

    fn brand_repo(&self) -> BrandRepository {
        BrandRepository::new(self.conn.clone())
    }

    fn polish_repo(&self) -> PolishRepository {
        PolishRepository::new(self.conn.clone())
    }

    fn collection_repo(&self) -> CollectionRepository {
        CollectionRepository::new(self.conn.clone())
    }

    fn analytics_repo(&self) -> AnalyticsRepository {
        AnalyticsRepository::new(self.conn.clone())
    }

    // Users

    pub async fn find_user(&self, id: i32) -> Result<Option<users::Model>> {
        self.user_repo().find(id).await
    }

    pub async fn get_or_create_user(&self, new_user: NewUser) -> Result<users::Model> {
        self.user_repo().get_or_create(new_user).await
    }

    // Brands

    pub async fn list_brands(&self, user_id: i32) -> Result<Vec<BrandRow>> {
        self.brand_repo().list_with_counts(user_id).await
    }

    pub async fn get_brand(&self, id: i32) -> Result<Option<crate::entities::brands::Model>> {
        self.brand_repo().get(id).await
    }

    // Polishes

    pub async fn list_polishes(
        &self,
        user_id: i32,
        filter: &PolishFilter,
        sort: SortField,
        order: SortOrder,
        limit: u64,
        offset: u64,
    ) -> Result<PolishPage> {
        self.polish_repo()
            .list(user_id, filter, sort, order, limit, offset)
            .await
    }

    pub async fn get_polish(&self, user_id: i32, id: i32) -> Result<Option<PolishListRow>> {
        self.polish_repo().get(user_id, id).await
    }

    pub async fn create_polish(&self, user_id: i32, new: NewPolish) -> Result<PolishListRow> {
        self.polish_repo().create(user_id, new).await
    }

    pub async fn update_polish(
        &self,
        user_id: i32,
        id: i32,
        update: PolishUpdate,
    ) -> Result<Option<PolishListRow>> {
        self.polish_repo().update(user_id, id, update).await
    }

    pub async fn delete_polish(&self, user_id: i32, id: i32) -> Result<bool> {
        self.polish_repo().delete(user_id, id).await
    }

    pub async fn polish_exists(&self, user_id: i32, id: i32) -> Result<bool> {
        self.polish_repo().exists(user_id, id).await
    }

    pub async fn record_usage(
        &self,
        user_id: i32,
        polish_id: i32,
        usage: NewUsage,
    ) -> Result<Option<polish_usage::Model>> {
        self.polish_repo().record_usage(user_id, polish_id, usage).await
    }

    // Collections

    pub async fn list_collections(&self, user_id: i32) -> Result<Vec<CollectionRow>> {
        self.collection_repo().list(user_id).await
    }

    pub async fn get_collection(
        &self,
        user_id: i32,
        id: i32,
    ) -> Result<Option<custom_collections::Model>> {
        self.collection_repo().get(user_id, id).await
    }

    pub async fn collection_members(&self, collection_id: i32) -> Result<Vec<CollectionMemberRow>> {
        self.collection_repo().members(collection_id).await
    }

    pub async fn create_collection(
        &self,
        user_id: i32,
        name: String,
        description: Option<String>,
        color: Option<String>,
    ) -> Result<custom_collections::Model> {
        self.collection_repo()
            .create(user_id, name, description, color)
            .await
    }

    pub async fn update_collection(
        &self,
        user_id: i32,
        id: i32,
        update: CollectionUpdate,
    ) -> Result<Option<custom_collections::Model>> {
        self.collection_repo().update(user_id, id, update).await
    }

    pub async fn delete_collection(&self, user_id: i32, id: i32) -> Result<bool> {
        self.collection_repo().delete(user_id, id).await
    }

    pub async fn add_polish_to_collection(&self, collection_id: i32, polish_id: i32) -> Result<()> {
        self.collection_repo()
            .add_polish(collection_id, polish_id)
            .await
    }

    pub async fn remove_polish_from_collection(
        &self,
        collection_id: i32,
        polish_id: i32,
    ) -> Result<bool> {
        self.collection_repo()
            .remove_polish(collection_id, polish_id)
            .await
    }

    // Analytics

    pub async fn collection_analytics(&self, user_id: i32) -> Result<CollectionAnalytics> {
        self.analytics_repo().collection_analytics(user_id).await
    }

    pub async fn analytics_summary(&self, user_id: i32) -> Result<AnalyticsSummary> {
        self.analytics_repo().summary(user_id).await
    }

}
