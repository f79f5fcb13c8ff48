use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Starter set of well-known brands so fresh installs have something
/// to pick from. Users can still file polishes under no brand at all.
const SEED_BRANDS: &[(&str, &str)] = &[
    ("OPI", "https://www.opi.com"),
    ("Essie", "https://www.essie.com"),
    ("Sally Hansen", "https://www.sallyhansen.com"),
    ("China Glaze", "https://www.chinaglaze.com"),
    ("Zoya", "https://www.zoya.com"),
    ("Holo Taco", "https://www.holotaco.com"),
    ("ILNP", "https://www.ilnp.com"),
    ("Cirque Colors", "https://www.cirquecolors.com"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_provider_identity")
                    .table(Users)
                    .col(crate::entities::users::Column::Provider)
                    .col(crate::entities::users::Column::ProviderId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Brands)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Polishes)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_polishes_user")
                    .table(Polishes)
                    .col(crate::entities::polishes::Column::UserId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_polishes_brand")
                    .table(Polishes)
                    .col(crate::entities::polishes::Column::BrandId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(PolishUsage)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_polish_usage_polish")
                    .table(PolishUsage)
                    .col(crate::entities::polish_usage::Column::PolishId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_polish_usage_user")
                    .table(PolishUsage)
                    .col(crate::entities::polish_usage::Column::UserId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(CustomCollections)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_custom_collections_user")
                    .table(CustomCollections)
                    .col(crate::entities::custom_collections::Column::UserId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(CollectionPolishes)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        let now = chrono::Utc::now().to_rfc3339();
        for (name, website) in SEED_BRANDS {
            let insert = sea_orm_migration::sea_query::Query::insert()
                .into_table(Brands)
                .columns([
                    crate::entities::brands::Column::Name,
                    crate::entities::brands::Column::WebsiteUrl,
                    crate::entities::brands::Column::CreatedAt,
                ])
                .values_panic([(*name).into(), (*website).into(), now.clone().into()])
                .to_owned();

            manager.exec_stmt(insert).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CollectionPolishes).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CustomCollections).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PolishUsage).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Polishes).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Brands).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}
