use crate::entities::{prelude::*, users};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tracing::info;

pub struct UserRepository {
    conn: DatabaseConnection,
}

/// Profile resolved from an identity provider (or the dev sentinel).
#[derive(Debug, Clone)]
pub struct NewUser {
    pub provider: String,
    pub provider_id: String,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

impl NewUser {
    /// The single local-development account.
    #[must_use]
    pub fn dev_sentinel() -> Self {
        Self {
            provider: "dev".to_string(),
            provider_id: "dev-user-id".to_string(),
            email: "dev@localhost".to_string(),
            name: "Dev User".to_string(),
            avatar_url: None,
        }
    }
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn find(&self, id: i32) -> anyhow::Result<Option<users::Model>> {
        let user = Users::find_by_id(id).one(&self.conn).await?;
        Ok(user)
    }

    pub async fn find_by_identity(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> anyhow::Result<Option<users::Model>> {
        let user = Users::find()
            .filter(users::Column::Provider.eq(provider))
            .filter(users::Column::ProviderId.eq(provider_id))
            .one(&self.conn)
            .await?;
        Ok(user)
    }

    /// Resolves a provider identity to a user row, creating it on first
    /// login. Safe against concurrent first logins: the insert defers to
    /// the unique `(provider, provider_id)` index and whoever won.
    pub async fn get_or_create(&self, new_user: NewUser) -> anyhow::Result<users::Model> {
        if let Some(existing) = self
            .find_by_identity(&new_user.provider, &new_user.provider_id)
            .await?
        {
            return Ok(existing);
        }

        let now = chrono::Utc::now().to_rfc3339();
        let model = users::ActiveModel {
            email: Set(new_user.email.clone()),
            name: Set(new_user.name.clone()),
            avatar_url: Set(new_user.avatar_url.clone()),
            provider: Set(new_user.provider.clone()),
            provider_id: Set(new_user.provider_id.clone()),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        Users::insert(model)
            .on_conflict(
                OnConflict::columns([users::Column::Provider, users::Column::ProviderId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await?;

        info!(
            provider = %new_user.provider,
            email = %new_user.email,
            "Registered user"
        );

        self.find_by_identity(&new_user.provider, &new_user.provider_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("user row missing after upsert"))
    }
}
