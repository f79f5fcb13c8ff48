use std::sync::Arc;
use tokio::sync::RwLock;

use crate::clients::oauth::OAuthClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::image::ImageService;

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub images: Arc<ImageService>,

    pub oauth: Arc<OAuthClient>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_url,
            config.general.max_connections,
            1,
        )
        .await?;

        let images = Arc::new(ImageService::new(config.uploads.uploads_path.clone()));
        let oauth = Arc::new(OAuthClient::new(&config.auth));

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            images,
            oauth,
        })
    }
}
