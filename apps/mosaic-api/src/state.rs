use std::sync::Arc;

use mosaic_service::MosaicService;
use mosaic_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<MosaicService>,
}
impl AppState {
	pub async fn new(config: mosaic_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let service = MosaicService::new(config, db);

		Ok(Self { service: Arc::new(service) })
	}
}
