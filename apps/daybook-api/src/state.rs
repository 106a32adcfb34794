use std::sync::Arc;

use daybook_service::DaybookService;
use daybook_storage::db::Db;
use daybook_vault::Vault;

use crate::live::ConnectionRegistry;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<DaybookService>,
	pub live: Arc<ConnectionRegistry>,
}
impl AppState {
	pub async fn new(config: daybook_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let vault = Vault::new(&config.vault);
		let live = Arc::new(ConnectionRegistry::new());
		let service = DaybookService::new(config, db, vault, live.clone());

		Ok(Self { service: Arc::new(service), live })
	}

	/// Wires an already built service. The registry must be the service's live update sink for
	/// broadcasts to reach `/ws` clients.
	pub fn from_parts(service: Arc<DaybookService>, live: Arc<ConnectionRegistry>) -> Self {
		Self { service, live }
	}
}
