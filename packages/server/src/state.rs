use std::sync::Arc;

use quire_common::BlobStore;
use sea_orm::DatabaseConnection;

use crate::catalog::{SeaContentCatalog, SeaPublicationCatalog};
use crate::config::AppConfig;
use crate::encryption::Encrypter;
use crate::pipeline::PublicationService;
use crate::registry::RegistrationCoordinator;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub blob_store: Arc<dyn BlobStore>,
    pub registry: Arc<RegistrationCoordinator>,
    pub publications: Arc<PublicationService>,
}

impl AppState {
    /// Wire the catalogs, coordinator and publication service over `db`.
    pub fn new(
        db: DatabaseConnection,
        config: AppConfig,
        blob_store: Arc<dyn BlobStore>,
        encrypter: Arc<dyn Encrypter>,
    ) -> Self {
        let registry = Arc::new(RegistrationCoordinator::new(
            blob_store.clone(),
            Arc::new(SeaContentCatalog::new(db.clone())),
        ));
        let publications = Arc::new(PublicationService::new(
            registry.clone(),
            Arc::new(SeaPublicationCatalog::new(db.clone())),
            encrypter,
            config.publication.master_repository.clone(),
            config.encryption.work_dir.clone(),
            config.storage.max_blob_size,
        ));

        Self {
            db,
            config,
            blob_store,
            registry,
            publications,
        }
    }
}
