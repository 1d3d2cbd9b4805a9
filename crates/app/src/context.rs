//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    auth::{AuthService, PgAuthService},
    database::{self, Db},
    domain::{
        carts::{ActiveCartsService, DraftCartsService, PgActiveCartsService, PgDraftCartsService},
        offers::{OffersService, PgOffersService},
        orders::{OrdersService, PgOrdersService},
        products::{PgProductsService, ProductsService},
        reconciliation::{PgReconciliationService, ReconciliationMode, ReconciliationService},
        users::{PgUsersService, UsersService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

#[derive(Clone)]
pub struct AppContext {
    pub products: Arc<dyn ProductsService>,
    pub offers: Arc<dyn OffersService>,
    pub active_carts: Arc<dyn ActiveCartsService>,
    pub draft_carts: Arc<dyn DraftCartsService>,
    pub orders: Arc<dyn OrdersService>,
    pub reconciliation: Arc<dyn ReconciliationService>,
    pub users: Arc<dyn UsersService>,
    pub auth: Arc<dyn AuthService>,
}

impl AppContext {
    /// Build application context from a database URL.
    ///
    /// `mode` decides whether catalog writes reconcile carts in their own
    /// transaction or leave a job for the worker.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_database_url(
        url: &str,
        mode: ReconciliationMode,
    ) -> Result<Self, AppInitError> {
        let pool = database::connect_with_retry(url)
            .await
            .map_err(AppInitError::Database)?;

        let db = Db::new(pool.clone());

        Ok(Self {
            products: Arc::new(PgProductsService::new(db.clone(), mode)),
            offers: Arc::new(PgOffersService::new(db.clone(), mode)),
            active_carts: Arc::new(PgActiveCartsService::new(db.clone())),
            draft_carts: Arc::new(PgDraftCartsService::new(db.clone())),
            orders: Arc::new(PgOrdersService::new(db.clone(), mode)),
            reconciliation: Arc::new(PgReconciliationService::new(db.clone())),
            users: Arc::new(PgUsersService::new(db)),
            auth: Arc::new(PgAuthService::new(pool)),
        })
    }
}
