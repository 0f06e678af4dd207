//! Application bootstrap.
//!
//! Builds the engine services on top of the `PostgreSQL` store and the
//! collaborator implementations, and exposes the shared state the HTTP
//! layer serves from.

use crate::config::Config;
use crate::notifications::LoggingNotifier;
use crate::payment_gateway::MockPaymentGateway;
use crate::server::{build_router, AppState};
use axum::Router;
use meetlocal_core::environment::{Clock, SystemClock};
use meetlocal_core::notification::Notifier;
use meetlocal_core::payment::PaymentGateway;
use meetlocal_core::store::AdmissionStore;
use meetlocal_core::{
    AdmissionEvaluator, CancellationService, CapacityMonitor, PaymentService, RegistrationService,
    WaitlistManager,
};
use meetlocal_postgres::PostgresStore;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Bootstrap errors
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// Database connection failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Database migration failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// The assembled MeetLocal application
pub struct App {
    state: AppState,
    config: Config,
}

impl App {
    /// Connects the database, runs migrations and wires the services.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError`] if the database is unreachable or the
    /// schema cannot be migrated.
    pub async fn new(config: Config) -> Result<Self, BootstrapError> {
        tracing::info!(url = %config.postgres.url, "Connecting to PostgreSQL");
        let pool = meetlocal_postgres::connect(
            &config.postgres.url,
            config.postgres.max_connections,
            Duration::from_secs(config.postgres.connect_timeout),
        )
        .await?;

        tracing::info!("Running database migrations");
        meetlocal_postgres::run_migrations(&pool).await?;

        let store: Arc<dyn AdmissionStore> = Arc::new(PostgresStore::new(pool.clone()));
        let state = build_state(
            store,
            MockPaymentGateway::shared(),
            LoggingNotifier::shared(),
            Arc::new(SystemClock),
            &config,
            pool,
        );
        Ok(Self { state, config })
    }

    /// The configured HTTP router
    #[must_use]
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Shared application state
    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// The loaded configuration
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }
}

/// Wires the engine services into the shared handler state.
///
/// Split out of [`App::new`] so alternative store/collaborator
/// implementations can drive the same wiring.
#[must_use]
pub fn build_state(
    store: Arc<dyn AdmissionStore>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    config: &Config,
    pool: PgPool,
) -> AppState {
    let admission_policy = config.admission_policy();
    let time_zone = config.venue_time_zone();
    let evaluator = AdmissionEvaluator::new(admission_policy.clone());

    let registration = Arc::new(RegistrationService::new(
        Arc::clone(&store),
        evaluator.clone(),
        Arc::clone(&clock),
        time_zone,
    ));
    let monitor = Arc::new(CapacityMonitor::new(
        Arc::clone(&store),
        Arc::clone(&notifier),
        admission_policy.capacity_warning_percent,
    ));
    let payments = Arc::new(PaymentService::new(
        Arc::clone(&store),
        Arc::clone(&gateway),
        Arc::clone(&notifier),
        evaluator,
        monitor,
        Arc::clone(&clock),
        time_zone,
    ));
    let waitlist = Arc::new(WaitlistManager::new(
        Arc::clone(&store),
        Arc::clone(&notifier),
        admission_policy,
    ));
    let cancellation = Arc::new(CancellationService::new(
        Arc::clone(&store),
        gateway,
        notifier,
        Arc::clone(&waitlist),
        Arc::clone(&clock),
        config.cancellation_policy(),
    ));

    AppState { store, registration, payments, cancellation, waitlist, clock, time_zone, pool }
}
