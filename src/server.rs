//! Process runtime: wires storage, services and the HTTP API together and
//! owns their shutdown.

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::application::{bootstrap, DirectorySettings, IdentityService, UserDirectory};
use crate::config::{AppConfig, LogFormat};
use crate::domain::{DomainError, RepositoryProvider};
use crate::infrastructure::database::migrator::Migrator;
use crate::infrastructure::database::repositories::SeaOrmRepositoryProvider;
use crate::infrastructure::init_database;
use crate::interfaces::http::create_api_router;
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Bootstrap failed: {0}")]
    Bootstrap(#[from] DomainError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to install metrics recorder: {0}")]
    Metrics(String),
}

pub struct ServerOptions {
    pub config: AppConfig,
    /// Apply pending migrations before serving.
    pub auto_migrate: bool,
    /// Create `[admin]` when the users table is empty.
    pub create_default_admin: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
            create_default_admin: true,
        }
    }
}

/// A running directory server.
///
/// ```rust,no_run
/// use user_directory::server::{ServerHandle, ServerOptions};
///
/// # async fn run() -> Result<(), user_directory::server::ServerError> {
/// let handle = ServerHandle::start(ServerOptions::default()).await?;
/// handle.install_signal_handler();
/// handle.shutdown_signal().wait().await;
/// handle.wait().await;
/// # Ok(())
/// # }
/// ```
pub struct ServerHandle {
    pub repos: Arc<dyn RepositoryProvider>,
    pub directory: Arc<UserDirectory>,
    pub identity: Arc<IdentityService>,
    pub config: AppConfig,
    /// Bound address; reflects the real port when `api_port` is 0.
    pub api_addr: SocketAddr,

    db: DatabaseConnection,
    shutdown: ShutdownCoordinator,
    api_task: JoinHandle<()>,
}

/// The process-wide recorder can be installed once; later calls (tests
/// starting several servers) share the first outcome.
fn prometheus_handle() -> Result<PrometheusHandle, ServerError> {
    static HANDLE: OnceLock<Result<PrometheusHandle, String>> = OnceLock::new();

    HANDLE
        .get_or_init(|| {
            PrometheusBuilder::new()
                .install_recorder()
                .map_err(|e| e.to_string())
        })
        .clone()
        .map_err(ServerError::Metrics)
}

async fn open_database(config: &AppConfig, migrate: bool) -> Result<DatabaseConnection, ServerError> {
    let db = init_database(&config.database.to_database_config()).await?;
    if migrate {
        Migrator::up(&db, None).await?;
        info!("Database schema up to date");
    } else {
        warn!("Skipping migrations; the schema must already be current");
    }
    Ok(db)
}

async fn bind(config: &AppConfig) -> Result<(TcpListener, SocketAddr), ServerError> {
    let addr = format!("{}:{}", config.server.api_host, config.server.api_port);
    let bind_error = |source| ServerError::Bind {
        addr: addr.clone(),
        source,
    };
    let listener = TcpListener::bind(&addr).await.map_err(bind_error)?;
    let local = listener.local_addr().map_err(bind_error)?;
    Ok((listener, local))
}

impl ServerHandle {
    /// Brings the directory up in order: metrics recorder, database and
    /// migrations, role/admin seeding, services, then the HTTP listener.
    pub async fn start(opts: ServerOptions) -> Result<Self, ServerError> {
        let config = opts.config;
        let prometheus = prometheus_handle()?;

        let db = open_database(&config, opts.auto_migrate).await?;
        let repos: Arc<dyn RepositoryProvider> =
            Arc::new(SeaOrmRepositoryProvider::new(db.clone()));

        let seeded = bootstrap(repos.as_ref(), &config, opts.create_default_admin).await?;
        info!(
            roles = seeded.roles.len(),
            admin_created = seeded.admin_created,
            "Directory seeded"
        );

        let directory = Arc::new(UserDirectory::new(
            repos.clone(),
            DirectorySettings::from(&config),
        ));
        let identity = Arc::new(IdentityService::new(
            repos.clone(),
            config.security.jwt_config(),
        ));

        let router = create_api_router(db.clone(), directory.clone(), identity.clone(), prometheus);
        let (listener, api_addr) = bind(&config).await?;

        let shutdown = ShutdownCoordinator::new(config.server.shutdown_timeout);
        let stop = shutdown.signal();
        let api_task = tokio::spawn(async move {
            let served = axum::serve(listener, router)
                .with_graceful_shutdown(async move { stop.wait().await })
                .await;
            if let Err(e) = served {
                error!("HTTP server error: {}", e);
            }
        });

        info!(
            "User directory listening on http://{} (docs at /docs/)",
            api_addr
        );

        Ok(Self {
            repos,
            directory,
            identity,
            config,
            api_addr,
            db,
            shutdown,
            api_task,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Trigger shutdown on SIGINT / SIGTERM.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Lets in-flight requests finish (bounded by `server.shutdown_timeout`)
    /// and closes the pool.
    pub async fn wait(self) {
        let api_task = self.api_task;
        let drained = self
            .shutdown
            .drain(async move {
                if let Err(e) = api_task.await {
                    error!("HTTP server task panicked: {}", e);
                }
            })
            .await;
        if !drained {
            warn!("Shutdown timeout reached; in-flight requests were cut off");
        }

        match self.db.close().await {
            Ok(()) => info!("User directory stopped"),
            Err(e) => warn!("Error closing database pool: {}", e),
        }
    }

    pub async fn shutdown(self) {
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

/// Installs the global subscriber. `RUST_LOG`, when set, overrides
/// `logging.level`.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.logging.format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.server.api_host = "127.0.0.1".into();
        config.server.api_port = 0;
        config.server.shutdown_timeout = 5;
        config.database.url = Some("sqlite::memory:".into());
        config.security.bcrypt_cost = 4;
        config
    }

    #[tokio::test]
    async fn starts_seeds_and_shuts_down() {
        let handle = ServerHandle::start(ServerOptions {
            config: test_config(),
            ..ServerOptions::default()
        })
        .await
        .unwrap();

        assert!(handle.is_running());
        assert_ne!(handle.api_addr.port(), 0);
        assert_eq!(handle.repos.users().count_all().await.unwrap(), 1);

        let stream = tokio::net::TcpStream::connect(handle.api_addr).await;
        assert!(stream.is_ok());
        drop(stream);

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn admin_creation_can_be_skipped() {
        let handle = ServerHandle::start(ServerOptions {
            config: test_config(),
            auto_migrate: true,
            create_default_admin: false,
        })
        .await
        .unwrap();

        assert_eq!(handle.repos.users().count_all().await.unwrap(), 0);
        handle.shutdown().await;
    }
}
