//! ServerBuilder for fluent API to build HTTP servers

use super::router::{build_product_routes, health_routes};
use crate::config::AppConfig;
use crate::core::error::{ConfigError, GridError, GridResult};
use crate::core::store::DataStore;
use crate::products::{AppState, Product};
use crate::storage::open_product_store;
use axum::Router;
use axum::http::Method;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Builder for the grid backend's HTTP server
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_store(InMemoryStore::<Product>::new())
///     .build()?;
/// ```
pub struct ServerBuilder {
    store: Option<Arc<dyn DataStore<Product>>>,
    config: AppConfig,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder with the default configuration
    pub fn new() -> Self {
        Self {
            store: None,
            config: AppConfig::default(),
            custom_routes: Vec::new(),
        }
    }

    /// Create a builder from a configuration, opening (and seeding) its store
    pub async fn from_config(config: AppConfig) -> GridResult<Self> {
        let store = open_product_store(&config.store).await?;
        Ok(Self {
            store: Some(store),
            config,
            custom_routes: Vec::new(),
        })
    }

    /// Set the product store (required)
    pub fn with_store(mut self, store: impl DataStore<Product> + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Set an already shared product store
    pub fn with_shared_store(mut self, store: Arc<dyn DataStore<Product>>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the configuration; the store is left as is
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Add custom routes to the server
    ///
    /// # Example
    ///
    /// ```ignore
    /// let extra = Router::new().route("/version", get(version_handler));
    ///
    /// ServerBuilder::new()
    ///     .with_store(store)
    ///     .with_custom_routes(extra)
    ///     .build()?;
    /// ```
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Build the final router
    ///
    /// This generates:
    /// - Health routes
    /// - Product grid routes
    /// - Custom routes
    ///
    /// wrapped in request tracing and, when `server.cors` is set, a permissive
    /// CORS layer.
    pub fn build(self) -> GridResult<Router> {
        let store = self.store.ok_or_else(|| ConfigError::MissingField {
            field: "store".to_string(),
            context: "ServerBuilder (call .with_store())".to_string(),
        })?;

        let state = AppState::new(store, self.config.paging.clone());
        let mut app = health_routes().merge(build_product_routes(state));
        for custom_router in self.custom_routes {
            app = app.merge(custom_router);
        }

        if self.config.server.cors {
            app = app.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(vec![Method::GET, Method::POST])
                    .allow_headers(Any),
            );
        }

        Ok(app.layer(TraceLayer::new_for_http()))
    }

    /// Serve the application with graceful shutdown
    ///
    /// This will:
    /// - Bind to `server.bind` from the configuration
    /// - Start serving requests
    /// - Handle SIGTERM and SIGINT (Ctrl+C) for graceful shutdown
    ///
    /// # Example
    ///
    /// ```ignore
    /// ServerBuilder::from_config(AppConfig::from_yaml_file("grid.yaml")?)
    ///     .await?
    ///     .serve()
    ///     .await?;
    /// ```
    pub async fn serve(self) -> GridResult<()> {
        let addr = self.config.bind_addr()?;
        let app = self.build()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| GridError::Internal(format!("Failed to bind {}: {}", addr, e)))?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| GridError::Internal(format!("Server error: {}", e)))?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
