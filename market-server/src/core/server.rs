//! HTTP server startup and lifecycle

use crate::api;
use crate::core::{BackgroundTasks, Config, ServerState, TaskKind};
use crate::subscriptions::SubscriptionScheduler;
use crate::utils::{AppError, time};

pub struct Server {
    config: Config,
    state: Option<ServerState>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Create a server with pre-built state (tests)
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self {
            config,
            state: Some(state),
        }
    }

    pub async fn run(self) -> Result<(), AppError> {
        let state = match self.state {
            Some(state) => state,
            None => ServerState::initialize(&self.config).await?,
        };

        let mut tasks = BackgroundTasks::new();
        let scheduler = SubscriptionScheduler::new(
            state.subscriptions.clone(),
            state.products.clone(),
            state.users.clone(),
            state.order_service.clone(),
            state.notifications.clone(),
            state.email.clone(),
            time::parse_run_time(&self.config.subscription_run_time),
            tasks.shutdown_token(),
        );
        tasks.spawn("subscription_scheduler", TaskKind::Periodic, async move {
            scheduler.run().await;
        });

        let app = api::build_app(&state).with_state(state);

        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
        tracing::info!("Market server listening on {addr}");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

        tasks.shutdown().await;
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutting down...");
}
