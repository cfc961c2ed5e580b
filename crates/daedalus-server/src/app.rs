//! Application bootstrap.
//!
//! [`App`] ties the environment settings, the route table and the server
//! together so a binary needs only a few lines:
//!
//! ```rust,ignore
//! use daedalus_server::App;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), daedalus_server::ServerError> {
//!     let mut app = App::from_env()?;
//!     app.router_mut().get("/", home);
//!     app.run().await
//! }
//! ```

use daedalus_config::AppConfig;
use daedalus_telemetry::{init_logging, LogConfig};

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::error_handler::ErrorHandler;
use crate::router::Router;
use crate::server::Server;
use crate::shutdown::ShutdownSignal;

/// An application: settings plus routes.
#[derive(Debug)]
pub struct App {
    config: AppConfig,
    router: Router,
}

impl App {
    /// Creates an application with an empty router.
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            router: Router::new(),
        }
    }

    /// Creates an application from `ADDR`, `DEBUG` and an optional `.env`.
    ///
    /// # Errors
    ///
    /// Returns every configuration problem found.
    pub fn from_env() -> Result<Self, ServerError> {
        Ok(Self::new(AppConfig::load()?))
    }

    /// Returns the application settings.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Returns the router.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Returns the router for registration.
    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    /// Replaces the error handler.
    pub fn error_handler(&mut self, handler: impl ErrorHandler) -> &mut Self {
        self.router.error_handler(handler);
        self
    }

    /// Installs logging, then serves until SIGTERM or SIGINT.
    ///
    /// # Errors
    ///
    /// Returns an error if logging cannot be installed, the routes do not
    /// compile, or the address cannot be bound.
    pub async fn run(self) -> Result<(), ServerError> {
        init_logging(&LogConfig::from_debug(self.config.debug))?;
        tracing::info!(address = %self.config.address, debug = self.config.debug, "Starting application");
        self.serve_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Compiles the routes and serves on the configured address until
    /// `shutdown` fires. Logging is left as it is.
    ///
    /// # Errors
    ///
    /// Returns an error if the routes do not compile or the address cannot
    /// be bound.
    pub async fn serve_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let table = self.router.compile()?;
        let server = Server::new(ServerConfig::from_app(&self.config), table);
        server.run_with_shutdown(shutdown).await
    }
}
