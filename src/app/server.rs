use {
    axum::Router,
    tokio::{net::TcpListener, signal},
    tracing::{error, info},
};

use crate::{Config, Error};

pub struct Server {
    pub router: Router,
    pub config: Config,
}

impl Server {
    /// Serves until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound or the server fails.
    pub async fn start(self) -> Result<(), Error> {
        let addr = format!(
            "{}:{}",
            self.config.website.bind_address, self.config.website.bind_port
        );
        let listener = TcpListener::bind(&addr).await?;
        info!(%addr, "Listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for the shutdown signal: {:?}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
