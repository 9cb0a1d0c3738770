//! todosync serve: run the remote todo API.

use crate::config::ServerConfig;
use crate::error::Result;
use crate::server::TodoServer;

use super::Context;

/// Overrides for `todosync serve`
pub struct ServeOptions {
    pub host: Option<String>,
    pub port: Option<u16>,
}

pub async fn run(context: &Context, options: ServeOptions) -> Result<()> {
    let config = ServerConfig {
        host: options
            .host
            .unwrap_or_else(|| context.config.server.host.clone()),
        port: options.port.unwrap_or(context.config.server.port),
    };

    let server = TodoServer::start(&config).await?;
    if !context.options.quiet {
        println!("Server is running on port {}", server.addr().port());
    }

    tokio::select! {
        result = server.wait() => result,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("shutting down todo server");
            Ok(())
        }
    }
}
