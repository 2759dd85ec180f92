use crate::{config::Config, error, server};

/// Runs the web app until the process is stopped.
///
/// `address` overrides `SERVER_ADDRESS` when given.
pub async fn serve(address: Option<String>) {
    let mut config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => error!("Invalid configuration: {}", e),
    };
    if let Some(address) = address {
        config.server_address = address;
    }

    if let Err(e) = server::start_api_server(config).await {
        error!("Server failed: {}", e);
    }
}
