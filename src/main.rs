use log::{error, info};
use slab_pricer::config::Config;
use slab_pricer::handlers::{create_router, AppState};
use slab_pricer::sources::graphql::GraphqlClient;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let client = match GraphqlClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create upstream client: {}", e);
            std::process::exit(1);
        }
    };

    let app = create_router(AppState::new(client));

    let listener = match TcpListener::bind(&config.bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {:?}", config.bind_address, e);
            std::process::exit(1);
        }
    };

    info!("Listening on {}", config.bind_address);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {:?}", e);
        std::process::exit(1);
    }
}
