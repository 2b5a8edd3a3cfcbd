use dotenv::dotenv;
use tracing::{info, warn};

use crestline_backend::app::app::App;
use crestline_backend::util::logger::Logger;

#[tokio::main]
async fn main() {
    // The guards keep the non-blocking file writers flushing for the
    // lifetime of the process.
    let _logger = Logger::new().expect("Failed to initialize logging");

    info!("Starting Crestline backend");

    match dotenv() {
        Ok(_) => info!("Loaded .env file"),
        Err(e) => warn!("No .env file loaded: {} (using system env vars)", e),
    }

    let app = App::new().await;
    app.start().await;
}
