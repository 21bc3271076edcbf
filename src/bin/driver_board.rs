//! Polls the ride list the way the driver dashboard does and logs each
//! refreshed board.

use rides::client::views::{DriverDashboard, PollEvent, Poller, DRIVER_POLL_INTERVAL};
use rides::client::RideClient;
use rides::config::ClientConfig;
use rides::error::AppError;
use rides::logging::init_logging;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let config = ClientConfig::from_env()?;
    info!("watching {}", config.api_url);

    let client = RideClient::new(config.api_url);
    let (_poller, mut events) = Poller::new(DriverDashboard::new(client), DRIVER_POLL_INTERVAL).spawn();

    while let Some(event) = events.recv().await {
        match event {
            PollEvent::Updated(board) => {
                info!(
                    requested = board.requested.len(),
                    active = board.active.len(),
                    recent = board.recent.len(),
                    "board refreshed"
                );
                for ride in &board.requested {
                    info!(ride_id = %ride.id, pickup = %ride.pickup, destination = %ride.destination, estimate = ride.estimate, "waiting for a driver");
                }
            }
            PollEvent::Failed(message) => warn!("refresh failed, retrying: {message}"),
        }
    }

    Ok(())
}
