//! Polling view models for the driver dashboard and the rider tracking page.
//!
//! Each poll is a full replace: a view is rebuilt from whatever the server
//! returned last, and nothing here ever guesses a status locally.

use std::time::Duration;

use async_trait::async_trait;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, warn};

use super::{ClientError, RideClient};
use crate::models::ride::{Ride, RideStatus};

pub const DRIVER_POLL_INTERVAL: Duration = Duration::from_secs(3);
pub const RIDER_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Driver dashboard lists, derived from one full fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriverBoard {
    pub requested: Vec<Ride>,
    pub active: Vec<Ride>,
    pub recent: Vec<Ride>,
}

impl DriverBoard {
    pub fn from_rides(rides: Vec<Ride>) -> Self {
        let mut board = Self::default();
        for ride in rides {
            match ride.status {
                RideStatus::Requested => board.requested.push(ride),
                RideStatus::Accepted | RideStatus::Arriving | RideStatus::InProgress => {
                    board.active.push(ride)
                }
                RideStatus::Completed | RideStatus::Cancelled => board.recent.push(ride),
            }
        }
        board
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressStep {
    pub status: RideStatus,
    pub hint: &'static str,
}

pub const TRACKING_STEPS: [ProgressStep; 5] = [
    ProgressStep {
        status: RideStatus::Requested,
        hint: "Waiting for a driver",
    },
    ProgressStep {
        status: RideStatus::Accepted,
        hint: "Driver assigned",
    },
    ProgressStep {
        status: RideStatus::Arriving,
        hint: "Driver is on the way",
    },
    ProgressStep {
        status: RideStatus::InProgress,
        hint: "Trip has started",
    },
    ProgressStep {
        status: RideStatus::Completed,
        hint: "Trip finished",
    },
];

/// Rider tracking view. `current_step` indexes [`TRACKING_STEPS`] and is
/// `None` once the ride was cancelled.
#[derive(Debug, Clone, PartialEq)]
pub struct RideProgress {
    pub ride: Ride,
    pub current_step: Option<usize>,
}

impl RideProgress {
    pub fn from_ride(ride: Ride) -> Self {
        let current_step = TRACKING_STEPS
            .iter()
            .position(|step| step.status == ride.status);
        Self { ride, current_step }
    }

    pub fn cancelled(&self) -> bool {
        self.ride.status == RideStatus::Cancelled
    }

    pub fn is_step_reached(&self, index: usize) -> bool {
        self.current_step.is_some_and(|current| index <= current)
    }

    pub fn headline(&self) -> &'static str {
        self.ride.status.label()
    }
}

/// Something a [`Poller`] can re-fetch on every tick.
#[async_trait]
pub trait Snapshot: Send + Sync {
    type Output: Send;

    async fn fetch(&self) -> Result<Self::Output, ClientError>;
}

pub struct DriverDashboard {
    client: RideClient,
}

impl DriverDashboard {
    pub fn new(client: RideClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Snapshot for DriverDashboard {
    type Output = DriverBoard;

    async fn fetch(&self) -> Result<DriverBoard, ClientError> {
        let rides = self.client.list_rides().await?;
        Ok(DriverBoard::from_rides(rides))
    }
}

pub struct RideTracking {
    client: RideClient,
    ride_id: String,
}

impl RideTracking {
    pub fn new(client: RideClient, ride_id: impl Into<String>) -> Self {
        Self {
            client,
            ride_id: ride_id.into(),
        }
    }
}

#[async_trait]
impl Snapshot for RideTracking {
    type Output = RideProgress;

    async fn fetch(&self) -> Result<RideProgress, ClientError> {
        let ride = self.client.get_ride(&self.ride_id).await?;
        Ok(RideProgress::from_ride(ride))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent<T> {
    Updated(T),
    Failed(String),
}

pub struct Poller<S> {
    source: S,
    period: Duration,
}

impl<S: Snapshot> Poller<S> {
    pub fn new(source: S, period: Duration) -> Self {
        Self { source, period }
    }

    /// Fetches on every tick until `events` is closed. Failed fetches are
    /// reported and retried on the next tick.
    pub async fn run(self, events: mpsc::Sender<PollEvent<S::Output>>) {
        let mut ticker = time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let event = match self.source.fetch().await {
                Ok(snapshot) => PollEvent::Updated(snapshot),
                Err(err) => {
                    warn!("poll failed: {err}");
                    PollEvent::Failed(err.to_string())
                }
            };
            if events.send(event).await.is_err() {
                debug!("poll subscriber went away, stopping");
                break;
            }
        }
    }

    pub fn spawn(self) -> (JoinHandle<()>, mpsc::Receiver<PollEvent<S::Output>>)
    where
        S: 'static,
        S::Output: 'static,
    {
        let (tx, rx) = mpsc::channel(1);
        let handle = tokio::spawn(self.run(tx));
        (handle, rx)
    }
}
