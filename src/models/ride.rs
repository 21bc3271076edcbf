use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RideStatus {
    Requested,
    Accepted,
    Arriving,
    InProgress,
    Completed,
    Cancelled,
}

impl RideStatus {
    pub const ALL: [RideStatus; 6] = [
        RideStatus::Requested,
        RideStatus::Accepted,
        RideStatus::Arriving,
        RideStatus::InProgress,
        RideStatus::Completed,
        RideStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RideStatus::Requested => "REQUESTED",
            RideStatus::Accepted => "ACCEPTED",
            RideStatus::Arriving => "ARRIVING",
            RideStatus::InProgress => "IN_PROGRESS",
            RideStatus::Completed => "COMPLETED",
            RideStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RideStatus::Requested => "Requested",
            RideStatus::Accepted => "Accepted",
            RideStatus::Arriving => "Arriving",
            RideStatus::InProgress => "In progress",
            RideStatus::Completed => "Completed",
            RideStatus::Cancelled => "Cancelled",
        }
    }

    /// Statuses a ride may move to from `self`. Terminal states return an
    /// empty slice.
    pub fn allowed_next(&self) -> &'static [RideStatus] {
        match self {
            RideStatus::Requested => &[RideStatus::Accepted],
            RideStatus::Accepted => &[RideStatus::Arriving, RideStatus::Cancelled],
            RideStatus::Arriving => &[RideStatus::InProgress, RideStatus::Cancelled],
            RideStatus::InProgress => &[RideStatus::Completed, RideStatus::Cancelled],
            RideStatus::Completed | RideStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: RideStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_next().is_empty()
    }

    /// A driver is assigned and the trip has not finished yet.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            RideStatus::Accepted | RideStatus::Arriving | RideStatus::InProgress
        )
    }

    pub fn valid_values() -> String {
        Self::ALL
            .iter()
            .map(RideStatus::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown ride status `{}`", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for RideStatus {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == raw)
            .ok_or_else(|| UnknownStatus(raw.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Ride {
    pub id: String,
    pub pickup: String,
    pub destination: String,
    pub city: String,
    pub estimate: f64,
    pub offered_price: Option<f64>,
    pub status: RideStatus,
    pub driver_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Rider input for a new trip request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRide {
    pub pickup: String,
    pub destination: String,
    pub city: String,
    pub estimate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offered_price: Option<f64>,
}

impl NewRide {
    /// Trims the location fields and rejects blank locations or prices that
    /// are negative or not finite.
    pub fn normalized(self) -> Result<Self, String> {
        let pickup = required_text("pickup", self.pickup)?;
        let destination = required_text("destination", self.destination)?;
        let city = required_text("city", self.city)?;

        if !self.estimate.is_finite() || self.estimate < 0.0 {
            return Err("estimate must be a non-negative number".into());
        }
        if let Some(price) = self.offered_price {
            if !price.is_finite() || price < 0.0 {
                return Err("offeredPrice must be a non-negative number".into());
            }
        }

        Ok(Self {
            pickup,
            destination,
            city,
            estimate: self.estimate,
            offered_price: self.offered_price,
        })
    }
}

fn required_text(field: &str, value: String) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{field} is required"));
    }
    Ok(trimmed.to_string())
}
