//! Typed HTTP client for the ride endpoints.
//!
//! Every response goes through [`decode_response`], which refuses to hand a
//! non-JSON body to the caller. An HTML error page from a proxy or a crashed
//! route surfaces as a generic failure instead.

pub mod views;

use reqwest::{header::CONTENT_TYPE, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use thiserror::Error;
use url::Url;

use crate::{
    error::ErrorBody,
    models::ride::{NewRide, Ride, RideStatus},
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{message}")]
    Api { status: StatusCode, message: String },
    #[error("Request failed ({}). API route not found or crashed.", .status.as_u16())]
    Unavailable { status: StatusCode },
    #[error("Server did not return JSON. Check API routes.")]
    NotJson { status: StatusCode },
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    InvalidUrl(#[from] url::ParseError),
}

impl ClientError {
    /// HTTP status behind the failure, if the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. }
            | ClientError::Unavailable { status }
            | ClientError::NotJson { status } => Some(*status),
            ClientError::Transport(err) => err.status(),
            ClientError::Decode(_) | ClientError::InvalidUrl(_) => None,
        }
    }
}

/// Turns a raw HTTP response into `T`, or into the error the server meant.
pub fn decode_response<T: DeserializeOwned>(
    status: StatusCode,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<T, ClientError> {
    let content_type = content_type.unwrap_or_default();

    if !status.is_success() {
        if content_type.contains("text/html") {
            return Err(ClientError::Unavailable { status });
        }
        return Err(match serde_json::from_slice::<ErrorBody>(body) {
            Ok(parsed) => ClientError::Api {
                status,
                message: parsed.error,
            },
            Err(_) => ClientError::Api {
                status,
                message: format!("Request failed ({})", status.as_u16()),
            },
        });
    }

    if !content_type.contains("application/json") {
        return Err(ClientError::NotJson { status });
    }

    Ok(serde_json::from_slice(body)?)
}

#[derive(Debug, Clone)]
pub struct RideClient {
    http: reqwest::Client,
    base: Url,
}

impl RideClient {
    pub fn new(base: Url) -> Self {
        Self::with_client(reqwest::Client::new(), base)
    }

    pub fn with_client(http: reqwest::Client, base: Url) -> Self {
        Self { http, base }
    }

    pub async fn create_ride(&self, ride: &NewRide) -> Result<Ride, ClientError> {
        self.send(Method::POST, "rides", Some(ride)).await
    }

    pub async fn list_rides(&self) -> Result<Vec<Ride>, ClientError> {
        self.send::<(), _>(Method::GET, "rides", None).await
    }

    pub async fn get_ride(&self, id: &str) -> Result<Ride, ClientError> {
        self.send::<(), _>(Method::GET, &format!("rides/{id}"), None)
            .await
    }

    pub async fn update_ride(
        &self,
        id: &str,
        status: RideStatus,
        driver_name: Option<&str>,
    ) -> Result<Ride, ClientError> {
        let body = json!({ "status": status, "driverName": driver_name });
        self.send(Method::PATCH, &format!("rides/{id}"), Some(&body))
            .await
    }

    pub async fn accept_ride(&self, id: &str, driver_name: &str) -> Result<Ride, ClientError> {
        let body = json!({ "driverName": driver_name });
        self.send(Method::PATCH, &format!("rides/{id}/accept"), Some(&body))
            .await
    }

    pub async fn set_ride_status(&self, id: &str, status: RideStatus) -> Result<Ride, ClientError> {
        let body = json!({ "status": status });
        self.send(Method::PATCH, &format!("rides/{id}/status"), Some(&body))
            .await
    }

    async fn send<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.base.join(path)?;
        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let bytes = response.bytes().await?;

        decode_response(status, content_type.as_deref(), &bytes)
    }
}
