#![allow(dead_code)]

use std::net::SocketAddr;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use rides::{
    config::AppConfig,
    db::{init_pool, migrate},
    models::ride::{NewRide, Ride, RideStatus},
    routes::create_router,
    state::AppState,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    _root: TempDir,
}

/// Router plus state over a throwaway SQLite file.
pub async fn spawn_app() -> TestApp {
    let root = TempDir::new().expect("temp dir");
    let database_url = format!("sqlite://{}", root.path().join("api.sqlite").display());
    let config = AppConfig {
        database_url: database_url.clone(),
        listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
    };

    let db = init_pool(&database_url).await.expect("pool");
    migrate(&db).await.expect("migrations");

    let state = AppState::new(config, db);
    TestApp {
        router: create_router(state.clone()),
        state,
        _root: root,
    }
}

impl TestApp {
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.send_request(builder.body(body).unwrap()).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse {
            status,
            content_type,
            json,
        }
    }

    pub async fn requested_ride(&self) -> Ride {
        self.state
            .rides
            .create(NewRide {
                pickup: "Yaba".into(),
                destination: "Victoria Island".into(),
                city: "Lagos".into(),
                estimate: 5200.0,
                offered_price: Some(4800.0),
            })
            .await
            .expect("create ride")
    }

    /// Puts a ride into `status` directly, bypassing the guard.
    pub async fn force_status(&self, id: &str, status: RideStatus, driver: Option<&str>) -> Ride {
        sqlx::query("UPDATE rides SET status = ?1, driver_name = ?2 WHERE id = ?3")
            .bind(status)
            .bind(driver)
            .bind(id)
            .execute(self.state.rides.pool())
            .await
            .expect("force status");
        self.state.rides.get(id).await.expect("reload ride")
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: String,
    pub json: Value,
}

impl TestResponse {
    pub fn ride(&self) -> Ride {
        serde_json::from_value(self.json.clone()).expect("ride body")
    }

    pub fn error(&self) -> &str {
        self.json["error"].as_str().expect("error body")
    }
}
