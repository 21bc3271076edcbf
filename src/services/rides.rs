use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::ride::{NewRide, Ride, RideStatus},
};

/// SQLite-backed ride store. Every status change is a single conditional
/// `UPDATE` keyed on the status the caller observed, so concurrent writers
/// can never both win.
#[derive(Clone)]
pub struct RideService {
    db: DbPool,
}

impl RideService {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &DbPool {
        &self.db
    }

    #[tracing::instrument(skip(self))]
    pub async fn create(&self, new_ride: NewRide) -> Result<Ride, AppError> {
        let new_ride = new_ride.normalized().map_err(AppError::InvalidRequest)?;
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"INSERT INTO rides (id, pickup, destination, city, estimate, offered_price, status, driver_name, created_at, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL, ?8, ?8)"#,
        )
        .bind(&id)
        .bind(&new_ride.pickup)
        .bind(&new_ride.destination)
        .bind(&new_ride.city)
        .bind(new_ride.estimate)
        .bind(new_ride.offered_price)
        .bind(RideStatus::Requested)
        .bind(now)
        .execute(&self.db)
        .await?;

        info!(ride_id = %id, city = %new_ride.city, "ride requested");
        self.get(&id).await
    }

    pub async fn find(&self, id: &str) -> Result<Option<Ride>, AppError> {
        let ride = sqlx::query_as::<_, Ride>(
            r#"SELECT id, pickup, destination, city, estimate, offered_price, status, driver_name, created_at, updated_at
               FROM rides WHERE id = ?1"#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(ride)
    }

    pub async fn get(&self, id: &str) -> Result<Ride, AppError> {
        self.find(id).await?.ok_or_else(AppError::ride_not_found)
    }

    /// All rides in insertion order.
    pub async fn list(&self) -> Result<Vec<Ride>, AppError> {
        let rides = sqlx::query_as::<_, Ride>(
            r#"SELECT id, pickup, destination, city, estimate, offered_price, status, driver_name, created_at, updated_at
               FROM rides ORDER BY rowid"#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rides)
    }

    /// Claims a `REQUESTED` ride for `driver_name`. Only one caller can ever
    /// observe success for a given ride.
    #[tracing::instrument(skip(self))]
    pub async fn accept(&self, id: &str, driver_name: &str) -> Result<Ride, AppError> {
        let driver_name = driver_name.trim();
        if driver_name.is_empty() {
            return Err(AppError::InvalidRequest("driverName is required".into()));
        }
        self.claim(id, Some(driver_name)).await
    }

    /// Moves a ride along the transition table. A move to `ACCEPTED` goes
    /// through the same conditional write as [`RideService::accept`].
    #[tracing::instrument(skip(self))]
    pub async fn transition(&self, id: &str, next: RideStatus) -> Result<Ride, AppError> {
        let ride = self.get(id).await?;
        if !ride.status.can_transition_to(next) {
            warn!(ride_id = %id, current = %ride.status, requested = %next, "illegal transition");
            return Err(invalid_transition(ride.status, next));
        }
        if next == RideStatus::Accepted {
            return self.claim(id, None).await;
        }

        let affected = sqlx::query(
            "UPDATE rides SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
        )
        .bind(next)
        .bind(Utc::now())
        .bind(id)
        .bind(ride.status)
        .execute(&self.db)
        .await?
        .rows_affected();

        if affected == 0 {
            // Someone else moved the ride after our read.
            let current = self.get(id).await?;
            warn!(ride_id = %id, current = %current.status, requested = %next, "transition lost race");
            return Err(invalid_transition(current.status, next));
        }

        info!(ride_id = %id, from = %ride.status, to = %next, "ride status changed");
        self.get(id).await
    }

    /// General-purpose update: `ACCEPTED` with a driver name is an accept,
    /// anything else is a guarded transition. A driver name is only
    /// meaningful when accepting.
    pub async fn apply(
        &self,
        id: &str,
        next: RideStatus,
        driver_name: Option<&str>,
    ) -> Result<Ride, AppError> {
        match (next, driver_name) {
            (RideStatus::Accepted, Some(name)) => self.accept(id, name).await,
            (_, None) => self.transition(id, next).await,
            (_, Some(_)) => Err(AppError::InvalidRequest(
                "driverName can only be set when accepting a ride".into(),
            )),
        }
    }

    async fn claim(&self, id: &str, driver_name: Option<&str>) -> Result<Ride, AppError> {
        let affected = sqlx::query(
            "UPDATE rides SET status = ?1, driver_name = ?2, updated_at = ?3 WHERE id = ?4 AND status = ?5",
        )
        .bind(RideStatus::Accepted)
        .bind(driver_name)
        .bind(Utc::now())
        .bind(id)
        .bind(RideStatus::Requested)
        .execute(&self.db)
        .await?
        .rows_affected();

        if affected == 0 {
            let current = self.get(id).await?;
            warn!(ride_id = %id, current = %current.status, "ride not available for accept");
            return Err(AppError::Conflict(format!(
                "Ride not available (current status: {})",
                current.status
            )));
        }

        info!(ride_id = %id, driver = ?driver_name, "ride accepted");
        self.get(id).await
    }
}

fn invalid_transition(current: RideStatus, next: RideStatus) -> AppError {
    AppError::Conflict(format!("Invalid transition: {current} -> {next}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_pool, migrate};
    use tempfile::TempDir;

    async fn service() -> (RideService, TempDir) {
        let root = TempDir::new().expect("temp dir");
        let url = format!("sqlite://{}", root.path().join("rides.sqlite").display());
        let pool = init_pool(&url).await.expect("pool");
        migrate(&pool).await.expect("migrations");
        (RideService::new(pool), root)
    }

    fn lagos_trip() -> NewRide {
        NewRide {
            pickup: "Yaba".into(),
            destination: "Ikeja".into(),
            city: "Lagos".into(),
            estimate: 4500.0,
            offered_price: Some(4000.0),
        }
    }

    #[tokio::test]
    async fn create_stores_a_requested_ride() {
        let (rides, _root) = service().await;
        let ride = rides.create(lagos_trip()).await.expect("create");
        assert_eq!(ride.status, RideStatus::Requested);
        assert_eq!(ride.driver_name, None);
        assert_eq!(ride.created_at, ride.updated_at);
        assert_eq!(rides.get(&ride.id).await.expect("get"), ride);
    }

    #[tokio::test]
    async fn accept_only_succeeds_once() {
        let (rides, _root) = service().await;
        let ride = rides.create(lagos_trip()).await.expect("create");

        let accepted = rides.accept(&ride.id, "Ada").await.expect("accept");
        assert_eq!(accepted.status, RideStatus::Accepted);
        assert_eq!(accepted.driver_name.as_deref(), Some("Ada"));

        let err = rides.accept(&ride.id, "Bayo").await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(
            err.to_string(),
            "Ride not available (current status: ACCEPTED)"
        );
        let stored = rides.get(&ride.id).await.expect("get");
        assert_eq!(stored.driver_name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn accept_unknown_ride_is_not_found() {
        let (rides, _root) = service().await;
        let err = rides.accept("missing", "Ada").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn accept_requires_a_driver_name() {
        let (rides, _root) = service().await;
        let ride = rides.create(lagos_trip()).await.expect("create");
        let err = rides.accept(&ride.id, "   ").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
        assert_eq!(rides.get(&ride.id).await.expect("get"), ride);
    }

    #[tokio::test]
    async fn transition_walks_the_happy_path_and_keeps_the_driver() {
        let (rides, _root) = service().await;
        let ride = rides.create(lagos_trip()).await.expect("create");
        rides.accept(&ride.id, "Ada").await.expect("accept");
        for next in [
            RideStatus::Arriving,
            RideStatus::InProgress,
            RideStatus::Completed,
        ] {
            let updated = rides.transition(&ride.id, next).await.expect("transition");
            assert_eq!(updated.status, next);
            assert_eq!(updated.driver_name.as_deref(), Some("Ada"));
        }

        let err = rides
            .transition(&ride.id, RideStatus::Cancelled)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid transition: COMPLETED -> CANCELLED");
    }

    #[tokio::test]
    async fn apply_rejects_driver_name_outside_accept() {
        let (rides, _root) = service().await;
        let ride = rides.create(lagos_trip()).await.expect("create");
        rides.accept(&ride.id, "Ada").await.expect("accept");
        let err = rides
            .apply(&ride.id, RideStatus::Arriving, Some("Bayo"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn list_keeps_insertion_order() {
        let (rides, _root) = service().await;
        let first = rides.create(lagos_trip()).await.expect("create");
        let second = rides.create(lagos_trip()).await.expect("create");
        let ids: Vec<_> = rides
            .list()
            .await
            .expect("list")
            .into_iter()
            .map(|ride| ride.id)
            .collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }
}
