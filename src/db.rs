use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Executor, Pool, Row, Sqlite};
use std::str::FromStr;
use std::sync::Arc;

use crate::entities::{DriverRef, NewRide, Ride};
use crate::error::{persistence_error, Error};

const CREATE_RIDES: &str = "
    CREATE TABLE IF NOT EXISTS rides (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        customer_id TEXT NOT NULL,
        origin TEXT NOT NULL,
        destination TEXT NOT NULL,
        distance REAL NOT NULL,
        duration TEXT NOT NULL,
        driver_id INTEGER NOT NULL,
        driver_name TEXT NOT NULL,
        value REAL NOT NULL,
        date TEXT NOT NULL
    )
";

const CREATE_RIDES_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS rides_customer_date ON rides (customer_id, date)";

/// Append-only ride history.
#[async_trait]
pub trait RideStore {
    async fn append(&self, ride: NewRide) -> Result<Ride, Error>;

    /// Newest first. An empty result is not an error.
    async fn find_by_customer(
        &self,
        customer_id: &str,
        driver_id: Option<i64>,
    ) -> Result<Vec<Ride>, Error>;
}

pub type DynRideStore = Arc<dyn RideStore + Send + Sync>;

#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    #[tracing::instrument(name = "SqliteStore::new")]
    pub async fn new(db_uri: &str, max_connections: u32) -> Result<Self, Error> {
        let options = SqliteConnectOptions::from_str(db_uri)?.create_if_missing(true);

        // in-memory databases live only as long as their connection
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        pool.execute(CREATE_RIDES).await?;
        pool.execute(CREATE_RIDES_INDEX).await?;

        tracing::info!("ride store ready");

        Ok(Self { pool })
    }

    /// Drops every stored ride and recreates the schema.
    #[tracing::instrument(skip(self))]
    pub async fn reset(&self) -> Result<(), Error> {
        self.pool.execute("DROP TABLE IF EXISTS rides").await?;
        self.pool.execute(CREATE_RIDES).await?;
        self.pool.execute(CREATE_RIDES_INDEX).await?;

        Ok(())
    }
}

fn ride_from_row(row: &SqliteRow) -> Result<Ride, sqlx::Error> {
    Ok(Ride {
        id: row.try_get("id")?,
        customer_id: row.try_get("customer_id")?,
        origin: row.try_get("origin")?,
        destination: row.try_get("destination")?,
        distance: row.try_get("distance")?,
        duration: row.try_get("duration")?,
        driver: DriverRef {
            id: row.try_get("driver_id")?,
            name: row.try_get("driver_name")?,
        },
        price: row.try_get("value")?,
        created_at: row.try_get::<DateTime<Utc>, _>("date")?,
    })
}

#[async_trait]
impl RideStore for SqliteStore {
    #[tracing::instrument(skip(self))]
    async fn append(&self, ride: NewRide) -> Result<Ride, Error> {
        let created_at = Utc::now();

        let result = self
            .pool
            .execute(
                sqlx::query(
                    "INSERT INTO rides (customer_id, origin, destination, distance, duration, driver_id, driver_name, value, date) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(&ride.customer_id)
                .bind(&ride.origin)
                .bind(&ride.destination)
                .bind(ride.distance)
                .bind(&ride.duration)
                .bind(ride.driver.id)
                .bind(&ride.driver.name)
                .bind(ride.price)
                .bind(created_at),
            )
            .await
            .map_err(|err| persistence_error("failed to save the ride", err))?;

        let id = result.last_insert_rowid();

        tracing::info!(id, "ride saved");

        Ok(Ride {
            id,
            customer_id: ride.customer_id,
            origin: ride.origin,
            destination: ride.destination,
            distance: ride.distance,
            duration: ride.duration,
            driver: ride.driver,
            price: ride.price,
            created_at,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_customer(
        &self,
        customer_id: &str,
        driver_id: Option<i64>,
    ) -> Result<Vec<Ride>, Error> {
        let rows = match driver_id {
            Some(driver_id) => {
                self.pool
                    .fetch_all(
                        sqlx::query("SELECT * FROM rides WHERE customer_id = ? AND driver_id = ? ORDER BY date DESC, id DESC")
                            .bind(customer_id)
                            .bind(driver_id),
                    )
                    .await
            }
            None => {
                self.pool
                    .fetch_all(
                        sqlx::query("SELECT * FROM rides WHERE customer_id = ? ORDER BY date DESC, id DESC")
                            .bind(customer_id),
                    )
                    .await
            }
        }
        .map_err(|err| persistence_error("failed to fetch rides", err))?;

        rows.iter()
            .map(ride_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| persistence_error("failed to fetch rides", err))
    }
}

#[cfg(test)]
pub(crate) async fn memory_store() -> SqliteStore {
    SqliteStore::new("sqlite::memory:", 1).await.unwrap()
}

/// A store whose pool has been shut down, so every call fails in sqlx.
#[cfg(test)]
pub(crate) async fn closed_store() -> SqliteStore {
    let store = memory_store().await;
    store.pool.close().await;
    store
}

#[cfg(test)]
pub(crate) fn new_ride(customer_id: &str, driver_id: i64) -> NewRide {
    NewRide {
        customer_id: customer_id.into(),
        origin: "Curitiba, PR".into(),
        destination: "São Paulo, SP".into(),
        distance: 416.156,
        duration: "20335s".into(),
        driver: DriverRef {
            id: driver_id,
            name: format!("driver {}", driver_id),
        },
        price: 1040.39,
    }
}

#[test]
fn empty_history() {
    use tokio_test::block_on;

    block_on(async {
        let store = memory_store().await;

        let rides = store.find_by_customer("nobody", None).await.unwrap();
        assert!(rides.is_empty());
    });
}

#[test]
fn append_then_fetch() {
    use tokio_test::block_on;

    block_on(async {
        let store = memory_store().await;

        let saved = store.append(new_ride("12345", 1)).await.unwrap();
        let rides = store.find_by_customer("12345", None).await.unwrap();

        assert_eq!(rides.len(), 1);
        assert_eq!(rides[0].id, saved.id);
        assert_eq!(rides[0].customer_id, "12345");
        assert_eq!(rides[0].origin, "Curitiba, PR");
        assert_eq!(rides[0].destination, "São Paulo, SP");
        assert_eq!(rides[0].distance, 416.156);
        assert_eq!(rides[0].driver.id, 1);
        assert_eq!(rides[0].price, 1040.39);

        assert!(store.find_by_customer("123", None).await.unwrap().is_empty());
    });
}

#[test]
fn history_is_newest_first_and_filters_by_driver() {
    use tokio_test::block_on;

    block_on(async {
        let store = memory_store().await;

        let first = store.append(new_ride("c1", 1)).await.unwrap();
        let second = store.append(new_ride("c1", 2)).await.unwrap();
        let third = store.append(new_ride("c1", 1)).await.unwrap();
        store.append(new_ride("c2", 1)).await.unwrap();

        let ids: Vec<i64> = store
            .find_by_customer("c1", None)
            .await
            .unwrap()
            .iter()
            .map(|ride| ride.id)
            .collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);

        let ids: Vec<i64> = store
            .find_by_customer("c1", Some(1))
            .await
            .unwrap()
            .iter()
            .map(|ride| ride.id)
            .collect();
        assert_eq!(ids, vec![third.id, first.id]);

        assert!(store.find_by_customer("c1", Some(3)).await.unwrap().is_empty());
    });
}

#[test]
fn reset_clears_rides() {
    use tokio_test::block_on;

    block_on(async {
        let store = memory_store().await;

        store.append(new_ride("c1", 1)).await.unwrap();
        store.reset().await.unwrap();

        assert!(store.find_by_customer("c1", None).await.unwrap().is_empty());
    });
}

#[test]
fn closed_pool_hides_sqlx_detail() {
    use tokio_test::block_on;

    block_on(async {
        let store = closed_store().await;

        let err = store.append(new_ride("c1", 1)).await.unwrap_err();
        assert_eq!(err.kind, crate::error::Kind::Persistence);
        assert_eq!(err.message, "failed to save the ride");

        let err = store.find_by_customer("c1", None).await.unwrap_err();
        assert_eq!(err.kind, crate::error::Kind::Persistence);
        assert_eq!(err.message, "failed to fetch rides");
    });
}
