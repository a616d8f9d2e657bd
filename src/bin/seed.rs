use std::env;

use ride_estimate::config::DEFAULT_DATABASE_URL;
use ride_estimate::db::{RideStore, SqliteStore};
use ride_estimate::entities::{DriverRef, NewRide};
use ride_estimate::error::Error;

fn sample_rides() -> Vec<NewRide> {
    vec![
        NewRide {
            customer_id: "12345".into(),
            origin: "Curitiba, PR".into(),
            destination: "São Paulo, SP".into(),
            distance: 416.156,
            duration: "20335s".into(),
            driver: DriverRef {
                id: 1,
                name: "Homer Simpson".into(),
            },
            price: 1040.39,
        },
        NewRide {
            customer_id: "123".into(),
            origin: "Rio de Janeiro, RJ".into(),
            destination: "Curitiba, PR".into(),
            distance: 852.312,
            duration: "40700s".into(),
            driver: DriverRef {
                id: 2,
                name: "Dominic Toretto".into(),
            },
            price: 4261.56,
        },
        NewRide {
            customer_id: "456".into(),
            origin: "São Paulo, SP".into(),
            destination: "Rio de Janeiro, RJ".into(),
            distance: 430.789,
            duration: "21000s".into(),
            driver: DriverRef {
                id: 3,
                name: "James Bond".into(),
            },
            price: 4307.89,
        },
    ]
}

/// Recreates the rides table with a few sample rides.
#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.into());

    let store = SqliteStore::new(&database_url, 1).await?;
    store.reset().await?;

    for ride in sample_rides() {
        store.append(ride).await?;
    }

    tracing::info!(%database_url, "database seeded");

    Ok(())
}
