use std::sync::Arc;

use ride_estimate::config::Config;
use ride_estimate::db::SqliteStore;
use ride_estimate::engine::Engine;
use ride_estimate::entities::Roster;
use ride_estimate::error::Error;
use ride_estimate::external::google_maps::GoogleMaps;
use ride_estimate::server::serve;

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    tracing::info!(?config, "starting");

    let roster = match &config.roster_path {
        Some(path) => Roster::from_json_file(path)?,
        None => Roster::default(),
    };

    let store = SqliteStore::new(&config.database_url, config.database_max_connections).await?;
    let maps = Arc::new(GoogleMaps::new(config.maps.clone())?);

    let engine = Engine::new(maps.clone(), maps, Arc::new(store), roster);

    serve(&config, engine).await
}
