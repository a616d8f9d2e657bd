use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{config_error, Error};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://rides.db";
pub const DEFAULT_GEOCODING_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
pub const DEFAULT_ROUTES_URL: &str = "https://routes.googleapis.com/directions/v2:computeRoutes";

#[derive(Clone, Debug)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub allowed_origins: Vec<String>,
    pub maps: MapsConfig,
    pub roster_path: Option<PathBuf>,
}

#[derive(Clone)]
pub struct MapsConfig {
    pub api_key: String,
    pub geocoding_url: String,
    pub routes_url: String,
    pub timeout: Duration,
}

// keeps the key out of logs
impl std::fmt::Debug for MapsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapsConfig")
            .field("geocoding_url", &self.geocoding_url)
            .field("routes_url", &self.routes_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("GOOGLE_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| config_error("GOOGLE_API_KEY is not set"))?;

        let allowed_origins = lookup("ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:8080".into())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            host: parse_or(&lookup, "HOST", IpAddr::V4(Ipv4Addr::LOCALHOST))?,
            port: parse_or(&lookup, "PORT", 8080)?,
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?,
            allowed_origins,
            maps: MapsConfig {
                api_key,
                geocoding_url: lookup("GEOCODING_API_URL")
                    .unwrap_or_else(|| DEFAULT_GEOCODING_URL.into()),
                routes_url: lookup("ROUTES_API_URL").unwrap_or_else(|| DEFAULT_ROUTES_URL.into()),
                timeout: Duration::from_secs(parse_or(&lookup, "MAPS_TIMEOUT_SECS", 10)?),
            },
            roster_path: lookup("DRIVER_ROSTER_PATH").map(PathBuf::from),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T, Error>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| config_error(format!("{} has an invalid value: {:?}", name, raw))),
        None => Ok(default),
    }
}

#[test]
fn defaults_apply_when_only_key_is_set() {
    let config = Config::from_lookup(|name| match name {
        "GOOGLE_API_KEY" => Some("secret".into()),
        _ => None,
    })
    .unwrap();

    assert_eq!(config.port, 8080);
    assert_eq!(config.addr().to_string(), "127.0.0.1:8080");
    assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
    assert_eq!(config.allowed_origins, vec!["http://localhost:8080"]);
    assert_eq!(config.maps.timeout, Duration::from_secs(10));
    assert!(config.roster_path.is_none());
    assert!(!format!("{:?}", config).contains("secret"));
}

#[test]
fn missing_key_or_bad_port_fails() {
    assert!(Config::from_lookup(|_| None).is_err());

    let result = Config::from_lookup(|name| match name {
        "GOOGLE_API_KEY" => Some("secret".into()),
        "PORT" => Some("eighty".into()),
        _ => None,
    });
    assert!(result.unwrap_err().message.contains("PORT"));
}

#[test]
fn origins_are_split_and_trimmed() {
    let config = Config::from_lookup(|name| match name {
        "GOOGLE_API_KEY" => Some("secret".into()),
        "ALLOWED_ORIGINS" => Some("http://a.test, http://b.test,".into()),
        _ => None,
    })
    .unwrap();

    assert_eq!(config.allowed_origins, vec!["http://a.test", "http://b.test"]);
}
