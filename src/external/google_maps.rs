use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    config::MapsConfig,
    entities::{Coordinates, PlannedRoute, Route, Waypoint},
    error::{geocode_error, route_provider_error, unexpected_error, Error},
    external::{Geocoder, RoutePlanner},
};

const ROUTES_FIELD_MASK: &str =
    "routes.duration,routes.distanceMeters,routes.polyline.encodedPolyline";

#[derive(Clone, Debug, Serialize, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

impl GeocodeResponse {
    fn into_coordinates(self) -> Result<Coordinates, Error> {
        if self.status != "OK" {
            return Err(match self.error_message {
                Some(message) => geocode_error(format!("{} ({})", self.status, message)),
                None => geocode_error(self.status),
            });
        }

        let LatLng { lat, lng } = self
            .results
            .into_iter()
            .next()
            .ok_or_else(|| geocode_error("ZERO_RESULTS"))?
            .geometry
            .location;

        Ok(Coordinates {
            latitude: lat,
            longitude: lng,
        })
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Polyline {
    #[serde(default)]
    encoded_polyline: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RouteCandidate {
    #[serde(default)]
    distance_meters: f64,
    #[serde(default)]
    duration: String,
    #[serde(default)]
    polyline: Polyline,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct RoutesResponse {
    #[serde(default)]
    routes: Vec<RouteCandidate>,
}

/// Picks the first candidate; the raw payload is kept for the caller.
fn select_route(response: Value) -> Result<Option<PlannedRoute>, Error> {
    let parsed: RoutesResponse =
        serde_json::from_value(response.clone()).map_err(route_provider_error)?;

    Ok(parsed.routes.into_iter().next().map(|candidate| PlannedRoute {
        route: Route {
            distance_meters: candidate.distance_meters,
            duration: candidate.duration,
            polyline: candidate.polyline.encoded_polyline,
        },
        response,
    }))
}

fn waypoint_body(waypoint: &Waypoint) -> Value {
    match waypoint {
        Waypoint::Coordinates(coordinates) => json!({ "location": { "latLng": coordinates } }),
        Waypoint::Address(address) => json!({ "address": address }),
    }
}

fn routes_request_body(origin: &Waypoint, destination: &Waypoint) -> Value {
    json!({
        "origin": waypoint_body(origin),
        "destination": waypoint_body(destination),
        "travelMode": "DRIVE",
        "routingPreference": "TRAFFIC_AWARE",
        "computeAlternativeRoutes": false,
        "routeModifiers": {
            "avoidTolls": false,
            "avoidHighways": false,
            "avoidFerries": false,
        },
        "languageCode": "en-US",
        "units": "METRIC",
    })
}

/// Geocoding and Routes API client. One `reqwest::Client` is shared by both
/// lookups and carries the configured timeout.
#[derive(Clone, Debug)]
pub struct GoogleMaps {
    client: reqwest::Client,
    config: MapsConfig,
}

impl GoogleMaps {
    pub fn new(config: MapsConfig) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(unexpected_error)?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl Geocoder for GoogleMaps {
    #[tracing::instrument(skip(self))]
    async fn resolve(&self, address: &str) -> Result<Coordinates, Error> {
        let res = self
            .client
            .get(&self.config.geocoding_url)
            .query(&[("address", address)])
            .query(&[("key", &self.config.api_key)])
            .send()
            .await
            .map_err(|err| geocode_error(err.without_url()))?;

        let status = res.status();

        if !status.is_success() {
            tracing::warn!(%status, "geocoding request rejected");
            return Err(geocode_error(status));
        }

        // the request url carries the api key
        let data: GeocodeResponse = res
            .json()
            .await
            .map_err(|err| geocode_error(err.without_url()))?;

        data.into_coordinates()
    }
}

#[async_trait]
impl RoutePlanner for GoogleMaps {
    #[tracing::instrument(skip(self))]
    async fn plan(
        &self,
        origin: Waypoint,
        destination: Waypoint,
    ) -> Result<Option<PlannedRoute>, Error> {
        let res = self
            .client
            .post(&self.config.routes_url)
            .header("X-Goog-Api-Key", &self.config.api_key)
            .header("X-Goog-FieldMask", ROUTES_FIELD_MASK)
            .json(&routes_request_body(&origin, &destination))
            .send()
            .await
            .map_err(|err| route_provider_error(err.without_url()))?;

        let status = res.status();

        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            tracing::warn!(%status, %body, "routes request rejected");
            return Err(route_provider_error(status));
        }

        let data: Value = res
            .json()
            .await
            .map_err(|err| route_provider_error(err.without_url()))?;

        tracing::debug!(response = %data, "routes response received");

        select_route(data)
    }
}

#[test]
fn geocode_response_to_coordinates() {
    let data: GeocodeResponse = serde_json::from_value(json!({
        "status": "OK",
        "results": [
            { "geometry": { "location": { "lat": -25.4284, "lng": -49.2733 } } },
            { "geometry": { "location": { "lat": 0.0, "lng": 0.0 } } }
        ]
    }))
    .unwrap();

    let coordinates = data.into_coordinates().unwrap();

    assert_eq!(coordinates.latitude, -25.4284);
    assert_eq!(coordinates.longitude, -49.2733);
}

#[test]
fn geocode_failure_carries_provider_status() {
    let data: GeocodeResponse = serde_json::from_value(json!({
        "status": "REQUEST_DENIED",
        "error_message": "The provided API key is invalid.",
        "results": []
    }))
    .unwrap();

    let err = data.into_coordinates().unwrap_err();

    assert_eq!(err.kind, crate::error::Kind::Geocode);
    assert!(err.message.contains("REQUEST_DENIED"));
    assert!(err.message.contains("API key is invalid"));
}

#[test]
fn first_route_is_selected() {
    let response = json!({
        "routes": [
            {
                "distanceMeters": 12000,
                "duration": "1500s",
                "polyline": { "encodedPolyline": "abc" }
            },
            {
                "distanceMeters": 15000,
                "duration": "1700s",
                "polyline": { "encodedPolyline": "def" }
            }
        ]
    });

    let planned = select_route(response.clone()).unwrap().unwrap();

    assert_eq!(planned.route.distance_km(), 12.0);
    assert_eq!(planned.route.duration, "1500s");
    assert_eq!(planned.route.polyline, "abc");
    assert_eq!(planned.response, response);
}

#[test]
fn empty_routes_is_not_an_error() {
    assert!(select_route(json!({})).unwrap().is_none());
    assert!(select_route(json!({ "routes": [] })).unwrap().is_none());
}

#[test]
fn request_body_supports_both_waypoint_forms() {
    let body = routes_request_body(
        &Waypoint::Coordinates(Coordinates {
            latitude: 1.0,
            longitude: 2.0,
        }),
        &Waypoint::Address("Av. Paulista, 1000".into()),
    );

    assert_eq!(body["origin"]["location"]["latLng"]["latitude"], 1.0);
    assert_eq!(body["destination"]["address"], "Av. Paulista, 1000");
    assert_eq!(body["travelMode"], "DRIVE");
}

#[cfg(test)]
const TEST_KEY: &str = "test-api-key";

#[cfg(test)]
async fn spawn_provider(app: axum::Router) -> MapsConfig {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(axum::Server::from_tcp(listener).unwrap().serve(app.into_make_service()));

    MapsConfig {
        api_key: TEST_KEY.into(),
        geocoding_url: format!("http://{}/geocode", addr),
        routes_url: format!("http://{}/routes", addr),
        timeout: std::time::Duration::from_millis(300),
    }
}

#[tokio::test]
async fn resolve_reads_first_result() {
    use axum::extract::Query;
    use axum::routing::get;
    use std::collections::HashMap;

    let app = axum::Router::new().route(
        "/geocode",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            assert_eq!(params.get("key").map(String::as_str), Some(TEST_KEY));
            assert_eq!(params.get("address").map(String::as_str), Some("Curitiba, PR"));

            axum::Json(json!({
                "status": "OK",
                "results": [{ "geometry": { "location": { "lat": -25.43, "lng": -49.27 } } }]
            }))
        }),
    );
    let maps = GoogleMaps::new(spawn_provider(app).await).unwrap();

    let coordinates = maps.resolve("Curitiba, PR").await.unwrap();

    assert_eq!(coordinates.latitude, -25.43);
    assert_eq!(coordinates.longitude, -49.27);
}

#[tokio::test]
async fn geocode_timeout_is_a_geocode_error_without_the_key() {
    use axum::routing::get;

    let app = axum::Router::new().route(
        "/geocode",
        get(|| async {
            tokio::time::sleep(std::time::Duration::from_secs(3)).await;
            axum::Json(json!({ "status": "OK", "results": [] }))
        }),
    );
    let maps = GoogleMaps::new(spawn_provider(app).await).unwrap();

    let err = maps.resolve("Curitiba, PR").await.unwrap_err();

    assert_eq!(err.kind, crate::error::Kind::Geocode);
    assert_eq!(err.code, "ROUTE_CALCULATION_ERROR");
    assert!(!err.message.contains(TEST_KEY), "{}", err.message);
}

#[tokio::test]
async fn geocode_bad_status_or_body_is_a_geocode_error_without_the_key() {
    use axum::http::StatusCode;
    use axum::routing::get;

    let app = axum::Router::new()
        .route("/geocode", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/geocode/html", get(|| async { "<html>maintenance</html>" }));
    let config = spawn_provider(app).await;

    let maps = GoogleMaps::new(config.clone()).unwrap();
    let err = maps.resolve("A").await.unwrap_err();
    assert_eq!(err.kind, crate::error::Kind::Geocode);
    assert!(err.message.contains("500"));

    let maps = GoogleMaps::new(MapsConfig {
        geocoding_url: format!("{}/html", config.geocoding_url),
        ..config
    })
    .unwrap();
    let err = maps.resolve("A").await.unwrap_err();
    assert_eq!(err.kind, crate::error::Kind::Geocode);
    assert!(!err.message.contains(TEST_KEY), "{}", err.message);
}

#[tokio::test]
async fn plan_sends_key_header_and_selects_route() {
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::post;

    let app = axum::Router::new().route(
        "/routes",
        post(|headers: HeaderMap| async move {
            let key = headers.get("x-goog-api-key").and_then(|v| v.to_str().ok());
            if key != Some(TEST_KEY) {
                return StatusCode::FORBIDDEN.into_response();
            }

            axum::Json(json!({
                "routes": [{
                    "distanceMeters": 8200,
                    "duration": "840s",
                    "polyline": { "encodedPolyline": "xyz" }
                }]
            }))
            .into_response()
        }),
    );
    let maps = GoogleMaps::new(spawn_provider(app).await).unwrap();

    let planned = maps
        .plan(
            Waypoint::Coordinates(Coordinates {
                latitude: 1.0,
                longitude: 2.0,
            }),
            Waypoint::Address("B".into()),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(planned.route.distance_km(), 8.2);
    assert_eq!(planned.route.duration, "840s");
}

#[tokio::test]
async fn plan_failures_and_empty_answers() {
    use axum::http::StatusCode;
    use axum::routing::post;

    let app = axum::Router::new()
        .route("/routes", post(|| async { StatusCode::SERVICE_UNAVAILABLE }))
        .route("/routes/empty", post(|| async { axum::Json(json!({})) }))
        .route(
            "/routes/slow",
            post(|| async {
                tokio::time::sleep(std::time::Duration::from_secs(3)).await;
                axum::Json(json!({}))
            }),
        );
    let config = spawn_provider(app).await;
    let origin = || Waypoint::Address("A".into());
    let destination = || Waypoint::Address("B".into());

    let maps = GoogleMaps::new(config.clone()).unwrap();
    let err = maps.plan(origin(), destination()).await.unwrap_err();
    assert_eq!(err.kind, crate::error::Kind::RouteProvider);
    assert!(err.message.contains("503"));

    let maps = GoogleMaps::new(MapsConfig {
        routes_url: format!("{}/empty", config.routes_url),
        ..config.clone()
    })
    .unwrap();
    assert!(maps.plan(origin(), destination()).await.unwrap().is_none());

    let maps = GoogleMaps::new(MapsConfig {
        routes_url: format!("{}/slow", config.routes_url),
        ..config
    })
    .unwrap();
    let err = maps.plan(origin(), destination()).await.unwrap_err();
    assert_eq!(err.kind, crate::error::Kind::RouteProvider);
}
