mod handlers;

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header, HeaderValue, Method},
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::{DynAPI, API};
use crate::config::Config;
use crate::error::{config_error, unexpected_error, Error};
use crate::server::handlers::rides;

pub fn router(api: DynAPI, allowed_origins: &[String]) -> Result<Router, Error> {
    let origins = allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|_| config_error(format!("invalid allowed origin {:?}", origin)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([header::CONTENT_TYPE]);

    let app = Router::new()
        .route("/api/ride/estimate", post(rides::estimate))
        .route("/api/ride/confirm", patch(rides::confirm))
        .route("/api/ride/:customer_id", get(rides::list))
        .layer(Extension(api))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(app)
}

pub async fn serve<T: API + Sync + Send + 'static>(config: &Config, api: T) -> Result<(), Error> {
    let api = Arc::new(api) as DynAPI;

    let app = router(api, &config.allowed_origins)?;

    let addr = config.addr();

    tracing::info!("listening on {}", addr);

    axum::Server::try_bind(&addr)
        .map_err(unexpected_error)?
        .serve(app.into_make_service())
        .await
        .map_err(unexpected_error)
}

#[cfg(test)]
fn app_for(engine: crate::engine::Engine) -> Router {
    let api = Arc::new(engine) as DynAPI;
    router(api, &["http://localhost:8080".to_string()]).unwrap()
}

#[cfg(test)]
async fn build_app(planner: crate::test_support::StubPlanner) -> Router {
    use crate::test_support::{engine_with, StubGeocoder};

    app_for(engine_with(StubGeocoder::default(), planner).await)
}

#[cfg(test)]
fn json_request(
    method: &str,
    uri: &str,
    body: serde_json::Value,
) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap()
}

#[cfg(test)]
fn get_request(uri: &str) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::builder()
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap()
}

#[cfg(test)]
async fn send(
    app: &Router,
    request: axum::http::Request<axum::body::Body>,
) -> (axum::http::StatusCode, serde_json::Value) {
    use tower::ServiceExt;

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();

    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn estimate_returns_sorted_options() {
    use crate::test_support::StubPlanner;
    use axum::http::StatusCode;
    use serde_json::json;

    let app = build_app(StubPlanner::route(12_000.0)).await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/ride/estimate",
            json!({ "customer_id": "c1", "origin": "A St", "destination": "B Av" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["distance"], 12.0);
    assert_eq!(body["duration"], "900s");
    assert_eq!(body["options"][0]["id"], 1);
    assert_eq!(body["options"][0]["value"], 30.0);
    assert_eq!(body["options"][2]["value"], 120.0);
    assert!(body["routeResponse"]["routes"].is_array());
    assert!(body["origin"]["latitude"].is_number());
}

#[tokio::test]
async fn estimate_error_bodies() {
    use crate::test_support::StubPlanner;
    use axum::http::StatusCode;
    use serde_json::json;

    let app = build_app(StubPlanner::NoRoute).await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/ride/estimate",
            json!({ "customer_id": "c1", "origin": "A", "destination": "A" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "INVALID_DATA");
    assert!(body["error_description"].is_string());

    let (status, body) = send(
        &app,
        json_request("POST", "/api/ride/estimate", json!({ "origin": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "INVALID_DATA");

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/ride/estimate",
            json!({ "customer_id": "c1", "origin": "A", "destination": "B" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "ROUTE_NOT_FOUND");

    let app = build_app(StubPlanner::Fail).await;
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/ride/estimate",
            json!({ "customer_id": "c1", "origin": "A", "destination": "B" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_code"], "ROUTE_CALCULATION_ERROR");
}

#[tokio::test]
async fn confirm_then_history() {
    use crate::test_support::StubPlanner;
    use axum::http::StatusCode;
    use serde_json::json;

    let app = build_app(StubPlanner::NoRoute).await;

    let (status, body) = send(&app, get_request("/api/ride/12345")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "NO_RIDES_FOUND");

    let confirmation = json!({
        "customer_id": "12345",
        "origin": "Curitiba, PR",
        "destination": "São Paulo, SP",
        "distance": 416.156,
        "duration": "20335s",
        "driver": { "id": 1, "name": "Homer Simpson" },
        "value": 1040.39
    });

    let (status, body) = send(
        &app,
        json_request("PATCH", "/api/ride/confirm", confirmation),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = send(&app, get_request("/api/ride/12345?driver_id=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["customer_id"], "12345");
    assert_eq!(body["rides"].as_array().unwrap().len(), 1);
    assert_eq!(body["rides"][0]["driver"]["id"], 1);
    assert_eq!(body["rides"][0]["value"], 1040.39);
    assert!(body["rides"][0]["date"].is_string());

    let (status, body) = send(&app, get_request("/api/ride/12345?driver_id=42")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "INVALID_DRIVER");
}

#[tokio::test]
async fn confirm_stores_the_roster_driver_name() {
    use crate::test_support::StubPlanner;
    use axum::http::StatusCode;
    use serde_json::json;

    let app = build_app(StubPlanner::NoRoute).await;

    let without_name = json!({
        "customer_id": "c9",
        "origin": "A",
        "destination": "B",
        "distance": 20.0,
        "duration": "600s",
        "driver": { "id": 1 },
        "value": 50.0
    });
    let (status, _) = send(
        &app,
        json_request("PATCH", "/api/ride/confirm", without_name),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let wrong_name = json!({
        "customer_id": "c9",
        "origin": "A",
        "destination": "B",
        "distance": 20.0,
        "duration": "600s",
        "driver": { "id": 2, "name": "Somebody Else" },
        "value": 50.0
    });
    let (status, _) = send(&app, json_request("PATCH", "/api/ride/confirm", wrong_name)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, get_request("/api/ride/c9")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rides"][0]["driver"]["name"], "Dominic Toretto");
    assert_eq!(body["rides"][1]["driver"]["name"], "Homer Simpson");
}

#[tokio::test]
async fn confirm_driver_errors() {
    use crate::test_support::StubPlanner;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;

    let app = build_app(StubPlanner::NoRoute).await;

    let ride = |driver_id: i64, distance: f64| {
        json!({
            "customer_id": "c1",
            "origin": "A",
            "destination": "B",
            "distance": distance,
            "duration": "600s",
            "driver": { "id": driver_id, "name": "someone" },
            "value": 10.0
        })
    };

    let (status, body) = send(
        &app,
        json_request("PATCH", "/api/ride/confirm", ride(9, 20.0)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "DRIVER_NOT_FOUND");

    let (status, body) = send(
        &app,
        json_request("PATCH", "/api/ride/confirm", ride(2, 3.0)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_ACCEPTABLE);
    assert_eq!(body["error_code"], "INVALID_DISTANCE");

    let (status, body) = send(
        &app,
        Request::builder()
            .method("PATCH")
            .uri("/api/ride/confirm")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_code"], "INVALID_DATA");
}

#[tokio::test]
async fn store_failures_are_internal_errors_without_detail() {
    use crate::test_support::engine_with_broken_store;
    use axum::http::StatusCode;
    use serde_json::json;

    let app = app_for(engine_with_broken_store().await);

    let confirmation = json!({
        "customer_id": "c1",
        "origin": "A",
        "destination": "B",
        "distance": 20.0,
        "duration": "600s",
        "driver": { "id": 1 },
        "value": 50.0
    });
    let (status, body) = send(
        &app,
        json_request("PATCH", "/api/ride/confirm", confirmation),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_code"], "INTERNAL_SERVER_ERROR");
    assert_eq!(body["error_description"], "failed to save the ride");

    let (status, body) = send(&app, get_request("/api/ride/c1")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error_code"], "INTERNAL_SERVER_ERROR");
    assert_eq!(body["error_description"], "failed to fetch rides");

    let description = body["error_description"].as_str().unwrap().to_lowercase();
    assert!(!description.contains("pool"));
    assert!(!description.contains("sqlx"));
}

#[test]
fn invalid_origin_is_rejected() {
    use crate::test_support::{engine_with, StubGeocoder, StubPlanner};
    use tokio_test::block_on;

    block_on(async {
        let api =
            Arc::new(engine_with(StubGeocoder::default(), StubPlanner::NoRoute).await) as DynAPI;

        assert!(router(api, &["not a\norigin".to_string()]).is_err());
    });
}
