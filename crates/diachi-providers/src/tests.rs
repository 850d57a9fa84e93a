//! Adapter tests against in-process fake upstreams.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex},
  time::Duration,
};

use axum::{
  Json, Router,
  extract::{Path, Query, State},
  http::StatusCode,
  routing::get,
};
use diachi_core::{
  AddressProvider, CandidateKind, Coordinates, ProviderError, ReverseGeocoder,
  Source, matching::same_place,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use crate::{DirectoryClient, DirectoryConfig, GeocoderClient, GeocoderConfig};

type Calls = Arc<Mutex<Vec<String>>>;

/// Bind `router` on an ephemeral port and return its base URL.
async fn serve(router: Router) -> String {
  let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
  let addr = listener.local_addr().expect("local addr");
  tokio::spawn(async move {
    axum::serve(listener, router).await.expect("fake upstream");
  });
  format!("http://{addr}")
}

fn directory(base_url: String) -> DirectoryClient {
  DirectoryClient::new(DirectoryConfig {
    base_url,
    timeout: Duration::from_secs(5),
  })
  .expect("directory client")
}

fn geocoder(base_url: String, token: Option<&str>) -> GeocoderClient {
  GeocoderClient::new(GeocoderConfig {
    base_url,
    access_token: token.map(str::to_owned),
    ..GeocoderConfig::default()
  })
  .expect("geocoder client")
}

// ─── Directory ───────────────────────────────────────────────────────────────

async fn directory_search(
  State(calls): State<Calls>,
  Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
  calls.lock().unwrap().push(format!(
    "search q={} limit={}",
    params.get("q").cloned().unwrap_or_default(),
    params.get("limit").cloned().unwrap_or_default(),
  ));
  Json(json!({
    "data": [
      {
        "id": 760,
        "name": "Quận 1",
        "type": "district",
        "province": "Hồ Chí Minh",
        "coordinates": { "lat": 10.7756, "lng": 106.7004 }
      },
      {
        "name": "Phường Bến Nghé",
        "fullName": "Phường Bến Nghé, Quận 1, Hồ Chí Minh",
        "type": "ward",
        "district": "Quận 1",
        "province": "Hồ Chí Minh"
      }
    ],
    "total": 2
  }))
}

async fn provinces(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
  let all = [
    json!({ "id": 79, "name": "Hồ Chí Minh", "code": "HCM" }),
    json!({ "id": 1, "name": "Hà Nội", "code": "HN" }),
  ];
  let search = params.get("search").map(|s| s.to_lowercase());
  let data: Vec<Value> = all
    .into_iter()
    .filter(|p| match &search {
      Some(s) => p["code"].as_str().unwrap_or_default().to_lowercase().contains(s),
      None => true,
    })
    .collect();
  let total = data.len();
  Json(json!({ "data": data, "total": total }))
}

async fn districts(Path(province_id): Path<String>) -> Json<Value> {
  Json(json!({
    "data": [
      { "id": "760", "name": "Quận 1", "provinceId": province_id, "type": "district" },
      { "id": "770", "name": "Quận 3", "provinceId": province_id, "type": "district" }
    ]
  }))
}

fn directory_router(calls: Calls) -> Router {
  Router::new()
    .route("/api/addresses/search", get(directory_search))
    .route("/api/addresses/provinces", get(provinces))
    .route("/api/addresses/districts/{id}", get(districts))
    .route(
      "/api/addresses/suggestions",
      get(|| async { Json(json!({ "data": [{ "id": "s1", "name": "Landmark 81", "type": "landmark" }] })) }),
    )
    .with_state(calls)
}

#[tokio::test]
async fn directory_search_normalises_items() {
  let calls = Calls::default();
  let base = serve(directory_router(calls.clone())).await;
  let client = directory(format!("{base}/api"));

  let results = client.search("  Quận 1 ", None, 4).await.unwrap();
  assert_eq!(results.len(), 2);

  let district = &results[0];
  assert_eq!(district.id, "directory:760");
  assert_eq!(district.kind, CandidateKind::District);
  assert_eq!(district.source, Source::Directory);
  assert_eq!(district.coordinates, Some(Coordinates::new(106.7004, 10.7756)));
  assert_eq!(
    district.components.as_ref().and_then(|c| c.district.as_deref()),
    Some("Quận 1")
  );

  let ward = &results[1];
  assert!(ward.id.starts_with("directory:"));
  assert_eq!(ward.full_name, "Phường Bến Nghé, Quận 1, Hồ Chí Minh");
  assert_eq!(ward.kind, CandidateKind::Neighborhood);

  assert_eq!(calls.lock().unwrap().as_slice(), ["search q=Quận 1 limit=4"]);
}

#[tokio::test]
async fn directory_hierarchy_lookups() {
  let base = serve(directory_router(Calls::default())).await;
  let client = directory(format!("{base}/api/"));

  let all = client.list_provinces(None).await.unwrap();
  assert_eq!(all.len(), 2);
  assert_eq!(all[0].id, "79");

  let filtered = client.list_provinces(Some("hcm")).await.unwrap();
  assert_eq!(filtered.len(), 1);
  assert_eq!(filtered[0].name, "Hồ Chí Minh");

  let districts = client.list_districts("79", Some("quan")).await.unwrap();
  assert_eq!(districts.len(), 2);
  assert_eq!(districts[0].province_id.as_deref(), Some("79"));
}

#[tokio::test]
async fn directory_suggestions_come_through_the_provider_trait() {
  let base = serve(directory_router(Calls::default())).await;
  let client = directory(format!("{base}/api"));

  let suggestions = AddressProvider::suggestions(&client).await.unwrap();
  assert_eq!(suggestions.len(), 1);
  assert_eq!(suggestions[0].kind, CandidateKind::PointOfInterest);
}

#[tokio::test]
async fn directory_server_error_is_a_transport_error() {
  let router = Router::new().route(
    "/api/addresses/search",
    get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
  );
  let base = serve(router).await;
  let err = directory(format!("{base}/api"))
    .search("Quận 1", None, 4)
    .await
    .unwrap_err();
  assert!(matches!(err, ProviderError::Transport(_)), "{err:?}");
}

#[tokio::test]
async fn directory_malformed_payload_is_a_data_error() {
  let router = Router::new().route(
    "/api/addresses/search",
    get(|| async { Json(json!({ "items": [] })) }),
  );
  let base = serve(router).await;
  let err = directory(format!("{base}/api"))
    .search("Quận 1", None, 4)
    .await
    .unwrap_err();
  assert!(matches!(err, ProviderError::Data(_)), "{err:?}");
}

#[tokio::test]
async fn unreachable_directory_is_a_transport_error() {
  // Bind then drop to get a port nothing listens on.
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  drop(listener);

  let err = directory(format!("http://{addr}/api"))
    .search("Quận 1", None, 4)
    .await
    .unwrap_err();
  assert!(matches!(err, ProviderError::Transport(_)), "{err:?}");
}

// ─── Geocoder ────────────────────────────────────────────────────────────────

async fn places(
  State(calls): State<Calls>,
  Path(term): Path<String>,
  Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
  calls.lock().unwrap().push(format!(
    "{term} proximity={}",
    params.get("proximity").cloned().unwrap_or_default()
  ));
  if params.get("access_token").map(String::as_str) != Some("pk.test") {
    return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Not Authorized" })));
  }

  let term = term.trim_end_matches(".json");
  if term.starts_with("106.7017,10.7769") {
    return (
      StatusCode::OK,
      Json(json!({
        "features": [{
          "id": "address.1",
          "text": "Nguyễn Huệ",
          "place_name": "12 Nguyễn Huệ, Bến Nghé, Quận 1, Hồ Chí Minh, Việt Nam",
          "place_type": ["address"],
          "center": [106.7019, 10.7771],
          "relevance": 1.0,
          "context": [{ "id": "locality.1", "text": "Quận 1" }]
        }]
      })),
    );
  }
  if term == "Nguyễn Huệ" {
    let feature = |id: &str, number: &str, center: [f64; 2]| {
      json!({
        "id": id,
        "text": "Nguyễn Huệ",
        "address": number,
        "place_name": format!("{number} Nguyễn Huệ, Bến Nghé, Quận 1, Hồ Chí Minh, Việt Nam"),
        "place_type": ["address"],
        "center": center,
        "relevance": 0.9
      })
    };
    return (
      StatusCode::OK,
      Json(json!({
        "features": [
          feature("address.12", "12", [106.7033, 10.7740]),
          feature("address.120", "120", [106.7050, 10.7772]),
        ]
      })),
    );
  }
  if term.starts_with("0,0") {
    return (StatusCode::OK, Json(json!({ "features": [] })));
  }

  let features: Vec<Value> = (0..8)
    .map(|i| {
      json!({
        "id": format!("place.{i}"),
        "text": format!("{term} {i}"),
        "place_name": format!("{term} {i}, Hồ Chí Minh"),
        "place_type": ["place"],
        "center": [106.6 + f64::from(i) * 0.01, 10.7],
        "relevance": 0.9
      })
    })
    .collect();
  (StatusCode::OK, Json(json!({ "features": features })))
}

fn geocoder_router(calls: Calls) -> Router {
  Router::new()
    .route("/geocoding/v5/mapbox.places/{term}", get(places))
    .with_state(calls)
}

#[tokio::test]
async fn geocoder_forward_respects_limit_and_proximity() {
  let calls = Calls::default();
  let base = serve(geocoder_router(calls.clone())).await;
  let client = geocoder(base, Some("pk.test"));

  let near = Coordinates::new(106.7, 10.78);
  let results = client.search("Bến Thành", Some(near), 6).await.unwrap();
  assert_eq!(results.len(), 6);
  assert!(results.iter().all(|c| c.source == Source::Geocoder));
  assert_eq!(results[0].id, "geocoder:place.0");

  let recorded = calls.lock().unwrap().clone();
  assert_eq!(recorded, ["Bến Thành.json proximity=106.7,10.78"]);
}

#[tokio::test]
async fn geocoder_address_names_carry_the_house_number() {
  let base = serve(geocoder_router(Calls::default())).await;
  let results = geocoder(base, Some("pk.test"))
    .search("Nguyễn Huệ", None, 6)
    .await
    .unwrap();

  let names: Vec<_> = results.iter().map(|c| c.name.as_str()).collect();
  assert_eq!(names, ["12 Nguyễn Huệ", "120 Nguyễn Huệ"]);
  assert!(results.iter().all(|c| c.kind == CandidateKind::Address));
  assert!(!same_place(&results[0], &results[1]));
}

#[tokio::test]
async fn geocoder_without_token_fails_before_any_request() {
  let calls = Calls::default();
  let base = serve(geocoder_router(calls.clone())).await;
  let client = geocoder(base, None);

  let err = client.search("Quận 1", None, 6).await.unwrap_err();
  assert!(matches!(err, ProviderError::Config(_)), "{err:?}");
  assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn geocoder_rejected_token_is_a_config_error() {
  let base = serve(geocoder_router(Calls::default())).await;
  let err = geocoder(base, Some("pk.wrong"))
    .search("Quận 1", None, 6)
    .await
    .unwrap_err();
  assert!(matches!(err, ProviderError::Config(_)), "{err:?}");
}

#[tokio::test]
async fn geocoder_reverse_returns_the_first_feature_at_the_tapped_point() {
  let calls = Calls::default();
  let base = serve(geocoder_router(calls.clone())).await;
  let client = geocoder(base, Some("pk.test"));

  let tapped = Coordinates::new(106.7017, 10.7769);
  let candidate = client.reverse_geocode(tapped).await.unwrap();
  assert_eq!(
    candidate.full_name,
    "12 Nguyễn Huệ, Bến Nghé, Quận 1, Hồ Chí Minh, Việt Nam"
  );
  assert_eq!(candidate.kind, CandidateKind::Address);
  assert_eq!(candidate.coordinates, Some(tapped));
  assert_eq!(calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn geocoder_reverse_with_no_features_is_a_data_error() {
  let base = serve(geocoder_router(Calls::default())).await;
  let err = geocoder(base, Some("pk.test"))
    .reverse_geocode(Coordinates::new(0.0, 0.0))
    .await
    .unwrap_err();
  assert!(matches!(err, ProviderError::Data(_)), "{err:?}");
}
