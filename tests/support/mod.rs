//! Shared helpers for integration tests: upstream document builders and a
//! wiremock responder that serves record documents by path.

#![allow(dead_code)]

use serde_json::{Value, json};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use gallery_core::GalleryConfig;
use gallery_core::collection::{CollectionClient, HttpSettings, RecordId};

/// Upstream record document with a small image and the given years.
pub fn record_json(id: RecordId, begin: i32, end: i32) -> Value {
    json!({
        "objectID": id,
        "title": format!("Object {id}"),
        "artistDisplayName": "Unknown",
        "objectDate": format!("{begin}"),
        "department": "European Paintings",
        "primaryImage": format!("https://images.test/original/{id}.jpg"),
        "primaryImageSmall": format!("https://images.test/web-large/{id}.jpg"),
        "objectBeginDate": begin,
        "objectEndDate": end,
        "isPublicDomain": true
    })
}

/// Upstream record document with no depiction at all.
pub fn undepicted_json(id: RecordId) -> Value {
    json!({
        "objectID": id,
        "title": format!("Object {id}"),
        "primaryImage": "",
        "primaryImageSmall": "",
        "objectBeginDate": 1900,
        "objectEndDate": 1900
    })
}

/// Listing body for `ids`.
pub fn listing_json(ids: &[RecordId]) -> Value {
    json!({ "total": ids.len(), "objectIDs": ids })
}

/// Serves `/objects/{id}` for any id, dating each record with `years`.
pub struct RecordResponder {
    years: fn(RecordId) -> (i32, i32),
}

impl RecordResponder {
    pub fn new(years: fn(RecordId) -> (i32, i32)) -> Self {
        Self { years }
    }
}

impl Respond for RecordResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let id = request
            .url
            .path()
            .rsplit('/')
            .next()
            .and_then(|segment| segment.parse::<RecordId>().ok());
        match id {
            Some(id) => {
                let (begin, end) = (self.years)(id);
                ResponseTemplate::new(200).set_body_json(record_json(id, begin, end))
            }
            None => ResponseTemplate::new(404),
        }
    }
}

/// Mounts one record document at `/objects/{id}`, expected exactly `times` times.
pub async fn mount_record(server: &MockServer, id: RecordId, body: Value, times: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/objects/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(times)
        .mount(server)
        .await;
}

/// Mounts the dynamic record responder for every `/objects/{id}` path.
pub async fn mount_all_records(server: &MockServer, years: fn(RecordId) -> (i32, i32)) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/objects/\d+$"))
        .respond_with(RecordResponder::new(years))
        .mount(server)
        .await;
}

/// Client pointed at the mock server.
pub fn client_for(server: &MockServer) -> CollectionClient {
    CollectionClient::with_base_url(&server.uri(), &HttpSettings::default())
        .expect("mock server URI is a valid base URL")
}

/// Config pointed at the mock server with pacing disabled.
pub fn config_for(server: &MockServer) -> GalleryConfig {
    GalleryConfig {
        base_url: server.uri(),
        pacing_ms: 0,
        ..GalleryConfig::default()
    }
}

/// Number of record requests the server has seen.
pub async fn record_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path().starts_with("/objects/"))
        .count()
}
