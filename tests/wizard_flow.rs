//! End-to-end tests for the wizard over HTTP.
//!
//! Each test spins up the full router on a random port, backed by an
//! in-memory store and stubbed marketing endpoints, and drives it with
//! reqwest the way a browser client would.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use loca::api::{HttpMarketingApi, MarketingApi};
use loca::config::EndpointConfig;
use loca::server;
use loca::store::{LibSqlStore, WizardStore};
use loca::wizard::WizardSessions;

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Stub the three marketing endpoints with one canned batch each.
async fn start_endpoints() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/streets"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"nearbyStreets": ["Main St", "Oak Ave"]})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/offers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": [
                {"promotionType": "BOGO", "offer": "Buy one, get one free", "validity": "Sunday", "code": "BOGO1"},
                {"promotionType": "Percentage", "offer": "20% off", "validity": "March 31"}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/creatives"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"headline": "Hot slices on Main", "body": "Fresh from the oven", "street": "Main St", "offer": "Buy one, get one free"}
        ])))
        .mount(&server)
        .await;
    server
}

/// Start the app on a random port, return (base url, store, endpoint stub).
async fn start_server() -> (String, Arc<LibSqlStore>, MockServer) {
    let endpoints = start_endpoints().await;
    let api: Arc<dyn MarketingApi> = Arc::new(HttpMarketingApi::new(
        EndpointConfig {
            streets_url: Some(format!("{}/streets", endpoints.uri())),
            offers_url: Some(format!("{}/offers", endpoints.uri())),
            creatives_url: Some(format!("{}/creatives", endpoints.uri())),
        },
        TEST_TIMEOUT,
    ));
    let store = Arc::new(LibSqlStore::new_memory().await.unwrap());
    let sessions = WizardSessions::new(
        api,
        Arc::clone(&store) as Arc<dyn WizardStore>,
        Duration::from_millis(1),
    );
    let app = server::router(sessions);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    (format!("http://127.0.0.1:{port}"), store, endpoints)
}

fn business_form() -> Value {
    json!({
        "businessName": "Mike's Pizza Palace",
        "businessType": "restaurant",
        "description": "Wood-fired pizza",
        "streetName": "Main St",
        "streetNumber": "123",
        "city": "Toronto",
        "province": "Ontario",
        "postalCode": "M5V 2T6"
    })
}

/// Poll the session until `done` holds for its snapshot.
async fn wait_for(
    client: &reqwest::Client,
    base: &str,
    id: &str,
    done: impl Fn(&Value) -> bool,
) -> Value {
    timeout(TEST_TIMEOUT, async {
        loop {
            let snap: Value = client
                .get(format!("{base}/api/wizard/{id}"))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            if done(&snap) {
                return snap;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("session never settled")
}

async fn wait_ready(client: &reqwest::Client, base: &str, id: &str) -> Value {
    wait_for(client, base, id, |s| s["loading"] == false).await
}

async fn post(client: &reqwest::Client, url: String) -> reqwest::Response {
    client.post(url).send().await.unwrap()
}

#[tokio::test]
async fn full_wizard_populates_dashboard() {
    let (base, store, _endpoints) = start_server().await;
    let client = reqwest::Client::new();

    let resp = post(&client, format!("{base}/api/wizard")).await;
    assert_eq!(resp.status(), 201);
    let snap: Value = resp.json().await.unwrap();
    assert_eq!(snap["step"], 1);
    assert_eq!(snap["view"]["kind"], "business_info");
    let id = snap["sessionId"].as_str().unwrap().to_string();

    // Step 1 -> 2
    let resp = client
        .post(format!("{base}/api/wizard/{id}/next"))
        .json(&business_form())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let snap = wait_ready(&client, &base, &id).await;
    assert_eq!(snap["step"], 2);
    let streets = snap["view"]["items"].as_array().unwrap();
    assert_eq!(streets.len(), 2);
    assert!(streets.iter().all(|s| s["selected"] == true));

    // Keep only Main St
    let resp = client
        .post(format!("{base}/api/wizard/{id}/toggle"))
        .json(&json!({"item": "Oak Ave"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let snap: Value = resp.json().await.unwrap();
    assert_eq!(snap["view"]["selectedCount"], 1);

    // Step 2 -> 3
    assert_eq!(post(&client, format!("{base}/api/wizard/{id}/next")).await.status(), 200);
    let snap = wait_ready(&client, &base, &id).await;
    assert_eq!(snap["step"], 3);
    let offers = snap["view"]["items"].as_array().unwrap();
    assert_eq!(offers.len(), 2);
    assert_eq!(snap["view"]["canConfirm"], false);
    let offer_id = offers[0]["item"]["id"].as_str().unwrap().to_string();

    // Nothing selected yet
    let resp = post(&client, format!("{base}/api/wizard/{id}/next")).await;
    assert_eq!(resp.status(), 409);

    client
        .post(format!("{base}/api/wizard/{id}/toggle"))
        .json(&json!({"item": offer_id}))
        .send()
        .await
        .unwrap();

    // Step 3 -> 4
    assert_eq!(post(&client, format!("{base}/api/wizard/{id}/next")).await.status(), 200);
    let snap = wait_ready(&client, &base, &id).await;
    assert_eq!(snap["step"], 4);
    let creative_id = snap["view"]["items"][0]["item"]["id"]
        .as_str()
        .unwrap()
        .to_string();
    client
        .post(format!("{base}/api/wizard/{id}/toggle"))
        .json(&json!({"item": creative_id}))
        .send()
        .await
        .unwrap();

    // Step 4 -> 5, then wait out the launch
    assert_eq!(post(&client, format!("{base}/api/wizard/{id}/next")).await.status(), 200);
    let snap = wait_for(&client, &base, &id, |s| s["view"]["complete"] == true).await;
    assert_eq!(snap["step"], 5);
    assert_eq!(snap["view"]["summary"]["businessName"], "Mike's Pizza Palace");

    let resp = post(&client, format!("{base}/api/wizard/{id}/next")).await;
    assert_eq!(resp.status(), 200);
    let snap: Value = resp.json().await.unwrap();
    assert_eq!(snap["outcome"], "completed");
    assert_eq!(snap["redirect"], "/dashboard");

    // Session is gone once completed
    let resp = client
        .get(format!("{base}/api/wizard/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let record = store.load().await.unwrap().unwrap();
    assert_eq!(record.selected_streets, vec!["Main St"]);
    assert_eq!(record.selected_offers.len(), 1);
    assert_eq!(record.generated_creatives.len(), 1);

    let html = client
        .get(format!("{base}/campaigns"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains(
        "<tr><td>Buy one, get one free</td><td>discount</td><td>BOGO - Valid until Sunday - Code: BOGO1</td></tr>"
    ));
    assert!(!html.contains("You haven't created any campaigns yet."));

    let html = client
        .get(format!("{base}/dashboard"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("Performance Dashboard - Mike's Pizza Palace"));
    assert!(html.contains("Hot slices on Main"));
}

#[tokio::test]
async fn empty_store_shows_empty_states() {
    let (base, _store, _endpoints) = start_server().await;
    let client = reqwest::Client::new();

    let html = client
        .get(format!("{base}/campaigns"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("You haven't created any campaigns yet."));

    let html = client
        .get(format!("{base}/creatives"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("You haven't generated any creatives yet."));
}

#[tokio::test]
async fn invalid_business_form_reports_fields() {
    let (base, _store, _endpoints) = start_server().await;
    let client = reqwest::Client::new();

    let snap: Value = post(&client, format!("{base}/api/wizard"))
        .await
        .json()
        .await
        .unwrap();
    let id = snap["sessionId"].as_str().unwrap();

    let resp = client
        .post(format!("{base}/api/wizard/{id}/next"))
        .json(&json!({"businessName": "Mike's"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 422);
    let body: Value = resp.json().await.unwrap();
    let fields = body["fields"].as_array().unwrap();
    assert!(fields.contains(&json!("streetName")));
    assert!(fields.contains(&json!("postalCode")));
}

#[tokio::test]
async fn deep_link_back_exits_to_dashboard() {
    let (base, _store, _endpoints) = start_server().await;
    let client = reqwest::Client::new();

    let resp = post(&client, format!("{base}/api/wizard?startStep=3")).await;
    assert_eq!(resp.status(), 201);
    let snap: Value = resp.json().await.unwrap();
    assert_eq!(snap["step"], 3);
    let id = snap["sessionId"].as_str().unwrap();

    let resp = post(&client, format!("{base}/api/wizard/{id}/back")).await;
    let snap: Value = resp.json().await.unwrap();
    assert_eq!(snap["outcome"], "exit_to_dashboard");
    assert_eq!(snap["redirect"], "/dashboard");
}

#[tokio::test]
async fn out_of_range_start_step_is_rejected() {
    let (base, _store, _endpoints) = start_server().await;
    let client = reqwest::Client::new();

    let resp = post(&client, format!("{base}/api/wizard?startStep=9")).await;
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn regenerate_fetches_a_fresh_batch() {
    let (base, _store, endpoints) = start_server().await;
    let client = reqwest::Client::new();

    let snap: Value = post(&client, format!("{base}/api/wizard"))
        .await
        .json()
        .await
        .unwrap();
    let id = snap["sessionId"].as_str().unwrap().to_string();
    client
        .post(format!("{base}/api/wizard/{id}/next"))
        .json(&business_form())
        .send()
        .await
        .unwrap();
    wait_ready(&client, &base, &id).await;
    post(&client, format!("{base}/api/wizard/{id}/next")).await;
    wait_ready(&client, &base, &id).await;

    let resp = post(&client, format!("{base}/api/wizard/{id}/regenerate")).await;
    assert_eq!(resp.status(), 200);
    let snap = wait_ready(&client, &base, &id).await;
    assert_eq!(snap["step"], 3);
    assert_eq!(snap["view"]["items"].as_array().unwrap().len(), 2);

    let offer_calls = endpoints
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/offers")
        .count();
    assert_eq!(offer_calls, 2);
}
