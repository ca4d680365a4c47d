//! HTML routes: landing page, server-rendered wizard and dashboard pages.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Form, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use super::html;
use super::view::{CampaignsPage, CreativesPage, PerformancePage};
use crate::error::{Error, ValidationError, WizardError};
use crate::store::{WizardStore, load_or_empty};
use crate::wizard::model::BusinessForm;
use crate::wizard::session::{SessionSnapshot, WizardSessions};

/// Shared state for page routes.
#[derive(Clone)]
pub struct PageState {
    pub sessions: Arc<WizardSessions>,
    pub store: Arc<dyn WizardStore>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LandingQuery {
    start_step: Option<String>,
}

fn message_page(status: StatusCode, message: &str) -> Response {
    let body = format!(
        "<!DOCTYPE html>\n<html lang=\"en\"><head><meta charset=\"utf-8\"><title>{}</title></head>\
         <body><p>{}</p><p><a href=\"/\">Back to {}</a></p></body></html>\n",
        html::SITE_NAME,
        html::escape(message),
        html::SITE_NAME
    );
    (status, Html(body)).into_response()
}

/// GET /?startStep=N
///
/// Without `startStep` this is the landing page; with it a wizard session
/// is opened and the browser is sent to it.
async fn landing(State(state): State<PageState>, Query(query): Query<LandingQuery>) -> Response {
    let Some(raw) = query.start_step else {
        return Html(html::render_landing()).into_response();
    };
    let Ok(start_step) = raw.trim().parse::<u8>() else {
        return message_page(StatusCode::BAD_REQUEST, "Invalid start step");
    };
    match state.sessions.start(start_step).await {
        Ok(snapshot) => Redirect::to(&format!("/wizard/{}", snapshot.session_id)).into_response(),
        Err(e) => message_page(StatusCode::BAD_REQUEST, &e.to_string()),
    }
}

async fn dashboard(State(state): State<PageState>) -> Html<String> {
    let record = load_or_empty(state.store.as_ref()).await;
    Html(html::render_dashboard(&PerformancePage::from_record(record.as_ref())))
}

async fn campaigns(State(state): State<PageState>) -> Html<String> {
    let record = load_or_empty(state.store.as_ref()).await;
    Html(html::render_campaigns(&CampaignsPage::from_record(record.as_ref())))
}

async fn creatives(State(state): State<PageState>) -> Html<String> {
    let record = load_or_empty(state.store.as_ref()).await;
    Html(html::render_creatives(&CreativesPage::from_record(record.as_ref())))
}

// ── Wizard ──────────────────────────────────────────────────────────────

fn parse_session_id(id: &str) -> Result<Uuid, Response> {
    Uuid::parse_str(id).map_err(|_| message_page(StatusCode::BAD_REQUEST, "Invalid session ID"))
}

/// Send the browser to wherever the session now is.
fn follow(snapshot: &SessionSnapshot) -> Response {
    match snapshot.redirect {
        Some(target) => Redirect::to(target).into_response(),
        None => Redirect::to(&format!("/wizard/{}", snapshot.session_id)).into_response(),
    }
}

/// Re-render the current step with the error that stopped the action.
async fn failed(sessions: &WizardSessions, id: Uuid, err: Error) -> Response {
    let (status, errors) = match &err {
        Error::Wizard(WizardError::SessionNotFound(_)) => {
            return message_page(StatusCode::NOT_FOUND, "This wizard session has ended.");
        }
        Error::Validation(v) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            v.fields
                .iter()
                .map(|f| format!("Please check the {f} field."))
                .collect(),
        ),
        Error::Wizard(_) => (StatusCode::CONFLICT, vec![err.to_string()]),
        Error::Config(_) | Error::Store(_) | Error::Api(_) => {
            warn!(session_id = %id, error = %err, "Wizard action failed");
            (StatusCode::INTERNAL_SERVER_ERROR, vec![err.to_string()])
        }
    };
    match sessions.snapshot(id).await {
        Ok(snapshot) => (status, Html(html::render_wizard(&snapshot, &errors))).into_response(),
        Err(_) => message_page(StatusCode::NOT_FOUND, "This wizard session has ended."),
    }
}

async fn finish(
    sessions: &WizardSessions,
    id: Uuid,
    result: Result<SessionSnapshot, Error>,
) -> Response {
    match result {
        Ok(snapshot) => follow(&snapshot),
        Err(e) => failed(sessions, id, e).await,
    }
}

/// Build a business form from urlencoded fields. Absent fields are empty.
fn business_form_from_fields(
    fields: &HashMap<String, String>,
) -> Result<BusinessForm, ValidationError> {
    let text = |name: &str| fields.get(name).cloned().unwrap_or_default();
    let max_discount_percentage = match fields.get("maxDiscountPercentage").map(|v| v.trim()) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<u32>().map_err(|_| ValidationError {
            fields: vec!["maxDiscountPercentage".to_string()],
        })?),
    };
    Ok(BusinessForm {
        business_name: text("businessName"),
        business_type: text("businessType"),
        description: text("description"),
        street_name: text("streetName"),
        street_number: text("streetNumber"),
        city: text("city"),
        province: text("province"),
        postal_code: text("postalCode"),
        website: text("website"),
        phone: text("phone"),
        max_discount_percentage,
    })
}

/// GET /wizard/{id}
async fn wizard_page(State(state): State<PageState>, Path(id): Path<String>) -> Response {
    let id = match parse_session_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.sessions.snapshot(id).await {
        Ok(snapshot) => Html(html::render_wizard(&snapshot, &[])).into_response(),
        Err(e) => {
            debug!(session_id = %id, error = %e, "Wizard page requested for unknown session");
            message_page(StatusCode::NOT_FOUND, "This wizard session has ended.")
        }
    }
}

/// POST /wizard/{id}/next
async fn wizard_next(
    State(state): State<PageState>,
    Path(id): Path<String>,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let id = match parse_session_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let form = if fields.is_empty() {
        None
    } else {
        match business_form_from_fields(&fields) {
            Ok(form) => Some(form),
            Err(e) => return failed(&state.sessions, id, e.into()).await,
        }
    };
    let result = state.sessions.confirm(id, form).await;
    finish(&state.sessions, id, result).await
}

#[derive(Debug, Deserialize)]
struct ToggleForm {
    item: String,
}

/// POST /wizard/{id}/toggle
async fn wizard_toggle(
    State(state): State<PageState>,
    Path(id): Path<String>,
    Form(form): Form<ToggleForm>,
) -> Response {
    let id = match parse_session_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let result = state.sessions.toggle(id, &form.item).await;
    finish(&state.sessions, id, result).await
}

/// POST /wizard/{id}/back
async fn wizard_back(State(state): State<PageState>, Path(id): Path<String>) -> Response {
    let id = match parse_session_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let result = state.sessions.back(id).await;
    finish(&state.sessions, id, result).await
}

/// POST /wizard/{id}/regenerate
async fn wizard_regenerate(State(state): State<PageState>, Path(id): Path<String>) -> Response {
    let id = match parse_session_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let result = state.sessions.regenerate(id).await;
    finish(&state.sessions, id, result).await
}

/// Build the HTML page routes.
pub fn page_routes(state: PageState) -> Router {
    Router::new()
        .route("/", get(landing))
        .route("/dashboard", get(dashboard))
        .route("/campaigns", get(campaigns))
        .route("/creatives", get(creatives))
        .route("/wizard/{id}", get(wizard_page))
        .route("/wizard/{id}/next", post(wizard_next))
        .route("/wizard/{id}/toggle", post(wizard_toggle))
        .route("/wizard/{id}/back", post(wizard_back))
        .route("/wizard/{id}/regenerate", post(wizard_regenerate))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, header};
    use tower::ServiceExt;

    use super::*;
    use crate::api::{CreativeRequest, MarketingApi, OfferQuery};
    use crate::error::ApiError;
    use crate::store::LibSqlStore;
    use crate::wizard::model::{Creative, Offer, WizardResult};

    struct NoApi;

    #[async_trait]
    impl MarketingApi for NoApi {
        async fn nearby_streets(&self, _address: &str) -> Result<Vec<String>, ApiError> {
            Ok(Vec::new())
        }

        async fn generate_offers(&self, _query: &OfferQuery) -> Result<Vec<Offer>, ApiError> {
            Ok(Vec::new())
        }

        async fn generate_creatives(
            &self,
            _request: &CreativeRequest,
        ) -> Result<Vec<Creative>, ApiError> {
            Ok(Vec::new())
        }
    }

    async fn app() -> (Router, Arc<LibSqlStore>) {
        let store = Arc::new(LibSqlStore::new_memory().await.unwrap());
        let sessions =
            WizardSessions::new(Arc::new(NoApi), store.clone(), Duration::from_millis(1));
        let router = page_routes(PageState {
            sessions,
            store: store.clone(),
        });
        (router, store)
    }

    async fn get_page(app: &Router, uri: &str) -> (StatusCode, Option<String>, String) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.clone().oneshot(request).await.unwrap();
        let status = resp.status();
        let location = resp
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, location, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn post_form(app: &Router, uri: &str, body: &str) -> (StatusCode, Option<String>) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        let resp = app.clone().oneshot(request).await.unwrap();
        let location = resp
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        (resp.status(), location)
    }

    #[tokio::test]
    async fn landing_without_start_step() {
        let (app, _) = app().await;
        let (status, _, body) = get_page(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(html::TAGLINE));
    }

    #[tokio::test]
    async fn start_step_redirects_into_wizard() {
        let (app, _) = app().await;
        let (status, location, _) = get_page(&app, "/?startStep=1").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        let location = location.unwrap();
        assert!(location.starts_with("/wizard/"));

        let (status, _, body) = get_page(&app, &location).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Setup Wizard <strong>1/5</strong>"));
        assert!(body.contains("name=\"businessName\""));
    }

    #[tokio::test]
    async fn bad_start_step() {
        let (app, _) = app().await;
        let (status, _, _) = get_page(&app, "/?startStep=abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _, _) = get_page(&app, "/?startStep=7").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn campaigns_page_without_record() {
        let (app, _) = app().await;
        let (status, _, body) = get_page(&app, "/campaigns").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("You haven't created any campaigns yet."));
    }

    #[tokio::test]
    async fn dashboard_reads_stored_record() {
        let (app, store) = app().await;
        let mut record = WizardResult::default();
        record.business_data.business_name = "Mike's Pizza Palace".to_string();
        store.save(&record).await.unwrap();

        let (_, _, body) = get_page(&app, "/dashboard").await;
        assert!(body.contains("Performance Dashboard - Mike's Pizza Palace"));
        assert!(body.contains("Campaign data will appear here once available."));
    }

    #[tokio::test]
    async fn invalid_form_rerenders_with_errors() {
        let (app, _) = app().await;
        let (_, location, _) = get_page(&app, "/?startStep=1").await;
        let location = location.unwrap();

        let (status, _) = post_form(
            &app,
            &format!("{location}/next"),
            "businessName=Pizza&postalCode=nope",
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn back_from_first_step_returns_to_landing() {
        let (app, _) = app().await;
        let (_, location, _) = get_page(&app, "/?startStep=1").await;
        let location = location.unwrap();

        let (status, target) = post_form(&app, &format!("{location}/back"), "").await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(target.as_deref(), Some("/"));

        let (status, _, _) = get_page(&app, &location).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn back_from_new_campaign_shortcut_goes_to_dashboard() {
        let (app, _) = app().await;
        let (_, location, _) = get_page(&app, "/?startStep=2").await;
        let location = location.unwrap();

        let (_, target) = post_form(&app, &format!("{location}/back"), "").await;
        assert_eq!(target.as_deref(), Some("/dashboard"));
    }

    #[test]
    fn form_fields_map_to_business_form() {
        let fields: HashMap<String, String> = [
            ("businessName", "Pizza"),
            ("maxDiscountPercentage", "25"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let form = business_form_from_fields(&fields).unwrap();
        assert_eq!(form.business_name, "Pizza");
        assert_eq!(form.max_discount_percentage, Some(25));
        assert!(form.city.is_empty());

        let mut bad = fields.clone();
        bad.insert("maxDiscountPercentage".to_string(), "lots".to_string());
        assert_eq!(
            business_form_from_fields(&bad).unwrap_err().fields,
            vec!["maxDiscountPercentage"]
        );
    }
}
