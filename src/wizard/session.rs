//! WizardSessions: hosts one controller per browser flow and drives the
//! asynchronous side of each step (fetches and the launch ticker).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::controller::{Advance, Retreat, WizardController};
use super::launch::LaunchProgress;
use super::model::{BusinessForm, WizardResult};
use super::state::WizardStep;
use super::steps::{FetchRequest, FetchTicket, StepView};
use crate::api::MarketingApi;
use crate::error::{Error, WizardError};
use crate::store::{WizardStore, load_or_empty};

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    /// Step 5 was confirmed and the record saved.
    Completed,
    /// Back was pressed on a custom start step.
    ExitToDashboard,
    /// Back was pressed on step 1.
    ToLanding,
}

impl SessionOutcome {
    /// Where the client should navigate next.
    pub fn redirect(&self) -> &'static str {
        match self {
            Self::Completed | Self::ExitToDashboard => "/dashboard",
            Self::ToLanding => "/",
        }
    }
}

/// Client-facing state of a session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    /// 1-based step number.
    pub step: u8,
    pub step_name: WizardStep,
    pub total_steps: u8,
    pub title: &'static str,
    pub progress_percent: u8,
    pub loading: bool,
    pub can_go_back: bool,
    /// The active step, absent once the session has ended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<StepView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<SessionOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<&'static str>,
}

impl SessionSnapshot {
    fn active(session_id: Uuid, controller: &WizardController) -> Self {
        let step = controller.current_step();
        let renderer = controller.renderer();
        Self {
            session_id,
            step: step.number(),
            step_name: step,
            total_steps: WizardStep::COUNT,
            title: step.title(),
            progress_percent: step.progress_percent(),
            loading: renderer.is_loading(),
            can_go_back: renderer.check_back().is_ok(),
            view: Some(renderer.view()),
            outcome: None,
            redirect: None,
        }
    }

    fn ended(session_id: Uuid, step: WizardStep, outcome: SessionOutcome) -> Self {
        Self {
            session_id,
            step: step.number(),
            step_name: step,
            total_steps: WizardStep::COUNT,
            title: step.title(),
            progress_percent: step.progress_percent(),
            loading: false,
            can_go_back: false,
            view: None,
            outcome: Some(outcome),
            redirect: Some(outcome.redirect()),
        }
    }

    /// Whether the session has ended.
    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }
}

type SharedController = Arc<Mutex<WizardController>>;

/// Idle time after which an unfinished session is dropped, unless configured.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(30 * 60);

struct SessionEntry {
    controller: SharedController,
    last_touched: Instant,
}

/// In-memory registry of wizard sessions.
///
/// Sessions nobody has touched for `session_ttl` are evicted whenever a new
/// one is started.
pub struct WizardSessions {
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
    api: Arc<dyn MarketingApi>,
    store: Arc<dyn WizardStore>,
    launch_tick: Duration,
    session_ttl: Duration,
}

impl WizardSessions {
    pub fn new(
        api: Arc<dyn MarketingApi>,
        store: Arc<dyn WizardStore>,
        launch_tick: Duration,
    ) -> Arc<Self> {
        Self::with_ttl(api, store, launch_tick, DEFAULT_SESSION_TTL)
    }

    pub fn with_ttl(
        api: Arc<dyn MarketingApi>,
        store: Arc<dyn WizardStore>,
        launch_tick: Duration,
        session_ttl: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
            api,
            store,
            launch_tick,
            session_ttl,
        })
    }

    /// The store completed wizards are saved to.
    pub fn store(&self) -> Arc<dyn WizardStore> {
        Arc::clone(&self.store)
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Open a session at the 1-based `start_step`.
    pub async fn start(&self, start_step: u8) -> Result<SessionSnapshot, Error> {
        let start = WizardStep::from_number(start_step)
            .ok_or(WizardError::InvalidStartStep(start_step))?;
        let seed = if start.number() > 1 {
            load_or_empty(self.store.as_ref()).await
        } else {
            None
        };

        self.evict_idle().await;

        let id = Uuid::new_v4();
        let controller = WizardController::starting_at(start, seed);
        let shared = Arc::new(Mutex::new(controller));
        self.sessions.write().await.insert(
            id,
            SessionEntry {
                controller: Arc::clone(&shared),
                last_touched: Instant::now(),
            },
        );
        info!(session_id = %id, start_step = %start, "Wizard session started");

        let controller = shared.lock().await;
        self.drive(id, &shared, &controller);
        Ok(SessionSnapshot::active(id, &controller))
    }

    pub async fn snapshot(&self, id: Uuid) -> Result<SessionSnapshot, Error> {
        let shared = self.session(id).await?;
        let controller = shared.lock().await;
        Ok(SessionSnapshot::active(id, &controller))
    }

    /// Toggle an item on the active list step.
    pub async fn toggle(&self, id: Uuid, item: &str) -> Result<SessionSnapshot, Error> {
        let shared = self.session(id).await?;
        let mut controller = shared.lock().await;
        let selected = controller.renderer_mut().toggle(item)?;
        debug!(session_id = %id, item, selected, "Toggled item");
        Ok(SessionSnapshot::active(id, &controller))
    }

    /// Confirm the active step. `form` is only read on the business step.
    pub async fn confirm(
        &self,
        id: Uuid,
        form: Option<BusinessForm>,
    ) -> Result<SessionSnapshot, Error> {
        let shared = self.session(id).await?;
        let mut controller = shared.lock().await;
        let step = controller.current_step();

        match controller.confirm(form)? {
            Advance::Moved(next) => {
                info!(session_id = %id, from = %step, to = %next, "Wizard advanced");
                self.drive(id, &shared, &controller);
                Ok(SessionSnapshot::active(id, &controller))
            }
            Advance::Completed(result) => {
                self.complete(id, &result).await;
                Ok(SessionSnapshot::ended(id, step, SessionOutcome::Completed))
            }
        }
    }

    /// Go back one step, or leave the wizard at its entry boundary.
    pub async fn back(&self, id: Uuid) -> Result<SessionSnapshot, Error> {
        let shared = self.session(id).await?;
        let mut controller = shared.lock().await;
        controller.renderer().check_back()?;
        let step = controller.current_step();

        let outcome = match controller.retreat()? {
            Retreat::Moved(previous) => {
                info!(session_id = %id, from = %step, to = %previous, "Wizard went back");
                self.drive(id, &shared, &controller);
                return Ok(SessionSnapshot::active(id, &controller));
            }
            Retreat::ExitToDashboard => SessionOutcome::ExitToDashboard,
            Retreat::ToLanding => SessionOutcome::ToLanding,
        };

        self.sessions.write().await.remove(&id);
        info!(session_id = %id, outcome = ?outcome, "Wizard session left");
        Ok(SessionSnapshot::ended(id, step, outcome))
    }

    /// Fetch a fresh batch for the active step.
    pub async fn regenerate(&self, id: Uuid) -> Result<SessionSnapshot, Error> {
        let shared = self.session(id).await?;
        let mut controller = shared.lock().await;
        let (ticket, request) = controller.regenerate()?;
        info!(session_id = %id, step = %ticket.step, "Regenerating");
        self.spawn_fetch(id, &shared, ticket, request);
        Ok(SessionSnapshot::active(id, &controller))
    }

    /// Drop sessions idle for longer than the TTL. Returns how many went.
    pub async fn evict_idle(&self) -> usize {
        let ttl = self.session_ttl;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_touched.elapsed() < ttl);
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "Evicted idle wizard sessions");
        }
        evicted
    }

    /// Look up a session and mark it as used.
    async fn session(&self, id: Uuid) -> Result<SharedController, WizardError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(&id)
            .ok_or(WizardError::SessionNotFound(id))?;
        entry.last_touched = Instant::now();
        Ok(Arc::clone(&entry.controller))
    }

    async fn complete(&self, id: Uuid, result: &WizardResult) {
        if let Err(e) = self.store.save(result).await {
            warn!(session_id = %id, error = %e, "Failed to save wizard record");
        }
        self.sessions.write().await.remove(&id);
        info!(
            session_id = %id,
            streets = result.selected_streets.len(),
            offers = result.selected_offers.len(),
            creatives = result.generated_creatives.len(),
            "Wizard completed"
        );
    }

    /// Start whatever background work the freshly built renderer needs.
    fn drive(&self, id: Uuid, shared: &SharedController, controller: &WizardController) {
        let ticket = controller.ticket();
        if let Some(request) = controller.renderer().fetch_request() {
            self.spawn_fetch(id, shared, ticket, request);
        } else if ticket.step == WizardStep::CampaignLaunch
            && !controller.renderer().launch_complete()
        {
            self.spawn_launch_ticker(id, shared, ticket);
        }
    }

    fn spawn_fetch(
        &self,
        id: Uuid,
        shared: &SharedController,
        ticket: FetchTicket,
        request: FetchRequest,
    ) {
        let api = Arc::clone(&self.api);
        let shared = Arc::clone(shared);
        tokio::spawn(async move {
            let result = request.execute(api.as_ref()).await;
            let delivered = shared.lock().await.deliver(ticket, result);
            debug!(session_id = %id, step = %ticket.step, delivered, "Fetch finished");
        });
    }

    fn spawn_launch_ticker(&self, id: Uuid, shared: &SharedController, ticket: FetchTicket) {
        let shared = Arc::clone(shared);
        let period = self.launch_tick;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let increment = LaunchProgress::random_increment(&mut rand::thread_rng());
                if !shared.lock().await.tick_launch(ticket, increment) {
                    break;
                }
            }
            debug!(session_id = %id, "Launch ticker stopped");
        });
    }
}
