//! Assembles the full HTTP surface.

use std::sync::Arc;

use axum::Router;

use crate::pages::{PageState, page_routes};
use crate::wizard::{WizardRouteState, WizardSessions, wizard_routes};

/// HTML pages plus the JSON wizard API, sharing one session host.
pub fn router(sessions: Arc<WizardSessions>) -> Router {
    let pages = page_routes(PageState {
        store: sessions.store(),
        sessions: Arc::clone(&sessions),
    });
    pages.merge(wizard_routes(WizardRouteState { sessions }))
}
