//! Landing page, server-rendered wizard, and the dashboard pages that read
//! the stored wizard record.

pub mod html;
pub mod routes;
pub mod view;

pub use routes::{PageState, page_routes};
pub use view::{CampaignsPage, CreativesPage, PerformancePage};
