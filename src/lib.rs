//! loca: local-advertising onboarding wizard and campaign dashboard.

pub mod api;
pub mod config;
pub mod error;
pub mod pages;
pub mod server;
pub mod store;
pub mod wizard;
