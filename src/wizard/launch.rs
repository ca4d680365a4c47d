//! Simulated campaign launch checklist for the final wizard step.

use rand::Rng;
use serde::Serialize;

/// Checklist items, in the order they are worked through.
pub const LAUNCH_ITEMS: [&str; 7] = [
    "Setting up Facebook Ad Account connection",
    "Creating campaign structure",
    "Uploading ad creatives",
    "Configuring audience targeting",
    "Setting budget and bidding strategy",
    "Launching campaigns",
    "Initializing performance tracking",
];

/// Minimum and maximum progress gained per tick, in percent.
const MIN_INCREMENT: f64 = 5.0;
const MAX_INCREMENT: f64 = 20.0;

/// Launch progress, 0–100 %.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchProgress {
    progress: f64,
    current_item: usize,
}

impl LaunchProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw a random per-tick increment.
    pub fn random_increment<R: Rng + ?Sized>(rng: &mut R) -> f64 {
        rng.gen_range(MIN_INCREMENT..MAX_INCREMENT)
    }

    /// Apply one tick. Returns `true` once the launch is complete.
    pub fn advance(&mut self, increment: f64) -> bool {
        if self.is_complete() {
            return true;
        }
        self.progress = (self.progress + increment.max(0.0)).min(100.0);
        let item = (self.progress / 100.0 * LAUNCH_ITEMS.len() as f64).floor() as usize;
        self.current_item = item.min(LAUNCH_ITEMS.len() - 1);
        self.is_complete()
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Index into [`LAUNCH_ITEMS`] currently being worked on.
    pub fn current_item(&self) -> usize {
        self.current_item
    }

    pub fn is_complete(&self) -> bool {
        self.progress >= 100.0
    }
}
