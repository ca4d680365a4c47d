//! Wizard step sequence: the five linear states of the setup flow.

use serde::{Deserialize, Serialize};

/// The steps of the setup wizard.
///
/// Progresses linearly: BusinessInfo → StreetSelection → OfferGeneration →
/// CreativeGeneration → CampaignLaunch. Numbered 1 through 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    BusinessInfo,
    StreetSelection,
    OfferGeneration,
    CreativeGeneration,
    CampaignLaunch,
}

impl WizardStep {
    /// Number of steps in the wizard.
    pub const COUNT: u8 = 5;

    /// All steps in order.
    pub const ALL: [WizardStep; 5] = [
        Self::BusinessInfo,
        Self::StreetSelection,
        Self::OfferGeneration,
        Self::CreativeGeneration,
        Self::CampaignLaunch,
    ];

    /// Step from its 1-based number.
    pub fn from_number(n: u8) -> Option<WizardStep> {
        match n {
            1..=5 => Some(Self::ALL[usize::from(n - 1)]),
            _ => None,
        }
    }

    /// 1-based step number.
    pub fn number(&self) -> u8 {
        match self {
            Self::BusinessInfo => 1,
            Self::StreetSelection => 2,
            Self::OfferGeneration => 3,
            Self::CreativeGeneration => 4,
            Self::CampaignLaunch => 5,
        }
    }

    /// Title shown in the wizard header.
    pub fn title(&self) -> &'static str {
        match self {
            Self::BusinessInfo => "Business Info",
            Self::StreetSelection => "Target Areas",
            Self::OfferGeneration => "Offers",
            Self::CreativeGeneration => "Creatives",
            Self::CampaignLaunch => "Launch",
        }
    }

    /// Check if a transition from `self` to `target` is valid.
    ///
    /// Only single steps forward or backward are allowed.
    pub fn can_transition_to(&self, target: WizardStep) -> bool {
        self.number().abs_diff(target.number()) == 1
    }

    /// The following step, if any.
    pub fn next(&self) -> Option<WizardStep> {
        Self::from_number(self.number() + 1)
    }

    /// The preceding step, if any.
    pub fn previous(&self) -> Option<WizardStep> {
        self.number().checked_sub(1).and_then(Self::from_number)
    }

    /// Completion percentage shown by the progress bar.
    pub fn progress_percent(&self) -> u8 {
        self.number() * 100 / Self::COUNT
    }
}

impl Default for WizardStep {
    fn default() -> Self {
        Self::BusinessInfo
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::BusinessInfo => "business_info",
            Self::StreetSelection => "street_selection",
            Self::OfferGeneration => "offer_generation",
            Self::CreativeGeneration => "creative_generation",
            Self::CampaignLaunch => "campaign_launch",
        };
        write!(f, "{s}")
    }
}
