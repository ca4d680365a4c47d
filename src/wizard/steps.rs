//! Step renderers: one variant per wizard step.
//!
//! A renderer owns only its in-progress selection. It never touches the
//! accumulated wizard state; it receives read-only copies of what it needs
//! when the controller builds it, and hands a [`StepOutput`] back on confirm.

use std::collections::HashSet;

use serde::Serialize;
use tracing::warn;

use super::controller::StepOutput;
use super::launch::{LAUNCH_ITEMS, LaunchProgress};
use super::model::{
    BusinessForm, BusinessInfo, BusinessType, Creative, Offer, PROVINCES, SUGGESTED_CITIES,
};
use super::state::WizardStep;
use crate::api::{CreativeRequest, MarketingApi, OfferQuery};
use crate::error::{Error, WizardError};

/// Identifies the renderer a fetch was issued for.
///
/// The epoch changes whenever the controller builds a new renderer or a
/// renderer re-issues its fetch, so results for a torn-down renderer can be
/// recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub step: WizardStep,
    pub epoch: u64,
}

/// An external fetch a renderer wants performed.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchRequest {
    Streets { address: String },
    Offers(OfferQuery),
    Creatives(CreativeRequest),
}

/// The outcome of a [`FetchRequest`]. Failures have already been folded into
/// an empty result.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResult {
    Streets(Vec<String>),
    Offers(Vec<Offer>),
    Creatives(Vec<Creative>),
}

impl FetchRequest {
    /// Perform the fetch. A failed fetch is logged and yields an empty set.
    pub async fn execute(self, api: &dyn MarketingApi) -> FetchResult {
        match self {
            Self::Streets { address } => match api.nearby_streets(&address).await {
                Ok(streets) => FetchResult::Streets(streets),
                Err(e) => {
                    warn!(error = %e, address = %address, "Failed to fetch streets");
                    FetchResult::Streets(Vec::new())
                }
            },
            Self::Offers(query) => match api.generate_offers(&query).await {
                Ok(offers) => FetchResult::Offers(offers),
                Err(e) => {
                    warn!(error = %e, business = %query.business_name, "Failed to fetch offers");
                    FetchResult::Offers(Vec::new())
                }
            },
            Self::Creatives(request) => match api.generate_creatives(&request).await {
                Ok(creatives) => FetchResult::Creatives(creatives),
                Err(e) => {
                    warn!(
                        error = %e,
                        streets = request.selected_streets.len(),
                        offers = request.selected_offers.len(),
                        "Failed to generate creatives"
                    );
                    FetchResult::Creatives(Vec::new())
                }
            },
        }
    }
}

/// Something that can be toggled in a selection list by key.
pub trait Selectable: Clone {
    fn key(&self) -> &str;
}

impl Selectable for String {
    fn key(&self) -> &str {
        self
    }
}

impl Selectable for Offer {
    fn key(&self) -> &str {
        &self.id
    }
}

impl Selectable for Creative {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Fetched items plus the set of selected keys.
#[derive(Debug, Clone)]
pub struct SelectionList<T> {
    items: Vec<T>,
    selected: HashSet<String>,
}

impl<T: Selectable> SelectionList<T> {
    /// Items sharing a key with an earlier item are dropped, so a key always
    /// names exactly one item.
    pub fn new(items: Vec<T>, preselect_all: bool) -> Self {
        let fetched = items.len();
        let mut seen = HashSet::with_capacity(fetched);
        let items: Vec<T> = items
            .into_iter()
            .filter(|item| seen.insert(item.key().to_string()))
            .collect();
        if items.len() < fetched {
            warn!(
                dropped = fetched - items.len(),
                "Dropped fetched items with duplicate keys"
            );
        }

        let selected = if preselect_all {
            items.iter().map(|i| i.key().to_string()).collect()
        } else {
            HashSet::new()
        };
        Self { items, selected }
    }

    /// Flip membership of `key`. Returns the new membership, or `None` if no
    /// item has that key.
    pub fn toggle(&mut self, key: &str) -> Option<bool> {
        if !self.items.iter().any(|i| i.key() == key) {
            return None;
        }
        if self.selected.remove(key) {
            Some(false)
        } else {
            self.selected.insert(key.to_string());
            Some(true)
        }
    }

    pub fn is_selected(&self, key: &str) -> bool {
        self.selected.contains(key)
    }

    /// Selected items, in fetch order.
    pub fn selected_items(&self) -> Vec<T> {
        self.items
            .iter()
            .filter(|i| self.is_selected(i.key()))
            .cloned()
            .collect()
    }

    pub fn selected_count(&self) -> usize {
        self.items.iter().filter(|i| self.is_selected(i.key())).count()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }
}

/// A list step is either waiting on its fetch or showing results.
#[derive(Debug, Clone)]
enum Phase<T> {
    Loading,
    Ready(SelectionList<T>),
}

/// Shared mechanics of the three selection steps.
#[derive(Debug, Clone)]
pub struct SelectStep<T> {
    step: WizardStep,
    preselect_all: bool,
    phase: Phase<T>,
}

impl<T: Selectable> SelectStep<T> {
    fn loading(step: WizardStep, preselect_all: bool) -> Self {
        Self {
            step,
            preselect_all,
            phase: Phase::Loading,
        }
    }

    fn load(&mut self, items: Vec<T>) {
        self.phase = Phase::Ready(SelectionList::new(items, self.preselect_all));
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading)
    }

    pub fn list(&self) -> Option<&SelectionList<T>> {
        match &self.phase {
            Phase::Loading => None,
            Phase::Ready(list) => Some(list),
        }
    }

    fn toggle(&mut self, key: &str) -> Result<bool, WizardError> {
        match &mut self.phase {
            Phase::Loading => Err(WizardError::Loading { step: self.step }),
            Phase::Ready(list) => list.toggle(key).ok_or_else(|| WizardError::UnknownItem {
                step: self.step,
                item: key.to_string(),
            }),
        }
    }

    fn confirm(&self) -> Result<Vec<T>, WizardError> {
        let list = self.list().ok_or(WizardError::Loading { step: self.step })?;
        let selected = list.selected_items();
        if selected.is_empty() {
            return Err(WizardError::EmptySelection { step: self.step });
        }
        Ok(selected)
    }

    fn view(&self) -> SelectionView<T> {
        match &self.phase {
            Phase::Loading => SelectionView {
                loading: true,
                items: Vec::new(),
                selected_count: 0,
                can_confirm: false,
            },
            Phase::Ready(list) => {
                let selected_count = list.selected_count();
                SelectionView {
                    loading: false,
                    items: list
                        .items()
                        .iter()
                        .map(|item| ItemView {
                            selected: list.is_selected(item.key()),
                            item: item.clone(),
                        })
                        .collect(),
                    selected_count,
                    can_confirm: selected_count > 0,
                }
            }
        }
    }
}

/// Step 1: collects the business form. No fetch.
#[derive(Debug, Clone)]
pub struct BusinessInfoStep {
    /// Previously confirmed profile, when the user navigated back.
    prefill: Option<BusinessInfo>,
}

/// Step 2: nearby streets, all pre-selected.
#[derive(Debug, Clone)]
pub struct StreetSelectionStep {
    address: Option<String>,
    list: SelectStep<String>,
}

/// Step 3: generated offers, none pre-selected. Supports regeneration.
#[derive(Debug, Clone)]
pub struct OfferGenerationStep {
    query: OfferQuery,
    list: SelectStep<Offer>,
}

/// Step 4: generated creatives, none pre-selected.
#[derive(Debug, Clone)]
pub struct CreativeGenerationStep {
    request: CreativeRequest,
    list: SelectStep<Creative>,
}

/// Campaign figures shown while launching.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchSummary {
    pub business_name: String,
    pub streets: usize,
    pub offers: usize,
    pub creatives: usize,
}

/// Step 5: campaign summary and simulated launch.
#[derive(Debug, Clone)]
pub struct CampaignLaunchStep {
    summary: LaunchSummary,
    launch: LaunchProgress,
}

/// The active step's renderer.
#[derive(Debug, Clone)]
pub enum StepRenderer {
    BusinessInfo(BusinessInfoStep),
    StreetSelection(StreetSelectionStep),
    OfferGeneration(OfferGenerationStep),
    CreativeGeneration(CreativeGenerationStep),
    CampaignLaunch(CampaignLaunchStep),
}

impl StepRenderer {
    pub fn business_info(prefill: Option<BusinessInfo>) -> Self {
        Self::BusinessInfo(BusinessInfoStep { prefill })
    }

    /// Without an address there is nothing to look up; the step starts ready
    /// and empty.
    pub fn street_selection(address: Option<String>) -> Self {
        let mut list = SelectStep::loading(WizardStep::StreetSelection, true);
        let address = address.filter(|a| !a.trim().is_empty());
        if address.is_none() {
            warn!("No business address available; skipping street lookup");
            list.load(Vec::new());
        }
        Self::StreetSelection(StreetSelectionStep { address, list })
    }

    pub fn offer_generation(business: &BusinessInfo) -> Self {
        Self::OfferGeneration(OfferGenerationStep {
            query: OfferQuery::for_business(business),
            list: SelectStep::loading(WizardStep::OfferGeneration, false),
        })
    }

    pub fn creative_generation(request: CreativeRequest) -> Self {
        Self::CreativeGeneration(CreativeGenerationStep {
            request,
            list: SelectStep::loading(WizardStep::CreativeGeneration, false),
        })
    }

    pub fn campaign_launch(summary: LaunchSummary) -> Self {
        Self::CampaignLaunch(CampaignLaunchStep {
            summary,
            launch: LaunchProgress::new(),
        })
    }

    pub fn step(&self) -> WizardStep {
        match self {
            Self::BusinessInfo(_) => WizardStep::BusinessInfo,
            Self::StreetSelection(_) => WizardStep::StreetSelection,
            Self::OfferGeneration(_) => WizardStep::OfferGeneration,
            Self::CreativeGeneration(_) => WizardStep::CreativeGeneration,
            Self::CampaignLaunch(_) => WizardStep::CampaignLaunch,
        }
    }

    pub fn is_loading(&self) -> bool {
        match self {
            Self::StreetSelection(s) => s.list.is_loading(),
            Self::OfferGeneration(s) => s.list.is_loading(),
            Self::CreativeGeneration(s) => s.list.is_loading(),
            Self::BusinessInfo(_) | Self::CampaignLaunch(_) => false,
        }
    }

    /// The fetch this renderer is waiting on, if any.
    pub fn fetch_request(&self) -> Option<FetchRequest> {
        if !self.is_loading() {
            return None;
        }
        match self {
            Self::StreetSelection(s) => s.address.clone().map(|address| FetchRequest::Streets {
                address,
            }),
            Self::OfferGeneration(s) => Some(FetchRequest::Offers(s.query.clone())),
            Self::CreativeGeneration(s) => Some(FetchRequest::Creatives(s.request.clone())),
            Self::BusinessInfo(_) | Self::CampaignLaunch(_) => None,
        }
    }

    /// Apply a fetch result. Returns `false` if the result is for another
    /// kind of step or the renderer is not waiting on a fetch.
    pub fn apply(&mut self, result: FetchResult) -> bool {
        if !self.is_loading() {
            return false;
        }
        match (self, result) {
            (Self::StreetSelection(s), FetchResult::Streets(items)) => s.list.load(items),
            (Self::OfferGeneration(s), FetchResult::Offers(items)) => s.list.load(items),
            (Self::CreativeGeneration(s), FetchResult::Creatives(items)) => s.list.load(items),
            _ => return false,
        }
        true
    }

    /// Toggle an item in the active selection.
    pub fn toggle(&mut self, item: &str) -> Result<bool, WizardError> {
        match self {
            Self::StreetSelection(s) => s.list.toggle(item),
            Self::OfferGeneration(s) => s.list.toggle(item),
            Self::CreativeGeneration(s) => s.list.toggle(item),
            Self::BusinessInfo(_) | Self::CampaignLaunch(_) => Err(WizardError::Unsupported {
                step: self.step(),
                action: "toggle",
            }),
        }
    }

    /// Discard the current offers and fetch a fresh batch.
    pub fn regenerate(&mut self) -> Result<FetchRequest, WizardError> {
        match self {
            Self::OfferGeneration(s) => {
                if s.list.is_loading() {
                    return Err(WizardError::Loading {
                        step: WizardStep::OfferGeneration,
                    });
                }
                s.list = SelectStep::loading(WizardStep::OfferGeneration, false);
                Ok(FetchRequest::Offers(s.query.clone()))
            }
            _ => Err(WizardError::Unsupported {
                step: self.step(),
                action: "regenerate",
            }),
        }
    }

    /// Advance the launch simulation. Returns `true` once complete; always
    /// `false` for other steps.
    pub fn advance_launch(&mut self, increment: f64) -> bool {
        match self {
            Self::CampaignLaunch(s) => s.launch.advance(increment),
            _ => false,
        }
    }

    /// Whether the launch step has finished. Other steps report `false`.
    pub fn launch_complete(&self) -> bool {
        matches!(self, Self::CampaignLaunch(s) if s.launch.is_complete())
    }

    /// Going back is refused once the campaign launch has started.
    pub fn check_back(&self) -> Result<(), WizardError> {
        match self {
            Self::CampaignLaunch(s) if s.launch.progress() > 0.0 => {
                Err(WizardError::BackDisabled {
                    step: WizardStep::CampaignLaunch,
                })
            }
            _ => Ok(()),
        }
    }

    /// Finalize the step's selection.
    ///
    /// The business step takes the submitted form; with no form it re-confirms
    /// the prefilled profile.
    pub fn confirm(&self, form: Option<BusinessForm>) -> Result<StepOutput, Error> {
        let output = match self {
            Self::BusinessInfo(s) => {
                let info = match (form, &s.prefill) {
                    (Some(form), _) => form.validate()?,
                    (None, Some(prefill)) => prefill.clone(),
                    // An empty form reports every required field.
                    (None, None) => BusinessForm::default().validate()?,
                };
                StepOutput::BusinessInfo(info)
            }
            Self::StreetSelection(s) => StepOutput::Streets(s.list.confirm()?),
            Self::OfferGeneration(s) => StepOutput::Offers(s.list.confirm()?),
            Self::CreativeGeneration(s) => StepOutput::Creatives(s.list.confirm()?),
            Self::CampaignLaunch(s) => {
                if !s.launch.is_complete() {
                    return Err(WizardError::LaunchInProgress {
                        progress: s.launch.progress(),
                    }
                    .into());
                }
                StepOutput::Launch
            }
        };
        Ok(output)
    }

    /// Serializable view of the renderer for clients.
    pub fn view(&self) -> StepView {
        match self {
            Self::BusinessInfo(s) => StepView::BusinessInfo(BusinessInfoView {
                prefill: s.prefill.clone(),
                business_types: BusinessType::ALL
                    .iter()
                    .map(|t| BusinessTypeOption {
                        value: t.to_string(),
                        label: t.label(),
                    })
                    .collect(),
                provinces: PROVINCES,
                cities: SUGGESTED_CITIES,
            }),
            Self::StreetSelection(s) => StepView::StreetSelection(s.list.view()),
            Self::OfferGeneration(s) => StepView::OfferGeneration(s.list.view()),
            Self::CreativeGeneration(s) => StepView::CreativeGeneration(s.list.view()),
            Self::CampaignLaunch(s) => StepView::CampaignLaunch(LaunchView {
                summary: s.summary.clone(),
                progress: s.launch.progress(),
                current_item: s.launch.current_item(),
                items: &LAUNCH_ITEMS,
                complete: s.launch.is_complete(),
            }),
        }
    }
}

/// Client-facing view of the active step.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepView {
    BusinessInfo(BusinessInfoView),
    StreetSelection(SelectionView<String>),
    OfferGeneration(SelectionView<Offer>),
    CreativeGeneration(SelectionView<Creative>),
    CampaignLaunch(LaunchView),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessTypeOption {
    pub value: String,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessInfoView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefill: Option<BusinessInfo>,
    pub business_types: Vec<BusinessTypeOption>,
    pub provinces: &'static [&'static str],
    pub cities: &'static [&'static str],
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView<T> {
    pub item: T,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionView<T> {
    pub loading: bool,
    pub items: Vec<ItemView<T>>,
    pub selected_count: usize,
    pub can_confirm: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchView {
    pub summary: LaunchSummary,
    pub progress: f64,
    pub current_item: usize,
    pub items: &'static [&'static str],
    pub complete: bool,
}
