//! WizardController: sequences the five steps and accumulates their output.

use tracing::{debug, info};

use super::model::{BusinessForm, BusinessInfo, Creative, Offer, WizardResult};
use super::state::WizardStep;
use super::steps::{FetchRequest, FetchResult, FetchTicket, LaunchSummary, StepRenderer};
use crate::api::CreativeRequest;
use crate::error::{Error, WizardError};

/// What a step hands back on confirmation.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutput {
    BusinessInfo(BusinessInfo),
    Streets(Vec<String>),
    Offers(Vec<Offer>),
    Creatives(Vec<Creative>),
    Launch,
}

impl StepOutput {
    /// The step this output belongs to.
    pub fn step(&self) -> WizardStep {
        match self {
            Self::BusinessInfo(_) => WizardStep::BusinessInfo,
            Self::Streets(_) => WizardStep::StreetSelection,
            Self::Offers(_) => WizardStep::OfferGeneration,
            Self::Creatives(_) => WizardStep::CreativeGeneration,
            Self::Launch => WizardStep::CampaignLaunch,
        }
    }
}

/// Result of [`WizardController::advance`].
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// Moved forward to this step.
    Moved(WizardStep),
    /// The final step was confirmed; the wizard is finished.
    Completed(WizardResult),
}

/// Result of [`WizardController::retreat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retreat {
    /// Moved back to this step.
    Moved(WizardStep),
    /// Back was pressed on a custom start step; leave for the dashboard.
    ExitToDashboard,
    /// Back was pressed on step 1; return to the landing page.
    ToLanding,
}

/// Linear five-step state machine.
///
/// Owns the accumulated wizard state and the active [`StepRenderer`]. Each
/// transition rebuilds the renderer for the new step; the controller itself
/// never fetches.
#[derive(Debug, Clone)]
pub struct WizardController {
    start: WizardStep,
    current: WizardStep,
    business_data: Option<BusinessInfo>,
    selected_streets: Option<Vec<String>>,
    selected_offers: Option<Vec<Offer>>,
    generated_creatives: Option<Vec<Creative>>,
    renderer: StepRenderer,
    epoch: u64,
    finished: bool,
}

impl Default for WizardController {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardController {
    /// A wizard starting at step 1.
    pub fn new() -> Self {
        Self::starting_at(WizardStep::BusinessInfo, None)
    }

    /// A wizard entered at `start`.
    ///
    /// Slots for steps before `start` are taken from `seed` (usually the
    /// previously saved result); without one they stay unset.
    pub fn starting_at(start: WizardStep, seed: Option<WizardResult>) -> Self {
        let mut controller = Self {
            start,
            current: start,
            business_data: None,
            selected_streets: None,
            selected_offers: None,
            generated_creatives: None,
            renderer: StepRenderer::business_info(None),
            epoch: 0,
            finished: false,
        };
        if let Some(seed) = seed {
            let n = start.number();
            if n > 1 {
                controller.business_data = Some(seed.business_data);
            }
            if n > 2 {
                controller.selected_streets = Some(seed.selected_streets);
            }
            if n > 3 {
                controller.selected_offers = Some(seed.selected_offers);
            }
            if n > 4 {
                controller.generated_creatives = Some(seed.generated_creatives);
            }
        }
        controller.renderer = controller.build_renderer();
        controller
    }

    /// A wizard entered at a 1-based step number.
    pub fn starting_at_number(n: u8, seed: Option<WizardResult>) -> Result<Self, WizardError> {
        let start = WizardStep::from_number(n).ok_or(WizardError::InvalidStartStep(n))?;
        Ok(Self::starting_at(start, seed))
    }

    pub fn current_step(&self) -> WizardStep {
        self.current
    }

    pub fn start_step(&self) -> WizardStep {
        self.start
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn renderer(&self) -> &StepRenderer {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut StepRenderer {
        &mut self.renderer
    }

    /// Ticket identifying the active renderer.
    pub fn ticket(&self) -> FetchTicket {
        FetchTicket {
            step: self.current,
            epoch: self.epoch,
        }
    }

    /// Store the current step's output and move forward, or finish at the
    /// last step.
    pub fn advance(&mut self, output: StepOutput) -> Result<Advance, WizardError> {
        if self.finished {
            return Err(WizardError::Finished);
        }
        if output.step() != self.current {
            return Err(WizardError::OutputMismatch {
                step: self.current,
                given: output.step(),
            });
        }

        match output {
            StepOutput::BusinessInfo(info) => self.business_data = Some(info),
            StepOutput::Streets(streets) => self.selected_streets = Some(streets),
            StepOutput::Offers(offers) => self.selected_offers = Some(offers),
            StepOutput::Creatives(creatives) => self.generated_creatives = Some(creatives),
            StepOutput::Launch => {}
        }

        match self.current.next() {
            Some(next) => {
                self.move_to(next);
                Ok(Advance::Moved(next))
            }
            None => {
                self.finished = true;
                info!("Wizard completed");
                Ok(Advance::Completed(self.result()))
            }
        }
    }

    /// Step back, or leave the wizard at its entry boundary.
    pub fn retreat(&mut self) -> Result<Retreat, WizardError> {
        if self.finished {
            return Err(WizardError::Finished);
        }
        if self.current == self.start && self.start.number() > 1 {
            self.finished = true;
            return Ok(Retreat::ExitToDashboard);
        }
        match self.current.previous() {
            Some(previous) => {
                self.move_to(previous);
                Ok(Retreat::Moved(previous))
            }
            None => {
                self.finished = true;
                Ok(Retreat::ToLanding)
            }
        }
    }

    /// Confirm the active renderer's selection and advance with it.
    pub fn confirm(&mut self, form: Option<BusinessForm>) -> Result<Advance, Error> {
        if self.finished {
            return Err(WizardError::Finished.into());
        }
        let output = self.renderer.confirm(form)?;
        Ok(self.advance(output)?)
    }

    /// Deliver a fetch result. Returns `false` (and changes nothing) if the
    /// ticket no longer matches the active renderer.
    pub fn deliver(&mut self, ticket: FetchTicket, result: FetchResult) -> bool {
        if self.finished || ticket != self.ticket() {
            debug!(
                step = %ticket.step,
                epoch = ticket.epoch,
                "Discarding fetch result for inactive step"
            );
            return false;
        }
        self.renderer.apply(result)
    }

    /// Apply a launch tick if `ticket` is still active. Returns `true` if the
    /// tick was applied and the launch is not yet complete.
    pub fn tick_launch(&mut self, ticket: FetchTicket, increment: f64) -> bool {
        if self.finished || ticket != self.ticket() {
            return false;
        }
        !self.renderer.advance_launch(increment)
    }

    /// Re-issue the active renderer's fetch. Any fetch still in flight is
    /// invalidated.
    pub fn regenerate(&mut self) -> Result<(FetchTicket, FetchRequest), WizardError> {
        if self.finished {
            return Err(WizardError::Finished);
        }
        let request = self.renderer.regenerate()?;
        self.epoch += 1;
        Ok((self.ticket(), request))
    }

    /// The aggregate of everything confirmed so far.
    pub fn result(&self) -> WizardResult {
        WizardResult {
            business_data: self.business_data.clone().unwrap_or_default(),
            selected_streets: self.selected_streets.clone().unwrap_or_default(),
            selected_offers: self.selected_offers.clone().unwrap_or_default(),
            generated_creatives: self.generated_creatives.clone().unwrap_or_default(),
        }
    }

    fn move_to(&mut self, step: WizardStep) {
        debug_assert!(self.current.can_transition_to(step));
        debug!(from = %self.current, to = %step, "Wizard transition");
        self.current = step;
        self.epoch += 1;
        self.renderer = self.build_renderer();
    }

    fn build_renderer(&self) -> StepRenderer {
        match self.current {
            WizardStep::BusinessInfo => StepRenderer::business_info(self.business_data.clone()),
            WizardStep::StreetSelection => StepRenderer::street_selection(
                self.business_data.as_ref().map(|b| b.full_address.clone()),
            ),
            WizardStep::OfferGeneration => StepRenderer::offer_generation(
                &self.business_data.clone().unwrap_or_default(),
            ),
            WizardStep::CreativeGeneration => StepRenderer::creative_generation(CreativeRequest {
                business_data: self.business_data.clone().unwrap_or_default(),
                selected_streets: self.selected_streets.clone().unwrap_or_default(),
                selected_offers: self.selected_offers.clone().unwrap_or_default(),
            }),
            WizardStep::CampaignLaunch => StepRenderer::campaign_launch(LaunchSummary {
                business_name: self
                    .business_data
                    .as_ref()
                    .map(|b| b.business_name.clone())
                    .unwrap_or_default(),
                streets: self.selected_streets.as_ref().map_or(0, Vec::len),
                offers: self.selected_offers.as_ref().map_or(0, Vec::len),
                creatives: self.generated_creatives.as_ref().map_or(0, Vec::len),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn business() -> BusinessInfo {
        BusinessInfo {
            business_name: "Mike's Pizza Palace".to_string(),
            full_address: "123 Main St, Toronto, Ontario M5V 2T6".to_string(),
            ..Default::default()
        }
    }

    fn offer(id: &str) -> Offer {
        Offer {
            id: id.to_string(),
            title: format!("Offer {id}"),
            description: String::new(),
            promotion_type: "BOGO".to_string(),
            offer_type: "discount".to_string(),
            reasoning: String::new(),
            validity: None,
            code: None,
        }
    }

    fn creative(id: &str) -> Creative {
        Creative {
            id: id.to_string(),
            headline: "Hi".to_string(),
            description: "There".to_string(),
            target_street: "Main St".to_string(),
            offer: "Offer 1".to_string(),
            call_to_action: "Order Now".to_string(),
            framework: None,
            image_url: None,
        }
    }

    fn outputs() -> Vec<StepOutput> {
        vec![
            StepOutput::BusinessInfo(business()),
            StepOutput::Streets(vec!["Main St".to_string()]),
            StepOutput::Offers(vec![offer("1")]),
            StepOutput::Creatives(vec![creative("c1")]),
            StepOutput::Launch,
        ]
    }

    #[test]
    fn advance_visits_steps_in_order() {
        let mut wizard = WizardController::new();
        let mut visited = vec![wizard.current_step()];
        for output in outputs().into_iter().take(4) {
            match wizard.advance(output).unwrap() {
                Advance::Moved(step) => visited.push(step),
                Advance::Completed(_) => panic!("completed early"),
            }
        }
        assert_eq!(visited, WizardStep::ALL.to_vec());
        assert_eq!(wizard.renderer().step(), WizardStep::CampaignLaunch);
    }

    #[test]
    fn completion_carries_everything_exactly_once() {
        let mut wizard = WizardController::new();
        let mut completions = Vec::new();
        for output in outputs() {
            if let Advance::Completed(result) = wizard.advance(output).unwrap() {
                completions.push(result);
            }
        }
        assert_eq!(completions.len(), 1);
        let result = &completions[0];
        assert_eq!(result.business_data, business());
        assert_eq!(result.selected_streets, vec!["Main St"]);
        assert_eq!(result.selected_offers, vec![offer("1")]);
        assert_eq!(result.generated_creatives, vec![creative("c1")]);

        assert!(wizard.is_finished());
        assert!(matches!(
            wizard.advance(StepOutput::Launch),
            Err(WizardError::Finished)
        ));
        assert!(matches!(wizard.retreat(), Err(WizardError::Finished)));
    }

    #[test]
    fn advance_rejects_mismatched_output() {
        let mut wizard = WizardController::new();
        let err = wizard
            .advance(StepOutput::Streets(Vec::new()))
            .unwrap_err();
        assert!(matches!(
            err,
            WizardError::OutputMismatch {
                step: WizardStep::BusinessInfo,
                given: WizardStep::StreetSelection
            }
        ));
        assert_eq!(wizard.current_step(), WizardStep::BusinessInfo);
    }

    #[test]
    fn retreat_at_step_one_goes_to_landing() {
        let mut wizard = WizardController::new();
        assert_eq!(wizard.retreat().unwrap(), Retreat::ToLanding);
        assert_eq!(wizard.current_step(), WizardStep::BusinessInfo);
    }

    #[test]
    fn retreat_moves_back_one_step() {
        let mut wizard = WizardController::new();
        wizard
            .advance(StepOutput::BusinessInfo(business()))
            .unwrap();
        wizard
            .advance(StepOutput::Streets(vec!["Main St".to_string()]))
            .unwrap();
        assert_eq!(
            wizard.retreat().unwrap(),
            Retreat::Moved(WizardStep::StreetSelection)
        );
        assert_eq!(
            wizard.retreat().unwrap(),
            Retreat::Moved(WizardStep::BusinessInfo)
        );
        assert_eq!(wizard.retreat().unwrap(), Retreat::ToLanding);
    }

    #[test]
    fn retreat_at_custom_start_exits_to_dashboard() {
        let mut wizard = WizardController::starting_at(WizardStep::StreetSelection, None);
        assert_eq!(wizard.retreat().unwrap(), Retreat::ExitToDashboard);
        assert_eq!(wizard.current_step(), WizardStep::StreetSelection);
        assert!(wizard.is_finished());
    }

    #[test]
    fn retreat_past_custom_start_moves_back_to_it() {
        let mut wizard = WizardController::starting_at(WizardStep::StreetSelection, None);
        wizard
            .advance(StepOutput::Streets(vec!["Main St".to_string()]))
            .unwrap();
        assert_eq!(
            wizard.retreat().unwrap(),
            Retreat::Moved(WizardStep::StreetSelection)
        );
        assert_eq!(wizard.retreat().unwrap(), Retreat::ExitToDashboard);
    }

    #[test]
    fn explicit_start_at_one_behaves_like_default() {
        let mut wizard = WizardController::starting_at_number(1, None).unwrap();
        assert_eq!(wizard.retreat().unwrap(), Retreat::ToLanding);
    }

    #[test]
    fn invalid_start_step() {
        assert!(matches!(
            WizardController::starting_at_number(0, None),
            Err(WizardError::InvalidStartStep(0))
        ));
        assert!(WizardController::starting_at_number(6, None).is_err());
    }

    #[test]
    fn seed_fills_only_earlier_slots() {
        let seed = WizardResult {
            business_data: business(),
            selected_streets: vec!["Old St".to_string()],
            selected_offers: vec![offer("old")],
            generated_creatives: vec![creative("old")],
        };
        let wizard = WizardController::starting_at(WizardStep::StreetSelection, Some(seed));
        let result = wizard.result();
        assert_eq!(result.business_data, business());
        assert!(result.selected_streets.is_empty());
        assert!(result.selected_offers.is_empty());
        // The street step looks up the seeded business address.
        assert_eq!(
            wizard.renderer().fetch_request(),
            Some(FetchRequest::Streets {
                address: business().full_address
            })
        );
    }

    #[test]
    fn stale_ticket_is_discarded() {
        let mut wizard = WizardController::new();
        wizard
            .advance(StepOutput::BusinessInfo(business()))
            .unwrap();
        let street_ticket = wizard.ticket();

        // Leave the street step before its fetch resolves, then come back.
        wizard.retreat().unwrap();
        wizard
            .advance(StepOutput::BusinessInfo(business()))
            .unwrap();
        assert_eq!(wizard.current_step(), WizardStep::StreetSelection);
        assert_ne!(wizard.ticket(), street_ticket);

        let late = FetchResult::Streets(vec!["Late St".to_string()]);
        assert!(!wizard.deliver(street_ticket, late));
        assert!(wizard.renderer().is_loading());

        let fresh = FetchResult::Streets(vec!["Main St".to_string()]);
        assert!(wizard.deliver(wizard.ticket(), fresh));
        assert!(!wizard.renderer().is_loading());
    }

    #[test]
    fn confirm_uses_renderer_selection() {
        let mut wizard = WizardController::new();
        wizard
            .advance(StepOutput::BusinessInfo(business()))
            .unwrap();
        let ticket = wizard.ticket();
        wizard.deliver(
            ticket,
            FetchResult::Streets(vec!["Main St".to_string(), "Oak Ave".to_string()]),
        );
        wizard.renderer_mut().toggle("Oak Ave").unwrap();

        let advance = wizard.confirm(None).unwrap();
        assert_eq!(advance, Advance::Moved(WizardStep::OfferGeneration));
        assert_eq!(wizard.result().selected_streets, vec!["Main St"]);
    }

    #[test]
    fn regenerate_invalidates_in_flight_fetch() {
        let mut wizard = WizardController::starting_at(WizardStep::OfferGeneration, None);
        let first = wizard.ticket();
        wizard.deliver(first, FetchResult::Offers(vec![offer("1")]));

        let (second, request) = wizard.regenerate().unwrap();
        assert_ne!(first, second);
        assert!(matches!(request, FetchRequest::Offers(_)));
        assert!(!wizard.deliver(first, FetchResult::Offers(vec![offer("stale")])));
        assert!(wizard.deliver(second, FetchResult::Offers(vec![offer("2")])));
    }

    #[test]
    fn launch_ticks_until_complete() {
        let mut wizard = WizardController::starting_at(WizardStep::CampaignLaunch, None);
        let ticket = wizard.ticket();
        assert!(wizard.tick_launch(ticket, 60.0));
        assert!(!wizard.tick_launch(ticket, 60.0));
        assert!(matches!(
            wizard.confirm(None).unwrap(),
            Advance::Completed(_)
        ));
    }
}
