//! Product wizard state machine
//!
//! The controller owns the [`ProductDraft`] and the current step index. Step
//! editors work on copies of their slice of the draft and hand a validated
//! fragment back through [`WizardController::complete_step`]. Backward and
//! jump navigation through [`WizardController::go_to_step`] is unconditional.

use tracing::debug;

use crate::core::process::realign_plan;
use crate::entities::material::MaterialLine;
use crate::entities::product::{ProcessPlan, ProductCategoryInfo, ProductDraft, ProductInfo};

/// The five fixed wizard steps, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum WizardStep {
    #[default]
    ProductInformation,
    Categorization,
    BillOfMaterials,
    Manufacturing,
    Summary,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::ProductInformation,
        WizardStep::Categorization,
        WizardStep::BillOfMaterials,
        WizardStep::Manufacturing,
        WizardStep::Summary,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Zero-based position
    pub fn index(&self) -> usize {
        match self {
            WizardStep::ProductInformation => 0,
            WizardStep::Categorization => 1,
            WizardStep::BillOfMaterials => 2,
            WizardStep::Manufacturing => 3,
            WizardStep::Summary => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn title(&self) -> &'static str {
        match self {
            WizardStep::ProductInformation => "Product Information",
            WizardStep::Categorization => "Product Categorization",
            WizardStep::BillOfMaterials => "Bill of Materials",
            WizardStep::Manufacturing => "Product Manufacturing",
            WizardStep::Summary => "Summary",
        }
    }

    pub fn next(&self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn previous(&self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn is_terminal(&self) -> bool {
        *self == WizardStep::Summary
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} {}", self.index() + 1, Self::COUNT, self.title())
    }
}

/// A validated fragment produced by one step
#[derive(Debug, Clone, PartialEq)]
pub enum StepData {
    Information(ProductInfo),
    Categorization(ProductCategoryInfo),
    Materials(Vec<MaterialLine>),
    Processes(ProcessPlan),
    /// The summary step contributes no data
    Confirm,
}

impl StepData {
    /// The step this fragment belongs to
    pub fn step(&self) -> WizardStep {
        match self {
            StepData::Information(_) => WizardStep::ProductInformation,
            StepData::Categorization(_) => WizardStep::Categorization,
            StepData::Materials(_) => WizardStep::BillOfMaterials,
            StepData::Processes(_) => WizardStep::Manufacturing,
            StepData::Confirm => WizardStep::Summary,
        }
    }
}

/// Result of [`WizardController::complete_step`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Moved to the given step
    Advanced(WizardStep),
    /// Completed on the terminal step; hand the draft to a submit collaborator
    Finished,
}

/// Per-step record used by step indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepState {
    pub step: WizardStep,
    pub complete: bool,
    pub active: bool,
}

/// Owns the product draft and the current step
#[derive(Debug, Clone, Default)]
pub struct WizardController {
    draft: ProductDraft,
    current: WizardStep,
    completed: [bool; WizardStep::COUNT],
}

impl WizardController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> WizardStep {
        self.current
    }

    pub fn draft(&self) -> &ProductDraft {
        &self.draft
    }

    pub fn into_draft(self) -> ProductDraft {
        self.draft
    }

    pub fn is_terminal(&self) -> bool {
        self.current.is_terminal()
    }

    /// Jump to any step; never gated on validity
    pub fn go_to_step(&mut self, step: WizardStep) {
        debug!(from = %self.current, to = %step, "wizard jump");
        self.current = step;
    }

    /// Jump by raw index; out-of-range indices are ignored
    pub fn go_to_index(&mut self, index: usize) -> bool {
        match WizardStep::from_index(index) {
            Some(step) => {
                self.go_to_step(step);
                true
            }
            None => false,
        }
    }

    /// Return to the previous step (stays on the first step)
    pub fn back(&mut self) {
        if let Some(prev) = self.current.previous() {
            self.go_to_step(prev);
        }
    }

    /// Merge a step's fragment into the draft and advance
    pub fn complete_step(&mut self, data: StepData) -> StepOutcome {
        let step = data.step();
        match data {
            StepData::Information(info) => self.draft.info = info,
            StepData::Categorization(categorization) => self.draft.categorization = categorization,
            StepData::Materials(materials) => {
                self.draft.processes_by_material_index = realign_plan(
                    &self.draft.materials,
                    &materials,
                    &self.draft.processes_by_material_index,
                );
                self.draft.materials = materials;
            }
            StepData::Processes(plan) => self.draft.processes_by_material_index = plan,
            StepData::Confirm => {}
        }
        self.completed[step.index()] = true;

        match self.current.next() {
            Some(next) => {
                debug!(completed = %step, to = %next, "wizard advance");
                self.current = next;
                StepOutcome::Advanced(next)
            }
            None => {
                debug!("wizard finished");
                StepOutcome::Finished
            }
        }
    }

    /// Discard the draft and start over
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Indicator state for every step
    pub fn steps(&self) -> Vec<StepState> {
        WizardStep::ALL
            .iter()
            .map(|&step| StepState {
                step,
                complete: self.completed[step.index()],
                active: step == self.current,
            })
            .collect()
    }
}
