//! Core module - wizard state, step editors and project plumbing

pub mod bom;
pub mod cancel;
pub mod categorize;
pub mod config;
pub mod entity;
pub mod host;
pub mod identity;
pub mod process;
pub mod project;
pub mod summary;
pub mod wizard;

pub use bom::{BomEditor, EntryMode, GenerateOutcome, MaterialForm, MaterialRow};
pub use cancel::CancelToken;
pub use categorize::{CategorizationForm, CategoryError, CategoryTaxonomy};
pub use config::Config;
pub use entity::{Entity, Status};
pub use host::{
    default_registry, ExecuteOptions, HostContext, HostError, LayoutConfig, Registration,
    ServiceExecutor, ViewKind, WidgetRegistry,
};
pub use identity::{EntityId, EntityPrefix, IdParseError};
pub use process::{ProcessEntry, ProcessPlanEditor};
pub use project::{Project, ProjectError};
pub use summary::{ProcessGroup, ProductSummary, SummaryRow};
pub use wizard::{StepData, StepOutcome, StepState, WizardController, WizardStep};
