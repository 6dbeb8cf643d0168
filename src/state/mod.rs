//! State management module
//!
//! This module handles registration drafts, their persistence, and
//! view-lifetime cancellation scopes

pub mod draft;
pub mod scope;
pub mod storage;
pub mod wizards;

// Re-export commonly used state components
pub use draft::{RegistrationReceipt, WizardDraft, WizardKind};
pub use scope::{ScopeGuard, ViewScope};
pub use storage::StateStorage;
pub use wizards::{CrossFieldRule, FieldRule, InputType, Wizard, WizardManager, WizardStep};
