//! Registration draft state
//!
//! A draft tracks one visitor's progress through a registration wizard: the
//! current step and the form data accumulated so far.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::models::Role;
use crate::utils::errors::{HostelBridgeError, Result};

/// Which registration wizard a draft belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardKind {
    Student,
    Hostel,
}

impl WizardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WizardKind::Student => "student",
            WizardKind::Hostel => "hostel",
        }
    }

    /// Role granted when the wizard is submitted
    pub fn role(&self) -> Role {
        match self {
            WizardKind::Student => Role::Student,
            WizardKind::Hostel => Role::HostelAdmin,
        }
    }
}

impl fmt::Display for WizardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WizardKind {
    type Err = HostelBridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "student" => Ok(WizardKind::Student),
            "hostel" => Ok(WizardKind::Hostel),
            other => Err(HostelBridgeError::InvalidInput(format!("Unknown registration type: {}", other))),
        }
    }
}

/// Persisted, resumable wizard state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardDraft {
    /// Draft identifier, used in registration routes
    pub draft_id: Uuid,
    /// Wizard this draft runs through
    pub wizard: WizardKind,
    /// Current step, 1-based
    pub step: u8,
    /// Fields accepted so far, across all completed steps
    pub form_data: Map<String, Value>,
    /// When this draft stops being resumable
    pub expires_at: DateTime<Utc>,
    /// When this draft was last changed
    pub updated_at: DateTime<Utc>,
}

impl WizardDraft {
    /// Start a new draft at step 1
    pub fn new(wizard: WizardKind, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            draft_id: Uuid::new_v4(),
            wizard,
            step: 1,
            form_data: Map::new(),
            expires_at: now + ttl,
            updated_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Push the expiry out by `ttl` from now
    pub fn touch(&mut self, ttl: Duration) {
        let now = Utc::now();
        self.updated_at = now;
        self.expires_at = now + ttl;
    }

    /// Get a string field
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.form_data.get(key).and_then(Value::as_str).map(str::to_string)
    }

    /// Get a typed field
    pub fn get_data<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Result<Option<T>> {
        match self.form_data.get(key) {
            Some(Value::Null) | None => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
        }
    }

    /// Get a required typed field, reporting the missing key as a transition error
    pub fn require<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Result<T> {
        self.get_data(key)?.ok_or_else(|| HostelBridgeError::InvalidStateTransition {
            from: format!("{}:{}", self.wizard, self.step),
            to: format!("submit (missing {})", key),
        })
    }

    /// Copy of the draft with the given fields masked, for client responses
    pub fn redacted(&self, hidden: &[&str]) -> Self {
        let mut copy = self.clone();
        for key in hidden {
            if let Some(value) = copy.form_data.get_mut(*key) {
                *value = Value::String("********".to_string());
            }
        }
        copy
    }
}

/// Receipt shown on the registration-success page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationReceipt {
    pub draft_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub redirect: String,
    pub registered_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_draft_starts_at_step_one() {
        let draft = WizardDraft::new(WizardKind::Student, Duration::hours(24));
        assert_eq!(draft.step, 1);
        assert!(draft.form_data.is_empty());
        assert!(!draft.is_expired());
    }

    #[test]
    fn test_expiry() {
        let mut draft = WizardDraft::new(WizardKind::Hostel, Duration::seconds(-1));
        assert!(draft.is_expired());

        draft.touch(Duration::hours(1));
        assert!(!draft.is_expired());
    }

    #[test]
    fn test_typed_access_and_redaction() {
        let mut draft = WizardDraft::new(WizardKind::Student, Duration::hours(1));
        draft.form_data.insert("first_name".into(), json!("Asha"));
        draft.form_data.insert("percentage".into(), json!(88.5));
        draft.form_data.insert("password".into(), json!("s3cret-pass"));

        assert_eq!(draft.get_string("first_name"), Some("Asha".to_string()));
        assert_eq!(draft.get_data::<f64>("percentage").unwrap(), Some(88.5));
        assert!(draft.require::<String>("last_name").is_err());

        let shown = draft.redacted(&["password", "confirm_password"]);
        assert_eq!(shown.form_data["password"], json!("********"));
        assert!(!shown.form_data.contains_key("confirm_password"));
        assert_eq!(draft.form_data["password"], json!("s3cret-pass"));
    }

    #[test]
    fn test_wizard_kind_parsing() {
        assert_eq!("student".parse::<WizardKind>().unwrap(), WizardKind::Student);
        assert_eq!(WizardKind::Hostel.role(), Role::HostelAdmin);
        assert!("donor".parse::<WizardKind>().is_err());
    }
}
