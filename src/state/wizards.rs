//! Registration wizard definitions
//!
//! Each wizard is an ordered list of steps; each step declares the fields it
//! collects and how they are validated. The manager drives a [`WizardDraft`]
//! through those steps: `next` validates and merges one step's input, `back`
//! moves one step back without losing data, and `validate_all` re-checks the
//! whole draft before submission.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::draft::{WizardDraft, WizardKind};
use crate::utils::errors::{HostelBridgeError, Result, ValidationErrors};
use crate::utils::helpers::{is_valid_email, is_valid_phone, is_valid_pincode, normalize_email};

const NAME_PATTERN: &str = r"^[\p{L} .'-]+$";

/// A registration wizard
#[derive(Debug, Clone, Serialize)]
pub struct Wizard {
    /// Wizard identifier
    pub kind: WizardKind,
    /// Human-readable name
    pub name: String,
    /// Steps in order; step `n` lives at index `n - 1`
    pub steps: Vec<WizardStep>,
}

impl Wizard {
    pub fn step_count(&self) -> u8 {
        self.steps.len() as u8
    }

    pub fn step(&self, number: u8) -> Option<&WizardStep> {
        number
            .checked_sub(1)
            .and_then(|index| self.steps.get(index as usize))
    }

    /// Names of fields that must never be echoed back to a client
    pub fn secret_fields(&self) -> Vec<&str> {
        self.steps
            .iter()
            .flat_map(|step| step.fields.iter())
            .filter(|field| field.input_type == InputType::Password)
            .map(|field| field.name.as_str())
            .collect()
    }
}

/// One page of a wizard
#[derive(Debug, Clone, Serialize)]
pub struct WizardStep {
    /// 1-based step number
    pub number: u8,
    /// Step identifier
    pub id: String,
    /// Human-readable title
    pub title: String,
    /// Fields collected on this step
    pub fields: Vec<FieldRule>,
    /// Rules spanning more than one field of this step
    pub rules: Vec<CrossFieldRule>,
}

/// Kinds of input a field accepts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "options", rename_all = "snake_case")]
pub enum InputType {
    Text,
    Email,
    Phone,
    Number,
    Integer,
    Date,
    Pincode,
    Choice(Vec<String>),
    List,
    Password,
    Boolean,
    Url,
}

/// Validation rules for a single field
#[derive(Debug, Clone, Serialize)]
pub struct FieldRule {
    pub name: String,
    pub label: String,
    pub input_type: InputType,
    pub required: bool,
    /// Minimum length in characters, or items for lists
    pub min_length: Option<usize>,
    /// Maximum length in characters, or items for lists
    pub max_length: Option<usize>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    /// Pattern to match (regex)
    pub pattern: Option<String>,
    /// Dates must not be in the future
    pub past_only: bool,
    /// Custom validation message
    pub error_message: Option<String>,
}

/// Constraints between fields of the same step
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum CrossFieldRule {
    /// `field` must equal `other`
    Matches { field: String, other: String, message: String },
    /// `field` must be `true`
    Accepted { field: String, message: String },
}

impl FieldRule {
    pub fn new(name: &str, label: &str, input_type: InputType) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            input_type,
            required: true,
            min_length: None,
            max_length: None,
            min_value: None,
            max_value: None,
            pattern: None,
            past_only: false,
            error_message: None,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn length(mut self, min: usize, max: usize) -> Self {
        self.min_length = Some(min);
        self.max_length = Some(max);
        self
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.min_value = Some(min);
        self.max_value = Some(max);
        self
    }

    pub fn pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self
    }

    pub fn past_only(mut self) -> Self {
        self.past_only = true;
        self
    }

    pub fn message(mut self, message: &str) -> Self {
        self.error_message = Some(message.to_string());
        self
    }

    fn fail(&self, fallback: String) -> String {
        self.error_message.clone().unwrap_or(fallback)
    }

    /// Validate one submitted value.
    ///
    /// Returns the normalized value to store, `None` for an absent optional
    /// field, or the message to show next to the field.
    pub fn validate(&self, value: Option<&Value>) -> std::result::Result<Option<Value>, String> {
        if is_blank(value) {
            return if self.required {
                Err(format!("{} is required", self.label))
            } else {
                Ok(None)
            };
        }
        let value = value.unwrap_or(&Value::Null);

        let normalized = match &self.input_type {
            InputType::Text | InputType::Password => {
                let text = as_text(value).ok_or_else(|| format!("{} must be text", self.label))?;
                let text = if self.input_type == InputType::Password { text } else { text.trim().to_string() };
                self.check_length(text.chars().count())?;
                Value::String(text)
            }
            InputType::Email => {
                let email = as_text(value).map(|e| normalize_email(&e)).unwrap_or_default();
                if !is_valid_email(&email) {
                    return Err(self.fail("Invalid email format".to_string()));
                }
                Value::String(email)
            }
            InputType::Phone => {
                let phone = as_text(value).map(|p| p.trim().to_string()).unwrap_or_default();
                if !is_valid_phone(&phone) {
                    return Err(self.fail("Invalid phone number".to_string()));
                }
                Value::String(phone)
            }
            InputType::Pincode => {
                let pincode = as_text(value).map(|p| p.trim().to_string()).unwrap_or_default();
                if !is_valid_pincode(&pincode) {
                    return Err(self.fail("Pincode must be 6 digits".to_string()));
                }
                Value::String(pincode)
            }
            InputType::Number => {
                let number = as_number(value).ok_or_else(|| self.fail("Invalid number format".to_string()))?;
                self.check_range(number)?;
                serde_json::Number::from_f64(number)
                    .map(Value::Number)
                    .ok_or_else(|| self.fail("Invalid number format".to_string()))?
            }
            InputType::Integer => {
                let number = as_number(value)
                    .filter(|n| n.fract() == 0.0)
                    .ok_or_else(|| self.fail("Must be a whole number".to_string()))?;
                self.check_range(number)?;
                Value::from(number as i64)
            }
            InputType::Date => {
                let text = as_text(value).unwrap_or_default();
                let date = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
                    .map_err(|_| self.fail("Invalid date format (YYYY-MM-DD)".to_string()))?;
                if self.past_only && date > Utc::now().date_naive() {
                    return Err(self.fail(format!("{} cannot be in the future", self.label)));
                }
                Value::String(date.format("%Y-%m-%d").to_string())
            }
            InputType::Choice(choices) => {
                let choice = as_text(value).map(|c| c.trim().to_string()).unwrap_or_default();
                if !choices.contains(&choice) {
                    return Err(self.fail(format!("Invalid choice. Available options: {}", choices.join(", "))));
                }
                Value::String(choice)
            }
            InputType::List => {
                let items = as_list(value).ok_or_else(|| format!("{} must be a list", self.label))?;
                if self.required && items.is_empty() {
                    return Err(format!("{} is required", self.label));
                }
                self.check_length(items.len())?;
                Value::from(items)
            }
            InputType::Boolean => {
                let flag = as_bool(value).ok_or_else(|| format!("{} must be true or false", self.label))?;
                Value::Bool(flag)
            }
            InputType::Url => {
                let text = as_text(value).map(|u| u.trim().to_string()).unwrap_or_default();
                match url::Url::parse(&text) {
                    Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Value::String(text),
                    _ => return Err(self.fail("Invalid URL".to_string())),
                }
            }
        };

        if let (Some(pattern), Some(text)) = (&self.pattern, normalized.as_str()) {
            let regex = regex::Regex::new(pattern).map_err(|_| "Invalid validation pattern".to_string())?;
            if !regex.is_match(text) {
                return Err(self.fail("Input format is invalid".to_string()));
            }
        }

        Ok(Some(normalized))
    }

    fn check_length(&self, length: usize) -> std::result::Result<(), String> {
        if let Some(min) = self.min_length {
            if length < min {
                return Err(self.fail(format!("{} is too short (minimum {})", self.label, min)));
            }
        }
        if let Some(max) = self.max_length {
            if length > max {
                return Err(self.fail(format!("{} is too long (maximum {})", self.label, max)));
            }
        }
        Ok(())
    }

    fn check_range(&self, number: f64) -> std::result::Result<(), String> {
        if self.min_value.is_some_and(|min| number < min) || self.max_value.is_some_and(|max| number > max) {
            let min = self.min_value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
            let max = self.max_value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
            return Err(self.fail(format!("{} must be between {} and {}", self.label, min, max)));
        }
        Ok(())
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        _ => false,
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim() {
            "true" | "on" | "yes" => Some(true),
            "false" | "off" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn as_list(value: &Value) -> Option<Vec<String>> {
    let items: Vec<String> = match value {
        Value::Array(items) => items.iter().map(as_text).collect::<Option<_>>()?,
        Value::String(s) => s.split(',').map(str::to_string).collect(),
        _ => return None,
    };
    Some(
        items
            .into_iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect(),
    )
}

impl CrossFieldRule {
    fn check(&self, values: &Map<String, Value>, errors: &mut ValidationErrors) {
        match self {
            CrossFieldRule::Matches { field, other, message } => {
                if let (Some(a), Some(b)) = (values.get(field), values.get(other)) {
                    if a != b {
                        errors.add(field, message.clone());
                    }
                }
            }
            CrossFieldRule::Accepted { field, message } => {
                if values.get(field).is_some_and(|v| v != &Value::Bool(true)) {
                    errors.add(field, message.clone());
                }
            }
        }
    }
}

impl WizardStep {
    /// Validate one step's input, returning the normalized values on success
    pub fn validate(&self, data: &Map<String, Value>) -> std::result::Result<Map<String, Value>, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut accepted = Map::new();

        for field in &self.fields {
            match field.validate(data.get(&field.name)) {
                Ok(Some(value)) => {
                    accepted.insert(field.name.clone(), value);
                }
                Ok(None) => {}
                Err(message) => errors.add(&field.name, message),
            }
        }

        for rule in &self.rules {
            rule.check(&accepted, &mut errors);
        }

        if errors.is_empty() {
            Ok(accepted)
        } else {
            Err(errors)
        }
    }
}

/// Wizard manager for driving registration drafts
#[derive(Debug, Clone)]
pub struct WizardManager {
    wizards: HashMap<WizardKind, Wizard>,
}

impl Default for WizardManager {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardManager {
    /// Create a manager with the student and hostel wizards registered
    pub fn new() -> Self {
        let mut manager = Self {
            wizards: HashMap::new(),
        };
        manager.register(create_student_wizard());
        manager.register(create_hostel_wizard());
        manager
    }

    pub fn register(&mut self, wizard: Wizard) {
        self.wizards.insert(wizard.kind, wizard);
    }

    pub fn get(&self, kind: WizardKind) -> Result<&Wizard> {
        self.wizards
            .get(&kind)
            .ok_or_else(|| HostelBridgeError::InvalidInput(format!("Unknown registration type: {}", kind)))
    }

    fn current_step<'a>(&'a self, draft: &WizardDraft) -> Result<(&'a Wizard, &'a WizardStep)> {
        let wizard = self.get(draft.wizard)?;
        let step = wizard.step(draft.step).ok_or_else(|| HostelBridgeError::InvalidStateTransition {
            from: format!("{}:{}", draft.wizard, draft.step),
            to: "next".to_string(),
        })?;
        Ok((wizard, step))
    }

    /// Validate the current step's input; on success merge it and advance.
    ///
    /// On failure the draft is left untouched. The last step does not advance.
    pub fn next(&self, draft: &mut WizardDraft, data: &Map<String, Value>) -> Result<()> {
        let (wizard, step) = self.current_step(draft)?;
        let accepted = step.validate(data).map_err(HostelBridgeError::Validation)?;

        for field in &step.fields {
            match accepted.get(&field.name) {
                Some(value) => {
                    draft.form_data.insert(field.name.clone(), value.clone());
                }
                None => {
                    draft.form_data.remove(&field.name);
                }
            }
        }

        draft.step = (draft.step + 1).min(wizard.step_count());
        draft.updated_at = Utc::now();
        Ok(())
    }

    /// Step back one page, keeping every value collected so far
    pub fn back(&self, draft: &mut WizardDraft) {
        draft.step = draft.step.saturating_sub(1).max(1);
        draft.updated_at = Utc::now();
    }

    /// Re-validate every step against the accumulated form data
    pub fn validate_all(&self, draft: &WizardDraft) -> Result<()> {
        let wizard = self.get(draft.wizard)?;
        let mut errors = ValidationErrors::new();

        for step in &wizard.steps {
            if let Err(step_errors) = step.validate(&draft.form_data) {
                for (field, message) in step_errors.fields {
                    errors.add(&field, message);
                }
            }
        }

        errors.into_result()
    }
}

fn choices(options: &[&str]) -> InputType {
    InputType::Choice(options.iter().map(|o| o.to_string()).collect())
}

fn account_rules() -> Vec<CrossFieldRule> {
    vec![
        CrossFieldRule::Matches {
            field: "confirm_password".to_string(),
            other: "password".to_string(),
            message: "Passwords do not match".to_string(),
        },
        CrossFieldRule::Accepted {
            field: "agree_terms".to_string(),
            message: "You must accept the terms and conditions".to_string(),
        },
    ]
}

fn password_fields() -> Vec<FieldRule> {
    vec![
        FieldRule::new("password", "Password", InputType::Password)
            .length(8, 128)
            .message("Password must be at least 8 characters"),
        FieldRule::new("confirm_password", "Confirm password", InputType::Password),
        FieldRule::new("agree_terms", "Terms and conditions", InputType::Boolean),
    ]
}

/// Create the student registration wizard
fn create_student_wizard() -> Wizard {
    let steps = vec![
        WizardStep {
            number: 1,
            id: "personal".to_string(),
            title: "Personal Information".to_string(),
            fields: vec![
                FieldRule::new("first_name", "First name", InputType::Text).length(1, 64).pattern(NAME_PATTERN),
                FieldRule::new("middle_name", "Middle name", InputType::Text)
                    .optional()
                    .length(1, 64)
                    .pattern(NAME_PATTERN),
                FieldRule::new("last_name", "Last name", InputType::Text).length(1, 64).pattern(NAME_PATTERN),
                FieldRule::new("date_of_birth", "Date of birth", InputType::Date).past_only(),
                FieldRule::new("gender", "Gender", choices(&["male", "female", "other"])),
            ],
            rules: vec![],
        },
        WizardStep {
            number: 2,
            id: "contact".to_string(),
            title: "Contact Details".to_string(),
            fields: vec![
                FieldRule::new("email", "Email", InputType::Email),
                FieldRule::new("phone", "Phone", InputType::Phone),
                FieldRule::new("address", "Address", InputType::Text).length(5, 255),
                FieldRule::new("city", "City", InputType::Text).length(2, 128),
                FieldRule::new("state", "State", InputType::Text).length(2, 128),
                FieldRule::new("pincode", "Pincode", InputType::Pincode),
            ],
            rules: vec![],
        },
        WizardStep {
            number: 3,
            id: "academic".to_string(),
            title: "Academic Background".to_string(),
            fields: vec![
                FieldRule::new(
                    "education_level",
                    "Education level",
                    choices(&["primary", "secondary", "higher_secondary", "diploma", "undergraduate", "postgraduate"]),
                ),
                FieldRule::new("school_name", "School name", InputType::Text).length(2, 255),
                FieldRule::new("board", "Board", InputType::Text).length(2, 64),
                FieldRule::new("percentage", "Percentage", InputType::Number).optional().range(0.0, 100.0),
            ],
            rules: vec![],
        },
        WizardStep {
            number: 4,
            id: "guardian".to_string(),
            title: "Guardian Details".to_string(),
            fields: vec![
                FieldRule::new("guardian_name", "Guardian name", InputType::Text).length(2, 128).pattern(NAME_PATTERN),
                FieldRule::new("guardian_phone", "Guardian phone", InputType::Phone),
                FieldRule::new("annual_family_income", "Annual family income", InputType::Integer)
                    .optional()
                    .range(0.0, 1.0e12),
            ],
            rules: vec![],
        },
        WizardStep {
            number: 5,
            id: "account".to_string(),
            title: "Account Setup".to_string(),
            fields: password_fields(),
            rules: account_rules(),
        },
    ];

    Wizard {
        kind: WizardKind::Student,
        name: "Student Registration".to_string(),
        steps,
    }
}

/// Create the hostel registration wizard
fn create_hostel_wizard() -> Wizard {
    let mut admin_fields = vec![
        FieldRule::new("admin_name", "Administrator name", InputType::Text).length(2, 128).pattern(NAME_PATTERN),
        FieldRule::new("email", "Email", InputType::Email),
        FieldRule::new("phone", "Phone", InputType::Phone),
    ];
    admin_fields.extend(password_fields());

    let steps = vec![
        WizardStep {
            number: 1,
            id: "details".to_string(),
            title: "Hostel Details".to_string(),
            fields: vec![
                FieldRule::new("hostel_name", "Hostel name", InputType::Text).length(2, 255),
                FieldRule::new("hostel_type", "Hostel type", choices(&["boys", "girls", "co_ed"])),
                FieldRule::new("capacity", "Capacity", InputType::Integer).range(1.0, 10_000.0),
                FieldRule::new("description", "Description", InputType::Text).optional().length(0, 2000),
            ],
            rules: vec![],
        },
        WizardStep {
            number: 2,
            id: "location".to_string(),
            title: "Location".to_string(),
            fields: vec![
                FieldRule::new("address", "Address", InputType::Text).length(5, 255),
                FieldRule::new("city", "City", InputType::Text).length(2, 128),
                FieldRule::new("state", "State", InputType::Text).length(2, 128),
                FieldRule::new("pincode", "Pincode", InputType::Pincode),
            ],
            rules: vec![],
        },
        WizardStep {
            number: 3,
            id: "facilities".to_string(),
            title: "Facilities".to_string(),
            fields: vec![FieldRule::new("facilities", "Facilities", InputType::List)
                .length(1, 50)
                .message("Select at least one facility")],
            rules: vec![],
        },
        WizardStep {
            number: 4,
            id: "admin_account".to_string(),
            title: "Administrator Account".to_string(),
            fields: admin_fields,
            rules: account_rules(),
        },
    ];

    Wizard {
        kind: WizardKind::Hostel,
        name: "Hostel Registration".to_string(),
        steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn personal() -> Map<String, Value> {
        object(json!({
            "first_name": "Asha",
            "last_name": "Verma",
            "date_of_birth": "2008-04-12",
            "gender": "female"
        }))
    }

    #[test]
    fn test_wizard_shapes() {
        let manager = WizardManager::new();
        assert_eq!(manager.get(WizardKind::Student).unwrap().step_count(), 5);
        assert_eq!(manager.get(WizardKind::Hostel).unwrap().step_count(), 4);
        assert_eq!(
            manager.get(WizardKind::Student).unwrap().secret_fields(),
            vec!["password", "confirm_password"]
        );
    }

    #[test]
    fn test_next_advances_and_merges() {
        let manager = WizardManager::new();
        let mut draft = WizardDraft::new(WizardKind::Student, Duration::hours(1));

        manager.next(&mut draft, &personal()).unwrap();
        assert_eq!(draft.step, 2);
        assert_eq!(draft.get_string("first_name"), Some("Asha".to_string()));
        assert!(!draft.form_data.contains_key("middle_name"));
    }

    #[test]
    fn test_invalid_input_keeps_step() {
        let manager = WizardManager::new();
        let mut draft = WizardDraft::new(WizardKind::Student, Duration::hours(1));
        let mut data = personal();
        data.insert("gender".into(), json!("unknown"));
        data.insert("date_of_birth".into(), json!("12/04/2008"));

        let err = manager.next(&mut draft, &data).unwrap_err();
        match err {
            HostelBridgeError::Validation(errors) => {
                assert!(errors.contains("gender"));
                assert!(errors.contains("date_of_birth"));
                assert!(!errors.contains("first_name"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(draft.step, 1);
        assert!(draft.form_data.is_empty());
    }

    #[test]
    fn test_back_keeps_data_and_floors_at_one() {
        let manager = WizardManager::new();
        let mut draft = WizardDraft::new(WizardKind::Student, Duration::hours(1));
        manager.next(&mut draft, &personal()).unwrap();

        manager.back(&mut draft);
        assert_eq!(draft.step, 1);
        assert_eq!(draft.get_string("last_name"), Some("Verma".to_string()));

        manager.back(&mut draft);
        assert_eq!(draft.step, 1);
    }

    #[test]
    fn test_cross_field_rules() {
        let step = create_student_wizard().steps.remove(4);

        let mismatch = object(json!({
            "password": "correct-horse",
            "confirm_password": "battery-staple",
            "agree_terms": true
        }));
        let errors = step.validate(&mismatch).unwrap_err();
        assert!(errors.contains("confirm_password"));

        let declined = object(json!({
            "password": "correct-horse",
            "confirm_password": "correct-horse",
            "agree_terms": false
        }));
        let errors = step.validate(&declined).unwrap_err();
        assert!(errors.contains("agree_terms"));

        let short = object(json!({
            "password": "short",
            "confirm_password": "short",
            "agree_terms": "true"
        }));
        let errors = step.validate(&short).unwrap_err();
        assert!(errors.contains("password"));
    }

    #[test]
    fn test_field_normalization() {
        let capacity = FieldRule::new("capacity", "Capacity", InputType::Integer).range(1.0, 100.0);
        assert_eq!(capacity.validate(Some(&json!("40"))).unwrap(), Some(json!(40)));
        assert!(capacity.validate(Some(&json!("4.5"))).is_err());
        assert!(capacity.validate(Some(&json!(0))).is_err());

        let facilities = FieldRule::new("facilities", "Facilities", InputType::List);
        assert_eq!(
            facilities.validate(Some(&json!("wifi, mess ,laundry"))).unwrap(),
            Some(json!(["wifi", "mess", "laundry"]))
        );

        let email = FieldRule::new("email", "Email", InputType::Email);
        assert_eq!(
            email.validate(Some(&json!(" Asha@Example.org "))).unwrap(),
            Some(json!("asha@example.org"))
        );

        let website = FieldRule::new("website", "Website", InputType::Url).optional();
        assert!(website.validate(Some(&json!("ftp://example.org"))).is_err());
        assert_eq!(website.validate(Some(&json!(""))).unwrap(), None);
    }

    #[test]
    fn test_validate_all_reports_missing_steps() {
        let manager = WizardManager::new();
        let mut draft = WizardDraft::new(WizardKind::Hostel, Duration::hours(1));
        manager
            .next(
                &mut draft,
                &object(json!({ "hostel_name": "Sunrise Hostel", "hostel_type": "girls", "capacity": 120 })),
            )
            .unwrap();

        let err = manager.validate_all(&draft).unwrap_err();
        match err {
            HostelBridgeError::Validation(errors) => {
                assert!(errors.contains("pincode"));
                assert!(errors.contains("facilities"));
                assert!(!errors.contains("hostel_name"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
