//! Field, validation and submission state for one comment form.
//!
//! Every open form owns its own [`FormController`]; nothing here is shared
//! between instances. The attachment handle `B` is whatever the host uses
//! for picked files (`web_sys::File` in the browser).

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

use crate::CreateComment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Username,
    Email,
    HomePage,
    Text,
    CaptchaText,
    Image,
    File,
}

impl Field {
    pub const REQUIRED: [Field; 4] = [
        Field::Username,
        Field::Email,
        Field::Text,
        Field::CaptchaText,
    ];

    /// Wire name, also the key used by server error payloads.
    pub fn key(self) -> &'static str {
        match self {
            Field::Username => "username",
            Field::Email => "email",
            Field::HomePage => "home_page",
            Field::Text => "text",
            Field::CaptchaText => "captcha_text",
            Field::Image => "image",
            Field::File => "file",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "username" => Some(Field::Username),
            "email" => Some(Field::Email),
            "home_page" => Some(Field::HomePage),
            "text" => Some(Field::Text),
            "captcha_text" => Some(Field::CaptchaText),
            "image" => Some(Field::Image),
            "file" => Some(Field::File),
            _ => None,
        }
    }

    fn required_message(self) -> String {
        format!("{} is required", self.key().replace('_', " "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormData<B> {
    pub username: String,
    pub email: String,
    pub home_page: String,
    pub text: String,
    pub captcha_text: String,
    pub image: Option<B>,
    pub file: Option<B>,
}

impl<B> Default for FormData<B> {
    fn default() -> Self {
        Self {
            username: String::new(),
            email: String::new(),
            home_page: String::new(),
            text: String::new(),
            captcha_text: String::new(),
            image: None,
            file: None,
        }
    }
}

impl<B> FormData<B> {
    /// Text value of a field; `None` for attachments.
    pub fn value(&self, field: Field) -> Option<&str> {
        match field {
            Field::Username => Some(&self.username),
            Field::Email => Some(&self.email),
            Field::HomePage => Some(&self.home_page),
            Field::Text => Some(&self.text),
            Field::CaptchaText => Some(&self.captcha_text),
            Field::Image | Field::File => None,
        }
    }

    fn text_slot(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::Username => Some(&mut self.username),
            Field::Email => Some(&mut self.email),
            Field::HomePage => Some(&mut self.home_page),
            Field::Text => Some(&mut self.text),
            Field::CaptchaText => Some(&mut self.captcha_text),
            Field::Image | Field::File => None,
        }
    }

    /// Required fields whose trimmed value is empty. Format is not checked.
    pub fn missing_fields(&self) -> Vec<Field> {
        Field::REQUIRED
            .into_iter()
            .filter(|field| self.value(*field).map_or(true, |v| v.trim().is_empty()))
            .collect()
    }

    pub fn to_payload(&self, parent_id: Option<i64>) -> CreateComment {
        CreateComment {
            username: self.username.clone(),
            email: self.email.clone(),
            home_page: if self.home_page.is_empty() {
                None
            } else {
                Some(self.home_page.clone())
            },
            text: self.text.clone(),
            captcha_text: self.captcha_text.clone(),
            parent_id,
        }
    }
}

/// Server error values arrive either as a string or as a list of strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorValue {
    One(String),
    Many(Vec<String>),
    Other(serde_json::Value),
}

impl ErrorValue {
    fn into_message(self) -> String {
        match self {
            ErrorValue::One(message) => message,
            ErrorValue::Many(messages) => messages.join(" "),
            ErrorValue::Other(value) => value.to_string(),
        }
    }
}

/// Field key → message. Keys the form has no input for (e.g.
/// `non_field_errors`) are kept and shown at form level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<String, String>);

impl<'de> Deserialize<'de> for FormErrors {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, ErrorValue>::deserialize(deserializer)?;
        Ok(FormErrors(
            raw.into_iter()
                .map(|(key, value)| (key, value.into_message()))
                .collect(),
        ))
    }
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_missing(fields: &[Field]) -> Self {
        FormErrors(
            fields
                .iter()
                .map(|field| (field.key().to_string(), field.required_message()))
                .collect(),
        )
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0
            .get(field.key())
            .map(String::as_str)
            .filter(|message| !message.is_empty())
    }

    pub fn clear(&mut self, field: Field) {
        self.0.remove(field.key());
    }

    /// Later messages win for keys present in both sets.
    pub fn merge(&mut self, other: FormErrors) {
        self.0.extend(other.0);
    }

    /// Messages whose key does not name a form field.
    pub fn general(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .filter(|(key, _)| Field::from_key(key).is_none())
            .map(|(_, message)| message.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormPhase {
    #[default]
    Editing,
    Submitting,
    Success,
}

/// Everything needed to send one comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission<B> {
    pub payload: CreateComment,
    pub image: Option<B>,
    pub file: Option<B>,
}

impl<B> Submission<B> {
    /// Attachments force a multipart body; otherwise JSON is sent.
    pub fn is_multipart(&self) -> bool {
        self.image.is_some() || self.file.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitBlocked {
    Missing(Vec<Field>),
    InFlight,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormController<B> {
    data: FormData<B>,
    errors: FormErrors,
    phase: FormPhase,
    parent_id: Option<i64>,
    captcha_nonce: u64,
}

impl<B: Clone> FormController<B> {
    /// `parent_id` is `None` for a top-level comment. `captcha_nonce`
    /// selects the first captcha challenge shown.
    pub fn new(parent_id: Option<i64>, captcha_nonce: u64) -> Self {
        Self {
            data: FormData::default(),
            errors: FormErrors::new(),
            phase: FormPhase::Editing,
            parent_id,
            captcha_nonce,
        }
    }

    pub fn data(&self) -> &FormData<B> {
        &self.data
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    pub fn phase(&self) -> FormPhase {
        self.phase
    }

    pub fn parent_id(&self) -> Option<i64> {
        self.parent_id
    }

    pub fn captcha_nonce(&self) -> u64 {
        self.captcha_nonce
    }

    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        if let Some(slot) = self.data.text_slot(field) {
            *slot = value.into();
            self.errors.clear(field);
        }
    }

    /// Replaces (or removes) an attachment. Ignored for text fields.
    pub fn set_file(&mut self, field: Field, blob: Option<B>) {
        match field {
            Field::Image => self.data.image = blob,
            Field::File => self.data.file = blob,
            _ => return,
        }
        self.errors.clear(field);
    }

    pub fn validate(&self) -> Vec<Field> {
        self.data.missing_fields()
    }

    /// Validates and, when complete, moves to `Submitting`.
    ///
    /// Missing fields replace the current error set and nothing is sent.
    pub fn begin_submit(&mut self) -> Result<Submission<B>, SubmitBlocked> {
        if self.phase == FormPhase::Submitting {
            return Err(SubmitBlocked::InFlight);
        }
        let missing = self.validate();
        if !missing.is_empty() {
            self.errors = FormErrors::from_missing(&missing);
            return Err(SubmitBlocked::Missing(missing));
        }
        self.errors = FormErrors::new();
        self.phase = FormPhase::Submitting;
        Ok(Submission {
            payload: self.data.to_payload(self.parent_id),
            image: self.data.image.clone(),
            file: self.data.file.clone(),
        })
    }

    pub fn submit_succeeded(&mut self, captcha_nonce: u64) {
        self.data = FormData::default();
        self.errors = FormErrors::new();
        self.phase = FormPhase::Success;
        self.captcha_nonce = captcha_nonce;
    }

    /// Server rejected the comment; entered values stay so the user can fix them.
    pub fn submit_rejected(&mut self, errors: FormErrors) {
        self.errors.merge(errors);
        self.phase = FormPhase::Editing;
    }

    /// Transport failure without an error body.
    pub fn submit_failed(&mut self) {
        self.phase = FormPhase::Editing;
    }

    pub fn refresh_captcha(&mut self, captcha_nonce: u64) {
        self.captcha_nonce = captcha_nonce;
    }

    pub fn reopen(&mut self) {
        self.data = FormData::default();
        self.errors = FormErrors::new();
        self.phase = FormPhase::Editing;
    }
}
