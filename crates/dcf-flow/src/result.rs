//! Step results
//!
//! A step returns one of three shapes: a form to render, an entry to create,
//! or an abort. [`FlowResponse`] is the JSON shape the frontend expects.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::flow::OptionsPayload;

/// Outcome of a single flow step
#[derive(Debug, Clone, PartialEq)]
pub enum FlowResult {
    /// Show a form and wait for input
    Form(FlowForm),
    /// Finish the flow by creating (or, for options flows, updating) an entry
    CreateEntry(CreatedEntry),
    /// Finish the flow without a result
    Abort { reason: String },
}

impl FlowResult {
    pub fn abort(reason: impl Into<String>) -> Self {
        FlowResult::Abort {
            reason: reason.into(),
        }
    }

    pub fn create_entry(
        title: impl Into<String>,
        data: HashMap<String, serde_json::Value>,
        options: OptionsPayload,
    ) -> Self {
        FlowResult::CreateEntry(CreatedEntry {
            title: title.into(),
            data,
            options,
        })
    }

    /// Wire name of the result type
    pub fn result_type(&self) -> &'static str {
        match self {
            FlowResult::Form(_) => "form",
            FlowResult::CreateEntry(_) => "create_entry",
            FlowResult::Abort { .. } => "abort",
        }
    }

    pub fn as_form(&self) -> Option<&FlowForm> {
        match self {
            FlowResult::Form(form) => Some(form),
            _ => None,
        }
    }

    pub fn as_created(&self) -> Option<&CreatedEntry> {
        match self {
            FlowResult::CreateEntry(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn abort_reason(&self) -> Option<&str> {
        match self {
            FlowResult::Abort { reason } => Some(reason),
            _ => None,
        }
    }

    /// Whether the flow is finished after this result
    pub fn is_terminal(&self) -> bool {
        !matches!(self, FlowResult::Form(_))
    }
}

/// A form to show to the user
#[derive(Debug, Clone, PartialEq)]
pub struct FlowForm {
    pub step_id: String,
    pub data_schema: Vec<FormField>,
    pub errors: HashMap<String, String>,
    pub description_placeholders: HashMap<String, String>,
}

impl FlowForm {
    pub fn new(step_id: impl Into<String>, data_schema: Vec<FormField>) -> Self {
        Self {
            step_id: step_id.into(),
            data_schema,
            errors: HashMap::new(),
            description_placeholders: HashMap::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.data_schema.iter().find(|f| f.name == name)
    }
}

/// Entry produced by a finished flow
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedEntry {
    /// Empty for options flows, which never rename the entry
    pub title: String,
    pub data: HashMap<String, serde_json::Value>,
    pub options: OptionsPayload,
}

/// Form field schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

/// Field type, serialized as the `type` key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    /// Pick any subset of `options`
    MultiSelect { options: Vec<String> },
    String,
    Boolean,
}

impl FormField {
    fn optional(name: &str, kind: FieldKind, default: serde_json::Value) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: Some(false),
            default: Some(default),
        }
    }

    pub fn multi_select(name: &str, options: Vec<String>, default: Vec<String>) -> Self {
        Self::optional(
            name,
            FieldKind::MultiSelect { options },
            serde_json::Value::from(default),
        )
    }

    pub fn string(name: &str, default: impl Into<String>) -> Self {
        Self::optional(
            name,
            FieldKind::String,
            serde_json::Value::String(default.into()),
        )
    }

    pub fn boolean(name: &str, default: bool) -> Self {
        Self::optional(name, FieldKind::Boolean, serde_json::Value::Bool(default))
    }

    /// Options of a multi-select field
    pub fn options(&self) -> Option<&[String]> {
        match &self.kind {
            FieldKind::MultiSelect { options } => Some(options),
            _ => None,
        }
    }
}

/// Flow result as sent to the frontend
#[derive(Debug, Clone, Serialize)]
pub struct FlowResponse {
    pub flow_id: String,
    /// Integration domain for config flows, entry id for options flows
    pub handler: String,
    #[serde(rename = "type")]
    pub result_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    /// Always present, empty array if no schema
    pub data_schema: Vec<FormField>,
    /// Always present, null if none
    pub errors: Option<HashMap<String, String>>,
    /// Always present, null if none
    pub description_placeholders: Option<HashMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// The created or updated entry, for create_entry results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

impl FlowResponse {
    pub fn new(flow_id: impl Into<String>, handler: impl Into<String>, result: &FlowResult) -> Self {
        let mut response = Self {
            flow_id: flow_id.into(),
            handler: handler.into(),
            result_type: result.result_type().to_string(),
            step_id: None,
            data_schema: Vec::new(),
            errors: None,
            description_placeholders: None,
            title: None,
            reason: None,
            result: None,
        };

        match result {
            FlowResult::Form(form) => {
                response.step_id = Some(form.step_id.clone());
                response.data_schema = form.data_schema.clone();
                response.errors = non_empty(&form.errors);
                response.description_placeholders = non_empty(&form.description_placeholders);
            }
            FlowResult::CreateEntry(entry) => {
                response.title = Some(entry.title.clone());
            }
            FlowResult::Abort { reason } => {
                response.reason = Some(reason.clone());
            }
        }

        response
    }

    pub fn with_result(mut self, result: serde_json::Value) -> Self {
        self.result = Some(result);
        self
    }
}

fn non_empty(map: &HashMap<String, String>) -> Option<HashMap<String, String>> {
    if map.is_empty() {
        None
    } else {
        Some(map.clone())
    }
}
