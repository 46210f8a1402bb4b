//! The contract every external-call node follows.
//!
//! A node declares its inputs as an [`InputSchema`], receives them resolved
//! into [`NodeInputs`], and produces exactly one [`NodeOutput`]. Failures a
//! pipeline author can trigger through normal use (missing key, bad JSON,
//! provider outage) come back as in-band text; `Err` is reserved for schema
//! violations and explicit hard-fail modes.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::NodeError;
use crate::logging::{LogLevel, LogRecord, LogSink, NullLogSink, SharedLogSink};

/// Prompt sentinel hosts send to stop a conversational loop.
pub const EXIT_SENTINEL: &str = "exit";

/// True for prompts that must short-circuit without a provider call.
pub fn is_skippable_prompt(prompt: &str) -> bool {
    prompt.is_empty() || prompt == EXIT_SENTINEL
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        InputValue::Text(value.to_string())
    }
}

impl From<String> for InputValue {
    fn from(value: String) -> Self {
        InputValue::Text(value)
    }
}

impl From<bool> for InputValue {
    fn from(value: bool) -> Self {
        InputValue::Bool(value)
    }
}

impl From<i64> for InputValue {
    fn from(value: i64) -> Self {
        InputValue::Int(value)
    }
}

impl From<f64> for InputValue {
    fn from(value: f64) -> Self {
        InputValue::Float(value)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputKind {
    String {
        multiline: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        default: Option<String>,
    },
    Int {
        default: i64,
        min: i64,
        max: i64,
    },
    Float {
        default: f64,
        min: f64,
        max: f64,
        step: f64,
    },
    Bool {
        default: bool,
    },
    /// The first option is the widget default.
    Enum { options: &'static [&'static str] },
}

impl InputKind {
    pub fn default_value(&self) -> Option<InputValue> {
        match self {
            InputKind::String { default, .. } => default.clone().map(InputValue::Text),
            InputKind::Int { default, .. } => Some(InputValue::Int(*default)),
            InputKind::Float { default, .. } => Some(InputValue::Float(*default)),
            InputKind::Bool { default } => Some(InputValue::Bool(*default)),
            InputKind::Enum { options } => options.first().map(|o| InputValue::from(*o)),
        }
    }

    /// Validates `value` against this kind, widening integers to floats.
    pub fn check(&self, name: &str, value: &InputValue) -> Result<InputValue, NodeError> {
        match (self, value) {
            (InputKind::String { .. }, InputValue::Text(_)) => Ok(value.clone()),
            (InputKind::String { .. }, _) => Err(mismatch(name, "a string")),
            (InputKind::Int { min, max, .. }, InputValue::Int(v)) => {
                if v < min || v > max {
                    Err(NodeError::OutOfRange {
                        name: name.to_string(),
                        value: *v as f64,
                        min: *min as f64,
                        max: *max as f64,
                    })
                } else {
                    Ok(value.clone())
                }
            }
            (InputKind::Int { .. }, _) => Err(mismatch(name, "an integer")),
            (InputKind::Float { min, max, .. }, InputValue::Int(v)) => {
                check_float(name, *v as f64, *min, *max)
            }
            (InputKind::Float { min, max, .. }, InputValue::Float(v)) => {
                check_float(name, *v, *min, *max)
            }
            (InputKind::Float { .. }, _) => Err(mismatch(name, "a number")),
            (InputKind::Bool { .. }, InputValue::Bool(_)) => Ok(value.clone()),
            (InputKind::Bool { .. }, _) => Err(mismatch(name, "a boolean")),
            (InputKind::Enum { options }, InputValue::Text(v)) => {
                if options.contains(&v.as_str()) {
                    Ok(value.clone())
                } else {
                    Err(NodeError::InvalidChoice {
                        name: name.to_string(),
                        value: v.clone(),
                    })
                }
            }
            (InputKind::Enum { .. }, _) => Err(mismatch(name, "one of the listed options")),
        }
    }

    /// Parses a literal typed by a user into the value this kind expects.
    pub fn parse_literal(&self, name: &str, raw: &str) -> Result<InputValue, NodeError> {
        let parse_error = |expected: &'static str| NodeError::Parse {
            name: name.to_string(),
            value: raw.to_string(),
            expected,
        };

        match self {
            InputKind::String { .. } | InputKind::Enum { .. } => Ok(InputValue::from(raw)),
            InputKind::Int { .. } => raw
                .trim()
                .parse::<i64>()
                .map(InputValue::Int)
                .map_err(|_| parse_error("an integer")),
            InputKind::Float { .. } => raw
                .trim()
                .parse::<f64>()
                .map(InputValue::Float)
                .map_err(|_| parse_error("a number")),
            InputKind::Bool { .. } => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(InputValue::Bool(true)),
                "false" | "0" | "no" => Ok(InputValue::Bool(false)),
                _ => Err(parse_error("true or false")),
            },
        }
    }
}

fn mismatch(name: &str, expected: &'static str) -> NodeError {
    NodeError::TypeMismatch {
        name: name.to_string(),
        expected,
    }
}

fn check_float(name: &str, value: f64, min: f64, max: f64) -> Result<InputValue, NodeError> {
    if value.is_nan() || value < min || value > max {
        return Err(NodeError::OutOfRange {
            name: name.to_string(),
            value,
            min,
            max,
        });
    }
    Ok(InputValue::Float(value))
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InputSpec {
    pub name: &'static str,
    pub kind: InputKind,
}

impl InputSpec {
    pub fn string(name: &'static str) -> Self {
        Self {
            name,
            kind: InputKind::String {
                multiline: false,
                default: None,
            },
        }
    }

    pub fn int(name: &'static str, default: i64, min: i64, max: i64) -> Self {
        Self {
            name,
            kind: InputKind::Int { default, min, max },
        }
    }

    pub fn float(name: &'static str, default: f64, min: f64, max: f64, step: f64) -> Self {
        Self {
            name,
            kind: InputKind::Float {
                default,
                min,
                max,
                step,
            },
        }
    }

    pub fn boolean(name: &'static str, default: bool) -> Self {
        Self {
            name,
            kind: InputKind::Bool { default },
        }
    }

    pub fn choice(name: &'static str, options: &'static [&'static str]) -> Self {
        Self {
            name,
            kind: InputKind::Enum { options },
        }
    }

    /// Only meaningful on string inputs; other kinds are returned unchanged.
    pub fn multiline(mut self) -> Self {
        if let InputKind::String { multiline, .. } = &mut self.kind {
            *multiline = true;
        }
        self
    }

    /// Only meaningful on string inputs; other kinds are returned unchanged.
    pub fn with_default(mut self, value: &str) -> Self {
        if let InputKind::String { default, .. } = &mut self.kind {
            *default = Some(value.to_string());
        }
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct InputSchema {
    pub required: Vec<InputSpec>,
    pub optional: Vec<InputSpec>,
}

impl InputSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, spec: InputSpec) -> Self {
        self.required.push(spec);
        self
    }

    pub fn optional(mut self, spec: InputSpec) -> Self {
        self.optional.push(spec);
        self
    }

    pub fn find(&self, name: &str) -> Option<&InputSpec> {
        self.required
            .iter()
            .chain(self.optional.iter())
            .find(|spec| spec.name == name)
    }

    /// The values a host form shows before the user edits anything.
    pub fn widget_defaults(&self) -> BTreeMap<String, InputValue> {
        self.required
            .iter()
            .chain(self.optional.iter())
            .filter_map(|spec| {
                spec.kind
                    .default_value()
                    .map(|value| (spec.name.to_string(), value))
            })
            .collect()
    }

    /// Checks `raw` against the declaration. Undeclared names are ignored.
    pub fn resolve(&self, raw: &BTreeMap<String, InputValue>) -> Result<NodeInputs, NodeError> {
        let mut values = BTreeMap::new();

        for spec in &self.required {
            let value = raw
                .get(spec.name)
                .ok_or_else(|| NodeError::MissingInput(spec.name.to_string()))?;
            values.insert(spec.name.to_string(), spec.kind.check(spec.name, value)?);
        }

        for spec in &self.optional {
            match raw.get(spec.name) {
                Some(value) => {
                    values.insert(spec.name.to_string(), spec.kind.check(spec.name, value)?);
                }
                None => {
                    if let Some(default) = spec.kind.default_value() {
                        values.insert(spec.name.to_string(), default);
                    }
                }
            }
        }

        Ok(NodeInputs { values })
    }
}

/// Inputs that passed [`InputSchema::resolve`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeInputs {
    values: BTreeMap<String, InputValue>,
}

impl NodeInputs {
    pub fn get(&self, name: &str) -> Option<&InputValue> {
        self.values.get(name)
    }

    pub fn text(&self, name: &str) -> Result<&str, NodeError> {
        match self.require(name)? {
            InputValue::Text(value) => Ok(value),
            _ => Err(mismatch(name, "a string")),
        }
    }

    pub fn opt_text(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(InputValue::Text(value)) => Some(value),
            _ => None,
        }
    }

    pub fn int(&self, name: &str) -> Result<i64, NodeError> {
        match self.require(name)? {
            InputValue::Int(value) => Ok(*value),
            _ => Err(mismatch(name, "an integer")),
        }
    }

    pub fn float(&self, name: &str) -> Result<f64, NodeError> {
        match self.require(name)? {
            InputValue::Float(value) => Ok(*value),
            InputValue::Int(value) => Ok(*value as f64),
            _ => Err(mismatch(name, "a number")),
        }
    }

    pub fn boolean(&self, name: &str) -> Result<bool, NodeError> {
        match self.require(name)? {
            InputValue::Bool(value) => Ok(*value),
            _ => Err(mismatch(name, "a boolean")),
        }
    }

    fn require(&self, name: &str) -> Result<&InputValue, NodeError> {
        self.values
            .get(name)
            .ok_or_else(|| NodeError::MissingInput(name.to_string()))
    }
}

/// The single result slot of a node.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NodeOutput {
    Empty,
    Text(String),
    Vector(Vec<f64>),
}

impl NodeOutput {
    pub fn text(value: impl Into<String>) -> Self {
        NodeOutput::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            NodeOutput::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[f64]> {
        match self {
            NodeOutput::Vector(values) => Some(values),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, NodeOutput::Empty)
    }
}

impl fmt::Display for NodeOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeOutput::Empty => Ok(()),
            NodeOutput::Text(value) => f.write_str(value),
            NodeOutput::Vector(values) => {
                let encoded = serde_json::to_string(values).map_err(|_| fmt::Error)?;
                f.write_str(&encoded)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    String,
    Vector,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct OutputSpec {
    pub name: &'static str,
    pub kind: OutputKind,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct NodeMetadata {
    pub id: &'static str,
    pub display_name: &'static str,
    pub category: &'static str,
    pub output: OutputSpec,
}

/// Read-only state a host hands to every execution.
#[derive(Clone)]
pub struct NodeContext {
    config: Config,
    sink: SharedLogSink,
}

impl NodeContext {
    pub fn new(config: Config, sink: SharedLogSink) -> Self {
        Self { config, sink }
    }

    pub fn with_config(config: Config) -> Self {
        Self::new(config, Arc::new(NullLogSink))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sink(&self) -> &dyn LogSink {
        self.sink.as_ref()
    }

    pub fn info(&self, message: impl Into<String>) {
        self.sink.log(LogRecord::new(LogLevel::Info, message));
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.sink.log(LogRecord::new(LogLevel::Warn, message));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.sink.log(LogRecord::new(LogLevel::Error, message));
    }
}

impl fmt::Debug for NodeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

pub trait Node: Send + Sync {
    fn metadata(&self) -> NodeMetadata;

    fn input_schema(&self) -> InputSchema;

    fn execute(&self, ctx: &NodeContext, inputs: &NodeInputs) -> Result<NodeOutput, NodeError>;

    fn run(
        &self,
        ctx: &NodeContext,
        raw: &BTreeMap<String, InputValue>,
    ) -> Result<NodeOutput, NodeError> {
        let inputs = self.input_schema().resolve(raw)?;
        self.execute(ctx, &inputs)
    }
}
