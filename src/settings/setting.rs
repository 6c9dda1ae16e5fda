// ! Typed plugin settings
// !
// ! A setting's kind carries its own parameter shape, so a `Toggle` always
// ! holds two states and a `Range` always holds two integers.

use std::collections::BTreeMap;
use std::fmt;

use crate::core::error::{UpdaterError, UpdaterResult};

/// Settings of one plugin keyed by setting name
pub type SettingsMap = BTreeMap<String, Setting>;

/// Kind of a setting together with its validated parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingKind {
    /// Free-form text; parameters are optional hints
    String(Vec<String>),
    /// One of a non-empty list of options
    Select(Vec<String>),
    /// Any subset of a non-empty list of options, comma separated in the value
    MultiSelect(Vec<String>),
    /// One of exactly two switch states
    Toggle([String; 2]),
    /// An integer between `min` and `max` inclusive
    Range { min: i32, max: i32 },
}

impl SettingKind {
    /// Canonical names in the order they are documented
    pub const NAMES: [&'static str; 5] = ["STRING", "SELECT", "MSELECT", "TOGGLE", "RANGE"];

    /// Build a kind from its name and raw parameter list.
    ///
    /// Kind names are matched case-insensitively. Fails with
    /// [`UpdaterError::Validation`] when the name is unknown or the parameters
    /// do not have the shape the kind requires. Parameters must be non-empty
    /// and free of `,`, `]=` and line breaks so they survive a file round trip.
    pub fn from_parts(kind: &str, parameters: Vec<String>) -> UpdaterResult<Self> {
        if let Some(bad) = parameters.iter().find(|p| !is_storable_parameter(p)) {
            return Err(UpdaterError::validation(format!(
                "{} parameter '{}' must be non-empty without ',', ']=' or line breaks",
                kind.to_ascii_uppercase(),
                bad.escape_debug()
            )));
        }

        match kind.to_ascii_uppercase().as_str() {
            "STRING" => Ok(SettingKind::String(parameters)),
            "SELECT" => non_empty("SELECT", parameters).map(SettingKind::Select),
            "MSELECT" => non_empty("MSELECT", parameters).map(SettingKind::MultiSelect),
            "TOGGLE" => {
                let [on, off]: [String; 2] = parameters.try_into().map_err(|p: Vec<String>| {
                    UpdaterError::validation(format!(
                        "TOGGLE expects exactly 2 switch states, got {}",
                        p.len()
                    ))
                })?;
                Ok(SettingKind::Toggle([on, off]))
            }
            "RANGE" => {
                let [min, max]: [String; 2] = parameters.try_into().map_err(|p: Vec<String>| {
                    UpdaterError::validation(format!(
                        "RANGE expects exactly 2 integer bounds, got {}",
                        p.len()
                    ))
                })?;
                Ok(SettingKind::Range {
                    min: parse_bound(&min)?,
                    max: parse_bound(&max)?,
                })
            }
            _ => Err(UpdaterError::validation(format!(
                "unknown setting kind '{kind}', expected one of {}",
                Self::NAMES.join(", ")
            ))),
        }
    }

    /// Canonical upper-case name of the kind
    pub fn name(&self) -> &'static str {
        match self {
            SettingKind::String(_) => "STRING",
            SettingKind::Select(_) => "SELECT",
            SettingKind::MultiSelect(_) => "MSELECT",
            SettingKind::Toggle(_) => "TOGGLE",
            SettingKind::Range { .. } => "RANGE",
        }
    }

    /// Parameters rendered back to their string form
    pub fn parameters(&self) -> Vec<String> {
        match self {
            SettingKind::String(p) | SettingKind::Select(p) | SettingKind::MultiSelect(p) => {
                p.clone()
            }
            SettingKind::Toggle(states) => states.to_vec(),
            SettingKind::Range { min, max } => vec![min.to_string(), max.to_string()],
        }
    }

    /// Whether the kind takes a variable-length parameter list
    pub fn has_open_parameters(&self) -> bool {
        matches!(
            self,
            SettingKind::String(_) | SettingKind::Select(_) | SettingKind::MultiSelect(_)
        )
    }

    /// Whether `value` is one the kind offers.
    ///
    /// `STRING` accepts anything. An empty `MSELECT` value is an empty selection.
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            SettingKind::String(_) => true,
            SettingKind::Select(options) => options.iter().any(|o| o == value),
            SettingKind::MultiSelect(options) => value
                .split(',')
                .filter(|item| !item.is_empty())
                .all(|item| options.iter().any(|o| o == item)),
            SettingKind::Toggle(states) => states.iter().any(|s| s == value),
            SettingKind::Range { min, max } => value
                .trim()
                .parse::<i32>()
                .is_ok_and(|v| *min <= v && v <= *max),
        }
    }
}

impl fmt::Display for SettingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn is_storable_parameter(parameter: &str) -> bool {
    !parameter.is_empty()
        && !parameter.contains([',', '\n', '\r'])
        && !parameter.contains("]=")
}

/// Check that `name` can be written as the name segment of a settings line
pub fn validate_name(name: &str) -> UpdaterResult<()> {
    if name.is_empty() {
        return Err(UpdaterError::validation("setting name is empty"));
    }
    if name.contains(['[', '\n', '\r']) {
        return Err(UpdaterError::validation(format!(
            "setting name '{}' must not contain '[' or line breaks",
            name.escape_debug()
        )));
    }
    Ok(())
}

fn non_empty(kind: &str, parameters: Vec<String>) -> UpdaterResult<Vec<String>> {
    if parameters.is_empty() {
        return Err(UpdaterError::validation(format!(
            "{kind} expects a non-empty list of options"
        )));
    }
    Ok(parameters)
}

fn parse_bound(raw: &str) -> UpdaterResult<i32> {
    raw.trim().parse::<i32>().map_err(|e| {
        UpdaterError::validation(format!(
            "RANGE bound '{raw}' is not a 32-bit signed integer: {e}"
        ))
    })
}

/// One named, typed configuration value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting {
    /// Unique name within a plugin's settings
    pub name: String,

    /// Kind and its parameters
    pub kind: SettingKind,

    /// Current user-set or default value; empty is a valid value
    pub value: String,
}

impl Setting {
    /// Create a setting from a kind name and raw parameters, validating the
    /// name and the parameter shape
    pub fn new(
        name: impl Into<String>,
        kind: &str,
        parameters: Vec<String>,
        value: impl Into<String>,
    ) -> UpdaterResult<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self::with_kind(
            name,
            SettingKind::from_parts(kind, parameters)?,
            value,
        ))
    }

    /// Create a setting from an already validated kind
    pub fn with_kind(name: impl Into<String>, kind: SettingKind, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            value: value.into(),
        }
    }

    /// Parameters rendered back to their string form
    pub fn parameters(&self) -> Vec<String> {
        self.kind.parameters()
    }

    /// Whether the current value is one the kind offers
    pub fn is_value_offered(&self) -> bool {
        self.kind.accepts(&self.value)
    }
}
