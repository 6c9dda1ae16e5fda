// ! Merging a freshly fetched settings schema into user settings

use std::fmt;

use tracing::warn;

use crate::settings::setting::{Setting, SettingKind, SettingsMap};

/// Kept user value that the updated definition no longer offers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeWarning {
    /// Setting name
    pub key: String,
    /// The user value that was kept
    pub value: String,
    /// Kind of the updated definition
    pub kind: &'static str,
}

impl fmt::Display for MergeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "setting '{}': kept value '{}' is not offered by the updated {} definition",
            self.key, self.value, self.kind
        )
    }
}

/// Result of [`merge`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub settings: SettingsMap,
    pub warnings: Vec<MergeWarning>,
}

/// Merge `fresh` definitions into `existing` user settings.
///
/// - In both: the user value is kept, the kind comes from `fresh`. Kinds with an
///   open parameter list get the deduplicated union of fresh and prior
///   parameters; `TOGGLE` and `RANGE` take the fresh shape. A kept value the
///   result does not offer yields a [`MergeWarning`] unless the kind is `STRING`.
/// - Only in `fresh`: inserted as is.
/// - Only in `existing`: kept as is.
pub fn merge(existing: SettingsMap, fresh: SettingsMap) -> MergeOutcome {
    let mut settings = existing;
    let mut warnings = Vec::new();

    for (key, definition) in fresh {
        let merged = match settings.remove(&key) {
            Some(current) => {
                let merged = reconcile(current, definition);
                if !matches!(merged.kind, SettingKind::String(_)) && !merged.is_value_offered() {
                    let warning = MergeWarning {
                        key: key.clone(),
                        value: merged.value.clone(),
                        kind: merged.kind.name(),
                    };
                    warn!("{}", warning);
                    warnings.push(warning);
                }
                merged
            }
            None => definition,
        };
        settings.insert(key, merged);
    }

    MergeOutcome { settings, warnings }
}

fn reconcile(current: Setting, definition: Setting) -> Setting {
    let kind = if definition.kind.has_open_parameters() {
        let parameters = union(definition.parameters(), current.parameters());
        with_open_parameters(definition.kind, parameters)
    } else {
        definition.kind
    };

    Setting {
        name: definition.name,
        kind,
        value: current.value,
    }
}

// Fresh parameters first, then prior ones the fresh list lacks
fn union(fresh: Vec<String>, prior: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(fresh.len() + prior.len());
    for parameter in fresh.into_iter().chain(prior) {
        if !out.contains(&parameter) {
            out.push(parameter);
        }
    }
    out
}

fn with_open_parameters(kind: SettingKind, parameters: Vec<String>) -> SettingKind {
    match kind {
        SettingKind::String(_) => SettingKind::String(parameters),
        SettingKind::Select(_) => SettingKind::Select(parameters),
        SettingKind::MultiSelect(_) => SettingKind::MultiSelect(parameters),
        fixed => fixed,
    }
}
