//! Behaviour constants and per-voice rendering overrides.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    error::{ChainError, ChainResult},
    primitives::{beats, Time},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Playback duration of grace events, in beats.
    pub gracenote_dur: Time,
    /// Pitch tolerance when matching the end of a sound to the start of
    /// the next one.
    pub link_epsilon: f64,
    /// Largest gap, in beats, between linked events.
    pub link_min_gap: Time,
    pub default_amp: f64,
    pub voice_max_staves: usize,
    /// Search margin of [`Chain::event_at`](crate::primitives::Chain::event_at).
    pub event_at_margin: Time,
}
impl Default for Settings {
    fn default() -> Self {
        Self {
            gracenote_dur: beats(1, 14),
            link_epsilon: 1e-6,
            link_min_gap: beats(1, 1000),
            default_amp: 0.5,
            voice_max_staves: 1,
            event_at_margin: beats(1, 8),
        }
    }
}

/// Value of a rendering option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}
impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "'{v}'"),
        }
    }
}
impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}
impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}
impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}
impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

#[derive(Debug, Clone, Copy)]
enum ValueKind {
    Bool,
    Int(i64, i64),
    Float(f64, f64),
    Choice(&'static [&'static str]),
}

const CONFIG_KEYS: &[(&str, ValueKind)] = &[
    (
        "quant.complexity",
        ValueKind::Choice(&["lowest", "low", "medium", "high", "highest"]),
    ),
    (
        "quant.breakSyncopationsLevel",
        ValueKind::Choice(&["none", "all", "weak", "strong"]),
    ),
    ("quant.nestedTuplets", ValueKind::Bool),
    ("quant.minBeatFractionAcrossBeats", ValueKind::Float(0.0, 1.0)),
    ("quant.divisionErrorWeight", ValueKind::Float(0.0, 1.0)),
    ("quant.gridErrorWeight", ValueKind::Float(0.0, 1.0)),
    ("quant.rhythmComplexityWeight", ValueKind::Float(0.0, 1.0)),
    ("show.cents", ValueKind::Bool),
    ("show.centsFontSize", ValueKind::Int(4, 30)),
    ("show.gliss", ValueKind::Bool),
    ("show.glissHideTiedNotes", ValueKind::Bool),
    ("show.hideRedundantDynamics", ValueKind::Bool),
    ("show.respellPitches", ValueKind::Bool),
    ("show.split", ValueKind::Bool),
    ("show.staffSize", ValueKind::Float(4.0, 40.0)),
    ("show.lastBreakpointDur", ValueKind::Float(1.0 / 64.0, 1.0)),
    (
        "show.horizontalSpacing",
        ValueKind::Choice(&["default", "small", "medium", "large", "xlarge"]),
    ),
    ("show.voiceMaxStaves", ValueKind::Int(1, 4)),
];

/// Keys accepted by [`validate_config`].
pub fn config_keys() -> impl Iterator<Item = &'static str> {
    CONFIG_KEYS.iter().map(|(key, _)| *key)
}

/// Check that `key` is a known rendering option and `value` fits it.
///
/// Integers are accepted where floats are expected and are converted.
///
/// # Example
/// ```
/// use score_chain::settings::{validate_config, ConfigValue};
///
/// let value = validate_config("quant.gridErrorWeight", 1i64.into()).unwrap();
/// assert_eq!(value, ConfigValue::Float(1.0));
/// assert!(validate_config("quant.gridErrorWeight", 2.0.into()).is_err());
/// assert!(validate_config("show.unknown", true.into()).is_err());
/// ```
pub fn validate_config(
    key: &str,
    value: ConfigValue,
) -> ChainResult<ConfigValue> {
    let kind = CONFIG_KEYS
        .iter()
        .find(|(known, _)| *known == key)
        .map(|(_, kind)| *kind)
        .ok_or_else(|| ChainError::UnknownConfigKey {
            key: key.to_string(),
            known: config_keys().collect::<Vec<_>>().join(", "),
        })?;
    let shown = value.to_string();
    let invalid = |reason: String| ChainError::InvalidConfigValue {
        key: key.to_string(),
        value: shown.clone(),
        reason,
    };
    match (kind, &value) {
        (ValueKind::Bool, ConfigValue::Bool(_)) => Ok(value.clone()),
        (ValueKind::Int(min, max), ConfigValue::Int(v)) => {
            match (min..=max).contains(v) {
                true => Ok(value.clone()),
                false => Err(invalid(format!("expected {min}..={max}"))),
            }
        }
        (ValueKind::Float(min, max), ConfigValue::Float(v)) => {
            float_in_range(*v, min, max).map_err(invalid)
        }
        (ValueKind::Float(min, max), ConfigValue::Int(v)) => {
            float_in_range(*v as f64, min, max).map_err(invalid)
        }
        (ValueKind::Choice(choices), ConfigValue::Str(v)) => {
            match choices.contains(&v.as_str()) {
                true => Ok(value.clone()),
                false => Err(invalid(format!(
                    "expected one of {}",
                    choices.join(", ")
                ))),
            }
        }
        (kind, _) => Err(invalid(format!("expected {kind:?} value"))),
    }
}

fn float_in_range(v: f64, min: f64, max: f64) -> Result<ConfigValue, String> {
    match (min..=max).contains(&v) {
        true => Ok(ConfigValue::Float(v)),
        false => Err(format!("expected {min}..={max}")),
    }
}
