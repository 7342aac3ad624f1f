//! Bed cooldown parameters: raw overrides, per-mode schema and validation.
//!
//! Values arrive as text from three places (schema defaults, the config
//! file, `KEY=VALUE` arguments or host settings). They are layered into a
//! [`ParamOverrides`] and turned into a [`ParameterSet`] in one validation
//! step that reports every violated constraint at once.

use crate::error::{CooldownError, Result};
use crate::time::TimeEstimate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKey {
    SlicerTimeEstimated,
    ElapsedTimeThreshold,
    RemainTimeThreshold,
    ProgressThreshold,
    ProgressType,
    TargetTemp,
    Debug,
}

impl ParamKey {
    /// All keys, in command line order.
    pub const ALL: [ParamKey; 7] = [
        ParamKey::SlicerTimeEstimated,
        ParamKey::ElapsedTimeThreshold,
        ParamKey::RemainTimeThreshold,
        ParamKey::ProgressThreshold,
        ParamKey::ProgressType,
        ParamKey::TargetTemp,
        ParamKey::Debug,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ParamKey::SlicerTimeEstimated => "SLICER_TIME_ESTIMATED",
            ParamKey::ElapsedTimeThreshold => "ELAPSED_TIME_THRESHOLD",
            ParamKey::RemainTimeThreshold => "REMAIN_TIME_THRESHOLD",
            ParamKey::ProgressThreshold => "PROGRESS_THRESHOLD",
            ParamKey::ProgressType => "PROGRESS_TYPE",
            ParamKey::TargetTemp => "TARGET_TEMP",
            ParamKey::Debug => "DEBUG",
        }
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How the firmware macro measures print progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressType {
    /// Last M73 value, or `virtual_sdcard.progress` without a recent M73.
    VirtualSdcard,
    /// Estimate from file size and file position.
    DisplayStatus,
    /// Elapsed time / slicer estimated time * 100.
    Time,
}

impl ProgressType {
    pub const ALL: [ProgressType; 3] = [
        ProgressType::VirtualSdcard,
        ProgressType::DisplayStatus,
        ProgressType::Time,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressType::VirtualSdcard => "virtual_sdcard",
            ProgressType::DisplayStatus => "display_status",
            ProgressType::Time => "time",
        }
    }
}

impl fmt::Display for ProgressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProgressType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        ProgressType::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "'{}' is not one of [virtual_sdcard, display_status, time]",
                    s
                )
            })
    }
}

/// Unvalidated parameter text, one optional field per key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamOverrides {
    pub slicer_time_estimated: Option<String>,
    pub elapsed_time_threshold: Option<String>,
    pub remain_time_threshold: Option<String>,
    pub progress_threshold: Option<String>,
    pub progress_type: Option<String>,
    pub target_temp: Option<String>,
    pub debug: Option<String>,
}

impl ParamOverrides {
    pub fn get(&self, key: ParamKey) -> Option<&str> {
        self.slot(key).as_deref()
    }

    /// Collect `KEY=VALUE` tokens. Keys match case-insensitively anywhere in
    /// the token (so `--debug=true` works); without `=` the whole token is
    /// taken as the value. Later tokens win, unknown tokens are skipped.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Self {
        let mut overrides = Self::default();

        for arg in args {
            let arg = arg.as_ref();
            let lower = arg.to_ascii_lowercase();
            let mut recognized = false;

            for key in ParamKey::ALL {
                let name = key.name().to_ascii_lowercase();
                if let Some(pos) = lower.find(&name) {
                    let after = &arg[pos + name.len()..];
                    let value = after.strip_prefix('=').unwrap_or(arg);
                    *overrides.slot_mut(key) = Some(value.to_string());
                    recognized = true;
                }
            }

            if !recognized {
                debug!(arg, "ignoring unrecognized argument");
            }
        }

        overrides
    }

    /// Layer `other` on top of `self`; values set in `other` win.
    pub fn merge(self, other: ParamOverrides) -> Self {
        Self {
            slicer_time_estimated: other.slicer_time_estimated.or(self.slicer_time_estimated),
            elapsed_time_threshold: other.elapsed_time_threshold.or(self.elapsed_time_threshold),
            remain_time_threshold: other.remain_time_threshold.or(self.remain_time_threshold),
            progress_threshold: other.progress_threshold.or(self.progress_threshold),
            progress_type: other.progress_type.or(self.progress_type),
            target_temp: other.target_temp.or(self.target_temp),
            debug: other.debug.or(self.debug),
        }
    }

    fn slot(&self, key: ParamKey) -> &Option<String> {
        match key {
            ParamKey::SlicerTimeEstimated => &self.slicer_time_estimated,
            ParamKey::ElapsedTimeThreshold => &self.elapsed_time_threshold,
            ParamKey::RemainTimeThreshold => &self.remain_time_threshold,
            ParamKey::ProgressThreshold => &self.progress_threshold,
            ParamKey::ProgressType => &self.progress_type,
            ParamKey::TargetTemp => &self.target_temp,
            ParamKey::Debug => &self.debug,
        }
    }

    fn slot_mut(&mut self, key: ParamKey) -> &mut Option<String> {
        match key {
            ParamKey::SlicerTimeEstimated => &mut self.slicer_time_estimated,
            ParamKey::ElapsedTimeThreshold => &mut self.elapsed_time_threshold,
            ParamKey::RemainTimeThreshold => &mut self.remain_time_threshold,
            ParamKey::ProgressThreshold => &mut self.progress_threshold,
            ParamKey::ProgressType => &mut self.progress_type,
            ParamKey::TargetTemp => &mut self.target_temp,
            ParamKey::Debug => &mut self.debug,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Integer in `min..=max`; `max` of `None` means any `u64`.
    Integer { min: u64, max: Option<u64> },
    ProgressType,
    Bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamRule {
    pub key: ParamKey,
    pub default: &'static str,
    pub constraint: Constraint,
}

/// Defaults and allowed values for the configurable keys.
///
/// `SLICER_TIME_ESTIMATED` has no rule: it always comes from the G-code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSchema {
    pub rules: [ParamRule; 6],
}

const fn rule(key: ParamKey, default: &'static str, constraint: Constraint) -> ParamRule {
    ParamRule {
        key,
        default,
        constraint,
    }
}

/// Limits for the command line filter (OrcaSlicer post-processing).
pub const STANDALONE_SCHEMA: ParamSchema = ParamSchema {
    rules: [
        rule(
            ParamKey::ElapsedTimeThreshold,
            "900",
            Constraint::Integer { min: 0, max: None },
        ),
        rule(
            ParamKey::RemainTimeThreshold,
            "900",
            Constraint::Integer { min: 0, max: None },
        ),
        rule(
            ParamKey::ProgressThreshold,
            "90",
            Constraint::Integer {
                min: 0,
                max: Some(100),
            },
        ),
        rule(ParamKey::ProgressType, "time", Constraint::ProgressType),
        rule(
            ParamKey::TargetTemp,
            "60",
            Constraint::Integer {
                min: 0,
                max: Some(85),
            },
        ),
        rule(ParamKey::Debug, "false", Constraint::Bool),
    ],
};

/// Limits of the slicer plugin settings (Cura post-processing script).
pub const PLUGIN_SCHEMA: ParamSchema = ParamSchema {
    rules: [
        rule(
            ParamKey::ElapsedTimeThreshold,
            "901",
            Constraint::Integer {
                min: 0,
                max: Some(604_800),
            },
        ),
        rule(
            ParamKey::RemainTimeThreshold,
            "901",
            Constraint::Integer {
                min: 0,
                max: Some(604_800),
            },
        ),
        rule(
            ParamKey::ProgressThreshold,
            "75",
            Constraint::Integer {
                min: 0,
                max: Some(100),
            },
        ),
        rule(ParamKey::ProgressType, "time", Constraint::ProgressType),
        rule(
            ParamKey::TargetTemp,
            "0",
            Constraint::Integer {
                min: 0,
                max: Some(95),
            },
        ),
        rule(ParamKey::Debug, "false", Constraint::Bool),
    ],
};

impl ParamSchema {
    pub fn rule(&self, key: ParamKey) -> Option<&ParamRule> {
        self.rules.iter().find(|r| r.key == key)
    }

    /// Effective raw text for `key`: the override if set, else the default.
    pub fn raw_value<'a>(&self, key: ParamKey, overrides: &'a ParamOverrides) -> &'a str {
        overrides
            .get(key)
            .or_else(|| self.rule(key).map(|r| r.default))
            .unwrap_or("")
    }
}

/// Validated parameters, frozen once built. Field order is command order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ParameterSet {
    pub slicer_time_estimated: TimeEstimate,
    pub elapsed_time_threshold: u64,
    pub remain_time_threshold: u64,
    pub progress_threshold: u64,
    pub progress_type: ProgressType,
    pub target_temp: u64,
    pub debug: bool,
}

impl ParameterSet {
    /// Build the parameter set from schema defaults and `overrides`.
    ///
    /// A `SLICER_TIME_ESTIMATED` override is ignored in favour of `estimate`,
    /// which always comes from the G-code itself.
    pub fn resolve(
        estimate: TimeEstimate,
        overrides: &ParamOverrides,
        schema: &ParamSchema,
    ) -> Result<Self> {
        let mut validator = Validator {
            schema,
            overrides,
            problems: Vec::new(),
        };

        let elapsed_time_threshold = validator.integer(ParamKey::ElapsedTimeThreshold);
        let remain_time_threshold = validator.integer(ParamKey::RemainTimeThreshold);
        let progress_threshold = validator.integer(ParamKey::ProgressThreshold);
        let progress_type = validator.progress_type(ParamKey::ProgressType);
        let target_temp = validator.integer(ParamKey::TargetTemp);
        let debug = validator.flag(ParamKey::Debug);

        match (
            elapsed_time_threshold,
            remain_time_threshold,
            progress_threshold,
            progress_type,
            target_temp,
            debug,
        ) {
            (Some(elapsed), Some(remain), Some(progress), Some(kind), Some(temp), Some(debug))
                if validator.problems.is_empty() =>
            {
                Ok(Self {
                    slicer_time_estimated: estimate,
                    elapsed_time_threshold: elapsed,
                    remain_time_threshold: remain,
                    progress_threshold: progress,
                    progress_type: kind,
                    target_temp: temp,
                    debug,
                })
            }
            _ => Err(CooldownError::ParameterValidation {
                problems: validator.problems,
                params: raw_map(estimate, overrides, schema),
            }),
        }
    }

    /// `KEY=value` pairs in command order.
    pub fn pairs(&self) -> [(ParamKey, String); 7] {
        [
            (
                ParamKey::SlicerTimeEstimated,
                self.slicer_time_estimated.to_string(),
            ),
            (
                ParamKey::ElapsedTimeThreshold,
                self.elapsed_time_threshold.to_string(),
            ),
            (
                ParamKey::RemainTimeThreshold,
                self.remain_time_threshold.to_string(),
            ),
            (
                ParamKey::ProgressThreshold,
                self.progress_threshold.to_string(),
            ),
            (ParamKey::ProgressType, self.progress_type.to_string()),
            (ParamKey::TargetTemp, self.target_temp.to_string()),
            (ParamKey::Debug, self.debug.to_string()),
        ]
    }
}

struct Validator<'a> {
    schema: &'a ParamSchema,
    overrides: &'a ParamOverrides,
    problems: Vec<String>,
}

impl<'a> Validator<'a> {
    fn raw(&self, key: ParamKey) -> &'a str {
        self.schema.raw_value(key, self.overrides).trim()
    }

    fn constraint(&self, key: ParamKey) -> Option<Constraint> {
        self.schema.rule(key).map(|r| r.constraint)
    }

    fn integer(&mut self, key: ParamKey) -> Option<u64> {
        let Some(Constraint::Integer { min, max }) = self.constraint(key) else {
            self.problems.push(format!("{} has no integer rule", key));
            return None;
        };
        let raw = self.raw(key);

        let Ok(value) = raw.parse::<i128>() else {
            let problem = format!("{}='{}' is not an integer", key, raw);
            self.problems.push(problem);
            return None;
        };

        let upper = max.unwrap_or(u64::MAX);
        if value < i128::from(min) || value > i128::from(upper) {
            let problem = format!("{}={} is out of range ({}..={})", key, value, min, upper);
            self.problems.push(problem);
            return None;
        }

        u64::try_from(value).ok()
    }

    fn progress_type(&mut self, key: ParamKey) -> Option<ProgressType> {
        match self.raw(key).parse::<ProgressType>() {
            Ok(kind) => Some(kind),
            Err(reason) => {
                self.problems.push(format!("{}: {}", key, reason));
                None
            }
        }
    }

    fn flag(&mut self, key: ParamKey) -> Option<bool> {
        let raw = self.raw(key);
        if raw.eq_ignore_ascii_case("true") {
            Some(true)
        } else if raw.eq_ignore_ascii_case("false") {
            Some(false)
        } else {
            let problem = format!("{}='{}' is not one of [true, false]", key, raw);
            self.problems.push(problem);
            None
        }
    }
}

// Raw view of every parameter, for error reports.
fn raw_map(estimate: TimeEstimate, overrides: &ParamOverrides, schema: &ParamSchema) -> String {
    ParamKey::ALL
        .into_iter()
        .map(|key| match key {
            ParamKey::SlicerTimeEstimated => format!("{}={}", key, estimate),
            _ => format!("{}={}", key, schema.raw_value(key, overrides)),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
