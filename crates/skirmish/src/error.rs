//! Errors raised while configuring a simulation.
//!
//! Only setup can fail: registering templates, spawning entities and loading
//! levels. Once the simulation is running, every per-frame operation is total
//! and stale references are handled by the entities themselves.

use std::fmt;
use std::io;

/// Errors returned by template registration, entity creation and level loading.
#[derive(Debug)]
pub enum SimError {
    /// A template with this name is already registered.
    DuplicateTemplate(String),
    /// No template with this name is registered.
    UnknownTemplate(String),
    /// The template exists but cannot back the requested entity kind.
    TemplateMismatch {
        template: String,
        expected: &'static str,
    },
    /// A required field is absent from a template or entity declaration.
    MissingField {
        owner: String,
        field: &'static str,
    },
    /// A field is present but its value is unusable.
    InvalidField {
        owner: String,
        field: &'static str,
        reason: String,
    },
    /// A shell names an owner that is not a live tank.
    UnknownOwner(String),
    /// Reading a level or config file failed.
    Io(io::Error),
    /// A level or config document is not valid JSON for its schema.
    Json(serde_json::Error),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::DuplicateTemplate(name) => write!(f, "template \"{name}\" already exists"),
            SimError::UnknownTemplate(name) => write!(f, "no template named \"{name}\""),
            SimError::TemplateMismatch { template, expected } => {
                write!(f, "template \"{template}\" cannot be used for a {expected}")
            }
            SimError::MissingField { owner, field } => {
                write!(f, "\"{owner}\" is missing required field `{field}`")
            }
            SimError::InvalidField {
                owner,
                field,
                reason,
            } => write!(f, "\"{owner}\" has invalid `{field}`: {reason}"),
            SimError::UnknownOwner(name) => write!(f, "shell owner \"{name}\" is not a tank"),
            SimError::Io(e) => write!(f, "level i/o failed: {e}"),
            SimError::Json(e) => write!(f, "level parse failed: {e}"),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Io(e) => Some(e),
            SimError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SimError {
    fn from(e: io::Error) -> Self {
        SimError::Io(e)
    }
}

impl From<serde_json::Error> for SimError {
    fn from(e: serde_json::Error) -> Self {
        SimError::Json(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offender() {
        let e = SimError::MissingField {
            owner: "Rogue Scout".into(),
            field: "max_hp",
        };
        assert_eq!(e.to_string(), "\"Rogue Scout\" is missing required field `max_hp`");
    }

    #[test]
    fn json_errors_keep_their_source() {
        let parse = serde_json::from_str::<u32>("nope").unwrap_err();
        let e: SimError = parse.into();
        assert!(std::error::Error::source(&e).is_some());
        assert!(e.to_string().starts_with("level parse failed"));
    }
}
