//! Authorization decision type returned by the engine.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Stable numeric outcome codes carried on a [`Decision`].
///
/// `Permitted` is the only code paired with `allowed = true`; every denial
/// carries one of the non-zero codes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
#[serde(into = "u16", try_from = "u16")]
pub enum DecisionCode {
    Permitted,
    DeniedByPolicy,
    NoApplicablePolicy,
    Indeterminate,
}

impl From<DecisionCode> for u16 {
    fn from(code: DecisionCode) -> Self {
        match code {
            DecisionCode::Permitted => 0,
            DecisionCode::DeniedByPolicy => 1,
            DecisionCode::NoApplicablePolicy => 2,
            DecisionCode::Indeterminate => 3,
        }
    }
}

impl TryFrom<u16> for DecisionCode {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DecisionCode::Permitted),
            1 => Ok(DecisionCode::DeniedByPolicy),
            2 => Ok(DecisionCode::NoApplicablePolicy),
            3 => Ok(DecisionCode::Indeterminate),
            other => Err(format!("unknown decision code {other}")),
        }
    }
}

/// The combined outcome of one authorization request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Decision {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub code: DecisionCode,
}

impl Decision {
    pub fn permitted() -> Self {
        Decision {
            allowed: true,
            message: None,
            code: DecisionCode::Permitted,
        }
    }

    pub fn denied_by(policy_name: &str, description: &str) -> Self {
        let message = if description.is_empty() {
            format!("denied by policy '{policy_name}'")
        } else {
            format!("denied by policy '{policy_name}': {description}")
        };
        Decision {
            allowed: false,
            message: Some(message),
            code: DecisionCode::DeniedByPolicy,
        }
    }

    pub fn no_applicable_policy(action: &str) -> Self {
        Decision {
            allowed: false,
            message: Some(format!("no applicable policy for action '{action}'")),
            code: DecisionCode::NoApplicablePolicy,
        }
    }

    pub fn indeterminate(action: &str) -> Self {
        Decision {
            allowed: false,
            message: Some(format!(
                "policy evaluation for action '{action}' was indeterminate"
            )),
            code: DecisionCode::Indeterminate,
        }
    }
}

impl Display for Decision {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let verdict = if self.allowed { "Permit" } else { "Deny" };
        match &self.message {
            Some(message) => write!(f, "{verdict}({message})"),
            None => write!(f, "{verdict}"),
        }
    }
}
