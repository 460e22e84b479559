//! Guided intake wizard types.
//!
//! The wizard is a three-step form: free-text details, then a subject pick,
//! then a request-kind pick. Completing the last step emits exactly one
//! `HandoffRecord` to the administrative channel.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::UserId;

/// Maximum accepted length of the free-text details field.
pub const MAX_DETAILS_LEN: usize = 1000;

/// Subjects offered by the intake form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Maths,
    Science,
    Reading,
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Maths => write!(f, "Maths"),
            Subject::Science => write!(f, "Science"),
            Subject::Reading => write!(f, "Reading"),
        }
    }
}

impl FromStr for Subject {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "maths" | "math" => Ok(Subject::Maths),
            "science" => Ok(Subject::Science),
            "reading" => Ok(Subject::Reading),
            other => Err(format!("invalid subject: '{other}'")),
        }
    }
}

/// Kinds of request the form accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Homework,
    XpBoost,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::Homework => write!(f, "Homework"),
            RequestKind::XpBoost => write!(f, "XP Boost"),
        }
    }
}

/// Stage of an in-flight wizard session.
///
/// There is no `Idle` variant: a user with no entry in the session map is
/// idle, and the terminal stage deletes the entry, so only intermediate
/// stages are representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStage {
    DetailsCollected,
    SubjectChosen,
}

/// One user-initiated wizard transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum WizardStep {
    /// Intake-form submission carrying the free-text details.
    Start { details: String },
    ChooseSubject { subject: Subject },
    ChooseKind { kind: RequestKind },
}

/// Outcome of applying a `WizardStep`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WizardOutcome {
    /// Details captured; prompt the user for a subject.
    AwaitingSubject,
    /// Subject captured; prompt the user for a request kind.
    AwaitingKind,
    /// Terminal step reached; the handoff was emitted and the session closed.
    Completed { record: HandoffRecord },
    /// No live session for this user (never started, completed, or lost).
    Expired,
}

/// Structured output of a completed wizard session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffRecord {
    pub id: Uuid,
    pub user: UserId,
    pub subject: Subject,
    pub kind: RequestKind,
    pub details: String,
    pub created_at: DateTime<Utc>,
}
