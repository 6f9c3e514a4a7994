use crate::drivers::{top_driver_codes, DriverCode};
use crate::scoring::{calculate_results, CalculationResults, CalculatorInputs};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque submission key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub Uuid);

impl SubmissionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SubmissionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Immutable historical record of one calculator run.
///
/// Results and driver codes are always derived server-side from the
/// inputs; client-submitted results are never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: SubmissionId,
    pub created_at: DateTime<Utc>,
    pub inputs: CalculatorInputs,
    pub results: CalculationResults,
    pub drivers: [DriverCode; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl SubmissionRecord {
    /// Build a fresh record, recomputing results and drivers from inputs.
    pub fn from_inputs(inputs: CalculatorInputs, email: Option<String>) -> Self {
        Self {
            id: SubmissionId::new(),
            created_at: Utc::now(),
            results: calculate_results(&inputs),
            drivers: top_driver_codes(&inputs),
            inputs,
            email,
        }
    }

    /// Replace inputs (and optionally the contact email), rederiving the
    /// stored results and drivers. Identity and creation time survive.
    pub fn with_inputs(mut self, inputs: CalculatorInputs, email: Option<String>) -> Self {
        self.results = calculate_results(&inputs);
        self.drivers = top_driver_codes(&inputs);
        self.inputs = inputs;
        self.email = email;
        self
    }
}
