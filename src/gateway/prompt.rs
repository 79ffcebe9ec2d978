//! Prompt construction for financial-analysis requests.

use serde_json::Value;

use crate::domain::{OperationType, Request, Snapshot};

/// Build the provider prompt for a request, grounding it in the current
/// reference snapshot. Indicators are listed in sorted order so the same
/// request and snapshot always produce the same prompt.
#[must_use]
pub fn build_prompt(request: &Request, snapshot: &Snapshot) -> String {
    let instruction = match request.operation() {
        OperationType::Analysis => {
            "Produce a concise financial analysis of the instrument described below."
        }
        OperationType::RiskAssessment => {
            "Assess the risk profile of the position described below and classify it as low, medium, or high."
        }
        OperationType::FraudCheck => {
            "Review the transaction described below for indicators of fraudulent activity."
        }
    };

    let payload = Value::Object(request.payload().clone());

    let mut indicators: Vec<(&String, _)> = snapshot.indicators.iter().collect();
    indicators.sort_by_key(|(name, _)| name.as_str());
    let reference = if indicators.is_empty() {
        "No reference data available.".to_string()
    } else {
        indicators
            .iter()
            .map(|(name, value)| format!("- {name}: {value}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"{instruction}

## Request
{payload:#}

## Market reference data (as of {as_of})
{reference}

Respond with findings only; do not restate the request.
"#,
        as_of = snapshot.as_of,
    )
}
