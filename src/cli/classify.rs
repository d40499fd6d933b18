//! Handler for `linkwatch classify`.

use serde_json::json;

use super::output;
use crate::domain::categorize_error;
use crate::error::Result;

pub fn execute(message: &str) -> Result<()> {
    let classification = categorize_error(message);

    if output::is_json() {
        output::json_output(json!({
            "type": "classification",
            "payload": {
                "category": classification.category,
                "is_retryable": classification.is_retryable,
                "severity": classification.severity,
                "message": classification.message,
                "user_message": classification.user_message(),
            },
        }));
        return Ok(());
    }

    output::section("Classification");
    output::field("Category", output::highlight(classification.category.as_str()));
    output::field("Severity", classification.severity);
    output::field("Retryable", classification.is_retryable);
    output::field("User message", classification.user_message());
    Ok(())
}
