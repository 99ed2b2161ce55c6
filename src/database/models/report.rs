use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub id: i64,
    pub report_type: String,
    pub format: String,
    pub generated_by: i64,
    pub generator: String,
    pub parameters: serde_json::Value,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
