use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: i64,
    pub actor: Option<String>,
    pub action: String,
    pub entity: String,
    pub details: String,
    pub severity: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub actor: Option<String>,
    pub action: String,
    pub entity: String,
    pub details: String,
    pub severity: String,
}

impl NewAuditLog {
    pub fn info(actor: Option<&str>, action: &str, entity: &str, details: impl Into<String>) -> Self {
        Self {
            actor: actor.map(str::to_string),
            action: action.to_string(),
            entity: entity.to_string(),
            details: details.into(),
            severity: "info".to_string(),
        }
    }

    pub fn with_severity(mut self, severity: &str) -> Self {
        self.severity = severity.to_string();
        self
    }
}
