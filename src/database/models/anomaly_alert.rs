use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// produced by an external monitor; this service only lists and resolves them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyAlert {
    pub id: i64,
    pub alert_type: String,
    pub title: String,
    pub description: String,
    pub severity: String,
    pub is_resolved: bool,
    pub created_at: DateTime<Utc>,
}
