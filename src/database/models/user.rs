use chrono::{DateTime, Utc};

// credentials row; never serialized to clients
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub password_salt: String,
    pub verification_token: Option<String>,
    pub email_confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_verified(&self) -> bool {
        self.email_confirmed_at.is_some()
    }
}
