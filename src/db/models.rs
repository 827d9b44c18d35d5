use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub struct DbAdministrator {
    pub id: i64,
    pub username: String,
    pub credential_hash: String,
    pub is_seed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Row to insert. The hash must already be derived; plaintext never reaches storage.
#[derive(Debug, Clone)]
pub struct NewAdministrator {
    pub username: String,
    pub credential_hash: String,
    pub is_seed: bool,
    pub created_at: DateTime<Utc>,
}
