//! Guest Session Models
//!
//! 一次入座 = 一个 [`GuestSessionGroup`]，组内每位客人持有一个 [`GuestSession`]。

use serde::{Deserialize, Serialize};

use super::TableView;

/// One seating at a table, shared by every guest who knows the passphrase
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuestSessionGroup {
    pub id: String,
    pub table_id: String,
    pub passphrase: String,
    pub created_at: i64,
    /// Set when the table is freed; an ended group never comes back
    #[serde(default)]
    pub ended_at: Option<i64>,
}

impl GuestSessionGroup {
    pub fn is_live(&self) -> bool {
        self.ended_at.is_none()
    }
}

/// One guest's token-backed membership in a group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuestSession {
    pub id: String,
    pub table_id: String,
    pub group_id: String,
    pub token: String,
    pub created_at: i64,
    pub expires_at: i64,
    pub valid: bool,
}

impl GuestSession {
    /// Usable while not invalidated and `now < expires_at`
    pub fn is_live_at(&self, now: i64) -> bool {
        self.valid && now < self.expires_at
    }
}

/// Session payload handed to a guest after a scan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionPayload {
    pub session_id: String,
    pub group_id: String,
    pub table_id: String,
    pub token: String,
    pub passphrase: String,
    pub expires_at: i64,
}

impl SessionPayload {
    pub fn new(session: &GuestSession, group: &GuestSessionGroup) -> Self {
        Self {
            session_id: session.id.clone(),
            group_id: group.id.clone(),
            table_id: session.table_id.clone(),
            token: session.token.clone(),
            passphrase: group.passphrase.clone(),
            expires_at: session.expires_at,
        }
    }
}

/// Scan request (`POST /api/scan`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRequest {
    pub salt: String,
    #[serde(default)]
    pub passphrase: Option<String>,
}

/// Result of resolving a scanned table code
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// Caller already holds a live session on this table
    Resumed { session: SessionPayload },
    /// First guest at the table: new group + session
    Started { session: SessionPayload },
    /// Joined an existing group with the right passphrase
    Joined { session: SessionPayload },
    /// Table is seated; ask the guest for the group passphrase
    PassphraseRequired { table: TableView },
    /// Staff scan marked the table occupied
    StaffOverride { table: TableView },
}

impl ScanOutcome {
    pub fn session(&self) -> Option<&SessionPayload> {
        match self {
            ScanOutcome::Resumed { session }
            | ScanOutcome::Started { session }
            | ScanOutcome::Joined { session } => Some(session),
            ScanOutcome::PassphraseRequired { .. } | ScanOutcome::StaffOverride { .. } => None,
        }
    }
}
