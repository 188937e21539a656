//! Guest Session Manager
//!
//! Creates, looks up and ends guest sessions and their groups. The `_txn`
//! methods run inside the caller's write transaction so the table controller
//! can combine them with its own table update in one atomic unit.

use std::sync::Arc;

use chrono::Utc;
use redb::WriteTransaction;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{DiningTable, GuestSession, GuestSessionGroup, SessionPayload};
use shared::util::{new_id, now_millis};

use super::passphrase::{generate_passphrase, passphrase_matches};
use crate::auth::{GuestContext, JwtService};
use crate::db::PosStorage;

#[derive(Debug, Clone)]
pub struct GuestSessionManager {
    storage: PosStorage,
    jwt_service: Arc<JwtService>,
    passphrase_length: usize,
}

impl GuestSessionManager {
    pub fn new(storage: PosStorage, jwt_service: Arc<JwtService>, passphrase_length: usize) -> Self {
        Self {
            storage,
            jwt_service,
            passphrase_length,
        }
    }

    /// The table's live group, if any
    pub fn live_group_txn(
        &self,
        txn: &WriteTransaction,
        table: &DiningTable,
    ) -> AppResult<Option<GuestSessionGroup>> {
        let Some(group_id) = table.current_group_id.as_deref() else {
            return Ok(None);
        };
        Ok(self
            .storage
            .get_group_txn(txn, group_id)?
            .filter(|g| g.is_live() && g.table_id == table.id))
    }

    /// Create a session for `table`
    ///
    /// Joins the live group when `passphrase` matches it; otherwise starts a
    /// new group with a fresh passphrase. The caller records the group on
    /// the table.
    pub fn create_session_txn(
        &self,
        txn: &WriteTransaction,
        table: &DiningTable,
        passphrase: Option<&str>,
    ) -> AppResult<(GuestSession, GuestSessionGroup)> {
        let group = match self.live_group_txn(txn, table)? {
            Some(group) if passphrase.is_some_and(|p| passphrase_matches(&group.passphrase, p)) => {
                group
            }
            _ => self.start_group_txn(txn, &table.id)?,
        };

        let now = Utc::now();
        let expires_at = now + self.jwt_service.config.guest_ttl();
        let session_id = new_id();
        let token = self
            .jwt_service
            .issue_guest_token(&table.id, &session_id, &group.id, expires_at)
            .map_err(|e| AppError::internal(format!("Failed to issue guest token: {}", e)))?;

        let session = GuestSession {
            id: session_id,
            table_id: table.id.clone(),
            group_id: group.id.clone(),
            token,
            created_at: now.timestamp_millis(),
            expires_at: expires_at.timestamp_millis(),
            valid: true,
        };
        self.storage.put_session(txn, &session)?;

        tracing::info!(
            table_id = %table.id,
            group_id = %group.id,
            session_id = %session.id,
            "Guest session created"
        );
        Ok((session, group))
    }

    fn start_group_txn(&self, txn: &WriteTransaction, table_id: &str) -> AppResult<GuestSessionGroup> {
        let group = GuestSessionGroup {
            id: new_id(),
            table_id: table_id.to_string(),
            passphrase: generate_passphrase(self.passphrase_length),
            created_at: now_millis(),
            ended_at: None,
        };
        self.storage.put_group(txn, &group)?;
        tracing::debug!(table_id = %table_id, group_id = %group.id, "Guest group started");
        Ok(group)
    }

    /// The guest's own session, if it is live and still carries `guest.token`
    fn own_live_session_txn(
        &self,
        txn: &WriteTransaction,
        guest: &GuestContext,
    ) -> AppResult<Option<GuestSession>> {
        let now = now_millis();
        Ok(self
            .storage
            .get_session_txn(txn, &guest.session_id)?
            .filter(|s| s.token == guest.token && s.is_live_at(now)))
    }

    /// Live session on `table_id` held by `guest`
    pub fn active_session_txn(
        &self,
        txn: &WriteTransaction,
        table_id: &str,
        guest: &GuestContext,
    ) -> AppResult<Option<GuestSession>> {
        Ok(self
            .own_live_session_txn(txn, guest)?
            .filter(|s| s.table_id == table_id))
    }

    pub fn has_active_session_txn(
        &self,
        txn: &WriteTransaction,
        table_id: &str,
        guest: &GuestContext,
    ) -> AppResult<bool> {
        Ok(self.active_session_txn(txn, table_id, guest)?.is_some())
    }

    /// True when `guest` holds a live session on a table other than `table_id`
    pub fn is_conflicting_txn(
        &self,
        txn: &WriteTransaction,
        guest: &GuestContext,
        table_id: &str,
    ) -> AppResult<bool> {
        Ok(self
            .own_live_session_txn(txn, guest)?
            .is_some_and(|s| s.table_id != table_id))
    }

    /// End the table's group: mark it ended and invalidate every valid
    /// session of the table. Idempotent; returns the number of sessions
    /// invalidated.
    pub fn end_group_session_txn(&self, txn: &WriteTransaction, table: &DiningTable) -> AppResult<usize> {
        let now = now_millis();

        if let Some(group_id) = table.current_group_id.as_deref()
            && let Some(mut group) = self.storage.get_group_txn(txn, group_id)?
            && group.is_live()
        {
            group.ended_at = Some(now);
            self.storage.put_group(txn, &group)?;
        }

        let mut invalidated = 0;
        for mut session in self.storage.valid_sessions_for_table_txn(txn, &table.id)? {
            session.valid = false;
            self.storage.put_session(txn, &session)?;
            invalidated += 1;
        }

        if invalidated > 0 {
            tracing::info!(table_id = %table.id, invalidated, "Guest group ended");
        }
        Ok(invalidated)
    }

    /// The guest's session, provided it is still live
    pub fn require_live_session_txn(
        &self,
        txn: &WriteTransaction,
        guest: &GuestContext,
    ) -> AppResult<GuestSession> {
        check_live(self.storage.get_session_txn(txn, &guest.session_id)?, guest)
    }

    /// Read-only variant of [`Self::require_live_session_txn`]
    pub fn require_live_session(&self, guest: &GuestContext) -> AppResult<GuestSession> {
        check_live(self.storage.get_session(&guest.session_id)?, guest)
    }

    /// Session and group passphrase for a guest token
    pub fn current_session(&self, guest: &GuestContext) -> AppResult<SessionPayload> {
        let session = self.require_live_session(guest)?;
        let group = self
            .storage
            .get_group(&session.group_id)?
            .filter(|g| g.is_live())
            .ok_or_else(AppError::session_expired)?;
        Ok(SessionPayload::new(&session, &group))
    }

    /// Group of a session (within transaction)
    pub fn group_txn(&self, txn: &WriteTransaction, group_id: &str) -> AppResult<GuestSessionGroup> {
        self.storage
            .get_group_txn(txn, group_id)?
            .ok_or_else(|| AppError::new(ErrorCode::SessionNotFound))
    }
}

fn check_live(session: Option<GuestSession>, guest: &GuestContext) -> AppResult<GuestSession> {
    let session = session
        .filter(|s| s.token == guest.token)
        .ok_or_else(|| AppError::new(ErrorCode::SessionNotFound))?;
    if !session.is_live_at(now_millis()) {
        return Err(AppError::session_expired());
    }
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtConfig;
    use shared::models::TableStatus;

    fn setup(ttl_minutes: i64) -> (PosStorage, GuestSessionManager) {
        let storage = PosStorage::open_in_memory().unwrap();
        let mut config = JwtConfig::with_secret("test-secret-test-secret-test-secret-0123");
        config.guest_expiration_minutes = ttl_minutes;
        let manager = GuestSessionManager::new(storage.clone(), Arc::new(JwtService::with_config(config)), 6);
        (storage, manager)
    }

    fn table(id: &str) -> DiningTable {
        DiningTable {
            id: id.to_string(),
            place_id: "place-1".to_string(),
            name: id.to_string(),
            seats: 2,
            salt: format!("salt-{id}"),
            status: TableStatus::Empty,
            disabled: false,
            current_group_id: None,
            deleted_at: None,
        }
    }

    fn guest_of(session: &GuestSession) -> GuestContext {
        GuestContext {
            session_id: session.id.clone(),
            table_id: session.table_id.clone(),
            group_id: session.group_id.clone(),
            token: session.token.clone(),
        }
    }

    #[test]
    fn test_first_session_starts_group() {
        let (storage, manager) = setup(30);
        let mut t1 = table("t-1");

        let txn = storage.begin_write().unwrap();
        let (s1, g1) = manager.create_session_txn(&txn, &t1, None).unwrap();
        t1.current_group_id = Some(g1.id.clone());

        assert_eq!(g1.passphrase.len(), 6);
        assert_eq!(s1.group_id, g1.id);
        assert!(manager.has_active_session_txn(&txn, "t-1", &guest_of(&s1)).unwrap());

        // Correct passphrase joins; wrong one starts a separate group
        let (s2, g2) = manager
            .create_session_txn(&txn, &t1, Some(&g1.passphrase.to_lowercase()))
            .unwrap();
        assert_eq!(g2.id, g1.id);
        assert_ne!(s2.id, s1.id);
        let (_, g3) = manager.create_session_txn(&txn, &t1, Some("WRONG!")).unwrap();
        assert_ne!(g3.id, g1.id);
    }

    #[test]
    fn test_conflict_spans_tables() {
        let (storage, manager) = setup(30);
        let txn = storage.begin_write().unwrap();
        let (s1, _) = manager.create_session_txn(&txn, &table("t-1"), None).unwrap();

        assert!(manager.is_conflicting_txn(&txn, &guest_of(&s1), "t-2").unwrap());
        assert!(!manager.is_conflicting_txn(&txn, &guest_of(&s1), "t-1").unwrap());

        let mut forged = guest_of(&s1);
        forged.token = "other-token".into();
        assert!(!manager.is_conflicting_txn(&txn, &forged, "t-2").unwrap());
        assert!(manager.active_session_txn(&txn, "t-1", &forged).unwrap().is_none());
    }

    #[test]
    fn test_end_group_invalidates_all_sessions() {
        let (storage, manager) = setup(30);
        let mut t1 = table("t-1");

        let txn = storage.begin_write().unwrap();
        let (s1, g1) = manager.create_session_txn(&txn, &t1, None).unwrap();
        t1.current_group_id = Some(g1.id.clone());
        let (s2, _) = manager
            .create_session_txn(&txn, &t1, Some(&g1.passphrase))
            .unwrap();

        assert_eq!(manager.end_group_session_txn(&txn, &t1).unwrap(), 2);
        assert!(!manager.has_active_session_txn(&txn, "t-1", &guest_of(&s1)).unwrap());
        assert!(!manager.has_active_session_txn(&txn, "t-1", &guest_of(&s2)).unwrap());
        assert!(manager.live_group_txn(&txn, &t1).unwrap().is_none());

        // Idempotent; other tables keep their sessions
        let (s3, _) = manager.create_session_txn(&txn, &table("t-2"), None).unwrap();
        assert_eq!(manager.end_group_session_txn(&txn, &t1).unwrap(), 0);
        assert!(manager.has_active_session_txn(&txn, "t-2", &guest_of(&s3)).unwrap());
        txn.commit().unwrap();

        let err = manager.require_live_session(&guest_of(&s1)).unwrap_err();
        assert_eq!(err.code, ErrorCode::SessionExpired);
    }

    #[test]
    fn test_expired_session_is_not_live() {
        let (storage, manager) = setup(0);
        let txn = storage.begin_write().unwrap();
        let (s1, _) = manager.create_session_txn(&txn, &table("t-1"), None).unwrap();

        assert!(!manager.has_active_session_txn(&txn, "t-1", &guest_of(&s1)).unwrap());
        assert!(!manager.is_conflicting_txn(&txn, &guest_of(&s1), "t-2").unwrap());
    }

    #[test]
    fn test_current_session_returns_passphrase() {
        let (storage, manager) = setup(30);
        let txn = storage.begin_write().unwrap();
        let (s1, g1) = manager.create_session_txn(&txn, &table("t-1"), None).unwrap();
        txn.commit().unwrap();

        let payload = manager.current_session(&guest_of(&s1)).unwrap();
        assert_eq!(payload.passphrase, g1.passphrase);
        assert_eq!(payload.session_id, s1.id);

        let mut forged = guest_of(&s1);
        forged.token = "not-the-token".into();
        assert_eq!(
            manager.current_session(&forged).unwrap_err().code,
            ErrorCode::SessionNotFound
        );
    }
}
