//! Table State Controller
//!
//! Owns the occupancy state machine of a table:
//!
//! ```text
//!            guest scan (new group) / staff scan / staff
//!   empty ────────────────────────────────────────────▶ occupied
//!     ▲                                                    │
//!     └──────────── ApplyEmptyStatus (guest / staff) ◀─────┘
//!   reserved: set by staff, freed or seated like an empty table
//! ```
//!
//! Every operation reads, checks and writes inside one redb write
//! transaction. Notifications are pushed only after the commit.

use std::sync::Arc;

use redb::WriteTransaction;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::message::{NotificationType, TableNotification};
use shared::models::{
    DiningTable, OrderStatus, ScanOutcome, SessionPayload, TableStatus, TableView,
};
use shared::util::now_millis;

use crate::auth::{Caller, GuestContext, StaffContext};
use crate::db::PosStorage;
use crate::notifications::NotificationSink;
use crate::security_log;
use crate::sessions::{GuestSessionManager, passphrase_matches};

/// What a free (ApplyEmptyStatus) reconciled
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EmptySummary {
    pub sessions_invalidated: usize,
    pub orders_closed: usize,
}

#[derive(Debug, Clone)]
pub struct TableController {
    storage: PosStorage,
    sessions: GuestSessionManager,
    notifier: Arc<dyn NotificationSink>,
}

impl TableController {
    pub fn new(
        storage: PosStorage,
        sessions: GuestSessionManager,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            storage,
            sessions,
            notifier,
        }
    }

    // ========== Resolve ==========

    /// Resolve a scanned table code
    pub fn resolve(
        &self,
        salt: &str,
        passphrase: Option<&str>,
        caller: &Caller,
    ) -> AppResult<ScanOutcome> {
        let txn = self.storage.begin_write()?;
        let table = self.table_by_salt_txn(&txn, salt)?;

        match caller {
            Caller::Staff(staff) => self.staff_scan(txn, table, staff),
            Caller::Guest(guest) => self.guest_scan(txn, table, passphrase, Some(guest)),
            Caller::Anonymous => self.guest_scan(txn, table, passphrase, None),
        }
    }

    fn staff_scan(
        &self,
        txn: WriteTransaction,
        mut table: DiningTable,
        staff: &StaffContext,
    ) -> AppResult<ScanOutcome> {
        self.authorize_staff_txn(&txn, staff, &table)?;

        if table.status != TableStatus::Occupied {
            let from = table.status;
            table.status = TableStatus::Occupied;
            self.storage.put_table(&txn, &table)?;
            self.storage.commit(txn)?;
            tracing::info!(
                table_id = %table.id,
                staff_id = %staff.staff_id,
                from = %from,
                to = %table.status,
                "Staff scan opened table"
            );
        }

        Ok(ScanOutcome::StaffOverride {
            table: TableView::from(&table),
        })
    }

    fn guest_scan(
        &self,
        txn: WriteTransaction,
        mut table: DiningTable,
        passphrase: Option<&str>,
        guest: Option<&GuestContext>,
    ) -> AppResult<ScanOutcome> {
        if table.disabled {
            drop(txn);
            security_log!("WARN", "disabled_table_scan", table_id = table.id.as_str());
            self.notifier.push(TableNotification::new(
                &table.id,
                &table.place_id,
                NotificationType::StaffNeeded,
                format!("Guest needs assistance at table {}", table.name),
            ));
            return Err(AppError::new(ErrorCode::TableDisabled));
        }

        if let Some(guest) = guest {
            if let Some(session) = self.sessions.active_session_txn(&txn, &table.id, guest)? {
                let group = self.sessions.group_txn(&txn, &session.group_id)?;
                tracing::debug!(table_id = %table.id, session_id = %session.id, "Guest session resumed");
                return Ok(ScanOutcome::Resumed {
                    session: SessionPayload::new(&session, &group),
                });
            }
            if self.sessions.is_conflicting_txn(&txn, guest, &table.id)? {
                security_log!(
                    "WARN",
                    "session_conflict",
                    table_id = table.id.as_str(),
                    session_id = guest.session_id.as_str()
                );
                return Err(AppError::with_message(
                    ErrorCode::SessionConflict,
                    "A live session already exists at another table",
                ));
            }
        }

        match self.sessions.live_group_txn(&txn, &table)? {
            None => {
                // Empty, reserved, or occupied by staff without guests
                self.sessions.end_group_session_txn(&txn, &table)?;
                let (session, group) = self.sessions.create_session_txn(&txn, &table, None)?;
                let from = table.status;
                table.status = TableStatus::Occupied;
                table.current_group_id = Some(group.id.clone());
                self.storage.put_table(&txn, &table)?;
                self.storage.commit(txn)?;

                tracing::info!(
                    table_id = %table.id,
                    group_id = %group.id,
                    from = %from,
                    to = %table.status,
                    "Guest seated at table"
                );
                self.push(&table, NotificationType::GuestJoinedTable, "Guests seated");
                Ok(ScanOutcome::Started {
                    session: SessionPayload::new(&session, &group),
                })
            }
            Some(group) => {
                let Some(presented) = passphrase else {
                    return Ok(ScanOutcome::PassphraseRequired {
                        table: TableView::from(&table),
                    });
                };
                if !passphrase_matches(&group.passphrase, presented) {
                    security_log!("WARN", "passphrase_rejected", table_id = table.id.as_str());
                    return Err(AppError::new(ErrorCode::PassphraseInvalid));
                }

                let (session, group) = self.sessions.create_session_txn(&txn, &table, Some(presented))?;
                if table.status != TableStatus::Occupied {
                    table.status = TableStatus::Occupied;
                    self.storage.put_table(&txn, &table)?;
                }
                self.storage.commit(txn)?;

                tracing::info!(
                    table_id = %table.id,
                    group_id = %group.id,
                    session_id = %session.id,
                    "Guest joined table"
                );
                self.push(&table, NotificationType::GuestJoinedTable, "Guest joined");
                Ok(ScanOutcome::Joined {
                    session: SessionPayload::new(&session, &group),
                })
            }
        }
    }

    // ========== ChangeStatus ==========

    /// Change the status of the table behind `salt`
    pub fn change_status(&self, salt: &str, new_status: TableStatus, caller: &Caller) -> AppResult<()> {
        let txn = self.storage.begin_write()?;
        let mut table = self.table_by_salt_txn(&txn, salt)?;

        match caller {
            Caller::Anonymous => Err(AppError::permission_denied(
                "A guest session or staff token is required",
            )),
            Caller::Guest(guest) => {
                if new_status != TableStatus::Empty {
                    security_log!(
                        "WARN",
                        "guest_status_rejected",
                        table_id = table.id.as_str(),
                        requested = new_status.to_string()
                    );
                    return Err(AppError::permission_denied("Guests may only free their table"));
                }
                if table.status == TableStatus::Empty {
                    return Ok(());
                }
                if !self.sessions.has_active_session_txn(&txn, &table.id, guest)? {
                    security_log!("WARN", "guest_free_rejected", table_id = table.id.as_str());
                    return Err(AppError::permission_denied(
                        "No live session at this table",
                    ));
                }
                self.free_table(txn, &mut table)
            }
            Caller::Staff(staff) => {
                self.authorize_staff_txn(&txn, staff, &table)?;

                if new_status == TableStatus::Empty {
                    let has_group = self.sessions.live_group_txn(&txn, &table)?.is_some();
                    if table.status == TableStatus::Empty && !has_group {
                        return Ok(());
                    }
                    return self.free_table(txn, &mut table);
                }
                if table.status == new_status {
                    return Ok(());
                }

                let from = table.status;
                table.status = new_status;
                self.storage.put_table(&txn, &table)?;
                self.storage.commit(txn)?;
                tracing::info!(
                    table_id = %table.id,
                    staff_id = %staff.staff_id,
                    from = %from,
                    to = %new_status,
                    "Table status changed"
                );
                Ok(())
            }
        }
    }

    fn free_table(&self, txn: WriteTransaction, table: &mut DiningTable) -> AppResult<()> {
        let summary = self.apply_empty_status_txn(&txn, table)?;
        self.storage.commit(txn)?;

        tracing::info!(
            table_id = %table.id,
            sessions_invalidated = summary.sessions_invalidated,
            orders_closed = summary.orders_closed,
            "Table freed"
        );
        self.notifier.clear(&table.id);
        self.push(table, NotificationType::GuestLeftTable, "Guests left");
        Ok(())
    }

    /// Free a table inside `txn`
    ///
    /// Ends the live group, invalidates its sessions, closes every open
    /// order and marks the table empty. Nothing is visible until the
    /// transaction commits.
    pub(crate) fn apply_empty_status_txn(
        &self,
        txn: &WriteTransaction,
        table: &mut DiningTable,
    ) -> AppResult<EmptySummary> {
        let sessions_invalidated = self.sessions.end_group_session_txn(txn, table)?;

        let now = now_millis();
        let mut orders_closed = 0;
        for mut order in self.storage.orders_for_table_txn(txn, &table.id)? {
            if order.status.is_open() {
                order.status = OrderStatus::Closed;
                order.updated_at = now;
                self.storage.put_order(txn, &order)?;
                orders_closed += 1;
            }
        }

        table.status = TableStatus::Empty;
        table.current_group_id = None;
        self.storage.put_table(txn, table)?;

        Ok(EmptySummary {
            sessions_invalidated,
            orders_closed,
        })
    }

    // ========== Staff management ==========

    /// Replace the table's secret; the old code stops resolving at once
    pub fn rotate_salt(&self, table_id: &str, staff: &StaffContext) -> AppResult<String> {
        let txn = self.storage.begin_write()?;
        let mut table = self.table_by_id_txn(&txn, table_id)?;
        self.authorize_staff_txn(&txn, staff, &table)?;

        let old_salt = std::mem::replace(&mut table.salt, generate_salt()?);
        self.storage.replace_salt_txn(&txn, &table, &old_salt)?;
        self.storage.commit(txn)?;

        tracing::info!(table_id = %table.id, staff_id = %staff.staff_id, "Table salt rotated");
        Ok(table.salt)
    }

    pub fn set_disabled(&self, table_id: &str, disabled: bool, staff: &StaffContext) -> AppResult<TableView> {
        let txn = self.storage.begin_write()?;
        let mut table = self.table_by_id_txn(&txn, table_id)?;
        self.authorize_staff_txn(&txn, staff, &table)?;

        if table.disabled != disabled {
            table.disabled = disabled;
            self.storage.put_table(&txn, &table)?;
            self.storage.commit(txn)?;
            tracing::info!(table_id = %table.id, disabled, "Table availability changed");
        }
        Ok(TableView::from(&table))
    }

    /// Tables of the staff member's own place
    pub fn list_place_tables(&self, staff: &StaffContext) -> AppResult<Vec<TableView>> {
        Ok(self
            .storage
            .list_tables_for_place(&staff.place_id)?
            .iter()
            .map(TableView::from)
            .collect())
    }

    /// A table the staff member may act on (read-only)
    pub fn staff_table(&self, table_id: &str, staff: &StaffContext) -> AppResult<DiningTable> {
        let table = self
            .storage
            .get_table(table_id)?
            .filter(|t| !t.is_deleted())
            .ok_or_else(AppError::table_not_found)?;
        let place = self.storage.get_place(&table.place_id)?;
        staff.authorize(&table.place_id, place.as_ref())?;
        Ok(table)
    }

    // ========== helpers ==========

    fn table_by_salt_txn(&self, txn: &WriteTransaction, salt: &str) -> AppResult<DiningTable> {
        self.storage
            .find_table_by_salt_txn(txn, salt)?
            .filter(|t| !t.is_deleted())
            .ok_or_else(AppError::table_not_found)
    }

    fn table_by_id_txn(&self, txn: &WriteTransaction, table_id: &str) -> AppResult<DiningTable> {
        self.storage
            .get_table_txn(txn, table_id)?
            .filter(|t| !t.is_deleted())
            .ok_or_else(AppError::table_not_found)
    }

    fn authorize_staff_txn(
        &self,
        txn: &WriteTransaction,
        staff: &StaffContext,
        table: &DiningTable,
    ) -> AppResult<()> {
        let place = self.storage.get_place_txn(txn, &table.place_id)?;
        staff.authorize(&table.place_id, place.as_ref())
    }

    fn push(&self, table: &DiningTable, kind: NotificationType, message: &str) {
        self.notifier.push(TableNotification::new(
            &table.id,
            &table.place_id,
            kind,
            format!("{}: {}", table.name, message),
        ));
    }
}

/// Hex of 16 random bytes
fn generate_salt() -> AppResult<String> {
    use ring::rand::{SecureRandom, SystemRandom};

    let mut bytes = [0u8; 16];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::internal("Failed to generate table salt"))?;
    Ok(hex::encode(bytes))
}
