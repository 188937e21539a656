//! redb-based storage for places, menus, tables, guest sessions and orders
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `places` | `place_id` | `Place` | Venues (read-only here) |
//! | `menu_items` | `menu_item_id` | `MenuItem` | Live menu (read-only here) |
//! | `dining_tables` | `table_id` | `DiningTable` | Tables + occupancy |
//! | `table_salts` | `salt` | `table_id` | QR secret index |
//! | `session_groups` | `group_id` | `GuestSessionGroup` | Seatings |
//! | `guest_sessions` | `session_id` | `GuestSession` | Guest tokens |
//! | `table_sessions` | `(table_id, session_id)` | `group_id` | Valid sessions per table |
//! | `orders` | `order_id` | `Order` | Order headers |
//! | `order_items` | `(order_id, line_no)` | `OrderItem` | Order lines |
//!
//! Values are JSON-serialized. Every state-changing operation of the
//! service runs its read-check-write inside one [`WriteTransaction`]; redb
//! admits a single writer at a time, so those operations are serialized and
//! an uncommitted transaction leaves no trace.

use redb::{
    Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::error::AppError;
use shared::models::{
    DiningTable, GuestSession, GuestSessionGroup, MenuItem, Order, OrderItem, Place,
};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

type JsonTable = TableDefinition<'static, &'static str, &'static [u8]>;

const PLACES_TABLE: JsonTable = TableDefinition::new("places");
const MENU_ITEMS_TABLE: JsonTable = TableDefinition::new("menu_items");
const DINING_TABLES_TABLE: JsonTable = TableDefinition::new("dining_tables");
const SESSION_GROUPS_TABLE: JsonTable = TableDefinition::new("session_groups");
const GUEST_SESSIONS_TABLE: JsonTable = TableDefinition::new("guest_sessions");
const ORDERS_TABLE: JsonTable = TableDefinition::new("orders");

/// salt -> table_id
const TABLE_SALTS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("table_salts");

/// (table_id, session_id) -> group_id, only while the session is valid
const TABLE_SESSIONS_TABLE: TableDefinition<(&str, &str), &str> =
    TableDefinition::new("table_sessions");

/// (order_id, line_no) -> JSON-serialized OrderItem
const ORDER_ITEMS_TABLE: TableDefinition<(&str, u32), &[u8]> = TableDefinition::new("order_items");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        tracing::error!(error = %err, "Storage error occurred");
        AppError::database(err.to_string())
    }
}

fn get_json<T: DeserializeOwned>(
    table: &impl ReadableTable<&'static str, &'static [u8]>,
    key: &str,
) -> StorageResult<Option<T>> {
    match table.get(key)? {
        Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
        None => Ok(None),
    }
}

fn collect_json<T: DeserializeOwned>(
    table: &impl ReadableTable<&'static str, &'static [u8]>,
) -> StorageResult<Vec<T>> {
    let mut out = Vec::new();
    for result in table.iter()? {
        let (_key, value) = result?;
        out.push(serde_json::from_slice(value.value())?);
    }
    Ok(out)
}

/// Point-of-sale storage backed by redb
#[derive(Clone)]
pub struct PosStorage {
    db: Arc<Database>,
}

impl std::fmt::Debug for PosStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PosStorage").finish_non_exhaustive()
    }
}

impl PosStorage {
    /// Open or create the database at the given path
    ///
    /// redb commits with `Durability::Immediate` by default: once `commit()`
    /// returns the data survives a power loss.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests, ephemeral runs)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        // Create all tables so read transactions never hit a missing table
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(PLACES_TABLE)?;
            let _ = write_txn.open_table(MENU_ITEMS_TABLE)?;
            let _ = write_txn.open_table(DINING_TABLES_TABLE)?;
            let _ = write_txn.open_table(TABLE_SALTS_TABLE)?;
            let _ = write_txn.open_table(SESSION_GROUPS_TABLE)?;
            let _ = write_txn.open_table(GUEST_SESSIONS_TABLE)?;
            let _ = write_txn.open_table(TABLE_SESSIONS_TABLE)?;
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(ORDER_ITEMS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    /// Commit a write transaction
    pub fn commit(&self, txn: WriteTransaction) -> StorageResult<()> {
        txn.commit()?;
        Ok(())
    }

    fn put_json<T: Serialize>(
        &self,
        txn: &WriteTransaction,
        definition: JsonTable,
        key: &str,
        value: &T,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(definition)?;
        let bytes = serde_json::to_vec(value)?;
        table.insert(key, bytes.as_slice())?;
        Ok(())
    }

    fn read_one<T: DeserializeOwned>(&self, definition: JsonTable, key: &str) -> StorageResult<Option<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(definition)?;
        get_json(&table, key)
    }

    fn read_one_txn<T: DeserializeOwned>(
        &self,
        txn: &WriteTransaction,
        definition: JsonTable,
        key: &str,
    ) -> StorageResult<Option<T>> {
        let table = txn.open_table(definition)?;
        get_json(&table, key)
    }

    fn read_all<T: DeserializeOwned>(&self, definition: JsonTable) -> StorageResult<Vec<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(definition)?;
        collect_json(&table)
    }

    fn read_all_txn<T: DeserializeOwned>(
        &self,
        txn: &WriteTransaction,
        definition: JsonTable,
    ) -> StorageResult<Vec<T>> {
        let table = txn.open_table(definition)?;
        collect_json(&table)
    }

    // ========== Places & Menu ==========

    /// Insert or replace a place (seed / admin import)
    pub fn upsert_place(&self, place: &Place) -> StorageResult<()> {
        let txn = self.begin_write()?;
        self.put_json(&txn, PLACES_TABLE, &place.id, place)?;
        txn.commit()?;
        Ok(())
    }

    pub fn get_place(&self, place_id: &str) -> StorageResult<Option<Place>> {
        self.read_one(PLACES_TABLE, place_id)
    }

    pub fn get_place_txn(&self, txn: &WriteTransaction, place_id: &str) -> StorageResult<Option<Place>> {
        self.read_one_txn(txn, PLACES_TABLE, place_id)
    }

    /// Insert or replace a menu item (seed / admin import)
    pub fn upsert_menu_item(&self, item: &MenuItem) -> StorageResult<()> {
        let txn = self.begin_write()?;
        self.put_json(&txn, MENU_ITEMS_TABLE, &item.id, item)?;
        txn.commit()?;
        Ok(())
    }

    pub fn get_menu_item_txn(
        &self,
        txn: &WriteTransaction,
        menu_item_id: &str,
    ) -> StorageResult<Option<MenuItem>> {
        self.read_one_txn(txn, MENU_ITEMS_TABLE, menu_item_id)
    }

    // ========== Dining Tables ==========

    /// Insert or replace a table and keep the salt index in step
    pub fn upsert_table(&self, table: &DiningTable) -> StorageResult<()> {
        let txn = self.begin_write()?;
        if let Some(previous) = self.get_table_txn(&txn, &table.id)?
            && previous.salt != table.salt
        {
            let mut salts = txn.open_table(TABLE_SALTS_TABLE)?;
            salts.remove(previous.salt.as_str())?;
        }
        self.put_table(&txn, table)?;
        {
            let mut salts = txn.open_table(TABLE_SALTS_TABLE)?;
            salts.insert(table.salt.as_str(), table.id.as_str())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Store a table (within transaction). The salt index is not touched.
    pub fn put_table(&self, txn: &WriteTransaction, table: &DiningTable) -> StorageResult<()> {
        self.put_json(txn, DINING_TABLES_TABLE, &table.id, table)
    }

    pub fn get_table(&self, table_id: &str) -> StorageResult<Option<DiningTable>> {
        self.read_one(DINING_TABLES_TABLE, table_id)
    }

    pub fn get_table_txn(
        &self,
        txn: &WriteTransaction,
        table_id: &str,
    ) -> StorageResult<Option<DiningTable>> {
        self.read_one_txn(txn, DINING_TABLES_TABLE, table_id)
    }

    /// Look up a table by its QR secret (within transaction)
    pub fn find_table_by_salt_txn(
        &self,
        txn: &WriteTransaction,
        salt: &str,
    ) -> StorageResult<Option<DiningTable>> {
        let table_id = {
            let salts = txn.open_table(TABLE_SALTS_TABLE)?;
            let id = salts.get(salt)?.map(|guard| guard.value().to_string());
            id
        };
        match table_id {
            Some(id) => self.get_table_txn(txn, &id),
            None => Ok(None),
        }
    }

    /// Swap a table's salt, removing the old index entry
    pub fn replace_salt_txn(
        &self,
        txn: &WriteTransaction,
        table: &DiningTable,
        old_salt: &str,
    ) -> StorageResult<()> {
        {
            let mut salts = txn.open_table(TABLE_SALTS_TABLE)?;
            salts.remove(old_salt)?;
            salts.insert(table.salt.as_str(), table.id.as_str())?;
        }
        self.put_table(txn, table)
    }

    /// All non-deleted tables of a place, sorted by name
    pub fn list_tables_for_place(&self, place_id: &str) -> StorageResult<Vec<DiningTable>> {
        let mut tables: Vec<DiningTable> = self
            .read_all::<DiningTable>(DINING_TABLES_TABLE)?
            .into_iter()
            .filter(|t| t.place_id == place_id && !t.is_deleted())
            .collect();
        tables.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tables)
    }

    // ========== Guest Session Groups ==========

    pub fn put_group(&self, txn: &WriteTransaction, group: &GuestSessionGroup) -> StorageResult<()> {
        self.put_json(txn, SESSION_GROUPS_TABLE, &group.id, group)
    }

    pub fn get_group(&self, group_id: &str) -> StorageResult<Option<GuestSessionGroup>> {
        self.read_one(SESSION_GROUPS_TABLE, group_id)
    }

    pub fn get_group_txn(
        &self,
        txn: &WriteTransaction,
        group_id: &str,
    ) -> StorageResult<Option<GuestSessionGroup>> {
        self.read_one_txn(txn, SESSION_GROUPS_TABLE, group_id)
    }

    // ========== Guest Sessions ==========

    /// Store a session and keep the per-table index in step:
    /// invalidated sessions leave the index.
    pub fn put_session(&self, txn: &WriteTransaction, session: &GuestSession) -> StorageResult<()> {
        self.put_json(txn, GUEST_SESSIONS_TABLE, &session.id, session)?;
        let mut index = txn.open_table(TABLE_SESSIONS_TABLE)?;
        let key = (session.table_id.as_str(), session.id.as_str());
        if session.valid {
            index.insert(key, session.group_id.as_str())?;
        } else {
            index.remove(key)?;
        }
        Ok(())
    }

    pub fn get_session(&self, session_id: &str) -> StorageResult<Option<GuestSession>> {
        self.read_one(GUEST_SESSIONS_TABLE, session_id)
    }

    pub fn get_session_txn(
        &self,
        txn: &WriteTransaction,
        session_id: &str,
    ) -> StorageResult<Option<GuestSession>> {
        self.read_one_txn(txn, GUEST_SESSIONS_TABLE, session_id)
    }

    /// Sessions of a table still marked valid (within transaction)
    ///
    /// Reads the per-table index, so the cost follows the current seating
    /// and not the venue's history.
    pub fn valid_sessions_for_table_txn(
        &self,
        txn: &WriteTransaction,
        table_id: &str,
    ) -> StorageResult<Vec<GuestSession>> {
        let session_ids = {
            let index = txn.open_table(TABLE_SESSIONS_TABLE)?;
            let mut ids = Vec::new();
            for result in index.range((table_id, "")..)? {
                let (key, _group_id) = result?;
                let (indexed_table, session_id) = key.value();
                if indexed_table != table_id {
                    break;
                }
                ids.push(session_id.to_string());
            }
            ids
        };

        let mut sessions = Vec::with_capacity(session_ids.len());
        for session_id in session_ids {
            if let Some(session) = self.get_session_txn(txn, &session_id)? {
                sessions.push(session);
            }
        }
        Ok(sessions)
    }

    // ========== Orders ==========

    pub fn put_order(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        self.put_json(txn, ORDERS_TABLE, &order.id, order)
    }

    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<Order>> {
        self.read_one(ORDERS_TABLE, order_id)
    }

    pub fn get_order_txn(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<Option<Order>> {
        self.read_one_txn(txn, ORDERS_TABLE, order_id)
    }

    /// Orders placed at a table, oldest first
    pub fn list_orders_for_table(&self, table_id: &str) -> StorageResult<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .read_all::<Order>(ORDERS_TABLE)?
            .into_iter()
            .filter(|o| o.table_id == table_id)
            .collect();
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }

    /// Orders placed at a table (within transaction)
    pub fn orders_for_table_txn(
        &self,
        txn: &WriteTransaction,
        table_id: &str,
    ) -> StorageResult<Vec<Order>> {
        Ok(self
            .read_all_txn::<Order>(txn, ORDERS_TABLE)?
            .into_iter()
            .filter(|o| o.table_id == table_id)
            .collect())
    }

    /// Remove an order header (items are removed separately)
    pub fn remove_order_txn(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        table.remove(order_id)?;
        Ok(())
    }

    // ========== Order Items ==========

    /// Get the lines of an order, ordered by line number
    pub fn get_order_items(&self, order_id: &str) -> StorageResult<Vec<OrderItem>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDER_ITEMS_TABLE)?;

        let mut items = Vec::new();
        let range_start = (order_id, 0u32);
        let range_end = (order_id, u32::MAX);

        for result in table.range(range_start..=range_end)? {
            let (_key, value) = result?;
            let item: OrderItem = serde_json::from_slice(value.value())?;
            items.push(item);
        }

        items.sort_by_key(|i| i.line_no);
        Ok(items)
    }

    /// Replace every line of an order (within transaction)
    pub fn replace_order_items_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
        items: &[OrderItem],
    ) -> StorageResult<()> {
        self.remove_order_items_txn(txn, order_id)?;
        let mut table = txn.open_table(ORDER_ITEMS_TABLE)?;
        for item in items {
            let value = serde_json::to_vec(item)?;
            table.insert((order_id, item.line_no), value.as_slice())?;
        }
        Ok(())
    }

    /// Remove every line of an order (within transaction)
    pub fn remove_order_items_txn(&self, txn: &WriteTransaction, order_id: &str) -> StorageResult<()> {
        let mut table = txn.open_table(ORDER_ITEMS_TABLE)?;

        let range_start = (order_id, 0u32);
        let range_end = (order_id, u32::MAX);

        // Collect first; the range borrows the table
        let mut line_numbers = Vec::new();
        for result in table.range(range_start..=range_end)? {
            let (key, _value) = result?;
            line_numbers.push(key.value().1);
        }

        for line_no in line_numbers {
            table.remove((order_id, line_no))?;
        }
        Ok(())
    }
}
