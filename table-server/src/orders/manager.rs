//! Order Lifecycle Manager
//!
//! Creates, edits, moves and deletes orders. Each mutation re-checks the
//! table and the caller's session inside the same write transaction that
//! stores the order, so an order row is never committed without its lines.

use std::sync::Arc;

use redb::WriteTransaction;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::message::{NotificationType, TableNotification};
use shared::models::{
    DiningTable, Order, OrderDetail, OrderDraft, OrderItem, OrderLineInput, OrderStatus,
    OrderStatusChange, TableStatus,
};
use shared::util::{new_id, now_millis};

use super::money;
use super::transitions::{check_guest_transition, check_staff_transition};
use crate::auth::{Caller, GuestContext, StaffContext};
use crate::db::PosStorage;
use crate::notifications::NotificationSink;
use crate::security_log;
use crate::sessions::GuestSessionManager;

#[derive(Debug, Clone)]
pub struct OrderManager {
    storage: PosStorage,
    sessions: GuestSessionManager,
    notifier: Arc<dyn NotificationSink>,
}

impl OrderManager {
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

    // ========== Add / Update ==========

    /// Place a new order
    ///
    /// Guests order for the table of their session; staff name the table.
    /// Any client-supplied total is ignored.
    pub fn add(&self, draft: OrderDraft, caller: &Caller) -> AppResult<OrderDetail> {
        let txn = self.storage.begin_write()?;

        let (table, guest_session_id) = match caller {
            Caller::Anonymous => return Err(AppError::not_authenticated()),
            Caller::Guest(guest) => {
                let session = self.sessions.require_live_session_txn(&txn, guest)?;
                if draft.table_id.as_deref().is_some_and(|id| id != session.table_id) {
                    return Err(AppError::permission_denied(
                        "Guests may only order for their own table",
                    ));
                }
                (self.table_txn(&txn, &session.table_id)?, Some(session.id))
            }
            Caller::Staff(staff) => {
                let table_id = draft
                    .table_id
                    .as_deref()
                    .ok_or_else(|| AppError::validation("table_id is required"))?;
                let table = self.table_txn(&txn, table_id)?;
                self.authorize_staff_txn(&txn, staff, &table)?;
                (table, None)
            }
        };

        let items = self.price_lines_txn(&txn, &table, &draft.items)?;
        let now = now_millis();
        let order = Order {
            id: new_id(),
            table_id: table.id.clone(),
            place_id: table.place_id.clone(),
            customer_id: draft.customer_id,
            guest_session_id,
            status: OrderStatus::Created,
            total_price: money::order_total(&items),
            payment_method: draft.payment_method,
            note: draft.note,
            modified_by_staff: false,
            created_at: now,
            updated_at: now,
        };

        self.storage.put_order(&txn, &order)?;
        self.storage.replace_order_items_txn(&txn, &order.id, &items)?;
        self.storage.commit(txn)?;

        tracing::info!(
            order_id = %order.id,
            table_id = %order.table_id,
            caller = caller.kind(),
            lines = items.len(),
            total = order.total_price,
            "Order created"
        );
        self.push(&table, NotificationType::OrderCreated, format!("New order at {}", table.name));
        Ok(OrderDetail { order, items })
    }

    /// Replace the contents of an order
    pub fn update(&self, order_id: &str, draft: OrderDraft, caller: &Caller) -> AppResult<OrderDetail> {
        let txn = self.storage.begin_write()?;
        let mut order = self.order_txn(&txn, order_id)?;
        let table = self.table_txn(&txn, &order.table_id)?;

        match caller {
            Caller::Anonymous => return Err(AppError::not_authenticated()),
            Caller::Guest(guest) => {
                self.require_own_order_txn(&txn, guest, &order)?;
                match order.status {
                    OrderStatus::Created if !order.modified_by_staff => {}
                    // Editing a cancelled order submits it again
                    OrderStatus::Cancelled => order.status = OrderStatus::Created,
                    _ => return Err(locked(&order)),
                }
            }
            Caller::Staff(staff) => {
                self.authorize_staff_txn(&txn, staff, &table)?;
                match order.status {
                    OrderStatus::Created | OrderStatus::Delivered | OrderStatus::PaymentRequested => {
                        order.modified_by_staff = true
                    }
                    _ => return Err(locked(&order)),
                }
            }
        }

        let items = self.price_lines_txn(&txn, &table, &draft.items)?;
        order.total_price = money::order_total(&items);
        if draft.payment_method.is_some() {
            order.payment_method = draft.payment_method;
        }
        if draft.customer_id.is_some() {
            order.customer_id = draft.customer_id;
        }
        order.note = draft.note;
        order.updated_at = now_millis();

        self.storage.put_order(&txn, &order)?;
        self.storage.replace_order_items_txn(&txn, &order.id, &items)?;
        self.storage.commit(txn)?;

        tracing::info!(
            order_id = %order.id,
            table_id = %order.table_id,
            caller = caller.kind(),
            status = %order.status,
            total = order.total_price,
            "Order content updated"
        );
        self.push(
            &table,
            NotificationType::OrderContentUpdated,
            format!("Order changed at {}", table.name),
        );
        Ok(OrderDetail { order, items })
    }

    /// Validate, merge and price the requested lines against the live menu
    ///
    /// Checks run in order: table occupied, at least one line, then every
    /// line. All offending lines are reported together.
    fn price_lines_txn(
        &self,
        txn: &WriteTransaction,
        table: &DiningTable,
        lines: &[OrderLineInput],
    ) -> AppResult<Vec<OrderItem>> {
        if table.status != TableStatus::Occupied {
            return Err(AppError::with_message(
                ErrorCode::TableNotOccupied,
                format!("Table {} is not occupied", table.name),
            ));
        }
        if lines.is_empty() {
            return Err(AppError::new(ErrorCode::OrderEmpty));
        }

        let mut offending: Vec<String> = Vec::new();
        let mut items: Vec<OrderItem> = Vec::new();

        for line in lines {
            let menu_item = self.storage.get_menu_item_txn(txn, &line.menu_item_id)?;
            let Some(menu_item) = menu_item.filter(|m| m.place_id == table.place_id) else {
                push_unique(&mut offending, line.menu_item_id.clone());
                continue;
            };
            let sellable = menu_item.available
                && money::is_valid_price(menu_item.price)
                && money::is_valid_discount(menu_item.discount_percent);
            if !sellable || !(1..=money::MAX_QUANTITY).contains(&line.quantity) {
                push_unique(&mut offending, menu_item.name.clone());
                continue;
            }

            // Merge repeated menu items, keeping first-seen order
            match items.iter_mut().find(|i| i.menu_item_id == menu_item.id) {
                Some(existing) => {
                    match existing
                        .quantity
                        .checked_add(line.quantity)
                        .filter(|q| *q <= money::MAX_QUANTITY)
                    {
                        Some(quantity) => existing.quantity = quantity,
                        None => push_unique(&mut offending, menu_item.name.clone()),
                    }
                }
                None => items.push(OrderItem {
                    line_no: items.len() as u32 + 1,
                    menu_item_id: menu_item.id,
                    name: menu_item.name,
                    unit_price: menu_item.price,
                    discount_percent: menu_item.discount_percent,
                    quantity: line.quantity,
                }),
            }
        }

        if !offending.is_empty() {
            return Err(AppError::with_message(
                ErrorCode::MenuItemUnavailable,
                format!("Unavailable menu items: {}", offending.join(", ")),
            )
            .with_detail("items", offending));
        }
        Ok(items)
    }

    // ========== Status ==========

    /// Move an order to another status
    pub fn change_status(
        &self,
        order_id: &str,
        change: OrderStatusChange,
        caller: &Caller,
    ) -> AppResult<Order> {
        let txn = self.storage.begin_write()?;
        let mut order = self.order_txn(&txn, order_id)?;
        let table = self.table_txn(&txn, &order.table_id)?;
        let from = order.status;

        match caller {
            Caller::Anonymous => return Err(AppError::not_authenticated()),
            Caller::Guest(guest) => {
                self.require_table_session_txn(&txn, guest, &order)?;
                check_guest_transition(from, change.status, change.payment_method)?;
            }
            Caller::Staff(staff) => {
                self.authorize_staff_txn(&txn, staff, &table)?;
                if !check_staff_transition(from, change.status)? {
                    return Ok(order);
                }
            }
        }

        order.status = change.status;
        if change.status == OrderStatus::PaymentRequested && change.payment_method.is_some() {
            order.payment_method = change.payment_method;
        }
        order.updated_at = now_millis();
        self.storage.put_order(&txn, &order)?;
        self.storage.commit(txn)?;

        tracing::info!(
            order_id = %order.id,
            table_id = %order.table_id,
            caller = caller.kind(),
            from = %from,
            to = %order.status,
            "Order status changed"
        );
        self.push(
            &table,
            NotificationType::OrderStatusUpdated,
            format!("Order at {} is now {}", table.name, order.status),
        );
        Ok(order)
    }

    // ========== Delete ==========

    /// Delete a cancelled order together with its lines
    pub fn delete(&self, order_id: &str, caller: &Caller) -> AppResult<()> {
        let txn = self.storage.begin_write()?;
        let order = self.order_txn(&txn, order_id)?;

        match caller {
            Caller::Anonymous => return Err(AppError::not_authenticated()),
            Caller::Guest(guest) => self.require_own_order_txn(&txn, guest, &order)?,
            Caller::Staff(staff) => {
                let place = self.storage.get_place_txn(&txn, &order.place_id)?;
                staff.authorize(&order.place_id, place.as_ref())?;
            }
        }

        if order.status != OrderStatus::Cancelled {
            return Err(AppError::with_message(
                ErrorCode::OrderNotCancelled,
                format!("Order is {}, only cancelled orders can be deleted", order.status),
            ));
        }

        self.storage.remove_order_items_txn(&txn, &order.id)?;
        self.storage.remove_order_txn(&txn, &order.id)?;
        self.storage.commit(txn)?;

        tracing::info!(order_id = %order.id, table_id = %order.table_id, caller = caller.kind(), "Order deleted");
        Ok(())
    }

    // ========== Queries ==========

    pub fn get(&self, order_id: &str, caller: &Caller) -> AppResult<OrderDetail> {
        let order = self
            .storage
            .get_order(order_id)?
            .ok_or_else(|| AppError::order_not_found(order_id))?;
        self.authorize_read(&order.table_id, &order.place_id, caller)?;
        let items = self.storage.get_order_items(&order.id)?;
        Ok(OrderDetail { order, items })
    }

    /// Orders of a table, oldest first
    pub fn list_for_table(&self, table_id: &str, caller: &Caller) -> AppResult<Vec<OrderDetail>> {
        let table = self
            .storage
            .get_table(table_id)?
            .filter(|t| !t.is_deleted())
            .ok_or_else(AppError::table_not_found)?;
        self.authorize_read(&table.id, &table.place_id, caller)?;

        self.storage
            .list_orders_for_table(&table.id)?
            .into_iter()
            .map(|order| -> AppResult<OrderDetail> {
                let items = self.storage.get_order_items(&order.id)?;
                Ok(OrderDetail { order, items })
            })
            .collect()
    }

    fn authorize_read(&self, table_id: &str, place_id: &str, caller: &Caller) -> AppResult<()> {
        match caller {
            Caller::Anonymous => Err(AppError::not_authenticated()),
            Caller::Guest(guest) => {
                let session = self.sessions.require_live_session(guest)?;
                if session.table_id != table_id {
                    return Err(AppError::permission_denied("Not your table"));
                }
                Ok(())
            }
            Caller::Staff(staff) => {
                let place = self.storage.get_place(place_id)?;
                staff.authorize(place_id, place.as_ref())
            }
        }
    }

    // ========== helpers ==========

    fn order_txn(&self, txn: &WriteTransaction, order_id: &str) -> AppResult<Order> {
        self.storage
            .get_order_txn(txn, order_id)?
            .ok_or_else(|| AppError::order_not_found(order_id))
    }

    fn table_txn(&self, txn: &WriteTransaction, table_id: &str) -> AppResult<DiningTable> {
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

    /// Live session at the order's table
    fn require_table_session_txn(
        &self,
        txn: &WriteTransaction,
        guest: &GuestContext,
        order: &Order,
    ) -> AppResult<()> {
        let session = self.sessions.require_live_session_txn(txn, guest)?;
        if session.table_id != order.table_id {
            security_log!("WARN", "foreign_order_access", order_id = order.id.as_str());
            return Err(AppError::permission_denied("Not your table"));
        }
        Ok(())
    }

    /// Live session that placed the order
    fn require_own_order_txn(
        &self,
        txn: &WriteTransaction,
        guest: &GuestContext,
        order: &Order,
    ) -> AppResult<()> {
        let session = self.sessions.require_live_session_txn(txn, guest)?;
        if order.guest_session_id.as_deref() != Some(session.id.as_str()) {
            security_log!("WARN", "foreign_order_access", order_id = order.id.as_str());
            return Err(AppError::permission_denied("Not your order"));
        }
        Ok(())
    }

    fn push(&self, table: &DiningTable, kind: NotificationType, message: String) {
        self.notifier
            .push(TableNotification::new(&table.id, &table.place_id, kind, message));
    }
}

fn locked(order: &Order) -> AppError {
    AppError::with_message(
        ErrorCode::OrderLocked,
        format!("Order can no longer be edited ({})", order.status),
    )
    .with_detail("order_id", order.id.clone())
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}
