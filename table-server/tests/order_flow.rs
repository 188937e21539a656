//! 订单全流程: 下单合并、改单、结账、取消与删除

mod common;

use common::*;
use shared::models::{
    OrderDraft, OrderLineInput, OrderStatus, OrderStatusChange, PaymentMethod, ScanOutcome,
    SessionPayload,
};
use table_server::{Caller, ErrorCode, NotificationSink};

fn line(menu_item_id: &str, quantity: i32) -> OrderLineInput {
    OrderLineInput {
        menu_item_id: menu_item_id.into(),
        quantity,
    }
}

fn draft(lines: Vec<OrderLineInput>) -> OrderDraft {
    OrderDraft {
        items: lines,
        ..Default::default()
    }
}

fn seat(env: &TestEnv, salt: &str) -> SessionPayload {
    let outcome = env.state.tables.resolve(salt, None, &Caller::Anonymous).unwrap();
    assert!(matches!(outcome, ScanOutcome::Started { .. }));
    outcome.session().cloned().unwrap()
}

fn status(status: OrderStatus) -> OrderStatusChange {
    OrderStatusChange {
        status,
        payment_method: None,
    }
}

#[test]
fn test_same_item_lines_merge() {
    let env = setup();
    let guest = env.guest(&seat(&env, SALT_T1));

    let mut order = draft(vec![line("soup", 1), line("soup", 2)]);
    order.total_price = Some(0.01);
    let detail = env.state.orders.add(order, &guest).unwrap();

    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].quantity, 3);
    assert_eq!(detail.items[0].unit_price, 5.0);
    assert_eq!(detail.order.total_price, 15.0);
    assert_eq!(detail.order.status, OrderStatus::Created);
    assert_eq!(detail.order.table_id, "t1");

    let stored = env.state.storage.get_order_items(&detail.order.id).unwrap();
    assert_eq!(stored, detail.items);
}

#[test]
fn test_order_requires_occupied_table() {
    let env = setup();
    let mut order = draft(vec![line("soup", 1)]);
    order.table_id = Some("t2".into());

    let err = env.state.orders.add(order, &env.waiter()).unwrap_err();
    assert_eq!(err.code, ErrorCode::TableNotOccupied);
    assert!(env.state.storage.list_orders_for_table("t2").unwrap().is_empty());
}

#[test]
fn test_anonymous_cannot_order() {
    let env = setup();
    let err = env
        .state
        .orders
        .add(draft(vec![line("soup", 1)]), &Caller::Anonymous)
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotAuthenticated);
}

#[test]
fn test_guest_checkout() {
    let env = setup();
    let guest = env.guest(&seat(&env, SALT_T1));
    let waiter = env.waiter();
    let orders = &env.state.orders;

    let id = orders
        .add(draft(vec![line("soup", 2), line("bread", 1)]), &guest)
        .unwrap()
        .order
        .id;

    orders
        .change_status(&id, status(OrderStatus::Delivered), &waiter)
        .unwrap();

    // Delivered orders are no longer editable by the guest
    let err = orders
        .update(&id, draft(vec![line("soup", 1)]), &guest)
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderLocked);

    let err = orders
        .change_status(&id, status(OrderStatus::PaymentRequested), &guest)
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PaymentMethodRequired);

    let order = orders
        .change_status(
            &id,
            OrderStatusChange {
                status: OrderStatus::PaymentRequested,
                payment_method: Some(PaymentMethod::Card),
            },
            &guest,
        )
        .unwrap();
    assert_eq!(order.status, OrderStatus::PaymentRequested);
    assert_eq!(order.payment_method, Some(PaymentMethod::Card));
    assert_eq!(order.total_price, 12.5);

    let order = orders
        .change_status(&id, status(OrderStatus::Closed), &waiter)
        .unwrap();
    assert_eq!(order.status, OrderStatus::Closed);
}

#[test]
fn test_cancel_resubmit_delete() {
    let env = setup();
    let guest = env.guest(&seat(&env, SALT_T1));
    let orders = &env.state.orders;

    let id = orders.add(draft(vec![line("soup", 1)]), &guest).unwrap().order.id;

    let err = orders.delete(&id, &guest).unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderNotCancelled);

    orders
        .change_status(&id, status(OrderStatus::Cancelled), &guest)
        .unwrap();

    // Editing a cancelled order resubmits it
    let detail = orders
        .update(&id, draft(vec![line("bread", 2)]), &guest)
        .unwrap();
    assert_eq!(detail.order.status, OrderStatus::Created);
    assert_eq!(detail.order.total_price, 5.0);

    orders
        .change_status(&id, status(OrderStatus::Cancelled), &guest)
        .unwrap();
    orders.delete(&id, &guest).unwrap();

    assert_eq!(orders.get(&id, &guest).unwrap_err().code, ErrorCode::OrderNotFound);
    assert!(env.state.storage.get_order_items(&id).unwrap().is_empty());
}

#[test]
fn test_staff_edit_locks_guest_out() {
    let env = setup();
    let guest = env.guest(&seat(&env, SALT_T1));
    let waiter = env.waiter();
    let orders = &env.state.orders;

    let id = orders.add(draft(vec![line("soup", 1)]), &guest).unwrap().order.id;
    let detail = orders
        .update(&id, draft(vec![line("soup", 4)]), &waiter)
        .unwrap();
    assert!(detail.order.modified_by_staff);
    assert_eq!(detail.order.total_price, 20.0);

    let err = orders
        .update(&id, draft(vec![line("soup", 1)]), &guest)
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderLocked);
}

#[test]
fn test_table_orders_are_private() {
    let env = setup();
    let g1 = env.guest(&seat(&env, SALT_T1));
    let g2 = env.guest(&seat(&env, SALT_T2));
    let orders = &env.state.orders;

    orders.add(draft(vec![line("soup", 1)]), &g1).unwrap();
    orders.add(draft(vec![line("bread", 1)]), &g1).unwrap();

    assert_eq!(orders.list_for_table("t1", &g1).unwrap().len(), 2);
    assert_eq!(orders.list_for_table("t1", &env.waiter()).unwrap().len(), 2);
    assert_eq!(
        orders.list_for_table("t1", &g2).unwrap_err().code,
        ErrorCode::PermissionDenied
    );
}

#[test]
fn test_order_pushes_notification() {
    let env = setup();
    let guest = env.guest(&seat(&env, SALT_T1));
    env.state.notifications.clear("t1");

    env.state.orders.add(draft(vec![line("soup", 1)]), &guest).unwrap();

    let pending = env.state.notifications.pending("t1");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].kind, shared::NotificationType::OrderCreated);
    assert_eq!(pending[0].place_id, "place-1");
}
