//! Order status transition rules
//!
//! ```text
//! created ──▶ delivered ──▶ payment_requested ──▶ closed
//!    │            │
//!    └────────────┴──▶ cancelled
//! ```
//!
//! Staff may move forward along the main line (skipping is allowed) and
//! cancel from `created`/`delivered`. Guests get exactly two moves.

use shared::error::{AppError, ErrorCode};
use shared::models::{OrderStatus, PaymentMethod};

fn rank(status: OrderStatus) -> Option<u8> {
    match status {
        OrderStatus::Created => Some(0),
        OrderStatus::Delivered => Some(1),
        OrderStatus::PaymentRequested => Some(2),
        OrderStatus::Closed => Some(3),
        OrderStatus::Cancelled => None,
    }
}

/// Whether staff may move an order from `from` to `to` (`from != to`)
pub fn staff_can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    if from.is_terminal() {
        return false;
    }
    match to {
        OrderStatus::Cancelled => matches!(from, OrderStatus::Created | OrderStatus::Delivered),
        _ => matches!((rank(from), rank(to)), (Some(a), Some(b)) if b > a),
    }
}

/// Check a staff transition; same-status requests are reported as `Ok(false)` (no-op)
pub fn check_staff_transition(from: OrderStatus, to: OrderStatus) -> Result<bool, AppError> {
    if from == to {
        return Ok(false);
    }
    if staff_can_transition(from, to) {
        return Ok(true);
    }
    Err(AppError::with_message(
        ErrorCode::InvalidStatusTransition,
        format!("Cannot move order from {} to {}", from, to),
    )
    .with_detail("from", from.to_string())
    .with_detail("to", to.to_string()))
}

/// Check a guest transition
///
/// Anything but `created → cancelled` or `delivered → payment_requested`
/// is reported as unreachable for the guest, not as a permission problem.
pub fn check_guest_transition(
    from: OrderStatus,
    to: OrderStatus,
    payment_method: Option<PaymentMethod>,
) -> Result<(), AppError> {
    match (from, to) {
        (OrderStatus::Created, OrderStatus::Cancelled) => Ok(()),
        (OrderStatus::Delivered, OrderStatus::PaymentRequested) => {
            if payment_method.is_none() {
                return Err(AppError::new(ErrorCode::PaymentMethodRequired));
            }
            Ok(())
        }
        _ => Err(AppError::with_message(
            ErrorCode::OrderTransitionUnavailable,
            format!("Status {} is not available for this order", to),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [OrderStatus; 5] = [
        OrderStatus::Created,
        OrderStatus::Delivered,
        OrderStatus::PaymentRequested,
        OrderStatus::Closed,
        OrderStatus::Cancelled,
    ];

    #[test]
    fn test_staff_forward_moves() {
        use OrderStatus::*;
        assert!(staff_can_transition(Created, Delivered));
        assert!(staff_can_transition(Created, Closed));
        assert!(staff_can_transition(Delivered, PaymentRequested));
        assert!(staff_can_transition(PaymentRequested, Closed));
        assert!(!staff_can_transition(Delivered, Created));
        assert!(!staff_can_transition(PaymentRequested, Delivered));
    }

    #[test]
    fn test_staff_cancel_only_before_payment() {
        use OrderStatus::*;
        assert!(staff_can_transition(Created, Cancelled));
        assert!(staff_can_transition(Delivered, Cancelled));
        assert!(!staff_can_transition(PaymentRequested, Cancelled));
        assert!(!staff_can_transition(Closed, Cancelled));
    }

    #[test]
    fn test_terminal_states_never_move() {
        for to in ALL {
            assert!(!staff_can_transition(OrderStatus::Closed, to));
            assert!(!staff_can_transition(OrderStatus::Cancelled, to));
        }
    }

    #[test]
    fn test_staff_same_status_is_noop() {
        assert!(!check_staff_transition(OrderStatus::Closed, OrderStatus::Closed).unwrap());
        let err = check_staff_transition(OrderStatus::Closed, OrderStatus::Created).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidStatusTransition);
    }

    #[test]
    fn test_guest_has_exactly_two_moves() {
        let mut allowed = Vec::new();
        for from in ALL {
            for to in ALL {
                if check_guest_transition(from, to, Some(PaymentMethod::Card)).is_ok() {
                    allowed.push((from, to));
                }
            }
        }
        assert_eq!(
            allowed,
            vec![
                (OrderStatus::Created, OrderStatus::Cancelled),
                (OrderStatus::Delivered, OrderStatus::PaymentRequested),
            ]
        );
    }

    #[test]
    fn test_guest_rejections() {
        let err = check_guest_transition(OrderStatus::Created, OrderStatus::Delivered, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::OrderTransitionUnavailable);
        assert_eq!(err.http_status().as_u16(), 404);

        let err = check_guest_transition(OrderStatus::Delivered, OrderStatus::PaymentRequested, None)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentMethodRequired);
    }
}
