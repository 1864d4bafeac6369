use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Status of an internal order. Transitions are checked exclusively through
/// [`OrderStatus::can_transition`]; no mutating operation re-implements the rules.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    strum::Display,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum OrderStatus {
    /// Converted from a client order, not yet confirmed
    #[sea_orm(string_value = "PENDING")]
    Pending,
    /// Confirmed; warehouse-sourced executions hold an allocation
    #[sea_orm(string_value = "READY")]
    Ready,
    /// Deferred to a future target ship date
    #[sea_orm(string_value = "SCHEDULED")]
    Scheduled,
    /// Paused; any warehouse allocation has been released
    #[sea_orm(string_value = "HOLD")]
    Hold,
    /// Included in a generated purchase order / shipping instruction
    #[sea_orm(string_value = "ORDERED")]
    Ordered,
    /// At least every active execution has a waybill
    #[sea_orm(string_value = "SHIPPING")]
    Shipping,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Legal transitions of the order state machine:
    /// `PENDING → READY → ORDERED → SHIPPING → COMPLETED`, with side branches
    /// `PENDING/READY → HOLD → READY` and `READY → SCHEDULED → READY`, and a
    /// guarded `* → CANCELLED` from every non-terminal state.
    pub fn can_transition(self, to: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, to) {
            (from, Cancelled) => !from.is_terminal(),
            (Pending, Ready) | (Pending, Hold) => true,
            (Ready, Ordered) | (Ready, Hold) | (Ready, Scheduled) => true,
            (Scheduled, Ready) | (Scheduled, Hold) => true,
            (Hold, Ready) => true,
            (Ordered, Shipping) | (Ordered, Ready) => true, // Ready via rollback
            (Shipping, Completed) => true,
            (Shipping, Ordered) => true, // waybill delete
            (Ready, Shipping) => true,   // warehouse-sourced orders skip ORDERED
            _ => false,
        }
    }
}

/// Status of one execution unit (box-sized slice of an order).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    strum::Display,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum ExecutionStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "READY")]
    Ready,
    #[sea_orm(string_value = "INSTRUCTED")]
    Instructed,
    #[sea_orm(string_value = "SHIPPING")]
    Shipping,
    /// Reached only through the external CS workflow; blocks cancellation
    #[sea_orm(string_value = "RETURNED")]
    Returned,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl ExecutionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// `PENDING → READY → INSTRUCTED → SHIPPING (→ RETURNED)`, guarded
    /// `* → CANCELLED` for units that have not physically moved.
    pub fn can_transition(self, to: ExecutionStatus) -> bool {
        use ExecutionStatus::*;
        match (self, to) {
            (from, Cancelled) => !matches!(from, Shipping | Returned | Cancelled),
            (Pending, Ready) => true,
            (Ready, Instructed) => true,
            (Instructed, Ready) => true, // rollback of a discarded purchase order
            (Ready, Shipping) | (Instructed, Shipping) => true,
            (Shipping, Instructed) => true, // waybill delete, supplier units
            (Shipping, Ready) => true,      // waybill delete, warehouse units
            (Shipping, Returned) => true,   // CS workflow only
            _ => false,
        }
    }
}

/// Where an execution unit is fulfilled from.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
    strum::Display,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
pub enum ExecutionSource {
    #[sea_orm(string_value = "WAREHOUSE")]
    Warehouse,
    #[sea_orm(string_value = "SUPPLIER")]
    Supplier,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_happy_path_is_legal() {
        use OrderStatus::*;
        let path = [Pending, Ready, Ordered, Shipping, Completed];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn order_hold_and_schedule_branches() {
        use OrderStatus::*;
        assert!(Pending.can_transition(Hold));
        assert!(Ready.can_transition(Hold));
        assert!(Hold.can_transition(Ready));
        assert!(Ready.can_transition(Scheduled));
        assert!(Scheduled.can_transition(Ready));
        assert!(Ordered.can_transition(Ready)); // rollback
        assert!(!Hold.can_transition(Ordered));
        assert!(!Shipping.can_transition(Ready));
    }

    #[test]
    fn terminal_orders_cannot_move() {
        use OrderStatus::*;
        for to in [Pending, Ready, Hold, Ordered, Shipping, Completed, Cancelled] {
            assert!(!Cancelled.can_transition(to));
            assert!(!Completed.can_transition(to));
        }
    }

    #[test]
    fn execution_cancel_guards() {
        use ExecutionStatus::*;
        assert!(Pending.can_transition(Cancelled));
        assert!(Ready.can_transition(Cancelled));
        assert!(Instructed.can_transition(Cancelled));
        assert!(!Shipping.can_transition(Cancelled));
        assert!(!Returned.can_transition(Cancelled));
    }

    #[test]
    fn display_matches_stored_representation() {
        // History rows and log lines must show the same string the column stores.
        assert_eq!(OrderStatus::Cancelled.to_string(), "CANCELLED");
        assert_eq!(OrderStatus::Pending.to_string(), "PENDING");
        assert_eq!(ExecutionStatus::Instructed.to_string(), "INSTRUCTED");
        assert_eq!(ExecutionSource::Warehouse.to_string(), "WAREHOUSE");
    }

    #[test]
    fn execution_waybill_delete_reversal_edges() {
        use ExecutionStatus::*;
        // Supplier units revert to INSTRUCTED, warehouse units to READY.
        assert!(Shipping.can_transition(Instructed));
        assert!(Shipping.can_transition(Ready));
        assert!(!Shipping.can_transition(Pending));
    }
}
