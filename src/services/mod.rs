pub mod executions;
pub mod inventory;
pub mod orders;
pub mod purchase_orders;
pub mod waybills;

pub use inventory::InventoryService;
pub use orders::OrderService;
pub use purchase_orders::PurchaseOrderService;
pub use waybills::WaybillService;

use serde::{Deserialize, Serialize};

/// Per-item outcome of a batch operation. Batch operations never abort as a
/// whole; each targeted order or row reports one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchOutcome {
    Success,
    Skip,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchItem {
    /// Business-visible identifier of the item (order number, execution
    /// number, or row index for waybill rows).
    pub target: String,
    pub outcome: BatchOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Aggregate result of a batch operation: per-item detail plus counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub items: Vec<BatchItem>,
}

impl BatchSummary {
    pub fn success(&mut self, target: impl Into<String>) {
        self.succeeded += 1;
        self.items.push(BatchItem {
            target: target.into(),
            outcome: BatchOutcome::Success,
            message: None,
        });
    }

    pub fn skip(&mut self, target: impl Into<String>, message: impl Into<String>) {
        self.skipped += 1;
        self.items.push(BatchItem {
            target: target.into(),
            outcome: BatchOutcome::Skip,
            message: Some(message.into()),
        });
    }

    pub fn fail(&mut self, target: impl Into<String>, message: impl Into<String>) {
        self.failed += 1;
        self.items.push(BatchItem {
            target: target.into(),
            outcome: BatchOutcome::Fail,
            message: Some(message.into()),
        });
    }
}
