use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Domain events emitted by the services. Consumers are strictly observers;
/// no core invariant depends on event delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderReceived {
        client_order_id: Uuid,
        order_number: Option<String>,
        mapped: bool,
    },
    OrderStatusChanged {
        order_id: Uuid,
        order_number: String,
        old_status: String,
        new_status: String,
    },
    StockAllocated {
        warehouse_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    },
    StockReleased {
        warehouse_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    },
    StockShipped {
        warehouse_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    },
    StockAdjusted {
        warehouse_id: Uuid,
        product_id: Uuid,
        delta: i32,
        reason: String,
    },
    StockTransferred {
        from_warehouse_id: Uuid,
        to_warehouse_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    },
    SupplierOrderCreated {
        supplier_order_id: Uuid,
        po_number: String,
        round_no: i32,
    },
    WaybillRegistered {
        execution_id: Uuid,
        execution_no: String,
        tracking_number: String,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event; delivery failures are the caller's to log, never to propagate.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Fire-and-forget helper used inside transactions where a send failure
    /// must not affect the outcome.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event.clone()).await {
            warn!(error = %e, ?event, "Dropping domain event");
        }
    }
}

/// Creates a connected sender/receiver pair with the given buffer size.
pub fn channel(buffer: usize) -> (EventSender, mpsc::Receiver<Event>) {
    let (tx, rx) = mpsc::channel(buffer);
    (EventSender::new(tx), rx)
}

/// Drains the event channel, logging each event. Runs until every sender is dropped.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    info!("Event processor started");
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::OrderStatusChanged {
                order_number,
                old_status,
                new_status,
                ..
            } => info!(
                order_number = %order_number,
                old_status = %old_status,
                new_status = %new_status,
                "Order status changed"
            ),
            Event::SupplierOrderCreated {
                po_number, round_no, ..
            } => info!(po_number = %po_number, round_no = round_no, "Supplier order created"),
            other => debug!(event = ?other, "Domain event"),
        }
    }
    info!("Event processor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_event() {
        let (sender, mut rx) = channel(4);
        sender
            .send(Event::StockAllocated {
                warehouse_id: Uuid::new_v4(),
                product_id: Uuid::new_v4(),
                quantity: 3,
            })
            .await
            .unwrap();

        match rx.recv().await {
            Some(Event::StockAllocated { quantity, .. }) => assert_eq!(quantity, 3),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (sender, rx) = channel(1);
        drop(rx);
        // Must not panic or error out
        sender
            .send_or_log(Event::StockReleased {
                warehouse_id: Uuid::new_v4(),
                product_id: Uuid::new_v4(),
                quantity: 1,
            })
            .await;
    }
}
