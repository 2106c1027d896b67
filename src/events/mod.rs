//! In-process event bus.
//!
//! Services publish domain events after committing; the processing loop fans
//! them out to log sinks and any registered handlers. This is the explicit
//! pub/sub channel that replaces the old cross-tab localStorage signaling:
//! interested parties subscribe instead of polling browser storage keys.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Domain events published by the services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Catalog events
    CatalogCreated(Uuid),
    CatalogUpdated(Uuid),
    CatalogDeleted(Uuid),

    // Order events
    OrderCreated(Uuid),
    OrderUpdated(Uuid),
    OrderCancelled(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: String,
        new_status: String,
    },

    // Inventory events
    InventoryItemCreated(Uuid),
    InventoryItemUpdated(Uuid),
    InventoryAdjusted {
        item_id: Uuid,
        old_quantity: Decimal,
        new_quantity: Decimal,
        transaction_id: Uuid,
        reason: String,
    },
    LowStock {
        item_id: Uuid,
        quantity: Decimal,
        min_stock_level: Decimal,
    },

    // Production events
    JobCardCreated {
        job_card_id: Uuid,
        order_id: Uuid,
        consumption_batch_id: Uuid,
    },
    MaterialsConsumed {
        job_card_id: Uuid,
        batch_id: Uuid,
        components: usize,
    },
    ConsumptionReversed {
        job_card_id: Uuid,
        batch_id: Uuid,
    },
    StageJobCreated {
        job_card_id: Uuid,
        job_id: Uuid,
        stage: String,
    },
    StageJobStatusChanged {
        job_id: Uuid,
        stage: String,
        old_status: String,
        new_status: String,
    },

    // Dispatch events
    DispatchCreated {
        dispatch_id: Uuid,
        order_id: Uuid,
        quantity: i32,
    },
    DispatchBatchCreated(Uuid),

    // Supplier events
    SupplierCreated(Uuid),
    SupplierUpdated(Uuid),
    SupplierDeleted(Uuid),

    // Generic event for custom messages
    Generic {
        message: String,
        timestamp: DateTime<Utc>,
        metadata: serde_json::Value,
    },
}

impl Event {
    /// Create a generic event with string data
    pub fn with_data(data: String) -> Self {
        Event::Generic {
            message: data,
            timestamp: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }
}

/// Handlers implementing this trait process events asynchronously.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle_event(&self, event: Event) -> Result<(), String>;
}

/// Receives events from the channel and distributes them to handlers.
/// Low-stock events get a dedicated warning so they stand out in the log
/// stream operators actually watch.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, handlers: Vec<Box<dyn EventHandler>>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::LowStock {
                item_id,
                quantity,
                min_stock_level,
            } => {
                warn!(
                    item_id = %item_id,
                    quantity = %quantity,
                    min_stock_level = %min_stock_level,
                    "Material below minimum stock level"
                );
            }
            other => {
                info!(event = ?other, "Processing event");
            }
        }

        for handler in &handlers {
            if let Err(e) = handler.handle_event(event.clone()).await {
                warn!(error = %e, "Event handler failed");
            }
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHandler {
        seen: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl EventHandler for CountingHandler {
        async fn handle_event(&self, _event: Event) -> Result<(), String> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn events_reach_registered_handlers() {
        let (tx, rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);
        let seen = Arc::new(AtomicUsize::new(0));
        let handler = CountingHandler { seen: seen.clone() };

        let loop_handle = tokio::spawn(process_events(rx, vec![Box::new(handler)]));

        sender.send(Event::OrderCreated(Uuid::new_v4())).await.unwrap();
        sender
            .send(Event::with_data("smoke".to_string()))
            .await
            .unwrap();
        drop(sender);

        loop_handle.await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn send_fails_after_receiver_drops() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        let result = sender.send(Event::CatalogCreated(Uuid::new_v4())).await;
        assert!(result.is_err());
    }
}
