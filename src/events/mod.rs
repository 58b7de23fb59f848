use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

// Define the various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Order intake events
    OrderCreated {
        order_id: Uuid,
        item_count: usize,
    },

    // Movement events
    ItemAllocated {
        item_id: Uuid,
        stage_id: Uuid,
        sub_stage_id: Option<Uuid>,
        quantity: i32,
    },
    ItemMoved {
        item_id: Uuid,
        from_stage_id: Uuid,
        from_sub_stage_id: Option<Uuid>,
        to_stage_id: Uuid,
        to_sub_stage_id: Option<Uuid>,
        quantity: i32,
    },
    ItemReworked {
        item_id: Uuid,
        from_stage_id: Uuid,
        to_stage_id: Uuid,
        quantity: i32,
        reason: String,
    },
    ItemCompleted {
        item_id: Uuid,
        completed_at: DateTime<Utc>,
    },

    // Stage topology events
    StageCreated(Uuid),
    StageUpdated(Uuid),
    StageDeleted(Uuid),
    StageReordered {
        stage_id: Uuid,
        swapped_with: Uuid,
    },
    SubStageCreated {
        stage_id: Uuid,
        sub_stage_id: Uuid,
    },
    SubStageUpdated(Uuid),
    SubStageReordered {
        sub_stage_id: Uuid,
        swapped_with: Uuid,
    },
    SubStageDeleted(Uuid),
}

// Function to process incoming events and distribute them to registered event handlers.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::ItemMoved {
                item_id,
                from_stage_id,
                to_stage_id,
                quantity,
                ..
            } => {
                info!(
                    "Item moved: item_id={}, from_stage={}, to_stage={}, quantity={}",
                    item_id, from_stage_id, to_stage_id, quantity
                );
            }
            Event::ItemReworked {
                item_id,
                from_stage_id,
                to_stage_id,
                quantity,
                ref reason,
            } => {
                if let Err(e) =
                    handle_item_reworked(item_id, from_stage_id, to_stage_id, quantity, reason)
                        .await
                {
                    warn!(
                        "Failed to handle rework event: item_id={}, error={}",
                        item_id, e
                    );
                }
            }
            Event::ItemCompleted {
                item_id,
                completed_at,
            } => {
                if let Err(e) = handle_item_completed(item_id, completed_at).await {
                    warn!(
                        "Failed to handle completion event: item_id={}, error={}",
                        item_id, e
                    );
                }
            }
            Event::ItemAllocated {
                item_id,
                stage_id,
                quantity,
                ..
            } => {
                info!(
                    "Item allocated: item_id={}, stage_id={}, quantity={}",
                    item_id, stage_id, quantity
                );
            }
            Event::OrderCreated {
                order_id,
                item_count,
            } => {
                info!(
                    "Order created: order_id={}, item_count={}",
                    order_id, item_count
                );
            }
            Event::StageDeleted(stage_id) => {
                info!("Stage deleted: stage_id={}", stage_id);
            }
            Event::StageReordered {
                stage_id,
                swapped_with,
            } => {
                info!(
                    "Stage reordered: stage_id={}, swapped_with={}",
                    stage_id, swapped_with
                );
            }
            other => {
                info!("Event received: {:?}", other);
            }
        }
    }

    warn!("Event processing loop has ended");
}

// Handler functions for specific events

async fn handle_item_reworked(
    item_id: Uuid,
    from_stage_id: Uuid,
    to_stage_id: Uuid,
    quantity: i32,
    reason: &str,
) -> Result<(), String> {
    // Rework signals a defect somewhere upstream, so it logs louder than
    // an ordinary movement.
    warn!(
        "REWORK: item {} sent back from stage {} to stage {}: {} units, reason: {}",
        item_id, from_stage_id, to_stage_id, quantity, reason
    );

    // Downstream consumers (quality dashboards, supervisor notifications)
    // hang off this handler.
    Ok(())
}

async fn handle_item_completed(item_id: Uuid, completed_at: DateTime<Utc>) -> Result<(), String> {
    info!(
        "Item completed: item_id={}, completed_at={}",
        item_id, completed_at
    );

    Ok(())
}
