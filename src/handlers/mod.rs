pub mod history;
pub mod movements;
pub mod orders;
pub mod stages;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    history::HistoryService, movements::MovementService, orders::OrderService,
    stages::StageService,
};
use std::sync::Arc;

/// Service container shared through [`crate::AppState`].
#[derive(Clone)]
pub struct AppServices {
    pub stages: StageService,
    pub movements: MovementService,
    pub orders: OrderService,
    pub history: HistoryService,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            stages: StageService::new(db_pool.clone(), event_sender.clone()),
            movements: MovementService::new(db_pool.clone(), event_sender.clone()),
            orders: OrderService::new(db_pool.clone(), event_sender),
            history: HistoryService::new(db_pool),
        }
    }
}
