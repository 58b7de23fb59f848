pub mod export_order;
pub mod movement_history;
pub mod order_item;
pub mod stage;
pub mod stage_allocation;
pub mod sub_stage;
