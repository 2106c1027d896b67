//! SeaORM entities for the bagforge schema.

pub mod catalog;
pub mod catalog_component;
pub mod dispatch_batch;
pub mod inventory_item;
pub mod inventory_transaction;
pub mod job_card;
pub mod order;
pub mod order_component;
pub mod order_dispatch;
pub mod production_job;
pub mod supplier;
