pub mod catalog;
pub mod components;
pub mod dispatch;
pub mod inventory;
pub mod orders;
pub mod production;
pub mod suppliers;
