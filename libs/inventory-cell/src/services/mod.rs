pub mod stock;

pub use stock::InventoryService;
