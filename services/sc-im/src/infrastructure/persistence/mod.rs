mod adjustment_repository;
mod inventory_repository;
mod levels;
mod rows;
mod stock_in_repository;
mod stock_out_repository;

pub use adjustment_repository::PostgresAdjustmentRepository;
pub use inventory_repository::PostgresInventoryRepository;
pub use levels::{current_stock, insert_stock_in, insert_stock_out};
pub use stock_in_repository::PostgresStockInRepository;
pub use stock_out_repository::PostgresStockOutRepository;
