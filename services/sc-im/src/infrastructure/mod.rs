pub mod persistence;

pub use persistence::{
    PostgresAdjustmentRepository, PostgresInventoryRepository, PostgresStockInRepository,
    PostgresStockOutRepository, current_stock, insert_stock_in, insert_stock_out,
};
