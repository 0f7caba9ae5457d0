pub mod persistence;

pub use persistence::PostgresPurchaseOrderRepository;
