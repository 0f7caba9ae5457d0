pub mod persistence;

pub use persistence::PostgresPayableRepository;
