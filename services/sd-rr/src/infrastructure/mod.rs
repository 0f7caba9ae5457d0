pub mod persistence;

pub use persistence::PostgresReturnRepository;
