pub mod persistence;

pub use persistence::{
    PostgresAttributeRepository, PostgresProductRepository, PostgresVariantRepository,
};
