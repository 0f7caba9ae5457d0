mod rows;
mod sale_repository;
mod verification_repository;

pub use sale_repository::PostgresSaleRepository;
pub use verification_repository::PostgresVerificationRepository;
