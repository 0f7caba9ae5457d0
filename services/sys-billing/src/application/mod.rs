mod handler;

pub use handler::ServiceHandler;
