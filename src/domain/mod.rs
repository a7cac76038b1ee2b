pub mod error;

// Equipment upload domain
pub mod equipment;
