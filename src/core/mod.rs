pub mod classifier;
pub mod codec;
pub mod engine;
pub mod selection;
pub mod table;
pub mod types;
