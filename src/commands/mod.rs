pub mod audit;
pub mod extract;
pub mod ingest;
pub mod inventory;
pub mod refs;
pub mod score;
pub mod status;
pub mod tables;
