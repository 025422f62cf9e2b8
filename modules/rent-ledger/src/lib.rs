pub mod billing;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod repos;
pub mod services;
pub mod status;

pub use error::{LedgerError, LedgerResult};
pub use services::due_generation_service::{generate_due_entries, GenerationReport};
pub use status::{derive_status, DueStatus, PaymentStatus};
