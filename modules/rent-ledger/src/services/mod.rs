pub mod account_service;
pub mod csv_export;
pub mod due_generation_service;
pub mod ledger_service;
pub mod report_service;
pub mod tenant_service;
