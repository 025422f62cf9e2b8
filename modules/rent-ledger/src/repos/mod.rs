pub mod account_repo;
pub mod collection_repo;
pub mod due_repo;
pub mod tenant_repo;
