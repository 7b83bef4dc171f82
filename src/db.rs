pub mod company_repo;
pub use company_repo::{CompanyCursor, CompanyStore, PgCompanyStore, ScanError, ScannedCompany};
pub mod memory_store;
pub use memory_store::InMemoryCompanyStore;
