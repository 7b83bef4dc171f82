pub mod tenancy;
pub use tenancy::TenantContext;
