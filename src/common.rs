pub mod date_ranges;
pub mod error;
pub mod money;
