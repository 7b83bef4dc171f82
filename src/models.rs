pub mod company;
pub mod lenient;
pub mod recalculation;
pub mod report;
