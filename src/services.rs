pub mod client_category_service;
pub use client_category_service::ClientCategoryService;
pub mod inventory_metrics_service;
pub use inventory_metrics_service::{InventoryMetric, InventoryMetricsService};
pub mod overview_service;
pub use overview_service::OverviewService;
pub mod recalculation;
pub mod sales_analytics_service;
pub use sales_analytics_service::SalesAnalyticsService;
pub mod sales_metrics;
pub mod satisfaction_service;
pub use satisfaction_service::{SatisfactionParams, SatisfactionService};
