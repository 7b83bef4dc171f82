// src/docs.rs

use utoipa::OpenApi;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Reports ---
        handlers::reports::get_sales_overview,
        handlers::reports::get_inventory_overview,
        handlers::reports::get_clients_overview,
        handlers::reports::recalculate_inventory_stats,
    ),
    components(
        schemas(
            // --- Documento do tenant ---
            models::company::DocumentId,
            models::company::ClientCategory,
            models::company::InventoryStats,

            // --- Vendas ---
            models::report::ReportPeriod,
            models::report::SalesOverviewReport,
            models::report::SalesOverview,
            models::report::RevenueComparison,
            models::report::SalesCountOverview,
            models::report::SalesTotals,
            models::report::DailyMetrics,
            models::report::TicketOverview,
            models::report::CategoryShare,
            models::report::RevenueBucket,

            // --- Estoque ---
            models::report::StockStatus,
            models::report::ProductOverview,
            models::report::InventoryOverview,

            // --- Clientes ---
            models::report::ClientSummary,
            models::report::ClientOverviewEntry,
            models::report::ClientsOverview,
        )
    ),
    tags(
        (name = "Reports", description = "Indicadores de vendas, estoque e clientes por empresa")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_report_routes() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        assert!(paths.iter().any(|p| p.as_str() == "/api/reports/sales-overview"));
        assert!(paths.iter().any(|p| p.as_str() == "/api/reports/inventory-stats/recalculate"));
    }
}
