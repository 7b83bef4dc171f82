// src/handlers/reports.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid; // usado nos params do Swagger
use validator::{Validate, ValidationError};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::tenancy::TenantContext,
    models::{
        company::InventoryStats,
        report::{ClientsOverview, InventoryOverview, ReportPeriod, SalesOverviewReport},
    },
};

fn validate_period(period: &str) -> Result<(), ValidationError> {
    if period.parse::<ReportPeriod>().is_err() {
        let mut err = ValidationError::new("period");
        err.message = Some("Use 7d, 30d, 6m ou 1y.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SalesOverviewQuery {
    /// 7d, 30d, 6m ou 1y
    #[validate(custom(function = "validate_period"))]
    pub period: String,
}

// GET /api/reports/sales-overview
#[utoipa::path(
    get,
    path = "/api/reports/sales-overview",
    tag = "Reports",
    params(
        SalesOverviewQuery,
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa")
    ),
    responses(
        (status = 200, description = "Visão consolidada de vendas", body = SalesOverviewReport),
        (status = 400, description = "Período inválido"),
        (status = 404, description = "Empresa não encontrada")
    )
)]
pub async fn get_sales_overview(
    State(app_state): State<AppState>,
    tenant: TenantContext,
    Query(query): Query<SalesOverviewQuery>,
) -> Result<impl IntoResponse, ApiError> {
    query.validate().map_err(AppError::ValidationError)?;

    let report = app_state
        .sales_analytics_service
        .get_advanced_sales_overview(tenant.0, &query.period)
        .await?;

    Ok((StatusCode::OK, Json(report)))
}

// GET /api/reports/inventory-overview
#[utoipa::path(
    get,
    path = "/api/reports/inventory-overview",
    tag = "Reports",
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa")
    ),
    responses(
        (status = 200, description = "Situação de cada produto do estoque", body = InventoryOverview),
        (status = 404, description = "Empresa não encontrada")
    )
)]
pub async fn get_inventory_overview(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let overview = app_state
        .overview_service
        .get_inventory_overview(tenant.0)
        .await?;

    Ok((StatusCode::OK, Json(overview)))
}

// GET /api/reports/clients-overview
#[utoipa::path(
    get,
    path = "/api/reports/clients-overview",
    tag = "Reports",
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa")
    ),
    responses(
        (status = 200, description = "Resumo da carteira de clientes", body = ClientsOverview),
        (status = 404, description = "Empresa não encontrada")
    )
)]
pub async fn get_clients_overview(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let overview = app_state
        .overview_service
        .get_clients_overview(tenant.0)
        .await?;

    Ok((StatusCode::OK, Json(overview)))
}

// POST /api/reports/inventory-stats/recalculate
#[utoipa::path(
    post,
    path = "/api/reports/inventory-stats/recalculate",
    tag = "Reports",
    params(
        ("x-tenant-id" = Uuid, Header, description = "ID da Empresa")
    ),
    responses(
        (status = 200, description = "Estatísticas de estoque recalculadas", body = InventoryStats),
        (status = 404, description = "Empresa não encontrada")
    )
)]
pub async fn recalculate_inventory_stats(
    State(app_state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let stats = app_state
        .inventory_metrics_service
        .recalc_company(tenant.0)
        .await?;

    tracing::info!(company_id = %tenant.0, "Estatísticas de estoque recalculadas sob demanda");

    Ok((StatusCode::OK, Json(stats)))
}
