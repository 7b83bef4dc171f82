// src/models/report.rs

use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::common::error::AppError;
use crate::models::company::{ClientCategory, DocumentId, InventoryStats};

// --- Período do relatório (escolhido pelo usuário) ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ReportPeriod {
    #[serde(rename = "7d")]
    SevenDays,
    #[serde(rename = "30d")]
    ThirtyDays,
    #[serde(rename = "6m")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
}

/// Granularidade da série temporal de faturamento.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketGranularity {
    Day,
    Month,
}

impl ReportPeriod {
    pub fn code(&self) -> &'static str {
        match self {
            ReportPeriod::SevenDays => "7d",
            ReportPeriod::ThirtyDays => "30d",
            ReportPeriod::SixMonths => "6m",
            ReportPeriod::OneYear => "1y",
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            ReportPeriod::SevenDays => 7,
            ReportPeriod::ThirtyDays => 30,
            ReportPeriod::SixMonths => 180,
            ReportPeriod::OneYear => 365,
        }
    }

    /// Início do período (inclusivo) em relação a `now`.
    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(self.days())
    }

    pub fn granularity(&self) -> BucketGranularity {
        match self {
            ReportPeriod::SevenDays | ReportPeriod::ThirtyDays => BucketGranularity::Day,
            ReportPeriod::SixMonths | ReportPeriod::OneYear => BucketGranularity::Month,
        }
    }
}

impl FromStr for ReportPeriod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "7d" => Ok(ReportPeriod::SevenDays),
            "30d" => Ok(ReportPeriod::ThirtyDays),
            "6m" => Ok(ReportPeriod::SixMonths),
            "1y" => Ok(ReportPeriod::OneYear),
            other => Err(AppError::InvalidPeriod(other.to_string())),
        }
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// --- Resultados das funções de agregação ---

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyMetrics {
    pub today_total: Decimal,
    pub yesterday_total: Decimal,
    pub comparison: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesTotals {
    pub total: Decimal,
    pub week: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesCounts {
    pub total_count: usize,
    pub week_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketMetrics {
    pub average: Decimal,
    pub month_average: Decimal,
    pub last_month_average: Decimal,
    pub comparison: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySalesChange {
    pub current_month_count: usize,
    pub last_month_count: usize,
    pub percentage_change: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthRevenueMetrics {
    pub total: Decimal,
    pub last_month_total: Decimal,
    pub comparison: Decimal,
}

// Participação de uma categoria no faturamento do período (em %)
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShare {
    pub category: String,
    pub percentage: Decimal,
}

// Um ponto da série de faturamento (dia ou mês)
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevenueBucket {
    pub key: String,
    pub label: String,
    pub total: Decimal,
}

// --- Relatório do orquestrador ---

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevenueComparison {
    pub total: Decimal,
    pub comparison: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesCountOverview {
    pub total: usize,
    pub week_total: usize,
    pub month_comparison: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketOverview {
    pub average: Decimal,
    pub comparison: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesOverview {
    pub month_revenue: RevenueComparison,
    pub sales: SalesCountOverview,
    pub revenue: SalesTotals,
    pub daily: DailyMetrics,
    pub new_customers: usize,
    pub active_customers: usize,
    pub ticket: TicketOverview,
    pub category_distribution: Vec<CategoryShare>,
    pub sales_totals: Vec<RevenueBucket>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesOverviewReport {
    pub period: ReportPeriod,
    pub overview: SalesOverview,
}

// --- Visão do estoque ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum StockStatus {
    Normal,
    Baixo,
    #[serde(rename = "Crítico")]
    Critico,
    Esgotado,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductOverview {
    pub id: DocumentId,
    pub name: String,
    pub category: String,
    pub quantity: i64,
    pub min_quantity: i64,
    pub price: Decimal,
    pub status: StockStatus,
    // quantidade × custo
    pub total_value: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryOverview {
    pub stats: InventoryStats,
    pub products: Vec<ProductOverview>,
}

// --- Visão dos clientes ---

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientSummary {
    pub total: usize,
    pub vip: usize,
    pub new_this_month: usize,
    pub average_satisfaction: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientOverviewEntry {
    pub id: DocumentId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub category: ClientCategory,
    pub total_spent: Decimal,
    // YYYY-MM-DD
    pub last_purchase: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientsOverview {
    pub overview: ClientSummary,
    pub clients: Vec<ClientOverviewEntry>,
}
