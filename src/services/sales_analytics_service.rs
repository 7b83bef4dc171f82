// src/services/sales_analytics_service.rs

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
    common::{date_ranges::DateRanges, error::AppError},
    db::CompanyStore,
    models::{
        company::{Company, CompanyProjection},
        report::{
            ReportPeriod, RevenueComparison, SalesCountOverview, SalesOverview,
            SalesOverviewReport, TicketOverview,
        },
    },
    services::sales_metrics::{
        calculate_category_revenue_distribution, calculate_daily_metrics,
        calculate_month_revenue_metrics, calculate_monthly_sales_change,
        calculate_revenue_in_period, calculate_sales_counts, calculate_sales_totals,
        calculate_ticket_metrics,
    },
};

// Janela fixa, independente do período pedido.
pub const ACTIVE_CUSTOMER_WINDOW_DAYS: i64 = 90;

/// Clientes cadastrados com ao menos uma venda nos últimos 90 dias.
pub fn count_active_customers(company: &Company, now: DateTime<Utc>) -> usize {
    let cutoff = now - Duration::days(ACTIVE_CUSTOMER_WINDOW_DAYS);

    let buyers: HashSet<String> = company
        .sales
        .iter()
        .filter(|s| s.date.is_some_and(|d| d >= cutoff))
        .filter_map(|s| s.client_id.as_ref().map(|id| id.canonical()))
        .collect();

    company
        .clients
        .iter()
        .map(|c| c.id.canonical())
        .collect::<HashSet<_>>()
        .intersection(&buyers)
        .count()
}

/// Clientes criados no mês corrente.
pub fn count_new_customers(company: &Company, month_start: DateTime<Utc>) -> usize {
    company
        .clients
        .iter()
        .filter(|c| c.created_at.is_some_and(|d| d >= month_start))
        .count()
}

/// Monta o relatório a partir de um documento completo, sem I/O.
pub fn build_sales_overview(
    company: &Company,
    period: ReportPeriod,
    now: DateTime<Utc>,
) -> SalesOverviewReport {
    let ranges = DateRanges::from_now(now);
    let sales = &company.sales;

    let daily = calculate_daily_metrics(sales, ranges.today_start, ranges.yesterday_start);
    let totals = calculate_sales_totals(sales, ranges.week_start);
    let counts = calculate_sales_counts(sales, ranges.week_start);
    let ticket = calculate_ticket_metrics(
        sales,
        ranges.month_start,
        ranges.last_month_start,
        ranges.last_month_end,
    );
    let monthly_change = calculate_monthly_sales_change(
        sales,
        ranges.month_start,
        ranges.last_month_start,
        ranges.last_month_end,
    );
    let month_revenue = calculate_month_revenue_metrics(
        sales,
        ranges.month_start,
        ranges.last_month_start,
        ranges.last_month_end,
    );

    let overview = SalesOverview {
        month_revenue: RevenueComparison {
            total: month_revenue.total,
            comparison: month_revenue.comparison,
        },
        sales: SalesCountOverview {
            total: counts.total_count,
            week_total: counts.week_count,
            month_comparison: monthly_change.percentage_change,
        },
        revenue: totals,
        daily,
        new_customers: count_new_customers(company, ranges.month_start),
        active_customers: count_active_customers(company, now),
        ticket: TicketOverview {
            average: ticket.average,
            comparison: ticket.comparison,
        },
        category_distribution: calculate_category_revenue_distribution(
            sales,
            &company.inventory,
            period,
            now,
        ),
        sales_totals: calculate_revenue_in_period(sales, period, now),
    };

    SalesOverviewReport { period, overview }
}

#[derive(Clone)]
pub struct SalesAnalyticsService {
    store: Arc<dyn CompanyStore>,
}

impl SalesAnalyticsService {
    pub fn new(store: Arc<dyn CompanyStore>) -> Self {
        Self { store }
    }

    /// Relatório sob demanda de um tenant. Período inválido é rejeitado antes de ir ao banco.
    pub async fn get_advanced_sales_overview(
        &self,
        company_id: Uuid,
        period: &str,
    ) -> Result<SalesOverviewReport, AppError> {
        let period: ReportPeriod = period.parse()?;

        let company = self
            .store
            .find_company(company_id, CompanyProjection::FULL)
            .await?
            .ok_or(AppError::CompanyNotFound)?;

        tracing::debug!(%company_id, period = period.code(), "Gerando visão de vendas");

        Ok(build_sales_overview(&company, period, Utc::now()))
    }
}
