// src/services/sales_metrics.rs

// Funções puras de agregação sobre o array `sales` de um tenant.
// Somas intermediárias com precisão total (saturando nos limites do Decimal);
// arredondamento (2 casas) só no retorno.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Duration, Month, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::{
    common::money::{average, percent_change, round2, saturating_sum},
    models::{
        company::{Product, Sale, SaleItem},
        report::{
            BucketGranularity, CategoryShare, DailyMetrics, MonthRevenueMetrics,
            MonthlySalesChange, ReportPeriod, RevenueBucket, SalesCounts, SalesTotals,
            TicketMetrics,
        },
    },
};

pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Vendas com data válida. Vendas sem data (ou com data ilegível) ficam de fora de tudo.
fn dated(sales: &[Sale]) -> impl Iterator<Item = (&Sale, DateTime<Utc>)> {
    sales.iter().filter_map(|s| s.date.map(|d| (s, d)))
}

fn in_range(date: DateTime<Utc>, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    date >= start && date < end
}

// --- Diário ---
pub fn calculate_daily_metrics(
    sales: &[Sale],
    today_start: DateTime<Utc>,
    yesterday_start: DateTime<Utc>,
) -> DailyMetrics {
    let mut today_total = Decimal::ZERO;
    let mut yesterday_total = Decimal::ZERO;

    for (sale, date) in dated(sales) {
        if date >= today_start {
            today_total = today_total.saturating_add(sale.total);
        } else if in_range(date, yesterday_start, today_start) {
            yesterday_total = yesterday_total.saturating_add(sale.total);
        }
    }

    DailyMetrics {
        today_total: round2(today_total),
        yesterday_total: round2(yesterday_total),
        comparison: percent_change(today_total, yesterday_total),
    }
}

// --- Totais (geral e últimos 7 dias) ---
pub fn calculate_sales_totals(sales: &[Sale], week_start: DateTime<Utc>) -> SalesTotals {
    let mut total = Decimal::ZERO;
    let mut week = Decimal::ZERO;

    for (sale, date) in dated(sales) {
        total = total.saturating_add(sale.total);
        if date >= week_start {
            week = week.saturating_add(sale.total);
        }
    }

    SalesTotals {
        total: round2(total),
        week: round2(week),
    }
}

// --- Contagens (não valores) ---
pub fn calculate_sales_counts(sales: &[Sale], week_start: DateTime<Utc>) -> SalesCounts {
    let mut total_count = 0;
    let mut week_count = 0;

    for (_, date) in dated(sales) {
        total_count += 1;
        if date >= week_start {
            week_count += 1;
        }
    }

    SalesCounts {
        total_count,
        week_count,
    }
}

// --- Ticket médio e variação mensal ---
pub fn calculate_ticket_metrics(
    sales: &[Sale],
    month_start: DateTime<Utc>,
    last_month_start: DateTime<Utc>,
    last_month_end: DateTime<Utc>,
) -> TicketMetrics {
    let (mut sum, mut count) = (Decimal::ZERO, 0usize);
    let (mut month_sum, mut month_count) = (Decimal::ZERO, 0usize);
    let (mut last_sum, mut last_count) = (Decimal::ZERO, 0usize);

    for (sale, date) in dated(sales) {
        sum = sum.saturating_add(sale.total);
        count += 1;

        if date >= month_start {
            month_sum = month_sum.saturating_add(sale.total);
            month_count += 1;
        } else if in_range(date, last_month_start, last_month_end) {
            last_sum = last_sum.saturating_add(sale.total);
            last_count += 1;
        }
    }

    let month_average = average(month_sum, month_count);
    let last_month_average = average(last_sum, last_count);

    TicketMetrics {
        average: round2(average(sum, count)),
        month_average: round2(month_average),
        last_month_average: round2(last_month_average),
        comparison: percent_change(month_average, last_month_average),
    }
}

// --- Quantidade de vendas: mês atual x anterior ---
pub fn calculate_monthly_sales_change(
    sales: &[Sale],
    month_start: DateTime<Utc>,
    last_month_start: DateTime<Utc>,
    last_month_end: DateTime<Utc>,
) -> MonthlySalesChange {
    let mut current_month_count = 0usize;
    let mut last_month_count = 0usize;

    for (_, date) in dated(sales) {
        if date >= month_start {
            current_month_count += 1;
        } else if in_range(date, last_month_start, last_month_end) {
            last_month_count += 1;
        }
    }

    MonthlySalesChange {
        current_month_count,
        last_month_count,
        percentage_change: percent_change(
            Decimal::from(current_month_count),
            Decimal::from(last_month_count),
        ),
    }
}

// --- Faturamento: mês atual x anterior ---
pub fn calculate_month_revenue_metrics(
    sales: &[Sale],
    month_start: DateTime<Utc>,
    last_month_start: DateTime<Utc>,
    last_month_end: DateTime<Utc>,
) -> MonthRevenueMetrics {
    let mut total = Decimal::ZERO;
    let mut last_month_total = Decimal::ZERO;

    for (sale, date) in dated(sales) {
        if date >= month_start {
            total = total.saturating_add(sale.total);
        } else if in_range(date, last_month_start, last_month_end) {
            last_month_total = last_month_total.saturating_add(sale.total);
        }
    }

    MonthRevenueMetrics {
        total: round2(total),
        last_month_total: round2(last_month_total),
        comparison: percent_change(total, last_month_total),
    }
}

// ---------------------------------------------------------------------------
//  Resolução de produtos (referência fraca)
// ---------------------------------------------------------------------------

/// Índice do inventário para resolver itens de venda.
/// Ordem: id exato, forma canônica do id, nome sem diferenciar caixa.
pub struct ProductIndex<'a> {
    by_id: HashMap<&'a str, &'a Product>,
    by_canonical_id: HashMap<String, &'a Product>,
    by_name: HashMap<String, &'a Product>,
}

impl<'a> ProductIndex<'a> {
    pub fn new(inventory: &'a [Product]) -> Self {
        let mut by_id = HashMap::new();
        let mut by_canonical_id = HashMap::new();
        let mut by_name = HashMap::new();

        for product in inventory {
            by_id.entry(product.id.as_str()).or_insert(product);
            by_canonical_id.entry(product.id.canonical()).or_insert(product);
            let name = product.name.trim().to_lowercase();
            if !name.is_empty() {
                by_name.entry(name).or_insert(product);
            }
        }

        Self {
            by_id,
            by_canonical_id,
            by_name,
        }
    }

    pub fn resolve(&self, item: &SaleItem) -> Option<&'a Product> {
        if let Some(product_id) = &item.product_id {
            if let Some(product) = self.by_id.get(product_id.as_str()) {
                return Some(*product);
            }
            if let Some(product) = self.by_canonical_id.get(&product_id.canonical()) {
                return Some(*product);
            }
        }

        item.product_name
            .as_deref()
            .map(|name| name.trim().to_lowercase())
            .and_then(|name| self.by_name.get(&name).copied())
    }

    /// Categoria do item, ou "Unknown" se o produto não existe mais.
    pub fn category_of(&self, item: &SaleItem) -> &'a str {
        self.resolve(item)
            .and_then(|p| p.category.as_deref())
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(UNKNOWN_CATEGORY)
    }
}

// --- Distribuição do faturamento por categoria (em %) ---
pub fn calculate_category_revenue_distribution(
    sales: &[Sale],
    inventory: &[Product],
    period: ReportPeriod,
    now: DateTime<Utc>,
) -> Vec<CategoryShare> {
    let start = period.start(now);
    let index = ProductIndex::new(inventory);

    let mut revenue: BTreeMap<&str, Decimal> = BTreeMap::new();
    for (sale, date) in dated(sales) {
        if date < start {
            continue;
        }
        for item in &sale.items {
            let acc = revenue.entry(index.category_of(item)).or_default();
            *acc = acc.saturating_add(item.line_total());
        }
    }

    let total = saturating_sum(revenue.values().copied());
    let mut shares: Vec<CategoryShare> = revenue
        .into_iter()
        .map(|(category, value)| CategoryShare {
            category: category.to_string(),
            percentage: value
                .checked_div(total)
                .and_then(|share| share.checked_mul(Decimal::ONE_HUNDRED))
                .map(round2)
                .unwrap_or(Decimal::ZERO),
        })
        .collect();

    shares.sort_by(|a, b| {
        b.percentage
            .cmp(&a.percentage)
            .then_with(|| a.category.cmp(&b.category))
    });
    shares
}

// --- Série temporal do faturamento no período ---
pub fn calculate_revenue_in_period(
    sales: &[Sale],
    period: ReportPeriod,
    now: DateTime<Utc>,
) -> Vec<RevenueBucket> {
    let start = period.start(now);

    match period.granularity() {
        BucketGranularity::Day => {
            let mut buckets: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
            let mut day = start.date_naive();
            while day <= now.date_naive() {
                buckets.insert(day, Decimal::ZERO);
                day += Duration::days(1);
            }

            for (sale, date) in dated(sales) {
                if date < start {
                    continue;
                }
                if let Some(total) = buckets.get_mut(&date.date_naive()) {
                    *total = total.saturating_add(sale.total);
                }
            }

            buckets
                .into_iter()
                .map(|(day, total)| {
                    let key = day.format("%Y-%m-%d").to_string();
                    RevenueBucket {
                        label: key.clone(),
                        key,
                        total: round2(total),
                    }
                })
                .collect()
        }
        BucketGranularity::Month => {
            let mut buckets: BTreeMap<(i32, u32), Decimal> = BTreeMap::new();
            let (mut year, mut month) = (start.year(), start.month());
            while (year, month) <= (now.year(), now.month()) {
                buckets.insert((year, month), Decimal::ZERO);
                (year, month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
            }

            for (sale, date) in dated(sales) {
                if date < start {
                    continue;
                }
                if let Some(total) = buckets.get_mut(&(date.year(), date.month())) {
                    *total = total.saturating_add(sale.total);
                }
            }

            buckets
                .into_iter()
                .map(|((year, month), total)| RevenueBucket {
                    key: format!("{:04}-{:02}", year, month),
                    label: month_name(month),
                    total: round2(total),
                })
                .collect()
        }
    }
}

fn month_name(month: u32) -> String {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name().to_string())
        .unwrap_or_else(|| month.to_string())
}
