// src/services/overview_service.rs

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::{date_ranges::DateRanges, error::AppError, money::round2},
    db::CompanyStore,
    models::{
        company::{ClientCategory, Company, CompanyProjection},
        report::{
            ClientOverviewEntry, ClientSummary, ClientsOverview, InventoryOverview,
            ProductOverview,
        },
    },
    services::{
        inventory_metrics_service::{compute_inventory_stats, stock_status, stock_value},
        sales_metrics::UNKNOWN_CATEGORY,
    },
};

pub fn build_inventory_overview(company: &Company) -> Result<InventoryOverview, AppError> {
    let products = company
        .inventory
        .iter()
        .map(|p| -> Result<ProductOverview, AppError> {
            Ok(ProductOverview {
                id: p.id.clone(),
                name: p.name.clone(),
                category: p
                    .category
                    .clone()
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string()),
                quantity: p.quantity,
                min_quantity: p.min_quantity,
                price: p.price,
                status: stock_status(p),
                total_value: round2(stock_value(p)?),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(InventoryOverview {
        // sempre calculado na hora; o cache em inventoryStats pode estar atrasado
        stats: compute_inventory_stats(&company.inventory)?,
        products,
    })
}

#[derive(Default)]
struct Purchases {
    spent: Decimal,
    last: Option<DateTime<Utc>>,
}

pub fn build_clients_overview(company: &Company, now: DateTime<Utc>) -> ClientsOverview {
    let month_start = DateRanges::from_now(now).month_start;

    let mut purchases: HashMap<String, Purchases> = HashMap::new();
    for sale in &company.sales {
        let Some(client_id) = &sale.client_id else {
            continue;
        };
        let entry = purchases.entry(client_id.canonical()).or_default();
        entry.spent = entry.spent.saturating_add(sale.total);
        if let Some(date) = sale.date {
            if entry.last.is_none_or(|last| date > last) {
                entry.last = Some(date);
            }
        }
    }

    let clients = company
        .clients
        .iter()
        .map(|c| {
            let history = purchases.get(&c.id.canonical());
            ClientOverviewEntry {
                id: c.id.clone(),
                name: c.name.clone(),
                email: c.email.clone(),
                phone: c.phone.clone(),
                address: c.address.clone(),
                category: c.category,
                total_spent: round2(history.map(|h| h.spent).unwrap_or_default()),
                last_purchase: history
                    .and_then(|h| h.last)
                    .map(|d| d.format("%Y-%m-%d").to_string()),
            }
        })
        .collect();

    ClientsOverview {
        overview: ClientSummary {
            total: company.clients.len(),
            vip: company
                .clients
                .iter()
                .filter(|c| c.category == ClientCategory::Vip)
                .count(),
            new_this_month: company
                .clients
                .iter()
                .filter(|c| c.created_at.is_some_and(|d| d >= month_start))
                .count(),
            average_satisfaction: company.average_satisfaction,
        },
        clients,
    }
}

#[derive(Clone)]
pub struct OverviewService {
    store: Arc<dyn CompanyStore>,
}

impl OverviewService {
    pub fn new(store: Arc<dyn CompanyStore>) -> Self {
        Self { store }
    }

    pub async fn get_inventory_overview(&self, company_id: Uuid) -> Result<InventoryOverview, AppError> {
        let company = self
            .store
            .find_company(company_id, CompanyProjection::INVENTORY)
            .await?
            .ok_or(AppError::CompanyNotFound)?;

        build_inventory_overview(&company)
    }

    pub async fn get_clients_overview(&self, company_id: Uuid) -> Result<ClientsOverview, AppError> {
        let company = self
            .store
            .find_company(company_id, CompanyProjection::CLIENTS_AND_SALES)
            .await?
            .ok_or(AppError::CompanyNotFound)?;

        Ok(build_clients_overview(&company, Utc::now()))
    }
}
