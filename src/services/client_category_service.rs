// src/services/client_category_service.rs

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use crate::{
    db::{company_repo::DEFAULT_PAGE_SIZE, CompanyStore},
    models::{
        company::{ClientCategory, Company, CompanyProjection, DocumentId},
        recalculation::BatchSummary,
    },
    services::recalculation::run_batch,
};

pub const CATEGORY_WINDOW_DAYS: i64 = 90;

const VIP_SCORE: Decimal = Decimal::TEN;
const PREMIUM_SCORE: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// `gasto / 1000 + compras × 0.5`
pub fn category_score(total_spent: Decimal, purchases: usize) -> Decimal {
    total_spent / Decimal::ONE_THOUSAND + Decimal::from(purchases) * Decimal::new(5, 1)
}

pub fn category_for_score(score: Decimal) -> ClientCategory {
    if score >= VIP_SCORE {
        ClientCategory::Vip
    } else if score >= PREMIUM_SCORE {
        ClientCategory::Premium
    } else {
        ClientCategory::Regular
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct ClientActivity {
    spent: Decimal,
    purchases: usize,
}

/// Nova categoria de cada cliente do tenant, pelas vendas dos últimos 90 dias.
/// Cliente sem vendas na janela fica `regular`.
pub fn compute_client_categories(
    company: &Company,
    now: DateTime<Utc>,
) -> HashMap<DocumentId, ClientCategory> {
    let cutoff = now - Duration::days(CATEGORY_WINDOW_DAYS);

    let mut activity: HashMap<String, ClientActivity> = HashMap::new();
    for sale in &company.sales {
        let (Some(client_id), Some(date)) = (&sale.client_id, sale.date) else {
            continue;
        };
        if date < cutoff {
            continue;
        }
        let entry = activity.entry(client_id.canonical()).or_default();
        entry.spent = entry.spent.saturating_add(sale.total);
        entry.purchases += 1;
    }

    company
        .clients
        .iter()
        .map(|client| {
            let stats = activity
                .get(&client.id.canonical())
                .copied()
                .unwrap_or_default();
            let category = category_for_score(category_score(stats.spent, stats.purchases));
            (client.id.clone(), category)
        })
        .collect()
}

#[derive(Clone)]
pub struct ClientCategoryService {
    store: Arc<dyn CompanyStore>,
    page_size: usize,
}

impl ClientCategoryService {
    pub fn new(store: Arc<dyn CompanyStore>) -> Self {
        Self {
            store,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Recategoriza os clientes de todos os tenants.
    ///
    /// A escrita altera só o campo `category` de cada cliente já existente; clientes
    /// inseridos durante a leitura continuam no array.
    pub async fn update_all_clients(&self) -> BatchSummary {
        let store = self.store.as_ref();

        run_batch(
            store,
            "client_category",
            CompanyProjection::CLIENTS_AND_SALES,
            self.page_size,
            |company| async move {
                if company.clients.is_empty() {
                    return Ok(());
                }
                let categories = compute_client_categories(&company, Utc::now());
                store.set_client_categories(company.id, &categories).await
            },
        )
            .await
    }
}
