// src/services/satisfaction_service.rs

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::{
    common::money::round2_f64,
    db::{company_repo::DEFAULT_PAGE_SIZE, CompanyStore},
    models::{
        company::{Company, CompanyProjection},
        recalculation::BatchSummary,
    },
    services::recalculation::run_batch,
};

pub const MAX_SATISFACTION: f64 = 5.0;

/// Parâmetros do índice de satisfação. Os valores padrão vêm da configuração.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SatisfactionParams {
    pub window_days: i64,
    pub half_life_days: f64,
    // compras extras para saturar o score de recompra
    pub repeat_cap: u32,
    pub weight_repeat: f64,
    pub weight_recency: f64,
}

impl Default for SatisfactionParams {
    fn default() -> Self {
        Self {
            window_days: 90,
            half_life_days: 30.0,
            repeat_cap: 3,
            weight_repeat: 0.4,
            weight_recency: 0.6,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Engagement {
    purchases: u32,
    last_purchase: Option<DateTime<Utc>>,
}

fn client_score(engagement: &Engagement, params: &SatisfactionParams, now: DateTime<Utc>) -> f64 {
    let Some(last) = engagement.last_purchase else {
        return 0.0;
    };

    let cap = params.repeat_cap.max(1) as f64;
    let repeat = ((engagement.purchases.saturating_sub(1)) as f64 / cap).clamp(0.0, 1.0);

    // venda com data futura conta como hoje
    let days_since = ((now - last).num_seconds() as f64 / 86_400.0).max(0.0);
    let recency = (-days_since / params.half_life_days.max(f64::EPSILON)).exp();

    params.weight_repeat * repeat + params.weight_recency * recency
}

/// Índice 0..5 do tenant: média do score de todos os clientes cadastrados,
/// incluindo os que não compraram na janela (score 0).
pub fn compute_company_satisfaction(
    company: &Company,
    params: &SatisfactionParams,
    now: DateTime<Utc>,
) -> f64 {
    let mut engagement: HashMap<String, Engagement> = company
        .clients
        .iter()
        .map(|c| (c.id.canonical(), Engagement::default()))
        .collect();

    if engagement.is_empty() {
        return 0.0;
    }

    let cutoff = now - Duration::days(params.window_days);
    for sale in &company.sales {
        let (Some(client_id), Some(date)) = (&sale.client_id, sale.date) else {
            continue;
        };
        if date < cutoff {
            continue;
        }
        // venda de cliente que não está mais cadastrado é ignorada
        let Some(entry) = engagement.get_mut(&client_id.canonical()) else {
            continue;
        };
        entry.purchases += 1;
        if entry.last_purchase.is_none_or(|last| date > last) {
            entry.last_purchase = Some(date);
        }
    }

    let total: f64 = engagement
        .values()
        .map(|e| client_score(e, params, now))
        .sum();
    let mean = total / engagement.len() as f64;

    (MAX_SATISFACTION * mean).clamp(0.0, MAX_SATISFACTION)
}

#[derive(Clone)]
pub struct SatisfactionService {
    store: Arc<dyn CompanyStore>,
    params: SatisfactionParams,
    page_size: usize,
}

impl SatisfactionService {
    pub fn new(store: Arc<dyn CompanyStore>, params: SatisfactionParams) -> Self {
        Self {
            store,
            params,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Recalcula e grava `average_satisfaction` de todos os tenants.
    pub async fn update_all_companies_satisfaction(&self) -> BatchSummary {
        let store = self.store.as_ref();
        let params = self.params;

        run_batch(
            store,
            "satisfaction",
            CompanyProjection::CLIENTS_AND_SALES,
            self.page_size,
            |company| async move {
                let score = compute_company_satisfaction(&company, &params, Utc::now());
                store
                    .set_average_satisfaction(company.id, round2_f64(score))
                    .await
            },
        )
            .await
    }
}
