// src/services/inventory_metrics_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    common::{error::AppError, money::round2},
    db::{company_repo::DEFAULT_PAGE_SIZE, CompanyStore},
    models::{
        company::{CompanyProjection, InventoryStatField, InventoryStats, Product},
        recalculation::BatchSummary,
        report::StockStatus,
    },
    services::recalculation::run_batch,
};

/// Faixa fixa acima do ponto de reposição que conta como estoque baixo.
// Decisão de produto em aberto: hoje não escala com minQuantity nem é por tenant.
pub const LOW_STOCK_BAND: i64 = 10;

// --- Regras de estoque ---

/// `quantity <= minQuantity`
pub fn is_critical_stock(product: &Product) -> bool {
    product.quantity <= product.min_quantity
}

/// `minQuantity < quantity <= minQuantity + 10`. Nunca se sobrepõe ao crítico.
pub fn is_low_stock(product: &Product) -> bool {
    product.quantity > product.min_quantity
        && product.quantity <= product.min_quantity.saturating_add(LOW_STOCK_BAND)
}

pub fn stock_status(product: &Product) -> StockStatus {
    if product.quantity <= 0 {
        StockStatus::Esgotado
    } else if is_critical_stock(product) {
        StockStatus::Critico
    } else if is_low_stock(product) {
        StockStatus::Baixo
    } else {
        StockStatus::Normal
    }
}

/// Valor investido no produto (base custo).
pub fn stock_value(product: &Product) -> Result<Decimal, AppError> {
    Decimal::from(product.quantity)
        .checked_mul(product.cost_price)
        .ok_or_else(|| AppError::NumericOverflow(format!("valor em estoque do produto {}", product.id)))
}

/// Estouro vira erro do tenant; o lote segue para os demais.
pub fn total_inventory_value(inventory: &[Product]) -> Result<Decimal, AppError> {
    let total = inventory.iter().try_fold(Decimal::ZERO, |acc, product| {
        acc.checked_add(stock_value(product)?)
            .ok_or_else(|| AppError::NumericOverflow("valor total do estoque".to_string()))
    })?;
    Ok(round2(total))
}

pub fn compute_inventory_stats(inventory: &[Product]) -> Result<InventoryStats, AppError> {
    Ok(InventoryStats {
        total_products: inventory.len() as i64,
        low_inventory: inventory.iter().filter(|p| is_low_stock(p)).count() as i64,
        critical_inventory: inventory.iter().filter(|p| is_critical_stock(p)).count() as i64,
        total_value: total_inventory_value(inventory)?,
    })
}

/// Cada métrica de `inventoryStats` é recalculada por um job próprio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryMetric {
    TotalProducts,
    LowInventory,
    CriticalInventory,
    TotalValue,
}

impl InventoryMetric {
    pub const ALL: [InventoryMetric; 4] = [
        InventoryMetric::TotalProducts,
        InventoryMetric::LowInventory,
        InventoryMetric::CriticalInventory,
        InventoryMetric::TotalValue,
    ];

    pub fn field(&self) -> InventoryStatField {
        match self {
            InventoryMetric::TotalProducts => InventoryStatField::TotalProducts,
            InventoryMetric::LowInventory => InventoryStatField::LowInventory,
            InventoryMetric::CriticalInventory => InventoryStatField::CriticalInventory,
            InventoryMetric::TotalValue => InventoryStatField::TotalValue,
        }
    }

    pub fn job_name(&self) -> &'static str {
        match self {
            InventoryMetric::TotalProducts => "inventory_total_products",
            InventoryMetric::LowInventory => "inventory_low",
            InventoryMetric::CriticalInventory => "inventory_critical",
            InventoryMetric::TotalValue => "inventory_total_value",
        }
    }

    /// Valor a gravar em `inventoryStats.<campo>`.
    pub fn compute(&self, inventory: &[Product]) -> Result<Value, AppError> {
        Ok(match self {
            InventoryMetric::TotalProducts => json!(inventory.len() as i64),
            InventoryMetric::LowInventory => {
                json!(inventory.iter().filter(|p| is_low_stock(p)).count() as i64)
            }
            InventoryMetric::CriticalInventory => {
                json!(inventory.iter().filter(|p| is_critical_stock(p)).count() as i64)
            }
            InventoryMetric::TotalValue => json!(total_inventory_value(inventory)?),
        })
    }
}

#[derive(Clone)]
pub struct InventoryMetricsService {
    store: Arc<dyn CompanyStore>,
    page_size: usize,
}

impl InventoryMetricsService {
    pub fn new(store: Arc<dyn CompanyStore>) -> Self {
        Self {
            store,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Tamanho da página da varredura de tenants.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Rotina de background: recalcula uma métrica para todos os tenants.
    pub async fn recalc_all_companies(&self, metric: InventoryMetric) -> BatchSummary {
        let store = self.store.as_ref();

        run_batch(
            store,
            metric.job_name(),
            CompanyProjection::INVENTORY,
            self.page_size,
            |company| async move {
                let value = metric.compute(&company.inventory)?;
                store.set_inventory_stat(company.id, metric.field(), value).await
            },
        )
            .await
    }

    /// Recalcula todas as métricas de estoque de um único tenant, sob demanda.
    pub async fn recalc_company(&self, company_id: Uuid) -> Result<InventoryStats, AppError> {
        let company = self
            .store
            .find_company(company_id, CompanyProjection::INVENTORY)
            .await?
            .ok_or(AppError::CompanyNotFound)?;

        // Calcula tudo antes de escrever: um estouro não deixa o cache pela metade
        let stats = compute_inventory_stats(&company.inventory)?;
        for metric in InventoryMetric::ALL {
            let value = metric.compute(&company.inventory)?;
            self.store
                .set_inventory_stat(company_id, metric.field(), value)
                .await?;
        }

        Ok(stats)
    }
}
