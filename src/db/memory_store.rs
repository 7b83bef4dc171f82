// src/db/memory_store.rs

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::company_repo::{CompanyStore, ScannedCompany},
    models::company::{
        Client, ClientCategory, Company, CompanyProjection, DocumentId, InventoryStatField,
    },
};

/// Store em memória com a mesma semântica do Postgres (projeção, updates direcionados).
/// Usado nos testes e em execuções locais sem banco.
#[derive(Default)]
pub struct InMemoryCompanyStore {
    companies: RwLock<BTreeMap<Uuid, Company>>,
}

impl InMemoryCompanyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_companies(companies: impl IntoIterator<Item = Company>) -> Self {
        let map = companies.into_iter().map(|c| (c.id, c)).collect();
        Self {
            companies: RwLock::new(map),
        }
    }

    /// Cópia completa do documento, sem projeção.
    pub async fn snapshot(&self, id: Uuid) -> Option<Company> {
        self.companies.read().await.get(&id).cloned()
    }
}

#[async_trait]
impl CompanyStore for InMemoryCompanyStore {
    async fn insert_company(&self, company: &Company) -> Result<(), AppError> {
        self.companies
            .write()
            .await
            .insert(company.id, company.clone());
        Ok(())
    }

    async fn find_company(
        &self,
        id: Uuid,
        projection: CompanyProjection,
    ) -> Result<Option<Company>, AppError> {
        Ok(self
            .companies
            .read()
            .await
            .get(&id)
            .cloned()
            .map(|c| c.project(projection)))
    }

    async fn fetch_page(
        &self,
        projection: CompanyProjection,
        after: Option<Uuid>,
        limit: usize,
    ) -> Result<Vec<ScannedCompany>, AppError> {
        let companies = self.companies.read().await;
        let lower = match after {
            Some(id) => Bound::Excluded(id),
            None => Bound::Unbounded,
        };

        Ok(companies
            .range((lower, Bound::Unbounded))
            .take(limit)
            .map(|(id, company)| ScannedCompany {
                id: *id,
                company: Ok(company.clone().project(projection)),
            })
            .collect())
    }

    async fn set_inventory_stat(
        &self,
        id: Uuid,
        field: InventoryStatField,
        value: Value,
    ) -> Result<(), AppError> {
        let mut companies = self.companies.write().await;
        let company = companies.get_mut(&id).ok_or(AppError::CompanyNotFound)?;

        let stats = &mut company.inventory_stats;
        match field {
            InventoryStatField::TotalProducts => stats.total_products = serde_json::from_value(value)?,
            InventoryStatField::LowInventory => stats.low_inventory = serde_json::from_value(value)?,
            InventoryStatField::CriticalInventory => {
                stats.critical_inventory = serde_json::from_value(value)?
            }
            InventoryStatField::TotalValue => stats.total_value = serde_json::from_value(value)?,
        }
        company.updated_at = Utc::now();
        Ok(())
    }

    async fn set_average_satisfaction(&self, id: Uuid, value: f64) -> Result<(), AppError> {
        let mut companies = self.companies.write().await;
        let company = companies.get_mut(&id).ok_or(AppError::CompanyNotFound)?;

        company.average_satisfaction = value;
        company.updated_at = Utc::now();
        Ok(())
    }

    async fn set_client_categories(
        &self,
        id: Uuid,
        categories: &HashMap<DocumentId, ClientCategory>,
    ) -> Result<(), AppError> {
        let mut companies = self.companies.write().await;
        let company = companies.get_mut(&id).ok_or(AppError::CompanyNotFound)?;

        let now = Utc::now();
        for client in company.clients.iter_mut() {
            if let Some(category) = categories.get(&client.id) {
                client.category = *category;
                client.updated_at = Some(now);
            }
        }
        company.updated_at = now;
        Ok(())
    }

    async fn push_client(&self, id: Uuid, client: &Client) -> Result<(), AppError> {
        let mut companies = self.companies.write().await;
        let company = companies.get_mut(&id).ok_or(AppError::CompanyNotFound)?;

        company.clients.push(client.clone());
        company.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_company(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(self.companies.write().await.remove(&id).is_some())
    }
}
