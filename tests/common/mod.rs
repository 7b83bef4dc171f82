// tests/common/mod.rs

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use business_metrics::{
    common::error::AppError,
    db::{CompanyStore, InMemoryCompanyStore, ScannedCompany},
    models::company::{
        Client, ClientCategory, Company, CompanyProjection, DocumentId, InventoryStatField, Product,
        Sale, SaleItem,
    },
};

pub fn product(name: &str, category: &str, quantity: i64, min_quantity: i64) -> Product {
    Product::new(
        name,
        category,
        Decimal::from(20),
        Decimal::from(12),
        quantity,
        min_quantity,
    )
}

pub fn sale(client: &Client, product: &Product, quantity: i64, date: DateTime<Utc>) -> Sale {
    Sale::new(
        Some(client.id.clone()),
        vec![SaleItem::new(product.id.clone(), quantity, product.price)],
        date,
    )
}

/// Venda com um único item de valor `total`.
pub fn sale_worth(client: &Client, total: i64, date: DateTime<Utc>) -> Sale {
    Sale::new(
        Some(client.id.clone()),
        vec![SaleItem::new(DocumentId::generate(), 1, Decimal::from(total))],
        date,
    )
}

/// Tenant com estoque variado, dois clientes e vendas recentes.
pub fn sample_company(name: &str) -> Company {
    let now = Utc::now();
    let mut company = Company::new(name);

    let ana = Client::new("Ana");
    let bruno = Client::new("Bruno");

    let caneca = product("Caneca", "Cozinha", 40, 5);
    let faca = product("Faca", "Cozinha", 5, 5);
    let vaso = product("Vaso", "Decoração", 12, 5);
    let quadro = product("Quadro", "Decoração", 0, 1);

    company.sales = vec![
        sale(&ana, &caneca, 2, now - Duration::hours(1)),
        sale(&ana, &vaso, 1, now - Duration::days(4)),
        sale(&bruno, &faca, 3, now - Duration::days(20)),
    ];
    company.inventory = vec![caneca, faca, vaso, quadro];
    company.clients = vec![ana, bruno];
    company
}

pub fn store_with(companies: impl IntoIterator<Item = Company>) -> Arc<InMemoryCompanyStore> {
    Arc::new(InMemoryCompanyStore::with_companies(companies))
}

/// Ação disparada logo depois que uma página foi lida, antes das escritas do lote.
#[derive(Debug, Clone)]
pub enum AfterPage {
    Delete(Uuid),
    PushClient(Uuid, Client),
}

/// Store que simula escritas concorrentes entre a leitura e a escrita de um lote.
pub struct InterferingStore {
    pub inner: Arc<InMemoryCompanyStore>,
    pending: Mutex<Vec<AfterPage>>,
}

impl InterferingStore {
    pub fn new(inner: Arc<InMemoryCompanyStore>, actions: Vec<AfterPage>) -> Self {
        Self {
            inner,
            pending: Mutex::new(actions),
        }
    }
}

#[async_trait]
impl CompanyStore for InterferingStore {
    async fn insert_company(&self, company: &Company) -> Result<(), AppError> {
        self.inner.insert_company(company).await
    }

    async fn find_company(
        &self,
        id: Uuid,
        projection: CompanyProjection,
    ) -> Result<Option<Company>, AppError> {
        self.inner.find_company(id, projection).await
    }

    async fn fetch_page(
        &self,
        projection: CompanyProjection,
        after: Option<Uuid>,
        limit: usize,
    ) -> Result<Vec<ScannedCompany>, AppError> {
        let page = self.inner.fetch_page(projection, after, limit).await?;

        let actions: Vec<AfterPage> = self.pending.lock().await.drain(..).collect();
        for action in actions {
            match action {
                AfterPage::Delete(id) => {
                    self.inner.delete_company(id).await?;
                }
                AfterPage::PushClient(id, client) => self.inner.push_client(id, &client).await?,
            }
        }

        Ok(page)
    }

    async fn set_inventory_stat(
        &self,
        id: Uuid,
        field: InventoryStatField,
        value: Value,
    ) -> Result<(), AppError> {
        self.inner.set_inventory_stat(id, field, value).await
    }

    async fn set_average_satisfaction(&self, id: Uuid, value: f64) -> Result<(), AppError> {
        self.inner.set_average_satisfaction(id, value).await
    }

    async fn set_client_categories(
        &self,
        id: Uuid,
        categories: &HashMap<DocumentId, ClientCategory>,
    ) -> Result<(), AppError> {
        self.inner.set_client_categories(id, categories).await
    }

    async fn push_client(&self, id: Uuid, client: &Client) -> Result<(), AppError> {
        self.inner.push_client(id, client).await
    }

    async fn delete_company(&self, id: Uuid) -> Result<bool, AppError> {
        self.inner.delete_company(id).await
    }
}
