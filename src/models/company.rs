// src/models/company.rs

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{common::money::saturating_sum, models::lenient};

// --- IDs dos sub-documentos ---
// Referência fraca: uma venda pode apontar para cliente/produto já removido.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, ToSchema)]
#[schema(value_type = String)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Gera um novo ID para um sub-documento embutido.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Forma canônica usada na segunda tentativa de resolução (hex/uuid não diferenciam caixa).
    pub fn canonical(&self) -> String {
        self.0.trim().to_ascii_lowercase()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for DocumentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(Self(s)),
            Value::Number(n) => Ok(Self(n.to_string())),
            Value::Object(map) => match map.get("$oid") {
                Some(Value::String(s)) => Ok(Self(s.clone())),
                _ => Err(serde::de::Error::custom("ID em formato desconhecido")),
            },
            _ => Err(serde::de::Error::custom("ID em formato desconhecido")),
        }
    }
}

// --- Categoria do Cliente ---
// Mutada apenas pelo job de recálculo de categorias.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ToSchema)]
pub enum ClientCategory {
    #[default]
    Regular,
    Premium,
    Vip,
}

impl ClientCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientCategory::Regular => "regular",
            ClientCategory::Premium => "premium",
            ClientCategory::Vip => "VIP",
        }
    }
}

impl Serialize for ClientCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ClientCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Valores desconhecidos caem em "regular"; o próximo recálculo corrige
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        Ok(match raw.trim().to_ascii_lowercase().as_str() {
            "vip" => ClientCategory::Vip,
            "premium" => ClientCategory::Premium,
            _ => ClientCategory::Regular,
        })
    }
}

// --- Cliente (embutido na Company) ---
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(alias = "_id")]
    pub id: DocumentId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub category: ClientCategory,
    #[serde(default, alias = "created_at", deserialize_with = "lenient::optional_datetime")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::optional_datetime")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Client {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: DocumentId::generate(),
            name: name.into(),
            email: None,
            phone: None,
            address: None,
            category: ClientCategory::Regular,
            created_at: Some(Utc::now()),
            updated_at: None,
        }
    }
}

// --- Produto (embutido) ---
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(alias = "_id")]
    pub id: DocumentId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    // Preço de venda unitário
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub price: Decimal,
    // Custo de aquisição unitário
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub cost_price: Decimal,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub quantity: i64,
    // Ponto de reposição
    #[serde(default, deserialize_with = "lenient::integer")]
    pub min_quantity: i64,
    #[serde(default, deserialize_with = "lenient::optional_datetime")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        price: Decimal,
        cost_price: Decimal,
        quantity: i64,
        min_quantity: i64,
    ) -> Self {
        Self {
            id: DocumentId::generate(),
            name: name.into(),
            description: None,
            category: Some(category.into()),
            price,
            cost_price,
            quantity,
            min_quantity,
            created_at: Some(Utc::now()),
        }
    }
}

// --- Venda (embutida) ---
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    #[serde(default)]
    pub product_id: Option<DocumentId>,
    // Vendas antigas guardavam só o nome do produto
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::integer")]
    pub quantity: i64,
    // Preço unitário no momento da venda
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub price: Decimal,
}

impl SaleItem {
    pub fn new(product_id: DocumentId, quantity: i64, price: Decimal) -> Self {
        Self {
            product_id: Some(product_id),
            product_name: None,
            quantity,
            price,
        }
    }

    pub fn line_total(&self) -> Decimal {
        Decimal::from(self.quantity).saturating_mul(self.price)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    #[serde(default, alias = "_id")]
    pub id: Option<DocumentId>,
    #[serde(default)]
    pub client_id: Option<DocumentId>,
    #[serde(default)]
    pub items: Vec<SaleItem>,
    // Calculado na criação; nunca recalculado se o preço do produto mudar
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub total: Decimal,
    #[serde(default, deserialize_with = "lenient::optional_datetime")]
    pub date: Option<DateTime<Utc>>,
}

impl Sale {
    /// Registra uma venda fixando `total = Σ quantidade × preço` neste instante.
    pub fn new(client_id: Option<DocumentId>, items: Vec<SaleItem>, date: DateTime<Utc>) -> Self {
        let total = saturating_sum(items.iter().map(SaleItem::line_total));
        Self {
            id: Some(DocumentId::generate()),
            client_id,
            items,
            total,
            date: Some(date),
        }
    }
}

// --- Agregados derivados (cache, eventualmente consistente) ---
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct InventoryStats {
    pub total_products: i64,
    pub low_inventory: i64,
    pub critical_inventory: i64,
    pub total_value: Decimal,
}

// --- Tenant ---
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub inventory: Vec<Product>,
    #[serde(default)]
    pub sales: Vec<Sale>,
    #[serde(default)]
    pub inventory_stats: InventoryStats,
    #[serde(default, rename = "average_satisfaction")]
    pub average_satisfaction: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            clients: Vec::new(),
            inventory: Vec::new(),
            sales: Vec::new(),
            inventory_stats: InventoryStats::default(),
            average_satisfaction: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Descarta os arrays que a projeção não pediu.
    pub fn project(mut self, projection: CompanyProjection) -> Self {
        if !projection.clients {
            self.clients.clear();
        }
        if !projection.inventory {
            self.inventory.clear();
        }
        if !projection.sales {
            self.sales.clear();
        }
        self
    }
}

/// Quais arrays embutidos uma leitura precisa carregar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompanyProjection {
    pub clients: bool,
    pub inventory: bool,
    pub sales: bool,
}

impl CompanyProjection {
    pub const FULL: Self = Self { clients: true, inventory: true, sales: true };
    pub const INVENTORY: Self = Self { clients: false, inventory: true, sales: false };
    pub const CLIENTS_AND_SALES: Self = Self { clients: true, inventory: false, sales: true };
}

// Campos de `inventoryStats` que os jobs atualizam individualmente.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryStatField {
    TotalProducts,
    LowInventory,
    CriticalInventory,
    TotalValue,
}

impl InventoryStatField {
    /// Nome da chave dentro de `inventoryStats`.
    pub fn key(&self) -> &'static str {
        match self {
            InventoryStatField::TotalProducts => "totalProducts",
            InventoryStatField::LowInventory => "lowInventory",
            InventoryStatField::CriticalInventory => "criticalInventory",
            InventoryStatField::TotalValue => "totalValue",
        }
    }
}
