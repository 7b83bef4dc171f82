// src/db/company_repo.rs

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgRow, types::Json, PgPool, Row};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::company::{
        Client, ClientCategory, Company, CompanyProjection, DocumentId, InventoryStatField,
        InventoryStats,
    },
};

/// Tamanho da página usada pelo cursor que percorre todos os tenants.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Uma linha lida durante a varredura. O documento pode estar malformado
/// sem que isso derrube a página inteira.
#[derive(Debug)]
pub struct ScannedCompany {
    pub id: Uuid,
    pub company: Result<Company, AppError>,
}

/// Operações de documento que o motor de recálculo consome.
/// Atualizações são sempre direcionadas a campos; nunca substituem o documento inteiro.
#[async_trait]
pub trait CompanyStore: Send + Sync {
    async fn insert_company(&self, company: &Company) -> Result<(), AppError>;

    async fn find_company(
        &self,
        id: Uuid,
        projection: CompanyProjection,
    ) -> Result<Option<Company>, AppError>;

    /// Página ordenada por id, começando depois de `after`.
    async fn fetch_page(
        &self,
        projection: CompanyProjection,
        after: Option<Uuid>,
        limit: usize,
    ) -> Result<Vec<ScannedCompany>, AppError>;

    /// `inventoryStats.<campo>` + `updatedAt`. Erro `CompanyNotFound` se nada casar.
    async fn set_inventory_stat(
        &self,
        id: Uuid,
        field: InventoryStatField,
        value: Value,
    ) -> Result<(), AppError>;

    async fn set_average_satisfaction(&self, id: Uuid, value: f64) -> Result<(), AppError>;

    /// Atualiza `category` de cada cliente presente no mapa, elemento a elemento.
    /// Clientes fora do mapa (ex.: inseridos durante o recálculo) ficam intactos.
    async fn set_client_categories(
        &self,
        id: Uuid,
        categories: &HashMap<DocumentId, ClientCategory>,
    ) -> Result<(), AppError>;

    async fn push_client(&self, id: Uuid, client: &Client) -> Result<(), AppError>;

    async fn delete_company(&self, id: Uuid) -> Result<bool, AppError>;
}

/// Falha ao ler um item da varredura.
#[derive(Debug)]
pub struct ScanError {
    // None quando a própria página falhou (transporte)
    pub company_id: Option<Uuid>,
    pub error: AppError,
}

/// Cursor sobre todos os tenants, paginado por id.
pub struct CompanyCursor<'a> {
    store: &'a dyn CompanyStore,
    projection: CompanyProjection,
    page_size: usize,
    last_id: Option<Uuid>,
    buffer: VecDeque<ScannedCompany>,
    exhausted: bool,
}

impl<'a> CompanyCursor<'a> {
    pub fn new(store: &'a dyn CompanyStore, projection: CompanyProjection) -> Self {
        Self {
            store,
            projection,
            page_size: DEFAULT_PAGE_SIZE,
            last_id: None,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Próximo tenant. Uma falha de página encerra o cursor depois de ser reportada.
    pub async fn next(&mut self) -> Option<Result<Company, ScanError>> {
        loop {
            if let Some(scanned) = self.buffer.pop_front() {
                let id = scanned.id;
                return Some(scanned.company.map_err(|error| ScanError {
                    company_id: Some(id),
                    error,
                }));
            }

            if self.exhausted {
                return None;
            }

            match self
                .store
                .fetch_page(self.projection, self.last_id, self.page_size)
                .await
            {
                Ok(page) => {
                    if page.len() < self.page_size {
                        self.exhausted = true;
                    }
                    match page.last() {
                        Some(last) => self.last_id = Some(last.id),
                        None => return None,
                    }
                    self.buffer.extend(page);
                }
                Err(error) => {
                    self.exhausted = true;
                    return Some(Err(ScanError {
                        company_id: None,
                        error,
                    }));
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
//  Implementação Postgres (arrays embutidos em colunas JSONB)
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PgCompanyStore {
    pool: PgPool,
}

impl PgCompanyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Colunas projetadas: arrays não pedidos voltam vazios do próprio banco
const PROJECTED_COLUMNS: &str = r#"
    id, name,
    CASE WHEN $1 THEN clients ELSE '[]'::jsonb END AS clients,
    CASE WHEN $2 THEN inventory ELSE '[]'::jsonb END AS inventory,
    CASE WHEN $3 THEN sales ELSE '[]'::jsonb END AS sales,
    inventory_stats, average_satisfaction, created_at, updated_at
"#;

fn decode_json<T: serde::de::DeserializeOwned>(row: &PgRow, column: &str) -> Result<T, AppError> {
    let Json(raw): Json<Value> = row.try_get(column)?;
    serde_json::from_value(raw)
        .map_err(|e| AppError::MalformedDocument(format!("{}: {}", column, e)))
}

fn company_from_row(row: &PgRow) -> Result<Company, AppError> {
    let inventory_stats: InventoryStats = decode_json(row, "inventory_stats")?;

    Ok(Company {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        clients: decode_json(row, "clients")?,
        inventory: decode_json(row, "inventory")?,
        sales: decode_json(row, "sales")?,
        inventory_stats,
        average_satisfaction: row.try_get("average_satisfaction")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

// Id do cliente dentro do JSONB, nas mesmas formas que `DocumentId` aceita:
// "id", "_id" como string ou "_id": {"$oid": ...}
const CLIENT_ID_SQL: &str = "COALESCE(t.c->>'id', t.c->'_id'->>'$oid', t.c->>'_id')";

fn ensure_matched(rows_affected: u64) -> Result<(), AppError> {
    if rows_affected == 0 {
        return Err(AppError::CompanyNotFound);
    }
    Ok(())
}

#[async_trait]
impl CompanyStore for PgCompanyStore {
    async fn insert_company(&self, company: &Company) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO companies (
                id, name, clients, inventory, sales,
                inventory_stats, average_satisfaction, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
            .bind(company.id)
            .bind(&company.name)
            .bind(Json(&company.clients))
            .bind(Json(&company.inventory))
            .bind(Json(&company.sales))
            .bind(Json(&company.inventory_stats))
            .bind(company.average_satisfaction)
            .bind(company.created_at)
            .bind(company.updated_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn find_company(
        &self,
        id: Uuid,
        projection: CompanyProjection,
    ) -> Result<Option<Company>, AppError> {
        let sql = format!("SELECT {} FROM companies WHERE id = $4", PROJECTED_COLUMNS);

        let row = sqlx::query(&sql)
            .bind(projection.clients)
            .bind(projection.inventory)
            .bind(projection.sales)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(company_from_row).transpose()
    }

    async fn fetch_page(
        &self,
        projection: CompanyProjection,
        after: Option<Uuid>,
        limit: usize,
    ) -> Result<Vec<ScannedCompany>, AppError> {
        let sql = format!(
            "SELECT {} FROM companies WHERE ($4::uuid IS NULL OR id > $4) ORDER BY id LIMIT $5",
            PROJECTED_COLUMNS
        );

        let rows = sqlx::query(&sql)
            .bind(projection.clients)
            .bind(projection.inventory)
            .bind(projection.sales)
            .bind(after)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<ScannedCompany, AppError> {
                let id: Uuid = row.try_get("id")?;
                Ok(ScannedCompany {
                    id,
                    company: company_from_row(row),
                })
            })
            .collect()
    }

    async fn set_inventory_stat(
        &self,
        id: Uuid,
        field: InventoryStatField,
        value: Value,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE companies
            SET inventory_stats = jsonb_set(COALESCE(inventory_stats, '{}'::jsonb), ARRAY[$2::text], $3::jsonb, true),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
            .bind(id)
            .bind(field.key())
            .bind(Json(value))
            .execute(&self.pool)
            .await?;

        ensure_matched(result.rows_affected())
    }

    async fn set_average_satisfaction(&self, id: Uuid, value: f64) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE companies
            SET average_satisfaction = $2,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
            .bind(id)
            .bind(value)
            .execute(&self.pool)
            .await?;

        ensure_matched(result.rows_affected())
    }

    async fn set_client_categories(
        &self,
        id: Uuid,
        categories: &HashMap<DocumentId, ClientCategory>,
    ) -> Result<(), AppError> {
        let mapping: serde_json::Map<String, Value> = categories
            .iter()
            .map(|(client_id, category)| {
                (client_id.as_str().to_string(), Value::from(category.as_str()))
            })
            .collect();

        // Reescreve o array a partir do valor ATUAL da linha (não do snapshot lido),
        // tocando só category/updatedAt dos clientes do mapa.
        let sql = format!(
            r#"
            UPDATE companies
            SET clients = COALESCE((
                    SELECT jsonb_agg(
                        CASE
                            WHEN $2::jsonb ? {key}
                            THEN t.c || jsonb_build_object(
                                'category', $2::jsonb -> {key},
                                'updatedAt', to_jsonb(NOW())
                            )
                            ELSE t.c
                        END
                        ORDER BY t.ord
                    )
                    FROM jsonb_array_elements(clients) WITH ORDINALITY AS t(c, ord)
                ), '[]'::jsonb),
                updated_at = NOW()
            WHERE id = $1
            "#,
            key = CLIENT_ID_SQL
        );

        let result = sqlx::query(&sql)
            .bind(id)
            .bind(Json(Value::Object(mapping)))
            .execute(&self.pool)
            .await?;

        ensure_matched(result.rows_affected())
    }

    async fn push_client(&self, id: Uuid, client: &Client) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE companies
            SET clients = clients || jsonb_build_array($2::jsonb),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
            .bind(id)
            .bind(Json(client))
            .execute(&self.pool)
            .await?;

        ensure_matched(result.rows_affected())
    }

    async fn delete_company(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM companies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
