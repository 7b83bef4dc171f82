// src/config.rs

use crate::{
    db::{company_repo::DEFAULT_PAGE_SIZE, CompanyStore, PgCompanyStore},
    services::{
        ClientCategoryService, InventoryMetricsService, OverviewService, SalesAnalyticsService,
        SatisfactionParams, SatisfactionService,
    },
};
use anyhow::{bail, Context};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, fmt::Display, str::FromStr, sync::Arc, time::Duration};

/// Intervalo + atraso inicial de um job periódico.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobSchedule {
    pub every: Duration,
    pub initial_delay: Duration,
}

// Maior intervalo aceito para um job periódico: 365 dias
const MAX_INTERVAL_MINUTES: u64 = 365 * 24 * 60;

impl JobSchedule {
    // `every` já validado por `interval_minutes` quando vem do ambiente
    fn minutes(every: u64, offset: u64) -> Self {
        Self {
            every: Duration::from_secs(every * 60),
            initial_delay: Duration::from_secs(offset * 60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub enabled: bool,
    pub total_products: JobSchedule,
    pub low_inventory: JobSchedule,
    pub critical_inventory: JobSchedule,
    pub total_value: JobSchedule,
    pub client_category: JobSchedule,
    // (hora, minuto) em UTC
    pub satisfaction_daily_at: (u32, u32),
}

impl Default for ScheduleConfig {
    // Offsets escalonados para os jobs não baterem no banco ao mesmo tempo.
    fn default() -> Self {
        Self {
            enabled: true,
            total_products: JobSchedule::minutes(15, 0),
            low_inventory: JobSchedule::minutes(15, 2),
            critical_inventory: JobSchedule::minutes(16, 4),
            total_value: JobSchedule::minutes(16, 6),
            client_category: JobSchedule::minutes(6 * 60, 8),
            satisfaction_daily_at: (3, 0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub satisfaction: SatisfactionParams,
    pub schedule: ScheduleConfig,
    // Tenants lidos por página nas varreduras em lote
    pub batch_page_size: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;

        let defaults = SatisfactionParams::default();
        let satisfaction = SatisfactionParams {
            window_days: env_or("SAT_WINDOW_DAYS", defaults.window_days)?,
            half_life_days: env_or("SAT_HALF_LIFE_DAYS", defaults.half_life_days)?,
            repeat_cap: env_or("SAT_REPEAT_CAP", defaults.repeat_cap)?,
            weight_repeat: env_or("SAT_WEIGHT_REPEAT", defaults.weight_repeat)?,
            weight_recency: env_or("SAT_WEIGHT_RECENCY", defaults.weight_recency)?,
        };
        if satisfaction.window_days <= 0 || satisfaction.half_life_days <= 0.0 {
            bail!("SAT_WINDOW_DAYS e SAT_HALF_LIFE_DAYS devem ser positivos");
        }

        let base = ScheduleConfig::default();
        let schedule = ScheduleConfig {
            enabled: env_or("SCHEDULER_ENABLED", base.enabled)?,
            total_products: JobSchedule::minutes(interval_env("JOB_TOTAL_PRODUCTS_MINUTES", 15, 1)?, 0),
            low_inventory: JobSchedule::minutes(interval_env("JOB_LOW_INVENTORY_MINUTES", 15, 1)?, 2),
            critical_inventory: JobSchedule::minutes(
                interval_env("JOB_CRITICAL_INVENTORY_MINUTES", 16, 1)?,
                4,
            ),
            total_value: JobSchedule::minutes(interval_env("JOB_TOTAL_VALUE_MINUTES", 16, 1)?, 6),
            client_category: JobSchedule::minutes(
                interval_env("JOB_CLIENT_CATEGORY_HOURS", 6, 60)?,
                8,
            ),
            satisfaction_daily_at: match env::var("JOB_SATISFACTION_DAILY_AT") {
                Ok(raw) => parse_daily_time(&raw)?,
                Err(_) => base.satisfaction_daily_at,
            },
        };

        let batch_page_size: usize = env_or("BATCH_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if batch_page_size == 0 {
            bail!("BATCH_PAGE_SIZE deve ser maior que zero");
        }

        Ok(Self {
            database_url,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_or("PORT", 3000)?,
            satisfaction,
            schedule,
            batch_page_size,
        })
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Valor inválido para {key} ({raw:?}): {e}")),
        Err(_) => Ok(default),
    }
}

fn interval_env(key: &str, default: u64, unit_minutes: u64) -> anyhow::Result<u64> {
    interval_minutes(key, env_or(key, default)?, unit_minutes)
}

/// Converte `value` unidades de `unit_minutes` em minutos, entre 1 minuto e 365 dias.
pub fn interval_minutes(key: &str, value: u64, unit_minutes: u64) -> anyhow::Result<u64> {
    let minutes = value
        .checked_mul(unit_minutes)
        .with_context(|| format!("{key} grande demais: {value}"))?;
    if minutes == 0 || minutes > MAX_INTERVAL_MINUTES {
        bail!("{key} deve ficar entre 1 minuto e 365 dias (recebido {value})");
    }
    Ok(minutes)
}

/// "HH:MM" -> (hora, minuto)
pub fn parse_daily_time(raw: &str) -> anyhow::Result<(u32, u32)> {
    let (hour, minute) = raw
        .trim()
        .split_once(':')
        .with_context(|| format!("Horário inválido {raw:?}, use HH:MM"))?;

    let hour: u32 = hour.parse().with_context(|| format!("Hora inválida em {raw:?}"))?;
    let minute: u32 = minute.parse().with_context(|| format!("Minuto inválido em {raw:?}"))?;
    if hour > 23 || minute > 59 {
        bail!("Horário fora do intervalo: {raw:?}");
    }
    Ok((hour, minute))
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: AppConfig,
    pub sales_analytics_service: Arc<SalesAnalyticsService>,
    pub overview_service: Arc<OverviewService>,
    pub inventory_metrics_service: Arc<InventoryMetricsService>,
    pub client_category_service: Arc<ClientCategoryService>,
    pub satisfaction_service: Arc<SatisfactionService>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        // --- Monta o gráfico de dependências ---
        let store: Arc<dyn CompanyStore> = Arc::new(PgCompanyStore::new(db_pool.clone()));

        Ok(Self {
            sales_analytics_service: Arc::new(SalesAnalyticsService::new(store.clone())),
            overview_service: Arc::new(OverviewService::new(store.clone())),
            inventory_metrics_service: Arc::new(
                InventoryMetricsService::new(store.clone()).with_page_size(config.batch_page_size),
            ),
            client_category_service: Arc::new(
                ClientCategoryService::new(store.clone()).with_page_size(config.batch_page_size),
            ),
            satisfaction_service: Arc::new(
                SatisfactionService::new(store, config.satisfaction)
                    .with_page_size(config.batch_page_size),
            ),
            db_pool,
            config,
        })
    }
}
