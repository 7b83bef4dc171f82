// tests/recalculation.rs

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use business_metrics::{
    common::error::AppError,
    db::{CompanyCursor, CompanyStore},
    models::{
        company::{Client, ClientCategory, Company, CompanyProjection},
        recalculation::BatchSummary,
    },
    services::{
        ClientCategoryService, InventoryMetric, InventoryMetricsService, SatisfactionParams,
        SatisfactionService,
    },
};
use common::{product, sale_worth, sample_company, store_with, AfterPage, InterferingStore};

#[tokio::test]
async fn inventory_jobs_write_each_stat() {
    let company = sample_company("Loja Centro");
    let id = company.id;
    let store = store_with([company]);
    let service = InventoryMetricsService::new(store.clone());

    for metric in InventoryMetric::ALL {
        let summary = service.recalc_all_companies(metric).await;
        assert_eq!(summary, BatchSummary { updated: 1, errors: 0 });
    }

    let stats = store.snapshot(id).await.unwrap().inventory_stats;
    assert_eq!(stats.total_products, 4);
    // Faca (5/5) e Quadro (0/1) são críticos; Vaso (12/5) é baixo
    assert_eq!(stats.critical_inventory, 2);
    assert_eq!(stats.low_inventory, 1);
    // (40 + 5 + 12 + 0) × 12
    assert_eq!(stats.total_value, Decimal::from(684));
}

#[tokio::test]
async fn low_and_critical_never_count_the_same_product() {
    let mut company = Company::new("Fronteira");
    company.inventory = (0..=20).map(|q| product("Item", "Geral", q, 5)).collect();
    let id = company.id;
    let store = store_with([company]);
    let service = InventoryMetricsService::new(store.clone());

    service.recalc_all_companies(InventoryMetric::LowInventory).await;
    service.recalc_all_companies(InventoryMetric::CriticalInventory).await;

    let stats = store.snapshot(id).await.unwrap().inventory_stats;
    // 0..=5 críticos, 6..=15 baixos
    assert_eq!(stats.critical_inventory, 6);
    assert_eq!(stats.low_inventory, 10);
    assert!(stats.low_inventory + stats.critical_inventory <= 21);
}

#[tokio::test]
async fn running_twice_gives_the_same_values() {
    let companies: Vec<Company> = (0..3).map(|i| sample_company(&format!("Loja {i}"))).collect();
    let ids: Vec<_> = companies.iter().map(|c| c.id).collect();
    let store = store_with(companies);

    let inventory = InventoryMetricsService::new(store.clone());
    let categories = ClientCategoryService::new(store.clone());
    let satisfaction = SatisfactionService::new(store.clone(), SatisfactionParams::default());

    async fn run_all(
        inventory: &InventoryMetricsService,
        categories: &ClientCategoryService,
        satisfaction: &SatisfactionService,
    ) {
        for metric in InventoryMetric::ALL {
            inventory.recalc_all_companies(metric).await;
        }
        categories.update_all_clients().await;
        satisfaction.update_all_companies_satisfaction().await;
    }

    run_all(&inventory, &categories, &satisfaction).await;
    let mut first = Vec::new();
    for id in &ids {
        let c = store.snapshot(*id).await.unwrap();
        let cats: Vec<_> = c.clients.iter().map(|cl| cl.category).collect();
        first.push((c.inventory_stats, c.average_satisfaction, cats));
    }

    run_all(&inventory, &categories, &satisfaction).await;
    for (id, expected) in ids.iter().zip(first) {
        let c = store.snapshot(*id).await.unwrap();
        let cats: Vec<_> = c.clients.iter().map(|cl| cl.category).collect();
        assert_eq!((c.inventory_stats, c.average_satisfaction, cats), expected);
    }
}

#[tokio::test]
async fn tenant_deleted_mid_run_is_counted_as_error() {
    let companies: Vec<Company> = (0..5).map(|i| sample_company(&format!("Loja {i}"))).collect();
    let mut ids: Vec<_> = companies.iter().map(|c| c.id).collect();
    ids.sort();
    let doomed = ids[2];

    let inner = store_with(companies);
    let store = Arc::new(InterferingStore::new(inner.clone(), vec![AfterPage::Delete(doomed)]));

    let service = InventoryMetricsService::new(store);
    let summary = service.recalc_all_companies(InventoryMetric::TotalProducts).await;

    assert!(summary.errors >= 1);
    assert_eq!(summary.updated, 5 - summary.errors);
    assert_eq!(summary.processed(), 5);
    assert!(inner.snapshot(doomed).await.is_none());
    assert_eq!(
        inner.snapshot(ids[0]).await.unwrap().inventory_stats.total_products,
        4
    );
}

#[tokio::test]
async fn overflowing_tenant_does_not_stop_the_batch() {
    let mut companies: Vec<Company> = (0..4).map(|i| sample_company(&format!("Loja {i}"))).collect();
    let healthy: Vec<_> = companies.iter().map(|c| c.id).collect();

    let mut extreme = Company::new("Valores extremos");
    let mut huge = product("Lote", "Geral", i64::MAX, 0);
    huge.cost_price = Decimal::from(100_000_000_000i64);
    extreme.inventory = vec![huge];
    let extreme_id = extreme.id;
    companies.push(extreme);

    let store = store_with(companies);
    let service = InventoryMetricsService::new(store.clone());

    let summary = service.recalc_all_companies(InventoryMetric::TotalValue).await;
    assert_eq!(summary, BatchSummary { updated: 4, errors: 1 });
    for id in healthy {
        assert_eq!(store.snapshot(id).await.unwrap().inventory_stats.total_value, Decimal::from(684));
    }
    assert_eq!(store.snapshot(extreme_id).await.unwrap().inventory_stats.total_value, Decimal::ZERO);

    // as demais métricas do mesmo tenant seguem normais
    let summary = service.recalc_all_companies(InventoryMetric::TotalProducts).await;
    assert_eq!(summary, BatchSummary { updated: 5, errors: 0 });

    let err = service.recalc_company(extreme_id).await.unwrap_err();
    assert!(matches!(err, AppError::NumericOverflow(_)));
}

async fn scanned_ids(store: &dyn CompanyStore, page_size: usize) -> Vec<uuid::Uuid> {
    let mut cursor = CompanyCursor::new(store, CompanyProjection::INVENTORY).with_page_size(page_size);
    let mut seen = Vec::new();
    while let Some(next) = cursor.next().await {
        seen.push(next.unwrap().id);
    }
    seen
}

#[tokio::test]
async fn cursor_walks_every_page_once() {
    // 5 tenants: páginas 2 + 2 + 1 (última parcial)
    let companies: Vec<Company> = (0..5).map(|i| sample_company(&format!("Loja {i}"))).collect();
    let mut ids: Vec<_> = companies.iter().map(|c| c.id).collect();
    ids.sort();
    let store = store_with(companies);

    assert_eq!(scanned_ids(store.as_ref(), 2).await, ids);

    let summary = InventoryMetricsService::new(store.clone())
        .with_page_size(2)
        .recalc_all_companies(InventoryMetric::TotalProducts)
        .await;
    assert_eq!(summary, BatchSummary { updated: 5, errors: 0 });

    // 4 tenants: a segunda página vem cheia e a terceira vazia encerra o cursor
    store.delete_company(ids[4]).await.unwrap();
    assert_eq!(scanned_ids(store.as_ref(), 2).await, ids[..4].to_vec());

    let summary = SatisfactionService::new(store.clone(), SatisfactionParams::default())
        .with_page_size(2)
        .update_all_companies_satisfaction()
        .await;
    assert_eq!(summary, BatchSummary { updated: 4, errors: 0 });
}

#[tokio::test]
async fn tenant_deleted_before_its_page_is_never_visited() {
    let companies: Vec<Company> = (0..5).map(|i| sample_company(&format!("Loja {i}"))).collect();
    let mut ids: Vec<_> = companies.iter().map(|c| c.id).collect();
    ids.sort();
    // some depois da primeira página (ids[0], ids[1]) ser lida
    let doomed = ids[3];

    let inner = store_with(companies);
    let store = Arc::new(InterferingStore::new(inner.clone(), vec![AfterPage::Delete(doomed)]));

    let summary = ClientCategoryService::new(store)
        .with_page_size(2)
        .update_all_clients()
        .await;

    assert_eq!(summary, BatchSummary { updated: 4, errors: 0 });
    assert!(inner.snapshot(doomed).await.is_none());
}

#[tokio::test]
async fn on_demand_recalculation_reports_missing_tenant() {
    let store = store_with([]);
    let service = InventoryMetricsService::new(store);

    let err = service.recalc_company(uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::CompanyNotFound));
}

#[tokio::test]
async fn on_demand_recalculation_updates_all_stats() {
    let company = sample_company("Loja Sul");
    let id = company.id;
    let store = store_with([company]);
    let service = InventoryMetricsService::new(store.clone());

    let stats = service.recalc_company(id).await.unwrap();

    assert_eq!(stats, store.snapshot(id).await.unwrap().inventory_stats);
    assert_eq!(stats.total_products, 4);
}

#[tokio::test]
async fn categories_follow_score_thresholds() {
    let now = Utc::now();
    let mut company = Company::new("Categorias");

    let four = Client::new("Quatro compras");
    let five = Client::new("Cinco compras");
    let big = Client::new("Grande");
    let vip = Client::new("VIP");

    // 4 compras = 2000 -> 4.0
    company.sales.extend((0..4).map(|d| sale_worth(&four, 500, now - Duration::days(d))));
    // 5 compras = 2000 -> 4.5
    company.sales.extend((0..5).map(|d| sale_worth(&five, 400, now - Duration::days(d))));
    // 1 compra de 5000 -> 5.5
    company.sales.push(sale_worth(&big, 5000, now - Duration::days(10)));
    // 10 compras = 5000 -> 10
    company.sales.extend((0..10).map(|d| sale_worth(&vip, 500, now - Duration::days(d))));

    company.clients = vec![four.clone(), five.clone(), big.clone(), vip.clone()];
    let id = company.id;
    let store = store_with([company]);

    let summary = ClientCategoryService::new(store.clone()).update_all_clients().await;
    assert_eq!(summary.updated, 1);

    let clients = store.snapshot(id).await.unwrap().clients;
    let category_of = |c: &Client| clients.iter().find(|x| x.id == c.id).unwrap().category;

    assert_eq!(category_of(&four), ClientCategory::Regular);
    assert_eq!(category_of(&five), ClientCategory::Regular);
    assert_eq!(category_of(&big), ClientCategory::Premium);
    assert_eq!(category_of(&vip), ClientCategory::Vip);
}

#[tokio::test]
async fn client_inserted_during_category_run_survives() {
    let company = sample_company("Concorrida");
    let id = company.id;
    let inner = store_with([company]);

    let mut newcomer = Client::new("Recém-chegado");
    newcomer.category = ClientCategory::Premium;

    let store = Arc::new(InterferingStore::new(
        inner.clone(),
        vec![AfterPage::PushClient(id, newcomer.clone())],
    ));

    let summary = ClientCategoryService::new(store).update_all_clients().await;
    assert_eq!(summary, BatchSummary { updated: 1, errors: 0 });

    let clients = inner.snapshot(id).await.unwrap().clients;
    assert_eq!(clients.len(), 3);

    let survivor = clients.iter().find(|c| c.id == newcomer.id).unwrap();
    // não fazia parte da leitura: categoria preservada
    assert_eq!(survivor.category, ClientCategory::Premium);
    assert!(clients.iter().all(|c| !c.name.is_empty()));
}

#[tokio::test]
async fn satisfaction_stays_within_bounds() {
    let now = Utc::now();
    let mut empty = Company::new("Sem clientes");
    empty.average_satisfaction = 4.2;
    let empty_id = empty.id;

    let mut busy = Company::new("Movimentada");
    let client = Client::new("Frequente");
    busy.sales.extend((0..30).map(|d| sale_worth(&client, 10, now - Duration::hours(d))));
    busy.clients = vec![client];
    let busy_id = busy.id;

    let mut companies = vec![empty, busy];
    companies.extend((0..4).map(|i| sample_company(&format!("Loja {i}"))));
    let ids: Vec<_> = companies.iter().map(|c| c.id).collect();

    let store = store_with(companies);
    let service = SatisfactionService::new(store.clone(), SatisfactionParams::default());

    let summary = service.update_all_companies_satisfaction().await;
    assert_eq!(summary, BatchSummary { updated: 6, errors: 0 });

    for id in ids {
        let score = store.snapshot(id).await.unwrap().average_satisfaction;
        assert!((0.0..=5.0).contains(&score), "score fora do intervalo: {score}");
    }
    assert_eq!(store.snapshot(empty_id).await.unwrap().average_satisfaction, 0.0);
    assert!(store.snapshot(busy_id).await.unwrap().average_satisfaction > 4.9);
}

#[tokio::test]
async fn satisfaction_write_touches_only_the_score() {
    let company = sample_company("Isolada");
    let id = company.id;
    let store = store_with([company.clone()]);

    SatisfactionService::new(store.clone(), SatisfactionParams::default())
        .update_all_companies_satisfaction()
        .await;

    let after = store.snapshot(id).await.unwrap();
    assert_eq!(after.clients.len(), company.clients.len());
    assert_eq!(after.sales.len(), company.sales.len());
    assert_eq!(after.inventory_stats, company.inventory_stats);
    assert!(after.average_satisfaction > 0.0);
}

#[tokio::test]
async fn stores_reject_writes_to_missing_tenants() {
    let store = store_with([]);
    let err = store
        .set_average_satisfaction(uuid::Uuid::new_v4(), 1.0)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::CompanyNotFound));
}
