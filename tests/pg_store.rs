// tests/pg_store.rs
//
// Rodam contra um Postgres real: `DATABASE_URL=... cargo test -- --ignored`

use std::collections::HashMap;

use serde_json::json;
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};

use business_metrics::{
    db::{CompanyStore, PgCompanyStore},
    models::company::{ClientCategory, Company, CompanyProjection, DocumentId},
};

async fn pool() -> PgPool {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL deve ser definida");
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("conexão com o banco");
    sqlx::migrate!().run(&pool).await.expect("migrações");
    pool
}

#[tokio::test]
#[ignore = "precisa de um Postgres em DATABASE_URL"]
async fn categories_reach_clients_with_legacy_ids() {
    let pool = pool().await;
    let store = PgCompanyStore::new(pool.clone());

    let company = Company::new("Legado");
    store.insert_company(&company).await.unwrap();

    // as três formas de id que o CRUD antigo deixou gravadas
    sqlx::query("UPDATE companies SET clients = $2 WHERE id = $1")
        .bind(company.id)
        .bind(Json(json!([
            { "_id": { "$oid": "69019f25b407b09e0d09cff6" }, "name": "Oid" },
            { "_id": "abc123", "name": "Texto" },
            { "id": "novo-1", "name": "Atual" }
        ])))
        .execute(&pool)
        .await
        .unwrap();

    let categories = HashMap::from([
        (DocumentId::new("69019f25b407b09e0d09cff6"), ClientCategory::Vip),
        (DocumentId::new("abc123"), ClientCategory::Premium),
        (DocumentId::new("novo-1"), ClientCategory::Vip),
    ]);
    store.set_client_categories(company.id, &categories).await.unwrap();

    let stored = store
        .find_company(company.id, CompanyProjection::CLIENTS_AND_SALES)
        .await
        .unwrap()
        .unwrap();
    let category_of = |id: &str| {
        stored
            .clients
            .iter()
            .find(|c| c.id.as_str() == id)
            .map(|c| c.category)
    };

    assert_eq!(category_of("69019f25b407b09e0d09cff6"), Some(ClientCategory::Vip));
    assert_eq!(category_of("abc123"), Some(ClientCategory::Premium));
    assert_eq!(category_of("novo-1"), Some(ClientCategory::Vip));

    store.delete_company(company.id).await.unwrap();
}

#[tokio::test]
#[ignore = "precisa de um Postgres em DATABASE_URL"]
async fn null_prices_do_not_hide_the_tenant() {
    let pool = pool().await;
    let store = PgCompanyStore::new(pool.clone());

    let company = Company::new("Preços nulos");
    store.insert_company(&company).await.unwrap();

    sqlx::query("UPDATE companies SET inventory = $2, sales = $3 WHERE id = $1")
        .bind(company.id)
        .bind(Json(json!([{ "_id": "p1", "name": "Caneca", "costPrice": null, "quantity": 2 }])))
        .bind(Json(json!([{ "clientId": "c1", "total": null, "date": "2025-03-14" }])))
        .execute(&pool)
        .await
        .unwrap();

    let stored = store
        .find_company(company.id, CompanyProjection::FULL)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.inventory.len(), 1);
    assert_eq!(stored.sales.len(), 1);

    store.delete_company(company.id).await.unwrap();
}
