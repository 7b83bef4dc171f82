// src/services/recalculation.rs

use std::future::Future;
use std::time::Instant;

use crate::{
    common::error::AppError,
    db::{CompanyCursor, CompanyStore},
    models::{
        company::{Company, CompanyProjection},
        recalculation::BatchSummary,
    },
};

/// Laço comum de todos os recálculos em lote.
///
/// Percorre os tenants com o cursor (páginas de `page_size`), chama `recalc` para
/// cada documento já carregado e conta sucessos/falhas. Erro de um tenant é registrado e o lote segue; nada
/// escapa daqui além do resumo.
pub async fn run_batch<F, Fut>(
    store: &dyn CompanyStore,
    job: &'static str,
    projection: CompanyProjection,
    page_size: usize,
    mut recalc: F,
) -> BatchSummary
where
    F: FnMut(Company) -> Fut,
    Fut: Future<Output = Result<(), AppError>>,
{
    let started = Instant::now();
    let mut summary = BatchSummary::default();
    let mut cursor = CompanyCursor::new(store, projection).with_page_size(page_size);

    tracing::debug!(job, page_size, "Iniciando recálculo em lote");

    while let Some(next) = cursor.next().await {
        match next {
            Ok(company) => {
                let company_id = company.id;
                match recalc(company).await {
                    Ok(()) => summary.updated += 1,
                    Err(e) => {
                        summary.errors += 1;
                        tracing::warn!(job, %company_id, error = %e, "Falha ao recalcular tenant");
                    }
                }
            }
            Err(scan) => {
                summary.errors += 1;
                tracing::warn!(
                    job,
                    company_id = ?scan.company_id,
                    error = %scan.error,
                    "Falha ao ler tenant durante a varredura"
                );
            }
        }
    }

    tracing::info!(
        job,
        updated = summary.updated,
        errors = summary.errors,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Recálculo em lote concluído"
    );

    summary
}
