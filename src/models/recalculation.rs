// src/models/recalculation.rs

use serde::Serialize;
use utoipa::ToSchema;

/// Resultado de uma rodada de recálculo sobre todos os tenants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub updated: usize,
    pub errors: usize,
}

impl BatchSummary {
    pub fn processed(&self) -> usize {
        self.updated + self.errors
    }
}
