// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Empresa não encontrada")]
    CompanyNotFound,

    #[error("Período inválido: '{0}' (use 7d, 30d, 6m ou 1y)")]
    InvalidPeriod(String),

    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Documento do tenant que não pôde ser lido (JSON embutido quebrado)
    #[error("Documento malformado: {0}")]
    MalformedDocument(String),

    // Valor armazenado grande demais para a aritmética decimal
    #[error("Estouro numérico em {0}")]
    NumericOverflow(String),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedDocument(err.to_string())
    }
}

/// Erro já pronto para virar resposta HTTP.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let (status, message) = match err {
            AppError::ValidationError(errors) => {
                let fields: Vec<String> = errors
                    .field_errors()
                    .into_iter()
                    .map(|(field, field_errors)| {
                        let messages: Vec<String> = field_errors
                            .iter()
                            .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                            .collect();
                        format!("{}: {}", field, messages.join(", "))
                    })
                    .collect();
                (StatusCode::BAD_REQUEST, fields.join("; "))
            }
            AppError::CompanyNotFound => (StatusCode::NOT_FOUND, err.to_string()),
            AppError::InvalidPeriod(_) => (StatusCode::BAD_REQUEST, err.to_string()),

            // Todos os outros erros viram 500. O detalhe fica só no log.
            ref e => {
                tracing::error!("Erro Interno do Servidor: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Ocorreu um erro inesperado.".to_string(),
                )
            }
        };

        ApiError { status, message }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_errors_to_status_codes() {
        assert_eq!(ApiError::from(AppError::CompanyNotFound).status, StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(AppError::InvalidPeriod("2w".into())).status,
            StatusCode::BAD_REQUEST
        );

        let hidden = ApiError::from(AppError::MalformedDocument("clients[3]".into()));
        assert_eq!(hidden.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!hidden.message.contains("clients"));

        let overflow = ApiError::from(AppError::NumericOverflow("valor do estoque".into()));
        assert_eq!(overflow.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
