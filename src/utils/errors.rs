//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Clase estable de un error, independiente del mensaje
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Forbidden,
    InvalidInput,
    Unavailable,
    Unauthorized,
    Internal,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::Unavailable => "UNAVAILABLE",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::Internal => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::Forbidden(_) => ErrorKind::Forbidden,
            AppError::InvalidInput(_) | AppError::Validation(_) => ErrorKind::InvalidInput,
            AppError::Unavailable(_) => ErrorKind::Unavailable,
            AppError::Unauthorized(_) => ErrorKind::Unauthorized,
            AppError::Database(e) if is_unique_violation(e) => ErrorKind::Conflict,
            AppError::Database(e) if is_transient_sqlx(e) => ErrorKind::Unavailable,
            AppError::Database(_) | AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Fallos del store que pueden reintentarse sin cambiar el resultado
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Database(e) => is_transient_sqlx(e),
            _ => false,
        }
    }

    /// Mensaje legible que se expone al cliente
    fn public_message(&self) -> String {
        match self {
            AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::Forbidden(msg)
            | AppError::InvalidInput(msg)
            | AppError::Unavailable(msg)
            | AppError::Unauthorized(msg) => msg.clone(),
            AppError::Validation(e) => e.to_string(),
            AppError::Database(e) if is_unique_violation(e) => {
                "The resource already exists".to_string()
            }
            AppError::Database(e) if is_transient_sqlx(e) => {
                "The fleet store is temporarily unreachable".to_string()
            }
            AppError::Database(_) | AppError::Internal(_) => {
                "An unexpected error occurred".to_string()
            }
        }
    }
}

fn is_transient_sqlx(e: &sqlx::Error) -> bool {
    matches!(
        e,
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
    )
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();

        match kind {
            ErrorKind::Internal | ErrorKind::Unavailable => {
                tracing::error!("❌ {}", self);
            }
            _ => {
                tracing::debug!("⚠️ {}", self);
            }
        }

        let status = kind.status();
        let body = ErrorResponse {
            error: status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            message: self.public_message(),
            code: kind.code().to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: impl std::fmt::Display) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de conflicto por duplicado
pub fn conflict_error(resource: &str, field: &str, value: &str) -> AppError {
    AppError::Conflict(format!("{} with {} '{}' already exists", resource, field, value))
}

/// Función helper para crear errores de acceso prohibido
pub fn forbidden_error(operation: &str, reason: &str) -> AppError {
    AppError::Forbidden(format!("Cannot {}: {}", operation, reason))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_map_to_stable_codes() {
        assert_eq!(not_found_error("Vehicle", 7).kind().code(), "NOT_FOUND");
        assert_eq!(
            AppError::Conflict("already returned".into()).kind().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::InvalidInput("battery".into()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            forbidden_error("return order", "not the renter").kind(),
            ErrorKind::Forbidden
        );
    }

    #[test]
    fn test_pool_timeout_is_transient() {
        let err = AppError::Database(sqlx::Error::PoolTimedOut);
        assert!(err.is_transient());
        assert_eq!(err.kind(), ErrorKind::Unavailable);
        assert!(!AppError::Conflict("x".into()).is_transient());
    }

    #[test]
    fn test_messages_keep_reason() {
        let err = not_found_error("Order", 42);
        assert_eq!(err.public_message(), "Order with id '42' not found");
    }
}
