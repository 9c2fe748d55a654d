//! Errores específicos del core.
//!
//! `SchemaError` siempre nombra el dataset y la columna afectada, junto con lo
//! esperado frente a lo observado, para que un artifact corrupto o desfasado
//! respecto al código se pueda diagnosticar sin abrir el fichero.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("dataset '{dataset}': missing required column '{column}' (expected {expected})")]
    MissingColumn { dataset: String, column: String, expected: String },
    #[error("dataset '{dataset}': column '{column}' has type {observed}, expected {expected}")]
    TypeMismatch { dataset: String, column: String, expected: String, observed: String },
    #[error("dataset '{dataset}': unexpected column '{column}' of type {observed} (strict schema)")]
    UnexpectedColumn { dataset: String, column: String, observed: String },
    #[error("dataset '{dataset}': column '{column}' (expected non-null {expected}) has {count} null value(s)")]
    NullValues { dataset: String, column: String, expected: String, count: usize },
    #[error("dataset '{dataset}': column '{column}' holds value {value:?}, expected {expected}")]
    InvalidValue { dataset: String, column: String, expected: String, value: String },
    #[error("dataset '{dataset}': constraint on column '{column}' violated: {detail}")]
    Constraint { dataset: String, column: String, detail: String },
    #[error("dataset '{dataset}': malformed artifact: {detail}")]
    Malformed { dataset: String, detail: String },
}

impl SchemaError {
    /// Dataset al que se refiere el error.
    pub fn dataset(&self) -> &str {
        match self {
            Self::MissingColumn { dataset, .. }
            | Self::TypeMismatch { dataset, .. }
            | Self::UnexpectedColumn { dataset, .. }
            | Self::NullValues { dataset, .. }
            | Self::InvalidValue { dataset, .. }
            | Self::Constraint { dataset, .. }
            | Self::Malformed { dataset, .. } => dataset,
        }
    }

    /// Columna afectada, si el error es de columna.
    pub fn column(&self) -> Option<&str> {
        match self {
            Self::MissingColumn { column, .. }
            | Self::TypeMismatch { column, .. }
            | Self::UnexpectedColumn { column, .. }
            | Self::NullValues { column, .. }
            | Self::InvalidValue { column, .. }
            | Self::Constraint { column, .. } => Some(column),
            Self::Malformed { .. } => None,
        }
    }
}
