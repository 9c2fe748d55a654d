use std::path::PathBuf;

use arrow::error::ArrowError;
use scicoda_core::{DescriptorError, SchemaError};
use scicoda_persistence::PersistenceError;
use thiserror::Error;

/// Error opaco devuelto por los builders externos.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errores públicos de la librería.
#[derive(Debug, Error)]
pub enum ScicodaError {
    #[error("invalid argument {argument:?} for parameter '{parameter}' of '{function}'; allowed values: {}", .allowed.join(", "))]
    InvalidParameter { function: String, parameter: String, argument: String, allowed: Vec<String> },
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("dataset '{dataset}' not found at {}: {guidance}", .path.display())]
    DatasetNotFound { dataset: String, path: PathBuf, guidance: String },
    #[error("failed to fetch dataset '{dataset}': {source}")]
    Fetch { dataset: String, source: BoxError },
    #[error("missing dependency for dataset '{dataset}': {details}")]
    MissingDependency { dataset: String, details: String },
    #[error("storage error at {}: {source}", .path.display())]
    Storage { path: PathBuf, source: PersistenceError },
    #[error("compute error: {0}")]
    Compute(#[from] ArrowError),
}

impl ScicodaError {
    pub fn invalid_parameter(function: &str, parameter: &str, argument: &str, allowed: &[impl AsRef<str>]) -> Self {
        ScicodaError::InvalidParameter { function: function.to_string(),
                                         parameter: parameter.to_string(),
                                         argument: argument.to_string(),
                                         allowed: allowed.iter().map(|a| a.as_ref().to_string()).collect() }
    }

    pub(crate) fn storage(path: impl Into<PathBuf>) -> impl FnOnce(PersistenceError) -> ScicodaError {
        let path = path.into();
        move |source| ScicodaError::Storage { path, source }
    }

    /// Traduce un error de sub-clave del descriptor al parámetro público.
    pub(crate) fn from_descriptor(function: &str, err: DescriptorError) -> Self {
        match err {
            DescriptorError::MissingSubKey { parameter, allowed, .. } => ScicodaError::InvalidParameter { function: function.to_string(),
                                                                                                          parameter,
                                                                                                          argument: "<none>".to_string(),
                                                                                                          allowed },
            DescriptorError::UnexpectedSubKey { dataset, value } => ScicodaError::InvalidParameter { function: function.to_string(),
                                                                                                     parameter: "sub_key".to_string(),
                                                                                                     argument: value,
                                                                                                     allowed: vec![format!("<none> ({dataset} is not partitioned)")] },
            DescriptorError::UnknownSubKey { parameter, value, allowed, .. } => ScicodaError::InvalidParameter { function: function.to_string(),
                                                                                                                 parameter,
                                                                                                                 argument: value,
                                                                                                                 allowed },
        }
    }

    /// Clasifica el error de un builder: los de esquema se conservan, el resto es `Fetch`.
    pub(crate) fn from_builder(dataset: &str, err: BoxError) -> Self {
        let err = match err.downcast::<SchemaError>() {
            Ok(schema) => return ScicodaError::Schema(*schema),
            Err(other) => other,
        };
        match err.downcast::<ScicodaError>() {
            Ok(inner) => match *inner {
                ScicodaError::Schema(schema) => ScicodaError::Schema(schema),
                other => ScicodaError::Fetch { dataset: dataset.to_string(), source: Box::new(other) },
            },
            Err(other) => ScicodaError::Fetch { dataset: dataset.to_string(), source: other },
        }
    }
}
