//! Frontera con los colaboradores que generan artifacts.
//!
//! Un `ArtifactBuilder` obtiene y procesa los datos de una fuente externa y
//! entrega tablas al `ArtifactSink`. El sink valida cada tabla contra el
//! esquema declarado del dataset y la escribe de forma atómica en su ruta
//! final; el builder nunca toca el sistema de ficheros directamente.
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use scicoda_core::{validate, DatasetDescriptor, StorageFormat, Table};
use scicoda_persistence::{encode_parquet, encode_records, write_atomic};
use serde::Serialize;

use crate::errors::{BoxError, ScicodaError};

pub trait ArtifactBuilder: Send + Sync {
    /// Dataset que produce este builder.
    fn name(&self) -> &str;
    fn build(&self, sink: &mut ArtifactSink<'_>) -> Result<(), BoxError>;
}

/// Adaptador de closure a `ArtifactBuilder`.
pub struct FnBuilder<F> {
    name: String,
    f: F,
}

impl<F> FnBuilder<F> {
    pub fn new(name: &str, f: F) -> Self
        where F: Fn(&mut ArtifactSink<'_>) -> Result<(), BoxError> + Send + Sync
    {
        Self { name: name.to_string(), f }
    }
}

impl<F> ArtifactBuilder for FnBuilder<F> where F: Fn(&mut ArtifactSink<'_>) -> Result<(), BoxError> + Send + Sync
{
    fn name(&self) -> &str {
        &self.name
    }

    fn build(&self, sink: &mut ArtifactSink<'_>) -> Result<(), BoxError> {
        (self.f)(sink)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenArtifact {
    pub sub_key: Option<String>,
    pub path: PathBuf,
    pub rows: usize,
    pub columns: Vec<String>,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub dataset: String,
    pub artifacts: Vec<WrittenArtifact>,
    pub built_at: DateTime<Utc>,
}

impl BuildReport {
    pub fn total_rows(&self) -> usize {
        self.artifacts.iter().map(|a| a.rows).sum()
    }
}

/// Destino de escritura de un build.
pub struct ArtifactSink<'a> {
    descriptor: &'a DatasetDescriptor,
    data_dir: &'a Path,
    zstd_level: i32,
    written: Vec<WrittenArtifact>,
}

impl<'a> ArtifactSink<'a> {
    pub(crate) fn new(descriptor: &'a DatasetDescriptor, data_dir: &'a Path, zstd_level: i32) -> Self {
        Self { descriptor, data_dir, zstd_level, written: Vec::new() }
    }

    pub fn descriptor(&self) -> &DatasetDescriptor {
        self.descriptor
    }

    /// Valida y escribe la tabla del dataset (o de una de sus particiones).
    pub fn write(&mut self, sub_key: Option<&str>, table: Table) -> Result<&WrittenArtifact, ScicodaError> {
        let relative = self.descriptor
                           .relative_path(sub_key)
                           .map_err(|e| ScicodaError::from_descriptor("ArtifactSink::write", e))?;
        let schema = self.descriptor
                         .schema(sub_key)
                         .map_err(|e| ScicodaError::from_descriptor("ArtifactSink::write", e))?;
        let table = validate(table, schema)?;

        let path = self.data_dir.join(relative);
        let bytes = match self.descriptor.format() {
            StorageFormat::JsonRecords => encode_records(&table),
            StorageFormat::Parquet => encode_parquet(&table, self.zstd_level),
        }.map_err(ScicodaError::storage(&path))?;
        let file = write_atomic(&path, &bytes).map_err(ScicodaError::storage(&path))?;

        self.written.push(WrittenArtifact { sub_key: sub_key.map(str::to_string),
                                            path: file.path,
                                            rows: table.num_rows(),
                                            columns: table.column_names(),
                                            sha256: file.sha256 });
        let last = self.written.len() - 1;
        Ok(&self.written[last])
    }

    /// Atajo para datasets sin partición.
    pub fn write_table(&mut self, table: Table) -> Result<&WrittenArtifact, ScicodaError> {
        self.write(None, table)
    }

    pub fn written(&self) -> &[WrittenArtifact] {
        &self.written
    }

    pub(crate) fn into_report(self) -> BuildReport {
        BuildReport { dataset: self.descriptor.name().to_string(),
                      artifacts: self.written,
                      built_at: Utc::now() }
    }
}
