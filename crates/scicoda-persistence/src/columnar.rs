//! Artifacts Parquet.
//!
//! Escritura con ZSTD y lectura completa (eager) o diferida (`LazyScan`). En
//! el scan diferido sólo se carga el footer al abrir; cada `collect` empuja el
//! predicado al lector como `RowFilter`, que decodifica primero las columnas
//! del predicado y sólo materializa el resto para las filas seleccionadas.
use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::compute::concat_batches;
use arrow::datatypes::SchemaRef;
use arrow::error::ArrowError;
use arrow::record_batch::{RecordBatch, RecordBatchReader};
use log::debug;
use parquet::arrow::arrow_reader::{ArrowPredicateFn, ArrowReaderMetadata, ArrowReaderOptions, ParquetRecordBatchReaderBuilder, RowFilter};
use parquet::arrow::{ArrowWriter, ProjectionMask};
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;
use scicoda_core::{RowPredicate, Table};

use crate::error::PersistenceError;

/// Nivel ZSTD por defecto de los artifacts.
pub const DEFAULT_ZSTD_LEVEL: i32 = 9;

fn zstd_props(level: i32) -> WriterProperties {
    WriterProperties::builder().set_compression(Compression::ZSTD(ZstdLevel::try_new(level).unwrap_or_default()))
                               .set_dictionary_enabled(true)
                               .set_data_page_size_limit(128 * 1024)
                               .set_write_batch_size(32 * 1024)
                               .build()
}

/// Codifica la tabla como fichero Parquet completo en memoria.
pub fn encode_parquet(table: &Table, zstd_level: i32) -> Result<Vec<u8>, PersistenceError> {
    let mut writer = ArrowWriter::try_new(Vec::new(), table.schema(), Some(zstd_props(zstd_level)))?;
    writer.write(table.record_batch())?;
    Ok(writer.into_inner()?)
}

/// Lee el fichero entero en una sola tabla.
pub fn read_parquet(path: &Path) -> Result<Table, PersistenceError> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let table = drain(reader)?;
    debug!("read_parquet:done path={} rows={}", path.display(), table.num_rows());
    Ok(table)
}

fn drain(reader: impl RecordBatchReader) -> Result<Table, PersistenceError> {
    let schema = reader.schema();
    let batches = reader.collect::<Result<Vec<RecordBatch>, ArrowError>>()?;
    Ok(Table::new(concat_batches(&schema, &batches)?))
}

/// Scan diferido sobre un fichero Parquet.
#[derive(Debug, Clone)]
pub struct LazyScan {
    path: PathBuf,
    metadata: ArrowReaderMetadata,
}

impl LazyScan {
    /// Abre el fichero y carga sólo el footer (esquema y row groups).
    pub fn open(path: &Path) -> Result<Self, PersistenceError> {
        let file = File::open(path)?;
        let metadata = ArrowReaderMetadata::load(&file, ArrowReaderOptions::new())?;
        debug!("lazy_scan:open path={} row_groups={}", path.display(), metadata.metadata().num_row_groups());
        Ok(Self { path: path.to_path_buf(), metadata })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn schema(&self) -> SchemaRef {
        self.metadata.schema().clone()
    }

    /// Filas totales según el footer.
    pub fn num_rows(&self) -> usize {
        self.metadata.metadata().file_metadata().num_rows().max(0) as usize
    }

    /// Materializa las filas que cumplen el predicado.
    pub fn collect(&self, predicate: &RowPredicate) -> Result<Table, PersistenceError> {
        let file = File::open(&self.path)?;
        let mut builder = ParquetRecordBatchReaderBuilder::new_with_metadata(file, self.metadata.clone());
        if !predicate.is_trivial() {
            let schema = self.schema();
            let mut roots = Vec::new();
            for column in predicate.columns() {
                roots.push(schema.index_of(column)?);
            }
            let mask = ProjectionMask::roots(builder.parquet_schema(), roots);
            let owned = predicate.clone();
            let filter = ArrowPredicateFn::new(mask, move |batch: RecordBatch| owned.evaluate(&batch));
            builder = builder.with_row_filter(RowFilter::new(vec![Box::new(filter)]));
        }
        let table = drain(builder.build()?)?;
        debug!("lazy_scan:collect path={} clauses={} rows={}/{}",
               self.path.display(),
               predicate.clauses().len(),
               table.num_rows(),
               self.num_rows());
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, BooleanArray, StringArray};
    use std::sync::Arc;

    fn sample() -> Table {
        let batch = RecordBatch::try_from_iter(vec![("comp_id", Arc::new(StringArray::from(vec!["ALA", "ATP", "ALA", "HOH"])) as ArrayRef),
                                                    ("atom_id", Arc::new(StringArray::from(vec!["N", "PG", "CA", "O"])) as ArrayRef),
                                                    ("is_amino_acid", Arc::new(BooleanArray::from(vec![true, false, true, false])) as ArrayRef),]).unwrap();
        Table::new(batch)
    }

    fn write(dir: &Path) -> PathBuf {
        let path = dir.join("atoms.parquet");
        std::fs::write(&path, encode_parquet(&sample(), DEFAULT_ZSTD_LEVEL).unwrap()).unwrap();
        path
    }

    #[test]
    fn eager_read_returns_all_rows() {
        let dir = tempfile::tempdir().unwrap();
        let table = read_parquet(&write(dir.path())).unwrap();
        assert_eq!(table.num_rows(), 4);
        assert_eq!(table.column_names(), vec!["comp_id", "atom_id", "is_amino_acid"]);
    }

    #[test]
    fn pushdown_matches_post_filter() {
        let dir = tempfile::tempdir().unwrap();
        let scan = LazyScan::open(&write(dir.path())).unwrap();
        assert_eq!(scan.num_rows(), 4);
        let predicate = RowPredicate::new().with_ids("comp_id", "ALA").with_flag("is_amino_acid", true);
        let pushed = scan.collect(&predicate).unwrap();
        let post = scan.collect(&RowPredicate::new()).unwrap().filter(&predicate).unwrap();
        assert_eq!(pushed, post);
        assert_eq!(pushed.column_strings("atom_id").unwrap(), vec![Some("N".to_string()), Some("CA".to_string())]);
    }

    #[test]
    fn no_match_keeps_schema() {
        let dir = tempfile::tempdir().unwrap();
        let scan = LazyScan::open(&write(dir.path())).unwrap();
        let empty = scan.collect(&RowPredicate::new().with_ids("comp_id", "XXX")).unwrap();
        assert_eq!(empty.num_rows(), 0);
        assert_eq!(empty.schema(), scan.schema());
    }

    #[test]
    fn unknown_predicate_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let scan = LazyScan::open(&write(dir.path())).unwrap();
        assert!(scan.collect(&RowPredicate::new().with_ids("id", "ALA")).is_err());
    }
}
