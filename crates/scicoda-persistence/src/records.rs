//! Artifacts JSON orientados a filas: un array de objetos.
//!
//! La lectura infiere el esquema a partir de los propios registros para que
//! el validador vea exactamente lo que hay en el fichero (incluidas columnas
//! no declaradas). Un array vacío produce una tabla vacía con el esquema
//! declarado.
use std::fs;
use std::path::Path;
use std::sync::Arc;

use arrow::datatypes::SchemaRef;
use arrow::error::ArrowError;
use arrow::json::reader::infer_json_schema_from_iterator;
use arrow::json::writer::JsonArray;
use arrow::json::{ReaderBuilder, WriterBuilder};
use log::debug;
use scicoda_core::Table;
use serde_json::Value;

use crate::error::PersistenceError;

pub fn read_records(path: &Path, declared: &SchemaRef) -> Result<Table, PersistenceError> {
    let raw = fs::read(path)?;
    let table = parse_records(&raw, declared)?;
    debug!("read_records:done path={} rows={}", path.display(), table.num_rows());
    Ok(table)
}

pub fn parse_records(raw: &[u8], declared: &SchemaRef) -> Result<Table, PersistenceError> {
    let Value::Array(values) = serde_json::from_slice::<Value>(raw)? else {
        return Err(PersistenceError::Malformed("expected a JSON array of records".into()));
    };
    if let Some(pos) = values.iter().position(|v| !v.is_object()) {
        return Err(PersistenceError::Malformed(format!("record {pos} is not a JSON object")));
    }
    if values.is_empty() {
        return Ok(Table::empty(Arc::clone(declared)));
    }

    let inferred = infer_json_schema_from_iterator(values.iter().map(Ok::<_, ArrowError>))?;
    let mut decoder = ReaderBuilder::new(Arc::new(inferred)).with_batch_size(values.len())
                                                            .build_decoder()?;
    decoder.serialize(&values)?;
    let batch = decoder.flush()?
                       .ok_or_else(|| PersistenceError::Malformed("no records decoded".into()))?;
    Ok(Table::new(batch))
}

/// Serializa la tabla como array JSON indentado; los nulos se escriben explícitos.
pub fn encode_records(table: &Table) -> Result<Vec<u8>, PersistenceError> {
    let mut writer = WriterBuilder::new().with_explicit_nulls(true)
                                         .build::<_, JsonArray>(Vec::new());
    writer.write(table.record_batch())?;
    writer.finish()?;
    let compact = writer.into_inner();
    // Re-indentado para que los ficheros curados sigan siendo legibles en diffs.
    let value: Value = if compact.is_empty() { Value::Array(Vec::new()) } else { serde_json::from_slice(&compact)? };
    let mut out = serde_json::to_vec_pretty(&value)?;
    out.push(b'\n');
    Ok(out)
}
