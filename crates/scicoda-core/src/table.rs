//! Tabla realizada e inmutable.
//!
//! `Table` envuelve un `RecordBatch` de Arrow. Los buffers de Arrow son
//! inmutables y se comparten por conteo de referencias, así que clonar una
//! tabla del caché es barato y el llamador no puede alterar el estado
//! compartido.
use std::fmt;
use std::sync::Arc;

use arrow::array::{ArrayRef, AsArray, RecordBatch};
use arrow::compute::{cast, filter_record_batch};
use arrow::datatypes::{DataType, SchemaRef};
use arrow::error::ArrowError;
use arrow::util::pretty::pretty_format_batches;

use crate::filter::RowPredicate;

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    batch: RecordBatch,
}

impl Table {
    pub fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    /// Tabla sin filas con el esquema dado.
    pub fn empty(schema: SchemaRef) -> Self {
        Self { batch: RecordBatch::new_empty(schema) }
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.batch.schema().fields().iter().map(|f| f.name().clone()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.batch.schema().index_of(name).is_ok()
    }

    pub fn column(&self, name: &str) -> Option<&ArrayRef> {
        self.batch.column_by_name(name)
    }

    /// Valores de una columna convertidos a texto (útil para claves e inspección).
    pub fn column_strings(&self, name: &str) -> Result<Vec<Option<String>>, ArrowError> {
        let column = self.column(name)
                         .ok_or_else(|| ArrowError::SchemaError(format!("column '{name}' not found")))?;
        let as_text = cast(column, &DataType::Utf8)?;
        Ok(as_text.as_string::<i32>().iter().map(|v| v.map(str::to_string)).collect())
    }

    pub fn record_batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Devuelve una tabla nueva con las filas que cumplen el predicado.
    pub fn filter(&self, predicate: &RowPredicate) -> Result<Table, ArrowError> {
        if predicate.is_trivial() {
            return Ok(self.clone());
        }
        let mask = predicate.evaluate(&self.batch)?;
        Ok(Table::new(filter_record_batch(&self.batch, &mask)?))
    }

    /// Reemplaza columnas manteniendo el número de filas (usado por el validador).
    pub(crate) fn from_columns(schema: SchemaRef, columns: Vec<ArrayRef>) -> Result<Table, ArrowError> {
        Ok(Table::new(RecordBatch::try_new(schema, columns)?))
    }
}

impl From<RecordBatch> for Table {
    fn from(batch: RecordBatch) -> Self {
        Table::new(batch)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match pretty_format_batches(std::slice::from_ref(&self.batch)) {
            Ok(rendered) => write!(f, "{rendered}"),
            Err(_) => write!(f, "<table: {} rows x {} columns>", self.num_rows(), self.num_columns()),
        }
    }
}

/// Construye un `SchemaRef` compartido a partir de campos (azúcar para tests y builders).
pub fn schema_ref(fields: Vec<arrow::datatypes::Field>) -> SchemaRef {
    Arc::new(arrow::datatypes::Schema::new(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{BooleanArray, Int64Array, StringArray};
    use arrow::datatypes::Field;

    fn sample() -> Table {
        let schema = schema_ref(vec![Field::new("id", DataType::Utf8, false),
                                     Field::new("n", DataType::Int64, true),
                                     Field::new("is_amino_acid", DataType::Boolean, false),]);
        let batch = RecordBatch::try_new(schema,
                                         vec![Arc::new(StringArray::from(vec!["ALA", "ATP", "HOH"])) as ArrayRef,
                                              Arc::new(Int64Array::from(vec![Some(1), None, Some(3)])) as ArrayRef,
                                              Arc::new(BooleanArray::from(vec![true, false, false])) as ArrayRef,]).unwrap();
        Table::new(batch)
    }

    #[test]
    fn exposes_shape_and_names() {
        let t = sample();
        assert_eq!(t.num_rows(), 3);
        assert_eq!(t.num_columns(), 3);
        assert_eq!(t.column_names(), vec!["id", "n", "is_amino_acid"]);
        assert!(t.has_column("n"));
        assert!(!t.has_column("missing"));
    }

    #[test]
    fn column_strings_casts_numbers() {
        let t = sample();
        assert_eq!(t.column_strings("n").unwrap(), vec![Some("1".to_string()), None, Some("3".to_string())]);
        assert!(t.column_strings("missing").is_err());
    }

    #[test]
    fn filter_keeps_schema_when_nothing_matches() {
        let t = sample();
        let out = t.filter(&RowPredicate::new().with_ids("id", "NOPE")).unwrap();
        assert_eq!(out.num_rows(), 0);
        assert_eq!(out.schema(), t.schema());
    }

    #[test]
    fn display_renders_rows() {
        let rendered = sample().to_string();
        assert!(rendered.contains("ATP"));
    }
}
