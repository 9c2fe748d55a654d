//! Predicados de fila aplicables antes (pushdown) o después de cargar.
//!
//! Un `RowPredicate` es una conjunción de cláusulas. Sólo depende de los
//! valores de las columnas que nombra, así que puede evaluarse tanto sobre un
//! batch proyectado por el lector Parquet como sobre la tabla completa, con
//! idéntico resultado.
use std::collections::BTreeSet;

use arrow::array::{Array, AsArray, BooleanArray, RecordBatch};
use arrow::compute::cast;
use arrow::compute::kernels::boolean::and;
use arrow::datatypes::DataType;
use arrow::error::ArrowError;

/// Selección de identificadores de componente.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CompIds {
    /// Sin filtro.
    #[default]
    All,
    One(String),
    /// Pertenencia al conjunto; un conjunto vacío no selecciona nada.
    Many(BTreeSet<String>),
}

impl CompIds {
    pub fn is_all(&self) -> bool {
        matches!(self, CompIds::All)
    }

    /// Comparación exacta y sensible a mayúsculas.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            CompIds::All => true,
            CompIds::One(id) => id == value,
            CompIds::Many(ids) => ids.contains(value),
        }
    }
}

impl From<&str> for CompIds {
    fn from(id: &str) -> Self {
        CompIds::One(id.to_string())
    }
}

impl From<String> for CompIds {
    fn from(id: String) -> Self {
        CompIds::One(id)
    }
}

impl From<Option<&str>> for CompIds {
    fn from(id: Option<&str>) -> Self {
        id.map_or(CompIds::All, CompIds::from)
    }
}

impl From<Vec<String>> for CompIds {
    fn from(ids: Vec<String>) -> Self {
        CompIds::Many(ids.into_iter().collect())
    }
}

impl From<Vec<&str>> for CompIds {
    fn from(ids: Vec<&str>) -> Self {
        CompIds::Many(ids.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for CompIds {
    fn from(ids: &[&str]) -> Self {
        CompIds::Many(ids.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for CompIds {
    fn from(ids: [&str; N]) -> Self {
        CompIds::Many(ids.iter().map(|s| s.to_string()).collect())
    }
}

impl From<BTreeSet<String>> for CompIds {
    fn from(ids: BTreeSet<String>) -> Self {
        CompIds::Many(ids)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// Valor de `column` (como texto) seleccionado por `ids`.
    Ids { column: String, ids: CompIds },
    /// Columna booleana igual a `expected`; los nulos no coinciden nunca.
    Flag { column: String, expected: bool },
}

impl Clause {
    pub fn column(&self) -> &str {
        match self {
            Clause::Ids { column, .. } | Clause::Flag { column, .. } => column,
        }
    }

    fn evaluate(&self, batch: &RecordBatch) -> Result<BooleanArray, ArrowError> {
        let column = batch.column_by_name(self.column())
                          .ok_or_else(|| ArrowError::SchemaError(format!("predicate column '{}' not found", self.column())))?;
        match self {
            Clause::Ids { ids, .. } => {
                let text = cast(column, &DataType::Utf8)?;
                Ok(text.as_string::<i32>()
                       .iter()
                       .map(|v| Some(v.is_some_and(|s| ids.matches(s))))
                       .collect())
            }
            Clause::Flag { expected, .. } => {
                let flags = cast(column, &DataType::Boolean)?;
                Ok(flags.as_boolean()
                        .iter()
                        .map(|v| Some(v == Some(*expected)))
                        .collect())
            }
        }
    }
}

/// Conjunción de cláusulas; sin cláusulas selecciona todas las filas.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowPredicate {
    clauses: Vec<Clause>,
}

impl RowPredicate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Añade un filtro por identificador; `CompIds::All` no añade nada.
    pub fn with_ids(mut self, column: &str, ids: impl Into<CompIds>) -> Self {
        let ids = ids.into();
        if !ids.is_all() {
            self.clauses.push(Clause::Ids { column: column.to_string(), ids });
        }
        self
    }

    pub fn with_flag(mut self, column: &str, expected: bool) -> Self {
        self.clauses.push(Clause::Flag { column: column.to_string(), expected });
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_trivial(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Columnas que el predicado necesita leer, sin duplicados y en orden de aparición.
    pub fn columns(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for clause in &self.clauses {
            if !out.contains(&clause.column()) {
                out.push(clause.column());
            }
        }
        out
    }

    /// Máscara sin nulos con una entrada por fila del batch.
    pub fn evaluate(&self, batch: &RecordBatch) -> Result<BooleanArray, ArrowError> {
        let mut mask = BooleanArray::from(vec![true; batch.num_rows()]);
        for clause in &self.clauses {
            let next = clause.evaluate(batch)?;
            mask = and(&mask, &next)?;
        }
        debug_assert_eq!(mask.null_count(), 0);
        Ok(mask)
    }
}
