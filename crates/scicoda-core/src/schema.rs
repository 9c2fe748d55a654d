//! Validador de esquemas.
//!
//! Un `Schema` declara, en orden, las columnas de un dataset con su tipo
//! semántico. `validate` comprueba una tabla contra el esquema y devuelve la
//! tabla con los tipos canónicos ya aplicados:
//!
//! | Semántico     | Canónico Arrow | Acepta además                                   |
//! |---------------|----------------|-------------------------------------------------|
//! | `String`      | `Utf8`         | `LargeUtf8`, `Utf8View`, diccionarios de texto  |
//! | `Integer`     | `Int64`        | cualquier entero; flotantes con valor entero    |
//! | `Float`       | `Float64`      | cualquier entero o flotante                     |
//! | `Boolean`     | `Boolean`      | -                                               |
//! | `Enum`        | `Utf8`         | como `String`, con dominio cerrado de valores   |
//! | `IntegerList` | `List<Int64>`  | listas de enteros de cualquier ancho            |
//!
//! Una columna de tipo `Null` (todo nulo) se acepta para cualquier tipo.
//! La función es pura: no hace I/O ni registra nada.
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, BooleanArray};
use arrow::compute::{cast, cast_with_options, CastOptions};
use arrow::datatypes::{DataType, Field, Float64Type, Int64Type, Schema as ArrowSchema, SchemaRef};
use indexmap::IndexMap;

use crate::errors::SchemaError;
use crate::table::Table;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticType {
    String,
    Integer,
    Float,
    Boolean,
    Enum(Vec<String>),
    IntegerList,
}

impl SemanticType {
    pub fn enumeration(values: &[&str]) -> Self {
        SemanticType::Enum(values.iter().map(|v| v.to_string()).collect())
    }

    /// Tipo Arrow al que se normaliza la columna.
    pub fn canonical(&self) -> DataType {
        match self {
            SemanticType::String | SemanticType::Enum(_) => DataType::Utf8,
            SemanticType::Integer => DataType::Int64,
            SemanticType::Float => DataType::Float64,
            SemanticType::Boolean => DataType::Boolean,
            SemanticType::IntegerList => DataType::List(Arc::new(Field::new("item", DataType::Int64, true))),
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticType::String => write!(f, "string"),
            SemanticType::Integer => write!(f, "integer"),
            SemanticType::Float => write!(f, "float"),
            SemanticType::Boolean => write!(f, "boolean"),
            SemanticType::Enum(values) => write!(f, "enum[{}]", values.join(", ")),
            SemanticType::IntegerList => write!(f, "list<integer>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub ty: SemanticType,
    pub nullable: bool,
}

/// Política ante columnas no declaradas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaMode {
    /// Las columnas extra invalidan el artifact.
    Strict,
    /// Las columnas extra se conservan detrás de las declaradas.
    #[default]
    Lenient,
}

/// Invariantes a nivel de dataset (más allá del tipo de cada columna).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Ningún valor no nulo repetido.
    Unique(String),
    /// Los valores son exactamente `start..start + n`, sin huecos ni repetidos.
    Sequence { column: String, start: i64 },
    /// Dos columnas booleanas nunca son verdaderas en la misma fila.
    Exclusive { left: String, right: String },
    /// `column` vale 0 en toda fila cuyas banderas `unless` sean todas falsas.
    ZeroUnless { column: String, unless: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    dataset: String,
    columns: IndexMap<String, ColumnSpec>,
    mode: SchemaMode,
    constraints: Vec<Constraint>,
}

impl Schema {
    pub fn new(dataset: impl Into<String>, mode: SchemaMode) -> Self {
        Self { dataset: dataset.into(), columns: IndexMap::new(), mode, constraints: Vec::new() }
    }

    /// Columna obligatoria sin nulos.
    pub fn required(mut self, name: &str, ty: SemanticType) -> Self {
        self.columns.insert(name.to_string(), ColumnSpec { ty, nullable: false });
        self
    }

    /// Columna obligatoria que admite nulos.
    pub fn nullable(mut self, name: &str, ty: SemanticType) -> Self {
        self.columns.insert(name.to_string(), ColumnSpec { ty, nullable: true });
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn mode(&self) -> SchemaMode {
        self.mode
    }

    pub fn columns(&self) -> &IndexMap<String, ColumnSpec> {
        &self.columns
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Esquema Arrow canónico de las columnas declaradas.
    pub fn arrow_schema(&self) -> SchemaRef {
        let fields: Vec<Field> = self.columns
                                     .iter()
                                     .map(|(name, spec)| Field::new(name, spec.ty.canonical(), spec.nullable))
                                     .collect();
        Arc::new(ArrowSchema::new(fields))
    }

    fn err_type(&self, column: &str, spec: &ColumnSpec, observed: &DataType) -> SchemaError {
        SchemaError::TypeMismatch { dataset: self.dataset.clone(),
                                    column: column.to_string(),
                                    expected: spec.ty.to_string(),
                                    observed: observed.to_string() }
    }

    fn err_value(&self, column: &str, spec: &ColumnSpec, value: impl fmt::Display) -> SchemaError {
        SchemaError::InvalidValue { dataset: self.dataset.clone(),
                                    column: column.to_string(),
                                    expected: spec.ty.to_string(),
                                    value: value.to_string() }
    }
}

/// Valida `table` contra `schema` y devuelve la tabla normalizada.
///
/// El orden de salida es: columnas declaradas (en orden de declaración) y, en
/// modo `Lenient`, las columnas extra en el orden de entrada.
pub fn validate(table: Table, schema: &Schema) -> Result<Table, SchemaError> {
    let source = table.schema();
    let mut fields = Vec::with_capacity(source.fields().len());
    let mut columns = Vec::with_capacity(source.fields().len());

    for (name, spec) in schema.columns() {
        let Some(array) = table.column(name) else {
            return Err(SchemaError::MissingColumn { dataset: schema.dataset().to_string(),
                                                    column: name.clone(),
                                                    expected: spec.ty.to_string() });
        };
        let coerced = coerce_column(schema, name, spec, array)?;
        if !spec.nullable && coerced.null_count() > 0 {
            return Err(SchemaError::NullValues { dataset: schema.dataset().to_string(),
                                                 column: name.clone(),
                                                 expected: spec.ty.to_string(),
                                                 count: coerced.null_count() });
        }
        fields.push(Field::new(name, spec.ty.canonical(), spec.nullable));
        columns.push(coerced);
    }

    for field in source.fields() {
        if schema.columns().contains_key(field.name()) {
            continue;
        }
        match schema.mode() {
            SchemaMode::Strict => {
                return Err(SchemaError::UnexpectedColumn { dataset: schema.dataset().to_string(),
                                                           column: field.name().clone(),
                                                           observed: field.data_type().to_string() })
            }
            SchemaMode::Lenient => {
                if let Some(array) = table.column(field.name()) {
                    fields.push(field.as_ref().clone());
                    columns.push(Arc::clone(array));
                }
            }
        }
    }

    let out = Table::from_columns(Arc::new(ArrowSchema::new(fields)), columns).map_err(|e| SchemaError::Malformed { dataset: schema.dataset().to_string(),
                                                                                                                  detail: e.to_string() })?;
    for constraint in schema.constraints() {
        check_constraint(schema, &out, constraint)?;
    }
    Ok(out)
}

fn is_text(dt: &DataType) -> bool {
    match dt {
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View | DataType::Null => true,
        DataType::Dictionary(_, value) => is_text(value),
        _ => false,
    }
}

fn coerce_column(schema: &Schema, name: &str, spec: &ColumnSpec, array: &ArrayRef) -> Result<ArrayRef, SchemaError> {
    let observed = array.data_type().clone();
    let target = spec.ty.canonical();
    if observed == target {
        return match &spec.ty {
            SemanticType::Enum(values) => check_domain(schema, name, spec, values, Arc::clone(array)),
            _ => Ok(Arc::clone(array)),
        };
    }
    let strict = CastOptions { safe: false, ..Default::default() };
    let cast_to = |array: &ArrayRef, to: &DataType| cast_with_options(array, to, &strict).map_err(|e| schema.err_value(name, spec, e));

    match &spec.ty {
        SemanticType::String => {
            if !is_text(&observed) {
                return Err(schema.err_type(name, spec, &observed));
            }
            cast_to(array, &target)
        }
        SemanticType::Enum(values) => {
            if !is_text(&observed) {
                return Err(schema.err_type(name, spec, &observed));
            }
            let text = cast_to(array, &target)?;
            check_domain(schema, name, spec, values, text)
        }
        SemanticType::Integer => {
            if observed.is_integer() || observed == DataType::Null {
                cast_to(array, &target)
            } else if observed.is_floating() {
                integral_floats(schema, name, spec, array)?;
                cast_to(array, &target)
            } else {
                Err(schema.err_type(name, spec, &observed))
            }
        }
        SemanticType::Float => {
            if observed.is_integer() || observed.is_floating() || observed == DataType::Null {
                cast_to(array, &target)
            } else {
                Err(schema.err_type(name, spec, &observed))
            }
        }
        SemanticType::Boolean => {
            if observed == DataType::Null {
                cast_to(array, &target)
            } else {
                Err(schema.err_type(name, spec, &observed))
            }
        }
        SemanticType::IntegerList => match &observed {
            DataType::List(item) | DataType::LargeList(item) if item.data_type().is_integer() || *item.data_type() == DataType::Null => {
                cast_to(array, &target)
            }
            DataType::Null => cast_to(array, &target),
            _ => Err(schema.err_type(name, spec, &observed)),
        },
    }
}

/// Rechaza flotantes con parte fraccionaria o no finitos antes de pasarlos a entero.
fn integral_floats(schema: &Schema, name: &str, spec: &ColumnSpec, array: &ArrayRef) -> Result<(), SchemaError> {
    let as_f64 = cast(array, &DataType::Float64).map_err(|e| schema.err_value(name, spec, e))?;
    let bad = as_f64.as_primitive::<Float64Type>()
                    .iter()
                    .flatten()
                    .find(|v| !v.is_finite() || v.fract() != 0.0);
    match bad {
        Some(v) => Err(schema.err_value(name, spec, v)),
        None => Ok(()),
    }
}

fn check_domain(schema: &Schema, name: &str, spec: &ColumnSpec, values: &[String], text: ArrayRef) -> Result<ArrayRef, SchemaError> {
    if let Some(bad) = text.as_string::<i32>()
                           .iter()
                           .flatten()
                           .find(|v| !values.iter().any(|allowed| allowed.as_str() == *v))
    {
        return Err(schema.err_value(name, spec, bad));
    }
    Ok(text)
}

fn check_constraint(schema: &Schema, table: &Table, constraint: &Constraint) -> Result<(), SchemaError> {
    let violation = |column: &str, detail: String| SchemaError::Constraint { dataset: schema.dataset().to_string(),
                                                                              column: column.to_string(),
                                                                              detail };
    match constraint {
        Constraint::Unique(column) => {
            let values = table.column_strings(column)
                              .map_err(|e| violation(column, e.to_string()))?;
            let mut seen = HashSet::with_capacity(values.len());
            for value in values.into_iter().flatten() {
                if !seen.insert(value.clone()) {
                    return Err(violation(column, format!("duplicate value {value:?}")));
                }
            }
            Ok(())
        }
        Constraint::Sequence { column, start } => {
            let array = table.column(column)
                             .ok_or_else(|| violation(column, "column not present".to_string()))?;
            let ints = cast(array, &DataType::Int64).map_err(|e| violation(column, e.to_string()))?;
            let ints = ints.as_primitive::<Int64Type>();
            if ints.null_count() > 0 {
                return Err(violation(column, format!("{} null value(s) in sequence", ints.null_count())));
            }
            let mut values: Vec<i64> = ints.values().iter().copied().collect();
            values.sort_unstable();
            for (offset, value) in values.iter().enumerate() {
                let expected = start + offset as i64;
                if *value != expected {
                    return Err(violation(column, format!("expected {expected} at position {offset} of the sorted sequence, found {value}")));
                }
            }
            Ok(())
        }
        Constraint::Exclusive { left, right } => {
            let l = boolean_column(table, left).map_err(|e| violation(left, e))?;
            let r = boolean_column(table, right).map_err(|e| violation(right, e))?;
            match (0..table.num_rows()).find(|&row| l.is_valid(row) && r.is_valid(row) && l.value(row) && r.value(row)) {
                Some(row) => Err(violation(left, format!("row {row} sets both '{left}' and '{right}'"))),
                None => Ok(()),
            }
        }
        Constraint::ZeroUnless { column, unless } => {
            let counts = table.column(column)
                              .ok_or_else(|| violation(column, "column not present".to_string()))?;
            let counts = cast(counts, &DataType::Int64).map_err(|e| violation(column, e.to_string()))?;
            let counts = counts.as_primitive::<Int64Type>();
            let flags = unless.iter()
                              .map(|name| boolean_column(table, name).map_err(|e| violation(name, e)))
                              .collect::<Result<Vec<_>, _>>()?;
            // Una bandera nula no cuenta como falsa.
            let unflagged = |row: usize| flags.iter().all(|f| f.is_valid(row) && !f.value(row));
            for row in (0..table.num_rows()).filter(|&row| unflagged(row)) {
                if counts.is_null(row) || counts.value(row) != 0 {
                    let found = if counts.is_null(row) { "null".to_string() } else { counts.value(row).to_string() };
                    return Err(violation(column, format!("row {row} sets none of {unless:?} but has {found}, expected 0")));
                }
            }
            Ok(())
        }
    }
}

fn boolean_column(table: &Table, name: &str) -> Result<BooleanArray, String> {
    let array = table.column(name)
                     .ok_or_else(|| "column not present".to_string())?;
    let flags = cast(array, &DataType::Boolean).map_err(|e| e.to_string())?;
    Ok(flags.as_boolean().clone())
}
