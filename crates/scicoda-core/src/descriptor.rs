//! Descriptores de dataset.
//!
//! Un `DatasetDescriptor` es metadata estática e inmutable: cómo se llama el
//! dataset, dónde vive su artifact relativo al directorio de datos, en qué
//! formato está y qué esquema debe cumplir. La estrategia de carga (eager o
//! lazy) se deriva de la clase de tamaño y del formato, de modo que el
//! `ArtifactStore` no necesita condicionales por dataset.
use std::path::PathBuf;

use indexmap::IndexMap;
use thiserror::Error;

use crate::schema::Schema;

/// Marcador de sub-clave dentro de `path_template`.
pub const SUB_KEY_PLACEHOLDER: &str = "{sub_key}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageFormat {
    /// Array JSON de objetos (tablas pequeñas curadas a mano).
    JsonRecords,
    /// Tabla columnar Parquet.
    Parquet,
}

impl StorageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            StorageFormat::JsonRecords => "json",
            StorageFormat::Parquet => "parquet",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeClass {
    Small,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStrategy {
    /// Se materializa entera en memoria al primer acceso.
    Eager,
    /// Se abre como scan diferido; los filtros se empujan al lector.
    Lazy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Partitioning {
    Single,
    /// Un fichero físico por clave; `parameter` es el nombre público de la clave.
    ByKey { parameter: String, keys: Vec<String> },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("dataset '{dataset}' requires parameter '{parameter}'")]
    MissingSubKey { dataset: String, parameter: String, allowed: Vec<String> },
    #[error("dataset '{dataset}' is not partitioned but sub-key '{value}' was given")]
    UnexpectedSubKey { dataset: String, value: String },
    #[error("invalid value '{value}' for parameter '{parameter}' of dataset '{dataset}'")]
    UnknownSubKey { dataset: String, parameter: String, value: String, allowed: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SchemaSet {
    Single(Schema),
    PerKey(IndexMap<String, Schema>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetDescriptor {
    name: String,
    path_template: String,
    format: StorageFormat,
    size_class: SizeClass,
    partitioning: Partitioning,
    schemas: SchemaSet,
}

impl DatasetDescriptor {
    /// Dataset de un único fichero.
    pub fn single(name: &str, path_template: &str, format: StorageFormat, size_class: SizeClass, schema: Schema) -> Self {
        Self { name: name.to_string(),
               path_template: path_template.to_string(),
               format,
               size_class,
               partitioning: Partitioning::Single,
               schemas: SchemaSet::Single(schema) }
    }

    /// Dataset repartido en un fichero por clave; cada clave tiene su esquema.
    pub fn partitioned(name: &str,
                       path_template: &str,
                       format: StorageFormat,
                       size_class: SizeClass,
                       parameter: &str,
                       schemas: IndexMap<String, Schema>)
                       -> Self {
        Self { name: name.to_string(),
               path_template: path_template.to_string(),
               format,
               size_class,
               partitioning: Partitioning::ByKey { parameter: parameter.to_string(),
                                                   keys: schemas.keys().cloned().collect() },
               schemas: SchemaSet::PerKey(schemas) }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path_template(&self) -> &str {
        &self.path_template
    }

    pub fn format(&self) -> StorageFormat {
        self.format
    }

    pub fn size_class(&self) -> SizeClass {
        self.size_class
    }

    pub fn partitioning(&self) -> &Partitioning {
        &self.partitioning
    }

    /// Lazy sólo si el dataset es grande y su formato admite pushdown.
    pub fn strategy(&self) -> LoadStrategy {
        match (self.size_class, self.format) {
            (SizeClass::Large, StorageFormat::Parquet) => LoadStrategy::Lazy,
            _ => LoadStrategy::Eager,
        }
    }

    /// Claves válidas (vacío si no está particionado).
    pub fn sub_keys(&self) -> &[String] {
        match &self.partitioning {
            Partitioning::Single => &[],
            Partitioning::ByKey { keys, .. } => keys,
        }
    }

    /// Comprueba la sub-clave contra la partición declarada.
    pub fn check_sub_key<'a>(&self, sub_key: Option<&'a str>) -> Result<Option<&'a str>, DescriptorError> {
        match (&self.partitioning, sub_key) {
            (Partitioning::Single, None) => Ok(None),
            (Partitioning::Single, Some(value)) => Err(DescriptorError::UnexpectedSubKey { dataset: self.name.clone(),
                                                                                          value: value.to_string() }),
            (Partitioning::ByKey { parameter, keys }, None) => Err(DescriptorError::MissingSubKey { dataset: self.name.clone(),
                                                                                                  parameter: parameter.clone(),
                                                                                                  allowed: keys.clone() }),
            (Partitioning::ByKey { parameter, keys }, Some(value)) => {
                if keys.iter().any(|k| k == value) {
                    Ok(Some(value))
                } else {
                    Err(DescriptorError::UnknownSubKey { dataset: self.name.clone(),
                                                         parameter: parameter.clone(),
                                                         value: value.to_string(),
                                                         allowed: keys.clone() })
                }
            }
        }
    }

    /// Ruta del artifact relativa al directorio de datos.
    pub fn relative_path(&self, sub_key: Option<&str>) -> Result<PathBuf, DescriptorError> {
        let rendered = match self.check_sub_key(sub_key)? {
            Some(key) => self.path_template.replace(SUB_KEY_PLACEHOLDER, key),
            None => self.path_template.clone(),
        };
        Ok(PathBuf::from(rendered))
    }

    pub fn schema(&self, sub_key: Option<&str>) -> Result<&Schema, DescriptorError> {
        let sub_key = self.check_sub_key(sub_key)?;
        match (&self.schemas, sub_key) {
            (SchemaSet::Single(schema), _) => Ok(schema),
            (SchemaSet::PerKey(schemas), key) => {
                key.and_then(|k| schemas.get(k))
                   .ok_or_else(|| DescriptorError::UnknownSubKey { dataset: self.name.clone(),
                                                                   parameter: self.parameter().unwrap_or_default().to_string(),
                                                                   value: key.unwrap_or_default().to_string(),
                                                                   allowed: self.sub_keys().to_vec() })
            }
        }
    }

    /// Nombre público del parámetro de partición, si lo hay.
    pub fn parameter(&self) -> Option<&str> {
        match &self.partitioning {
            Partitioning::Single => None,
            Partitioning::ByKey { parameter, .. } => Some(parameter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaMode, SemanticType};

    fn partitioned() -> DatasetDescriptor {
        let mut schemas = IndexMap::new();
        for key in ["alpha", "beta"] {
            schemas.insert(key.to_string(),
                           Schema::new(format!("demo[{key}]"), SchemaMode::Lenient).required("id", SemanticType::String));
        }
        DatasetDescriptor::partitioned("demo", "demo/{sub_key}.parquet", StorageFormat::Parquet, SizeClass::Large, "category", schemas)
    }

    #[test]
    fn strategy_follows_size_and_format() {
        assert_eq!(partitioned().strategy(), LoadStrategy::Lazy);
        let small = DatasetDescriptor::single("s", "s.parquet", StorageFormat::Parquet, SizeClass::Small, Schema::new("s", SchemaMode::Strict));
        assert_eq!(small.strategy(), LoadStrategy::Eager);
        let large_json = DatasetDescriptor::single("j", "j.json", StorageFormat::JsonRecords, SizeClass::Large, Schema::new("j", SchemaMode::Strict));
        assert_eq!(large_json.strategy(), LoadStrategy::Eager);
    }

    #[test]
    fn resolves_partitioned_paths() {
        let d = partitioned();
        assert_eq!(d.relative_path(Some("beta")).unwrap(), PathBuf::from("demo/beta.parquet"));
        assert_eq!(d.schema(Some("alpha")).unwrap().dataset(), "demo[alpha]");
    }

    #[test]
    fn rejects_bad_sub_keys() {
        let d = partitioned();
        assert!(matches!(d.check_sub_key(None), Err(DescriptorError::MissingSubKey { .. })));
        match d.check_sub_key(Some("gamma")) {
            Err(DescriptorError::UnknownSubKey { allowed, .. }) => assert_eq!(allowed, vec!["alpha", "beta"]),
            other => panic!("unexpected {other:?}"),
        }
        let single = DatasetDescriptor::single("s", "s.json", StorageFormat::JsonRecords, SizeClass::Small, Schema::new("s", SchemaMode::Strict));
        assert!(matches!(single.check_sub_key(Some("x")), Err(DescriptorError::UnexpectedSubKey { .. })));
    }
}
