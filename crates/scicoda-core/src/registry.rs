//! Registro de datasets.
//!
//! `DatasetRegistry` resuelve nombres lógicos a descriptores. El registro
//! incorporado (`builtin`) se construye una sola vez y es inmutable; los
//! tests y herramientas pueden componer registros propios con `register`.
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::constants::{ccd_id_column, AMINO_ACID_FLAG, AUTODOCK_ATOM_TYPES, CCD, CCD_CATEGORIES, CCD_CATEGORY_PARAMETER, ELEMENT_BLOCKS,
                       PERIODIC_TABLE, STANDARD_STATES};
use crate::descriptor::{DatasetDescriptor, SizeClass, StorageFormat};
use crate::schema::{Constraint, Schema, SchemaMode, SemanticType};

static BUILTIN: Lazy<Arc<DatasetRegistry>> = Lazy::new(|| {
    let mut registry = DatasetRegistry::new();
    registry.register(periodic_table_descriptor());
    registry.register(autodock_descriptor());
    registry.register(ccd_descriptor());
    Arc::new(registry)
});

#[derive(Debug, Clone, Default)]
pub struct DatasetRegistry {
    datasets: IndexMap<String, Arc<DatasetDescriptor>>,
}

impl DatasetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registro compartido con los tres datasets incorporados.
    pub fn builtin() -> Arc<DatasetRegistry> {
        Arc::clone(&BUILTIN)
    }

    /// Inserta o reemplaza un descriptor por nombre.
    pub fn register(&mut self, descriptor: DatasetDescriptor) {
        self.datasets.insert(descriptor.name().to_string(), Arc::new(descriptor));
    }

    pub fn get(&self, name: &str) -> Option<Arc<DatasetDescriptor>> {
        self.datasets.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.datasets.keys().map(String::as_str).collect()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &Arc<DatasetDescriptor>> {
        self.datasets.values()
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

pub fn periodic_table_schema() -> Schema {
    use SemanticType::*;
    Schema::new(PERIODIC_TABLE, SchemaMode::Lenient).required("z", Integer)
                                                    .required("symbol", String)
                                                    .required("name", String)
                                                    .nullable("period", Integer)
                                                    .nullable("group", Integer)
                                                    .nullable("block", SemanticType::enumeration(&ELEMENT_BLOCKS))
                                                    .nullable("econfig", String)
                                                    .nullable("mass", Float)
                                                    .nullable("vdwr", Integer)
                                                    .nullable("vdwr_bo", Integer)
                                                    .nullable("ie", Float)
                                                    .nullable("ea", Float)
                                                    .nullable("en_pauling", Float)
                                                    .nullable("oxstates", IntegerList)
                                                    .nullable("state", SemanticType::enumeration(&STANDARD_STATES))
                                                    .nullable("mp", Float)
                                                    .nullable("bp", Float)
                                                    .nullable("density", Float)
                                                    .nullable("color_cpk", String)
                                                    .nullable("year", Integer)
                                                    .constraint(Constraint::Unique("z".into()))
                                                    .constraint(Constraint::Unique("symbol".into()))
                                                    .constraint(Constraint::Sequence { column: "z".into(), start: 1 })
}

pub fn autodock_schema() -> Schema {
    Schema::new(AUTODOCK_ATOM_TYPES, SchemaMode::Strict).required("type", SemanticType::String)
                                                        .required("element", SemanticType::String)
                                                        .nullable("description", SemanticType::String)
                                                        .required("hbond_acceptor", SemanticType::Boolean)
                                                        .required("hbond_donor", SemanticType::Boolean)
                                                        .nullable("hbond_count", SemanticType::Integer)
                                                        .constraint(Constraint::Unique("type".into()))
                                                        .constraint(Constraint::Exclusive { left: "hbond_acceptor".into(),
                                                                                            right: "hbond_donor".into() })
                                                        .constraint(Constraint::ZeroUnless { column: "hbond_count".into(),
                                                                                             unless: vec!["hbond_acceptor".into(), "hbond_donor".into()] })
}

/// Esquema de una categoría del CCD: columna id, bandera de aminoácido (nula
/// si no se pudo clasificar) y las columnas conocidas de la categoría. El
/// resto pasa sin validar.
pub fn ccd_schema(category: &str) -> Schema {
    let base = Schema::new(format!("{CCD}[{category}]"), SchemaMode::Lenient).required(ccd_id_column(category), SemanticType::String)
                                                                              .nullable(AMINO_ACID_FLAG, SemanticType::Boolean);
    match category {
        "chem_comp" => base.nullable("name", SemanticType::String)
                           .nullable("type", SemanticType::String)
                           .constraint(Constraint::Unique("id".into())),
        "chem_comp_atom" => base.required("atom_id", SemanticType::String)
                                .nullable("type_symbol", SemanticType::String)
                                .nullable("charge", SemanticType::Integer),
        "chem_comp_bond" => base.required("atom_id_1", SemanticType::String)
                                .required("atom_id_2", SemanticType::String)
                                .nullable("value_order", SemanticType::String),
        "pdbx_chem_comp_pcm" => base.nullable("pcm_id", SemanticType::Integer),
        "pdbx_chem_comp_synonyms" => base.nullable("ordinal", SemanticType::Integer)
                                         .nullable("name", SemanticType::String),
        _ => base,
    }
}

fn periodic_table_descriptor() -> DatasetDescriptor {
    DatasetDescriptor::single(PERIODIC_TABLE,
                              "atom/periodic_table.json",
                              StorageFormat::JsonRecords,
                              SizeClass::Small,
                              periodic_table_schema())
}

fn autodock_descriptor() -> DatasetDescriptor {
    DatasetDescriptor::single(AUTODOCK_ATOM_TYPES,
                              "atom/autodock_atom_types.json",
                              StorageFormat::JsonRecords,
                              SizeClass::Small,
                              autodock_schema())
}

fn ccd_descriptor() -> DatasetDescriptor {
    let schemas = CCD_CATEGORIES.iter()
                                .map(|c| (c.to_string(), ccd_schema(c)))
                                .collect::<IndexMap<_, _>>();
    DatasetDescriptor::partitioned(CCD,
                                   "pdb/ccd/{sub_key}.parquet",
                                   StorageFormat::Parquet,
                                   SizeClass::Large,
                                   CCD_CATEGORY_PARAMETER,
                                   schemas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::LoadStrategy;
    use std::path::PathBuf;

    #[test]
    fn builtin_registers_three_datasets_in_order() {
        let registry = DatasetRegistry::builtin();
        assert_eq!(registry.names(), vec![PERIODIC_TABLE, AUTODOCK_ATOM_TYPES, CCD]);
        assert!(registry.get("pdb/nope").is_none());
    }

    #[test]
    fn strategies_match_size_classes() {
        let registry = DatasetRegistry::builtin();
        assert_eq!(registry.get(PERIODIC_TABLE).unwrap().strategy(), LoadStrategy::Eager);
        assert_eq!(registry.get(AUTODOCK_ATOM_TYPES).unwrap().strategy(), LoadStrategy::Eager);
        assert_eq!(registry.get(CCD).unwrap().strategy(), LoadStrategy::Lazy);
    }

    #[test]
    fn ccd_is_partitioned_by_category() {
        let ccd = DatasetRegistry::builtin().get(CCD).unwrap();
        assert_eq!(ccd.sub_keys().len(), 11);
        assert_eq!(ccd.relative_path(Some("chem_comp_bond")).unwrap(), PathBuf::from("pdb/ccd/chem_comp_bond.parquet"));
        let schema = ccd.schema(Some("chem_comp")).unwrap();
        assert!(schema.columns().contains_key("id"));
        assert!(schema.columns().contains_key(AMINO_ACID_FLAG));
        let atoms = ccd.schema(Some("chem_comp_atom")).unwrap();
        assert!(atoms.columns().contains_key("comp_id"));
    }

    #[test]
    fn periodic_table_requires_contiguous_atomic_numbers() {
        let schema = periodic_table_schema();
        assert!(schema.constraints().contains(&Constraint::Sequence { column: "z".into(), start: 1 }));
        assert_eq!(schema.columns().len(), 20);
    }

    #[test]
    fn curated_tables_are_json_records() {
        let registry = DatasetRegistry::builtin();
        for name in [PERIODIC_TABLE, AUTODOCK_ATOM_TYPES] {
            let descriptor = registry.get(name).unwrap();
            assert_eq!(descriptor.format(), StorageFormat::JsonRecords);
            assert_eq!(descriptor.size_class(), SizeClass::Small);
        }
        assert_eq!(registry.get(PERIODIC_TABLE).unwrap().relative_path(None).unwrap(),
                   PathBuf::from("atom/periodic_table.json"));
    }

    #[test]
    fn autodock_schema_enforces_hbond_rules() {
        let constraints = autodock_schema().constraints().to_vec();
        assert!(constraints.iter().any(|c| matches!(c, Constraint::Exclusive { .. })));
        assert!(constraints.iter().any(|c| matches!(c, Constraint::ZeroUnless { column, .. } if column == "hbond_count")));
    }
}
