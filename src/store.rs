//! Artifact Store: caché de tablas por proceso.
//!
//! Resuelve `(dataset, sub_key)` a un `TableHandle` compartido:
//!
//! 1. Valida nombre y sub-clave contra el registro (antes de cualquier I/O).
//! 2. Si la entrada ya está en caché la devuelve sin tocar disco.
//! 3. Si el artifact no existe, ejecuta una única vez el builder registrado.
//! 4. Carga según la estrategia del descriptor y valida contra el esquema.
//!
//! Cada clave tiene su propio `OnceCell`: llamadas concurrentes sobre la misma
//! clave esperan a una única carga, y claves distintas no se bloquean entre sí.
//! El resultado de un build también se memoiza por dataset, de modo que un
//! fallo de fetch no se reintenta en cada acceso (sólo `update` lo reinicia).
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use arrow::datatypes::SchemaRef;
use dashmap::DashMap;
use log::{debug, info, warn};
use once_cell::sync::{Lazy, OnceCell};
use scicoda_core::{validate, DatasetDescriptor, DatasetRegistry, LoadStrategy, RowPredicate, Schema, StorageFormat, Table};
use scicoda_persistence::{read_parquet, read_records, LazyScan};

use crate::builder::{ArtifactBuilder, ArtifactSink, BuildReport};
use crate::config::{DataConfig, CONFIG};
use crate::errors::ScicodaError;

static GLOBAL: Lazy<ArtifactStore> = Lazy::new(|| ArtifactStore::from_config(&CONFIG.data));

/// Clave de caché: nombre lógico y sub-clave opcional.
pub type CacheKey = (String, Option<String>);

/// Tabla cargada (eager) o scan diferido ya validado a nivel de esquema.
#[derive(Debug)]
pub enum TableHandle {
    Eager(Table),
    Lazy { scan: LazyScan, schema: Schema, output: SchemaRef },
}

impl TableHandle {
    pub fn strategy(&self) -> LoadStrategy {
        match self {
            TableHandle::Eager(_) => LoadStrategy::Eager,
            TableHandle::Lazy { .. } => LoadStrategy::Lazy,
        }
    }

    /// Esquema Arrow de las filas que devuelve `query`.
    pub fn schema(&self) -> SchemaRef {
        match self {
            TableHandle::Eager(table) => table.schema(),
            TableHandle::Lazy { output, .. } => Arc::clone(output),
        }
    }

    /// Filas que cumplen el predicado. En modo lazy el predicado se empuja al
    /// lector y las filas resultantes se validan antes de devolverlas.
    pub fn query(&self, predicate: &RowPredicate) -> Result<Table, ScicodaError> {
        match self {
            TableHandle::Eager(table) => Ok(table.filter(predicate)?),
            TableHandle::Lazy { scan, schema, .. } => {
                let rows = scan.collect(predicate).map_err(ScicodaError::storage(scan.path()))?;
                Ok(validate(rows, schema)?)
            }
        }
    }

    /// Tabla completa.
    pub fn table(&self) -> Result<Table, ScicodaError> {
        self.query(&RowPredicate::new())
    }
}

/// Si un dataset puede generarse en este proceso.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchCapability {
    Available,
    Unavailable { details: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStats {
    /// Entradas de caché inicializadas.
    pub entries: usize,
    /// Cargas desde disco completadas.
    pub loads: usize,
    /// Builds ejecutados con éxito.
    pub builds: usize,
}

/// Resultado memoizado de un build; el error se guarda como texto para poder
/// compartirlo entre llamadores.
type BuildOutcome = Result<(), String>;

pub struct ArtifactStore {
    registry: Arc<DatasetRegistry>,
    data_dir: PathBuf,
    zstd_level: i32,
    builders: DashMap<String, Arc<dyn ArtifactBuilder>>,
    entries: DashMap<CacheKey, Arc<OnceCell<Arc<TableHandle>>>>,
    builds: DashMap<String, Arc<OnceCell<BuildOutcome>>>,
    loads: AtomicUsize,
    build_count: AtomicUsize,
}

impl ArtifactStore {
    /// Store sobre el registro incorporado con el directorio dado.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self::from_config(&DataConfig::with_data_dir(data_dir))
    }

    pub fn from_config(config: &DataConfig) -> Self {
        Self::with_registry(DatasetRegistry::builtin(), config)
    }

    pub fn with_registry(registry: Arc<DatasetRegistry>, config: &DataConfig) -> Self {
        Self { registry,
               data_dir: config.data_dir.clone(),
               zstd_level: config.zstd_level,
               builders: DashMap::new(),
               entries: DashMap::new(),
               builds: DashMap::new(),
               loads: AtomicUsize::new(0),
               build_count: AtomicUsize::new(0) }
    }

    /// Instancia compartida del proceso, configurada desde el entorno.
    pub fn global() -> &'static ArtifactStore {
        &GLOBAL
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn registry(&self) -> &DatasetRegistry {
        &self.registry
    }

    /// Registra (o reemplaza) el builder del dataset que declara `builder.name()`.
    pub fn register_builder(&self, builder: impl ArtifactBuilder + 'static) -> Result<(), ScicodaError> {
        let name = builder.name().to_string();
        self.descriptor("register_builder", &name)?;
        self.builds.remove(&name);
        self.builders.insert(name, Arc::new(builder));
        Ok(())
    }

    pub fn fetch_capability(&self, dataset: &str) -> Result<FetchCapability, ScicodaError> {
        self.descriptor("fetch_capability", dataset)?;
        if self.builders.contains_key(dataset) {
            Ok(FetchCapability::Available)
        } else {
            Ok(FetchCapability::Unavailable { details: format!("no builder registered for '{dataset}'; register one with ArtifactStore::register_builder") })
        }
    }

    /// Handle compartido para `(dataset, sub_key)`. Idempotente: llamadas
    /// repetidas devuelven el mismo `Arc` sin nueva I/O.
    pub fn get(&self, dataset: &str, sub_key: Option<&str>) -> Result<Arc<TableHandle>, ScicodaError> {
        let descriptor = self.descriptor("get", dataset)?;
        let sub_key = descriptor.check_sub_key(sub_key)
                                .map_err(|e| ScicodaError::from_descriptor("get", e))?;
        let key: CacheKey = (dataset.to_string(), sub_key.map(str::to_string));

        // El Arc se clona fuera del mapa: ningún guard de DashMap se mantiene durante la carga.
        let cell = Arc::clone(&self.entries.entry(key).or_default());
        if let Some(handle) = cell.get() {
            debug!("store:hit dataset={dataset} sub_key={sub_key:?}");
            return Ok(Arc::clone(handle));
        }
        let handle = cell.get_or_try_init(|| self.load(&descriptor, sub_key).map(Arc::new))?;
        Ok(Arc::clone(handle))
    }

    /// Atajo: `get` seguido de `TableHandle::query`.
    pub fn query(&self, dataset: &str, sub_key: Option<&str>, predicate: &RowPredicate) -> Result<Table, ScicodaError> {
        self.get(dataset, sub_key)?.query(predicate)
    }

    /// Descarta las entradas de caché y el build memoizado de un dataset.
    pub fn invalidate(&self, dataset: &str) {
        self.entries.retain(|(name, _), _| name != dataset);
        self.builds.remove(dataset);
        debug!("store:invalidate dataset={dataset}");
    }

    pub fn stats(&self) -> StoreStats {
        let entries = self.entries.iter().filter(|e| e.value().get().is_some()).count();
        StoreStats { entries,
                     loads: self.loads.load(Ordering::SeqCst),
                     builds: self.build_count.load(Ordering::SeqCst) }
    }

    /// Ejecuta el builder del dataset sin consultar la memoización e invalida
    /// la caché del dataset. Un build fallido puede haber reemplazado parte de
    /// las particiones, así que también invalida en ese caso.
    pub(crate) fn rebuild(&self, dataset: &str) -> Result<BuildReport, ScicodaError> {
        let descriptor = self.descriptor("update", dataset)?;
        let builder = self.builder(dataset).ok_or_else(|| ScicodaError::MissingDependency {
                                                    dataset: dataset.to_string(),
                                                    details: "no builder registered; the dataset can only be read from an existing artifact".to_string(),
                                                })?;
        let result = self.run_build(&descriptor, builder.as_ref());
        self.invalidate(dataset);
        result
    }

    fn descriptor(&self, function: &str, dataset: &str) -> Result<Arc<DatasetDescriptor>, ScicodaError> {
        self.registry
            .get(dataset)
            .ok_or_else(|| ScicodaError::invalid_parameter(function, "dataset", dataset, &self.registry.names()[..]))
    }

    fn builder(&self, dataset: &str) -> Option<Arc<dyn ArtifactBuilder>> {
        self.builders.get(dataset).map(|b| Arc::clone(b.value()))
    }

    fn load(&self, descriptor: &DatasetDescriptor, sub_key: Option<&str>) -> Result<TableHandle, ScicodaError> {
        let relative = descriptor.relative_path(sub_key)
                                 .map_err(|e| ScicodaError::from_descriptor("get", e))?;
        let path = self.data_dir.join(relative);
        if !path.is_file() {
            self.ensure_built(descriptor, &path)?;
        }
        let schema = descriptor.schema(sub_key)
                               .map_err(|e| ScicodaError::from_descriptor("get", e))?;

        let handle = match descriptor.strategy() {
            LoadStrategy::Eager => {
                let raw = match descriptor.format() {
                    StorageFormat::JsonRecords => read_records(&path, &schema.arrow_schema()),
                    StorageFormat::Parquet => read_parquet(&path),
                }.map_err(ScicodaError::storage(&path))?;
                TableHandle::Eager(validate(raw, schema)?)
            }
            LoadStrategy::Lazy => {
                let scan = LazyScan::open(&path).map_err(ScicodaError::storage(&path))?;
                // Sólo esquema: tipos y columnas se comprueban ya; los valores, por consulta.
                let output = validate(Table::empty(scan.schema()), schema)?.schema();
                TableHandle::Lazy { scan, schema: schema.clone(), output }
            }
        };
        self.loads.fetch_add(1, Ordering::SeqCst);
        debug!("store:load dataset={} sub_key={:?} strategy={:?} path={}",
               descriptor.name(),
               sub_key,
               handle.strategy(),
               path.display());
        Ok(handle)
    }

    /// Genera el artifact que falta, una sola vez por dataset.
    fn ensure_built(&self, descriptor: &DatasetDescriptor, path: &Path) -> Result<(), ScicodaError> {
        let dataset = descriptor.name();
        let Some(builder) = self.builder(dataset) else {
            return Err(ScicodaError::DatasetNotFound { dataset: dataset.to_string(),
                                                       path: path.to_path_buf(),
                                                       guidance: format!("no builder is registered for '{dataset}'; register one and run update, \
                                                                          or point SCICODA_DATA_DIR at a directory that contains the artifact") });
        };

        let cell = Arc::clone(&self.builds.entry(dataset.to_string()).or_default());
        let mut first_error = None;
        let outcome = cell.get_or_init(|| match self.run_build(descriptor, builder.as_ref()) {
                              Ok(_) => Ok(()),
                              Err(e) => {
                                  let message = e.to_string();
                                  warn!("store:build_failed dataset={dataset} error={message}");
                                  first_error = Some(e);
                                  Err(message)
                              }
                          });
        if let Some(err) = first_error {
            return Err(err);
        }
        match outcome {
            Err(message) => Err(ScicodaError::DatasetNotFound { dataset: dataset.to_string(),
                                                                path: path.to_path_buf(),
                                                                guidance: format!("an earlier build attempt failed ({message}); run update to retry") }),
            Ok(()) if !path.is_file() => Err(ScicodaError::DatasetNotFound { dataset: dataset.to_string(),
                                                                             path: path.to_path_buf(),
                                                                             guidance: format!("the builder for '{dataset}' completed without writing this artifact") }),
            Ok(()) => Ok(()),
        }
    }

    fn run_build(&self, descriptor: &DatasetDescriptor, builder: &dyn ArtifactBuilder) -> Result<BuildReport, ScicodaError> {
        let dataset = descriptor.name();
        info!("store:build:start dataset={dataset}");
        let mut sink = ArtifactSink::new(descriptor, &self.data_dir, self.zstd_level);
        builder.build(&mut sink)
               .map_err(|e| ScicodaError::from_builder(dataset, e))?;
        let report = sink.into_report();
        self.build_count.fetch_add(1, Ordering::SeqCst);
        info!("store:build:done dataset={dataset} artifacts={} rows={}", report.artifacts.len(), report.total_rows());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scicoda_core::constants::{AUTODOCK_ATOM_TYPES, CCD, PERIODIC_TABLE};

    #[test]
    fn unknown_dataset_fails_before_io() {
        let store = ArtifactStore::new("/nonexistent/scicoda");
        match store.get("atom/nope", None) {
            Err(ScicodaError::InvalidParameter { parameter, allowed, .. }) => {
                assert_eq!(parameter, "dataset");
                assert_eq!(allowed, vec![PERIODIC_TABLE, AUTODOCK_ATOM_TYPES, CCD]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(store.stats(), StoreStats::default());
    }

    #[test]
    fn bad_sub_key_fails_before_io() {
        let store = ArtifactStore::new("/nonexistent/scicoda");
        assert!(matches!(store.get(CCD, Some("chem")), Err(ScicodaError::InvalidParameter { .. })));
        assert!(matches!(store.get(CCD, None), Err(ScicodaError::InvalidParameter { .. })));
        assert!(matches!(store.get(PERIODIC_TABLE, Some("x")), Err(ScicodaError::InvalidParameter { .. })));
    }

    #[test]
    fn missing_artifact_without_builder_gives_guidance() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        match store.get(PERIODIC_TABLE, None) {
            Err(ScicodaError::DatasetNotFound { dataset, path, guidance }) => {
                assert_eq!(dataset, PERIODIC_TABLE);
                assert_eq!(path, store.data_dir().join("atom/periodic_table.json"));
                assert!(guidance.contains("register"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(store.fetch_capability(PERIODIC_TABLE).unwrap(),
                   FetchCapability::Unavailable { details: format!("no builder registered for '{PERIODIC_TABLE}'; register one with ArtifactStore::register_builder") });
    }

    #[test]
    fn failed_load_is_retried_on_next_access() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(store.get(AUTODOCK_ATOM_TYPES, None).is_err());
        std::fs::create_dir_all(dir.path().join("atom")).unwrap();
        std::fs::write(dir.path().join("atom/autodock_atom_types.json"),
                       br#"[{"type": "C", "element": "C", "description": "carbon", "hbond_acceptor": false, "hbond_donor": false, "hbond_count": 0}]"#).unwrap();
        let handle = store.get(AUTODOCK_ATOM_TYPES, None).unwrap();
        assert_eq!(handle.strategy(), LoadStrategy::Eager);
        assert_eq!(store.stats().loads, 1);
    }
}
