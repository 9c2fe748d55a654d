//! Regeneración de artifacts.
//!
//! Ninguna lectura invoca estas funciones (salvo el build automático de un
//! artifact ausente, que vive en el store). Tras un build correcto se
//! descartan las entradas de caché del dataset para que la siguiente lectura
//! vea los ficheros nuevos.
use indexmap::IndexMap;
use log::{info, warn};

use crate::builder::BuildReport;
use crate::errors::ScicodaError;
use crate::store::ArtifactStore;

/// Regenera un dataset con su builder registrado.
pub fn update(store: &ArtifactStore, dataset: &str) -> Result<BuildReport, ScicodaError> {
    store.rebuild(dataset)
}

/// Regenera todos los datasets del registro, en orden de registro.
///
/// Un fallo no detiene al resto; cada dataset tiene su resultado en el mapa.
/// Los datasets sin builder se informan como `MissingDependency`.
pub fn update_all(store: &ArtifactStore) -> IndexMap<String, Result<BuildReport, ScicodaError>> {
    let names: Vec<String> = store.registry().names().into_iter().map(str::to_string).collect();
    let mut results = IndexMap::with_capacity(names.len());
    for name in names {
        let result = store.rebuild(&name);
        match &result {
            Ok(report) => info!("update:done dataset={name} artifacts={} rows={}", report.artifacts.len(), report.total_rows()),
            Err(e) => warn!("update:failed dataset={name} error={e}"),
        }
        results.insert(name, result);
    }
    results
}
