//! Configuración central de la librería.
//! Carga variables de entorno (.env) una sola vez y expone una estructura
//! inmutable (`CONFIG`) con la ubicación de los artifacts.
use std::env;
use std::path::PathBuf;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

/// Directorio `data/` del propio crate (donde viven los artifacts incluidos).
pub const DEFAULT_DATA_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data");

pub const DATA_DIR_VAR: &str = "SCICODA_DATA_DIR";
pub const ZSTD_LEVEL_VAR: &str = "SCICODA_ZSTD_LEVEL";

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

/// Configuración global (extensible para más secciones).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data: DataConfig,
}

/// Ubicación y parámetros de escritura de los artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataConfig {
    /// Raíz bajo la que se resuelven las rutas relativas de cada dataset.
    pub data_dir: PathBuf,
    /// Nivel ZSTD con el que se escriben los artifacts Parquet.
    pub zstd_level: i32,
}

impl DataConfig {
    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        let data_dir = env::var(DATA_DIR_VAR).ok()
                                             .filter(|v| !v.trim().is_empty())
                                             .map(PathBuf::from)
                                             .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let zstd_level = env::var(ZSTD_LEVEL_VAR).ok()
                                                 .and_then(|v| v.parse().ok())
                                                 .unwrap_or(scicoda_persistence::DEFAULT_ZSTD_LEVEL);
        Self { data_dir, zstd_level }
    }

    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into(), zstd_level: scicoda_persistence::DEFAULT_ZSTD_LEVEL }
    }
}

/// Instancia global perezosa de configuración, evaluada una sola vez.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(|| AppConfig { data: DataConfig::from_env() });
