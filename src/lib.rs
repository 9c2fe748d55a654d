//! SciCoDa: datasets científicos de referencia, tipados y validados.
//!
//! - `atom`: tabla periódica y tipos de átomo de AutoDock.
//! - `pdb`: Chemical Component Dictionary, filtrable por componente y variante.
//! - `store`: caché por proceso que resuelve, genera, valida y carga artifacts.
//! - `builder` / `update`: frontera con los generadores externos de artifacts.
//!
//! Los tipos de tabla, esquema y predicado vienen de `scicoda-core`; los
//! formatos en disco, de `scicoda-persistence`.

pub mod atom;
pub mod builder;
pub mod config;
pub mod errors;
pub mod pdb;
pub mod store;
pub mod update;

pub use builder::{ArtifactBuilder, ArtifactSink, BuildReport, FnBuilder, WrittenArtifact};
pub use errors::{BoxError, ScicodaError};
pub use scicoda_core::{CompIds, RowPredicate, SchemaError, Table};
pub use store::{ArtifactStore, FetchCapability, StoreStats, TableHandle};
