//! scicoda-core: tipos de dominio sin I/O.
//!
//! Tablas, esquemas y su validador, predicados de fila y los descriptores de
//! los datasets incorporados.
pub mod constants;
pub mod descriptor;
pub mod errors;
pub mod filter;
pub mod registry;
pub mod schema;
pub mod table;

pub use descriptor::{DatasetDescriptor, DescriptorError, LoadStrategy, Partitioning, SizeClass, StorageFormat};
pub use errors::SchemaError;
pub use filter::{Clause, CompIds, RowPredicate};
pub use registry::DatasetRegistry;
pub use schema::{validate, ColumnSpec, Constraint, Schema, SchemaMode, SemanticType};
pub use table::Table;
