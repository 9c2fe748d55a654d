//! scicoda-persistence: lectura y escritura de artifacts en disco.
//!
//! - `records`: JSON array de objetos (tablas pequeñas curadas).
//! - `columnar`: Parquet con ZSTD, lectura eager y `LazyScan` con pushdown.
//! - `atomic`: reemplazo atómico con checksum SHA-256.
pub mod atomic;
pub mod columnar;
pub mod error;
pub mod records;

pub use atomic::{sha256_hex, write_atomic, WrittenFile};
pub use columnar::{encode_parquet, read_parquet, LazyScan, DEFAULT_ZSTD_LEVEL};
pub use error::PersistenceError;
pub use records::{encode_records, parse_records, read_records};
