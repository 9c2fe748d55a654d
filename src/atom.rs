//! Datasets atómicos.

use scicoda_core::constants::{AUTODOCK_ATOM_TYPES, PERIODIC_TABLE};
use scicoda_core::{RowPredicate, Table};

use crate::errors::ScicodaError;
use crate::store::ArtifactStore;

/// Tabla periódica: una fila por elemento, con `z` contiguo desde 1.
///
/// Columnas: `z`, `symbol`, `name`, `period`, `group` (nulo para lantánidos y
/// actínidos), `block`, `econfig`, `mass`, `vdwr`, `vdwr_bo`, `ie`, `ea`,
/// `en_pauling`, `oxstates` (lista de enteros), `state`, `mp`, `bp`,
/// `density`, `color_cpk` y `year` (nulo si se conoce desde la antigüedad).
pub fn periodic_table() -> Result<Table, ScicodaError> {
    periodic_table_in(ArtifactStore::global())
}

pub fn periodic_table_in(store: &ArtifactStore) -> Result<Table, ScicodaError> {
    store.query(PERIODIC_TABLE, None, &RowPredicate::new())
}

/// Tipos de átomo de AutoDock4.
///
/// Columnas: `type`, `element`, `description`, `hbond_acceptor`,
/// `hbond_donor` y `hbond_count` (0 si no forma puentes de hidrógeno, nulo
/// para los de enlace esférico). Un tipo nunca es aceptor y donador a la vez.
pub fn autodock_atom_types() -> Result<Table, ScicodaError> {
    autodock_atom_types_in(ArtifactStore::global())
}

pub fn autodock_atom_types_in(store: &ArtifactStore) -> Result<Table, ScicodaError> {
    store.query(AUTODOCK_ATOM_TYPES, None, &RowPredicate::new())
}
