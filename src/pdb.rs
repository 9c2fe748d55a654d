//! Chemical Component Dictionary (CCD) del PDB.
//!
//! Cada categoría del CCD es una partición del dataset `pdb/ccd` (un fichero
//! Parquet por categoría) que se abre en modo lazy: los filtros por
//! componente y por variante se empujan al lector y sólo se materializan las
//! filas seleccionadas.
use std::fmt;
use std::str::FromStr;

use scicoda_core::constants::{ccd_id_column, AMINO_ACID_FLAG, CCD, CCD_CATEGORIES};
use scicoda_core::{CompIds, RowPredicate, Table};

use crate::errors::ScicodaError;
use crate::store::ArtifactStore;

const FUNCTION: &str = "ccd";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CcdCategory {
    ChemComp,
    ChemCompAtom,
    ChemCompBond,
    AtomRelated,
    Audit,
    Descriptor,
    Feature,
    Identifier,
    Pcm,
    Related,
    Synonyms,
}

impl CcdCategory {
    pub const ALL: [CcdCategory; 11] = [CcdCategory::ChemComp,
                                        CcdCategory::ChemCompAtom,
                                        CcdCategory::ChemCompBond,
                                        CcdCategory::AtomRelated,
                                        CcdCategory::Audit,
                                        CcdCategory::Descriptor,
                                        CcdCategory::Feature,
                                        CcdCategory::Identifier,
                                        CcdCategory::Pcm,
                                        CcdCategory::Related,
                                        CcdCategory::Synonyms];

    pub fn as_str(&self) -> &'static str {
        match self {
            CcdCategory::ChemComp => "chem_comp",
            CcdCategory::ChemCompAtom => "chem_comp_atom",
            CcdCategory::ChemCompBond => "chem_comp_bond",
            CcdCategory::AtomRelated => "pdbx_chem_comp_atom_related",
            CcdCategory::Audit => "pdbx_chem_comp_audit",
            CcdCategory::Descriptor => "pdbx_chem_comp_descriptor",
            CcdCategory::Feature => "pdbx_chem_comp_feature",
            CcdCategory::Identifier => "pdbx_chem_comp_identifier",
            CcdCategory::Pcm => "pdbx_chem_comp_pcm",
            CcdCategory::Related => "pdbx_chem_comp_related",
            CcdCategory::Synonyms => "pdbx_chem_comp_synonyms",
        }
    }

    /// Columna con el identificador del componente.
    pub fn id_column(&self) -> &'static str {
        ccd_id_column(self.as_str())
    }
}

impl fmt::Display for CcdCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CcdCategory {
    type Err = ScicodaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CcdCategory::ALL.into_iter()
                        .find(|c| c.as_str() == s)
                        .ok_or_else(|| ScicodaError::invalid_parameter(FUNCTION, "category", s, &CCD_CATEGORIES))
    }
}

/// Clasificación de componentes por la bandera `is_amino_acid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Variant {
    AminoAcid,
    NonAminoAcid,
    #[default]
    Any,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::AminoAcid, Variant::NonAminoAcid, Variant::Any];

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::AminoAcid => "amino_acid",
            Variant::NonAminoAcid => "non_amino_acid",
            Variant::Any => "any",
        }
    }

    /// Valor exigido a la bandera; `None` no filtra.
    pub fn flag(&self) -> Option<bool> {
        match self {
            Variant::AminoAcid => Some(true),
            Variant::NonAminoAcid => Some(false),
            Variant::Any => None,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = ScicodaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variant::ALL.into_iter()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| ScicodaError::invalid_parameter(FUNCTION, "variant", s, &Variant::ALL.map(|v| v.as_str())))
    }
}

/// Consulta tipada sobre una categoría del CCD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CcdQuery {
    category: CcdCategory,
    variant: Variant,
    comp_ids: CompIds,
}

impl CcdQuery {
    pub fn new(category: CcdCategory) -> Self {
        Self { category, variant: Variant::Any, comp_ids: CompIds::All }
    }

    pub fn variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    pub fn comp_ids(mut self, ids: impl Into<CompIds>) -> Self {
        self.comp_ids = ids.into();
        self
    }

    pub fn category(&self) -> CcdCategory {
        self.category
    }

    /// Predicado que se empuja al scan de la categoría.
    pub fn predicate(&self) -> RowPredicate {
        let predicate = RowPredicate::new().with_ids(self.category.id_column(), self.comp_ids.clone());
        match self.variant.flag() {
            Some(expected) => predicate.with_flag(AMINO_ACID_FLAG, expected),
            None => predicate,
        }
    }

    pub fn run(&self) -> Result<Table, ScicodaError> {
        self.run_in(ArtifactStore::global())
    }

    pub fn run_in(&self, store: &ArtifactStore) -> Result<Table, ScicodaError> {
        store.query(CCD, Some(self.category.as_str()), &self.predicate())
    }
}

/// Nombres de las categorías disponibles.
pub fn ccd_categories() -> &'static [&'static str] {
    &CCD_CATEGORIES
}

/// Filas de `category` para los componentes `comp_id` (uno, varios o todos
/// con `None`) restringidas a `variant` (`amino_acid`, `non_amino_acid` o
/// `any`). Un identificador inexistente produce una tabla vacía con el
/// esquema completo de la categoría.
pub fn ccd(comp_id: impl Into<CompIds>, category: &str, variant: &str) -> Result<Table, ScicodaError> {
    ccd_in(ArtifactStore::global(), comp_id, category, variant)
}

pub fn ccd_in(store: &ArtifactStore, comp_id: impl Into<CompIds>, category: &str, variant: &str) -> Result<Table, ScicodaError> {
    let category: CcdCategory = category.parse()?;
    let variant: Variant = variant.parse()?;
    CcdQuery::new(category).variant(variant).comp_ids(comp_id).run_in(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scicoda_core::Clause;

    #[test]
    fn categories_round_trip_through_names() {
        assert_eq!(ccd_categories().len(), CcdCategory::ALL.len());
        for (category, name) in CcdCategory::ALL.iter().zip(ccd_categories()) {
            assert_eq!(category.as_str(), *name);
            assert_eq!(name.parse::<CcdCategory>().unwrap(), *category);
        }
        assert_eq!(CcdCategory::ChemComp.id_column(), "id");
        assert_eq!(CcdCategory::ChemCompBond.id_column(), "comp_id");
    }

    #[test]
    fn invalid_names_list_the_allowed_domain() {
        match "atoms".parse::<CcdCategory>() {
            Err(ScicodaError::InvalidParameter { function, parameter, allowed, .. }) => {
                assert_eq!(function, "ccd");
                assert_eq!(parameter, "category");
                assert_eq!(allowed.len(), 11);
            }
            other => panic!("unexpected {other:?}"),
        }
        match "protein".parse::<Variant>() {
            Err(ScicodaError::InvalidParameter { allowed, .. }) => assert_eq!(allowed, vec!["amino_acid", "non_amino_acid", "any"]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn query_builds_pushdown_predicate() {
        let q = CcdQuery::new(CcdCategory::ChemComp).variant(Variant::NonAminoAcid).comp_ids("ATP");
        assert_eq!(q.predicate().clauses(),
                   &[Clause::Ids { column: "id".into(), ids: CompIds::One("ATP".into()) },
                     Clause::Flag { column: AMINO_ACID_FLAG.into(), expected: false }]);
        assert!(CcdQuery::new(CcdCategory::Audit).predicate().is_trivial());
    }

    #[test]
    fn bad_arguments_fail_before_touching_the_store() {
        let store = ArtifactStore::new("/nonexistent/scicoda");
        assert!(matches!(ccd_in(&store, "ALA", "bonds", "any"), Err(ScicodaError::InvalidParameter { .. })));
        assert!(matches!(ccd_in(&store, "ALA", "chem_comp", "all"), Err(ScicodaError::InvalidParameter { .. })));
        assert_eq!(store.stats().entries, 0);
    }
}
