//! Constantes de los datasets incorporados.
//!
//! Nombres lógicos, columnas con significado especial y dominios cerrados de
//! parámetros. Cambiar cualquiera de estos valores implica regenerar los
//! artifacts afectados con el flujo de actualización.

pub const PERIODIC_TABLE: &str = "atom/periodic_table";
pub const AUTODOCK_ATOM_TYPES: &str = "atom/autodock_atom_types";
pub const CCD: &str = "pdb/ccd";

/// Nombre público del parámetro que selecciona la categoría del CCD.
pub const CCD_CATEGORY_PARAMETER: &str = "category";

/// Columna booleana precalculada: el componente es variante de aminoácido.
pub const AMINO_ACID_FLAG: &str = "is_amino_acid";

/// Categorías del CCD, en el orden en que se publican.
pub const CCD_CATEGORIES: [&str; 11] = ["chem_comp",
                                        "chem_comp_atom",
                                        "chem_comp_bond",
                                        "pdbx_chem_comp_atom_related",
                                        "pdbx_chem_comp_audit",
                                        "pdbx_chem_comp_descriptor",
                                        "pdbx_chem_comp_feature",
                                        "pdbx_chem_comp_identifier",
                                        "pdbx_chem_comp_pcm",
                                        "pdbx_chem_comp_related",
                                        "pdbx_chem_comp_synonyms"];

/// Columna identificadora del componente en una categoría del CCD.
pub fn ccd_id_column(category: &str) -> &'static str {
    if category == "chem_comp" {
        "id"
    } else {
        "comp_id"
    }
}

pub const ELEMENT_BLOCKS: [&str; 10] = ["actinide",
                                        "alkali metal",
                                        "alkaline earth metal",
                                        "halogen",
                                        "lanthanide",
                                        "metalloid",
                                        "noble gas",
                                        "nonmetal",
                                        "post-transition metal",
                                        "transition metal"];

pub const STANDARD_STATES: [&str; 3] = ["solid", "liquid", "gas"];
