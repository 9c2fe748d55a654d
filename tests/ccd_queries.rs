
use scicoda::pdb::{self, CcdCategory, CcdQuery, Variant};
use scicoda::{CompIds, RowPredicate, ScicodaError};
use scicoda_core::constants::{AMINO_ACID_FLAG, CCD};
use scicoda_core::LoadStrategy;
use test_support::*;

fn ids(table: &scicoda::Table, column: &str) -> Vec<String> {
    table.column_strings(column).unwrap().into_iter().flatten().collect()
}

#[test]
fn ccd_categories_are_lazy_and_pushdown_matches_post_filter() {
    let (_dir, store, _calls) = store_with_builders();
    let handle = store.get(CCD, Some("chem_comp_atom")).unwrap();
    assert_eq!(handle.strategy(), LoadStrategy::Lazy);
    let full = handle.table().unwrap();
    assert_eq!(full.num_rows(), 8);

    let cases: Vec<(CompIds, Variant)> = vec![(CompIds::All, Variant::Any),
                                              (CompIds::from("ALA"), Variant::Any),
                                              (CompIds::from(vec!["ALA", "HOH"]), Variant::AminoAcid),
                                              (CompIds::All, Variant::NonAminoAcid),
                                              (CompIds::from(vec!["UNK"]), Variant::Any),];
    for (comp_ids, variant) in cases {
        let query = CcdQuery::new(CcdCategory::ChemCompAtom).variant(variant).comp_ids(comp_ids.clone());
        let pushed = query.run_in(&store).unwrap();
        let post = full.filter(&query.predicate()).unwrap();
        assert_eq!(pushed, post, "comp_ids={comp_ids:?} variant={variant}");
    }
}

#[test]
fn single_component_in_chem_comp_uses_id_column() {
    let (_dir, store, _calls) = store_with_builders();
    let ala = pdb::ccd_in(&store, "ALA", "chem_comp", "any").unwrap();
    assert_eq!(ids(&ala, "id"), vec!["ALA"]);
    // Columnas no declaradas del CCD se conservan detrás de las declaradas.
    assert!(ala.has_column("formula"));
    assert_eq!(ala.column_names().last().map(String::as_str), Some("formula"));
}

#[test]
fn variants_split_on_the_amino_acid_flag() {
    let (_dir, store, _calls) = store_with_builders();
    let aa = pdb::ccd_in(&store, None::<&str>, "chem_comp", "amino_acid").unwrap();
    let non_aa = pdb::ccd_in(&store, None::<&str>, "chem_comp", "non_amino_acid").unwrap();
    let any = pdb::ccd_in(&store, None::<&str>, "chem_comp", "any").unwrap();
    assert_eq!(ids(&aa, "id"), vec!["ALA"]);
    assert_eq!(ids(&non_aa, "id"), vec!["ATP", "HOH"]);
    // UNK tiene la bandera nula: sólo aparece sin filtro de variante.
    assert_eq!(ids(&any, "id"), vec!["ALA", "ATP", "HOH", "UNK"]);
}

#[test]
fn id_sets_select_members_only() {
    let (_dir, store, _calls) = store_with_builders();
    let bonds = pdb::ccd_in(&store, vec!["ATP", "ALA", "XYZ"], "chem_comp_bond", "any").unwrap();
    assert_eq!(bonds.num_rows(), 3);
    let none = pdb::ccd_in(&store, Vec::<String>::new(), "chem_comp_bond", "any").unwrap();
    assert_eq!(none.num_rows(), 0);
}

#[test]
fn unknown_component_yields_empty_table_with_full_schema() {
    let (_dir, store, _calls) = store_with_builders();
    let full = pdb::ccd_in(&store, None::<&str>, "chem_comp", "any").unwrap();
    let empty = pdb::ccd_in(&store, "ZZZ", "chem_comp", "any").unwrap();
    assert_eq!(empty.num_rows(), 0);
    assert_eq!(empty.schema(), full.schema());
    assert!(empty.has_column(AMINO_ACID_FLAG));
    // Case-sensitive: "ala" no es "ALA".
    assert!(pdb::ccd_in(&store, "ala", "chem_comp", "any").unwrap().is_empty());
}

#[test]
fn bad_category_or_variant_is_rejected_before_io() {
    let (_dir, store, calls) = store_with_builders();
    match pdb::ccd_in(&store, "ALA", "chem_comp_atoms", "any") {
        Err(ScicodaError::InvalidParameter { parameter, argument, allowed, .. }) => {
            assert_eq!(parameter, "category");
            assert_eq!(argument, "chem_comp_atoms");
            assert!(allowed.iter().any(|a| a == "chem_comp_atom"));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(pdb::ccd_in(&store, "ALA", "chem_comp", "aa"), Err(ScicodaError::InvalidParameter { .. })));
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert_eq!(store.stats().loads, 0);
}

#[test]
fn one_build_writes_every_category() {
    let (dir, store, calls) = store_with_builders();
    pdb::ccd_in(&store, "ALA", "chem_comp", "any").unwrap();
    for category in pdb::ccd_categories() {
        assert!(dir.path().join(format!("pdb/ccd/{category}.parquet")).is_file());
    }
    // Otras categorías se sirven de los ficheros ya generados.
    let synonyms = store.query(CCD, Some("pdbx_chem_comp_synonyms"), &RowPredicate::new().with_ids("comp_id", "HOH")).unwrap();
    assert_eq!(ids(&synonyms, "name"), vec!["water"]);
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(store.stats().builds, 1);
}
