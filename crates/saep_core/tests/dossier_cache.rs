use saep_core::db::open_db_in_memory;
use saep_core::{
    ActivityReport, Collection, DocumentOpinionRepository, DocumentStore, Dossier, Opinion,
    OpinionRepository, RepoError, SqliteDocumentStore,
};

fn dossier(id: &str) -> Dossier {
    let mut dossier = Dossier::new(id, 2023);
    dossier.reports = vec![
        ActivityReport::new("aula")
            .with_value("disciplina", "Compiladores")
            .with_value("cha", 64.0),
        ActivityReport::new("orientacao")
            .with_value("discente", "Ana")
            .with_value("concluida", true),
    ];
    dossier
}

#[test]
fn persist_dossier_round_trips_reports() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let repo = DocumentOpinionRepository::new(store);
    let original = dossier("radoc-1");

    let id = repo.persist_dossier(&original).unwrap();
    assert_eq!(id, "radoc-1");

    let loaded = repo.dossier_by_id("radoc-1").unwrap().unwrap();
    assert_eq!(loaded.base_year, 2023);
    assert_eq!(loaded.reports.len(), 2);
    for report in &original.reports {
        assert!(loaded.reports.contains(report));
    }

    let raw = store
        .find_by_key(Collection::Dossiers, "radoc-1")
        .unwrap()
        .unwrap();
    assert_eq!(raw.body["relatos"].as_array().unwrap().len(), 2);
    assert_eq!(store.count(Collection::Reports).unwrap(), 2);
}

#[test]
fn persist_dossier_with_nan_entry_stores_nothing() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let repo = DocumentOpinionRepository::new(store);
    let mut broken = dossier("radoc-1");
    broken
        .reports
        .push(ActivityReport::new("aula").with_value("cha", f64::NAN));

    let err = repo.persist_dossier(&broken).unwrap_err();
    assert!(matches!(err, RepoError::NonFiniteNumber(ref field) if field == "cha"));
    assert_eq!(store.count(Collection::Dossiers).unwrap(), 0);
    assert_eq!(store.count(Collection::Reports).unwrap(), 0);
}

#[test]
fn dossier_by_id_of_unknown_id_is_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = DocumentOpinionRepository::new(SqliteDocumentStore::new(&conn));
    assert!(repo.dossier_by_id("radoc-x").unwrap().is_none());
}

#[test]
fn persist_dossier_twice_is_duplicate_without_extra_reports() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let repo = DocumentOpinionRepository::new(store);
    repo.persist_dossier(&dossier("radoc-1")).unwrap();

    let err = repo.persist_dossier(&dossier("radoc-1")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::DuplicateId {
            collection: Collection::Dossiers,
            ..
        }
    ));
    assert_eq!(store.count(Collection::Reports).unwrap(), 2);
}

#[test]
fn remove_dossier_deletes_dossier_and_reports() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let repo = DocumentOpinionRepository::new(store);
    repo.persist_dossier(&dossier("radoc-1")).unwrap();
    repo.persist_dossier(&dossier("radoc-2")).unwrap();

    repo.remove_dossier("radoc-1").unwrap();

    assert!(repo.dossier_by_id("radoc-1").unwrap().is_none());
    assert!(store
        .find_by_parent(Collection::Reports, "radoc-1")
        .unwrap()
        .is_empty());
    assert_eq!(
        repo.dossier_by_id("radoc-2").unwrap().unwrap().reports.len(),
        2
    );
}

#[test]
fn remove_dossier_referenced_by_opinion_is_blocked() {
    let conn = open_db_in_memory().unwrap();
    let repo = DocumentOpinionRepository::new(SqliteDocumentStore::new(&conn));
    repo.persist_dossier(&dossier("radoc-1")).unwrap();

    let mut opinion = Opinion::new("p-1", "res-1");
    opinion.dossier_ids = vec!["radoc-0".to_string(), "radoc-1".to_string()];
    repo.persist(&opinion).unwrap();

    let err = repo.remove_dossier("radoc-1").unwrap_err();
    match err {
        RepoError::ReferencedByOpinion {
            dossier_id,
            opinion_id,
        } => {
            assert_eq!(dossier_id, "radoc-1");
            assert_eq!(opinion_id, "p-1");
        }
        other => panic!("unexpected error: {other}"),
    }

    let kept = repo.dossier_by_id("radoc-1").unwrap().unwrap();
    assert_eq!(kept.reports.len(), 2);

    repo.remove("p-1").unwrap();
    repo.remove_dossier("radoc-1").unwrap();
    assert!(repo.dossier_by_id("radoc-1").unwrap().is_none());
}

#[test]
fn remove_unknown_dossier_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = DocumentOpinionRepository::new(SqliteDocumentStore::new(&conn));
    let err = repo.remove_dossier("radoc-x").unwrap_err();
    assert!(matches!(err, RepoError::NotFound { entity: "dossier", .. }));
}
