use saep_core::db::open_db_in_memory;
use saep_core::store::to_document;
use saep_core::{
    ActivityReport, Collection, DocumentOpinionRepository, DocumentStore, Dossier,
    MaintenanceService, Note, Opinion, OpinionRepository, OrphanPurge, Score,
    SqliteDocumentStore,
};

fn note(attribute: &str) -> Note {
    Note::new(Score::new(attribute, 1.0), Score::new(attribute, 2.0), "j")
}

fn note_refs(store: &SqliteDocumentStore<'_>, opinion_id: &str) -> Vec<serde_json::Value> {
    store
        .find_by_key(Collection::Opinions, opinion_id)
        .unwrap()
        .unwrap()
        .body["notas"]
        .as_array()
        .unwrap()
        .clone()
}

#[test]
fn rebuild_references_restores_missing_and_dangling_keys() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let repo = DocumentOpinionRepository::new(store);
    let mut opinion = Opinion::new("p-1", "res-1");
    opinion.notes = vec![note("a")];
    repo.persist(&opinion).unwrap();

    // Child inserted without its parent reference.
    let body = to_document(&note("b")).unwrap();
    store
        .insert_one(Collection::Notes, None, Some("p-1"), &body)
        .unwrap();
    // Reference left behind by a deleted child.
    store
        .push_to_array(Collection::Opinions, "p-1", "notas", "gone")
        .unwrap();

    let service = MaintenanceService::new(store);
    assert_eq!(service.rebuild_references().unwrap(), 1);

    let refs = note_refs(&store, "p-1");
    assert_eq!(refs.len(), 2);
    assert!(!refs.iter().any(|key| key == "gone"));
    assert_eq!(repo.by_id("p-1").unwrap().unwrap().notes.len(), 2);

    assert_eq!(service.rebuild_references().unwrap(), 0);
}

#[test]
fn rebuild_references_leaves_consistent_parents_alone() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let repo = DocumentOpinionRepository::new(store);
    let mut opinion = Opinion::new("p-1", "res-1");
    opinion.notes = vec![note("a"), note("b")];
    repo.persist(&opinion).unwrap();
    let mut dossier = Dossier::new("radoc-1", 2022);
    dossier.reports = vec![ActivityReport::new("aula").with_value("cha", 30.0)];
    repo.persist_dossier(&dossier).unwrap();

    let service = MaintenanceService::new(store);
    assert_eq!(service.rebuild_references().unwrap(), 0);
}

#[test]
fn purge_orphans_removes_children_without_parents() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteDocumentStore::new(&conn);
    let repo = DocumentOpinionRepository::new(store);
    let mut opinion = Opinion::new("p-1", "res-1");
    opinion.notes = vec![note("a")];
    repo.persist(&opinion).unwrap();

    let note_body = to_document(&note("z")).unwrap();
    store
        .insert_one(Collection::Notes, None, Some("p-ghost"), &note_body)
        .unwrap();
    let report_body = to_document(&ActivityReport::new("aula")).unwrap();
    store
        .insert_one(Collection::Reports, None, Some("radoc-ghost"), &report_body)
        .unwrap();
    store
        .insert_one(Collection::Reports, None, Some("radoc-ghost"), &report_body)
        .unwrap();

    let service = MaintenanceService::new(store);
    assert_eq!(
        service.purge_orphans().unwrap(),
        OrphanPurge {
            notes: 1,
            reports: 2
        }
    );
    assert_eq!(store.count(Collection::Notes).unwrap(), 1);
    assert_eq!(store.count(Collection::Reports).unwrap(), 0);
    assert_eq!(service.purge_orphans().unwrap(), OrphanPurge::default());
    assert_eq!(repo.by_id("p-1").unwrap().unwrap().notes.len(), 1);
}
