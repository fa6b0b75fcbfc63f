use saep_core::db::open_db_in_memory;
use saep_core::{
    DocumentOpinionRepository, Note, Opinion, OpinionRepository, OpinionService,
    OpinionServiceError, Score, SqliteDocumentStore,
};

#[test]
fn record_note_supersedes_note_on_same_original() {
    let conn = open_db_in_memory().unwrap();
    let repo = DocumentOpinionRepository::new(SqliteDocumentStore::new(&conn));
    let mut opinion = Opinion::new("p-1", "res-1");
    opinion.notes = vec![
        Note::new(Score::new("ensino", 10.0), Score::new("ensino", 12.0), "primeira"),
        Note::new(Score::new("pesquisa", 3.0), Score::new("pesquisa", 4.0), "outra"),
    ];
    repo.persist(&opinion).unwrap();
    let service = OpinionService::new(repo);

    let revised = Note::new(
        Score::new("ensino", 10.0),
        Score::new("ensino", 14.0),
        "revista",
    );
    let updated = service.record_note("p-1", &revised).unwrap();

    assert_eq!(updated.notes.len(), 2);
    assert!(updated.notes.contains(&revised));
    assert!(!updated
        .notes
        .iter()
        .any(|note| note.justification == "primeira"));
}

#[test]
fn record_note_on_fresh_item_appends() {
    let conn = open_db_in_memory().unwrap();
    let repo = DocumentOpinionRepository::new(SqliteDocumentStore::new(&conn));
    repo.persist(&Opinion::new("p-1", "res-1")).unwrap();
    let service = OpinionService::new(repo);

    let note = Note::new(Score::new("extensao", 1.0), Score::new("extensao", 2.0), "j");
    let updated = service.record_note("p-1", &note).unwrap();

    assert_eq!(updated.notes, vec![note]);
}

#[test]
fn amend_grounding_returns_refreshed_opinion() {
    let conn = open_db_in_memory().unwrap();
    let repo = DocumentOpinionRepository::new(SqliteDocumentStore::new(&conn));
    repo.persist(&Opinion::new("p-1", "res-1")).unwrap();
    let service = OpinionService::new(repo);

    let updated = service.amend_grounding("p-1", "Aprovado com ressalvas").unwrap();
    assert_eq!(updated.grounding, "Aprovado com ressalvas");
    assert_eq!(
        service.get("p-1").unwrap().unwrap().grounding,
        "Aprovado com ressalvas"
    );
}

#[test]
fn service_maps_unknown_opinion_to_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = OpinionService::new(DocumentOpinionRepository::new(
        SqliteDocumentStore::new(&conn),
    ));

    let note = Note::new(Score::new("a", 1.0), Score::new("a", 2.0), "j");
    let err = service.record_note("ghost", &note).unwrap_err();
    assert!(matches!(err, OpinionServiceError::OpinionNotFound(ref id) if id == "ghost"));

    let err = service.amend_grounding("ghost", "x").unwrap_err();
    assert!(matches!(err, OpinionServiceError::OpinionNotFound(_)));
}
