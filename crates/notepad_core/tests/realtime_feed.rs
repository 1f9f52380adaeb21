use notepad_core::db::open_db_in_memory;
use notepad_core::repo::note_repo::SqliteNoteRepository;
use notepad_core::service::note_service::NOTES_TABLE;
use notepad_core::{
    ChangeFeed, ChangeFilter, ChangeKind, LiveField, NoteCategory, NoteDraft, NoteService,
};

fn draft(content: &str) -> NoteDraft {
    NoteDraft::new("Shared doc", content, NoteCategory::Work, Vec::new())
}

#[test]
fn note_writes_publish_row_changes() {
    let conn = open_db_in_memory().unwrap();
    let feed = ChangeFeed::new();
    let inserts = feed.subscribe(ChangeFilter::table(NOTES_TABLE).with_kind(ChangeKind::Insert));
    let service =
        NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap()).with_feed(feed.clone());

    let note = service.add_note(draft("v1")).unwrap();
    let row_events = feed.subscribe(ChangeFilter::table(NOTES_TABLE).with_row_id(note.id));

    service.update_note(note.id, draft("v2"), None).unwrap();
    service.archive_note(note.id).unwrap();
    service.set_note_content(note.id, "v3").unwrap();
    service.delete_note(note.id).unwrap();

    let inserted = inserts.drain();
    assert_eq!(inserted.len(), 1);
    assert_eq!(inserted[0].row_id, note.id.to_string());

    let kinds = row_events
        .drain()
        .into_iter()
        .map(|change| change.kind)
        .collect::<Vec<_>>();
    assert_eq!(
        kinds,
        vec![
            ChangeKind::Update,
            ChangeKind::Update,
            ChangeKind::Update,
            ChangeKind::Delete
        ]
    );
}

#[test]
fn live_field_converges_on_last_remote_write() {
    let conn = open_db_in_memory().unwrap();
    let feed = ChangeFeed::new();
    let service =
        NoteService::new(SqliteNoteRepository::try_new(&conn).unwrap()).with_feed(feed.clone());
    let note = service.add_note(draft("<p>start</p>")).unwrap();

    let mut editor_a =
        LiveField::attach(&feed, NOTES_TABLE, note.id, "content", note.content.clone());
    let mut editor_b =
        LiveField::attach(&feed, NOTES_TABLE, note.id, "content", note.content.clone());

    editor_a.set_local("<p>from a</p>".to_string());
    service.set_note_content(note.id, editor_a.value()).unwrap();
    editor_b.set_local("<p>from b</p>".to_string());
    service.set_note_content(note.id, editor_b.value()).unwrap();

    assert!(editor_a.sync());
    assert!(editor_b.sync());
    assert_eq!(editor_a.value(), "<p>from b</p>");
    assert_eq!(editor_b.value(), "<p>from b</p>");
    assert_eq!(service.get_note(note.id).unwrap().content, "<p>from b</p>");
}

#[test]
fn dropped_live_field_stops_receiving() {
    let feed = ChangeFeed::new();
    let field = LiveField::attach(&feed, NOTES_TABLE, "n1", "content", String::new());
    assert_eq!(feed.subscriber_count(), 1);
    drop(field);
    assert_eq!(feed.subscriber_count(), 0);
}
