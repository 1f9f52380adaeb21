use notepad_core::db::open_db_in_memory;
use notepad_core::model::outline::{OutlineItem, MAX_OUTLINE_DEPTH};
use notepad_core::repo::note_repo::SqliteNoteRepository;
use notepad_core::{
    search_notes, Note, NoteCategory, NoteDraft, NoteSearchQuery, NoteService, NoteServiceError,
};
use rusqlite::Connection;

fn service(conn: &Connection) -> NoteService<SqliteNoteRepository<'_>> {
    NoteService::new(SqliteNoteRepository::try_new(conn).unwrap())
}

fn note(title: &str, content: &str, category: NoteCategory) -> NoteDraft {
    NoteDraft::new(title, content, category, Vec::new())
}

#[test]
fn search_matches_title_or_content_and_honors_archive_filter() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let groceries = service
        .add_note(NoteDraft::new(
            "Groceries",
            "milk, eggs",
            NoteCategory::Personal,
            vec!["home".to_string()],
        ))
        .unwrap();
    service
        .add_note(note("Eggplant recipes", "roast", NoteCategory::Other))
        .unwrap();
    service
        .add_note(note("Standup", "status", NoteCategory::Work))
        .unwrap();

    let hits = search_notes(&conn, &NoteSearchQuery::new("EGG")).unwrap();
    let titles = hits.iter().map(|n| n.title.as_str()).collect::<Vec<_>>();
    assert_eq!(titles, vec!["Eggplant recipes", "Groceries"]);

    service.archive_note(groceries.id).unwrap();
    let active = search_notes(&conn, &NoteSearchQuery::new("egg").archived(Some(false))).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].title, "Eggplant recipes");

    let archived = search_notes(&conn, &NoteSearchQuery::new("egg").archived(Some(true))).unwrap();
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].id, groceries.id);
}

#[test]
fn search_treats_like_wildcards_literally() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    service
        .add_note(note("Sale", "50% off", NoteCategory::Personal))
        .unwrap();
    service
        .add_note(note("Other", "500 items", NoteCategory::Personal))
        .unwrap();

    let hits = search_notes(&conn, &NoteSearchQuery::new("50%")).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Sale");
}

#[test]
fn search_folds_non_ascii_case() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    service
        .add_note(note("École", "Überraschung", NoteCategory::Study))
        .unwrap();
    let hub = service
        .add_note(note("Hub", "", NoteCategory::Study))
        .unwrap();

    for needle in ["école", "ÉCOLE", "überraschung", "ÜBER", "cole"] {
        let hits = search_notes(&conn, &NoteSearchQuery::new(needle)).unwrap();
        assert_eq!(hits.len(), 1, "needle {needle}");
        assert_eq!(hits[0].title, "École");
    }

    let candidates = service.find_link_candidates(hub.id, "éco").unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].title, "École");
}

#[test]
fn archive_round_trip_moves_note_between_lists() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let first = service
        .add_note(note("First", "a", NoteCategory::Work))
        .unwrap();
    let second = service
        .add_note(note("Second", "b", NoteCategory::Work))
        .unwrap();

    let active = service.list_notes(false).unwrap();
    assert_eq!(
        active.iter().map(|n| n.id).collect::<Vec<_>>(),
        vec![second.id, first.id]
    );

    let archived = service.archive_note(first.id).unwrap();
    assert!(archived.is_archived);
    assert_eq!(service.list_notes(false).unwrap().len(), 1);
    assert_eq!(service.list_notes(true).unwrap()[0].id, first.id);

    let restored = service.unarchive_note(first.id).unwrap();
    assert!(!restored.is_archived);
    assert!(service.list_notes(true).unwrap().is_empty());
    assert_eq!(restored.version_count, 1);
}

#[test]
fn archive_round_trip_leaves_other_fields_untouched() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let draft = NoteDraft::new(
        "Thesis",
        "<p>draft</p>",
        NoteCategory::Study,
        vec!["school".to_string(), "writing".to_string()],
    );
    let created = service.add_note(draft).unwrap();
    let other = service
        .add_note(note("Sources", "refs", NoteCategory::Study))
        .unwrap();
    service.link_notes(created.id, other.id).unwrap();
    let mut intro = OutlineItem::new("1", "Intro");
    intro.children.push(OutlineItem::new("1.1", "Hook"));
    service.update_note_outline(created.id, &[intro]).unwrap();
    service.add_collaborator(created.id, "ana").unwrap();
    let before = service.get_note(created.id).unwrap();

    let archived = service.archive_note(created.id).unwrap();
    assert!(archived.is_archived);
    let restored = service.unarchive_note(created.id).unwrap();

    assert!(!restored.is_archived);
    assert_eq!(restored.tags, vec!["school", "writing"]);
    assert_eq!(restored.linked_notes, vec![other.id]);
    assert_eq!(restored.outline[0].children[0].id, "1.1");
    assert_eq!(restored.collaborators, vec!["ana"]);
    assert_eq!(
        Note {
            updated_at: before.updated_at,
            ..restored
        },
        before
    );
    assert_eq!(service.get_note_versions(created.id).unwrap().len(), 1);
}

#[test]
fn shared_note_is_found_by_share_id_only() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let created = service
        .add_note(note("Public", "<b>hi</b>", NoteCategory::Study))
        .unwrap();

    let shared = service.get_shared_note(&created.share_id).unwrap();
    assert_eq!(shared.id, created.id);
    assert!(matches!(
        service.get_shared_note(&created.id.to_string()),
        Err(NoteServiceError::SharedNoteNotFound(_))
    ));
}

#[test]
fn links_are_one_directional_and_skip_deleted_targets() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let source = service
        .add_note(note("Source", "", NoteCategory::Other))
        .unwrap();
    let kept = service
        .add_note(note("Kept", "", NoteCategory::Other))
        .unwrap();
    let dropped = service
        .add_note(note("Dropped", "", NoteCategory::Other))
        .unwrap();

    service.link_notes(source.id, kept.id).unwrap();
    service.link_notes(source.id, dropped.id).unwrap();
    let linked = service.link_notes(source.id, kept.id).unwrap();
    assert_eq!(linked, vec![kept.id, dropped.id, kept.id]);
    assert!(service.get_linked_notes(kept.id).unwrap().is_empty());

    service.delete_note(dropped.id).unwrap();
    let titles = service
        .get_linked_notes(source.id)
        .unwrap()
        .into_iter()
        .map(|summary| summary.title)
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["Kept", "Kept"]);
}

#[test]
fn link_candidates_exclude_self_and_cap_at_five() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let me = service
        .add_note(note("Project hub", "", NoteCategory::Work))
        .unwrap();
    for index in 0..7 {
        service
            .add_note(note(&format!("Project {index}"), "", NoteCategory::Work))
            .unwrap();
    }

    let candidates = service.find_link_candidates(me.id, "project").unwrap();
    assert_eq!(candidates.len(), 5);
    assert!(candidates.iter().all(|candidate| candidate.id != me.id));
    assert!(service.find_link_candidates(me.id, "  ").unwrap().is_empty());
}

#[test]
fn outline_is_validated_before_it_is_stored() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let created = service
        .add_note(note("Essay", "", NoteCategory::Study))
        .unwrap();

    let mut intro = OutlineItem::new("1", "Intro");
    intro.children.push(OutlineItem::new("1.1", "Hook"));
    let outline = vec![intro, OutlineItem::new("2", "Body")];
    service.update_note_outline(created.id, &outline).unwrap();
    assert_eq!(service.get_note(created.id).unwrap().outline, outline);

    let duplicate = vec![OutlineItem::new("x", "a"), OutlineItem::new("x", "b")];
    assert!(matches!(
        service.update_note_outline(created.id, &duplicate),
        Err(NoteServiceError::Outline(_))
    ));

    let mut deep = OutlineItem::new("leaf", "leaf");
    for depth in 0..MAX_OUTLINE_DEPTH {
        let mut parent = OutlineItem::new(format!("d{depth}"), "x");
        parent.children.push(deep);
        deep = parent;
    }
    assert!(service.update_note_outline(created.id, &[deep]).is_err());
    assert_eq!(service.get_note(created.id).unwrap().outline, outline);
}

#[test]
fn single_item_outline_edits_are_persisted() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let created = service
        .add_note(note("Talk", "", NoteCategory::Work))
        .unwrap();
    service
        .update_note_outline(
            created.id,
            &[OutlineItem::new("a", "Opening"), OutlineItem::new("b", "Demo")],
        )
        .unwrap();

    let added = service
        .add_outline_item(created.id, Some("b"), "Setup")
        .unwrap();
    let child_id = added.item_id.clone().unwrap();
    assert_eq!(added.outline[1].children[0].id, child_id);

    service
        .edit_outline_item(created.id, &child_id, "Setup laptop")
        .unwrap();
    let moved = service.move_outline_item(created.id, None, 1, 0).unwrap();
    assert_eq!(moved.item_id, None);
    assert_eq!(moved.outline[0].id, "b");

    let stored = service.get_note(created.id).unwrap().outline;
    assert_eq!(stored, moved.outline);
    assert_eq!(stored[0].children[0].content, "Setup laptop");

    let removed = service.remove_outline_item(created.id, "b").unwrap();
    assert_eq!(removed.outline, vec![OutlineItem::new("a", "Opening")]);
    assert!(matches!(
        service.edit_outline_item(created.id, &child_id, "gone"),
        Err(NoteServiceError::Outline(_))
    ));
    assert!(matches!(
        service.move_outline_item(created.id, None, 0, 3),
        Err(NoteServiceError::Outline(_))
    ));
    assert_eq!(service.get_note_versions(created.id).unwrap().len(), 1);
}

#[test]
fn live_content_write_does_not_create_a_revision() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let created = service
        .add_note(note("Live", "<p>a</p>", NoteCategory::Personal))
        .unwrap();

    let updated = service
        .set_note_content(created.id, "<p>ab</p>")
        .unwrap();
    assert_eq!(updated.content, "<p>ab</p>");
    assert_eq!(updated.version_count, 1);
    assert_eq!(service.get_note_versions(created.id).unwrap().len(), 1);
}

#[test]
fn collaborators_are_appended_and_blank_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let created = service
        .add_note(note("Team", "", NoteCategory::Work))
        .unwrap();

    service.add_collaborator(created.id, "ana").unwrap();
    let collaborators = service.add_collaborator(created.id, " bo ").unwrap();
    assert_eq!(collaborators, vec!["ana".to_string(), "bo".to_string()]);
    assert!(matches!(
        service.add_collaborator(created.id, " "),
        Err(NoteServiceError::InvalidCollaborator)
    ));
}

#[test]
fn analytics_counts_totals_archived_and_categories() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    assert_eq!(service.get_analytics().unwrap().total_notes, 0);

    service
        .add_note(note("a", "", NoteCategory::Work))
        .unwrap();
    service
        .add_note(note("b", "", NoteCategory::Work))
        .unwrap();
    let study = service
        .add_note(note("c", "", NoteCategory::Study))
        .unwrap();
    service.archive_note(study.id).unwrap();

    let analytics = service.get_analytics().unwrap();
    assert_eq!(analytics.total_notes, 3);
    assert_eq!(analytics.archived_notes, 1);
    assert_eq!(analytics.category_counts.get("Work"), Some(&2));
    assert_eq!(analytics.category_counts.get("Study"), Some(&1));
    assert_eq!(analytics.category_counts.get("Personal"), None);
}
