use notepad_core::db::open_db_in_memory;
use notepad_core::model::meeting::NewMeeting;
use notepad_core::repo::meeting_repo::SqliteMeetingRepository;
use notepad_core::repo::mind_map_repo::SqliteMindMapRepository;
use notepad_core::repo::prompt_repo::SqlitePromptRepository;
use notepad_core::repo::tag_repo::SqliteTagRepository;
use notepad_core::service::meeting_service::{MeetingService, MeetingServiceError};
use notepad_core::service::mind_map_service::{MindMapService, MindMapServiceError};
use notepad_core::service::prompt_service::{PromptService, PromptServiceError};
use notepad_core::service::tag_service::{TagService, TagServiceError};

#[test]
fn tags_suggest_at_most_five_case_insensitive_matches() {
    let conn = open_db_in_memory().unwrap();
    let service = TagService::new(SqliteTagRepository::try_new(&conn).unwrap());
    for name in ["work", "Workout", "homework", "network", "coworking", "worker", "home"] {
        service.add_tag(name).unwrap();
    }

    let suggestions = service.get_tags("WORK").unwrap();
    assert_eq!(suggestions.len(), 5);
    assert!(suggestions
        .iter()
        .all(|name| name.to_lowercase().contains("work")));
    assert_eq!(service.get_tags("hom").unwrap(), vec!["home", "homework"]);
}

#[test]
fn tag_suggestions_fold_non_ascii_case() {
    let conn = open_db_in_memory().unwrap();
    let service = TagService::new(SqliteTagRepository::try_new(&conn).unwrap());
    service.add_tag("Économie").unwrap();
    service.add_tag("Straße").unwrap();

    assert_eq!(service.get_tags("écon").unwrap(), vec!["Économie"]);
    assert_eq!(service.get_tags("STRAßE").unwrap(), vec!["Straße"]);
}

#[test]
fn adding_existing_tag_returns_stored_row() {
    let conn = open_db_in_memory().unwrap();
    let service = TagService::new(SqliteTagRepository::try_new(&conn).unwrap());
    let first = service.add_tag("Errands").unwrap();
    let again = service.add_tag(" errands ").unwrap();
    assert_eq!(first, again);
    assert_eq!(service.list_tags().unwrap().len(), 1);
    assert!(matches!(
        service.add_tag("  "),
        Err(TagServiceError::InvalidName)
    ));
}

#[test]
fn mind_map_nodes_move_reparent_and_reject_cycles() {
    let conn = open_db_in_memory().unwrap();
    let service = MindMapService::new(SqliteMindMapRepository::try_new(&conn).unwrap());

    let root = service.add_node("Root", Some((10.0, 20.0)), None).unwrap();
    let child = service.add_node("Child", None, Some(root.id)).unwrap();
    let grandchild = service.add_node("Grandchild", None, Some(child.id)).unwrap();
    assert!((0.0..500.0).contains(&child.x));

    let moved = service.move_node(root.id, 42.5, 7.0).unwrap();
    assert_eq!((moved.x, moved.y), (42.5, 7.0));

    assert!(matches!(
        service.reparent(root.id, Some(grandchild.id)),
        Err(MindMapServiceError::CycleDetected { .. })
    ));
    assert!(matches!(
        service.reparent(root.id, Some(root.id)),
        Err(MindMapServiceError::CycleDetected { .. })
    ));

    let detached = service.reparent(grandchild.id, None).unwrap();
    assert_eq!(detached.parent_id, None);

    service.delete_node(root.id).unwrap();
    let nodes = service.list_nodes().unwrap();
    assert_eq!(nodes.len(), 2);
    assert!(nodes.iter().all(|node| node.parent_id.is_none()));
    assert!(matches!(
        service.delete_node(root.id),
        Err(MindMapServiceError::NodeNotFound(_))
    ));
}

#[test]
fn mind_map_rejects_unknown_parent() {
    let conn = open_db_in_memory().unwrap();
    let service = MindMapService::new(SqliteMindMapRepository::try_new(&conn).unwrap());
    assert!(matches!(
        service.add_node("Loose", None, Some(uuid::Uuid::new_v4())),
        Err(MindMapServiceError::ParentNotFound(_))
    ));
}

#[test]
fn meetings_are_listed_by_start_time() {
    let conn = open_db_in_memory().unwrap();
    let service = MeetingService::new(SqliteMeetingRepository::try_new(&conn).unwrap());
    for (title, start) in [("Late", 3_000), ("Early", 1_000), ("Middle", 2_000)] {
        service
            .create_meeting(NewMeeting {
                title: title.to_string(),
                description: String::new(),
                start_time: start,
                end_time: start + 500,
                attendees: vec!["ana@example.com".to_string()],
            })
            .unwrap();
    }

    let titles = service
        .get_meetings()
        .unwrap()
        .into_iter()
        .map(|meeting| meeting.title)
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["Early", "Middle", "Late"]);

    let err = service
        .create_meeting(NewMeeting {
            title: "Backwards".to_string(),
            description: String::new(),
            start_time: 10,
            end_time: 5,
            attendees: Vec::new(),
        })
        .unwrap_err();
    assert!(matches!(err, MeetingServiceError::Validation(_)));
}

#[test]
fn ai_prompts_are_listed_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let service = PromptService::new(SqlitePromptRepository::try_new(&conn).unwrap());
    service.save_ai_prompt("first", "one").unwrap();
    service.save_ai_prompt("second", "two").unwrap();

    let prompts = service.get_ai_prompts().unwrap();
    assert_eq!(prompts[0].prompt, "second");
    assert_eq!(prompts[1].response, "one");
    assert!(matches!(
        service.save_ai_prompt(" ", "x"),
        Err(PromptServiceError::BlankPrompt)
    ));
}
