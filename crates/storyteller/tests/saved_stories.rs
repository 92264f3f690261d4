use pretty_assertions::assert_eq;
use story_library::{RequestSummary, StoryDraft, StoryLibrary};
use storyteller::{print_saved, CliError};

fn library_with_story() -> (tempfile::TempDir, StoryLibrary, String) {
    let temp = tempfile::tempdir().expect("tempdir should be created");
    let mut library =
        StoryLibrary::open_or_create(&temp.path().join("stories.jsonl")).expect("library");
    let saved = library
        .append(StoryDraft {
            title: "Rex and the Comet".to_string(),
            body: "\n\nRex barked at the sky.".to_string(),
            text: "[Rex and the Comet]\n\nRex barked at the sky.".to_string(),
            request: RequestSummary {
                age: "3-5".to_string(),
                duration: "short".to_string(),
                place: "space".to_string(),
                lesson: "friendship".to_string(),
                characters: vec!["animals".to_string()],
                language: "English".to_string(),
                character_name: Some("a dog called Rex".to_string()),
            },
        })
        .expect("append");
    (temp, library, saved.id)
}

#[test]
fn show_replays_saved_text_as_finished_story() {
    let (_temp, library, id) = library_with_story();
    let mut out = Vec::new();

    print_saved(&library, Some(&id), &mut out).expect("show should succeed");

    assert_eq!(
        String::from_utf8(out).expect("utf8"),
        "Rex and the Comet\n=================\nRex barked at the sky.\n"
    );
}

#[test]
fn list_prints_one_line_per_story() {
    let (_temp, library, id) = library_with_story();
    let mut out = Vec::new();

    print_saved(&library, None, &mut out).expect("list should succeed");

    let text = String::from_utf8(out).expect("utf8");
    assert_eq!(text.lines().count(), 1);
    assert!(text.starts_with(&id));
    assert!(text.contains("Rex and the Comet  (3-5, short, 1-3 min)"));
}

#[test]
fn show_unknown_id_fails() {
    let (_temp, library, _id) = library_with_story();
    let mut out = Vec::new();

    let error = print_saved(&library, Some("missing"), &mut out).expect_err("unknown id");
    assert!(matches!(error, CliError::UnknownStory(ref id) if id == "missing"));
}
