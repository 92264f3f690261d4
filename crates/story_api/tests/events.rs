use story_api::{StoryStreamEvent, StreamCompletion};

#[test]
fn events_terminal_classification() {
    assert!(!StoryStreamEvent::chunk("hello").is_terminal());
    assert!(StoryStreamEvent::error("boom").is_terminal());
    assert!(StoryStreamEvent::Done.is_terminal());
}

#[test]
fn events_variant_shapes_stable() {
    let chunk = serde_json::to_value(StoryStreamEvent::chunk("hi")).expect("serialize chunk");
    assert_eq!(chunk["type"], "chunk");
    assert_eq!(chunk["text"], "hi");

    let done = serde_json::to_value(StoryStreamEvent::Done).expect("serialize done");
    assert_eq!(done["type"], "done");
}

#[test]
fn completion_kind_names_stable() {
    assert_eq!(StreamCompletion::Explicit.as_str(), "explicit");
    assert_eq!(
        StreamCompletion::ConnectionClosed.as_str(),
        "connection_closed"
    );
}
