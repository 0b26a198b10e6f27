//! Guided recording through the engine, persisted to a catalog file.

mod common;

use std::sync::Arc;

use gesture_engine::events::CommandEvent;
use gesture_engine::recognition::landmarks::Hand;
use gesture_engine::recognition::pose::Finger;
use gesture_engine::recognition::recorder::{
    RecordingEvent, RecordingEventKind, RecordingRequest, RecordingState,
};
use gesture_engine::store::{JsonFileStore, TemplateKind, TemplateStore, NO_COMMAND};
use gesture_engine::{Engine, EngineConfig};

use common::{fist, frame, hand, observe};

/// Feed identical frames until the session ends. Returns the notifications.
fn record(engine: &mut Engine, request: RecordingRequest, pose: &[Finger]) -> Vec<RecordingEvent> {
    let mut commands: Vec<CommandEvent> = Vec::new();
    let mut notes = Vec::new();
    engine.start_recording(request, 0.0, &mut notes);
    let landmarks = hand(pose, 0.0, 0.0);
    for i in 1..2000 {
        engine.process_frame(&frame(i, vec![observe(Hand::Right, landmarks)]), &mut commands, &mut notes);
        if !engine.is_recording() {
            break;
        }
    }
    assert!(commands.is_empty());
    notes
}

#[test]
fn test_six_samples_then_complete() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.json");
    let store = Arc::new(JsonFileStore::open(&path).unwrap());
    let mut engine = Engine::new(EngineConfig::default(), store);

    let mut request = RecordingRequest::new("rock_on", TemplateKind::Static);
    request.label = "Rock on".to_string();
    let notes = record(&mut engine, request, &[Finger::Index, Finger::Pinky]);

    assert!(!engine.is_recording());
    let saved = notes
        .iter()
        .filter(|e| e.kind == RecordingEventKind::SampleSaved)
        .count();
    let complete: Vec<&RecordingEvent> = notes
        .iter()
        .filter(|e| e.kind == RecordingEventKind::Complete)
        .collect();
    assert_eq!(saved, 6);
    assert_eq!(complete.len(), 1);
    assert_eq!(complete[0].state, RecordingState::Complete);
    assert_eq!(complete[0].samples_done, 6);

    // Persisted to disk, unbound until the user picks a command.
    let reopened = JsonFileStore::open(&path).unwrap();
    let catalog = reopened.snapshot();
    let template = catalog.template("rock_on").unwrap();
    assert_eq!(template.label, "Rock on");
    assert_eq!(template.samples.len(), 6);
    assert!(template.enabled);
    assert_eq!(catalog.binding_value("rock_on"), Some(NO_COMMAND));
}

#[test]
fn test_cancel_mid_session_saves_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.json");
    let store = Arc::new(JsonFileStore::open(&path).unwrap());
    let mut engine = Engine::new(EngineConfig::default(), store.clone());

    let mut commands: Vec<CommandEvent> = Vec::new();
    let mut notes = Vec::new();
    engine.start_recording(RecordingRequest::new("wip", TemplateKind::Static), 0.0, &mut notes);
    // Three countdowns and two captures with rests in between.
    for i in 1..300 {
        engine.process_frame(&frame(i, vec![observe(Hand::Right, fist(0.0))]), &mut commands, &mut notes);
    }
    assert!(engine.is_recording());
    assert!(engine.recorder().samples_done() >= 1);

    engine.cancel_recording(15.0, &mut notes);
    assert!(!engine.is_recording());
    assert_eq!(notes.last().unwrap().kind, RecordingEventKind::Cancelled);
    assert!(store.snapshot().template("wip").is_none());
    assert!(JsonFileStore::open(&path).unwrap().snapshot().template("wip").is_none());
}

#[test]
fn test_bound_recording_overrides_builtin() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(JsonFileStore::open(dir.path().join("catalog.json")).unwrap());
    let mut engine = Engine::new(EngineConfig::default(), store.clone());

    record(&mut engine, RecordingRequest::new("my_fist", TemplateKind::Static), &[]);
    store.set_binding("my_fist", "window_maximize").unwrap();

    let mut commands: Vec<CommandEvent> = Vec::new();
    let mut notes: Vec<RecordingEvent> = Vec::new();
    for i in 0..5 {
        engine.process_frame(
            &frame(1000 + i, vec![observe(Hand::Right, fist(0.0))]),
            &mut commands,
            &mut notes,
        );
    }
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].command_id, "window_maximize");
    assert_eq!(commands[0].gesture_id, "my_fist");
}
