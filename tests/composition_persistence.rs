// Integration test for composition persistence
// Tests the save/load cycle through the app shell and both transports

use blocks_sketch::messaging::notification::{NotificationCategory, NotificationLevel};
use blocks_sketch::persistence::{PersistenceError, PersistenceResult};
use blocks_sketch::{
    App, BlockId, BlockKind, CommandArgs, CommandOutput, EditorConfig, FileTransport,
    MemoryTransport, PersistenceTransport, Point, Serializer,
};
use std::sync::Arc;
use tempfile::tempdir;

/// Transport whose storage is always down
struct OfflineTransport;

impl PersistenceTransport for OfflineTransport {
    fn save(&self, _composition_id: &str, _data: &str) -> PersistenceResult<()> {
        Err(PersistenceError::Storage("connection refused".to_string()))
    }

    fn load(&self, _composition_id: &str) -> PersistenceResult<String> {
        Err(PersistenceError::Storage("connection refused".to_string()))
    }
}

fn create(app: &mut App, kind: BlockKind, x: f64) -> BlockId {
    let args = CommandArgs::new()
        .with_kind(kind)
        .with_point(Point::new(x, 50.0));
    match app.run("CREATE_BLOCK", args) {
        Some(CommandOutput::Created(id)) => id,
        other => panic!("unexpected output {:?}", other),
    }
}

fn connect(app: &mut App, a: BlockId, b: BlockId) {
    app.run(
        "CONNECT_BLOCKS",
        CommandArgs::new().with_block(a).with_block(b),
    )
    .unwrap();
}

/// One source shared by two effects, plus a modulated filter
fn build_composition(app: &mut App) -> BlockId {
    let tone = create(app, BlockKind::ToneSource, 0.0);
    let delay = create(app, BlockKind::Delay, 100.0);
    let reverb = create(app, BlockKind::Reverb, 200.0);
    let filter = create(app, BlockKind::Filter, 300.0);
    let lfo = create(app, BlockKind::Lfo, 400.0);
    connect(app, tone, delay);
    connect(app, reverb, tone);
    connect(app, lfo, filter);
    connect(app, tone, lfo);
    tone
}

#[test]
fn test_save_and_load_through_memory_transport() {
    let transport = Arc::new(MemoryTransport::new());
    let mut app = App::new(EditorConfig::default(), transport.clone()).unwrap();
    let tone = build_composition(&mut app);
    assert_eq!(app.graph().block(tone).unwrap().effects().len(), 3);

    app.save_as(Some("shared-source"));
    app.wait_pending();
    assert_eq!(app.state().composition_id.as_deref(), Some("shared-source"));
    assert!(transport.contains("shared-source"));

    let mut other = App::new(EditorConfig::default(), transport).unwrap();
    other.load_composition(Some("shared-source"));
    other.wait_pending();

    assert!(other.graph().same_topology(app.graph()));
    assert_eq!(other.graph().len(), 5);
    assert!(!other.state().history.can_undo());

    let notifications = other.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].category, NotificationCategory::Persistence);
    assert_eq!(notifications[0].level, NotificationLevel::Info);
}

#[test]
fn test_save_then_continue_editing_with_file_transport() {
    let temp_dir = tempdir().unwrap();
    let transport = Arc::new(FileTransport::new(temp_dir.path()));
    let mut app = App::new(EditorConfig::default(), transport.clone()).unwrap();
    build_composition(&mut app);

    app.save();
    app.wait_pending();
    let id = app.state().composition_id.clone().unwrap();
    assert!(temp_dir.path().join(format!("{}.json", id)).exists());

    // Later edits do not touch the stored copy until saved again
    create(&mut app, BlockKind::Noise, 500.0);
    let mut reloaded = App::new(EditorConfig::default(), transport).unwrap();
    reloaded.load_composition(Some(&id));
    reloaded.wait_pending();
    assert_eq!(reloaded.graph().len(), 5);
}

#[test]
fn test_polling_applies_load_on_update() {
    let transport = Arc::new(MemoryTransport::new());
    let mut app = App::new(EditorConfig::default(), transport.clone()).unwrap();
    build_composition(&mut app);
    transport
        .save("polled", &app.serialize().unwrap())
        .unwrap();

    let mut other = App::new(EditorConfig::default(), transport).unwrap();
    other.load_composition(Some("polled"));
    for _ in 0..500 {
        other.update(0.016);
        if !other.has_pending() {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(2));
    }

    assert!(!other.has_pending());
    assert_eq!(other.graph().len(), 5);
}

#[test]
fn test_failed_load_falls_back_to_empty() {
    let transport = Arc::new(MemoryTransport::new());
    transport.save("corrupt", "{\"version\":").unwrap();
    let mut app = App::new(EditorConfig::default(), transport).unwrap();
    build_composition(&mut app);

    app.load_composition(Some("corrupt"));
    app.wait_pending();

    assert!(app.graph().is_empty());
    assert!(app.state().composition_id.is_none());
    let notifications = app.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].level, NotificationLevel::Error);
}

#[test]
fn test_failed_save_keeps_composition() {
    let mut app = App::new(EditorConfig::default(), Arc::new(OfflineTransport)).unwrap();
    build_composition(&mut app);
    let before = app.graph().clone();

    app.save_as(Some("never-stored"));
    app.wait_pending();

    assert_eq!(*app.graph(), before);
    assert!(app.state().composition_id.is_none());
    assert!(app.state().history.can_undo());

    let notifications = app.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].level, NotificationLevel::Error);
    assert_eq!(notifications[0].category, NotificationCategory::Persistence);
}

#[test]
fn test_serialize_deserialize_via_app() {
    let mut app = App::new(EditorConfig::default(), Arc::new(MemoryTransport::new())).unwrap();
    build_composition(&mut app);

    let json = app.serialize().unwrap();
    let save_file = app.deserialize(&json).unwrap();
    assert!(save_file.composition.same_topology(app.graph()));

    // Flattened form lists each block once
    let reserialized = Serializer::serialize(&save_file.composition, save_file.view).unwrap();
    let again = Serializer::deserialize(&reserialized).unwrap();
    assert!(again.composition.same_topology(&save_file.composition));
}

#[test]
fn test_overflowing_edits_are_rejected_and_save_stays_loadable() {
    let transport = Arc::new(MemoryTransport::new());
    let mut app = App::new(EditorConfig::default(), transport.clone()).unwrap();
    let delay = create(&mut app, BlockKind::Delay, 0.0);
    let bump = || {
        CommandArgs::new()
            .with_block(delay)
            .with_text("time")
            .with_number(1e308)
    };

    assert!(app.run("INCREMENT_NUMBER", bump()).is_some());
    assert!(app.run("INCREMENT_NUMBER", bump()).is_none());
    for point in [Point::new(f64::INFINITY, 0.0), Point::new(0.0, f64::NAN)] {
        let args = CommandArgs::new().with_block(delay).with_point(point);
        assert!(app.run("MOVE_BLOCK", args).is_none());
    }
    assert_eq!(app.state().history.undo_count(), 2);
    assert!(app.graph().block(delay).unwrap().param("time").unwrap().is_finite());

    app.save_as(Some("finite"));
    app.wait_pending();
    let mut other = App::new(EditorConfig::default(), transport).unwrap();
    other.load_composition(Some("finite"));
    other.wait_pending();
    assert_eq!(*other.graph(), *app.graph());
}

#[test]
fn test_unreachable_storage_keeps_composition_on_load() {
    let mut app = App::new(EditorConfig::default(), Arc::new(OfflineTransport)).unwrap();
    let tone = create(&mut app, BlockKind::ToneSource, 0.0);
    let before = app.graph().clone();

    app.load_composition(Some("elsewhere"));
    app.wait_pending();

    assert_eq!(*app.graph(), before);
    assert!(app.graph().contains(tone));
    assert_eq!(app.state().history.undo_count(), 1);
    let notifications = app.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].level, NotificationLevel::Error);
    assert_eq!(notifications[0].category, NotificationCategory::Persistence);
}

#[test]
fn test_missing_composition_keeps_composition_on_load() {
    let mut app = App::new(EditorConfig::default(), Arc::new(MemoryTransport::new())).unwrap();
    build_composition(&mut app);

    app.load_composition(Some("never-saved"));
    app.wait_pending();

    assert_eq!(app.graph().len(), 5);
    assert!(app.state().history.can_undo());
}

#[test]
fn test_saves_and_loads_run_one_at_a_time() {
    let temp_dir = tempdir().unwrap();
    let transport = Arc::new(FileTransport::new(temp_dir.path()));
    let mut app = App::new(EditorConfig::default(), transport.clone()).unwrap();
    build_composition(&mut app);

    app.save_as(Some("sketch"));
    app.save_as(Some("sketch"));
    create(&mut app, BlockKind::Noise, 600.0);
    app.save_as(Some("sketch"));
    app.load_composition(Some("sketch"));
    assert!(app.has_pending());
    app.wait_pending();

    assert!(!app.has_pending());
    assert_eq!(app.graph().len(), 6);
    assert_eq!(app.state().composition_id.as_deref(), Some("sketch"));
    let notifications = app.notifications();
    assert_eq!(notifications.len(), 4);
    assert!(
        notifications
            .iter()
            .all(|n| n.level == NotificationLevel::Info)
    );
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
}
