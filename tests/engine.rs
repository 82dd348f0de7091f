use softboard::board::MetaLevel;
use softboard::config::{Layout, DEFAULT_LAYOUT};
use softboard::connection::{ScratchEditor, SoftBoardService};
use softboard::engine::{BoardEngineHandle, EngineError, TouchEvent};
use std::time::Duration;

fn spawn(layout: &str, editor: &ScratchEditor) -> (BoardEngineHandle, Vec<TouchEvent>) {
    let layout: Layout = layout.parse().expect("layout should parse");
    let script = layout.script.clone();
    let built = layout.build().expect("layout should build");
    let repeat_interval = built.settings.repeat_interval();
    let (service, buttons): (SoftBoardService, _) = built.into_service(Box::new(editor.clone()));
    (
        BoardEngineHandle::spawn(service, buttons, repeat_interval),
        script,
    )
}

fn tap(button: usize) -> [TouchEvent; 2] {
    [
        TouchEvent::MainStart {
            button,
            is_touch_down: true,
        },
        TouchEvent::MainEnd {
            button,
            is_touch_up: true,
        },
    ]
}

const LETTERS: &str = r#"
[[shortcut]]
id = "en"
entries = { btw = "by the way" }

[[button]]
type = "single"
packet = { type = "text", text = "b" }

[[button]]
type = "single"
packet = { type = "text", text = "t" }

[[button]]
type = "single"
packet = { type = "text", text = "w" }

[[button]]
type = "meta"
meta = "shift"

[[button]]
type = "single"
packet = { type = "function", name = "abbreviation:en" }
"#;

#[tokio::test]
async fn default_script_types_expanded_text() {
    let editor = ScratchEditor::default();
    let (mut engine, script) = spawn(DEFAULT_LAYOUT, &editor);
    let events = script.len() as u64;

    for event in script {
        engine.send(event).await.unwrap();
    }
    engine.shutdown().await.unwrap();

    assert_eq!(editor.text(), "by the way Aő");
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.handled_events, events);
    assert_eq!(snapshot.active_short_cut.as_deref(), Some("en"));
    assert_eq!(snapshot.meta[0], MetaLevel::Off);
}

#[tokio::test]
async fn events_are_handled_in_order() {
    let editor = ScratchEditor::default();
    let (mut engine, _) = spawn(LETTERS, &editor);

    // Abbreviations are keyed, so "btw" stays as typed
    let sender = engine.sender();
    for button in [0, 1, 2, 1, 0] {
        for event in tap(button) {
            sender.send(event).await.unwrap();
        }
    }
    engine.shutdown().await.unwrap();

    assert_eq!(editor.text(), "btwtb");
    assert_eq!(engine.snapshot().handled_events, 10);
}

#[tokio::test]
async fn snapshot_publishes_titles() {
    let editor = ScratchEditor::default();
    let (mut engine, _) = spawn(LETTERS, &editor);
    let mut snapshots = engine.subscribe();

    let initial = snapshots.borrow_and_update().clone();
    assert_eq!(initial.titles, vec!["b", "t", "w", "SHIFT", "en"]);

    engine
        .send(TouchEvent::MainStart {
            button: 3,
            is_touch_down: true,
        })
        .await
        .unwrap();
    snapshots.changed().await.unwrap();
    let pressed = snapshots.borrow_and_update().clone();
    assert_eq!(pressed.meta[0], MetaLevel::InTouch);
    assert_eq!(pressed.titles[0], "B");
    assert_eq!(pressed.titles[3], "SHIFT*");

    for event in [
        TouchEvent::MainEnd {
            button: 3,
            is_touch_up: true,
        },
        TouchEvent::MainStart {
            button: 4,
            is_touch_down: true,
        },
    ] {
        engine.send(event).await.unwrap();
    }
    engine.shutdown().await.unwrap();

    let last = engine.snapshot();
    assert_eq!(last.handled_events, 3);
    assert_eq!(last.active_short_cut.as_deref(), Some("en"));
    assert_eq!(last.titles[4], "EN");
}

#[tokio::test]
async fn keyed_abbreviation_expands_after_toggle() {
    let editor = ScratchEditor::default();
    let (mut engine, _) = spawn(LETTERS, &editor);

    for button in [4, 0, 1, 2] {
        for event in tap(button) {
            engine.send(event).await.unwrap();
        }
    }
    engine.shutdown().await.unwrap();

    assert_eq!(editor.text(), "by the way");
}

#[tokio::test]
async fn stay_secondary_repeats_until_release() {
    let layout = r#"
        [settings]
        repeat_interval_ms = 5

        [[button]]
        type = "single"
        packet = { type = "function", name = "delete_before", repeat = true }
    "#;
    let editor = ScratchEditor::with_text("abcdefghijklmnopqrstuvwxyz");
    let (mut engine, _) = spawn(layout, &editor);

    engine
        .send(TouchEvent::MainStart {
            button: 0,
            is_touch_down: true,
        })
        .await
        .unwrap();
    engine
        .send(TouchEvent::Secondary { button: 0, kind: -1 })
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(60)).await;
    engine
        .send(TouchEvent::MainEnd {
            button: 0,
            is_touch_up: true,
        })
        .await
        .unwrap();

    // Give a stray repeat the chance to show up before comparing
    tokio::time::sleep(Duration::from_millis(20)).await;
    let released = editor.text();
    tokio::time::sleep(Duration::from_millis(20)).await;
    engine.shutdown().await.unwrap();

    assert!(released.chars().count() < 24, "left {:?}", released);
    assert_eq!(editor.text(), released);
}

#[tokio::test]
async fn editor_change_advances_counter() {
    let editor = ScratchEditor::default();
    let (mut engine, _) = spawn(LETTERS, &editor);

    engine.send(TouchEvent::EditorChanged).await.unwrap();
    let service = engine.shutdown().await.unwrap();

    assert_eq!(engine.snapshot().process_counter, 1);
    assert_eq!(service.active_short_cut(), None);
}

#[tokio::test]
async fn second_shutdown_reports_not_running() {
    let editor = ScratchEditor::default();
    let (mut engine, _) = spawn(LETTERS, &editor);

    engine.shutdown().await.unwrap();
    assert!(matches!(
        engine.shutdown().await,
        Err(EngineError::NotRunning(_))
    ));
    assert!(engine.send(TouchEvent::EditorChanged).await.is_err());
}
