//! Replays a recorded bundler session through the dispatcher

use bdemon_app::test_utils::{RecordingOutput, RecordingProgress};
use bdemon_app::{Channel, LineStyle, LogDispatcher};
use bdemon_stream::{deliver, LineParser, OutputStream, SourceEvent, StreamPump};
use chrono::{Duration, TimeZone, Utc};
use tokio::sync::mpsc;

const SESSION: &str = include_str!("fixtures/expo_session.ndjson");

type Dispatcher = LogDispatcher<RecordingOutput, RecordingProgress>;

/// Feed every fixture line, one line per 100ms of simulated time
fn replay(dispatcher: &mut Dispatcher) {
    let mut parser = LineParser::new();
    let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

    let events = SESSION
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let now = t0 + Duration::milliseconds(100 * i as i64);
            parser.parse_line_at(line, OutputStream::Stdout, now)
        })
        .collect();

    deliver(events, dispatcher);
}

#[test]
fn test_session_output() {
    let progress = RecordingProgress::new();
    let mut dispatcher = LogDispatcher::new(RecordingOutput::new(), progress.clone());
    replay(&mut dispatcher);

    let output = dispatcher.output();
    assert_eq!(
        output.texts(),
        vec![
            "Finished building JavaScript bundle in 400ms.",
            "Metro waiting on exp://192.168.1.2:8081",
            "Some dependencies are incompatible",
            "expo-camera@13.0.0 - expected version: ~13.4.0",
            "",
            "Possible unhandled promise rejection 42",
            "",
            "TypeError: undefined is not an object",
            "at App.js:12:5",
            "at node_modules/react-native/Libraries/Renderer/a.js:1:1",
            "at node_modules/react-native/Libraries/Renderer/b.js:2:2",
            "- ... 3 more stack frames from framework internals",
            "{broken",
            "Starting Metro Bundler",
            "Failed building JavaScript bundle.",
        ]
    );
}

#[test]
fn test_session_channels() {
    let mut dispatcher = LogDispatcher::new(RecordingOutput::new(), RecordingProgress::new());
    replay(&mut dispatcher);

    let output = dispatcher.output();
    assert_eq!(
        output.texts_on(Channel::Warn),
        vec![
            "Some dependencies are incompatible",
            "expo-camera@13.0.0 - expected version: ~13.4.0",
            "Possible unhandled promise rejection 42",
        ]
    );
    assert_eq!(output.texts_on(Channel::Error).len(), 6);
    assert_eq!(
        output.texts_on(Channel::Default),
        vec![
            "Finished building JavaScript bundle in 400ms.",
            "",
            "",
            "Failed building JavaScript bundle.",
        ]
    );
}

#[test]
fn test_cleared_issue_is_not_shown() {
    let mut dispatcher = LogDispatcher::new(RecordingOutput::new(), RecordingProgress::new());
    replay(&mut dispatcher);

    assert!(!dispatcher
        .output()
        .texts()
        .iter()
        .any(|t| t.contains("Unable to resolve module")));
}

#[test]
fn test_session_styles() {
    let mut dispatcher = LogDispatcher::new(RecordingOutput::new(), RecordingProgress::new());
    replay(&mut dispatcher);

    let lines = &dispatcher.output().lines;
    assert_eq!(lines[0].1.style, LineStyle::Success);
    assert_eq!(lines[7].1.style, LineStyle::Bold);
    assert!(lines[8..12].iter().all(|(_, l)| l.nested));
    assert_eq!(lines[14].1.style, LineStyle::Failure);
}

#[test]
fn test_session_progress() {
    let progress = RecordingProgress::new();
    let mut dispatcher = LogDispatcher::new(RecordingOutput::new(), progress.clone());
    replay(&mut dispatcher);

    let log = progress.log();
    assert_eq!(log.created.len(), 2);
    assert_eq!(log.advances, vec![25, 50, 25, 100]);
    assert_eq!(log.terminated, 2);
    assert!(!dispatcher.progress_state().is_active);
    assert!(dispatcher.indicator().is_none());
}

#[tokio::test]
async fn test_pump_drives_dispatcher() {
    let (tx, rx) = mpsc::channel(64);
    let progress = RecordingProgress::new();
    let mut dispatcher = LogDispatcher::new(RecordingOutput::new(), progress.clone());

    for line in SESSION.lines().skip(5).take(2) {
        tx.send(SourceEvent::Stdout(line.to_string())).await.unwrap();
    }
    tx.send(SourceEvent::Stderr("Watchman crawl took a while".to_string()))
        .await
        .unwrap();
    tx.send(SourceEvent::Exited { code: Some(0) }).await.unwrap();
    drop(tx);

    let code = StreamPump::new(rx).run(&mut dispatcher).await;

    assert_eq!(code, Some(0));
    assert_eq!(
        dispatcher.output().texts(),
        vec![
            "Metro waiting on exp://192.168.1.2:8081",
            "Some dependencies are incompatible",
            "expo-camera@13.0.0 - expected version: ~13.4.0",
            "Watchman crawl took a while",
        ]
    );
    assert_eq!(
        dispatcher.output().channels(),
        vec![Channel::Info, Channel::Warn, Channel::Warn, Channel::Warn]
    );
    assert!(progress.log().created.is_empty());
}
