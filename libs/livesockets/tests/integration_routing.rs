//! Integration tests for the router and the adapters built on top of it
//!
//! These tests drive broadcast scenarios the way the connection loop does:
//! parse each frame, drop the malformed ones, fan the rest out.

use livesockets::protocol::{Envelope, MessageKind};
use livesockets::router::{MessageRouter, Topic};
use livesockets::subscribe::GenerationSubscription;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

/// Macro for verbose test output
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

/// Feed raw frames through parse-then-broadcast, like the connection loop
fn pump(router: &MessageRouter, frames: &[&str]) {
    for frame in frames {
        match router.parse(frame) {
            Ok(envelope) if envelope.kind.is_control() => {
                verbose_println!("  control frame intercepted: {:?}", envelope.kind);
            }
            Ok(envelope) => router.broadcast(&envelope),
            Err(e) => verbose_println!("  dropped malformed frame: {}", e),
        }
    }
}

fn generation_frame(id: &str, status: &str, percentage: u32) -> String {
    json!({
        "type": "generation_update",
        "data": {
            "generationId": id,
            "status": status,
            "progress": {"stage": "build", "percentage": percentage, "message": "building"}
        },
        "timestamp": "2024-05-01T12:00:00Z"
    })
    .to_string()
}

#[test]
fn test_malformed_frame_between_two_valid_frames() {
    verbose_println!("Testing malformed frame handling...");

    let router = MessageRouter::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    {
        let seen = Arc::clone(&seen);
        router.on_message(move |envelope: &Envelope| {
            seen.lock().push(envelope.data["generationId"].clone());
        });
    }

    let first = generation_frame("g1", "generating", 10);
    let second = generation_frame("g1", "generating", 20);
    pump(&router, &[first.as_str(), "{{{ not json", second.as_str()]);

    // Both valid frames delivered, the malformed one produced no invocation
    assert_eq!(seen.lock().len(), 2);
}

#[test]
fn test_control_frames_never_reach_listeners() {
    let router = MessageRouter::new();
    let count = Arc::new(Mutex::new(0usize));
    {
        let count = Arc::clone(&count);
        router.on_message(move |_| *count.lock() += 1);
    }

    let update = generation_frame("g1", "generating", 10);
    pump(
        &router,
        &[
            r#"{"type": "ping", "timestamp": "2024-05-01T12:00:00Z"}"#,
            update.as_str(),
            r#"{"type": "pong", "timestamp": "2024-05-01T12:00:01Z"}"#,
        ],
    );

    assert_eq!(*count.lock(), 1);
}

#[test]
fn test_unknown_kinds_still_fan_out() {
    // Unknown message types are not control frames; listeners decide
    let router = MessageRouter::new();
    let kinds = Arc::new(Mutex::new(Vec::new()));
    {
        let kinds = Arc::clone(&kinds);
        router.on_message(move |envelope: &Envelope| kinds.lock().push(envelope.kind));
    }

    pump(
        &router,
        &[r#"{"type": "quota_report", "data": {}, "timestamp": "2024-05-01T12:00:00Z"}"#],
    );

    assert_eq!(*kinds.lock(), vec![MessageKind::Unknown]);
}

#[test]
fn test_generation_scenario_progress_then_terminal() {
    verbose_println!("Testing the g1 generation scenario...");

    let router = Arc::new(MessageRouter::new());
    let mut subscription = GenerationSubscription::new(Arc::clone(&router));
    subscription.track(Some("g1".to_string()));

    let progress = generation_frame("g1", "generating", 40);
    pump(&router, &[progress.as_str()]);

    assert!(!subscription.is_loading());
    assert_eq!(subscription.progress().percentage, 40.0);
    assert_eq!(subscription.progress().stage, "build");
    assert!(!subscription.is_completed());

    let done = generation_frame("g1", "completed", 100);
    pump(&router, &[done.as_str()]);

    assert!(subscription.is_completed());
    assert!(!subscription.is_failed());
    assert!(!subscription.is_cancelled());
}

#[test]
fn test_adapter_switch_with_interleaved_frames() {
    let router = Arc::new(MessageRouter::new());
    let mut subscription = GenerationSubscription::new(Arc::clone(&router));

    subscription.track(Some("a".to_string()));
    let a1 = generation_frame("a", "generating", 30);
    pump(&router, &[a1.as_str()]);
    assert_eq!(subscription.progress().percentage, 30.0);

    subscription.track(Some("b".to_string()));
    let late_a = generation_frame("a", "completed", 100);
    let b1 = generation_frame("b", "generating", 5);
    pump(&router, &[late_a.as_str(), b1.as_str()]);

    // The late frame for "a" must not mutate the view now tracking "b"
    assert!(!subscription.is_completed());
    assert_eq!(subscription.snapshot().unwrap().generation_id, "b");
    assert_eq!(subscription.progress().percentage, 5.0);

    // One listener per adapter, no leaks across the switch
    assert_eq!(router.listener_count(Topic::Message), 1);
}
