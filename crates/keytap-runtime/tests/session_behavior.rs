//! End-to-end session behavior over an in-process source.
//!
//! Run:
//!   cargo test -p keytap-runtime --test session_behavior

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use keytap_core::{ChannelFeeder, Key, KeyEvent, NamedKey, channel_source};
use keytap_runtime::{
    Handler, KeyFilter, KeySession, LifecycleState, SessionConfig, SessionError, Subscription,
};

const WAIT: Duration = Duration::from_secs(5);

fn config() -> SessionConfig {
    SessionConfig::default()
        .with_poll_timeout(Duration::from_millis(20))
        .with_escape_timeout(Duration::from_millis(10))
        .with_thread_name("keytap-it")
}

fn running_session() -> (ChannelFeeder, KeySession) {
    let (feeder, source) = channel_source();
    let session = KeySession::with_config(source, config());
    session.start().unwrap();
    (feeder, session)
}

fn wait_until(mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    done()
}

// ============================================================================
// Delivery
// ============================================================================

#[test]
fn wildcard_handler_sees_each_event_once_in_order() {
    let (feeder, session) = running_session();
    let (tx, rx) = mpsc::channel();
    let _sub = session
        .subscribe(Key::ANY, move |event: &KeyEvent| {
            let _ = tx.send(event.to_string());
        })
        .unwrap();

    feeder.feed("\x1b[A");
    feeder.feed("a");
    feeder.feed("\x1b[1;3C");

    let received: Vec<String> = (0..4).map(|_| rx.recv_timeout(WAIT).unwrap()).collect();
    assert_eq!(received, ["up", "a", "escape", "right"]);
    session.stop();
    assert!(rx.try_recv().is_err());
}

#[test]
fn first_subscription_starts_the_session() {
    let (feeder, source) = channel_source();
    let session = KeySession::with_config(source, config());
    assert_eq!(session.state(), LifecycleState::Stopped);

    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);
    let _sub = session
        .subscribe(Key::ANY, move |_: &KeyEvent| {
            h.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    assert!(session.is_running());

    feeder.feed("a");
    feeder.feed("\x1b[B");
    feeder.feed("\r");
    assert!(wait_until(|| hits.load(Ordering::SeqCst) == 3));
    thread::sleep(Duration::from_millis(40));
    assert_eq!(hits.load(Ordering::SeqCst), 3);
    session.stop();
}

#[test]
fn subscribe_fails_and_keeps_nothing_when_session_cannot_start() {
    let (_feeder, source) = channel_source();
    let session = KeySession::with_config(source, config().with_thread_name(""));
    let result = session.subscribe(Key::ANY, |_: &KeyEvent| {});
    assert!(matches!(result, Err(SessionError::Config(_))));
    assert_eq!(session.handler_count(), 0);
    assert!(!session.is_running());
}

#[test]
fn subscribing_after_stop_restarts_delivery() {
    let (feeder, session) = running_session();
    session.stop();

    let (tx, rx) = mpsc::channel();
    let _sub = session
        .subscribe(Key::ANY, move |event: &KeyEvent| {
            let _ = tx.send(event.key());
        })
        .unwrap();
    assert!(session.is_running());
    feeder.feed("z");
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), Key::Char('z'));
    session.stop();
}

#[test]
fn exact_filter_only_sees_its_key() {
    let (feeder, session) = running_session();
    let hits = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = mpsc::channel();
    let h = Arc::clone(&hits);
    let _enter = session
        .subscribe(NamedKey::Enter, move |_: &KeyEvent| {
            h.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    let _all = session
        .subscribe(KeyFilter::Any, move |event: &KeyEvent| {
            let _ = tx.send(event.key());
        })
        .unwrap();

    feeder.feed("ab\rc\r");
    for _ in 0..5 {
        rx.recv_timeout(WAIT).unwrap();
    }
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    session.stop();
}

#[test]
fn events_are_delivered_one_at_a_time() {
    let (feeder, session) = running_session();
    let log = Arc::new(Mutex::new(Vec::new()));
    for tag in ["first", "second"] {
        let log = Arc::clone(&log);
        let _ = session
            .subscribe(Key::ANY, move |event: &KeyEvent| {
                log.lock().unwrap().push(format!("{tag}:{event}:begin"));
                thread::sleep(Duration::from_millis(2));
                log.lock().unwrap().push(format!("{tag}:{event}:end"));
            })
            .unwrap();
    }

    feeder.feed("xyz");
    assert!(wait_until(|| log.lock().unwrap().len() == 12));
    session.stop();

    let mut expected = Vec::new();
    for key in ["x", "y", "z"] {
        for tag in ["first", "second"] {
            expected.push(format!("{tag}:{key}:begin"));
            expected.push(format!("{tag}:{key}:end"));
        }
    }
    assert_eq!(*log.lock().unwrap(), expected);
}

#[test]
fn events_while_stopped_are_not_delivered() {
    let (feeder, source) = channel_source();
    let session = KeySession::with_config(source, config());
    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);
    let _sub = session
        .subscribe(Key::ANY, move |_: &KeyEvent| {
            h.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    session.start().unwrap();
    feeder.feed("a");
    assert!(wait_until(|| hits.load(Ordering::SeqCst) == 1));
    session.stop();

    feeder.feed("b");
    thread::sleep(Duration::from_millis(60));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(session.stats().events_dispatched, 1);
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn double_stop_returns_immediately() {
    let (_feeder, session) = running_session();
    session.stop();
    let started = Instant::now();
    session.stop();
    assert!(started.elapsed() < Duration::from_millis(50));
    assert_eq!(session.state(), LifecycleState::Stopped);
}

#[test]
fn restart_after_stop_resumes_delivery() {
    let (feeder, session) = running_session();
    let (tx, rx) = mpsc::channel();
    let _sub = session
        .subscribe(Key::ANY, move |event: &KeyEvent| {
            let _ = tx.send(event.key());
        })
        .unwrap();
    feeder.feed("a");
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), Key::Char('a'));

    session.stop();
    session.start().unwrap();
    feeder.feed("b");
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), Key::Char('b'));
    session.stop();
}

#[test]
fn stop_from_inside_handler_does_not_deadlock() {
    let (feeder, session) = running_session();
    let (tx, rx) = mpsc::channel();
    let handle = session.clone();
    let _sub = session
        .subscribe(NamedKey::CtrlC, move |_: &KeyEvent| {
            handle.stop();
            let _ = tx.send(());
        })
        .unwrap();

    feeder.feed("\x03");
    rx.recv_timeout(WAIT).unwrap();
    assert!(wait_until(|| !session.is_running()));
    session.stop();
}

#[test]
fn nothing_is_dispatched_after_stop_from_inside_handler() {
    let (feeder, session) = running_session();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let handle = session.clone();
    let s = Arc::clone(&seen);
    let _sub = session
        .subscribe(Key::ANY, move |event: &KeyEvent| {
            s.lock().unwrap().push(event.key());
            if event.is(NamedKey::CtrlC) {
                handle.stop();
            }
        })
        .unwrap();

    feeder.feed("a\x03z");
    assert!(wait_until(|| session.stats().events_dispatched == 2));
    assert!(!session.is_running());

    feeder.feed("later");
    thread::sleep(Duration::from_millis(80));
    assert_eq!(
        *seen.lock().unwrap(),
        [Key::Char('a'), Key::Named(NamedKey::CtrlC)]
    );
    assert_eq!(session.stats().events_dispatched, 2);
}

#[test]
fn source_failure_is_recorded_and_restart_clears_it() {
    let (feeder, source) = channel_source();
    let session = KeySession::with_config(source, config());
    session.start().unwrap();
    drop(feeder);

    assert!(wait_until(|| session.failure().is_some()));
    assert_eq!(session.state(), LifecycleState::Stopped);
    let failure = session.failure().unwrap();
    assert_eq!(failure.kind(), std::io::ErrorKind::UnexpectedEof);
    assert!(failure.to_string().contains("input channel closed"));

    // The source stays disconnected, so the fresh run fails again, but the
    // previous failure is cleared first.
    session.start().unwrap();
    assert!(wait_until(|| session.failure().is_some()));
    session.stop();
}

#[test]
fn dropping_last_handle_stops_threads() {
    let (feeder, session) = running_session();
    let token = session.subscribe(Key::ANY, |_: &KeyEvent| {}).unwrap();
    drop(session);
    assert!(!token.is_active());
    // The source went down with the session.
    assert!(!feeder.feed("x"));
}

// ============================================================================
// Subscriptions
// ============================================================================

#[test]
fn unsubscribe_twice_is_harmless() {
    let (feeder, session) = running_session();
    let (tx, rx) = mpsc::channel();
    let sub = session
        .subscribe(Key::ANY, move |event: &KeyEvent| {
            let _ = tx.send(event.key());
        })
        .unwrap();
    assert_eq!(session.handler_count(), 1);
    sub.unsubscribe();
    sub.unsubscribe();
    assert_eq!(session.handler_count(), 0);

    feeder.feed("a");
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    session.stop();
}

#[test]
fn handler_can_unsubscribe_itself() {
    let (feeder, session) = running_session();
    let hits = Arc::new(AtomicUsize::new(0));
    let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
    let (tx, rx) = mpsc::channel();

    let sub = {
        let hits = Arc::clone(&hits);
        let slot = Arc::clone(&slot);
        session
            .subscribe(Key::ANY, move |_: &KeyEvent| {
                hits.fetch_add(1, Ordering::SeqCst);
                if let Some(sub) = slot.lock().unwrap().as_ref() {
                    sub.unsubscribe();
                }
            })
            .unwrap()
    };
    *slot.lock().unwrap() = Some(sub);
    let _witness = session
        .subscribe(Key::ANY, move |event: &KeyEvent| {
            let _ = tx.send(event.key());
        })
        .unwrap();

    feeder.feed("abc");
    for _ in 0..3 {
        rx.recv_timeout(WAIT).unwrap();
    }
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(session.handler_count(), 1);
    session.stop();
}

#[test]
fn same_handler_twice_is_removed_together() {
    let (feeder, session) = running_session();
    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);
    let handler = Handler::new(move |_| {
        h.fetch_add(1, Ordering::SeqCst);
    });
    session.add_handler(handler.clone());
    session.add_handler(handler.clone());

    feeder.feed("a");
    assert!(wait_until(|| hits.load(Ordering::SeqCst) == 2));
    assert_eq!(session.remove_handler(&handler), 2);
    assert_eq!(session.remove_handler(&handler), 0);
    session.stop();
}

#[test]
fn concurrent_subscribe_and_unsubscribe_during_dispatch() {
    let (feeder, session) = running_session();
    let delivered = Arc::new(AtomicUsize::new(0));
    let d = Arc::clone(&delivered);
    let _steady = session
        .subscribe(Key::ANY, move |_: &KeyEvent| {
            d.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    let pump = {
        let feeder = feeder.clone();
        thread::spawn(move || {
            for _ in 0..200 {
                feeder.feed("k");
                thread::sleep(Duration::from_micros(200));
            }
        })
    };

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let session = session.clone();
            thread::spawn(move || {
                for _ in 0..100 {
                    let sub = session.subscribe(Key::ANY, |_: &KeyEvent| {}).unwrap();
                    sub.unsubscribe();
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }
    pump.join().unwrap();

    assert!(wait_until(|| delivered.load(Ordering::SeqCst) == 200));
    assert_eq!(session.handler_count(), 1);
    session.stop();
}

// ============================================================================
// Handler failures
// ============================================================================

#[test]
fn panicking_handler_does_not_stop_delivery() {
    let (feeder, session) = running_session();
    let _bad = session.subscribe(Key::ANY, |_: &KeyEvent| panic!("handler bug")).unwrap();
    let (tx, rx) = mpsc::channel();
    let _good = session
        .subscribe(Key::ANY, move |event: &KeyEvent| {
            let _ = tx.send(event.key());
        })
        .unwrap();

    feeder.feed("ab");
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), Key::Char('a'));
    assert_eq!(rx.recv_timeout(WAIT).unwrap(), Key::Char('b'));
    assert!(session.is_running());
    assert!(wait_until(|| session.stats().handler_panics == 2));
    session.stop();
}

#[test]
fn unisolated_panic_ends_session() {
    let (feeder, source) = channel_source();
    let session = KeySession::with_config(source, config().with_isolate_panics(false));
    let _bad = session.subscribe(Key::ANY, |_: &KeyEvent| panic!("fatal handler bug")).unwrap();
    session.start().unwrap();

    feeder.feed("a");
    assert!(wait_until(|| !session.is_running()));
    session.stop();
}
