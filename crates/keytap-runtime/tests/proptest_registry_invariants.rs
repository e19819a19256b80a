//! Property-based invariant tests for the handler registry.
//!
//! 1. The registry matches a simple model under any add/remove sequence
//! 2. Dispatch invokes each registration exactly once, in order
//! 3. Removal counts equal the number of matching registrations

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use keytap_core::{Key, KeyEvent};
use keytap_runtime::{Handler, HandlerRegistry};
use proptest::prelude::*;

// ── Strategies ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Add(usize),
    Remove(usize),
    Dispatch,
}

const POOL: usize = 6;

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..POOL).prop_map(Op::Add),
        2 => (0..POOL).prop_map(Op::Remove),
        2 => Just(Op::Dispatch),
    ]
}

struct Fixture {
    handlers: Vec<Handler>,
    calls: Arc<Mutex<Vec<usize>>>,
}

fn fixture() -> Fixture {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let handlers = (0..POOL)
        .map(|i| {
            let calls = Arc::clone(&calls);
            Handler::new(move |_| calls.lock().unwrap().push(i))
        })
        .collect();
    Fixture { handlers, calls }
}

// ═══════════════════════════════════════════════════════════════════════
// 1-3. Model equivalence
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn registry_matches_model(ops in prop::collection::vec(op_strategy(), 0..64)) {
        let Fixture { handlers, calls } = fixture();
        let registry = HandlerRegistry::new();
        let mut model: Vec<usize> = Vec::new();

        for op in ops {
            match op {
                Op::Add(i) => {
                    registry.add(handlers[i].clone());
                    model.push(i);
                }
                Op::Remove(i) => {
                    let expected = model.iter().filter(|&&m| m == i).count();
                    model.retain(|&m| m != i);
                    prop_assert_eq!(registry.remove(&handlers[i]), expected);
                }
                Op::Dispatch => {
                    calls.lock().unwrap().clear();
                    let delivery = registry.dispatch(&KeyEvent::new(Key::Char('p')));
                    prop_assert_eq!(delivery.invoked, model.len());
                    prop_assert_eq!(delivery.panicked, 0);
                    prop_assert_eq!(&*calls.lock().unwrap(), &model);
                }
            }
            prop_assert_eq!(registry.len(), model.len());
            let ids: Vec<_> = registry.snapshot().iter().map(Handler::id).collect();
            let expected: Vec<_> = model.iter().map(|&i| handlers[i].id()).collect();
            prop_assert_eq!(ids, expected);
        }
    }

    #[test]
    fn panics_are_counted_per_registration(
        good in 0usize..5,
        bad in 0usize..5,
    ) {
        let registry = HandlerRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..good {
            let hits = Arc::clone(&hits);
            registry.add(Handler::new(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            }));
        }
        for _ in 0..bad {
            registry.add(Handler::new(|_| panic!("property panic")));
        }
        let delivery = registry.dispatch(&KeyEvent::new(Key::ENTER));
        prop_assert_eq!(delivery.invoked, good + bad);
        prop_assert_eq!(delivery.panicked, bad);
        prop_assert_eq!(hits.load(Ordering::SeqCst), good);
    }
}
