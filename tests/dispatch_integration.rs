//! End-to-end dispatch flows through the public engine facade.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use dispatch_core::dispatch::strategy::{
    DispatchStrategy, FixedPoolStrategy, HandlerQueuedStrategy, StrategyId,
};
use dispatch_core::dispatch::{DispatchResult, DispatchResults, FlowControl, Outcome};
use dispatch_core::engine::DispatchEngine;
use dispatch_core::event::Event;
use dispatch_core::handle::meta::BindingTable;
use dispatch_core::handle::{Handle, HandleDescriptor};

#[derive(Debug, Clone)]
struct OrderPlaced {
    order_id: u64,
    total_cents: u64,
}

struct Auditor {
    seen: AtomicUsize,
}

struct Fulfillment;

#[tokio::test(flavor = "multi_thread")]
async fn mixed_strategies_resolve_to_their_declared_executions() {
    let provider = Arc::new(
        BindingTable::new()
            .bind::<Auditor>(vec![HandleDescriptor::of(
                |auditor: &Auditor, order: &OrderPlaced| {
                    auditor.seen.fetch_add(1, Ordering::SeqCst);
                    order.total_cents
                },
            )])
            .bind::<Fulfillment>(vec![HandleDescriptor::of(
                |_: &Fulfillment, order: &OrderPlaced| format!("ship order {}", order.order_id),
            )
            .with_strategy(StrategyId::FIXED_POOL)]),
    );

    let mut engine = DispatchEngine::new(provider);
    engine
        .dispatcher_mut()
        .strategies_mut()
        .add(Arc::new(FixedPoolStrategy::new(2)));
    engine
        .handlers_mut()
        .register(Auditor {
            seen: AtomicUsize::new(0),
        })
        .unwrap();
    engine.handlers_mut().register(Fulfillment).unwrap();

    let results = engine
        .dispatch(OrderPlaced {
            order_id: 41,
            total_cents: 2500,
        })
        .await;

    assert_eq!(results.len(), 2);

    // The synchronous handle is settled before dispatch returns.
    let audit = results.get(0).unwrap();
    assert!(!audit.outcome().is_pending());
    assert_eq!(*audit.result().await.value_as::<u64>().unwrap(), 2500);

    // The pooled handle starts out pending and resolves on await.
    let shipment = results.get(1).unwrap();
    assert!(shipment.outcome().is_pending());
    let resolved = shipment.result().await;
    assert_eq!(*resolved.value_as::<String>().unwrap(), "ship order 41");
}

/// Strategy that runs in-line and stops the fan-out once two results exist.
struct StopAfterTwo;

#[async_trait]
impl DispatchStrategy for StopAfterTwo {
    fn id(&self) -> StrategyId {
        StrategyId::new("stop-after-two")
    }

    async fn dispatch(
        &self,
        handle: Arc<Handle>,
        event: Event,
        prior: &DispatchResults,
    ) -> DispatchResult {
        let outcome = handle.invoke(&event);
        let result = DispatchResult::new(handle.handler().clone(), event, outcome);
        if prior.len() == 1 {
            result.set_flow_control(FlowControl::Stop);
        }
        result
    }
}

struct FiveStep {
    invoked: AtomicUsize,
}

#[derive(Debug)]
struct Step;

#[tokio::test]
async fn stop_flow_control_halts_the_remaining_fan_out() {
    let descriptors: Vec<_> = (0..5)
        .map(|index| {
            HandleDescriptor::of(move |steps: &FiveStep, _: &Step| {
                steps.invoked.fetch_add(1, Ordering::SeqCst);
                index
            })
        })
        .collect();
    let provider = Arc::new(BindingTable::new().bind::<FiveStep>(descriptors));

    let mut engine = DispatchEngine::new(provider);
    engine
        .dispatcher_mut()
        .strategies_mut()
        .add(Arc::new(StopAfterTwo));
    let object = engine
        .handlers_mut()
        .register(FiveStep {
            invoked: AtomicUsize::new(0),
        })
        .unwrap();

    let results = engine
        .dispatch_with_default(Step, &StrategyId::new("stop-after-two"))
        .await;

    assert_eq!(results.len(), 2);
    assert!(results.last().unwrap().flow_control().is_stop());

    // Handles three through five never ran.
    let steps = Arc::downcast::<FiveStep>(object).unwrap();
    assert_eq!(steps.invoked.load(Ordering::SeqCst), 2);
}

struct Journal {
    entries: Mutex<Vec<u64>>,
}

#[derive(Debug)]
struct Append(u64);

#[tokio::test(flavor = "multi_thread")]
async fn handler_queued_preserves_submission_order_across_events() {
    let provider = Arc::new(BindingTable::new().bind::<Journal>(vec![HandleDescriptor::of(
        |journal: &Journal, append: &Append| {
            // Uneven work so out-of-order execution would be visible.
            std::thread::sleep(std::time::Duration::from_millis(20 - (append.0 % 3) * 5));
            journal.entries.lock().push(append.0);
            append.0
        },
    )]));

    let mut engine = DispatchEngine::new(provider);
    let object = engine
        .handlers_mut()
        .register(Journal {
            entries: Mutex::new(Vec::new()),
        })
        .unwrap();

    let queued: Arc<dyn DispatchStrategy> = Arc::new(HandlerQueuedStrategy::new());
    let mut all_results = Vec::new();
    for sequence in 0..6 {
        let results = engine
            .dispatch_with(Append(sequence), Arc::clone(&queued))
            .await;
        assert_eq!(results.len(), 1);
        all_results.push(results);
    }
    for results in &all_results {
        let outcome = results.first().unwrap().result().await;
        assert!(matches!(outcome, Outcome::Value(_)));
    }

    let journal = Arc::downcast::<Journal>(object).unwrap();
    assert_eq!(*journal.entries.lock(), vec![0, 1, 2, 3, 4, 5]);
}

struct Flaky;

#[derive(Debug)]
struct Poke;

#[tokio::test]
async fn failures_are_outcomes_and_do_not_halt_the_fan_out() {
    let provider = Arc::new(BindingTable::new().bind::<Flaky>(vec![
        HandleDescriptor::of(|_: &Flaky, _: &Poke| -> u32 { panic!("broken handle") }),
        HandleDescriptor::fallible(|_: &Flaky, _: &Poke| -> Result<u32, String> {
            Err("declined".to_string())
        }),
        HandleDescriptor::of(|_: &Flaky, _: &Poke| 7_u32),
    ]));

    let mut engine = DispatchEngine::new(provider);
    engine.handlers_mut().register(Flaky).unwrap();

    let results = engine.dispatch(Poke).await;
    assert_eq!(results.len(), 3);

    let panicked = results.get(0).unwrap().result().await;
    assert!(panicked
        .failure()
        .map(|err| err.to_string().contains("broken handle"))
        .unwrap_or(false));

    let declined = results.get(1).unwrap().result().await;
    assert!(declined
        .failure()
        .map(|err| err.to_string().contains("declined"))
        .unwrap_or(false));

    let value = results.get(2).unwrap().result().await;
    assert_eq!(*value.value_as::<u32>().unwrap(), 7);
}

struct Stamped;

#[derive(Debug)]
struct Ping;

#[tokio::test]
async fn cached_and_uncached_registration_dispatch_identically() {
    fn provider() -> Arc<BindingTable> {
        Arc::new(BindingTable::new().bind::<Stamped>(vec![HandleDescriptor::of(
            |_: &Stamped, _: &Ping| "pong".to_string(),
        )]))
    }

    let mut cached = DispatchEngine::new(provider());
    cached.handlers_mut().enable_meta_caching();
    cached.handlers_mut().register(Stamped).unwrap();
    cached.handlers_mut().register(Stamped).unwrap();

    let mut uncached = DispatchEngine::new(provider());
    uncached.handlers_mut().register(Stamped).unwrap();
    uncached.handlers_mut().register(Stamped).unwrap();

    let from_cache = cached.dispatch(Ping).await;
    let from_discovery = uncached.dispatch(Ping).await;
    assert_eq!(from_cache.len(), from_discovery.len());
    for (a, b) in from_cache.iter().zip(from_discovery.iter()) {
        let a = a.result().await.value_as::<String>().unwrap();
        let b = b.result().await.value_as::<String>().unwrap();
        assert_eq!(*a, *b);
    }
}
