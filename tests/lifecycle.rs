//! Subscription lifecycle: explicit unsubscribe variants and pruning of dropped subscribers.

mod common;

use common::*;
use pubsub_hub::prelude::*;
use std::sync::Arc;

#[tokio::test]
async fn test_unsubscribe_removes_all_types() {
    let (hub, _sink) = recording_hub();
    let listener = Listener::new("all");
    let count = Counter::default();

    let c = count.clone();
    hub.subscribe_fn(&listener, move |_: Dog| c.hit());
    let c = count.clone();
    hub.subscribe_fn(&listener, move |_: Event| c.hit());
    let c = count.clone();
    hub.subscribe_async(&listener, move |_: Animal| {
        let c = c.clone();
        async move { c.hit() }
    });
    assert_eq!(hub.registration_count(), 3);

    hub.unsubscribe(&listener);
    assert_eq!(hub.registration_count(), 0);

    hub.publish(dog("rex")).await;
    hub.publish(Event { id: 1 }).await;
    assert_eq!(count.get(), 0);
}

#[tokio::test]
async fn test_unsubscribe_leaves_other_subscribers() {
    let (hub, _sink) = recording_hub();
    let leaving = Listener::new("leaving");
    let staying = Listener::new("staying");
    let count = Counter::default();

    hub.subscribe_fn(&leaving, |_: Event| {});
    let c = count.clone();
    hub.subscribe_fn(&staying, move |_: Event| c.hit());

    hub.unsubscribe(&leaving);
    hub.publish(Event { id: 1 }).await;

    assert_eq!(count.get(), 1);
    assert_eq!(hub.registration_count(), 1);
}

#[tokio::test]
async fn test_unsubscribe_is_idempotent() {
    let (hub, _sink) = recording_hub();
    let listener = Listener::new("twice");
    let stranger = Listener::new("stranger");

    hub.subscribe_fn(&listener, |_: Event| {});
    hub.unsubscribe(&listener);
    hub.unsubscribe(&listener);
    hub.unsubscribe(&stranger);
    hub.unsubscribe_type::<Event, _>(&stranger);

    assert_eq!(hub.registration_count(), 0);
}

#[tokio::test]
async fn test_unsubscribe_type_keeps_other_types() {
    let (hub, _sink) = recording_hub();
    let listener = Listener::new("filtered");
    let dogs = Counter::default();
    let events = Counter::default();

    let c = dogs.clone();
    hub.subscribe_fn(&listener, move |_: Dog| c.hit());
    let c = dogs.clone();
    hub.subscribe_fn(&listener, move |_: Dog| c.hit());
    let c = events.clone();
    hub.subscribe_fn(&listener, move |_: Event| c.hit());

    hub.unsubscribe_type::<Dog, _>(&listener);
    assert_eq!(hub.registration_count(), 1);

    hub.publish(dog("rex")).await;
    hub.publish(Event { id: 1 }).await;
    assert_eq!(dogs.get(), 0);
    assert_eq!(events.get(), 1);
}

#[tokio::test]
async fn test_unsubscribe_type_matches_declared_type_exactly() {
    let (hub, _sink) = recording_hub();
    let listener = Listener::new("exact");
    let animals = Counter::default();

    let c = animals.clone();
    hub.subscribe_fn(&listener, move |_: Animal| c.hit());

    // Dog is a subtype, but the registration was declared against Animal.
    hub.unsubscribe_type::<Dog, _>(&listener);
    hub.publish(dog("rex")).await;

    assert_eq!(animals.get(), 1);
}

#[tokio::test]
async fn test_unsubscribe_handler_removes_only_that_handler() {
    let (hub, _sink) = recording_hub();
    let listener = Listener::new("handlers");
    let first = Counter::default();
    let second = Counter::default();

    let c = first.clone();
    let removed = hub.subscribe_fn(&listener, move |_: Event| c.hit());
    let c = second.clone();
    hub.subscribe_fn(&listener, move |_: Event| c.hit());

    hub.unsubscribe_handler(&listener, &removed);
    hub.publish(Event { id: 1 }).await;

    assert_eq!(first.get(), 0);
    assert_eq!(second.get(), 1);
}

#[tokio::test]
async fn test_unsubscribe_handler_removes_every_duplicate() {
    let (hub, _sink) = recording_hub();
    let listener = Listener::new("duplicates");
    let count = Counter::default();

    let c = count.clone();
    let handler = Handler::sync(move |_: Event| c.hit());
    hub.subscribe(&listener, handler.clone());
    hub.subscribe(&listener, handler.clone());
    assert_eq!(hub.registration_count(), 2);

    hub.unsubscribe_handler(&listener, &handler);
    assert_eq!(hub.registration_count(), 0);

    hub.publish(Event { id: 1 }).await;
    assert_eq!(count.get(), 0);
}

#[tokio::test]
async fn test_unsubscribe_handler_requires_same_subscriber() {
    let (hub, _sink) = recording_hub();
    let owner = Listener::new("owner");
    let other = Listener::new("other");

    let handler = Handler::sync(|_: Event| {});
    hub.subscribe(&owner, handler.clone());

    hub.unsubscribe_handler(&other, &handler);
    assert_eq!(hub.registration_count(), 1);
}

#[tokio::test]
async fn test_dropped_subscriber_is_pruned_on_publish() {
    let (hub, _sink) = recording_hub();
    let count = Counter::default();
    let survivor = Listener::new("survivor");

    {
        let temporary = Listener::new("temporary");
        let c = count.clone();
        hub.subscribe_fn(&temporary, move |_: Event| c.hit());
        hub.subscribe_fn(&survivor, |_: Event| {});
        assert_eq!(hub.registration_count(), 2);
    }

    hub.publish(Event { id: 1 }).await;

    assert_eq!(count.get(), 0);
    assert_eq!(hub.registration_count(), 1);
}

#[tokio::test]
async fn test_dropped_subscriber_is_pruned_on_unrelated_unsubscribe() {
    let (hub, _sink) = recording_hub();
    let temporary = Listener::new("temporary");
    let unrelated = Listener::new("unrelated");

    hub.subscribe_fn(&temporary, |_: Dog| {});
    hub.subscribe_fn(&temporary, |_: Event| {});
    hub.subscribe_fn(&unrelated, |_: Event| {});
    drop(temporary);

    // Filtered unsubscribe of a different subscriber and type still prunes.
    hub.unsubscribe_type::<Cat, _>(&unrelated);
    assert_eq!(hub.registration_count(), 1);

    hub.unsubscribe(&unrelated);
    assert_eq!(hub.registration_count(), 0);
}

#[tokio::test]
async fn test_subscriber_with_other_owners_stays_subscribed() {
    let (hub, _sink) = recording_hub();
    let count = Counter::default();
    let listener = Listener::new("kept");

    let c = count.clone();
    hub.subscribe_fn(&listener, move |_: Event| c.hit());

    // A second strong reference elsewhere keeps the subscriber alive.
    let elsewhere = Arc::clone(&listener);
    drop(listener);

    hub.publish(Event { id: 1 }).await;
    assert_eq!(count.get(), 1);

    drop(elsewhere);
    hub.publish(Event { id: 2 }).await;
    assert_eq!(count.get(), 1);
    assert_eq!(hub.registration_count(), 0);
}

#[tokio::test]
async fn test_prune_reports_removed_count() {
    let (hub, _sink) = recording_hub();
    let a = Listener::new("a");
    let b = Listener::new("b");

    hub.subscribe_fn(&a, |_: Event| {});
    hub.subscribe_fn(&a, |_: Dog| {});
    hub.subscribe_fn(&b, |_: Event| {});

    assert_eq!(hub.prune(), 0);
    drop(a);
    assert_eq!(hub.prune(), 2);
    assert_eq!(hub.prune(), 0);
    assert_eq!(hub.registration_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_subscribe_and_publish() {
    let (hub, sink) = recording_hub();
    let count = Counter::default();
    let listeners: Vec<_> = (0..16).map(|_| Listener::new("worker")).collect();

    let mut tasks = Vec::new();
    for listener in &listeners {
        let hub = hub.clone();
        let listener = Arc::clone(listener);
        let c = count.clone();
        tasks.push(tokio::spawn(async move {
            hub.subscribe_fn(&listener, move |_: Event| c.hit());
            hub.publish(Event { id: 0 }).await;
            hub.unsubscribe_type::<Dog, _>(&listener);
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(hub.registration_count(), 16);
    assert!(sink.reports().is_empty());

    count.reset();
    hub.publish(Event { id: 1 }).await;
    assert_eq!(count.get(), 16);
}
