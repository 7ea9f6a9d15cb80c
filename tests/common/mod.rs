//! Shared fixtures for integration tests.

#![allow(dead_code)]

use parking_lot::Mutex;
use pubsub_hub::message;
use pubsub_hub::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, PartialEq)]
pub struct Animal {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dog {
    pub animal: Animal,
    pub breed: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cat {
    pub animal: Animal,
    pub indoor: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: u32,
}

message!(Animal, Event);
message!(Dog: Animal => animal);
message!(Cat: Animal => animal);

pub fn dog(name: &str) -> Dog {
    Dog {
        animal: Animal {
            name: name.to_string(),
        },
        breed: "beagle".to_string(),
    }
}

pub fn cat(name: &str) -> Cat {
    Cat {
        animal: Animal {
            name: name.to_string(),
        },
        indoor: true,
    }
}

/// A subscriber object; the hub only ever sees it through `Arc`.
#[derive(Debug, Default)]
pub struct Listener {
    pub label: &'static str,
}

impl Listener {
    pub fn new(label: &'static str) -> Arc<Self> {
        Arc::new(Self { label })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.0.store(0, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Failure sink that keeps every report for inspection.
#[derive(Default)]
pub struct RecordingSink {
    reports: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    pub fn reports(&self) -> Vec<(String, String)> {
        self.reports.lock().clone()
    }
}

impl FailureSink for RecordingSink {
    fn report(&self, error: &HubError, context: &str) {
        self.reports
            .lock()
            .push((error.to_string(), context.to_string()));
    }
}

pub fn recording_hub() -> (Hub, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let hub = Hub::builder()
        .with_name("test")
        .with_failure_sink(Arc::clone(&sink))
        .build();
    (hub, sink)
}
