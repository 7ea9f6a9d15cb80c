//! Animals demo: covariant subscriptions, failure isolation and weak subscribers.
//!
//! Run with:
//! ```sh
//! RUST_LOG=pubsub_hub=debug cargo run --example animals
//! ```

use pubsub_hub::message;
use pubsub_hub::prelude::*;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
struct Animal {
    name: String,
}

#[derive(Debug, Clone)]
struct Dog {
    animal: Animal,
    tricks: Vec<String>,
}

#[derive(Debug, Clone)]
struct Cat {
    animal: Animal,
}

message!(Animal);
message!(Dog: Animal => animal);
message!(Cat: Animal => animal);

/// Logs every arrival.
struct Gatekeeper;

/// Only interested in dogs, and fails on dogs without tricks.
struct Trainer;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pubsub_hub=debug,animals=info".into()),
        )
        .init();

    let settings = HubSettings {
        name: "zoo".to_string(),
        trace_dispatch: true,
    };
    let hub = Hub::builder().with_settings(settings).build();

    let gatekeeper = Arc::new(Gatekeeper);
    let trainer = Arc::new(Trainer);

    hub.subscribe_fn(&gatekeeper, |animal: Animal| {
        tracing::info!(name = %animal.name, "Animal arrived");
    });
    hub.subscribe_fn(&gatekeeper, |envelope: Envelope| {
        tracing::info!(kind = envelope.type_name(), "Something was published");
    });
    hub.subscribe_async(&trainer, |dog: Dog| async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        if dog.tricks.is_empty() {
            return Err(format!("{} knows no tricks", dog.animal.name));
        }
        tracing::info!(name = %dog.animal.name, tricks = ?dog.tricks, "Training session done");
        Ok(())
    });

    println!("Registrations: {}", hub.registration_count());

    hub.publish(Dog {
        animal: Animal {
            name: "Rex".to_string(),
        },
        tricks: vec!["sit".to_string(), "roll over".to_string()],
    })
    .await;

    // The trainer fails here; the failure is logged and the gatekeeper is unaffected.
    hub.publish(Dog {
        animal: Animal {
            name: "Biscuit".to_string(),
        },
        tricks: Vec::new(),
    })
    .await;

    hub.publish(Cat {
        animal: Animal {
            name: "Tom".to_string(),
        },
    })
    .await;

    // The hub never keeps subscribers alive.
    drop(trainer);
    hub.publish(Dog {
        animal: Animal {
            name: "Fido".to_string(),
        },
        tricks: Vec::new(),
    })
    .await;
    println!("Registrations after trainer left: {}", hub.registration_count());

    hub.unsubscribe_type::<Envelope, _>(&gatekeeper);
    println!("Registrations after unsubscribe: {}", hub.registration_count());

    Ok(())
}
