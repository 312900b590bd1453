//! # Tracing Example
//!
//! This example shows the events the optional `tracing` feature emits while tasks are
//! registered, requirements resolved and tasks dispatched.
//!
//! ## Running This Example
//!
//! ```bash
//! # With debug level (registrations, removals, dropped messages)
//! RUST_LOG=reqx=debug cargo run --example tracing_example --features tracing
//!
//! # With trace level (every tick)
//! RUST_LOG=reqx=trace cargo run --example tracing_example --features tracing
//! ```
//!
//! ## Log Levels
//!
//! - **INFO**: run loop start and finish
//! - **DEBUG**: task registration, duplicate ids, removal, dropped messages
//! - **TRACE**: announcements, readiness, invocation
//! - **ERROR**: task failures and panics

use reqx::{DispatcherConfig, Task, TaskDispatcher};

use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut dispatcher: TaskDispatcher<&str, i32> = TaskDispatcher::new(DispatcherConfig::local());

    dispatcher
        .add_task(Task::new(|_| Ok(())).requires("x", "left").requires("y", "right"))
        .expect("registration failed");
    dispatcher
        .add_task(Task::new(|_| anyhow::bail!("deliberate failure")).requires("x", "left"))
        .expect("registration failed");
    dispatcher.run(false).expect("announcing failed");

    dispatcher.receive_requirement(("left", 1)).expect("message rejected");
    dispatcher.receive_requirement(("right", 2)).expect("message rejected");
    dispatcher.receive_requirement(("unrelated", 3)).expect("message rejected");

    while let Err(err) = dispatcher.run(false) {
        tracing::warn!(error = %err, "task failed, continuing");
    }
}
