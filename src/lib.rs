//! Requirement-Driven Task Scheduler
//!
//! A small, single-threaded scheduler for deferred work whose inputs are only partially
//! known. Each task names the external facts ("requirements") it still needs; the
//! scheduler asks for every unknown fact once, matches incoming answers against waiting
//! tasks, and runs each task exactly once, as soon as all of its requirements have values.
//!
//! # Features
//!
//! - **Exactly-once announcement**: a requirement shared by many tasks is requested once
//! - **Exactly-once execution**: a task runs the first time all its requirements are known,
//!   regardless of the order in which they resolve
//! - **Demand-tied caching**: resolved values are kept only while some task still needs them
//! - **Prioritized ticks**: requests go out before tasks run, and ready tasks run before more
//!   answers are absorbed
//! - **Pluggable storage**: the scheduler is written against container traits, not concrete
//!   collections (see [`storage`])
//! - **Never blocks**: every tick does one bounded unit of work and returns
//!
//! # Quick Start
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use reqx::{Action, Arguments, DispatcherConfig, Task, TaskDispatcher};
//!
//! let total = Arc::new(Mutex::new(0));
//! let mut dispatcher: TaskDispatcher<&str, i32> = TaskDispatcher::new(DispatcherConfig::local());
//!
//! let sink = total.clone();
//! dispatcher
//!     .add_task(
//!         Task::new(move |args: Arguments<i32>| {
//!             *sink.lock().unwrap() = args.require("a")? + args.require("b")?;
//!             Ok(())
//!         })
//!         .requires("a", "left")
//!         .requires("b", "right"),
//!     )
//!     .unwrap();
//!
//! // Ask for "left" and "right"
//! dispatcher.run(false).unwrap();
//!
//! // Answers arrive in any order
//! dispatcher.receive_requirement(("right", 2)).unwrap();
//! dispatcher.receive_requirement(("left", 40)).unwrap();
//! dispatcher.run(false).unwrap();
//!
//! assert_eq!(*total.lock().unwrap(), 42);
//! ```
//!
//! # Core Concepts
//!
//! ## Task
//!
//! A [`Task`] is a callable plus the keyword arguments known up front plus a mapping from
//! the remaining argument names to requirement keys. Its lifecycle is tracked by
//! [`TaskStatus`]: `Waiting → Evaluating → Dispatched | Error`.
//!
//! ## RequirementMap
//!
//! [`RequirementMap`] is the bookkeeping: which tasks wait on which keys, and which key
//! values are known. It has no notion of execution.
//!
//! ## TaskDispatcher
//!
//! [`TaskDispatcher`] owns tasks from registration until they run. It keeps three FIFO
//! queues (keys to announce, tasks ready to run, answers to absorb) and services one item
//! per [`TaskDispatcher::do_action`] call, in that priority order.
//!
//! ## Producers
//!
//! The scheduler never computes requirement values. It announces keys through an
//! [`Announce`] implementation and accepts answers through
//! [`TaskDispatcher::receive_requirement`], after normalizing them with a
//! [`Canonicalize`](message::Canonicalize) implementation.
//!
//! # Concurrency
//!
//! The dispatcher is single-writer and has no internal locking. Two ways to feed it from
//! several producers:
//!
//! - keep it on one thread and give producers a [`DispatcherHandle`] from
//!   [`TaskDispatcher::attach_inbox`]; drive it with [`TaskDispatcher::run`] or
//!   [`TaskDispatcher::serve`]
//! - wrap it in a [`SharedDispatcher`], which locks around every call
//!
//! There are no timeouts. A task whose requirement never resolves waits until it is
//! removed with [`TaskDispatcher::remove_task`].
//!
//! # Error Handling
//!
//! All fallible operations return [`DispatchResult`]. A failing task surfaces as
//! [`DispatchError::TaskExecution`] (or [`DispatchError::TaskPanicked`]) from the tick that
//! ran it; the scheduler does not retry and drops the task. To retry, build the dispatcher
//! with [`DispatcherConfig::keep_failed`], take the task back with
//! [`TaskDispatcher::take_failed_task`], [`Task::reset`] it and register it again.
//!
//! # Optional Features
//!
//! - `tracing`: structured `tracing` events for registrations, ticks and failures.
//!   Compiled out entirely when disabled.
//! - `serde`: `Serialize`/`Deserialize` for ids, statuses, actions, policies, [`Pair`] and
//!   [`RequirementMessage`].
//!
//! ```bash
//! RUST_LOG=reqx=debug cargo run --features tracing
//! ```

mod announce;
mod config;
mod dispatcher;
mod error;
mod inbox;
pub mod message;
mod requirements;
mod shared;
pub mod storage;
mod task;
mod types;

// Public re-exports
pub use announce::{Announce, AnnounceFn, Discard};
pub use config::DispatcherConfig;
pub use dispatcher::{Registration, TaskDispatcher};
pub use error::{DispatchError, DispatchResult};
pub use inbox::{DispatcherHandle, Inbound};
pub use message::{Pair, RequirementMessage, SymmetricPairs, Verbatim};
pub use requirements::RequirementMap;
pub use shared::SharedDispatcher;
pub use task::{Arguments, Task, TaskMethod};
pub use types::{Action, DuplicatePolicy, InvalidMessagePolicy, TaskId, TaskStatus};
