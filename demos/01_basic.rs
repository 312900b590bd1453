//! # Getting Started: One Task, One Requirement
//!
//! This example walks a single task through its whole lifecycle.
//!
//! ## What You'll Learn
//! - How to declare that a task argument comes from a requirement key
//! - How the dispatcher asks for a key through an announcer
//! - How a resolution moves the task to the ready queue
//! - How each `do_action` tick reports what it did
//!
//! ## Running This Example
//! ```bash
//! cargo run --example basic
//! ```
//!
//! ## Expected Output
//! ```text
//! tick: Sent Requirement
//!   asked for sim(cat,dog)
//! tick: idle
//! producer answered sim(cat,dog) = 0.7
//! tick: Processed Requirement
//! tick: Dispatched Task
//!   similarity of cat and dog is 0.7
//! tick: idle
//! ```

use reqx::{Action, AnnounceFn, Arguments, DispatcherConfig, Task, TaskDispatcher};

fn tick(dispatcher: &mut TaskDispatcher<&'static str, f64>) -> Action {
    let action = dispatcher.do_action().expect("task failed");
    println!("tick: {action}");
    action
}

fn main() {
    // Step 1: announcements go to stdout here; a real host would publish them
    let mut dispatcher: TaskDispatcher<&'static str, f64> =
        TaskDispatcher::new(DispatcherConfig::local())
            .with_announcer(AnnounceFn(|key: &&'static str| println!("  asked for {key}")));

    // Step 2: `similarity` is unknown, so the task waits on `sim(cat,dog)`
    dispatcher
        .add_task(
            Task::new(|args: Arguments<f64>| {
                println!("  similarity of cat and dog is {}", args.require("similarity")?);
                Ok(())
            })
            .requires("similarity", "sim(cat,dog)"),
        )
        .expect("registration failed");

    tick(&mut dispatcher);
    assert!(tick(&mut dispatcher).is_idle());

    // Step 3: the answer arrives out of band
    println!("producer answered sim(cat,dog) = 0.7");
    dispatcher
        .receive_requirement(("sim(cat,dog)", 0.7))
        .expect("message rejected");

    tick(&mut dispatcher);
    tick(&mut dispatcher);
    tick(&mut dispatcher);
}
