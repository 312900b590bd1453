//! # Feeding the Dispatcher from Another Thread
//!
//! The dispatcher stays on the main thread. A producer thread receives announced keys
//! over a channel, computes their values and sends them back through a
//! `DispatcherHandle`.
//!
//! ## What You'll Learn
//! - How to announce keys over a `futures` channel
//! - How `attach_inbox` hands out a cloneable handle
//! - How `run(true)` keeps serving until the inbox is closed
//! - How a task can close the inbox once the work is done
//!
//! ## Running This Example
//! ```bash
//! cargo run --example inbox_producer
//! ```
//!
//! ## Expected Output (order of lines may vary)
//! ```text
//! producer: len(apple) = 5
//! producer: len(kiwi) = 4
//! apple + kiwi = 9
//! apple twice = 10
//! dispatcher performed 6 ticks
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use futures::channel::mpsc;
use futures::executor::block_on_stream;
use reqx::{Arguments, DispatcherConfig, Task, TaskDispatcher};

fn main() {
    let (announce_tx, announce_rx) = mpsc::unbounded::<String>();
    let mut dispatcher: TaskDispatcher<String, usize> =
        TaskDispatcher::new(DispatcherConfig::local()).with_announcer(announce_tx);
    let handle = dispatcher.attach_inbox();

    // Producer: answer every announced key with its length
    let producer = {
        let handle = handle.clone();
        thread::spawn(move || {
            for key in block_on_stream(announce_rx) {
                println!("producer: len({key}) = {}", key.len());
                let len = key.len();
                if handle.submit_requirement(key, len).is_err() {
                    break;
                }
            }
        })
    };

    // The last task to finish closes the inbox, which lets `run(true)` return
    let remaining = Arc::new(AtomicUsize::new(2));
    let finish = {
        let handle = handle.clone();
        move || {
            if remaining.fetch_sub(1, Ordering::SeqCst) == 1 {
                handle.close();
            }
        }
    };
    let finish_other = finish.clone();

    handle
        .submit_task(
            Task::new(move |args: Arguments<usize>| {
                println!("apple + kiwi = {}", args.require("a")? + args.require("b")?);
                finish();
                Ok(())
            })
            .requires("a", "apple".to_string())
            .requires("b", "kiwi".to_string()),
        )
        .expect("inbox closed");
    handle
        .submit_task(
            Task::new(move |args: Arguments<usize>| {
                println!("apple twice = {}", args.require("a")? * 2);
                finish_other();
                Ok(())
            })
            .requires("a", "apple".to_string()),
        )
        .expect("inbox closed");
    drop(handle);

    let performed = dispatcher.run(true).expect("task failed");
    println!("dispatcher performed {performed} ticks");

    // Dropping the dispatcher drops the announcer, which ends the producer loop
    drop(dispatcher);
    producer.join().expect("producer panicked");
}
