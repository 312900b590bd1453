//! # Retrying Failed Tasks
//!
//! The dispatcher never retries on its own. A host that wants retries builds the
//! dispatcher with `keep_failed(true)`, takes the failed task back, resets it and
//! registers it again.
//!
//! ## What You'll Learn
//! - How execution errors surface from `run`
//! - How to recover a failed task with `take_failed_task`
//! - How `reset` returns a task to `Waiting`
//! - How to cap the number of attempts
//!
//! ## Running This Example
//! ```bash
//! cargo run --example retry_strategies
//! ```
//!
//! ## Expected Output
//! ```text
//! attempt 1 failed: Task <id> failed during execution: upstream unavailable (attempt 1)
//! attempt 2 failed: Task <id> failed during execution: upstream unavailable (attempt 2)
//! fetched rate 1.25 on attempt 3
//! done after 3 attempts
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use reqx::{Arguments, DispatchResult, DispatcherConfig, Task, TaskDispatcher};

const MAX_ATTEMPTS: usize = 5;

fn main() -> DispatchResult<()> {
    let attempts = Arc::new(AtomicUsize::new(0));

    let counter = attempts.clone();
    let task: Task<&str, f64> = Task::new(move |args: Arguments<f64>| {
        let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt < 3 {
            anyhow::bail!("upstream unavailable (attempt {attempt})");
        }
        println!("fetched rate {} on attempt {attempt}", args.require("rate")?);
        Ok(())
    })
    .arg("rate", 1.25);
    let id = task.id();

    let mut dispatcher = TaskDispatcher::new(DispatcherConfig::local().keep_failed(true));
    dispatcher.add_task(task)?;

    loop {
        match dispatcher.run(false) {
            Ok(_) => break,
            Err(err) if err.is_execution_failure() => {
                let attempt = attempts.load(Ordering::SeqCst);
                println!("attempt {attempt} failed: {err}");
                if attempt >= MAX_ATTEMPTS {
                    return Err(err);
                }

                let mut task = dispatcher.take_failed_task(id)?;
                task.reset()?;
                dispatcher.add_task(task)?;
            }
            Err(err) => return Err(err),
        }
    }

    println!("done after {} attempts", attempts.load(Ordering::SeqCst));
    Ok(())
}
