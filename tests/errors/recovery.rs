//! Tests for error recovery patterns

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::common::{drain, Recorder};
use reqx::{Action, Arguments, DispatchResult, DispatcherConfig, Registration, Task, TaskDispatcher};

/// A task that fails its first `failures` invocations.
fn flaky(failures: usize, attempts: Arc<AtomicUsize>) -> Task<&'static str, i32> {
    Task::new(move |_: Arguments<i32>| {
        let attempt = attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < failures {
            anyhow::bail!("attempt {attempt} failed");
        }
        Ok(())
    })
}

#[test]
fn test_run_stops_at_failure_and_resumes() {
    let recorder = Recorder::<i32>::new();
    let mut dispatcher: TaskDispatcher<&str, i32> = TaskDispatcher::new(DispatcherConfig::local());

    dispatcher.add_task(recorder.task("before")).unwrap();
    dispatcher
        .add_task(flaky(1, Arc::new(AtomicUsize::new(0))))
        .unwrap();
    dispatcher.add_task(recorder.task("after")).unwrap();

    assert!(dispatcher.run(false).is_err());
    assert_eq!(recorder.labels(), vec!["before"]);

    assert_eq!(dispatcher.run(false).unwrap(), 1);
    assert_eq!(recorder.labels(), vec!["before", "after"]);

    // Nobody asked to keep failures, so nothing is held on to
    assert_eq!(dispatcher.failed_task_count(), 0);
}

#[test]
fn test_retry_until_success() -> DispatchResult<()> {
    let attempts = Arc::new(AtomicUsize::new(0));
    let task = flaky(3, attempts.clone());
    let id = task.id();

    let mut dispatcher: TaskDispatcher<&str, i32> =
        TaskDispatcher::new(DispatcherConfig::local().keep_failed(true));
    dispatcher.add_task(task)?;

    let mut failures = 0;
    loop {
        match dispatcher.run(false) {
            Ok(_) => break,
            Err(err) if err.is_execution_failure() => {
                failures += 1;
                let mut task = dispatcher.take_failed_task(id)?;
                task.reset()?;
                assert_eq!(dispatcher.add_task(task)?, Registration::Ready);
            }
            Err(err) => return Err(err),
        }
    }

    assert_eq!(failures, 3);
    assert_eq!(attempts.load(Ordering::SeqCst), 4);
    assert_eq!(dispatcher.failed_task_count(), 0);
    Ok(())
}

#[test]
fn test_failure_does_not_disturb_other_waiters() {
    let recorder = Recorder::new();
    let mut dispatcher: TaskDispatcher<&str, i32> = TaskDispatcher::new(DispatcherConfig::local());

    dispatcher
        .add_task(Task::new(|_| panic!("boom")).requires("v", "k"))
        .unwrap();
    dispatcher
        .add_task(recorder.task("healthy").requires("v", "k"))
        .unwrap();
    drain(&mut dispatcher);

    dispatcher.receive_requirement(("k", 1)).unwrap();
    assert_eq!(dispatcher.do_action().unwrap(), Action::ProcessedRequirement);

    let mut outcomes = vec![dispatcher.do_action(), dispatcher.do_action()];
    outcomes.sort_by_key(|outcome| outcome.is_ok());

    assert!(outcomes[0].is_err());
    assert!(matches!(outcomes[1], Ok(Action::DispatchedTask)));
    assert_eq!(recorder.arguments_of("healthy")["v"], 1);
}

#[test]
fn test_failed_task_cannot_be_registered_without_reset() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let task = flaky(1, attempts);
    let id = task.id();

    let mut dispatcher: TaskDispatcher<&str, i32> =
        TaskDispatcher::new(DispatcherConfig::local().keep_failed(true));
    dispatcher.add_task(task).unwrap();
    assert!(dispatcher.do_action().is_err());

    let task = dispatcher.take_failed_task(id).unwrap();
    let err = dispatcher.add_task(task).unwrap_err();
    assert!(err.to_string().contains("cannot register while error"));
}

#[test]
fn test_host_that_ignores_failures_stays_bounded() {
    let mut dispatcher: TaskDispatcher<&str, i32> = TaskDispatcher::new(DispatcherConfig::local());

    for round in 0..10 {
        for _ in 0..100 {
            dispatcher
                .add_task(flaky(usize::MAX, Arc::new(AtomicUsize::new(0))).requires("v", "k"))
                .unwrap();
        }
        drain(&mut dispatcher);
        dispatcher.receive_requirement(("k", round)).unwrap();

        // Log-and-continue host: keep ticking past every failure
        while let Err(err) = dispatcher.run(false) {
            assert!(err.is_execution_failure());
        }

        assert_eq!(dispatcher.task_count(), 0);
        assert_eq!(dispatcher.failed_task_count(), 0);
        assert!(dispatcher.requirement_map().is_empty());
    }
}
