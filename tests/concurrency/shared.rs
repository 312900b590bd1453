//! SharedDispatcher used from several threads

use std::thread;

use parking_lot::Mutex;
use std::sync::Arc;

use crate::common::Recorder;
use reqx::{AnnounceFn, DispatcherConfig, SharedDispatcher, TaskDispatcher, TaskStatus};

#[test]
fn test_concurrent_registration_announces_each_key_once() {
    let asked = Arc::new(Mutex::new(Vec::new()));
    let sink = asked.clone();
    let recorder = Recorder::new();

    let shared = SharedDispatcher::new(
        TaskDispatcher::<String, usize>::new(DispatcherConfig::local())
            .with_announcer(AnnounceFn(move |key: &String| sink.lock().push(key.clone()))),
    );

    let workers: Vec<_> = (0..4)
        .map(|w| {
            let shared = shared.clone();
            let recorder = recorder.clone();
            thread::spawn(move || {
                for i in 0..25 {
                    let n = w * 25 + i;
                    shared
                        .add_task(recorder.task(&format!("t{n}")).requires("v", format!("k{}", n % 5)))
                        .unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(shared.run(false).unwrap(), 5);
    let mut keys = asked.lock().clone();
    keys.sort();
    assert_eq!(keys, vec!["k0", "k1", "k2", "k3", "k4"]);

    let resolvers: Vec<_> = (0..5)
        .map(|k| {
            let shared = shared.clone();
            thread::spawn(move || {
                shared.receive_requirement((format!("k{k}"), k)).unwrap();
            })
        })
        .collect();
    for resolver in resolvers {
        resolver.join().unwrap();
    }

    assert_eq!(shared.run(false).unwrap(), 5 + 100);
    assert_eq!(recorder.len(), 100);
    assert!(shared.with(|d| d.requirement_map().is_empty()));
}

#[test]
fn test_ticks_interleave_with_producers() {
    let recorder = Recorder::<i32>::new();
    let shared = SharedDispatcher::new(TaskDispatcher::<&str, i32>::new(DispatcherConfig::local()));

    let producer = {
        let shared = shared.clone();
        let recorder = recorder.clone();
        thread::spawn(move || {
            for i in 0..50 {
                shared.add_task(recorder.task(&format!("t{i}"))).unwrap();
            }
        })
    };

    let mut performed = 0;
    while !producer.is_finished() {
        performed += shared.run(false).unwrap();
    }
    producer.join().unwrap();
    performed += shared.run(false).unwrap();

    assert_eq!(performed, 50);
    assert_eq!(recorder.len(), 50);
}

#[test]
fn test_status_and_removal_through_shared_handle() {
    let recorder = Recorder::<i32>::new();
    let shared = SharedDispatcher::new(TaskDispatcher::<&str, i32>::new(DispatcherConfig::local()));

    let task = recorder.task("t").requires("v", "k");
    let id = task.id();
    shared.add_task(task).unwrap();

    assert_eq!(shared.task_status(id).unwrap(), TaskStatus::Waiting);
    assert_eq!(shared.remove_task(id).unwrap().id(), id);
    assert!(shared.task_status(id).is_err());
}

#[test]
fn test_run_when_idle_serves_until_closed() {
    let recorder = Recorder::new();
    let shared = SharedDispatcher::new(TaskDispatcher::<String, i32>::new(DispatcherConfig::local()));

    let worker = {
        let shared = shared.clone();
        thread::spawn(move || shared.run(true).unwrap())
    };

    for i in 0..10 {
        shared
            .add_task(recorder.task(&format!("t{i}")).requires("v", format!("k{}", i % 2)))
            .unwrap();
    }
    // Wait for both requests to go out before answering
    while shared.with(|d| !d.pending_announcements().is_empty()) {
        thread::yield_now();
    }
    shared.receive_requirement(("k0".to_string(), 0)).unwrap();
    shared.receive_requirement(("k1".to_string(), 1)).unwrap();
    shared.close();

    // 2 announcements, 2 resolutions, 10 dispatches
    assert_eq!(worker.join().unwrap(), 2 + 2 + 10);
    assert_eq!(recorder.len(), 10);
    assert!(shared.is_closed());
}

#[test]
fn test_run_when_idle_returns_at_once_when_already_closed() {
    let shared = SharedDispatcher::new(TaskDispatcher::<&str, i32>::new(DispatcherConfig::local()));
    shared.close();
    assert_eq!(shared.run(true).unwrap(), 0);
}
