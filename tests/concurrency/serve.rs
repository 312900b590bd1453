//! The async serve loop driven by tokio

use std::time::Duration;

use crate::common::Recorder;
use reqx::{DispatcherConfig, TaskDispatcher};

#[tokio::test]
async fn test_serve_returns_when_handles_dropped() {
    let recorder = Recorder::new();
    let mut dispatcher: TaskDispatcher<&str, i32> = TaskDispatcher::new(DispatcherConfig::local());
    let handle = dispatcher.attach_inbox();

    let producer = {
        let recorder = recorder.clone();
        tokio::spawn(async move {
            handle
                .submit_task(recorder.task("t").requires("v", "k"))
                .unwrap();
            tokio::task::yield_now().await;
            handle.submit_requirement("k", 8).unwrap();
        })
    };

    let performed = dispatcher.serve().await.unwrap();
    producer.await.unwrap();

    // Announcement, resolution, dispatch
    assert_eq!(performed, 3);
    assert_eq!(recorder.arguments_of("t")["v"], 8);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_serve_with_slow_producers() {
    let recorder = Recorder::new();
    let mut dispatcher: TaskDispatcher<String, u64> = TaskDispatcher::new(DispatcherConfig::local());
    let handle = dispatcher.attach_inbox();

    // Register every task before any answer is produced
    for i in 0..6u64 {
        handle
            .submit_task(recorder.task(&format!("t{i}")).requires("v", format!("k{}", i % 3)))
            .unwrap();
    }

    let mut producers = Vec::new();
    for k in 0..3u64 {
        let handle = handle.clone();
        producers.push(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5 * (k + 1))).await;
            handle.submit_requirement(format!("k{k}"), k * 10).unwrap();
        }));
    }
    drop(handle);

    let performed = dispatcher.serve().await.unwrap();
    for producer in producers {
        producer.await.unwrap();
    }

    assert_eq!(performed, 3 + 3 + 6);
    for i in 0..6u64 {
        let args = recorder.arguments_of(&format!("t{i}"));
        assert_eq!(args["v"], (i % 3) * 10);
    }
}

#[tokio::test]
async fn test_serve_without_inbox_returns_when_idle() {
    let recorder = Recorder::<i32>::new();
    let mut dispatcher: TaskDispatcher<&str, i32> = TaskDispatcher::new(DispatcherConfig::local());
    dispatcher.add_task(recorder.task("t")).unwrap();

    assert_eq!(dispatcher.serve().await.unwrap(), 1);
    assert_eq!(recorder.len(), 1);
}
