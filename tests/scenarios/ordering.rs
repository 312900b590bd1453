//! Resolution order independence and tick priorities

use crate::common::{drain, Recorder};
use reqx::{Action, DispatcherConfig, TaskDispatcher};

const PERMUTATIONS: [[&str; 3]; 6] = [
    ["a", "b", "c"],
    ["a", "c", "b"],
    ["b", "a", "c"],
    ["b", "c", "a"],
    ["c", "a", "b"],
    ["c", "b", "a"],
];

#[test]
fn test_task_ready_regardless_of_resolution_order() {
    for order in PERMUTATIONS {
        let recorder = Recorder::new();
        let mut dispatcher: TaskDispatcher<&str, i32> =
            TaskDispatcher::new(DispatcherConfig::local());

        dispatcher
            .add_task(
                recorder
                    .task("sum")
                    .requires("x", "a")
                    .requires("y", "b")
                    .requires("z", "c"),
            )
            .unwrap();
        drain(&mut dispatcher);

        for (i, key) in order.iter().enumerate() {
            assert_eq!(recorder.len(), 0, "ran early for order {order:?}");
            dispatcher.receive_requirement((*key, i as i32)).unwrap();
            drain(&mut dispatcher);
        }

        assert_eq!(recorder.len(), 1, "order {order:?}");
        let args = recorder.arguments_of("sum");
        for (i, key) in order.iter().enumerate() {
            let name = match *key {
                "a" => "x",
                "b" => "y",
                _ => "z",
            };
            assert_eq!(args[name], i as i32);
        }
    }
}

#[test]
fn test_duplicate_resolution_does_not_rerun_task() {
    let recorder = Recorder::new();
    let mut dispatcher: TaskDispatcher<&str, i32> = TaskDispatcher::new(DispatcherConfig::local());

    dispatcher.add_task(recorder.task("once").requires("v", "k")).unwrap();
    drain(&mut dispatcher);

    dispatcher.receive_requirement(("k", 1)).unwrap();
    dispatcher.receive_requirement(("k", 2)).unwrap();
    drain(&mut dispatcher);

    assert_eq!(recorder.len(), 1);
    assert_eq!(recorder.arguments_of("once")["v"], 1);
}

#[test]
fn test_announcements_go_out_before_ready_tasks_run() {
    let recorder = Recorder::<i32>::new();
    let mut dispatcher: TaskDispatcher<&str, i32> = TaskDispatcher::new(DispatcherConfig::local());

    dispatcher.add_task(recorder.task("r1")).unwrap();
    dispatcher.add_task(recorder.task("w1").requires("v", "k1")).unwrap();
    dispatcher.add_task(recorder.task("r2")).unwrap();
    dispatcher.add_task(recorder.task("w2").requires("v", "k2")).unwrap();

    assert_eq!(
        drain(&mut dispatcher),
        vec![
            Action::SentRequirement,
            Action::SentRequirement,
            Action::DispatchedTask,
            Action::DispatchedTask,
        ]
    );
    assert_eq!(recorder.labels(), vec!["r1", "r2"]);
}

#[test]
fn test_ready_tasks_run_before_next_resolution_is_absorbed() {
    let recorder = Recorder::new();
    let mut dispatcher: TaskDispatcher<&str, i32> = TaskDispatcher::new(DispatcherConfig::local());

    dispatcher.add_task(recorder.task("t1").requires("v", "k1")).unwrap();
    dispatcher.add_task(recorder.task("t2").requires("v", "k2")).unwrap();
    drain(&mut dispatcher);

    dispatcher.receive_requirement(("k1", 1)).unwrap();
    dispatcher.receive_requirement(("k2", 2)).unwrap();

    assert_eq!(
        drain(&mut dispatcher),
        vec![
            Action::ProcessedRequirement,
            Action::DispatchedTask,
            Action::ProcessedRequirement,
            Action::DispatchedTask,
        ]
    );
    assert_eq!(recorder.labels(), vec!["t1", "t2"]);
}

#[test]
fn test_resolution_before_registration_is_not_remembered() {
    let recorder = Recorder::new();
    let mut dispatcher: TaskDispatcher<&str, i32> = TaskDispatcher::new(DispatcherConfig::local());

    dispatcher.receive_requirement(("k", 1)).unwrap();
    assert_eq!(drain(&mut dispatcher), vec![Action::ProcessedRequirement]);

    dispatcher.add_task(recorder.task("late").requires("v", "k")).unwrap();
    assert_eq!(dispatcher.pending_announcements(), vec!["k"]);
    drain(&mut dispatcher);
    assert_eq!(recorder.len(), 0);

    dispatcher.receive_requirement(("k", 2)).unwrap();
    drain(&mut dispatcher);
    assert_eq!(recorder.arguments_of("late")["v"], 2);
}
