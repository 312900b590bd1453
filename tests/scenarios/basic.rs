//! Single-task and shared-requirement lifecycles

use crate::common::{drain, Recorder};
use reqx::{Action, DispatcherConfig, Registration, TaskDispatcher, TaskStatus};

#[test]
fn test_similarity_task_lifecycle() {
    let recorder = Recorder::new();
    let mut dispatcher: TaskDispatcher<&str, f64> = TaskDispatcher::new(DispatcherConfig::local());

    let task = recorder.task("t1").requires("similarity", "sim(cat,dog)");
    let id = task.id();
    dispatcher.add_task(task).unwrap();

    assert_eq!(dispatcher.pending_announcements(), vec!["sim(cat,dog)"]);
    assert!(dispatcher.ready_task_ids().is_empty());

    assert_eq!(dispatcher.do_action().unwrap(), Action::SentRequirement);
    dispatcher
        .receive_requirement(("sim(cat,dog)", 0.7))
        .unwrap();

    assert_eq!(dispatcher.do_action().unwrap(), Action::ProcessedRequirement);
    assert_eq!(dispatcher.ready_task_ids(), vec![id]);

    assert_eq!(dispatcher.do_action().unwrap(), Action::DispatchedTask);
    assert_eq!(recorder.arguments_of("t1").get("similarity"), Some(&0.7));

    assert_eq!(dispatcher.do_action().unwrap(), Action::Idle);
    assert_eq!(dispatcher.task_count(), 0);
}

#[test]
fn test_shared_key_released_in_one_step() {
    let recorder = Recorder::new();
    let mut dispatcher: TaskDispatcher<&str, i32> = TaskDispatcher::new(DispatcherConfig::local());

    dispatcher.add_task(recorder.task("t1").requires("v", "k")).unwrap();
    dispatcher.add_task(recorder.task("t2").requires("v", "k")).unwrap();
    assert_eq!(dispatcher.pending_announcements(), vec!["k"]);

    assert_eq!(drain(&mut dispatcher), vec![Action::SentRequirement]);

    dispatcher.receive_requirement(("k", 5)).unwrap();
    assert_eq!(dispatcher.do_action().unwrap(), Action::ProcessedRequirement);
    assert_eq!(dispatcher.ready_task_ids().len(), 2);

    assert_eq!(
        drain(&mut dispatcher),
        vec![Action::DispatchedTask, Action::DispatchedTask]
    );
    for label in ["t1", "t2"] {
        assert_eq!(recorder.arguments_of(label).get("v"), Some(&5));
    }
}

#[test]
fn test_removed_task_leaves_shared_value_for_the_rest() {
    let recorder = Recorder::new();
    let mut dispatcher: TaskDispatcher<&str, i32> = TaskDispatcher::new(DispatcherConfig::local());

    let doomed = recorder.task("doomed").requires("v", "k");
    let doomed_id = doomed.id();
    dispatcher.add_task(doomed).unwrap();
    dispatcher
        .add_task(recorder.task("survivor").requires("v", "k").requires("w", "j"))
        .unwrap();
    drain(&mut dispatcher);

    dispatcher.remove_task(doomed_id).unwrap();
    assert!(dispatcher.requirement_map().is_tracked(&"k"));

    dispatcher.receive_requirement(("k", 1)).unwrap();
    drain(&mut dispatcher);
    assert_eq!(dispatcher.requirement_map().cached_value(&"k"), Some(&1));

    dispatcher.receive_requirement(("j", 2)).unwrap();
    drain(&mut dispatcher);

    assert_eq!(recorder.labels(), vec!["survivor"]);
    let args = recorder.arguments_of("survivor");
    assert_eq!(args.get("v"), Some(&1));
    assert_eq!(args.get("w"), Some(&2));
}

#[test]
fn test_task_without_requirements_runs_on_next_tick() {
    let recorder = Recorder::<i32>::new();
    let mut dispatcher: TaskDispatcher<&str, i32> = TaskDispatcher::new(DispatcherConfig::local());

    let registration = dispatcher.add_task(recorder.task("now").arg("x", 1)).unwrap();
    assert_eq!(registration, Registration::Ready);

    assert_eq!(dispatcher.do_action().unwrap(), Action::DispatchedTask);
    assert_eq!(recorder.arguments_of("now").get("x"), Some(&1));
}

#[test]
fn test_aliased_arguments_share_one_key() {
    let recorder = Recorder::new();
    let mut dispatcher: TaskDispatcher<&str, i32> = TaskDispatcher::new(DispatcherConfig::local());

    let registration = dispatcher
        .add_task(
            recorder
                .task("alias")
                .arg("fixed", 10)
                .requires("left", "k")
                .requires("right", "k"),
        )
        .unwrap();
    assert_eq!(registration, Registration::Waiting { announced: 1 });

    drain(&mut dispatcher);
    dispatcher.receive_requirement(("k", 3)).unwrap();
    drain(&mut dispatcher);

    let args = recorder.arguments_of("alias");
    assert_eq!(args.len(), 3);
    assert_eq!(args["fixed"], 10);
    assert_eq!(args["left"], 3);
    assert_eq!(args["right"], 3);
}

#[test]
fn test_get_task_reports_waiting_status() {
    let recorder = Recorder::<i32>::new();
    let mut dispatcher: TaskDispatcher<&str, i32> = TaskDispatcher::new(DispatcherConfig::local());

    let task = recorder.task("t").requires("v", "k");
    let id = task.id();
    dispatcher.add_task(task).unwrap();

    let task = dispatcher.get_task(id).unwrap();
    assert_eq!(task.status(), TaskStatus::Waiting);
    assert_eq!(task.requirements().len(), 1);
}

#[test]
fn test_run_returns_number_of_ticks() {
    let recorder = Recorder::new();
    let mut dispatcher: TaskDispatcher<&str, i32> = TaskDispatcher::new(DispatcherConfig::local());

    for i in 0..3 {
        dispatcher
            .add_task(recorder.task(&format!("t{i}")).requires("v", "k"))
            .unwrap();
    }
    // One announcement
    assert_eq!(dispatcher.run(false).unwrap(), 1);

    dispatcher.receive_requirement(("k", 0)).unwrap();
    // One processed resolution plus three dispatches
    assert_eq!(dispatcher.run(false).unwrap(), 4);
    assert_eq!(recorder.len(), 3);

    assert_eq!(dispatcher.run(false).unwrap(), 0);
}
