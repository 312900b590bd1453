//! Tasks with many requirements resolved in reverse order

use criterion::Criterion;
use reqx::{DispatcherConfig, Task, TaskDispatcher};
use std::hint::black_box;

pub fn bench_wide(c: &mut Criterion) {
    c.bench_function("wide_100_tasks_x_10_keys", |b| {
        b.iter(|| {
            let mut dispatcher: TaskDispatcher<u32, u32> =
                TaskDispatcher::new(DispatcherConfig::local());
            for t in 0..100u32 {
                let mut task = Task::new(|_| Ok(()));
                for k in 0..10u32 {
                    task = task.requires(format!("arg{k}"), (t + k) % 50);
                }
                dispatcher.add_task(task).unwrap();
            }
            dispatcher.run(false).unwrap();
            for key in (0..50u32).rev() {
                dispatcher.receive_requirement((key, key)).unwrap();
            }
            black_box(dispatcher.run(false).unwrap())
        });
    });
}
