use std::collections::BTreeMap;

use geom::{Duration, Time};

/// Half-cosine ease-in/ease-out. Input is clamped to [0, 1].
pub fn ease_sin(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    -((std::f64::consts::PI * t).cos() - 1.0) / 2.0
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskID(pub usize);

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Progress<K> {
    /// `eased` is already passed through `ease_sin`
    Step { owner: K, task: TaskID, eased: f64 },
    /// Emitted exactly once, right after the final step
    Done { owner: K, task: TaskID },
}

struct Task<K> {
    owner: K,
    duration: Duration,
    // Set by the first tick that sees the task
    start: Option<Time>,
    report_steps: bool,
}

impl<K> Task<K> {
    fn progress(&self, start: Time, now: Time) -> f64 {
        if self.duration <= Duration::ZERO {
            return 1.0;
        }
        if now <= start {
            return 0.0;
        }
        ((now - start) / self.duration).min(1.0)
    }
}

/// Runs duration-bound transitions off an external frame clock. Every task belongs to some owner
/// and reports back through `tick`; the scheduler never calls anything itself. Tasks registered
/// while handling one tick's results start counting on the next tick.
pub struct Scheduler<K> {
    tasks: BTreeMap<TaskID, Task<K>>,
    next_id: usize,
}

impl<K: Copy> Default for Scheduler<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Copy> Scheduler<K> {
    pub fn new() -> Self {
        Self {
            tasks: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Reports eased progress from 0 to 1 over the duration, then finishes.
    pub fn run_transition(&mut self, owner: K, duration: Duration) -> TaskID {
        self.insert(owner, duration, true)
    }

    /// Finishes after the duration without reporting progress.
    pub fn delay(&mut self, owner: K, duration: Duration) -> TaskID {
        self.insert(owner, duration, false)
    }

    fn insert(&mut self, owner: K, duration: Duration, report_steps: bool) -> TaskID {
        let id = TaskID(self.next_id);
        self.next_id += 1;
        self.tasks.insert(
            id,
            Task {
                owner,
                duration,
                start: None,
                report_steps,
            },
        );
        id
    }

    /// A cancelled task never reports `Done`. False if it already finished or was never
    /// scheduled.
    pub fn cancel(&mut self, task: TaskID) -> bool {
        self.tasks.remove(&task).is_some()
    }

    pub fn is_pending(&self, task: TaskID) -> bool {
        self.tasks.contains_key(&task)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Advances every pending task, in the order they were registered.
    pub fn tick(&mut self, now: Time) -> Vec<Progress<K>> {
        let mut results = Vec::new();
        let mut finished = Vec::new();
        for (id, task) in &mut self.tasks {
            let start = *task.start.get_or_insert(now);
            let t = task.progress(start, now);
            if task.report_steps {
                results.push(Progress::Step {
                    owner: task.owner,
                    task: *id,
                    eased: ease_sin(t),
                });
            }
            if t >= 1.0 {
                results.push(Progress::Done {
                    owner: task.owner,
                    task: *id,
                });
                finished.push(*id);
            }
        }
        for id in finished {
            self.tasks.remove(&id);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: f64) -> Time {
        Time::START_OF_DAY + Duration::seconds(secs)
    }

    #[test]
    fn easing_endpoints_and_symmetry() {
        assert_eq!(ease_sin(0.0), 0.0);
        assert!((ease_sin(1.0) - 1.0).abs() < 1e-12);
        assert!((ease_sin(0.5) - 0.5).abs() < 1e-12);
        assert!((ease_sin(0.25) + ease_sin(0.75) - 1.0).abs() < 1e-12);
        assert_eq!(ease_sin(-1.0), 0.0);
        assert!((ease_sin(7.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn easing_never_decreases() {
        let mut last = ease_sin(0.0);
        for i in 1..=1000 {
            let next = ease_sin(i as f64 / 1000.0);
            assert!(next >= last);
            last = next;
        }
    }

    #[test]
    fn transition_steps_then_finishes_once() {
        let mut scheduler = Scheduler::new();
        let task = scheduler.run_transition('a', Duration::seconds(2.0));

        assert_eq!(
            scheduler.tick(at(10.0)),
            vec![Progress::Step {
                owner: 'a',
                task,
                eased: 0.0
            }]
        );
        match scheduler.tick(at(11.0))[..] {
            [Progress::Step { eased, .. }] => assert!((eased - 0.5).abs() < 1e-9),
            ref x => panic!("unexpected {x:?}"),
        }
        let last = scheduler.tick(at(12.5));
        assert_eq!(last.len(), 2);
        assert!(matches!(last[0], Progress::Step { eased, .. } if (eased - 1.0).abs() < 1e-9));
        assert_eq!(last[1], Progress::Done { owner: 'a', task });

        assert!(scheduler.tick(at(13.0)).is_empty());
        assert!(scheduler.is_empty());
    }

    #[test]
    fn delays_only_finish() {
        let mut scheduler = Scheduler::new();
        let task = scheduler.delay(7, Duration::seconds(1.0));
        assert!(scheduler.tick(at(0.0)).is_empty());
        assert!(scheduler.tick(at(0.9)).is_empty());
        assert_eq!(
            scheduler.tick(at(1.0)),
            vec![Progress::Done { owner: 7, task }]
        );
    }

    #[test]
    fn zero_duration_finishes_on_first_tick() {
        let mut scheduler = Scheduler::new();
        let task = scheduler.run_transition((), Duration::ZERO);
        let results = scheduler.tick(at(3.0));
        assert_eq!(results.len(), 2);
        assert_eq!(results[1], Progress::Done { owner: (), task });
    }

    #[test]
    fn cancelled_tasks_never_finish() {
        let mut scheduler = Scheduler::new();
        let keep = scheduler.delay("keep", Duration::seconds(1.0));
        let cancel = scheduler.delay("cancel", Duration::seconds(1.0));
        scheduler.tick(at(0.0));

        assert!(scheduler.cancel(cancel));
        assert!(!scheduler.cancel(cancel));
        assert!(!scheduler.is_pending(cancel));
        assert_eq!(
            scheduler.tick(at(5.0)),
            vec![Progress::Done {
                owner: "keep",
                task: keep
            }]
        );
    }

    #[test]
    fn tasks_start_when_first_ticked() {
        let mut scheduler = Scheduler::new();
        scheduler.delay(1, Duration::seconds(1.0));
        scheduler.tick(at(0.0));

        // Registered after the first tick, so its clock starts at 0.5
        let late = scheduler.delay(2, Duration::seconds(1.0));
        scheduler.tick(at(0.5));
        assert_eq!(scheduler.tick(at(1.0)).len(), 1);
        assert!(scheduler.is_pending(late));
        assert_eq!(
            scheduler.tick(at(1.5)),
            vec![Progress::Done {
                owner: 2,
                task: late
            }]
        );
    }

    #[test]
    fn concurrent_tasks_are_independent() {
        let mut scheduler = Scheduler::new();
        let short = scheduler.run_transition(0, Duration::seconds(1.0));
        let long = scheduler.run_transition(1, Duration::seconds(4.0));
        scheduler.tick(at(0.0));

        let results = scheduler.tick(at(1.0));
        assert!(results.contains(&Progress::Done {
            owner: 0,
            task: short
        }));
        assert!(scheduler.is_pending(long));
        assert_eq!(scheduler.len(), 1);
    }
}
