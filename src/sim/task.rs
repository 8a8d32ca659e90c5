//! 任务 trait
//!
//! 定义可被调度器反复调用的任务接口。

use super::scheduler::Scheduler;
use super::time::SimTime;
use super::world::World;

/// 任务标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub usize);

/// 任务：由调度器在到期时调用，返回下一次到期时间。
/// 返回 `SimTime::NEVER` 表示任务自行停摆——仍保持注册，但不再被选中。
pub trait Task: 'static {
    fn run(&mut self, sched: &mut Scheduler, world: &mut dyn World) -> SimTime;
}

/// 一次性任务：闭包执行一次后停摆。
pub struct OneShot {
    f: Option<Box<dyn FnOnce(&mut Scheduler, &mut dyn World)>>,
}

impl OneShot {
    pub fn new(f: impl FnOnce(&mut Scheduler, &mut dyn World) + 'static) -> Self {
        Self { f: Some(Box::new(f)) }
    }
}

impl Task for OneShot {
    fn run(&mut self, sched: &mut Scheduler, world: &mut dyn World) -> SimTime {
        if let Some(f) = self.f.take() {
            f(sched, world);
        }
        SimTime::NEVER
    }
}
