//! 遭遇战驱动
//!
//! 持有调度器与战斗世界，按迭代重置并推进到设定的战斗时长。

use super::world::{CombatWorld, SimOptions};
use crate::sim::{Scheduler, SimTime};
use tracing::debug;

/// 一场遭遇战：调度器 + 世界。独立迭代串行复用同一份配置。
pub struct Encounter {
    pub sched: Scheduler,
    pub world: CombatWorld,
}

impl Encounter {
    pub fn new(options: SimOptions) -> Self {
        Self {
            sched: Scheduler::default(),
            world: CombatWorld::new(options),
        }
    }

    /// 跑一轮迭代：时钟拨回 -prepull，重置世界，`kick` 注入本轮的
    /// 业务任务（自动攻击等），然后推进到 duration。
    pub fn run_iteration(
        &mut self,
        seed: u64,
        duration: SimTime,
        prepull: SimTime,
        kick: impl FnOnce(&mut Scheduler, &mut CombatWorld),
    ) {
        let start = SimTime(-prepull.0);
        self.sched.reset(start);
        self.world.reset(&mut self.sched, seed);
        kick(&mut self.sched, &mut self.world);
        self.sched.run_until(duration, &mut self.world);
        debug!(seed, draws = self.world.rng.draws(), now = ?self.sched.now(), "迭代结束");
    }
}
