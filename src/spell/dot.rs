//! 周期效果（Dot）
//!
//! 绑定在一个光环上的固定跳数 × 固定间隔的周期效果。每跳是一个
//! 调度器任务；蓄池（pool）跨跳、跨刷新保留，只在光环到期时清零，
//! 因此到期前重新施加是"继续蓄"而不是"从头来"。

use super::spell::SpellHandle;
use crate::aura::AuraHandle;
use crate::sim::{Scheduler, SimTime, Task, TaskId, World};
use crate::unit::{CombatWorld, UnitId};
use tracing::trace;

/// 周期效果句柄。每个（技能, 目标）一个实例，跨施加复用。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DotHandle(pub usize);

/// 一跳的上下文。`pool` 在本跳期间是蓄池的权威视图。
pub struct DotTick<'a> {
    pub dot: DotHandle,
    pub spell: SpellHandle,
    pub target: UnitId,
    /// 含本跳在内的剩余跳数（首跳为跳数全额）。
    pub remaining: u32,
    pub pool: &'a mut f64,
}

pub type DotTickFn = Box<dyn FnMut(&mut Scheduler, &mut CombatWorld, DotTick<'_>)>;

/// 周期效果注册配置。目标取自光环所在单位。
pub struct DotConfig {
    pub spell: SpellHandle,
    pub aura: AuraHandle,
    pub num_ticks: u32,
    pub tick_period: SimTime,
    pub on_tick: DotTickFn,
}

pub struct Dot {
    pub(crate) spell: SpellHandle,
    pub(crate) aura: AuraHandle,
    pub(crate) target: UnitId,
    pub(crate) num_ticks: u32,
    pub(crate) tick_period: SimTime,

    pub(crate) remaining: u32,
    pub(crate) next_tick_at: SimTime,
    pub(crate) task: Option<TaskId>,
    pub(crate) pool: f64,
    pub(crate) on_tick: Option<DotTickFn>,
}

impl CombatWorld {
    /// 注册周期效果，返回稳定句柄。
    pub fn register_dot(&mut self, config: DotConfig) -> DotHandle {
        let handle = DotHandle(self.dots.len());
        self.dots.push(Some(Dot {
            spell: config.spell,
            aura: config.aura,
            target: config.aura.unit,
            num_ticks: config.num_ticks,
            tick_period: config.tick_period,
            remaining: 0,
            next_tick_at: SimTime::NEVER,
            task: None,
            pool: 0.0,
            on_tick: Some(config.on_tick),
        }));
        handle
    }

    fn dot_ref(&self, h: DotHandle) -> &Dot {
        self.dots[h.0].as_ref().expect("dot registered")
    }

    fn dot_mut(&mut self, h: DotHandle) -> &mut Dot {
        self.dots[h.0].as_mut().expect("dot registered")
    }

    pub fn dot_is_active(&self, h: DotHandle) -> bool {
        self.aura_is_active(self.dot_ref(h).aura)
    }

    pub fn dot_pool(&self, h: DotHandle) -> f64 {
        self.dot_ref(h).pool
    }

    /// 往蓄池里存一笔（命中结算把伤害份额蓄进来，之后按跳释放）。
    pub fn dot_pool_add(&mut self, h: DotHandle, amount: f64) {
        self.dot_mut(h).pool += amount;
    }

    /// 施加：激活光环并安排第一跳。
    pub fn dot_apply(&mut self, sched: &mut Scheduler, h: DotHandle) {
        let aura = self.dot_ref(h).aura;
        self.aura_activate(sched, aura);

        let now = sched.now();
        if self.dot_ref(h).task.is_none() {
            let task = sched.add_task(Box::new(DotTickTask { dot: h }));
            self.dot_mut(h).task = Some(task);
        }
        let dot = self.dot_mut(h);
        dot.remaining = dot.num_ticks;
        dot.next_tick_at = now.offset(dot.tick_period);
        let (task, next) = (dot.task.expect("dot tick task registered"), dot.next_tick_at);
        sched.reschedule_task(task, next);
        trace!(dot = h.0, first_tick = ?next, "周期效果施加");
    }

    /// 刷新：延长光环并补满剩余跳数，蓄池原样保留。
    pub fn dot_refresh(&mut self, sched: &mut Scheduler, h: DotHandle) {
        let aura = self.dot_ref(h).aura;
        self.aura_refresh(sched, aura);

        let now = sched.now();
        let dot = self.dot_mut(h);
        dot.remaining = dot.num_ticks;
        // 跳完停摆后刷新要重新起跳；还在跳就保持原节奏
        if dot.next_tick_at.is_never() {
            dot.next_tick_at = now.offset(dot.tick_period);
            let (task, next) = (dot.task.expect("dot tick task registered"), dot.next_tick_at);
            sched.reschedule_task(task, next);
        }
    }

    /// 一跳。提前唤醒时只报告仍在等待的到期时刻。光环熄灭时
    /// [`CombatWorld::reset_dots_for_aura`] 已把剩余跳数清零。
    pub(crate) fn dot_tick(&mut self, sched: &mut Scheduler, h: DotHandle) -> SimTime {
        let now = sched.now();
        let (on_tick, spell, target, mut pool, remaining) = {
            let dot = self.dot_mut(h);
            if dot.remaining == 0 {
                return SimTime::NEVER;
            }
            if now < dot.next_tick_at {
                return dot.next_tick_at;
            }
            (dot.on_tick.take(), dot.spell, dot.target, dot.pool, dot.remaining)
        };

        if let Some(mut tick) = on_tick {
            tick(
                sched,
                self,
                DotTick {
                    dot: h,
                    spell,
                    target,
                    remaining,
                    pool: &mut pool,
                },
            );
            let dot = self.dot_mut(h);
            if dot.on_tick.is_none() {
                dot.on_tick = Some(tick);
            }
        }

        let dot = self.dot_mut(h);
        dot.pool = pool;
        dot.remaining -= 1;
        dot.next_tick_at = if dot.remaining > 0 {
            now.offset(dot.tick_period)
        } else {
            SimTime::NEVER
        };
        trace!(dot = h.0, remaining = dot.remaining, pool = dot.pool, "周期效果跳动");
        dot.next_tick_at
    }

    /// 光环熄灭时的清理：蓄池清零、停跳。到期是蓄池唯一的清零点。
    pub(crate) fn reset_dots_for_aura(&mut self, sched: &mut Scheduler, aura: AuraHandle) {
        for i in 0..self.dots.len() {
            let Some(dot) = self.dots[i].as_mut() else {
                continue;
            };
            if dot.aura != aura {
                continue;
            }
            dot.pool = 0.0;
            dot.remaining = 0;
            dot.next_tick_at = SimTime::NEVER;
            if let Some(task) = dot.task {
                sched.reschedule_task(task, SimTime::NEVER);
            }
        }
    }

    /// 迭代重置：全部停摆清零。任务句柄随调度器清空一并失效。
    pub(crate) fn reset_dots(&mut self) {
        for dot in self.dots.iter_mut().flatten() {
            dot.pool = 0.0;
            dot.remaining = 0;
            dot.next_tick_at = SimTime::NEVER;
            dot.task = None;
        }
    }
}

/// 周期效果的跳动任务。
struct DotTickTask {
    dot: DotHandle,
}

impl Task for DotTickTask {
    fn run(&mut self, sched: &mut Scheduler, world: &mut dyn World) -> SimTime {
        let w = world
            .as_any_mut()
            .downcast_mut::<CombatWorld>()
            .expect("combat world");
        w.dot_tick(sched, self.dot)
    }
}
