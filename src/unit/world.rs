//! 战斗世界
//!
//! 战斗仿真的世界（World）实现：持有全部单位、技能与周期效果，
//! 并把战斗结算事件分发给各单位的光环钩子。

use super::metrics::ActionId;
use super::unit::{RotationFn, Unit, UnitId, UnitKind};
use crate::sim::{PRIORITY_CLEANUP, Scheduler, SimTime, StreamRng, Task, World};
use crate::spell::{Dot, Spell};
use std::any::Any;
use tracing::trace;

/// 仿真选项
#[derive(Debug, Clone, Copy, Default)]
pub struct SimOptions {
    /// 交互模式下阈值跨越不驱动行动决策。
    pub interactive: bool,
}

/// 一次命中结算的通知载荷（由战斗结算层同步传入）。
#[derive(Debug, Clone)]
pub struct HitEvent {
    pub source: UnitId,
    pub target: UnitId,
    pub action: ActionId,
    pub damage: f64,
    pub landed: bool,
    pub crit: bool,
    /// 周期伤害走 periodic-dealt 钩子，不触发普通命中钩子。
    pub periodic: bool,
}

/// 战斗世界：一轮迭代独占全部状态。
pub struct CombatWorld {
    pub(crate) units: Vec<Unit>,
    pub(crate) spells: Vec<Option<Spell>>,
    pub(crate) dots: Vec<Option<Dot>>,
    pub rng: StreamRng,
    pub options: SimOptions,
}

impl World for CombatWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl CombatWorld {
    pub fn new(options: SimOptions) -> Self {
        Self {
            units: Vec::new(),
            spells: Vec::new(),
            dots: Vec::new(),
            rng: StreamRng::seeded(0),
            options,
        }
    }

    /// 添加单位
    pub fn add_unit(&mut self, label: impl Into<String>, kind: UnitKind) -> UnitId {
        let id = UnitId(self.units.len());
        self.units.push(Unit::new(id, label.into(), kind));
        id
    }

    pub fn unit(&self, id: UnitId) -> &Unit {
        &self.units[id.0]
    }

    pub fn unit_mut(&mut self, id: UnitId) -> &mut Unit {
        &mut self.units[id.0]
    }

    pub fn num_units(&self) -> usize {
        self.units.len()
    }

    pub fn set_rotation(&mut self, unit: UnitId, rotation: RotationFn) {
        self.units[unit.0].rotation = Some(rotation);
    }

    /// 拉起一次行动决策。回调被暂时取出单位，避免重叠借用。
    pub(crate) fn trigger_rotation(&mut self, sched: &mut Scheduler, unit: UnitId) {
        let Some(mut rotation) = self.units[unit.0].rotation.take() else {
            return;
        };
        rotation(sched, self);
        if self.units[unit.0].rotation.is_none() {
            self.units[unit.0].rotation = Some(rotation);
        }
    }

    /// 战斗结算层的命中通知入口：攻方光环吃 dealt 钩子，受方吃
    /// taken 钩子；周期伤害只走 periodic-dealt。
    pub fn notify_hit(&mut self, sched: &mut Scheduler, ev: &HitEvent) {
        trace!(
            source = %self.units[ev.source.0].label,
            action = %ev.action,
            damage = ev.damage,
            crit = ev.crit,
            periodic = ev.periodic,
            "命中结算"
        );
        if ev.periodic {
            self.dispatch_periodic_dealt(sched, ev.source, ev);
        } else {
            self.dispatch_hit_dealt(sched, ev.source, ev);
            self.dispatch_hit_taken(sched, ev.target, ev);
        }
    }

    /// 迭代重置：重建随机流、清空任务、资源回满、光环归零并触发
    /// on_reset 钩子，最后在 t=0 安排一次行动决策。
    pub(crate) fn reset(&mut self, sched: &mut Scheduler, seed: u64) {
        self.rng.reseed(seed);

        for i in 0..self.units.len() {
            let id = UnitId(i);
            // 过期任务先登记：重置钩子可能立刻激活永久光环。清理优先
            // 级排在常规任务之后，同刻的最后一跳先于到期结算。
            let task =
                sched.add_task_with_priority(Box::new(AuraExpireTask { unit: id }), PRIORITY_CLEANUP);
            self.units[i].aura_task = Some(task);
            self.units[i].pseudo.reset();
            self.reset_auras_state(id);
        }
        self.reset_dots();
        for i in 0..self.units.len() {
            self.reset_energy(sched, UnitId(i));
            self.reset_mana(UnitId(i));
        }
        // on_reset 钩子按单位、再按注册顺序触发
        for i in 0..self.units.len() {
            self.fire_reset_hooks(sched, UnitId(i));
        }
        if !self.options.interactive {
            for i in 0..self.units.len() {
                if self.units[i].rotation.is_some() {
                    sched.schedule(Box::new(RotationKickTask { unit: UnitId(i) }), SimTime::ZERO);
                }
            }
        }
    }
}

/// 单位光环过期任务：到期光环熄灭后返回下一个最早过期时刻。
pub(crate) struct AuraExpireTask {
    pub(crate) unit: UnitId,
}

impl Task for AuraExpireTask {
    fn run(&mut self, sched: &mut Scheduler, world: &mut dyn World) -> SimTime {
        let w = world
            .as_any_mut()
            .downcast_mut::<CombatWorld>()
            .expect("combat world");
        w.expire_due_auras(sched, self.unit)
    }
}

/// 开战任务：t=0 拉起第一次行动决策。
struct RotationKickTask {
    unit: UnitId,
}

impl Task for RotationKickTask {
    fn run(&mut self, sched: &mut Scheduler, world: &mut dyn World) -> SimTime {
        let w = world
            .as_any_mut()
            .downcast_mut::<CombatWorld>()
            .expect("combat world");
        w.trigger_rotation(sched, self.unit);
        SimTime::NEVER
    }
}
