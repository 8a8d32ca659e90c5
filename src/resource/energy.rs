//! 能量条
//!
//! 按固定间隔回复、可花费的能量池，附带连击点计数与决策阈值表。
//! 所有增减都经指标槽记录毛/净两个口径；增益跨过决策阈值时拉起
//! 行动决策回调。

use crate::sim::{Scheduler, SimTime, Task, TaskId, World};
use crate::unit::{
    ACTION_ENERGY_REFUND, ACTION_ENERGY_REGEN, CombatWorld, MetricsId, ResourceKind, UnitId,
    UnitKind,
};
use tracing::{debug, trace, warn};

/// 能量 tick 间隔。
pub const ENERGY_TICK_PERIOD: SimTime = SimTime(100_000_000); // 100ms
/// 每个 tick 的基础回复量。
pub const ENERGY_PER_TICK: f64 = 1.0;
/// 连击点上限。
pub const MAX_COMBO_POINTS: i32 = 5;

/// 能量条。挂在单位上，由调度器的 tick 任务驱动回复。
pub struct EnergyBar {
    max_energy: f64,
    current_energy: f64,

    combo_points: i32,

    /// 会影响行动决策的能量档位，如 [35, 45, 60, 85]。
    decision_thresholds: Vec<i32>,
    /// 稠密查表：下标为整数能量值，值为"该能量以下（含）已跨过的
    /// 档位数"。随能量单调不减。None 表示未配置——任何增益都视为
    /// 跨档。
    cumulative_thresholds: Option<Vec<i32>>,

    next_tick_at: SimTime,

    /// 两个独立系数相乘得到总回复倍率。
    regen_multiplier: f64,
    haste_multiplier: f64,

    regen_metrics: MetricsId,
    refund_metrics: MetricsId,

    task: Option<TaskId>,
}

impl EnergyBar {
    pub fn current(&self) -> f64 {
        self.current_energy
    }

    pub fn max(&self) -> f64 {
        self.max_energy
    }

    pub fn combo_points(&self) -> i32 {
        self.combo_points
    }

    pub fn next_tick_at(&self) -> SimTime {
        self.next_tick_at
    }

    pub fn decision_thresholds(&self) -> &[i32] {
        &self.decision_thresholds
    }

    /// 查表：`amount` 能量以下（含）已跨过的档位数。下标截断到表界，
    /// 配置后再调高上限或透支为负都不会越界。
    pub fn threshold_count_at(&self, amount: f64) -> Option<i32> {
        self.cumulative_thresholds.as_ref().map(|table| {
            let idx = (amount.max(0.0) as usize).min(table.len() - 1);
            table[idx]
        })
    }

    pub fn regen_metrics(&self) -> MetricsId {
        self.regen_metrics
    }

    pub fn refund_metrics(&self) -> MetricsId {
        self.refund_metrics
    }

    fn per_tick(&self) -> f64 {
        ENERGY_PER_TICK * self.haste_multiplier * self.regen_multiplier
    }
}

impl CombatWorld {
    /// 为单位启用能量条（配置期调用一次）。
    pub fn enable_energy_bar(&mut self, unit: UnitId, max_energy: f64) {
        let u = &mut self.units[unit.0];
        let regen_metrics = u.metrics.new_metrics(ACTION_ENERGY_REGEN, ResourceKind::Energy);
        let refund_metrics = u.metrics.new_metrics(ACTION_ENERGY_REFUND, ResourceKind::Energy);
        let max_energy = max_energy.max(100.0);
        u.energy = Some(EnergyBar {
            max_energy,
            current_energy: max_energy,
            combo_points: 0,
            decision_thresholds: Vec::new(),
            cumulative_thresholds: None,
            next_tick_at: SimTime::NEVER,
            regen_multiplier: 1.0,
            haste_multiplier: 1.0,
            regen_metrics,
            refund_metrics,
            task: None,
        });
    }

    /// 配置期推导决策阈值：收集该单位所有能量技能的消耗，加上决策
    /// 逻辑里对当前能量的比较常量，向上取整、排序去重，再铺成稠密
    /// 查表。之后每次增益只需一次整数下标比较。
    pub fn setup_energy_thresholds(&mut self, unit: UnitId, comparisons: &[f64]) {
        let mut thresholds: Vec<i32> = Vec::new();
        for spell in self.spells.iter().flatten() {
            if spell.caster == unit && spell.cost_kind() == Some(ResourceKind::Energy) {
                thresholds.push(spell.default_cost.ceil() as i32);
            }
        }
        for c in comparisons {
            thresholds.push(c.ceil() as i32);
        }
        thresholds.sort_unstable();

        let label = self.units[unit.0].label.clone();
        let bar = self.units[unit.0].energy.as_mut().expect("energy bar not enabled");
        bar.decision_thresholds.clear();
        let mut cur = 0;
        for t in thresholds {
            if t > cur {
                bar.decision_thresholds.push(t);
                cur = t;
            }
        }

        let len = bar.max_energy as usize + 1;
        let mut table = vec![0i32; len];
        let mut cumulative = 0;
        let mut e = 0usize;
        for &t in &bar.decision_thresholds {
            while e < len && (e as i32) < t {
                table[e] = cumulative;
                e += 1;
            }
            cumulative += 1;
        }
        while e < len {
            table[e] = cumulative;
            e += 1;
        }
        bar.cumulative_thresholds = Some(table);
        debug!(unit = %label, thresholds = ?bar.decision_thresholds, "能量决策阈值");
    }

    /// 增加能量。负数量视为内容层编程错误，立即 panic。
    pub fn add_energy(&mut self, sched: &mut Scheduler, unit: UnitId, amount: f64, metrics: MetricsId) {
        let crossed = self.add_energy_internal(unit, amount, metrics);
        self.on_energy_gain(sched, unit, crossed);
    }

    fn add_energy_internal(&mut self, unit: UnitId, amount: f64, metrics: MetricsId) -> bool {
        if amount < 0.0 {
            panic!("trying to add negative energy: {amount}");
        }
        let u = &mut self.units[unit.0];
        let bar = u.energy.as_mut().expect("energy bar not enabled");
        let new_energy = (bar.current_energy + amount).min(bar.max_energy);
        u.metrics.get_mut(metrics).add_event(amount, new_energy - bar.current_energy);

        trace!(
            unit = %u.label,
            action = %u.metrics.get(metrics).action,
            amount,
            from = bar.current_energy,
            to = new_energy,
            max = bar.max_energy,
            "获得能量"
        );

        let crossed = match &bar.cumulative_thresholds {
            None => true,
            Some(table) => {
                let at = |amount: f64| table[(amount.max(0.0) as usize).min(table.len() - 1)];
                at(bar.current_energy) != at(new_energy)
            }
        };
        bar.current_energy = new_energy;
        crossed
    }

    fn on_energy_gain(&mut self, sched: &mut Scheduler, unit: UnitId, crossed: bool) {
        // 开战前的增益不驱动决策
        if sched.now() < SimTime::ZERO {
            return;
        }
        if !self.options.interactive && crossed {
            self.trigger_rotation(sched, unit);
        }
    }

    /// 花费能量。不在零处截断：调用方应先走消耗协议的可负担检查，
    /// 透支为负时只记诊断日志。
    pub fn spend_energy(&mut self, _sched: &mut Scheduler, unit: UnitId, amount: f64, metrics: MetricsId) {
        if amount < 0.0 {
            panic!("trying to spend negative energy: {amount}");
        }
        let u = &mut self.units[unit.0];
        let bar = u.energy.as_mut().expect("energy bar not enabled");
        let new_energy = bar.current_energy - amount;
        u.metrics.get_mut(metrics).add_event(-amount, -amount);

        trace!(
            unit = %u.label,
            action = %u.metrics.get(metrics).action,
            amount,
            from = bar.current_energy,
            to = new_energy,
            "花费能量"
        );
        if new_energy < 0.0 {
            warn!(unit = %u.label, energy = new_energy, "能量透支为负");
        }
        bar.current_energy = new_energy;
    }

    /// 立即结清部分 tick 并重置 tick 计时。回复倍率要变的时候先调
    /// 这里，已流逝时间按旧倍率计，不丢也不重复。
    pub fn reset_energy_tick(&mut self, sched: &mut Scheduler, unit: UnitId) {
        let now = sched.now();
        let (partial, regen_metrics) = {
            let bar = self.units[unit.0].energy.as_ref().expect("energy bar not enabled");
            if bar.next_tick_at.is_never() {
                return; // 未启用
            }
            let elapsed = now.0 - (bar.next_tick_at.0 - ENERGY_TICK_PERIOD.0);
            let fraction = elapsed as f64 / ENERGY_TICK_PERIOD.0 as f64;
            (bar.per_tick() * fraction, bar.regen_metrics)
        };
        let crossed = self.add_energy_internal(unit, partial, regen_metrics);

        let next = now.offset(ENERGY_TICK_PERIOD);
        let bar = self.units[unit.0].energy.as_mut().expect("energy bar not enabled");
        bar.next_tick_at = next;
        let task = bar.task;

        self.on_energy_gain(sched, unit, crossed);
        if let Some(task) = task {
            sched.reschedule_task(task, next);
        }
    }

    /// 调整回复速度倍率。先结清部分 tick，否则新倍率会追溯到已按旧
    /// 倍率流逝的时间上。
    pub fn multiply_energy_regen(&mut self, sched: &mut Scheduler, unit: UnitId, multiplier: f64) {
        self.reset_energy_tick(sched, unit);
        let bar = self.units[unit.0].energy.as_mut().expect("energy bar not enabled");
        bar.regen_multiplier *= multiplier;
    }

    /// 急速等级动态变化后重算急速系数（同样先结清部分 tick）。
    pub fn process_dynamic_haste_change(&mut self, sched: &mut Scheduler, unit: UnitId) {
        self.reset_energy_tick(sched, unit);
        let u = &mut self.units[unit.0];
        let multiplier = u.stats.haste_multiplier();
        u.energy.as_mut().expect("energy bar not enabled").haste_multiplier = multiplier;
    }

    /// 动态调整能量上限。先结清部分 tick，负加成才能正确扣到零。
    pub fn update_max_energy(&mut self, sched: &mut Scheduler, unit: UnitId, bonus: f64, metrics: MetricsId) {
        self.reset_energy_tick(sched, unit);

        let current = {
            let bar = self.units[unit.0].energy.as_mut().expect("energy bar not enabled");
            bar.max_energy += bonus;
            bar.current_energy
        };

        if bonus >= 0.0 {
            self.add_energy(sched, unit, bonus, metrics);
        } else {
            self.spend_energy(sched, unit, (-bonus).min(current), metrics);
        }
    }

    /// 调度器驱动的回复 tick。被提前唤醒时什么都不做，只报告仍在
    /// 等待的到期时刻。
    pub(crate) fn energy_tick(&mut self, sched: &mut Scheduler, unit: UnitId) -> SimTime {
        let now = sched.now();
        let (amount, regen_metrics) = {
            let bar = self.units[unit.0].energy.as_ref().expect("energy bar not enabled");
            if now < bar.next_tick_at {
                return bar.next_tick_at;
            }
            (bar.per_tick(), bar.regen_metrics)
        };
        let crossed = self.add_energy_internal(unit, amount, regen_metrics);

        let next = now.offset(ENERGY_TICK_PERIOD);
        self.units[unit.0].energy.as_mut().expect("energy bar not enabled").next_tick_at = next;
        self.on_energy_gain(sched, unit, crossed);
        next
    }

    /// 启用回复：首跳在 [start_at, start_at + 一个 tick) 内随机，错开
    /// 各单位与各迭代的 tick 相位，避免聚合统计出现人为同步。
    pub fn enable_energy(&mut self, sched: &mut Scheduler, unit: UnitId, start_at: SimTime) {
        let offset = ENERGY_TICK_PERIOD.mul_f64(self.rng.next_float("Energy Tick"));
        if self.units[unit.0].energy.as_ref().expect("energy bar not enabled").task.is_none() {
            let task = sched.add_task(Box::new(EnergyTickTask { unit }));
            self.units[unit.0].energy.as_mut().expect("energy bar not enabled").task = Some(task);
        }
        let bar = self.units[unit.0].energy.as_mut().expect("energy bar not enabled");
        let first = start_at.offset(offset);
        bar.next_tick_at = first;
        let task = bar.task.expect("energy tick task registered");
        sched.reschedule_task(task, first);
        trace!(unit = %self.units[unit.0].label, first_tick = ?first, "能量回复已启用");
    }

    /// 停用回复：到期时间置 NEVER 并注销任务。
    pub fn disable_energy(&mut self, sched: &mut Scheduler, unit: UnitId) {
        let bar = self.units[unit.0].energy.as_mut().expect("energy bar not enabled");
        bar.next_tick_at = SimTime::NEVER;
        if let Some(task) = bar.task.take() {
            sched.remove_task(task);
        }
    }

    /// 迭代重置：回满、清连击点、倍率归一。Pet 不自动启用 tick。
    pub(crate) fn reset_energy(&mut self, sched: &mut Scheduler, unit: UnitId) {
        let haste = self.units[unit.0].stats.haste_multiplier();
        let Some(bar) = self.units[unit.0].energy.as_mut() else {
            return;
        };
        bar.current_energy = bar.max_energy;
        bar.combo_points = 0;
        bar.regen_multiplier = 1.0;
        bar.haste_multiplier = haste;
        bar.next_tick_at = SimTime::NEVER;
        bar.task = None; // 调度器每轮清空，旧句柄已失效

        if self.units[unit.0].kind != UnitKind::Pet {
            let start = sched.now();
            self.enable_energy(sched, unit, start);
        }
    }

    /// 增加连击点，封顶截断。净效果为零也记指标。
    pub fn add_combo_points(&mut self, unit: UnitId, points: i32, metrics: MetricsId) {
        if points < 0 {
            panic!("trying to add negative combo points: {points}");
        }
        let u = &mut self.units[unit.0];
        let bar = u.energy.as_mut().expect("energy bar not enabled");
        let new_points = (bar.combo_points + points).min(MAX_COMBO_POINTS);
        u.metrics
            .get_mut(metrics)
            .add_event(points as f64, (new_points - bar.combo_points) as f64);

        trace!(
            unit = %u.label,
            action = %u.metrics.get(metrics).action,
            points,
            from = bar.combo_points,
            to = new_points,
            "获得连击点"
        );
        bar.combo_points = new_points;
    }

    /// 清空连击点（终结技结算），记一次 -current 的整额事件。
    pub fn spend_all_combo_points(&mut self, unit: UnitId, metrics: MetricsId) {
        let u = &mut self.units[unit.0];
        let bar = u.energy.as_mut().expect("energy bar not enabled");
        let spent = bar.combo_points;
        u.metrics.get_mut(metrics).add_event(-spent as f64, -spent as f64);

        trace!(
            unit = %u.label,
            action = %u.metrics.get(metrics).action,
            spent,
            "清空连击点"
        );
        bar.combo_points = 0;
    }
}

/// 能量回复 tick 任务。
struct EnergyTickTask {
    unit: UnitId,
}

impl Task for EnergyTickTask {
    fn run(&mut self, sched: &mut Scheduler, world: &mut dyn World) -> SimTime {
        let w = world
            .as_any_mut()
            .downcast_mut::<CombatWorld>()
            .expect("combat world");
        w.energy_tick(sched, self.unit)
    }
}
