//! 技能消耗协议
//!
//! 同一套"检查/扣费/返还"契约，不同资源语义。变体集封闭，注册时
//! 选定，经 trait 对象分发——运行期不做类型探查。

use super::spell::Spell;
use crate::sim::Scheduler;
use crate::unit::{CombatWorld, MetricsId, ResourceKind};

/// 消耗能力接口。
pub trait SpellCost {
    fn kind(&self) -> ResourceKind;

    /// 可负担检查。允许的唯一副作用：套用成本修正，敲定本次施放的
    /// `cur_cost`。
    fn meets_requirement(&mut self, world: &mut CombatWorld, spell: &mut Spell) -> bool;

    /// 人类可读的失败诊断，不用于控制流。
    fn cost_failure_reason(&self, world: &CombatWorld, spell: &Spell) -> String;

    fn spend(&mut self, sched: &mut Scheduler, world: &mut CombatWorld, spell: &mut Spell);

    /// 条件返还。走独立的指标槽，报告里与原扣费分开归因。
    fn refund(&mut self, sched: &mut Scheduler, world: &mut CombatWorld, spell: &mut Spell);
}

/// 能量消耗。
pub struct EnergyCost {
    pub refund: f64,
    pub refund_metrics: MetricsId,
    pub resource_metrics: MetricsId,
}

impl SpellCost for EnergyCost {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Energy
    }

    fn meets_requirement(&mut self, world: &mut CombatWorld, spell: &mut Spell) -> bool {
        spell.cur_cost = spell.apply_cost_modifiers(spell.cur_cost);
        world.unit(spell.caster).current_energy() >= spell.cur_cost
    }

    fn cost_failure_reason(&self, world: &CombatWorld, spell: &Spell) -> String {
        format!(
            "not enough energy (current energy = {:.3}, energy cost = {:.3})",
            world.unit(spell.caster).current_energy(),
            spell.cur_cost
        )
    }

    fn spend(&mut self, sched: &mut Scheduler, world: &mut CombatWorld, spell: &mut Spell) {
        world.spend_energy(sched, spell.caster, spell.cur_cost, self.resource_metrics);
    }

    fn refund(&mut self, sched: &mut Scheduler, world: &mut CombatWorld, spell: &mut Spell) {
        if self.refund > 0.0 {
            world.add_energy(sched, spell.caster, self.refund * spell.cur_cost, self.refund_metrics);
        }
    }
}

/// 连击点消耗：终结技一次吃光全部点数。
pub struct ComboPointCost {
    pub min_points: i32,
    pub combo_metrics: MetricsId,
}

impl SpellCost for ComboPointCost {
    fn kind(&self) -> ResourceKind {
        ResourceKind::ComboPoints
    }

    fn meets_requirement(&mut self, world: &mut CombatWorld, spell: &mut Spell) -> bool {
        world.unit(spell.caster).combo_points() >= self.min_points.max(1)
    }

    fn cost_failure_reason(&self, world: &CombatWorld, spell: &Spell) -> String {
        format!(
            "not enough combo points (current = {}, required = {})",
            world.unit(spell.caster).combo_points(),
            self.min_points.max(1)
        )
    }

    fn spend(&mut self, _sched: &mut Scheduler, world: &mut CombatWorld, spell: &mut Spell) {
        world.spend_all_combo_points(spell.caster, self.combo_metrics);
    }

    fn refund(&mut self, _sched: &mut Scheduler, _world: &mut CombatWorld, _spell: &mut Spell) {
        // 连击点不返还
    }
}

/// 法力消耗。
pub struct ManaCost {
    pub refund: f64,
    pub refund_metrics: MetricsId,
    pub resource_metrics: MetricsId,
}

impl SpellCost for ManaCost {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Mana
    }

    fn meets_requirement(&mut self, world: &mut CombatWorld, spell: &mut Spell) -> bool {
        spell.cur_cost = spell.apply_cost_modifiers(spell.cur_cost);
        world.unit(spell.caster).current_mana() >= spell.cur_cost
    }

    fn cost_failure_reason(&self, world: &CombatWorld, spell: &Spell) -> String {
        format!(
            "not enough mana (current mana = {:.3}, mana cost = {:.3})",
            world.unit(spell.caster).current_mana(),
            spell.cur_cost
        )
    }

    fn spend(&mut self, sched: &mut Scheduler, world: &mut CombatWorld, spell: &mut Spell) {
        world.spend_mana(sched, spell.caster, spell.cur_cost, self.resource_metrics);
    }

    fn refund(&mut self, sched: &mut Scheduler, world: &mut CombatWorld, spell: &mut Spell) {
        if self.refund > 0.0 {
            world.add_mana(sched, spell.caster, self.refund * spell.cur_cost, self.refund_metrics);
        }
    }
}
