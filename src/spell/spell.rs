//! 技能
//!
//! 技能持有一个按资源种类选定的消耗对象（配置期确定的封闭变体集）
//! 与效果闭包。施放流程：敲定修正后成本 → 可负担检查 → 扣费 →
//! 执行效果；检查失败只是决策层的一个分支，不是错误。

use super::cost::{ComboPointCost, EnergyCost, ManaCost, SpellCost};
use crate::sim::Scheduler;
use crate::unit::{ActionId, CombatWorld, ResourceKind, UnitId};
use tracing::{debug, trace};

/// 技能句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpellHandle(pub usize);

/// 技能效果闭包：施放成功后调用。
pub type SpellEffectFn = Box<dyn FnMut(&mut Scheduler, &mut CombatWorld, SpellHandle, UnitId)>;

/// 消耗配置：注册时选定变体。
pub enum CostConfig {
    Energy {
        amount: f64,
        /// 返还比例（按实际支付成本计），触发时机由调用方决定。
        refund: f64,
    },
    ComboPoints {
        min_points: i32,
    },
    Mana {
        amount: f64,
        refund: f64,
    },
}

/// 技能注册配置。
pub struct SpellConfig {
    pub label: String,
    pub action: ActionId,
    pub cost: Option<CostConfig>,
    pub apply_effects: Option<SpellEffectFn>,
}

/// 技能。
pub struct Spell {
    pub handle: SpellHandle,
    pub caster: UnitId,
    pub label: String,
    pub action: ActionId,

    /// 注册时的基础成本。
    pub default_cost: f64,
    /// 本次施放的成本，由可负担检查套用修正后敲定。
    pub cur_cost: f64,
    pub flat_cost_mod: f64,
    pub pct_cost_mod: f64,

    pub casts: u64,

    pub(crate) cost: Option<Box<dyn SpellCost>>,
    pub(crate) apply_effects: Option<SpellEffectFn>,
}

impl Spell {
    /// 套用成本修正（先加平减再乘百分比，不低于零）。
    pub fn apply_cost_modifiers(&self, cost: f64) -> f64 {
        ((cost + self.flat_cost_mod) * self.pct_cost_mod).max(0.0)
    }

    pub fn cost_kind(&self) -> Option<ResourceKind> {
        self.cost.as_ref().map(|c| c.kind())
    }
}

impl CombatWorld {
    /// 注册技能，返回稳定句柄。消耗对象与其指标槽在此构建。
    pub fn register_spell(&mut self, unit: UnitId, config: SpellConfig) -> SpellHandle {
        let handle = SpellHandle(self.spells.len());
        let (default_cost, cost): (f64, Option<Box<dyn SpellCost>>) = match config.cost {
            Some(CostConfig::Energy { amount, refund }) => {
                let u = &mut self.units[unit.0];
                let resource_metrics = u.metrics.new_metrics(config.action, ResourceKind::Energy);
                // 没给专属返还槽就落到能量条共享的返还指标
                let refund_metrics = u
                    .energy
                    .as_ref()
                    .expect("energy cost requires an energy bar")
                    .refund_metrics();
                (
                    amount,
                    Some(Box::new(EnergyCost {
                        refund,
                        refund_metrics,
                        resource_metrics,
                    })),
                )
            }
            Some(CostConfig::ComboPoints { min_points }) => {
                let u = &mut self.units[unit.0];
                let combo_metrics = u.metrics.new_metrics(config.action, ResourceKind::ComboPoints);
                (
                    0.0,
                    Some(Box::new(ComboPointCost {
                        min_points,
                        combo_metrics,
                    })),
                )
            }
            Some(CostConfig::Mana { amount, refund }) => {
                let u = &mut self.units[unit.0];
                let resource_metrics = u.metrics.new_metrics(config.action, ResourceKind::Mana);
                let refund_metrics = u
                    .mana
                    .as_ref()
                    .expect("mana cost requires a mana bar")
                    .refund_metrics();
                (
                    amount,
                    Some(Box::new(ManaCost {
                        refund,
                        refund_metrics,
                        resource_metrics,
                    })),
                )
            }
            None => (0.0, None),
        };
        self.spells.push(Some(Spell {
            handle,
            caster: unit,
            label: config.label,
            action: config.action,
            default_cost,
            cur_cost: default_cost,
            flat_cost_mod: 0.0,
            pct_cost_mod: 1.0,
            casts: 0,
            cost,
            apply_effects: config.apply_effects,
        }));
        handle
    }

    pub fn spell(&self, h: SpellHandle) -> &Spell {
        self.spells[h.0].as_ref().expect("spell registered")
    }

    pub fn spell_mut(&mut self, h: SpellHandle) -> &mut Spell {
        self.spells[h.0].as_mut().expect("spell registered")
    }

    /// 延迟绑定技能效果（注册顺序相互依赖时用）。
    pub fn set_spell_effect(&mut self, h: SpellHandle, effect: SpellEffectFn) {
        self.spell_mut(h).apply_effects = Some(effect);
    }

    /// 施放。可负担检查失败返回 false，不打断仿真。技能在扣费阶段
    /// 被暂时取出；返还/增益途中行动决策再次施放同一技能时会在这里
    /// 碰到空槽位，按"本轮放不出"处理而不是崩溃。
    pub fn cast(&mut self, sched: &mut Scheduler, h: SpellHandle, target: UnitId) -> bool {
        let Some(mut spell) = self.spells[h.0].take() else {
            debug!(spell = h.0, "技能正在结算中，跳过本次施放");
            return false;
        };
        spell.cur_cost = spell.default_cost;

        let mut ok = true;
        if let Some(mut cost) = spell.cost.take() {
            if cost.meets_requirement(self, &mut spell) {
                cost.spend(sched, self, &mut spell);
            } else {
                debug!(
                    spell = %spell.label,
                    reason = %cost.cost_failure_reason(self, &spell),
                    "施放失败"
                );
                ok = false;
            }
            spell.cost = Some(cost);
        }

        if ok {
            spell.casts += 1;
            trace!(spell = %spell.label, target = target.0, cost = spell.cur_cost, "施放");
        }

        // 效果运行前把技能放回槽位，效果闭包里可以查询自己
        let mut effect = if ok { spell.apply_effects.take() } else { None };
        self.spells[h.0] = Some(spell);

        if let Some(effect) = effect.as_mut() {
            effect(sched, self, h, target);
        }
        if let Some(effect) = effect {
            let spell = self.spells[h.0].as_mut().expect("spell registered");
            if spell.apply_effects.is_none() {
                spell.apply_effects = Some(effect);
            }
        }
        ok
    }

    /// 查询当前状态下的施放失败原因（诊断用途）。能施放返回 None。
    pub fn cost_failure_reason(&mut self, h: SpellHandle) -> Option<String> {
        let Some(mut spell) = self.spells[h.0].take() else {
            return None;
        };
        spell.cur_cost = spell.default_cost;
        let reason = match spell.cost.take() {
            Some(mut cost) => {
                let reason = if cost.meets_requirement(self, &mut spell) {
                    None
                } else {
                    Some(cost.cost_failure_reason(self, &spell))
                };
                spell.cost = Some(cost);
                reason
            }
            None => None,
        };
        self.spells[h.0] = Some(spell);
        reason
    }

    /// 按调用方判定的时机（如未命中）返还部分已付成本。
    pub fn issue_refund(&mut self, sched: &mut Scheduler, h: SpellHandle) {
        let Some(mut spell) = self.spells[h.0].take() else {
            return;
        };
        if let Some(mut cost) = spell.cost.take() {
            cost.refund(sched, self, &mut spell);
            spell.cost = Some(cost);
        }
        self.spells[h.0] = Some(spell);
    }
}
