//! 决斗者示例
//!
//! 内容层示例：一个靠能量运转的近战单位打木桩。铺满核心的全部注册
//! 契约——能量条与决策阈值、起手/终结技、带内置冷却的叠层触发、
//! 蓄池式流血周期效果、自动攻击任务与阈值驱动的行动决策。伤害数字
//! 只是占位，不是仿真目标。

use crate::aura::{AuraConfig, AuraHandle, AuraHooks, Cooldown, make_permanent};
use crate::sim::{ScenarioSpec, Scheduler, SimTime, Task, World};
use crate::spell::{CostConfig, DotConfig, DotHandle, SpellConfig, SpellHandle};
use crate::unit::{
    ActionId, CombatWorld, Encounter, HitEvent, MetricsId, ResourceKind, ResourceMetrics,
    SimOptions, UnitId, UnitKind,
};
use serde::Serialize;

const STRIKE_COST: f64 = 45.0;
const FINISHER_COST: f64 = 35.0;
const FINISHER_MIN_POINTS: i32 = 3;

/// 示例单位的全部句柄。
pub struct Duelist {
    pub player: UnitId,
    pub target: UnitId,
    pub strike: SpellHandle,
    pub finisher: SpellHandle,
    pub bleed: DotHandle,
    pub frenzy: AuraHandle,
    pub strike_combo_metrics: MetricsId,
}

/// 搭建决斗者：注册单位、资源条、技能、光环与周期效果。
pub fn build_duelist(world: &mut CombatWorld) -> Duelist {
    let player = world.add_unit("duelist", UnitKind::Player);
    let target = world.add_unit("training dummy", UnitKind::Target);

    world.enable_energy_bar(player, 100.0);

    let strike_combo_metrics = world
        .unit_mut(player)
        .metrics
        .new_metrics(ActionId("viper_strike"), ResourceKind::ComboPoints);

    // 起手技：45 能量，未命中返还八成，命中给连击点（暴击给双倍）
    let strike = world.register_spell(
        player,
        SpellConfig {
            label: "Viper Strike".into(),
            action: ActionId("viper_strike"),
            cost: Some(CostConfig::Energy {
                amount: STRIKE_COST,
                refund: 0.8,
            }),
            apply_effects: Some(Box::new(move |sched, world, spell, target| {
                let caster = world.spell(spell).caster;
                let crit = world.rng.proc(0.25, "Viper Strike Crit");
                let damage = 180.0
                    * world.unit(caster).pseudo.damage_dealt_multiplier
                    * if crit { 2.0 } else { 1.0 };
                world.add_combo_points(caster, if crit { 2 } else { 1 }, strike_combo_metrics);
                let ev = HitEvent {
                    source: caster,
                    target,
                    action: ActionId("viper_strike"),
                    damage,
                    landed: true,
                    crit,
                    periodic: false,
                };
                world.notify_hit(sched, &ev);
            })),
        },
    );

    // 终结技：35 能量，吃光连击点，把伤害蓄进流血池
    let finisher = world.register_spell(
        player,
        SpellConfig {
            label: "Lacerate".into(),
            action: ActionId("lacerate"),
            cost: Some(CostConfig::Energy {
                amount: FINISHER_COST,
                refund: 0.0,
            }),
            apply_effects: None,
        },
    );
    let finisher_combo_metrics = world
        .unit_mut(player)
        .metrics
        .new_metrics(ActionId("lacerate"), ResourceKind::ComboPoints);

    // 流血：4 跳、每跳 2s；光环时长盖满全部跳数
    let bleed_aura = world.register_aura(
        target,
        AuraConfig {
            label: "Lacerate (bleed)".into(),
            action: Some(ActionId("lacerate")),
            duration: SimTime::from_secs(8),
            ..AuraConfig::default()
        },
    );
    let bleed = world.register_dot(DotConfig {
        spell: finisher,
        aura: bleed_aura,
        num_ticks: 4,
        tick_period: SimTime::from_secs(2),
        on_tick: Box::new(|sched, world, tick| {
            // 每跳放掉剩余池的等分，刷新时继续蓄而不是重蓄
            let damage = *tick.pool / tick.remaining as f64;
            *tick.pool -= damage;
            let source = world.spell(tick.spell).caster;
            let ev = HitEvent {
                source,
                target: tick.target,
                action: ActionId("lacerate"),
                damage,
                landed: true,
                crit: false,
                periodic: true,
            };
            world.notify_hit(sched, &ev);
        }),
    });
    world.set_spell_effect(
        finisher,
        Box::new(move |sched, world, spell, target| {
            let caster = world.spell(spell).caster;
            let points = world.unit(caster).combo_points();
            world.spend_all_combo_points(caster, finisher_combo_metrics);
            let damage =
                40.0 * points as f64 * world.unit(caster).pseudo.damage_dealt_multiplier;
            world.dot_pool_add(bleed, damage * 1.5);
            if world.dot_is_active(bleed) {
                world.dot_refresh(sched, bleed);
            } else {
                world.dot_apply(sched, bleed);
            }
            let ev = HitEvent {
                source: caster,
                target,
                action: ActionId("lacerate"),
                damage,
                landed: true,
                crit: false,
                periodic: false,
            };
            world.notify_hit(sched, &ev);
        }),
    );

    // 激怒：可叠 3 层，每层 +4% 伤害，按旧层系数除回再乘新层系数
    let frenzy = world.register_aura(
        player,
        AuraConfig {
            label: "Frenzy".into(),
            action: Some(ActionId("frenzy")),
            duration: SimTime::from_secs(12),
            max_stacks: 3,
            hooks: AuraHooks {
                on_stacks_change: Some(Box::new(|_sched, world, h, old, new| {
                    let pseudo = &mut world.unit_mut(h.unit).pseudo;
                    pseudo.damage_dealt_multiplier /= 1.0 + 0.04 * old as f64;
                    pseudo.damage_dealt_multiplier *= 1.0 + 0.04 * new as f64;
                })),
                ..AuraHooks::default()
            },
            ..AuraConfig::default()
        },
    );

    // 触发器：常驻光环，暴击时先查内置冷却再掷随机
    world.register_aura(
        player,
        make_permanent(AuraConfig {
            label: "Frenzy Trigger".into(),
            icd: Some(Cooldown::new(SimTime::from_secs(3))),
            hooks: AuraHooks {
                on_hit_dealt: Some(Box::new(move |sched, world, h, ev| {
                    if !ev.crit || !ev.landed {
                        return;
                    }
                    if !world.aura_icd_ready(h, sched.now()) {
                        return;
                    }
                    if !world.rng.proc(0.5, "Frenzy") {
                        return;
                    }
                    world.aura_icd_use(h, sched.now());
                    if world.aura_is_active(frenzy) {
                        world.aura_refresh(sched, frenzy);
                        world.aura_add_stack(sched, frenzy);
                    } else {
                        world.aura_activate(sched, frenzy);
                    }
                })),
                ..AuraHooks::default()
            },
            ..AuraConfig::default()
        }),
    );

    // 行动决策：连击点攒够就终结，否则起手攒点；一直打到付不起
    // 为止，把能量压回阈值以下，后续回复的跨档才会再拉起决策
    world.set_rotation(
        player,
        Box::new(move |sched, world| {
            loop {
                let (points, energy) = {
                    let u = world.unit(player);
                    (u.combo_points(), u.current_energy())
                };
                let cast_ok = if points >= FINISHER_MIN_POINTS && energy >= FINISHER_COST {
                    world.cast(sched, finisher, target)
                } else if points < FINISHER_MIN_POINTS && energy >= STRIKE_COST {
                    world.cast(sched, strike, target)
                } else {
                    break;
                };
                if !cast_ok {
                    break;
                }
            }
        }),
    );

    Duelist {
        player,
        target,
        strike,
        finisher,
        bleed,
        frenzy,
        strike_combo_metrics,
    }
}

/// 自动攻击摆锤：按固定间隔产生白字命中，喂给触发类光环。
pub struct AutoAttackTask {
    pub unit: UnitId,
    pub target: UnitId,
    pub period: SimTime,
}

impl Task for AutoAttackTask {
    fn run(&mut self, sched: &mut Scheduler, world: &mut dyn World) -> SimTime {
        let w = world
            .as_any_mut()
            .downcast_mut::<CombatWorld>()
            .expect("combat world");
        let crit = w.rng.proc(0.2, "Auto Attack Crit");
        let damage = 90.0
            * w.unit(self.unit).pseudo.damage_dealt_multiplier
            * if crit { 2.0 } else { 1.0 };
        let ev = HitEvent {
            source: self.unit,
            target: self.target,
            action: ActionId("auto_attack"),
            damage,
            landed: true,
            crit,
            periodic: false,
        };
        w.notify_hit(sched, &ev);
        sched.now().offset(self.period)
    }
}

/// 聚合报告：每单位一份资源指标快照。
#[derive(Debug, Serialize)]
pub struct DuelReport {
    pub iterations: u64,
    pub seed: u64,
    pub duration_ms: i64,
    pub units: Vec<UnitReport>,
}

#[derive(Debug, Serialize)]
pub struct UnitReport {
    pub unit: String,
    pub resources: Vec<ResourceMetrics>,
}

/// 按场景配置跑完整的决斗：迭代 i 用种子 seed + i。
pub fn run_duel(spec: &ScenarioSpec) -> DuelReport {
    let mut enc = Encounter::new(SimOptions {
        interactive: spec.interactive,
    });
    let duelist = build_duelist(&mut enc.world);
    enc.world.setup_energy_thresholds(duelist.player, &[FINISHER_COST, STRIKE_COST]);

    let (player, target) = (duelist.player, duelist.target);
    for i in 0..spec.iterations {
        enc.run_iteration(
            spec.seed.wrapping_add(i),
            spec.duration(),
            spec.prepull(),
            |sched, _world| {
                sched.schedule(
                    Box::new(AutoAttackTask {
                        unit: player,
                        target,
                        period: SimTime::from_millis(2_000),
                    }),
                    SimTime::ZERO,
                );
            },
        );
    }

    let units = (0..enc.world.num_units())
        .map(|i| {
            let u = enc.world.unit(UnitId(i));
            UnitReport {
                unit: u.label.clone(),
                resources: u.metrics.snapshot(),
            }
        })
        .collect();

    DuelReport {
        iterations: spec.iterations,
        seed: spec.seed,
        duration_ms: spec.duration_ms,
        units,
    }
}
