use crate::aura::{AuraConfig, AuraHooks, Cooldown, make_permanent};
use crate::sim::{Scheduler, SimTime};
use crate::unit::{ActionId, CombatWorld, HitEvent, SimOptions, UnitId, UnitKind};
use std::cell::RefCell;
use std::rc::Rc;

type EventLog = Rc<RefCell<Vec<String>>>;

fn setup() -> (Scheduler, CombatWorld, UnitId) {
    let sched = Scheduler::default();
    let mut world = CombatWorld::new(SimOptions::default());
    let unit = world.add_unit("duelist", UnitKind::Player);
    (sched, world, unit)
}

fn logging_config(label: &str, duration: SimTime, max_stacks: i32, log: &EventLog) -> AuraConfig {
    let on_gain = Rc::clone(log);
    let on_expire = Rc::clone(log);
    let on_stacks = Rc::clone(log);
    AuraConfig {
        label: label.to_string(),
        duration,
        max_stacks,
        hooks: AuraHooks {
            on_gain: Some(Box::new(move |_s, _w, _h| on_gain.borrow_mut().push("gain".into()))),
            on_expire: Some(Box::new(move |_s, _w, _h| {
                on_expire.borrow_mut().push("expire".into())
            })),
            on_stacks_change: Some(Box::new(move |_s, _w, _h, old, new| {
                on_stacks.borrow_mut().push(format!("stacks {old}->{new}"))
            })),
            ..AuraHooks::default()
        },
        ..AuraConfig::default()
    }
}

#[test]
fn activate_fires_gain_then_first_stack() {
    let (mut sched, mut world, unit) = setup();
    let log: EventLog = Rc::default();
    let aura = world.register_aura(unit, logging_config("buff", SimTime::from_secs(10), 5, &log));
    world.reset(&mut sched, 1);

    world.aura_activate(&mut sched, aura);

    assert!(world.aura_is_active(aura));
    assert_eq!(world.aura_stacks(aura), 1);
    assert_eq!(&*log.borrow(), &["gain", "stacks 0->1"]);
}

#[test]
fn natural_expiration_fires_stack_reset_then_expire() {
    let (mut sched, mut world, unit) = setup();
    let log: EventLog = Rc::default();
    let aura = world.register_aura(unit, logging_config("buff", SimTime::from_secs(10), 5, &log));
    world.reset(&mut sched, 1);

    world.aura_activate(&mut sched, aura);
    sched.run_until(SimTime::from_secs(10), &mut world);

    assert!(!world.aura_is_active(aura));
    assert_eq!(world.aura_stacks(aura), 0);
    assert_eq!(&*log.borrow(), &["gain", "stacks 0->1", "stacks 1->0", "expire"]);
}

#[test]
fn bulk_set_stacks_fires_exactly_one_change() {
    let (mut sched, mut world, unit) = setup();
    let log: EventLog = Rc::default();
    let aura = world.register_aura(unit, logging_config("buff", SimTime::from_secs(10), 5, &log));
    world.reset(&mut sched, 1);

    world.aura_activate(&mut sched, aura);
    world.aura_set_stacks(&mut sched, aura, 3);
    world.aura_set_stacks(&mut sched, aura, 5);

    assert_eq!(
        &*log.borrow(),
        &["gain", "stacks 0->1", "stacks 1->3", "stacks 3->5"]
    );
}

#[test]
fn stacks_are_clamped_to_bounds() {
    let (mut sched, mut world, unit) = setup();
    let log: EventLog = Rc::default();
    let aura = world.register_aura(unit, logging_config("buff", SimTime::from_secs(10), 5, &log));
    world.reset(&mut sched, 1);

    world.aura_activate(&mut sched, aura);
    world.aura_set_stacks(&mut sched, aura, 99);
    assert_eq!(world.aura_stacks(aura), 5);

    // 相同层数不再触发钩子
    world.aura_set_stacks(&mut sched, aura, 5);
    assert_eq!(&*log.borrow(), &["gain", "stacks 0->1", "stacks 1->5"]);
}

#[test]
fn add_stack_at_cap_changes_nothing() {
    let (mut sched, mut world, unit) = setup();
    let log: EventLog = Rc::default();
    let aura = world.register_aura(unit, logging_config("buff", SimTime::from_secs(10), 2, &log));
    world.reset(&mut sched, 1);

    world.aura_activate(&mut sched, aura);
    world.aura_add_stack(&mut sched, aura);
    world.aura_add_stack(&mut sched, aura);

    assert_eq!(world.aura_stacks(aura), 2);
    assert_eq!(&*log.borrow(), &["gain", "stacks 0->1", "stacks 1->2"]);
}

#[test]
fn remove_stack_reaching_zero_expires_like_natural_expiry() {
    let (mut sched, mut world, unit) = setup();
    let log: EventLog = Rc::default();
    let aura = world.register_aura(unit, logging_config("buff", SimTime::from_secs(10), 5, &log));
    world.reset(&mut sched, 1);

    world.aura_activate(&mut sched, aura);
    world.aura_set_stacks(&mut sched, aura, 2);
    world.aura_remove_stack(&mut sched, aura);
    assert!(world.aura_is_active(aura));

    world.aura_remove_stack(&mut sched, aura);
    assert!(!world.aura_is_active(aura));
    assert_eq!(
        &*log.borrow(),
        &[
            "gain",
            "stacks 0->1",
            "stacks 1->2",
            "stacks 2->1",
            "stacks 1->0",
            "expire"
        ]
    );
}

#[test]
fn refresh_extends_without_touching_stacks() {
    let (mut sched, mut world, unit) = setup();
    let log: EventLog = Rc::default();
    let aura = world.register_aura(unit, logging_config("buff", SimTime::from_secs(10), 5, &log));
    world.reset(&mut sched, 1);

    world.aura_activate(&mut sched, aura);
    world.aura_set_stacks(&mut sched, aura, 3);

    sched.run_until(SimTime::from_secs(5), &mut world);
    world.aura_refresh(&mut sched, aura);
    assert_eq!(world.aura_expires_at(aura), SimTime::from_secs(15));

    sched.run_until(SimTime::from_secs(12), &mut world);
    assert!(world.aura_is_active(aura));
    assert_eq!(world.aura_stacks(aura), 3);

    sched.run_until(SimTime::from_secs(15), &mut world);
    assert!(!world.aura_is_active(aura));
}

#[test]
fn activate_while_active_refreshes_without_a_second_gain() {
    let (mut sched, mut world, unit) = setup();
    let log: EventLog = Rc::default();
    let aura = world.register_aura(unit, logging_config("buff", SimTime::from_secs(10), 0, &log));
    world.reset(&mut sched, 1);

    world.aura_activate(&mut sched, aura);
    sched.run_until(SimTime::from_secs(4), &mut world);
    world.aura_activate(&mut sched, aura);

    assert_eq!(world.aura_expires_at(aura), SimTime::from_secs(14));
    assert_eq!(&*log.borrow(), &["gain"]);
}

#[test]
fn hit_hooks_fire_in_registration_order() {
    let (mut sched, mut world, unit) = setup();
    let target = world.add_unit("dummy", UnitKind::Target);
    let log: EventLog = Rc::default();

    for name in ["first", "second"] {
        let seen = Rc::clone(&log);
        world.register_aura(
            unit,
            make_permanent(AuraConfig {
                label: name.to_string(),
                hooks: AuraHooks {
                    on_hit_dealt: Some(Box::new(move |_s, _w, _h, _ev| {
                        seen.borrow_mut().push(name.to_string())
                    })),
                    ..AuraHooks::default()
                },
                ..AuraConfig::default()
            }),
        );
    }
    world.reset(&mut sched, 1);

    let ev = HitEvent {
        source: unit,
        target,
        action: ActionId("swing"),
        damage: 10.0,
        landed: true,
        crit: false,
        periodic: false,
    };
    world.notify_hit(&mut sched, &ev);

    assert_eq!(&*log.borrow(), &["first", "second"]);
}

#[test]
fn taken_hooks_fire_on_the_victim() {
    let (mut sched, mut world, unit) = setup();
    let target = world.add_unit("dummy", UnitKind::Target);
    let log: EventLog = Rc::default();
    let seen = Rc::clone(&log);
    world.register_aura(
        target,
        make_permanent(AuraConfig {
            label: "thorns".to_string(),
            hooks: AuraHooks {
                on_hit_taken: Some(Box::new(move |_s, _w, _h, _ev| {
                    seen.borrow_mut().push("taken".into())
                })),
                ..AuraHooks::default()
            },
            ..AuraConfig::default()
        }),
    );
    world.reset(&mut sched, 1);

    let ev = HitEvent {
        source: unit,
        target,
        action: ActionId("swing"),
        damage: 10.0,
        landed: true,
        crit: false,
        periodic: false,
    };
    world.notify_hit(&mut sched, &ev);

    assert_eq!(&*log.borrow(), &["taken"]);
}

#[test]
fn periodic_damage_routes_to_the_periodic_hook_only() {
    let (mut sched, mut world, unit) = setup();
    let target = world.add_unit("dummy", UnitKind::Target);
    let log: EventLog = Rc::default();
    let on_dealt = Rc::clone(&log);
    let on_periodic = Rc::clone(&log);
    world.register_aura(
        unit,
        make_permanent(AuraConfig {
            label: "watcher".to_string(),
            hooks: AuraHooks {
                on_hit_dealt: Some(Box::new(move |_s, _w, _h, _ev| {
                    on_dealt.borrow_mut().push("dealt".into())
                })),
                on_periodic_dealt: Some(Box::new(move |_s, _w, _h, _ev| {
                    on_periodic.borrow_mut().push("periodic".into())
                })),
                ..AuraHooks::default()
            },
            ..AuraConfig::default()
        }),
    );
    world.reset(&mut sched, 1);

    let ev = HitEvent {
        source: unit,
        target,
        action: ActionId("bleed"),
        damage: 10.0,
        landed: true,
        crit: false,
        periodic: true,
    };
    world.notify_hit(&mut sched, &ev);

    assert_eq!(&*log.borrow(), &["periodic"]);
}

#[test]
fn inactive_auras_do_not_receive_hooks() {
    let (mut sched, mut world, unit) = setup();
    let target = world.add_unit("dummy", UnitKind::Target);
    let log: EventLog = Rc::default();
    let seen = Rc::clone(&log);
    // 未激活的注册光环（层数 0）收不到事件
    world.register_aura(
        unit,
        AuraConfig {
            label: "sleeping".to_string(),
            hooks: AuraHooks {
                on_hit_dealt: Some(Box::new(move |_s, _w, _h, _ev| {
                    seen.borrow_mut().push("dealt".into())
                })),
                ..AuraHooks::default()
            },
            ..AuraConfig::default()
        },
    );
    world.reset(&mut sched, 1);

    let ev = HitEvent {
        source: unit,
        target,
        action: ActionId("swing"),
        damage: 10.0,
        landed: true,
        crit: false,
        periodic: false,
    };
    world.notify_hit(&mut sched, &ev);

    assert!(log.borrow().is_empty());
}

#[test]
fn permanent_aura_reactivates_every_iteration() {
    let (mut sched, mut world, unit) = setup();
    let aura = world.register_aura(
        unit,
        make_permanent(AuraConfig {
            label: "always on".to_string(),
            ..AuraConfig::default()
        }),
    );

    world.reset(&mut sched, 1);
    assert!(world.aura_is_active(aura));

    sched.reset(SimTime::ZERO);
    world.reset(&mut sched, 2);
    assert!(world.aura_is_active(aura));
}

#[test]
fn icd_gates_until_its_duration_elapses() {
    let cd = Cooldown::new(SimTime::from_secs(5));
    assert!(cd.is_ready(SimTime::ZERO));
    assert!(cd.is_ready(SimTime::from_millis(-2000)));

    let mut cd = cd;
    cd.record_use(SimTime::ZERO);
    assert!(!cd.is_ready(SimTime::from_secs(3)));
    assert!(cd.is_ready(SimTime::from_secs(5)));

    cd.reset();
    assert!(cd.is_ready(SimTime::ZERO));
}

#[test]
fn aura_icd_is_consulted_before_any_random_draw() {
    let (mut sched, mut world, unit) = setup();
    let target = world.add_unit("dummy", UnitKind::Target);
    let draws_seen: Rc<RefCell<Vec<u64>>> = Rc::default();
    let seen = Rc::clone(&draws_seen);
    world.register_aura(
        unit,
        make_permanent(AuraConfig {
            label: "trigger".to_string(),
            icd: Some(Cooldown::new(SimTime::from_secs(100))),
            hooks: AuraHooks {
                on_hit_dealt: Some(Box::new(move |sched, world, h, _ev| {
                    // 闸门关着就不许花随机数，保证抽取序列对齐
                    if !world.aura_icd_ready(h, sched.now()) {
                        return;
                    }
                    world.aura_icd_use(h, sched.now());
                    world.rng.proc(0.5, "gated proc");
                    seen.borrow_mut().push(world.rng.draws());
                })),
                ..AuraHooks::default()
            },
            ..AuraConfig::default()
        }),
    );
    world.reset(&mut sched, 1);

    let ev = HitEvent {
        source: unit,
        target,
        action: ActionId("swing"),
        damage: 10.0,
        landed: true,
        crit: true,
        periodic: false,
    };
    let draws_before = world.rng.draws();
    world.notify_hit(&mut sched, &ev);
    world.notify_hit(&mut sched, &ev);
    world.notify_hit(&mut sched, &ev);

    // 只有第一次命中通过闸门，后两次没有消耗任何抽取
    assert_eq!(draws_seen.borrow().len(), 1);
    assert_eq!(world.rng.draws(), draws_before + 1);
}
