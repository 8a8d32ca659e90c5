use crate::sim::{Scheduler, SimTime};
use crate::unit::{ActionId, CombatWorld, MetricsId, ResourceKind, SimOptions, UnitId, UnitKind};
use std::cell::Cell;
use std::rc::Rc;

fn setup() -> (Scheduler, CombatWorld, UnitId, MetricsId) {
    let sched = Scheduler::default();
    let mut world = CombatWorld::new(SimOptions::default());
    let unit = world.add_unit("duelist", UnitKind::Player);
    world.enable_energy_bar(unit, 100.0);
    let metrics = world
        .unit_mut(unit)
        .metrics
        .new_metrics(ActionId("test_sink"), ResourceKind::Energy);
    (sched, world, unit, metrics)
}

#[test]
fn spend_records_gross_and_net_equally() {
    let (mut sched, mut world, unit, metrics) = setup();

    world.spend_energy(&mut sched, unit, 40.0, metrics);

    assert_eq!(world.unit(unit).current_energy(), 60.0);
    let m = world.unit(unit).metrics.get(metrics);
    assert_eq!(m.events, 1);
    assert_eq!(m.gross, -40.0);
    assert_eq!(m.net, -40.0);
}

#[test]
fn gain_is_clamped_at_max_and_waste_is_observable() {
    let (mut sched, mut world, unit, metrics) = setup();

    world.spend_energy(&mut sched, unit, 40.0, metrics);
    world.add_energy(&mut sched, unit, 1000.0, metrics);

    assert_eq!(world.unit(unit).current_energy(), 100.0);
    let m = world.unit(unit).metrics.get(metrics);
    assert_eq!(m.gross, -40.0 + 1000.0);
    assert_eq!(m.net, -40.0 + 40.0);
    assert_eq!(m.wasted(), 960.0);
}

#[test]
#[should_panic(expected = "negative energy")]
fn negative_gain_is_a_programming_error() {
    let (mut sched, mut world, unit, metrics) = setup();
    world.add_energy(&mut sched, unit, -1.0, metrics);
}

#[test]
#[should_panic(expected = "negative energy")]
fn negative_spend_is_a_programming_error() {
    let (mut sched, mut world, unit, metrics) = setup();
    world.spend_energy(&mut sched, unit, -1.0, metrics);
}

#[test]
fn spend_does_not_clamp_at_zero() {
    let (mut sched, mut world, unit, metrics) = setup();

    world.spend_energy(&mut sched, unit, 150.0, metrics);

    assert_eq!(world.unit(unit).current_energy(), -50.0);
    // 透支后的增益不会越界崩溃
    world.add_energy(&mut sched, unit, 10.0, metrics);
    assert_eq!(world.unit(unit).current_energy(), -40.0);
}

fn register_energy_spell(world: &mut CombatWorld, unit: UnitId, label: &'static str, cost: f64) {
    use crate::spell::{CostConfig, SpellConfig};
    world.register_spell(
        unit,
        SpellConfig {
            label: label.to_string(),
            action: ActionId(label),
            cost: Some(CostConfig::Energy { amount: cost, refund: 0.0 }),
            apply_effects: None,
        },
    );
}

#[test]
fn threshold_table_from_costs_and_comparisons() {
    let (_sched, mut world, unit, _metrics) = setup();

    register_energy_spell(&mut world, unit, "a", 35.0);
    register_energy_spell(&mut world, unit, "b", 35.0);
    register_energy_spell(&mut world, unit, "c", 50.0);
    register_energy_spell(&mut world, unit, "d", 85.0);
    world.setup_energy_thresholds(unit, &[60.0]);

    let bar = world.unit(unit).energy();
    assert_eq!(bar.decision_thresholds(), &[35, 50, 60, 85]);
    assert_eq!(bar.threshold_count_at(34.0), Some(0));
    assert_eq!(bar.threshold_count_at(35.0), Some(1));
    assert_eq!(bar.threshold_count_at(59.0), Some(2));
    assert_eq!(bar.threshold_count_at(60.0), Some(3));
    assert_eq!(bar.threshold_count_at(85.0), Some(4));
    assert_eq!(bar.threshold_count_at(100.0), Some(4));
}

#[test]
fn threshold_table_is_monotonic_and_totals_at_max() {
    let (_sched, mut world, unit, _metrics) = setup();

    register_energy_spell(&mut world, unit, "a", 35.0);
    register_energy_spell(&mut world, unit, "c", 50.0);
    world.setup_energy_thresholds(unit, &[60.0, 85.0]);

    let bar = world.unit(unit).energy();
    let mut prev = 0;
    for amount in 0..=100 {
        let count = bar.threshold_count_at(amount as f64).expect("table configured");
        assert!(count >= prev, "table must be non-decreasing");
        prev = count;
    }
    assert_eq!(
        bar.threshold_count_at(bar.max()),
        Some(bar.decision_thresholds().len() as i32)
    );
}

#[test]
fn gain_crossing_a_threshold_triggers_the_rotation() {
    let (mut sched, mut world, unit, metrics) = setup();
    register_energy_spell(&mut world, unit, "a", 35.0);
    world.setup_energy_thresholds(unit, &[]);

    let calls = Rc::new(Cell::new(0u32));
    let seen = Rc::clone(&calls);
    world.set_rotation(unit, Box::new(move |_sched, _world| seen.set(seen.get() + 1)));

    world.spend_energy(&mut sched, unit, 80.0, metrics);
    assert_eq!(calls.get(), 0);

    // 20 -> 30：没跨过 35，不触发
    world.add_energy(&mut sched, unit, 10.0, metrics);
    assert_eq!(calls.get(), 0);

    // 30 -> 40：跨过 35，触发一次
    world.add_energy(&mut sched, unit, 10.0, metrics);
    assert_eq!(calls.get(), 1);
}

#[test]
fn without_a_table_every_gain_triggers() {
    let (mut sched, mut world, unit, metrics) = setup();

    let calls = Rc::new(Cell::new(0u32));
    let seen = Rc::clone(&calls);
    world.set_rotation(unit, Box::new(move |_sched, _world| seen.set(seen.get() + 1)));

    world.add_energy(&mut sched, unit, 0.5, metrics);
    assert_eq!(calls.get(), 1);
}

#[test]
fn prepull_gains_do_not_trigger() {
    let (mut sched, mut world, unit, metrics) = setup();
    sched.reset(SimTime::from_millis(-500));

    let calls = Rc::new(Cell::new(0u32));
    let seen = Rc::clone(&calls);
    world.set_rotation(unit, Box::new(move |_sched, _world| seen.set(seen.get() + 1)));

    world.add_energy(&mut sched, unit, 5.0, metrics);
    assert_eq!(calls.get(), 0);
}

#[test]
fn interactive_mode_does_not_trigger() {
    let mut sched = Scheduler::default();
    let mut world = CombatWorld::new(SimOptions { interactive: true });
    let unit = world.add_unit("duelist", UnitKind::Player);
    world.enable_energy_bar(unit, 100.0);
    let metrics = world
        .unit_mut(unit)
        .metrics
        .new_metrics(ActionId("test_sink"), ResourceKind::Energy);

    let calls = Rc::new(Cell::new(0u32));
    let seen = Rc::clone(&calls);
    world.set_rotation(unit, Box::new(move |_sched, _world| seen.set(seen.get() + 1)));

    world.add_energy(&mut sched, unit, 5.0, metrics);
    assert_eq!(calls.get(), 0);
}

#[test]
fn regen_at_full_is_all_waste() {
    let (mut sched, mut world, unit, _metrics) = setup();

    world.enable_energy(&mut sched, unit, SimTime::ZERO);
    sched.run_until(SimTime::from_millis(1000), &mut world);

    assert_eq!(world.unit(unit).current_energy(), 100.0);
    let regen = world.unit(unit).energy().regen_metrics();
    let m = world.unit(unit).metrics.get(regen);
    assert!(m.events >= 9);
    assert_eq!(m.net, 0.0);
    assert_eq!(m.gross, m.events as f64);
}

#[test]
fn regen_accumulates_one_point_per_tick_after_a_drain() {
    let (mut sched, mut world, unit, metrics) = setup();

    world.spend_energy(&mut sched, unit, 100.0, metrics);
    world.enable_energy(&mut sched, unit, SimTime::ZERO);
    sched.run_until(SimTime::from_millis(1000), &mut world);

    assert_eq!(world.unit(unit).current_energy(), 10.0);
}

#[test]
fn multiplier_change_credits_the_partial_tick_at_the_old_rate() {
    let (mut sched, mut world, unit, metrics) = setup();

    world.enable_energy(&mut sched, unit, SimTime::ZERO);
    sched.run_until(SimTime::from_millis(100), &mut world);

    // 停在距上个 tick 60ms 处（下个 tick 前 40ms）
    let next = world.unit(unit).energy().next_tick_at();
    let target = SimTime(next.0 - SimTime::from_millis(40).0);
    sched.run_until(target, &mut world);

    let current = world.unit(unit).current_energy();
    world.spend_energy(&mut sched, unit, current, metrics);

    world.multiply_energy_regen(&mut sched, unit, 2.0);

    // 旧倍率下 60ms 的部分 tick：1.0 × 1.0 × 0.6
    let credited = world.unit(unit).current_energy();
    assert!((credited - 0.6).abs() < 1e-9, "credited = {credited}");
    assert_eq!(
        world.unit(unit).energy().next_tick_at(),
        target.offset(SimTime::from_millis(100))
    );

    // 下一个整 tick 按新倍率
    sched.run_until(target.offset(SimTime::from_millis(100)), &mut world);
    let after_tick = world.unit(unit).current_energy();
    assert!((after_tick - 2.6).abs() < 1e-9, "after_tick = {after_tick}");
}

#[test]
fn haste_rating_scales_the_regen_rate() {
    let (mut sched, mut world, unit, metrics) = setup();

    world.spend_energy(&mut sched, unit, 100.0, metrics);
    // 12800 急速等级 = +100% 回复
    world.unit_mut(unit).stats.haste_rating = 12_800.0;
    world.process_dynamic_haste_change(&mut sched, unit);

    world.enable_energy(&mut sched, unit, SimTime::ZERO);
    sched.run_until(SimTime::from_millis(1000), &mut world);

    assert_eq!(world.unit(unit).current_energy(), 20.0);
}

#[test]
fn update_max_energy_grows_and_shrinks_with_clamped_spend() {
    let (mut sched, mut world, unit, metrics) = setup();

    world.update_max_energy(&mut sched, unit, 20.0, metrics);
    assert_eq!(world.unit(unit).energy().max(), 120.0);
    assert_eq!(world.unit(unit).current_energy(), 120.0);

    world.update_max_energy(&mut sched, unit, -70.0, metrics);
    assert_eq!(world.unit(unit).energy().max(), 50.0);
    assert_eq!(world.unit(unit).current_energy(), 50.0);

    // 负加成最多扣到零，不会透支
    world.spend_energy(&mut sched, unit, 45.0, metrics);
    world.update_max_energy(&mut sched, unit, -20.0, metrics);
    assert_eq!(world.unit(unit).energy().max(), 30.0);
    assert_eq!(world.unit(unit).current_energy(), 0.0);
}

#[test]
fn combo_points_clamp_at_cap_and_log_waste() {
    let (_sched, mut world, unit, _metrics) = setup();
    let combo = world
        .unit_mut(unit)
        .metrics
        .new_metrics(ActionId("builder"), ResourceKind::ComboPoints);

    world.add_combo_points(unit, 3, combo);
    assert_eq!(world.unit(unit).combo_points(), 3);

    world.add_combo_points(unit, 4, combo);
    assert_eq!(world.unit(unit).combo_points(), 5);

    let m = world.unit(unit).metrics.get(combo);
    assert_eq!(m.events, 2);
    assert_eq!(m.gross, 7.0);
    assert_eq!(m.net, 5.0);
}

#[test]
fn spend_all_combo_points_records_the_full_reset() {
    let (_sched, mut world, unit, _metrics) = setup();
    let builder = world
        .unit_mut(unit)
        .metrics
        .new_metrics(ActionId("builder"), ResourceKind::ComboPoints);
    let finisher = world
        .unit_mut(unit)
        .metrics
        .new_metrics(ActionId("finisher"), ResourceKind::ComboPoints);

    world.add_combo_points(unit, 5, builder);
    world.spend_all_combo_points(unit, finisher);

    assert_eq!(world.unit(unit).combo_points(), 0);
    let m = world.unit(unit).metrics.get(finisher);
    assert_eq!(m.events, 1);
    assert_eq!(m.gross, -5.0);
    assert_eq!(m.net, -5.0);
}

#[test]
#[should_panic(expected = "negative combo points")]
fn negative_combo_points_are_a_programming_error() {
    let (_sched, mut world, unit, _metrics) = setup();
    let combo = world
        .unit_mut(unit)
        .metrics
        .new_metrics(ActionId("builder"), ResourceKind::ComboPoints);
    world.add_combo_points(unit, -1, combo);
}

#[test]
fn enable_randomizes_the_first_tick_within_one_period() {
    let (mut sched, mut world, unit, _metrics) = setup();
    world.rng.reseed(1);
    world.enable_energy(&mut sched, unit, SimTime::ZERO);
    let first = world.unit(unit).energy().next_tick_at();
    assert!(first >= SimTime::ZERO && first < SimTime::from_millis(100));

    let (mut sched_b, mut world_b, unit_b, _metrics_b) = setup();
    world_b.rng.reseed(2);
    world_b.enable_energy(&mut sched_b, unit_b, SimTime::ZERO);
    let second = world_b.unit(unit_b).energy().next_tick_at();
    assert!(second >= SimTime::ZERO && second < SimTime::from_millis(100));

    assert_ne!(first, second);
}

#[test]
fn disabled_bar_stops_regenerating() {
    let (mut sched, mut world, unit, metrics) = setup();

    world.spend_energy(&mut sched, unit, 50.0, metrics);
    world.enable_energy(&mut sched, unit, SimTime::ZERO);
    world.disable_energy(&mut sched, unit);
    sched.run_until(SimTime::from_millis(1000), &mut world);

    assert_eq!(world.unit(unit).current_energy(), 50.0);
    assert_eq!(world.unit(unit).energy().next_tick_at(), SimTime::NEVER);
}
