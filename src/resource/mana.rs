//! 法力池
//!
//! 精简的法力型资源：只有增减与指标记录，为消耗协议的法力变体
//! 提供落点。没有 tick 回复（当前没有消费者）。

use crate::sim::Scheduler;
use crate::unit::{ACTION_MANA_REFUND, CombatWorld, MetricsId, ResourceKind, UnitId};
use tracing::{trace, warn};

/// 法力池。
pub struct ManaBar {
    max_mana: f64,
    current_mana: f64,
    refund_metrics: MetricsId,
}

impl ManaBar {
    pub fn current(&self) -> f64 {
        self.current_mana
    }

    pub fn max(&self) -> f64 {
        self.max_mana
    }

    pub fn refund_metrics(&self) -> MetricsId {
        self.refund_metrics
    }
}

impl CombatWorld {
    /// 为单位启用法力池（配置期调用一次）。
    pub fn enable_mana_bar(&mut self, unit: UnitId, max_mana: f64) {
        let u = &mut self.units[unit.0];
        let refund_metrics = u.metrics.new_metrics(ACTION_MANA_REFUND, ResourceKind::Mana);
        u.mana = Some(ManaBar {
            max_mana,
            current_mana: max_mana,
            refund_metrics,
        });
    }

    /// 增加法力，上限截断，毛/净分开记。
    pub fn add_mana(&mut self, _sched: &mut Scheduler, unit: UnitId, amount: f64, metrics: MetricsId) {
        if amount < 0.0 {
            panic!("trying to add negative mana: {amount}");
        }
        let u = &mut self.units[unit.0];
        let bar = u.mana.as_mut().expect("mana bar not enabled");
        let new_mana = (bar.current_mana + amount).min(bar.max_mana);
        u.metrics.get_mut(metrics).add_event(amount, new_mana - bar.current_mana);

        trace!(
            unit = %u.label,
            action = %u.metrics.get(metrics).action,
            amount,
            from = bar.current_mana,
            to = new_mana,
            "获得法力"
        );
        bar.current_mana = new_mana;
    }

    /// 花费法力。与能量一致，不在零处截断，透支记诊断日志。
    pub fn spend_mana(&mut self, _sched: &mut Scheduler, unit: UnitId, amount: f64, metrics: MetricsId) {
        if amount < 0.0 {
            panic!("trying to spend negative mana: {amount}");
        }
        let u = &mut self.units[unit.0];
        let bar = u.mana.as_mut().expect("mana bar not enabled");
        let new_mana = bar.current_mana - amount;
        u.metrics.get_mut(metrics).add_event(-amount, -amount);

        trace!(
            unit = %u.label,
            action = %u.metrics.get(metrics).action,
            amount,
            from = bar.current_mana,
            to = new_mana,
            "花费法力"
        );
        if new_mana < 0.0 {
            warn!(unit = %u.label, mana = new_mana, "法力透支为负");
        }
        bar.current_mana = new_mana;
    }

    /// 迭代重置：回满。
    pub(crate) fn reset_mana(&mut self, unit: UnitId) {
        if let Some(bar) = self.units[unit.0].mana.as_mut() {
            bar.current_mana = bar.max_mana;
        }
    }
}
