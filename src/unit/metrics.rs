//! 资源指标
//!
//! 每个（技能 × 资源种类）一个指标槽，区分毛变化量与净（截断后）
//! 变化量，截断造成的浪费由两者之差观察。

use serde::Serialize;
use std::fmt;

/// 行为标识：把资源变动归因到具体技能或来源。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ActionId(pub &'static str);

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// 内建来源：能量回复 tick 与能量返还。
pub const ACTION_ENERGY_REGEN: ActionId = ActionId("energy_regen");
pub const ACTION_ENERGY_REFUND: ActionId = ActionId("energy_refund");
pub const ACTION_MANA_REFUND: ActionId = ActionId("mana_refund");

/// 资源种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Energy,
    ComboPoints,
    Mana,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Energy => f.write_str("energy"),
            ResourceKind::ComboPoints => f.write_str("combo_points"),
            ResourceKind::Mana => f.write_str("mana"),
        }
    }
}

/// 指标槽标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetricsId(pub usize);

/// 单个指标槽：事件数、毛变化量、净变化量。
#[derive(Debug, Clone, Serialize)]
pub struct ResourceMetrics {
    pub action: ActionId,
    pub kind: ResourceKind,
    pub events: u64,
    pub gross: f64,
    pub net: f64,
}

impl ResourceMetrics {
    /// 记录一次变动。净效果为零也要记，浪费才可观察。
    pub(crate) fn add_event(&mut self, gross: f64, net: f64) {
        self.events += 1;
        self.gross += gross;
        self.net += net;
    }

    /// 因截断而损失的量（只对增益有意义）。
    pub fn wasted(&self) -> f64 {
        (self.gross - self.net).max(0.0)
    }
}

/// 单位上的指标表。注册顺序即报告顺序。
#[derive(Debug, Default)]
pub struct MetricsStore {
    entries: Vec<ResourceMetrics>,
}

impl MetricsStore {
    /// 指标工厂：为某个来源开一个指标槽。
    pub fn new_metrics(&mut self, action: ActionId, kind: ResourceKind) -> MetricsId {
        let id = MetricsId(self.entries.len());
        self.entries.push(ResourceMetrics {
            action,
            kind,
            events: 0,
            gross: 0.0,
            net: 0.0,
        });
        id
    }

    pub fn get(&self, id: MetricsId) -> &ResourceMetrics {
        &self.entries[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: MetricsId) -> &mut ResourceMetrics {
        &mut self.entries[id.0]
    }

    pub fn snapshot(&self) -> Vec<ResourceMetrics> {
        self.entries.clone()
    }
}
