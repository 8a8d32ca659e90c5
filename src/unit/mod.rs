//! 战斗单位模块
//!
//! 包含单位、战斗世界、遭遇战驱动与资源指标。

// 子模块声明
mod encounter;
mod metrics;
mod stats;
mod unit;
mod world;

// 重新导出公共接口
pub use encounter::Encounter;
pub use metrics::{
    ACTION_ENERGY_REFUND, ACTION_ENERGY_REGEN, ACTION_MANA_REFUND, ActionId, MetricsId,
    MetricsStore, ResourceKind, ResourceMetrics,
};
pub use stats::{HASTE_RATING_PER_PERCENT, PseudoStats, Stats};
pub use unit::{RotationFn, Unit, UnitId, UnitKind};
pub use world::{CombatWorld, HitEvent, SimOptions};
