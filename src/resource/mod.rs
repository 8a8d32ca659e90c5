//! 资源条模块
//!
//! 包含能量条（含连击点与决策阈值表）与精简法力池。

// 子模块声明
mod energy;
mod mana;

// 重新导出公共接口
pub use energy::{ENERGY_PER_TICK, ENERGY_TICK_PERIOD, EnergyBar, MAX_COMBO_POINTS};
pub use mana::ManaBar;
