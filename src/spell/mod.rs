//! 技能模块
//!
//! 包含技能、消耗协议与周期效果驱动。

// 子模块声明
mod cost;
mod dot;
mod spell;

// 重新导出公共接口
pub use cost::{ComboPointCost, EnergyCost, ManaCost, SpellCost};
pub use dot::{DotConfig, DotHandle, DotTick, DotTickFn};
pub use spell::{CostConfig, Spell, SpellConfig, SpellEffectFn, SpellHandle};

pub(crate) use dot::Dot;
