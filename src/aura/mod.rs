//! 光环模块
//!
//! 包含光环生命周期状态机与内置冷却。

// 子模块声明
mod aura;
mod cooldown;

// 重新导出公共接口
pub use aura::{
    AuraConfig, AuraHandle, AuraHook, AuraHooks, AuraId, HitHook, StacksHook, make_permanent,
};
pub use cooldown::Cooldown;

pub(crate) use aura::AuraSet;
