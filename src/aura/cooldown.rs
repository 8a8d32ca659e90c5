//! 冷却计时
//!
//! 触发类效果的内置冷却（Icd）：限制触发频率的闸门，独立于任何
//! 光环的持续时间。概率触发必须先查闸门再掷随机，保证不同配置下
//! 抽取序列对齐。

use crate::sim::SimTime;

/// 冷却：时长 + 就绪时刻。
#[derive(Debug, Clone, Copy)]
pub struct Cooldown {
    pub duration: SimTime,
    ready_at: SimTime,
}

impl Cooldown {
    pub fn new(duration: SimTime) -> Self {
        Self {
            duration,
            ready_at: SimTime(i64::MIN),
        }
    }

    pub fn is_ready(&self, now: SimTime) -> bool {
        now >= self.ready_at
    }

    /// 记录一次使用，闸门关闭一个时长。
    pub fn record_use(&mut self, now: SimTime) {
        self.ready_at = now.offset(self.duration);
    }

    /// 迭代重置：立即就绪。
    pub fn reset(&mut self) {
        self.ready_at = SimTime(i64::MIN);
    }
}
