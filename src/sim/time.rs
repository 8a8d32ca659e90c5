//! 仿真时间类型
//!
//! 定义仿真时间及其单位转换。时间为有符号纳秒：负值表示开战前
//! （pre-pull）阶段，`NEVER` 为"永不到期"哨兵值。

/// 仿真时间（纳秒，允许为负）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct SimTime(pub i64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);
    /// 哨兵值：任务/光环"永不到期"。
    pub const NEVER: SimTime = SimTime(i64::MAX);

    pub const fn from_micros(us: i64) -> SimTime {
        SimTime(us.saturating_mul(1_000))
    }
    pub const fn from_millis(ms: i64) -> SimTime {
        SimTime(ms.saturating_mul(1_000_000))
    }
    pub const fn from_secs(s: i64) -> SimTime {
        SimTime(s.saturating_mul(1_000_000_000))
    }

    pub const fn is_never(self) -> bool {
        self.0 == i64::MAX
    }

    /// 时刻加时长；任意一侧为 NEVER 时结果保持 NEVER。
    pub const fn offset(self, d: SimTime) -> SimTime {
        if self.is_never() || d.is_never() {
            SimTime::NEVER
        } else {
            SimTime(self.0.saturating_add(d.0))
        }
    }

    /// 按比例缩放（用于随机首跳偏移、部分 tick 等）。
    pub fn mul_f64(self, scale: f64) -> SimTime {
        SimTime((self.0 as f64 * scale) as i64)
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000_000_000.0
    }
}
