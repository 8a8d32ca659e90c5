//! 具名随机流
//!
//! 每轮迭代用种子重建一次的确定性随机源。所有概率判定按固定顺序
//! 从同一条流上顺序抽取；标签只是诊断元数据，不切分独立子流。

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::trace;

/// 确定性随机流。同一种子 + 同一抽取顺序 ⇒ 逐位一致的结果序列。
pub struct StreamRng {
    rng: ChaCha8Rng,
    seed: u64,
    draws: u64,
}

impl StreamRng {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
            draws: 0,
        }
    }

    /// 重播新一轮迭代：整条流从头开始。
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self.seed = seed;
        self.draws = 0;
    }

    /// 抽取 [0, 1) 均匀浮点。`label` 标注调用点，便于重放排查。
    pub fn next_float(&mut self, label: &str) -> f64 {
        let value: f64 = self.rng.gen_range(0.0..1.0);
        trace!(label, seed = self.seed, draw = self.draws, value, "随机抽取");
        self.draws = self.draws.wrapping_add(1);
        value
    }

    /// 概率判定：抽一次并与 `chance` 比较。
    pub fn proc(&mut self, chance: f64, label: &str) -> bool {
        self.next_float(label) < chance
    }

    /// [min, max) 区间均匀抽取。
    pub fn roll(&mut self, min: f64, max: f64, label: &str) -> f64 {
        min + (max - min) * self.next_float(label)
    }

    /// 本轮迭代已抽取的次数。
    pub fn draws(&self) -> u64 {
        self.draws
    }
}
