//! 战斗单位
//!
//! 单位持有自己的资源条、光环集与行动决策回调。

use super::metrics::MetricsStore;
use super::stats::{PseudoStats, Stats};
use super::world::CombatWorld;
use crate::aura::AuraSet;
use crate::resource::{EnergyBar, ManaBar};
use crate::sim::{Scheduler, TaskId};

/// 单位标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnitId(pub usize);

/// 单位类别。Pet 在迭代重置时不自动启用资源 tick（召唤时显式启用）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Player,
    Pet,
    Target,
}

/// 行动决策回调：资源增益跨过决策阈值时由核心拉起。不得阻塞。
pub type RotationFn = Box<dyn FnMut(&mut Scheduler, &mut CombatWorld)>;

/// 战斗单位
pub struct Unit {
    pub id: UnitId,
    pub label: String,
    pub kind: UnitKind,
    pub stats: Stats,
    pub pseudo: PseudoStats,
    pub metrics: MetricsStore,
    pub(crate) energy: Option<EnergyBar>,
    pub(crate) mana: Option<ManaBar>,
    pub(crate) auras: AuraSet,
    pub(crate) rotation: Option<RotationFn>,
    pub(crate) aura_task: Option<TaskId>,
}

impl Unit {
    pub(crate) fn new(id: UnitId, label: String, kind: UnitKind) -> Self {
        Self {
            id,
            label,
            kind,
            stats: Stats::default(),
            pseudo: PseudoStats::default(),
            metrics: MetricsStore::default(),
            energy: None,
            mana: None,
            auras: AuraSet::default(),
            rotation: None,
            aura_task: None,
        }
    }

    pub fn has_energy_bar(&self) -> bool {
        self.energy.is_some()
    }

    pub fn energy(&self) -> &EnergyBar {
        self.energy.as_ref().expect("energy bar not enabled")
    }

    pub fn current_energy(&self) -> f64 {
        self.energy().current()
    }

    pub fn combo_points(&self) -> i32 {
        self.energy().combo_points()
    }

    pub fn has_mana_bar(&self) -> bool {
        self.mana.is_some()
    }

    pub fn mana(&self) -> &ManaBar {
        self.mana.as_ref().expect("mana bar not enabled")
    }

    pub fn current_mana(&self) -> f64 {
        self.mana().current()
    }
}
