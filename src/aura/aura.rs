//! 光环生命周期
//!
//! 有时限、可叠层的修饰对象。状态机：未激活 → 激活(k 层) → 熄灭；
//! 生命周期钩子由战斗事件与调度器（自然到期）触发。钩子按注册顺序
//! 调用——钩子会改共享乘法状态，顺序影响浮点累计，必须可复现。

use super::cooldown::Cooldown;
use crate::sim::{Scheduler, SimTime};
use crate::unit::{ActionId, CombatWorld, HitEvent, UnitId};
use tracing::trace;

/// 单位内的光环下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuraId(pub usize);

/// 光环句柄：注册后稳定不变，内容层存下来查询/驱动。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuraHandle {
    pub unit: UnitId,
    pub aura: AuraId,
}

pub type AuraHook = Box<dyn FnMut(&mut Scheduler, &mut CombatWorld, AuraHandle)>;
pub type StacksHook = Box<dyn FnMut(&mut Scheduler, &mut CombatWorld, AuraHandle, i32, i32)>;
pub type HitHook = Box<dyn FnMut(&mut Scheduler, &mut CombatWorld, AuraHandle, &HitEvent)>;

/// 生命周期钩子集。全部同步调用；钩子运行期间自身槽位被取空，
/// 递归触发同一事件时会被跳过。
#[derive(Default)]
pub struct AuraHooks {
    /// 每轮迭代开始时触发一次（先于一切战斗事件）。
    pub on_reset: Option<AuraHook>,
    pub on_gain: Option<AuraHook>,
    pub on_expire: Option<AuraHook>,
    /// 每次层数变化恰好调用一次，带旧值与新值。
    pub on_stacks_change: Option<StacksHook>,
    pub on_hit_dealt: Option<HitHook>,
    pub on_hit_taken: Option<HitHook>,
    pub on_periodic_dealt: Option<HitHook>,
}

/// 光环注册配置。
pub struct AuraConfig {
    pub label: String,
    pub action: Option<ActionId>,
    /// 激活后的持续时长；NEVER 表示永不过期。
    pub duration: SimTime,
    /// 0 表示不叠层。
    pub max_stacks: i32,
    pub icd: Option<Cooldown>,
    pub hooks: AuraHooks,
}

impl Default for AuraConfig {
    fn default() -> Self {
        Self {
            label: String::new(),
            action: None,
            duration: SimTime::NEVER,
            max_stacks: 0,
            icd: None,
            hooks: AuraHooks::default(),
        }
    }
}

/// 把配置改造成"常驻"光环：永不过期，且每轮迭代重置时自我激活。
/// 这样一切条件判断都统一成"光环 X 是否激活"。
pub fn make_permanent(mut config: AuraConfig) -> AuraConfig {
    config.duration = SimTime::NEVER;
    config.hooks.on_reset = Some(Box::new(|sched, world, handle| {
        world.aura_activate(sched, handle);
    }));
    config
}

pub(crate) struct Aura {
    pub(crate) label: String,
    #[allow(dead_code)]
    pub(crate) action: Option<ActionId>,
    pub(crate) duration: SimTime,
    pub(crate) max_stacks: i32,
    pub(crate) stacks: i32,
    pub(crate) active: bool,
    pub(crate) expires_at: SimTime,
    pub(crate) icd: Option<Cooldown>,
    pub(crate) hooks: AuraHooks,
}

/// 单位上的光环集。Vec 顺序即注册顺序，也是钩子分发顺序。
#[derive(Default)]
pub(crate) struct AuraSet {
    pub(crate) auras: Vec<Aura>,
}

#[derive(Clone, Copy)]
enum HookSlot {
    Reset,
    Gain,
    Expire,
}

#[derive(Clone, Copy)]
pub(crate) enum HitHookKind {
    Dealt,
    Taken,
    PeriodicDealt,
}

impl CombatWorld {
    /// 注册光环，返回稳定句柄。层数为 0 的已注册光环视为未激活。
    pub fn register_aura(&mut self, unit: UnitId, config: AuraConfig) -> AuraHandle {
        let set = &mut self.units[unit.0].auras;
        let id = AuraId(set.auras.len());
        set.auras.push(Aura {
            label: config.label,
            action: config.action,
            duration: config.duration,
            max_stacks: config.max_stacks,
            stacks: 0,
            active: false,
            expires_at: SimTime::NEVER,
            icd: config.icd,
            hooks: config.hooks,
        });
        AuraHandle { unit, aura: id }
    }

    fn aura(&self, h: AuraHandle) -> &Aura {
        &self.units[h.unit.0].auras.auras[h.aura.0]
    }

    fn aura_mut(&mut self, h: AuraHandle) -> &mut Aura {
        &mut self.units[h.unit.0].auras.auras[h.aura.0]
    }

    pub fn aura_is_active(&self, h: AuraHandle) -> bool {
        self.aura(h).active
    }

    pub fn aura_stacks(&self, h: AuraHandle) -> i32 {
        self.aura(h).stacks
    }

    pub fn aura_expires_at(&self, h: AuraHandle) -> SimTime {
        self.aura(h).expires_at
    }

    /// 查询内置冷却。没有 Icd 的光环恒为就绪。
    pub fn aura_icd_ready(&self, h: AuraHandle, now: SimTime) -> bool {
        self.aura(h).icd.as_ref().is_none_or(|cd| cd.is_ready(now))
    }

    pub fn aura_icd_use(&mut self, h: AuraHandle, now: SimTime) {
        if let Some(cd) = self.aura_mut(h).icd.as_mut() {
            cd.record_use(now);
        }
    }

    /// 激活：未激活 → 激活，1 层起步；已激活则等价于刷新。
    pub fn aura_activate(&mut self, sched: &mut Scheduler, h: AuraHandle) {
        let now = sched.now();
        {
            let aura = self.aura_mut(h);
            if aura.active {
                aura.expires_at = now.offset(aura.duration);
                self.reschedule_aura_expiry(sched, h.unit);
                return;
            }
            aura.active = true;
            aura.expires_at = now.offset(aura.duration);
            trace!(unit = h.unit.0, aura = %aura.label, expires = ?aura.expires_at, "光环激活");
        }
        self.reschedule_aura_expiry(sched, h.unit);
        self.fire_aura_hook(sched, h, HookSlot::Gain);
        if self.aura(h).max_stacks > 0 {
            self.aura_set_stacks(sched, h, 1);
        }
    }

    /// 熄灭：层数清零（触发层数钩子）、标记未激活、触发 on_expire。
    /// 自然到期与主动熄灭走同一条路。
    pub fn aura_deactivate(&mut self, sched: &mut Scheduler, h: AuraHandle) {
        if !self.aura(h).active {
            return;
        }
        if self.aura(h).stacks != 0 {
            self.aura_set_stacks(sched, h, 0);
        }
        {
            let aura = self.aura_mut(h);
            aura.active = false;
            aura.expires_at = SimTime::NEVER;
            trace!(unit = h.unit.0, aura = %aura.label, "光环熄灭");
        }
        self.fire_aura_hook(sched, h, HookSlot::Expire);
        // 到期是周期效果蓄池唯一的清零点
        self.reset_dots_for_aura(sched, h);
        self.reschedule_aura_expiry(sched, h.unit);
    }

    /// 刷新：只重置到期时刻，层数不变。对未激活光环调用是编程错误。
    pub fn aura_refresh(&mut self, sched: &mut Scheduler, h: AuraHandle) {
        let now = sched.now();
        let aura = self.aura_mut(h);
        if !aura.active {
            panic!("refreshing inactive aura: {}", aura.label);
        }
        aura.expires_at = now.offset(aura.duration);
        self.reschedule_aura_expiry(sched, h.unit);
    }

    /// 设定层数，截断到 [0, max_stacks]。有实际变化时恰好触发一次
    /// 层数钩子（带旧/新值），整批设层也只调一次。
    pub fn aura_set_stacks(&mut self, sched: &mut Scheduler, h: AuraHandle, stacks: i32) {
        let (old, new) = {
            let aura = self.aura_mut(h);
            let old = aura.stacks;
            let new = stacks.clamp(0, aura.max_stacks.max(0));
            if new == old {
                return;
            }
            aura.stacks = new;
            trace!(unit = h.unit.0, aura = %aura.label, old, new, "光环层数变化");
            (old, new)
        };
        self.fire_stacks_hook(sched, h, old, new);
    }

    /// 加一层（封顶不变不触发钩子）。对未激活光环调用是编程错误。
    pub fn aura_add_stack(&mut self, sched: &mut Scheduler, h: AuraHandle) {
        let aura = self.aura(h);
        if !aura.active {
            panic!("adding a stack to inactive aura: {}", aura.label);
        }
        let old = aura.stacks;
        self.aura_set_stacks(sched, h, old + 1);
    }

    /// 减一层；减到 0 时按自然到期处理（同样的钩子序列）。
    pub fn aura_remove_stack(&mut self, sched: &mut Scheduler, h: AuraHandle) {
        let old = self.aura(h).stacks;
        if old <= 0 {
            panic!("removing a stack from aura without stacks: {}", self.aura(h).label);
        }
        if old == 1 {
            self.aura_deactivate(sched, h);
        } else {
            self.aura_set_stacks(sched, h, old - 1);
        }
    }

    fn next_aura_expiry(&self, unit: UnitId) -> SimTime {
        self.units[unit.0]
            .auras
            .auras
            .iter()
            .filter(|a| a.active)
            .map(|a| a.expires_at)
            .min()
            .unwrap_or(SimTime::NEVER)
    }

    fn reschedule_aura_expiry(&mut self, sched: &mut Scheduler, unit: UnitId) {
        if let Some(task) = self.units[unit.0].aura_task {
            sched.reschedule_task(task, self.next_aura_expiry(unit));
        }
    }

    /// 过期任务主体：熄灭所有到期光环，返回下一个最早到期时刻。
    /// 每轮重新扫描——到期钩子可能级联点亮/熄灭别的光环。
    pub(crate) fn expire_due_auras(&mut self, sched: &mut Scheduler, unit: UnitId) -> SimTime {
        let now = sched.now();
        loop {
            let due = self.units[unit.0]
                .auras
                .auras
                .iter()
                .position(|a| a.active && a.expires_at <= now);
            match due {
                Some(i) => self.aura_deactivate(sched, AuraHandle { unit, aura: AuraId(i) }),
                None => break,
            }
        }
        self.next_aura_expiry(unit)
    }

    /// 迭代重置：全部未激活、零层、Icd 就绪。
    pub(crate) fn reset_auras_state(&mut self, unit: UnitId) {
        for aura in &mut self.units[unit.0].auras.auras {
            aura.active = false;
            aura.stacks = 0;
            aura.expires_at = SimTime::NEVER;
            if let Some(cd) = aura.icd.as_mut() {
                cd.reset();
            }
        }
    }

    /// 按注册顺序触发 on_reset 钩子（常驻光环借此自我激活）。
    pub(crate) fn fire_reset_hooks(&mut self, sched: &mut Scheduler, unit: UnitId) {
        for i in 0..self.units[unit.0].auras.auras.len() {
            self.fire_aura_hook(sched, AuraHandle { unit, aura: AuraId(i) }, HookSlot::Reset);
        }
    }

    fn hook_slot(&mut self, h: AuraHandle, slot: HookSlot) -> &mut Option<AuraHook> {
        let hooks = &mut self.aura_mut(h).hooks;
        match slot {
            HookSlot::Reset => &mut hooks.on_reset,
            HookSlot::Gain => &mut hooks.on_gain,
            HookSlot::Expire => &mut hooks.on_expire,
        }
    }

    fn fire_aura_hook(&mut self, sched: &mut Scheduler, h: AuraHandle, slot: HookSlot) {
        let Some(mut hook) = self.hook_slot(h, slot).take() else {
            return;
        };
        hook(sched, self, h);
        let slot = self.hook_slot(h, slot);
        if slot.is_none() {
            *slot = Some(hook);
        }
    }

    fn fire_stacks_hook(&mut self, sched: &mut Scheduler, h: AuraHandle, old: i32, new: i32) {
        let Some(mut hook) = self.aura_mut(h).hooks.on_stacks_change.take() else {
            return;
        };
        hook(sched, self, h, old, new);
        let slot = &mut self.aura_mut(h).hooks.on_stacks_change;
        if slot.is_none() {
            *slot = Some(hook);
        }
    }

    fn hit_hook_slot(&mut self, unit: UnitId, i: usize, kind: HitHookKind) -> &mut Option<HitHook> {
        let hooks = &mut self.units[unit.0].auras.auras[i].hooks;
        match kind {
            HitHookKind::Dealt => &mut hooks.on_hit_dealt,
            HitHookKind::Taken => &mut hooks.on_hit_taken,
            HitHookKind::PeriodicDealt => &mut hooks.on_periodic_dealt,
        }
    }

    /// 把一次命中分发给某单位所有激活光环的对应钩子，按注册顺序。
    fn dispatch_hit_hooks(&mut self, sched: &mut Scheduler, unit: UnitId, ev: &HitEvent, kind: HitHookKind) {
        for i in 0..self.units[unit.0].auras.auras.len() {
            if !self.units[unit.0].auras.auras[i].active {
                continue;
            }
            let Some(mut hook) = self.hit_hook_slot(unit, i, kind).take() else {
                continue;
            };
            hook(sched, self, AuraHandle { unit, aura: AuraId(i) }, ev);
            let slot = self.hit_hook_slot(unit, i, kind);
            if slot.is_none() {
                *slot = Some(hook);
            }
        }
    }

    pub(crate) fn dispatch_hit_dealt(&mut self, sched: &mut Scheduler, unit: UnitId, ev: &HitEvent) {
        self.dispatch_hit_hooks(sched, unit, ev, HitHookKind::Dealt);
    }

    pub(crate) fn dispatch_hit_taken(&mut self, sched: &mut Scheduler, unit: UnitId, ev: &HitEvent) {
        self.dispatch_hit_hooks(sched, unit, ev, HitHookKind::Taken);
    }

    pub(crate) fn dispatch_periodic_dealt(&mut self, sched: &mut Scheduler, unit: UnitId, ev: &HitEvent) {
        self.dispatch_hit_hooks(sched, unit, ev, HitHookKind::PeriodicDealt);
    }
}
