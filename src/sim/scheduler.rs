//! 任务调度器
//!
//! 维护当前仿真时间与任务队列。任务是常驻的：每次运行后返回下一次
//! 到期时间并被重新入队；返回 NEVER 的任务留在登记表里但不再被选中。

use super::pending::PendingTask;
use super::task::{Task, TaskId};
use super::time::SimTime;
use super::world::World;
use std::collections::BinaryHeap;
use tracing::{debug, trace};

/// 同刻平局优先级：数值小者先跑。到期清理类任务（光环过期）排在
/// 常规任务之后，保证与到期时刻重合的最后一跳先结算。
pub const PRIORITY_NORMAL: i8 = 0;
pub const PRIORITY_CLEANUP: i8 = 1;

struct Slot {
    task: Option<Box<dyn Task>>,
    due: SimTime,
    generation: u64,
    order: u64,
    priority: i8,
}

/// 任务调度器：维护当前时间、任务登记表与到期队列。
#[derive(Default)]
pub struct Scheduler {
    now: SimTime,
    next_order: u64,
    slots: Vec<Option<Slot>>,
    q: BinaryHeap<PendingTask>,
}

impl Scheduler {
    /// 获取当前仿真时间
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// 清空所有任务并把时钟拨到 `start`（每轮迭代开始时调用）。
    /// 旧的 `TaskId` 随之全部失效。
    pub fn reset(&mut self, start: SimTime) {
        self.now = start;
        self.next_order = 0;
        self.slots.clear();
        self.q.clear();
    }

    /// 登记任务。初始为停摆状态（到期时间 NEVER），需再调用
    /// [`Scheduler::reschedule_task`] 或用 [`Scheduler::schedule`] 一步完成。
    pub fn add_task(&mut self, task: Box<dyn Task>) -> TaskId {
        self.add_task_with_priority(task, PRIORITY_NORMAL)
    }

    /// 登记任务并指定同刻平局优先级。
    pub fn add_task_with_priority(&mut self, task: Box<dyn Task>, priority: i8) -> TaskId {
        let id = TaskId(self.slots.len());
        let order = self.next_order;
        self.next_order = self.next_order.wrapping_add(1);
        self.slots.push(Some(Slot {
            task: Some(task),
            due: SimTime::NEVER,
            generation: 0,
            order,
            priority,
        }));
        trace!(task = ?id, order, priority, "任务已登记");
        id
    }

    /// 登记任务并安排首次到期时间。
    pub fn schedule(&mut self, task: Box<dyn Task>, at: SimTime) -> TaskId {
        let id = self.add_task(task);
        self.reschedule_task(id, at);
        id
    }

    /// 注销任务。队列里的残余条目会在弹出时被跳过。
    pub fn remove_task(&mut self, id: TaskId) {
        if let Some(slot) = self.slots.get_mut(id.0) {
            *slot = None;
            trace!(task = ?id, "任务已注销");
        }
    }

    /// 任务的到期时间变了，刷新队列。对已注销的任务调用是无害的。
    pub fn reschedule_task(&mut self, id: TaskId, due: SimTime) {
        let Some(slot) = self.slots.get_mut(id.0).and_then(|s| s.as_mut()) else {
            return;
        };
        slot.due = due;
        slot.generation = slot.generation.wrapping_add(1);
        if !due.is_never() {
            self.q.push(PendingTask {
                due,
                priority: slot.priority,
                order: slot.order,
                task: id,
                generation: slot.generation,
            });
        }
        trace!(task = ?id, due = ?due, "任务已改期");
    }

    /// 查询任务当前的到期时间；已注销返回 NEVER。
    pub fn task_due(&self, id: TaskId) -> SimTime {
        self.slots
            .get(id.0)
            .and_then(|s| s.as_ref())
            .map_or(SimTime::NEVER, |s| s.due)
    }

    /// 运行到 `until`（含）：反复取出最早到期的任务执行，并按其返回值
    /// 重新入队。运行期间任务被暂时取出登记表，避免重叠借用。
    #[tracing::instrument(skip(self, world))]
    pub fn run_until(&mut self, until: SimTime, world: &mut dyn World) {
        let mut ran = 0u64;
        while let Some(top) = self.q.peek() {
            if top.due > until {
                break;
            }
            let entry = self.q.pop().expect("peek then pop");
            let Some(slot) = self.slots.get_mut(entry.task.0).and_then(|s| s.as_mut()) else {
                continue; // 已注销
            };
            if entry.generation != slot.generation {
                continue; // 改期后的陈旧条目
            }
            let Some(mut task) = slot.task.take() else {
                continue;
            };
            if entry.due > self.now {
                self.now = entry.due;
            }
            ran += 1;
            trace!(task = ?entry.task, now = ?self.now, "执行任务");

            let next = task.run(self, world);

            // 放回任务；返回值是权威的下一次到期时间
            if let Some(slot) = self.slots.get_mut(entry.task.0).and_then(|s| s.as_mut()) {
                slot.task = Some(task);
                slot.due = next;
                slot.generation = slot.generation.wrapping_add(1);
                if !next.is_never() {
                    self.q.push(PendingTask {
                        due: next,
                        priority: slot.priority,
                        order: slot.order,
                        task: entry.task,
                        generation: slot.generation,
                    });
                }
            }
        }
        if until > self.now {
            self.now = until;
        }
        debug!(tasks_ran = ran, now = ?self.now, "推进完成");
    }
}
