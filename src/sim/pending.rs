//! 待执行任务条目
//!
//! 定义调度队列条目及其优先级比较。

use super::task::TaskId;
use super::time::SimTime;
use std::cmp::Ordering;

/// 队列条目：到期时间、平局优先级、任务注册序号与代数标记。
/// 任务被改期后旧条目代数失配，弹出时直接跳过（惰性失效）。
pub(crate) struct PendingTask {
    pub(crate) due: SimTime,
    pub(crate) priority: i8,
    pub(crate) order: u64,
    pub(crate) task: TaskId,
    pub(crate) generation: u64,
}

// BinaryHeap 是 max-heap；我们需要最小时间优先，因此反向比较。
// 同一时刻先比显式优先级（小者先跑，清理类任务排后），再按注册
// 序号先后，保证调用顺序可复现。
impl Ord for PendingTask {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.due, self.priority).cmp(&(other.due, other.priority)) {
            Ordering::Equal => self.order.cmp(&other.order),
            ord => ord,
        }
        .reverse()
    }
}

impl PartialOrd for PendingTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PendingTask {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.priority == other.priority && self.order == other.order
    }
}

impl Eq for PendingTask {}
