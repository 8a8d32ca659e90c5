//! 仿真核心模块
//!
//! 此模块包含离散事件仿真的核心组件：仿真时间、任务与调度器、
//! 世界接口、具名随机流以及场景配置。

// 子模块声明
mod pending;
mod rng;
mod scenario;
mod scheduler;
mod task;
mod time;
mod world;

// 重新导出公共接口
pub use rng::StreamRng;
pub use scenario::{ScenarioError, ScenarioSpec};
pub use scheduler::{PRIORITY_CLEANUP, PRIORITY_NORMAL, Scheduler};
pub use task::{OneShot, Task, TaskId};
pub use time::SimTime;
pub use world::World;
