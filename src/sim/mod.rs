//! PDES 运行时
//!
//! 此模块包含并行离散事件仿真的核心组件：仿真时间、事件与消息、
//! 事件上下文、顺序引擎和 Time Warp 乐观引擎。运行时对 LP 状态
//! 类型 `S` 与事件负载类型 `P` 泛型，由上层模型绑定具体语义。

mod config;
mod context;
mod event;
mod sequential;
mod simulator;
mod time;
pub(crate) mod timewarp;

pub use config::{SimConfig, SimulationMode};
pub use context::{EventContext, LpRng};
pub(crate) use context::LpCell;
pub use event::{Event, EventKey, Message, Sid};
pub use simulator::{CommitPredicate, Dispatcher, Finalizer, Initializer, Simulator};
pub use time::SimTime;
