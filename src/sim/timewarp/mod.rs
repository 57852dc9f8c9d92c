//! Time Warp 乐观引擎
//!
//! 每个 LP 持有输入队列、输出队列与状态快照栈；工作线程推测执行，
//! 迟到事件触发回滚与反消息级联，GVT 推进后提交并回收化石。

mod engine;
mod lp;

pub(crate) use engine::run;
pub(crate) use lp::Lp;
