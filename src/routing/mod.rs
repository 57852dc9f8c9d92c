//! 路由子系统
//!
//! 预计算的 (源, 目的) → 链路序列映射，以及事件携带的路由游标。

mod route;
mod table;

pub use route::{Route, RouteDescriptor};
pub use table::RoutingTable;
