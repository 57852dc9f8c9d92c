//! 错误类型
//!
//! 仿真开始前的配置错误用 `Result` 返回；事件处理期间的致命错误
//! （路由缺失、协议违例）直接 panic，保证析构仍然执行。

use thiserror::Error;

use crate::sim::Sid;

/// 配置阶段与查表阶段的错误。
#[derive(Debug, Error)]
pub enum SimError {
    /// 同一服务标识符被注册了两次。
    #[error("a service with id {0} has already been registered")]
    DuplicateService(Sid),

    /// 服务标识符必须从 0 开始连续编号。
    #[error("service ids must be dense: id {0} is missing")]
    SparseServiceIds(Sid),

    /// 仿真器缺少事件分发器。
    #[error("no dispatcher has been configured")]
    MissingDispatcher,

    /// 路由文件格式错误。
    #[error("route file line {line}: {reason}")]
    MalformedRouteFile { line: usize, reason: String },

    /// 查询了一条不存在的路由。
    #[error("no route registered from {src} to {dst}")]
    RouteNotFound { src: Sid, dst: Sid },

    /// 机器算力必须为正。
    #[error("machine {0}: power must be positive, got {1}")]
    InvalidPower(Sid, f64),

    /// 负载因子必须落在 [0, 1]。
    #[error("service {0}: load factor {1} is outside [0, 1]")]
    InvalidLoadFactor(Sid, f64),

    /// 机器核数必须为正。
    #[error("machine {0}: core count must be positive")]
    InvalidCoreCount(Sid),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
