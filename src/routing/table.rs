//! 路由表
//!
//! 用 Szudzik 配对把 (源, 目的) 压成 64 位键的只读哈希表。
//! 仿真开始前构建完毕，仿真期间按引用共享。

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::SimError;
use crate::math::szudzik;
use crate::routing::Route;
use crate::sim::Sid;

/// (源, 目的) → 路由 的部分映射。
#[derive(Debug, Default, Clone)]
pub struct RoutingTable {
    routes: HashMap<u64, Route>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一条路由；同一键的旧路由会被覆盖。
    pub fn add(&mut self, src: Sid, dst: Sid, route: Route) {
        self.routes.insert(szudzik(src, dst), route);
    }

    /// 查询路由；缺失返回 `RouteNotFound`。
    pub fn get(&self, src: Sid, dst: Sid) -> Result<&Route, SimError> {
        self.routes
            .get(&szudzik(src, dst))
            .ok_or(SimError::RouteNotFound { src, dst })
    }

    /// 事件处理期间的查询：路由缺失意味着模型不可信，直接终止。
    pub fn lookup(&self, src: Sid, dst: Sid) -> &Route {
        self.get(src, dst)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    /// 已登记的路由条数。
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// 从 `.route` 文件读取路由表。
    ///
    /// 每行一条路由：`<src> <dst> <hop1> ... <hopK>`，
    /// 空白分隔，不支持空行与注释。
    pub fn read_from(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// 解析路由文件内容（测试与读取共用）。
    pub fn parse(text: &str) -> Result<Self, SimError> {
        let mut table = Self::new();
        for (lineno, line) in text.lines().enumerate() {
            let line_number = lineno + 1;
            let mut tokens = line.split_whitespace();
            let src = parse_sid(tokens.next(), line_number, "missing source id")?;
            let dst = parse_sid(tokens.next(), line_number, "missing destination id")?;
            let mut hops = Vec::new();
            for tok in tokens {
                hops.push(parse_sid(Some(tok), line_number, "bad hop id")?);
            }
            if hops.is_empty() {
                return Err(SimError::MalformedRouteFile {
                    line: line_number,
                    reason: "route has no hops".into(),
                });
            }
            if hops.contains(&src) || hops.contains(&dst) {
                return Err(SimError::MalformedRouteFile {
                    line: line_number,
                    reason: "route must not contain its endpoints".into(),
                });
            }
            table.add(src, dst, Route::new(hops));
        }
        Ok(table)
    }
}

fn parse_sid(token: Option<&str>, line: usize, reason: &str) -> Result<Sid, SimError> {
    let tok = token.ok_or_else(|| SimError::MalformedRouteFile {
        line,
        reason: reason.into(),
    })?;
    tok.parse::<Sid>().map_err(|_| SimError::MalformedRouteFile {
        line,
        reason: format!("{reason}: {tok:?}"),
    })
}
