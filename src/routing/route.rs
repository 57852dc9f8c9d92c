//! 路由与路由游标
//!
//! 一条路由只存放源和目的之间的链路标识符：链路是图上的边，
//! 自己就知道两端是谁，所以转发节点（主控、机器、交换机）都是
//! 链路端点而不是路由成员。
//!
//! 例：`M1 -> l1 -> m1 -> l2 -> m2 -> l3 -> m3`，
//! M1 到 m3 的路由是 `(l1, l2, l3)`。

use crate::sim::Sid;

/// 源与目的之间的链路序列（不含两端服务）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    hops: Vec<Sid>,
}

impl Route {
    pub fn new(hops: Vec<Sid>) -> Self {
        Self { hops }
    }

    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    /// 第一跳，即从源出发时的投递目标。
    pub fn first(&self) -> Sid {
        self.hops[0]
    }

    /// 第 `n` 个路由元素。越界说明路由与拓扑不一致，属致命配置错误。
    pub fn hop(&self, n: i64) -> Sid {
        usize::try_from(n)
            .ok()
            .and_then(|n| self.hops.get(n).copied())
            .unwrap_or_else(|| panic!("route offset {n} out of bounds (len {})", self.hops.len()))
    }

    pub fn hops(&self) -> &[Sid] {
        &self.hops
    }
}

/// 路由游标：事件携带，接收方逐跳推进。
///
/// `src`/`dst` 用于检索路由表；`offset` 指向路由中下一个要投递的
/// 元素；`previous` 是最近一次转发本包的服务（链路用它分辨方向）；
/// `forward` 为真表示从源去往目的，为假表示完工任务沿原路返回。
///
/// 返程中 `offset` 可为负：此时游标已越过返程终点，不会再被解引用。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteDescriptor {
    pub src: Sid,
    pub dst: Sid,
    pub previous: Sid,
    pub offset: i64,
    pub forward: bool,
}

impl RouteDescriptor {
    /// 源端首发的游标：已指向第二个路由元素，`previous` 是源自己。
    pub fn outbound(src: Sid, dst: Sid) -> Self {
        Self {
            src,
            dst,
            previous: src,
            offset: 1,
            forward: true,
        }
    }

    /// 本地注入用的占位游标：事件不经过任何链路，直接投给 `sid` 自己。
    pub fn local(sid: Sid) -> Self {
        Self {
            src: sid,
            dst: sid,
            previous: sid,
            offset: 0,
            forward: true,
        }
    }

    /// 转发节点的一步推进：投递给 `route[offset]`，
    /// 新游标按方向把 `offset` 加一或减一，并把 `previous` 记为自己。
    pub fn advanced(&self, me: Sid) -> (i64, RouteDescriptor) {
        let next = if self.forward {
            self.offset + 1
        } else {
            self.offset - 1
        };
        (
            self.offset,
            RouteDescriptor {
                previous: me,
                offset: next,
                ..*self
            },
        )
    }

    /// 链路纯透传：游标不动，只更新 `previous`。
    pub fn relayed(&self, me: Sid) -> RouteDescriptor {
        RouteDescriptor {
            previous: me,
            ..*self
        }
    }
}
