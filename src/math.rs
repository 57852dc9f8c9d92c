//! 数学工具
//!
//! Szudzik 配对函数：把两个 32 位无符号整数映射为一个 64 位整数。

/// Szudzik 配对函数。
///
/// 对任意 `(a, b) ∈ u32²` 是单射，用于路由表索引与任务标识符生成。
/// 先拓宽到 64 位再相乘，避免溢出。
pub fn szudzik(a: u32, b: u32) -> u64 {
    let a64 = u64::from(a);
    let b64 = u64::from(b);
    if a64 >= b64 {
        a64 * a64 + a64 + b64
    } else {
        a64 + b64 * b64
    }
}
