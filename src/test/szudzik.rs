use crate::math::szudzik;
use std::collections::HashSet;

#[test]
fn szudzik_is_injective_on_a_thousand_square() {
    let mut seen = HashSet::new();
    for a in 0..=1000u32 {
        for b in 0..=1000u32 {
            seen.insert(szudzik(a, b));
        }
    }
    assert_eq!(seen.len(), 1001 * 1001);
}

#[test]
fn szudzik_is_order_sensitive() {
    assert_ne!(szudzik(1, 2), szudzik(2, 1));
    assert_eq!(szudzik(0, 0), 0);
    assert_eq!(szudzik(2, 1), 2 * 2 + 2 + 1);
    assert_eq!(szudzik(1, 2), 1 + 2 * 2);
}

#[test]
fn szudzik_widens_before_multiplying() {
    // u32::MAX squared overflows 32 bits but not 64.
    let v = szudzik(u32::MAX, 0);
    assert_eq!(v, u64::from(u32::MAX) * u64::from(u32::MAX) + u64::from(u32::MAX));
}
