use crate::routing::{Route, RouteDescriptor};

#[test]
fn outbound_descriptor_points_past_the_first_hop() {
    let d = RouteDescriptor::outbound(0, 6);
    assert_eq!(d.src, 0);
    assert_eq!(d.dst, 6);
    assert_eq!(d.previous, 0);
    assert_eq!(d.offset, 1);
    assert!(d.forward);
}

#[test]
fn advancing_forward_increments_the_offset_and_stamps_previous() {
    let d = RouteDescriptor::outbound(0, 6);
    let (hop, next) = d.advanced(2);
    assert_eq!(hop, 1);
    assert_eq!(next.offset, 2);
    assert_eq!(next.previous, 2);
    assert!(next.forward);
    assert_eq!(next.src, 0);
    assert_eq!(next.dst, 6);
}

#[test]
fn advancing_on_the_return_path_decrements_the_offset() {
    let d = RouteDescriptor {
        src: 0,
        dst: 6,
        previous: 5,
        offset: 1,
        forward: false,
    };
    let (hop, next) = d.advanced(4);
    assert_eq!(hop, 1);
    assert_eq!(next.offset, 0);
    assert_eq!(next.previous, 4);
    assert!(!next.forward);
}

#[test]
fn relaying_only_updates_previous() {
    let d = RouteDescriptor::outbound(0, 6);
    let relayed = d.relayed(1);
    assert_eq!(relayed.offset, d.offset);
    assert_eq!(relayed.previous, 1);
    assert_eq!(relayed.forward, d.forward);
}

#[test]
fn route_indexing_resolves_hops() {
    let route = Route::new(vec![1, 3, 5]);
    assert_eq!(route.len(), 3);
    assert_eq!(route.first(), 1);
    assert_eq!(route.hop(0), 1);
    assert_eq!(route.hop(2), 5);
}

#[test]
#[should_panic(expected = "out of bounds")]
fn route_indexing_panics_past_the_end() {
    let route = Route::new(vec![1, 3]);
    let _ = route.hop(2);
}

#[test]
#[should_panic(expected = "out of bounds")]
fn route_indexing_panics_on_negative_offsets() {
    let route = Route::new(vec![1, 3]);
    let _ = route.hop(-1);
}
