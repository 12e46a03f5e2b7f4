//! Histogram bucket invariants.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use reqmetrics_core::{Buckets, Registry};

fn assert_invariants(bounds: &[f64], cumulative: &[u64], count: u64) {
    assert_eq!(bounds.len(), cumulative.len());
    assert!(cumulative.windows(2).all(|w| w[0] <= w[1]), "non-decreasing: {cumulative:?}");
    assert!(cumulative.last().copied().unwrap_or(0) <= count);
}

#[test]
fn cumulative_buckets() {
    let reg = Registry::new();
    let h = reg
        .histogram("d", "d", Buckets::new(&[0.1, 0.5, 1.0]).unwrap(), &[])
        .unwrap();

    for v in [0.05, 0.1, 0.3, 0.7, 2.0] {
        h.observe(&[], v).unwrap();
    }

    let s = h.get(&[]).unwrap();
    assert_eq!(s.cumulative, vec![2, 3, 4]);
    assert_eq!(s.count, 5);
    assert!((s.sum - 3.15).abs() < 1e-9);
    assert_invariants(&s.bounds, &s.cumulative, s.count);
}

#[test]
fn out_of_range_values_land_in_inf_only() {
    let reg = Registry::new();
    let h = reg
        .histogram("d", "d", Buckets::new(&[1.0, 2.0]).unwrap(), &["k"])
        .unwrap();
    let l = [("k", "v")];

    h.observe(&l, 1.5).unwrap();
    h.observe(&l, -3.0).unwrap();
    h.observe(&l, f64::NAN).unwrap();
    h.observe(&l, f64::INFINITY).unwrap();

    let s = h.get(&l).unwrap();
    assert_eq!(s.count, 4);
    assert_eq!(s.cumulative, vec![0, 1]);
    assert_eq!(s.sum, 1.5);
    assert_invariants(&s.bounds, &s.cumulative, s.count);
}

#[test]
fn invariants_hold_for_many_values() {
    let reg = Registry::new();
    let h = reg.histogram("d", "d", Buckets::default(), &[]).unwrap();
    let mut x: u64 = 7;
    for _ in 0..5000 {
        x = x.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        let v = (x >> 40) as f64 / (1u64 << 22) as f64 * 12.0;
        h.observe(&[], v).unwrap();
    }
    let s = h.get(&[]).unwrap();
    assert_eq!(s.count, 5000);
    assert_invariants(&s.bounds, &s.cumulative, s.count);
}
