//! Random operation sequences checked against the std collections.

use crate::*;
use proptest::prelude::*;
use std::collections::{BTreeMap, VecDeque};

#[derive(Debug, Clone)]
enum SeqOp {
    PushBack(u16),
    PushFront(u16),
    PopBack,
    PopFront,
    Insert(usize, u16),
    InsertN(usize, usize, u16),
    Remove(usize),
    Erase(usize, usize),
    Truncate(usize),
    Retain(u16),
}

fn seq_ops() -> impl Strategy<Value = Vec<SeqOp>> {
    prop::collection::vec(
        prop_oneof![
            3 => any::<u16>().prop_map(SeqOp::PushBack),
            3 => any::<u16>().prop_map(SeqOp::PushFront),
            1 => Just(SeqOp::PopBack),
            1 => Just(SeqOp::PopFront),
            2 => (any::<usize>(), any::<u16>()).prop_map(|(i, x)| SeqOp::Insert(i, x)),
            1 => (any::<usize>(), 0..20usize, any::<u16>()).prop_map(|(i, n, x)| SeqOp::InsertN(i, n, x)),
            1 => any::<usize>().prop_map(SeqOp::Remove),
            1 => (any::<usize>(), 0..12usize).prop_map(|(i, n)| SeqOp::Erase(i, n)),
            1 => any::<usize>().prop_map(SeqOp::Truncate),
            1 => (2..7u16).prop_map(SeqOp::Retain),
        ],
        0..400,
    )
}

#[derive(Debug, Clone)]
enum MapOp {
    Insert(u8, u32),
    EraseKey(u8),
    EraseFirst,
    LowerBound(u8),
    Retain(u8),
}

fn map_ops() -> impl Strategy<Value = Vec<MapOp>> {
    prop::collection::vec(
        prop_oneof![
            4 => (any::<u8>(), any::<u32>()).prop_map(|(k, v)| MapOp::Insert(k, v)),
            2 => any::<u8>().prop_map(MapOp::EraseKey),
            1 => Just(MapOp::EraseFirst),
            1 => any::<u8>().prop_map(MapOp::LowerBound),
            1 => (2..9u8).prop_map(MapOp::Retain),
        ],
        0..300,
    )
}

proptest! {
    #[test]
    fn deque_matches_vecdeque(ops in seq_ops()) {
        let mut d: SegmentedDeque<u16, 5> = SegmentedDeque::new();
        let mut m: VecDeque<u16> = VecDeque::new();
        for op in ops {
            match op {
                SeqOp::PushBack(x) => {
                    d.push_back(x);
                    m.push_back(x);
                }
                SeqOp::PushFront(x) => {
                    d.push_front(x);
                    m.push_front(x);
                }
                SeqOp::PopBack => prop_assert_eq!(d.pop_back(), m.pop_back()),
                SeqOp::PopFront => prop_assert_eq!(d.pop_front(), m.pop_front()),
                SeqOp::Insert(i, x) => {
                    let i = i % (m.len() + 1);
                    d.insert(i, x);
                    m.insert(i, x);
                }
                SeqOp::InsertN(i, n, x) => {
                    let i = i % (m.len() + 1);
                    d.insert_n(i, n, &x).unwrap();
                    for _ in 0..n {
                        m.insert(i, x);
                    }
                }
                SeqOp::Remove(i) => {
                    if !m.is_empty() {
                        let i = i % m.len();
                        prop_assert_eq!(Some(d.remove(i)), m.remove(i));
                    }
                }
                SeqOp::Erase(i, n) => {
                    let i = i % (m.len() + 1);
                    let j = (i + n).min(m.len());
                    d.erase(i..j);
                    m.drain(i..j);
                }
                SeqOp::Truncate(n) => {
                    let n = n % (m.len() + 1);
                    d.truncate(n);
                    m.truncate(n);
                }
                SeqOp::Retain(r) => {
                    d.retain(|x| *x % r != 0);
                    m.retain(|x| *x % r != 0);
                }
            }
            prop_assert_eq!(d.len(), m.len());
            // At most one spare segment beyond each end.
            prop_assert!(d.segment_count() <= (d.len() + 4) / 5 + 3);
        }
        prop_assert!(d.iter().eq(m.iter()));
        prop_assert!(d.iter().rev().eq(m.iter().rev()));
        for (i, x) in m.iter().enumerate() {
            prop_assert_eq!(&d[i], x);
            prop_assert_eq!(d.index_of(&d[i]), Some(i));
        }
    }

    #[test]
    fn segvec_matches_vec(ops in seq_ops()) {
        let mut s: SegmentedVec<u16, 3> = SegmentedVec::new();
        let mut v: Vec<u16> = Vec::new();
        for op in ops {
            match op {
                SeqOp::PushBack(x) | SeqOp::PushFront(x) => {
                    s.push(x);
                    v.push(x);
                }
                SeqOp::PopBack | SeqOp::PopFront => prop_assert_eq!(s.pop(), v.pop()),
                SeqOp::Insert(i, x) => {
                    let i = i % (v.len() + 1);
                    s.insert(i, x);
                    v.insert(i, x);
                }
                SeqOp::InsertN(i, n, x) => {
                    let i = i % (v.len() + 1);
                    s.insert_n(i, n, &x).unwrap();
                    v.splice(i..i, std::iter::repeat(x).take(n));
                }
                SeqOp::Remove(i) => {
                    if !v.is_empty() {
                        let i = i % v.len();
                        prop_assert_eq!(s.remove(i), v.remove(i));
                    }
                }
                SeqOp::Erase(i, n) => {
                    let i = i % (v.len() + 1);
                    let j = (i + n).min(v.len());
                    s.erase(i..j);
                    v.drain(i..j);
                }
                SeqOp::Truncate(n) => {
                    let n = n % (v.len() + 1);
                    s.truncate(n);
                    v.truncate(n);
                }
                SeqOp::Retain(r) => {
                    s.retain(|x| *x % r != 0);
                    v.retain(|x| *x % r != 0);
                }
            }
        }
        prop_assert!(s.iter().eq(v.iter()));
    }

    #[test]
    fn fixed_vec_matches_arrayvec(ops in seq_ops()) {
        let mut f: FixedVec<u16, 32> = FixedVec::new();
        let mut a: arrayvec::ArrayVec<u16, 32> = arrayvec::ArrayVec::new();
        for op in ops {
            match op {
                SeqOp::PushBack(x) | SeqOp::PushFront(x) => {
                    prop_assert_eq!(f.try_push(x).is_ok(), a.try_push(x).is_ok());
                }
                SeqOp::PopBack | SeqOp::PopFront => prop_assert_eq!(f.pop(), a.pop()),
                SeqOp::Insert(i, x) | SeqOp::InsertN(i, _, x) => {
                    let i = i % (a.len() + 1);
                    prop_assert_eq!(f.try_insert(i, x).is_ok(), a.try_insert(i, x).is_ok());
                }
                SeqOp::Remove(i) => {
                    if !a.is_empty() {
                        let i = i % a.len();
                        prop_assert_eq!(f.remove(i), a.remove(i));
                    }
                }
                SeqOp::Erase(i, n) => {
                    let i = i % (a.len() + 1);
                    let j = (i + n).min(a.len());
                    f.erase(i..j);
                    a.drain(i..j);
                }
                SeqOp::Truncate(n) => {
                    f.truncate(n);
                    a.truncate(n);
                }
                SeqOp::Retain(r) => {
                    f.retain(|x| *x % r != 0);
                    a.retain(|x| *x % r != 0);
                }
            }
            prop_assert_eq!(f.as_slice(), a.as_slice());
        }
    }

    #[test]
    fn map_matches_btreemap(ops in map_ops()) {
        let mut t: Map<u8, u32> = Map::new();
        let mut m: BTreeMap<u8, u32> = BTreeMap::new();
        for op in ops {
            match op {
                MapOp::Insert(k, v) => {
                    let (_, inserted) = t.insert(k, v).unwrap();
                    prop_assert_eq!(inserted, !m.contains_key(&k));
                    m.entry(k).or_insert(v);
                }
                MapOp::EraseKey(k) => {
                    prop_assert_eq!(t.remove(&k), m.remove(&k));
                }
                MapOp::EraseFirst => {
                    prop_assert_eq!(t.pop_first(), m.pop_first());
                }
                MapOp::LowerBound(k) => {
                    let got = t.lower_bound(&k).map(|h| t.entry_at(h));
                    prop_assert_eq!(got, m.range(k..).next());
                }
                MapOp::Retain(r) => {
                    t.retain(|k, _| *k % r != 0);
                    m.retain(|k, _| *k % r != 0);
                }
            }
            t.check();
        }
        prop_assert!(t.iter().eq(m.iter()));
        prop_assert!(t.iter().rev().eq(m.iter().rev()));
        for (i, (k, _)) in m.iter().enumerate() {
            let h = t.find(k).unwrap();
            prop_assert_eq!(t.index_of(h), i);
            prop_assert_eq!(t.nth(i), Some(h));
        }
    }

    #[test]
    fn multimap_matches_sorted_vec(ops in map_ops()) {
        let mut t: StaticMultimap<u8, u32, 64> = StaticMultimap::new();
        let mut v: Vec<(u8, u32)> = Vec::new();
        for op in ops {
            match op {
                MapOp::Insert(k, x) => {
                    let r = t.insert(k, x);
                    if v.len() == 64 {
                        prop_assert!(r.is_err());
                    } else {
                        prop_assert!(r.is_ok());
                        let pos = v.partition_point(|e| e.0 <= k);
                        v.insert(pos, (k, x));
                    }
                }
                MapOp::EraseKey(k) => {
                    let before = v.len();
                    v.retain(|e| e.0 != k);
                    prop_assert_eq!(t.erase_key(&k), before - v.len());
                }
                MapOp::EraseFirst => {
                    let expected = if v.is_empty() { None } else { Some(v.remove(0)) };
                    prop_assert_eq!(t.pop_first(), expected);
                }
                MapOp::LowerBound(k) => {
                    prop_assert_eq!(t.count(&k), v.iter().filter(|e| e.0 == k).count());
                }
                MapOp::Retain(r) => {
                    t.retain(|k, _| *k % r != 0);
                    v.retain(|e| e.0 % r != 0);
                }
            }
            t.check();
        }
        let got: Vec<(u8, u32)> = t.iter().map(|(k, x)| (*k, *x)).collect();
        prop_assert_eq!(got, v);
    }

    #[test]
    fn flat_multimap_matches_sorted_vec(ops in map_ops()) {
        let mut f: StaticFlatMultimap<u8, u32, 48> = StaticFlatMultimap::new();
        let mut v: Vec<(u8, u32)> = Vec::new();
        for op in ops {
            match op {
                MapOp::Insert(k, x) => {
                    let r = f.insert_hint(x as usize % (f.len() + 1), k, x);
                    if v.len() == 48 {
                        prop_assert!(r.is_err());
                    } else {
                        let pos = r.unwrap();
                        v.insert(pos, (k, x));
                    }
                }
                MapOp::EraseKey(k) => {
                    let before = v.len();
                    v.retain(|e| e.0 != k);
                    prop_assert_eq!(f.erase_key(&k), before - v.len());
                }
                MapOp::EraseFirst => {
                    if !v.is_empty() {
                        prop_assert_eq!(f.erase_at(0), v.remove(0));
                    }
                }
                MapOp::LowerBound(k) => {
                    prop_assert_eq!(f.lower_bound(&k), v.partition_point(|e| e.0 < k));
                }
                MapOp::Retain(r) => {
                    f.retain(|k, _| *k % r != 0);
                    v.retain(|e| e.0 % r != 0);
                }
            }
            prop_assert!(f.as_slice().windows(2).all(|w| w[0].0 <= w[1].0));
            prop_assert_eq!(f.as_slice(), &v[..]);
        }
    }

    #[test]
    fn segpos_matches_index(offsets in prop::collection::vec((0..200usize, 0..200usize), 1..50)) {
        let d: SegmentedDeque<usize, 7> = (0..200).collect();
        for (i, j) in offsets {
            let p = d.position(i);
            let q = p.offset(j as isize - i as isize);
            prop_assert_eq!(q, d.position(j));
            prop_assert_eq!(q.distance_from(p), j as isize - i as isize);
            prop_assert_eq!(unsafe { *q.ptr() }, j);
        }
    }
}
