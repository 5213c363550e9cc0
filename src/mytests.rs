use crate::*;
use std::{
    alloc::Layout,
    cell::Cell,
    panic::{catch_unwind, AssertUnwindSafe},
    ptr::NonNull,
    rc::Rc,
};

/// Element that counts live instances and can be told to panic on the k-th clone.
struct Tracked {
    id: u32,
    live: Rc<Cell<isize>>,
    clones_left: Rc<Cell<usize>>,
}

impl Tracked {
    fn new(id: u32, live: &Rc<Cell<isize>>, clones_left: &Rc<Cell<usize>>) -> Self {
        live.set(live.get() + 1);
        Self {
            id,
            live: live.clone(),
            clones_left: clones_left.clone(),
        }
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        let left = self.clones_left.get();
        if left == 0 {
            panic!("clone refused");
        }
        self.clones_left.set(left - 1);
        Self::new(self.id, &self.live, &self.clones_left)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

/// Allocator that counts outstanding blocks and refuses once `limit` allocations were made.
struct CountingAlloc {
    outstanding: Cell<isize>,
    made: Cell<usize>,
    limit: usize,
}

impl CountingAlloc {
    fn new(limit: usize) -> Self {
        Self {
            outstanding: Cell::new(0),
            made: Cell::new(0),
            limit,
        }
    }
}

unsafe impl RawAlloc for CountingAlloc {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>> {
        if self.made.get() >= self.limit {
            return Err(Error::AllocFailed { size: layout.size() });
        }
        self.made.set(self.made.get() + 1);
        self.outstanding.set(self.outstanding.get() + 1);
        Global.allocate(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.outstanding.set(self.outstanding.get() - 1);
        unsafe { Global.deallocate(ptr, layout) }
    }
}

#[test]
fn error_display() {
    assert_eq!(Error::CapacityExceeded { capacity: 3 }.to_string(), "capacity exceeded (capacity is 3)");
    assert_eq!(Error::OutOfRange { index: 7, len: 2 }.to_string(), "index 7 out of range for length 2");
    assert_eq!(Error::AllocFailed { size: 64 }.to_string(), "allocation of 64 bytes failed");
}

#[test]
fn fixed_vec_overflow_hands_back() {
    let mut v: FixedVec<String, 3> = FixedVec::new();
    for s in ["a", "b", "c"] {
        v.push(s.to_string());
    }
    assert!(v.is_full());
    assert_eq!(v.available(), 0);
    let e = v.try_push("d".to_string()).unwrap_err();
    assert_eq!(*e.error(), Error::CapacityExceeded { capacity: 3 });
    assert_eq!(e.into_element(), "d");
    assert_eq!(v.as_slice(), ["a", "b", "c"]);

    let e = v.try_insert(1, "x".to_string()).unwrap_err();
    assert_eq!(e.into_element(), "x");
    assert_eq!(v.as_slice(), ["a", "b", "c"]);
    assert!(v.insert_n(0, 1, &"y".to_string()).is_err());
    assert!(v.emplace_with(|| unreachable!()).is_err());
    assert_eq!(v.len(), 3);
}

#[test]
fn fixed_vec_ops() {
    let mut v: FixedVec<u32, 16> = FixedVec::from([1, 2, 3, 4]);
    v.insert(0, 0);
    v.insert_n(2, 3, &9).unwrap();
    assert_eq!(v.as_slice(), [0, 1, 9, 9, 9, 2, 3, 4]);
    assert_eq!(v.insert_iter(8, [5, 6]).unwrap(), 2);
    v.erase(2..5);
    assert_eq!(v.as_slice(), [0, 1, 2, 3, 4, 5, 6]);
    assert_eq!(v.remove(0), 0);
    assert_eq!(vecs::erase_if(&mut v, |x| x % 2 == 0), 3);
    assert_eq!(v.as_slice(), [1, 3, 5]);
    assert_eq!(v.at(3), Err(Error::OutOfRange { index: 3, len: 3 }));
    assert_eq!(*v.at(1).unwrap(), 3);
    assert_eq!(v.index_of(&v[2]), Some(2));
    assert_eq!(v.index_of(&5), None);
    v.resize(5, &7).unwrap();
    assert_eq!(v.as_slice(), [1, 3, 5, 7, 7]);
    v.assign(2, &8).unwrap();
    assert_eq!(v.as_slice(), [8, 8]);
    v.assign_iter(0..16).unwrap();
    assert_eq!(v.len(), 16);
    assert!(v.assign_iter(0..17).is_err());

    let mut w: FixedVec<u32, 4> = FixedVec::from([1, 2]);
    assert!(w.insert_iter(1, [7, 8, 9]).is_err());
    assert_eq!(w.as_slice(), [1, 2]);
    assert_eq!(w.insert_iter(1, [7, 8]).unwrap(), 2);
    assert_eq!(w.as_slice(), [1, 7, 8, 2]);
    let c = w.clone();
    assert_eq!(c, w);
    assert!(c > FixedVec::<u32, 4>::from([1, 6]));
    let back: Vec<u32> = w.into_iter().rev().collect();
    assert_eq!(back, [2, 8, 7, 1]);
}

#[test]
fn fixed_vec_clone_rollback() {
    let live = Rc::new(Cell::new(0));
    let clones_left = Rc::new(Cell::new(4));
    let proto = Tracked::new(0, &live, &clones_left);
    let r = catch_unwind(AssertUnwindSafe(|| FixedVec::<Tracked, 10>::from_elem(8, &proto)));
    assert!(r.is_err());
    // Four clones were built before the fifth failed, and all four were dropped.
    assert_eq!(clones_left.get(), 0);
    assert_eq!(live.get(), 1);

    clones_left.set(100);
    let mut v = FixedVec::<Tracked, 10>::from_elem(3, &proto).unwrap();
    assert_eq!(live.get(), 4);
    clones_left.set(1);
    let r = catch_unwind(AssertUnwindSafe(|| v.insert_n(1, 3, &proto)));
    assert!(r.is_err());
    assert_eq!(v.len(), 3);
    assert_eq!(live.get(), 4);
    drop(v);
    assert_eq!(live.get(), 1);
}

#[test]
fn deque_push_front_keeps_addresses() {
    let mut d: SegmentedDeque<u32, 4> = SegmentedDeque::new();
    for i in 0..10 {
        d.push_back(i);
    }
    let p = unsafe { d.position(0).ptr() };
    let q = d.get(7).unwrap() as *const u32;
    d.push_front(100);
    unsafe {
        assert_eq!(*p, 0);
        assert_eq!(*q, 7);
        assert_eq!(d.index_of(&*p), Some(1));
    }
    assert_eq!(d.len(), 11);
    assert_eq!(d.front(), Some(&100));
    assert_eq!(d.back(), Some(&9));
}

#[test]
fn deque_middle_insert_and_erase() {
    let mut d: SegmentedDeque<u32, 4> = (0..20).collect();
    let mut v: Vec<u32> = (0..20).collect();
    d.insert(3, 100);
    v.insert(3, 100);
    d.insert(17, 200);
    v.insert(17, 200);
    d.insert_n(10, 6, &7).unwrap();
    for _ in 0..6 {
        v.insert(10, 7);
    }
    assert_eq!(d.iter().copied().collect::<Vec<_>>(), v);
    d.erase(2..9);
    v.drain(2..9);
    assert_eq!(d.iter().copied().collect::<Vec<_>>(), v);
    d.erase(15..);
    v.truncate(15);
    assert_eq!(d.iter().copied().collect::<Vec<_>>(), v);
    assert_eq!(d.remove(0), v.remove(0));
    assert_eq!(d.insert_iter(4, [1, 2, 3]).unwrap(), 3);
    for (i, x) in [1, 2, 3].into_iter().enumerate() {
        v.insert(4 + i, x);
    }
    assert_eq!(d.iter().copied().collect::<Vec<_>>(), v);
    assert_eq!(deque::erase(&mut d, &7), 6);
    v.retain(|&x| x != 7);
    assert_eq!(d.iter().rev().copied().collect::<Vec<_>>(), v.iter().rev().copied().collect::<Vec<_>>());
    assert_eq!(d.iter().nth(3), v.get(3));
    assert_eq!(d.iter().nth_back(2), v.iter().nth_back(2));
    assert_eq!(d.at(99), Err(Error::OutOfRange { index: 99, len: v.len() }));
}

#[test]
fn deque_insert_rollback() {
    let live = Rc::new(Cell::new(0));
    let clones_left = Rc::new(Cell::new(1000));
    let proto = Tracked::new(0, &live, &clones_left);
    let mut d: SegmentedDeque<Tracked, 4> = SegmentedDeque::new();
    for i in 0..9 {
        d.push_back(Tracked::new(i, &live, &clones_left));
    }
    for index in [0, 2, 5, 9] {
        clones_left.set(3);
        let r = catch_unwind(AssertUnwindSafe(|| d.insert_n(index, 6, &proto)));
        assert!(r.is_err());
        assert_eq!(d.len(), 9);
        assert_eq!(live.get(), 10);
        let ids: Vec<u32> = d.iter().map(|t| t.id).collect();
        assert_eq!(ids, (0..9).collect::<Vec<_>>());
    }
    drop(d);
    assert_eq!(live.get(), 1);
}

#[test]
fn deque_releases_segments() {
    let a = CountingAlloc::new(usize::MAX);
    {
        let mut d: SegmentedDeque<u64, 4, &CountingAlloc> = SegmentedDeque::new_in(&a);
        for i in 0..40 {
            d.push_back(i);
        }
        assert_eq!(d.segment_count(), 10);
        for _ in 0..20 {
            d.pop_back();
        }
        assert_eq!(d.segment_count(), 6);
        while d.pop_back().is_some() {}
        assert_eq!(d.segment_count(), 1);

        for i in 0..40 {
            d.push_front(i);
        }
        while d.pop_front().is_some() {}
        assert_eq!(d.segment_count(), 1);
        d.shrink_to_fit();
        assert_eq!(d.segment_count(), 0);
        assert_eq!(a.outstanding.get(), 0);
        d.push_back(1);
    }
    assert_eq!(a.outstanding.get(), 0);
}

#[test]
fn deque_alloc_failure_hands_back() {
    // Directory plus one segment.
    let a = CountingAlloc::new(2);
    let mut d: SegmentedDeque<String, 4, &CountingAlloc> = SegmentedDeque::new_in(&a);
    for i in 0..4 {
        d.push_back(i.to_string());
    }
    let e = d.try_push_back("x".to_string()).unwrap_err();
    assert_eq!(
        *e.error(),
        Error::AllocFailed {
            size: 4 * std::mem::size_of::<String>()
        }
    );
    assert_eq!(e.into_element(), "x");
    assert!(d.try_push_front("y".to_string()).is_err());
    assert!(d.try_insert(2, "z".to_string()).is_err());
    assert_eq!(d.len(), 4);
    assert_eq!(d.iter().cloned().collect::<Vec<_>>(), ["0", "1", "2", "3"]);
    drop(d);
    assert_eq!(a.outstanding.get(), 0);
}

#[test]
fn deque_zero_sized() {
    let mut d: SegmentedDeque<(), 8> = SegmentedDeque::new();
    for _ in 0..100 {
        d.push_back(());
        d.push_front(());
    }
    d.insert(50, ());
    assert_eq!(d.len(), 201);
    d.erase(10..60);
    assert_eq!(d.len(), 151);
    assert_eq!(d.iter().count(), 151);
}

#[test]
fn segpos_arithmetic() {
    let d: SegmentedDeque<usize, 4> = (0..50).collect();
    for i in 0..50 {
        for j in 0..50 {
            let pi = d.position(i);
            let pj = d.position(j);
            assert_eq!(pi.add(j).sub(i), d.position(0).add(j));
            assert_eq!(pj.distance_from(pi), j as isize - i as isize);
            assert_eq!(pi.offset(j as isize - i as isize), pj);
            assert_eq!(i < j, pi < pj);
        }
        assert_eq!(unsafe { *d.position(i).ptr() }, d[i]);
    }
    assert_eq!(d.end_pos().distance_from(d.begin_pos()), 50);
}

#[test]
fn uninit_over_segments() {
    let mut d: SegmentedDeque<u32, 3> = (0..20).collect();
    unsafe {
        // Shift elements 2..12 down by five, across segment boundaries.
        uninit::copy_n(d.position(7), 10, d.position(2));
        let flat: Vec<u32> = d.iter().copied().collect();
        assert_eq!(&flat[2..12], &(7..17).collect::<Vec<_>>()[..]);
        uninit::fill_n(d.position(1), 5, &99);
    }
    let before: Vec<u32> = d.iter().copied().collect();
    unsafe {
        // Overlapping shift toward the back.
        uninit::copy_backward_n(d.position(15), 6, d.position(20));
    }
    let flat: Vec<u32> = d.iter().copied().collect();
    assert_eq!(&flat[..6], [0, 99, 99, 99, 99, 99]);
    assert_eq!(&flat[14..], &before[9..15]);
    assert_eq!(&flat[..14], &before[..14]);
}

#[test]
fn segvec_ops() {
    let mut v: SegmentedVec<u32, 4> = SegmentedVec::new();
    for i in 0..30 {
        v.push(i);
    }
    v.insert(0, 100);
    assert_eq!(v.first(), Some(&100));
    assert_eq!(v.last(), Some(&29));
    assert_eq!(v.remove(0), 100);
    v.erase(10..20);
    assert_eq!(v.len(), 20);
    assert_eq!(v[10], 20);
    assert_eq!(segvec::erase_if(&mut v, |x| x % 3 == 0), 7);
    v.resize(20, &1).unwrap();
    assert_eq!(v.len(), 20);
    v.reserve(100).unwrap();
    assert!(v.capacity() >= 120);
    let c = v.clone();
    assert_eq!(c, v);
    v.shrink_to_fit();
    assert_eq!(v.segment_count(), 5);
    assert_eq!(v.into_iter().count(), 20);
}

#[test]
fn multimap_keeps_insertion_order() {
    let mut m = MultiMap::new();
    for (i, k) in [5, 3, 5, 1, 5].into_iter().enumerate() {
        m.insert(k, i).unwrap();
        m.check();
    }
    let all: Vec<(u32, usize)> = m.iter().map(|(k, v)| (*k, *v)).collect();
    assert_eq!(all, [(1, 3), (3, 1), (5, 0), (5, 2), (5, 4)]);
    assert_eq!(m.count(&5), 3);
    let fives: Vec<usize> = m.equal_range(&5).map(|(_, v)| *v).collect();
    assert_eq!(fives, [0, 2, 4]);
    assert_eq!(m.erase_key(&5), 3);
    m.check();
    assert_eq!(m.len(), 2);
}

#[test]
fn tree_erase_keeps_other_handles() {
    let mut m: Map<u32, String> = Map::new();
    let mut handles = Vec::new();
    for k in 0..10 {
        handles.push(m.insert(k, k.to_string()).unwrap().0);
    }
    let h4 = handles[4];
    for k in [3, 5, 0, 9, 6, 1] {
        m.erase(handles[k]);
        m.check();
        assert_eq!(m.entry_at(h4), (&4, &"4".to_string()));
    }
    assert_eq!(m.index_of(h4), 1);
    assert_eq!(m.nth(1), Some(h4));
    assert_eq!(m.prev(h4).map(|h| *m.entry_at(h).0), Some(2));
    assert_eq!(m.next(h4).map(|h| *m.entry_at(h).0), Some(7));
    let keys: Vec<u32> = m.keys().copied().collect();
    assert_eq!(keys, [2, 4, 7, 8]);
}

#[test]
fn unique_insert_refuses_duplicate() {
    let mut m: Map<&str, u32> = Map::new();
    let (h, inserted) = m.insert("a", 1).unwrap();
    assert!(inserted);
    let (h2, inserted) = m.insert("a", 2).unwrap();
    assert!(!inserted);
    assert_eq!(h, h2);
    assert_eq!(m["a"], 1);
    m.insert_or_assign("a", 3).unwrap();
    assert_eq!(m.get("a"), Some(&3));
    *m.get_or_insert_with("b", || 10).unwrap() += 1;
    assert_eq!(m.get("b"), Some(&11));
    assert_eq!(m.remove("a"), Some(3));
    assert_eq!(m.len(), 1);
}

#[test]
fn tree_hinted_insert() {
    let mut m: MultiMap<u32, u32> = MultiMap::new();
    // Appending at the end with a None hint.
    for k in 0..100 {
        m.insert_hint(None, k / 3, k).unwrap();
        m.check();
    }
    let h = m.find(&10).unwrap();
    let (h2, _) = m.insert_hint(Some(h), 10, 999).unwrap();
    assert_eq!(m.next(h2), Some(h));
    // A wrong hint still inserts in order.
    let first = m.first();
    m.insert_hint(first, 50, 0).unwrap();
    m.check();
    assert_eq!(m.len(), 102);

    let mut s: Set<u32> = Set::new();
    for k in (0..50).rev() {
        let first = s.first();
        s.insert_hint(first, k * 2).unwrap();
        s.check();
    }
    let h = s.find(&10).unwrap();
    assert_eq!(s.insert_hint(Some(h), 10).unwrap(), (h, false));
    let (h11, inserted) = s.insert_hint(Some(h), 11).unwrap();
    assert!(inserted);
    assert_eq!(s.prev(h11), Some(h));
    s.check();
}

#[test]
fn tree_bounds_and_ranges() {
    let m: Map<u32, u32> = (0..20).map(|k| (k * 2, k)).collect();
    m.check();
    assert_eq!(m.lower_bound(&7).map(|h| *m.entry_at(h).0), Some(8));
    assert_eq!(m.upper_bound(&8).map(|h| *m.entry_at(h).0), Some(10));
    assert_eq!(m.lower_bound(&39), None);
    let from = m.lower_bound(&10);
    let to = m.lower_bound(&20);
    let keys: Vec<u32> = m.range(from, to).map(|(k, _)| *k).collect();
    assert_eq!(keys, [10, 12, 14, 16, 18]);
    let keys: Vec<u32> = m.range(from, to).rev().map(|(k, _)| *k).collect();
    assert_eq!(keys, [18, 16, 14, 12, 10]);
    assert_eq!(m.range(from, to).len(), 5);

    let mut m2 = m.clone();
    assert_eq!(m2, m);
    let next = m2.erase_range(m2.lower_bound(&10), m2.lower_bound(&20));
    assert_eq!(next.map(|h| *m2.entry_at(h).0), Some(20));
    assert_eq!(m2.len(), 15);
    m2.check();
    assert!(m2 != m);
    assert_eq!(map::erase_if(&mut m2, |k, _| k % 4 == 0), 8);
    m2.check();
}

#[test]
fn pool_full_and_reuse() {
    let mut m: StaticMap<u32, String, 4> = StaticMap::new();
    let mut hs = Vec::new();
    for k in 0..4 {
        hs.push(m.insert(k, k.to_string()).unwrap().0);
    }
    let e = m.insert(9, "nine".to_string()).unwrap_err();
    assert_eq!(*e.error(), Error::CapacityExceeded { capacity: 4 });
    assert_eq!(e.into_element(), (9, "nine".to_string()));
    assert_eq!(m.len(), 4);
    m.check();

    let (k, _) = m.erase(hs[1]);
    assert_eq!(k, 1);
    let (h, inserted) = m.insert(9, "nine".to_string()).unwrap();
    assert!(inserted);
    assert_eq!(h.slot(), hs[1].slot());
    m.check();
    let keys: Vec<u32> = m.keys().copied().collect();
    assert_eq!(keys, [0, 2, 3, 9]);

    let mut s: StaticMultiset<u8, 3> = StaticMultiset::new();
    s.insert(1).unwrap();
    s.insert(1).unwrap();
    s.insert(1).unwrap();
    assert_eq!(s.insert(1).unwrap_err().into_element(), 1);
    assert_eq!(s.count(&1), 3);
    let mut built = false;
    let e = s.emplace_with(|| {
        built = true;
        2
    });
    assert_eq!(e.unwrap_err(), Error::CapacityExceeded { capacity: 3 });
    assert!(!built);

    assert_eq!(m.erase(hs[0]).0, 0);
    let (h, inserted) = m.emplace_with(|| (7, "seven".to_string())).unwrap();
    assert!(inserted);
    assert_eq!(m.entry_at(h), (&7, &"seven".to_string()));
    m.check();
}

#[test]
fn tree_drops_values() {
    let live = Rc::new(Cell::new(0));
    let clones_left = Rc::new(Cell::new(1000));
    {
        let mut m: MultiMap<u32, Tracked> = MultiMap::new();
        for k in 0..50 {
            m.insert(k % 7, Tracked::new(k, &live, &clones_left)).unwrap();
        }
        assert_eq!(live.get(), 50);
        m.erase_key(&3);
        assert_eq!(live.get(), 43);
        let c = m.clone();
        assert_eq!(live.get(), 86);
        drop(c);
        let firsts: Vec<u32> = m.iter().take(3).map(|(_, t)| t.id).collect();
        assert_eq!(firsts, [0, 7, 14]);
        m.retain(|k, _| *k != 0);
        assert_eq!(live.get(), 35);
        let mut it = m.into_iter();
        it.next();
        it.next_back();
    }
    assert_eq!(live.get(), 0);
}

#[test]
fn tree_random_against_model() {
    let mut m: MultiMap<u32, u32> = MultiMap::new();
    let mut model: Vec<(u32, u32)> = Vec::new();
    let mut x: u32 = 12345;
    for i in 0..2000 {
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        let k = x % 64;
        if x % 3 == 0 && !model.is_empty() {
            let n = m.erase_key(&k);
            let before = model.len();
            model.retain(|e| e.0 != k);
            assert_eq!(n, before - model.len());
        } else {
            m.insert(k, i).unwrap();
            let pos = model.partition_point(|e| e.0 <= k);
            model.insert(pos, (k, i));
        }
        if i % 50 == 0 {
            m.check();
        }
    }
    m.check();
    let got: Vec<(u32, u32)> = m.iter().map(|(k, v)| (*k, *v)).collect();
    assert_eq!(got, model);
}

#[test]
fn set_with_greater() {
    let mut s: TreeSet<u32, false, Greater> = TreeSet::new();
    for k in [4, 1, 9, 4, 7] {
        s.insert(k).unwrap();
    }
    s.check();
    let keys: Vec<u32> = s.iter().copied().collect();
    assert_eq!(keys, [9, 7, 4, 1]);
    assert!(s.contains(&7));
    assert!(s.remove(&7));
    assert!(!s.remove(&7));
    assert_eq!(s.pop_first(), Some(9));
    assert_eq!(s.pop_last(), Some(1));
}

#[test]
fn flat_multimap_hint() {
    let mut m: StaticFlatMultimap<u32, char, 8> = StaticFlatMultimap::new();
    m.insert(1, 'a').unwrap();
    m.insert(3, 'b').unwrap();
    m.insert(3, 'c').unwrap();
    m.insert(5, 'd').unwrap();
    // hint points at an equal key: insert exactly there
    assert_eq!(m.insert_hint(1, 3, 'x').unwrap(), 1);
    // hint - 1 is an equal key
    assert_eq!(m.insert_hint(4, 3, 'y').unwrap(), 4);
    // strictly between neighbours
    assert_eq!(m.insert_hint(5, 4, 'z').unwrap(), 5);
    // bad hint: goes after all equal keys
    assert_eq!(m.insert_hint(0, 3, 'w').unwrap(), 5);
    let vals: String = m.values().collect();
    assert_eq!(vals, "axbcywzd");
    assert_eq!(m.equal_range(&3), 1..6);
    assert_eq!(m.count(&3), 5);
    assert_eq!(m.find(&5), Some(7));
    assert!(m.is_full());
    let e = m.insert(0, 'q').unwrap_err();
    assert_eq!(e.into_element(), (0, 'q'));
    assert_eq!(m.erase_key(&3), 5);
    assert_eq!(m.len(), 3);
    assert_eq!(m.nth(1), Some((&4, &'z')));
    assert_eq!(m.index_of(&m.as_slice()[2]), Some(2));

    let f: StaticFlatMultimap<u32, char, 4> = StaticFlatMultimap::from([(2, 'b'), (1, 'a'), (2, 'c')]);
    assert_eq!(f.as_slice(), [(1, 'a'), (2, 'b'), (2, 'c')]);
}

#[test]
fn unordered_set_erase_and_equality() {
    let mut s: StaticUnorderedFlatSet<u32, 8> = [1, 2, 3, 4, 5, 6].into_iter().collect();
    assert_eq!(s.insert(3).unwrap(), (2, false));
    assert_eq!(s.erase_at(1), 2);
    assert_eq!(s.as_slice(), [1, 6, 3, 4, 5]);
    // Range shorter than the tail: the last keys fill the hole.
    s.erase_range(0..2);
    assert_eq!(s.as_slice(), [4, 5, 3]);
    s.extend([7, 8, 9]);
    // Range at least as long as the tail: the tail shifts down.
    s.erase_range(1..4);
    assert_eq!(s.as_slice(), [4, 8, 9]);

    let t: StaticUnorderedFlatSet<u32, 8> = [9, 4, 8].into_iter().collect();
    assert_eq!(s, t);
    let u: StaticUnorderedFlatSet<u32, 8> = StaticUnorderedFlatSet::from([9, 4, 7]);
    assert_ne!(s, u);
    assert_eq!(s.erase_key(&8), 1);
    assert_eq!(s.erase_key(&8), 0);
    assert_eq!(unordered::erase_if(&mut s, |k| *k > 5), 1);
    assert_eq!(s.as_slice(), [4]);

    let mut f: StaticUnorderedFlatSet<u8, 2> = StaticUnorderedFlatSet::new();
    f.insert(1).unwrap();
    f.insert(2).unwrap();
    assert_eq!(f.insert(2).unwrap(), (1, false));
    assert_eq!(f.insert(3).unwrap_err().into_element(), 3);
}

#[test]
fn take_leaves_empty() {
    let mut d: SegmentedDeque<u32, 4> = (0..10).collect();
    let taken = std::mem::take(&mut d);
    assert!(d.is_empty());
    assert_eq!(taken.len(), 10);
    let mut m: Map<u32, u32> = (0..5).map(|k| (k, k)).collect();
    let mut other = Map::new();
    std::mem::swap(&mut m, &mut other);
    assert!(m.is_empty());
    assert_eq!(other.len(), 5);
}

#[test]
fn uninit_fallible_and_cross_storage() {
    let live = Rc::new(Cell::new(0));
    let clones_left = Rc::new(Cell::new(0));
    let mut v: FixedVec<Tracked, 8> = FixedVec::new();
    let mut k = 0;
    let r = unsafe {
        uninit::try_uninitialized_with_n(v.as_mut_ptr(), 6, || {
            k += 1;
            if k == 4 {
                Err("fourth")
            } else {
                Ok(Tracked::new(k, &live, &clones_left))
            }
        })
    };
    assert_eq!(r.unwrap_err(), "fourth");
    assert_eq!(k, 4);
    assert_eq!(live.get(), 0);
    assert!(v.is_empty());

    let d: SegmentedDeque<String, 3> = (0..10).map(|i| i.to_string()).collect();
    let mut a: FixedVec<String, 16> = FixedVec::new();
    let mut b: FixedVec<String, 16> = FixedVec::new();
    unsafe {
        let end = uninit::uninitialized_copy_n(d.position(2), 7, a.as_mut_ptr());
        assert_eq!(end, a.as_mut_ptr().add(7));
        a.set_len(7);
        uninit::uninitialized_move_n(a.as_mut_ptr(), 7, b.as_mut_ptr());
        a.set_len(0);
        uninit::uninitialized_default_n(b.as_mut_ptr().add(7), 2);
        b.set_len(9);
    }
    assert_eq!(b.as_slice(), ["2", "3", "4", "5", "6", "7", "8", "", ""]);
    assert_eq!(d.len(), 10);
}

#[test]
fn retain_panic_keeps_unvisited() {
    let live = Rc::new(Cell::new(0));
    let clones = Rc::new(Cell::new(0));
    let mut v: FixedVec<Tracked, 8> = (0..5).map(|i| Tracked::new(i, &live, &clones)).collect();
    let r = catch_unwind(AssertUnwindSafe(|| {
        v.retain(|t| if t.id == 2 { panic!("predicate") } else { t.id != 0 })
    }));
    assert!(r.is_err());
    let ids: Vec<u32> = v.iter().map(|t| t.id).collect();
    assert_eq!(ids, [1, 2, 3, 4]);
    assert_eq!(live.get(), 4);
    drop(v);
    assert_eq!(live.get(), 0);

    let mut d: SegmentedDeque<Tracked, 2> = (0..5).map(|i| Tracked::new(i, &live, &clones)).collect();
    let r = catch_unwind(AssertUnwindSafe(|| {
        d.retain(|t| if t.id == 2 { panic!("predicate") } else { t.id != 0 })
    }));
    assert!(r.is_err());
    let ids: Vec<u32> = d.iter().map(|t| t.id).collect();
    assert_eq!(ids, [1, 2, 3, 4]);
    assert_eq!(live.get(), 4);
    drop(d);
    assert_eq!(live.get(), 0);
}

#[test]
fn deque_resize_panic_releases_segments() {
    let live = Rc::new(Cell::new(0));
    let clones = Rc::new(Cell::new(3));
    let proto = Tracked::new(99, &live, &clones);
    let mut d: SegmentedDeque<Tracked, 4> = SegmentedDeque::new();
    let r = catch_unwind(AssertUnwindSafe(|| d.resize(100, &proto)));
    assert!(r.is_err());
    assert_eq!(d.len(), 0);
    assert!(d.segment_count() <= 1);
    assert_eq!(live.get(), 1);

    for i in 0..6 {
        d.push_back(Tracked::new(i, &live, &clones));
    }
    clones.set(5);
    let r = catch_unwind(AssertUnwindSafe(|| d.resize(100, &proto)));
    assert!(r.is_err());
    assert_eq!(d.len(), 6);
    assert!(d.segment_count() <= (6 + 3) / 4 + 3);
    assert_eq!(live.get(), 7);
    drop(d);
    assert_eq!(live.get(), 1);
}

#[test]
fn unordered_set_hash_and_insert_with() {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    fn hash_of<T: Hash>(x: &T) -> u64 {
        let mut h = DefaultHasher::new();
        x.hash(&mut h);
        h.finish()
    }
    let a: StaticUnorderedFlatSet<u32, 4> = StaticUnorderedFlatSet::from([3, 1, 2]);
    let b: StaticUnorderedFlatSet<u32, 4> = StaticUnorderedFlatSet::from([2, 3, 1]);
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));

    let mut s: StaticUnorderedFlatSet<String, 2> = StaticUnorderedFlatSet::new();
    let mut built = 0;
    assert_eq!(
        s.insert_with("x", || {
            built += 1;
            "x".to_string()
        })
        .unwrap(),
        (0, true)
    );
    assert_eq!(
        s.insert_with("x", || {
            built += 1;
            "x".to_string()
        })
        .unwrap(),
        (0, false)
    );
    s.insert_with("y", || "y".to_string()).unwrap();
    let e = s.insert_with("z", || {
        built += 1;
        "z".to_string()
    });
    assert_eq!(e.unwrap_err(), Error::CapacityExceeded { capacity: 2 });
    assert_eq!(built, 1);
    assert!(s.contains("y"));
}
