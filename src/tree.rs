//! Red-black tree over a pluggable node store.
//!
//! The tree keeps `first` and `last` so that both ends and the end-hinted inserts
//! used when cloning or collecting sorted input are O(1). Values are ordered by the key
//! that `KO` extracts from them, using comparator `C`.
//!
//! Equal keys are allowed by [`RbTree::insert_equal`]: a new value goes after all values
//! with an equal key. [`RbTree::insert_unique`] refuses a value whose key is present.

use crate::compare::{Compare, KeyOf};
use crate::error::InsertError;
use crate::nodes::{Handle, Node, NodeAlloc, FREE, NIL};
use std::{cmp::Ordering, fmt, iter::FusedIterator, marker::PhantomData, ptr};

/// Red-black tree storing `T`, ordered by `KO::key` under `C`, with nodes from `A`.
pub struct RbTree<T, KO, C, A: NodeAlloc<T>> {
    nodes: A,
    root: u32,
    first: u32,
    last: u32,
    len: usize,
    comp: C,
    marker: PhantomData<(fn() -> KO, T)>,
}

/// Reads through the node store. Free functions so iterators can share them.
#[inline]
fn node<T, A: NodeAlloc<T>>(nodes: &A, h: u32) -> &Node<T> {
    safe_assert!((h as usize) < nodes.slot_count());
    unsafe { &*nodes.base().add(h as usize) }
}

#[inline]
fn minimum<T, A: NodeAlloc<T>>(nodes: &A, mut x: u32) -> u32 {
    loop {
        let l = node(nodes, x).left;
        if l == NIL {
            return x;
        }
        x = l;
    }
}

#[inline]
fn maximum<T, A: NodeAlloc<T>>(nodes: &A, mut x: u32) -> u32 {
    loop {
        let r = node(nodes, x).right;
        if r == NIL {
            return x;
        }
        x = r;
    }
}

/// In-order successor, or NIL.
fn successor<T, A: NodeAlloc<T>>(nodes: &A, x: u32) -> u32 {
    let n = node(nodes, x);
    if n.right != NIL {
        return minimum(nodes, n.right);
    }
    let mut x = x;
    let mut p = n.parent;
    while p != NIL && x == node(nodes, p).right {
        x = p;
        p = node(nodes, p).parent;
    }
    p
}

/// In-order predecessor, or NIL.
fn predecessor<T, A: NodeAlloc<T>>(nodes: &A, x: u32) -> u32 {
    let n = node(nodes, x);
    if n.left != NIL {
        return maximum(nodes, n.left);
    }
    let mut x = x;
    let mut p = n.parent;
    while p != NIL && x == node(nodes, p).left {
        x = p;
        p = node(nodes, p).parent;
    }
    p
}

fn some(h: u32) -> Option<Handle> {
    if h == NIL {
        None
    } else {
        Some(Handle(h))
    }
}

fn raw(h: Option<Handle>) -> u32 {
    match h {
        Some(h) => h.0,
        None => NIL,
    }
}

impl<T, KO, C, A> Drop for RbTree<T, KO, C, A>
where
    A: NodeAlloc<T>,
{
    fn drop(&mut self) {
        self.drop_values();
    }
}

impl<T, KO, C, A> RbTree<T, KO, C, A>
where
    KO: KeyOf<T>,
    C: Compare<KO::Key>,
    A: NodeAlloc<T>,
{
    /// Empty tree with comparator `comp` and node store `nodes`.
    pub fn new_in(comp: C, nodes: A) -> Self {
        Self {
            nodes,
            root: NIL,
            first: NIL,
            last: NIL,
            len: 0,
            comp,
            marker: PhantomData,
        }
    }

    /// The comparator.
    pub fn comparator(&self) -> &C {
        &self.comp
    }

    /// The node store.
    pub fn nodes(&self) -> &A {
        &self.nodes
    }

    #[inline]
    fn key_of(&self, h: u32) -> &KO::Key {
        KO::key(self.value(h))
    }

    #[inline]
    fn value(&self, h: u32) -> &T {
        unsafe { node(&self.nodes, h).value.assume_init_ref() }
    }

    #[inline]
    fn n(&self, h: u32) -> &Node<T> {
        node(&self.nodes, h)
    }

    #[inline]
    fn nm(&mut self, h: u32) -> &mut Node<T> {
        safe_assert!((h as usize) < self.nodes.slot_count());
        unsafe { &mut *self.nodes.base_mut().add(h as usize) }
    }

    #[inline]
    fn is_red(&self, h: u32) -> bool {
        h != NIL && self.n(h).red
    }

    fn check_handle(&self, h: Handle) {
        let ok = (h.0 as usize) < self.nodes.slot_count() && self.n(h.0).parent != FREE;
        assert!(ok, "stale or foreign tree handle {h:?}");
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Is the tree empty?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Largest number of elements the node store can hold.
    pub fn max_size(&self) -> usize {
        self.nodes.capacity()
    }

    /// Handle of the least element.
    pub fn first(&self) -> Option<Handle> {
        some(self.first)
    }

    /// Handle of the greatest element.
    pub fn last(&self) -> Option<Handle> {
        some(self.last)
    }

    /// Handle of the element after `h`.
    pub fn next(&self, h: Handle) -> Option<Handle> {
        self.check_handle(h);
        some(successor(&self.nodes, h.0))
    }

    /// Handle of the element before `h`.
    pub fn prev(&self, h: Handle) -> Option<Handle> {
        self.check_handle(h);
        some(predecessor(&self.nodes, h.0))
    }

    /// Element at `h`.
    /// # Panics
    ///
    /// Panics if `h` does not refer to a live element.
    pub fn get(&self, h: Handle) -> &T {
        self.check_handle(h);
        self.value(h.0)
    }

    /// Mutable element at `h`. The caller must not change its key.
    pub(crate) fn get_mut(&mut self, h: Handle) -> &mut T {
        self.check_handle(h);
        unsafe { self.nm(h.0).value.assume_init_mut() }
    }

    /// Index of `h` in iteration order. O(n).
    pub fn index_of(&self, h: Handle) -> usize {
        self.check_handle(h);
        let mut i = 0;
        let mut x = self.first;
        while x != h.0 {
            x = successor(&self.nodes, x);
            i += 1;
        }
        i
    }

    /// Handle of the `i`th element in iteration order. O(i).
    pub fn nth(&self, i: usize) -> Option<Handle> {
        if i >= self.len {
            return None;
        }
        let mut x = self.first;
        for _ in 0..i {
            x = successor(&self.nodes, x);
        }
        some(x)
    }

    /// First element whose key is not less than `q`.
    pub fn lower_bound<Q: ?Sized>(&self, q: &Q) -> Option<Handle>
    where
        C: Compare<KO::Key, Q>,
    {
        let mut x = self.root;
        let mut y = NIL;
        while x != NIL {
            if self.comp.compare(self.key_of(x), q) == Ordering::Less {
                x = self.n(x).right;
            } else {
                y = x;
                x = self.n(x).left;
            }
        }
        some(y)
    }

    /// First element whose key is greater than `q`.
    pub fn upper_bound<Q: ?Sized>(&self, q: &Q) -> Option<Handle>
    where
        C: Compare<KO::Key, Q>,
    {
        let mut x = self.root;
        let mut y = NIL;
        while x != NIL {
            if self.comp.compare(self.key_of(x), q) == Ordering::Greater {
                y = x;
                x = self.n(x).left;
            } else {
                x = self.n(x).right;
            }
        }
        some(y)
    }

    /// An element with key equal to `q` (the first such).
    pub fn find<Q: ?Sized>(&self, q: &Q) -> Option<Handle>
    where
        C: Compare<KO::Key, Q>,
    {
        let h = self.lower_bound(q)?;
        if self.comp.compare(self.key_of(h.0), q) == Ordering::Equal {
            Some(h)
        } else {
            None
        }
    }

    /// Iterator over the elements with key equal to `q`.
    pub fn equal_range<Q: ?Sized>(&self, q: &Q) -> Iter<'_, T, A>
    where
        C: Compare<KO::Key, Q>,
    {
        let lo = raw(self.lower_bound(q));
        let hi = raw(self.upper_bound(q));
        self.range_raw(lo, hi)
    }

    /// Number of elements with key equal to `q`.
    pub fn count<Q: ?Sized>(&self, q: &Q) -> usize
    where
        C: Compare<KO::Key, Q>,
    {
        self.equal_range(q).len()
    }

    /// Iterator over `[from, to)` where `to == NIL` means the end.
    fn range_raw(&self, from: u32, to: u32) -> Iter<'_, T, A> {
        let mut n = 0;
        let mut back = NIL;
        let mut x = from;
        while x != to {
            back = x;
            x = successor(&self.nodes, x);
            n += 1;
        }
        Iter {
            nodes: &self.nodes,
            front: from,
            back,
            remaining: n,
            marker: PhantomData,
        }
    }

    /// Iterator over elements from handle `from` up to but excluding `to` (`None` = end).
    pub fn range(&self, from: Option<Handle>, to: Option<Handle>) -> Iter<'_, T, A> {
        for h in [from, to].into_iter().flatten() {
            self.check_handle(h);
        }
        self.range_raw(raw(from), raw(to))
    }

    /// Iterator over all elements in order.
    pub fn iter(&self) -> Iter<'_, T, A> {
        Iter {
            nodes: &self.nodes,
            front: self.first,
            back: self.last,
            remaining: self.len,
            marker: PhantomData,
        }
    }

    /// Iterator over all elements in order, with mutable access. The caller must not
    /// change keys.
    pub(crate) fn iter_mut(&mut self) -> IterMut<'_, T, A> {
        IterMut {
            base: self.nodes.base_mut(),
            front: self.first,
            back: self.last,
            remaining: self.len,
            marker: PhantomData,
        }
    }

    fn rotate_left(&mut self, x: u32) {
        let y = self.n(x).right;
        let yl = self.n(y).left;
        self.nm(x).right = yl;
        if yl != NIL {
            self.nm(yl).parent = x;
        }
        let xp = self.n(x).parent;
        self.nm(y).parent = xp;
        if xp == NIL {
            self.root = y;
        } else if x == self.n(xp).left {
            self.nm(xp).left = y;
        } else {
            self.nm(xp).right = y;
        }
        self.nm(y).left = x;
        self.nm(x).parent = y;
    }

    fn rotate_right(&mut self, x: u32) {
        let y = self.n(x).left;
        let yr = self.n(y).right;
        self.nm(x).left = yr;
        if yr != NIL {
            self.nm(yr).parent = x;
        }
        let xp = self.n(x).parent;
        self.nm(y).parent = xp;
        if xp == NIL {
            self.root = y;
        } else if x == self.n(xp).right {
            self.nm(xp).right = y;
        } else {
            self.nm(xp).left = y;
        }
        self.nm(y).right = x;
        self.nm(x).parent = y;
    }

    fn insert_fixup(&mut self, mut z: u32) {
        while z != self.root && self.is_red(self.n(z).parent) {
            let p = self.n(z).parent;
            let g = self.n(p).parent;
            if p == self.n(g).left {
                let u = self.n(g).right;
                if self.is_red(u) {
                    self.nm(p).red = false;
                    self.nm(u).red = false;
                    self.nm(g).red = true;
                    z = g;
                } else {
                    if z == self.n(p).right {
                        z = p;
                        self.rotate_left(z);
                    }
                    let p = self.n(z).parent;
                    let g = self.n(p).parent;
                    self.nm(p).red = false;
                    self.nm(g).red = true;
                    self.rotate_right(g);
                }
            } else {
                let u = self.n(g).left;
                if self.is_red(u) {
                    self.nm(p).red = false;
                    self.nm(u).red = false;
                    self.nm(g).red = true;
                    z = g;
                } else {
                    if z == self.n(p).left {
                        z = p;
                        self.rotate_right(z);
                    }
                    let p = self.n(z).parent;
                    let g = self.n(p).parent;
                    self.nm(p).red = false;
                    self.nm(g).red = true;
                    self.rotate_left(g);
                }
            }
        }
        let r = self.root;
        self.nm(r).red = false;
    }

    /// Allocate a node for `value` and attach it as the `left` or right child of `parent`
    /// (the root if `parent` is NIL).
    fn link(&mut self, value: T, parent: u32, left: bool) -> Result<Handle, InsertError<T>> {
        let z = match self.nodes.allocate(Node::new(value, parent)) {
            Ok(z) => z,
            Err(e) => {
                let (error, node) = e.into_parts();
                return Err(InsertError::new(error, node.into_value()));
            }
        };
        if parent == NIL {
            self.root = z;
            self.first = z;
            self.last = z;
        } else if left {
            self.nm(parent).left = z;
            if parent == self.first {
                self.first = z;
            }
        } else {
            self.nm(parent).right = z;
            if parent == self.last {
                self.last = z;
            }
        }
        self.insert_fixup(z);
        self.len += 1;
        Ok(Handle(z))
    }

    /// Insert after all elements with an equal key.
    pub fn insert_equal(&mut self, value: T) -> Result<Handle, InsertError<T>> {
        let (parent, left) = self.equal_pos(KO::key(&value));
        self.link(value, parent, left)
    }

    fn equal_pos(&self, k: &KO::Key) -> (u32, bool) {
        let mut x = self.root;
        let mut y = NIL;
        let mut left = true;
        while x != NIL {
            y = x;
            left = self.comp.less(k, self.key_of(x));
            x = if left { self.n(x).left } else { self.n(x).right };
        }
        (y, left)
    }

    /// Where a unique insert of `k` would attach, or `Err` with the element holding `k`.
    fn unique_pos(&self, k: &KO::Key) -> Result<(u32, bool), u32> {
        let (y, left) = self.equal_pos(k);
        if y == NIL {
            return Ok((NIL, true));
        }
        let mut j = y;
        if left {
            if j == self.first {
                return Ok((y, true));
            }
            j = predecessor(&self.nodes, j);
        }
        if self.comp.less(self.key_of(j), k) {
            Ok((y, left))
        } else {
            Err(j)
        }
    }

    /// Insert unless an element with an equal key exists. On a duplicate the value is
    /// handed back with the handle of the existing element.
    pub fn insert_unique(&mut self, value: T) -> Result<(Handle, Option<T>), InsertError<T>> {
        match self.unique_pos(KO::key(&value)) {
            Ok((parent, left)) => Ok((self.link(value, parent, left)?, None)),
            Err(j) => Ok((Handle(j), Some(value))),
        }
    }

    /// Attachment point for `k` right before `hint` (`NIL` = end), if that keeps order
    /// with duplicates allowed.
    fn hint_equal_pos(&self, hint: u32, k: &KO::Key) -> Option<(u32, bool)> {
        if hint == NIL {
            if self.len > 0 && !self.comp.less(k, self.key_of(self.last)) {
                return Some((self.last, false));
            }
            return None;
        }
        if !self.comp.less(self.key_of(hint), k) {
            // k <= hint
            if hint == self.first {
                return Some((hint, true));
            }
            let before = predecessor(&self.nodes, hint);
            if !self.comp.less(k, self.key_of(before)) {
                return Some(if self.n(before).right == NIL {
                    (before, false)
                } else {
                    (hint, true)
                });
            }
            return None;
        }
        // hint < k
        if hint == self.last {
            return Some((hint, false));
        }
        let after = successor(&self.nodes, hint);
        if !self.comp.less(self.key_of(after), k) {
            return Some(if self.n(hint).right == NIL {
                (hint, false)
            } else {
                (after, true)
            });
        }
        None
    }

    /// Insert as close as possible before `hint` (`None` = end). A correct hint costs O(1)
    /// amortised, otherwise this is a normal [`RbTree::insert_equal`].
    pub fn insert_hint_equal(&mut self, hint: Option<Handle>, value: T) -> Result<Handle, InsertError<T>> {
        if let Some(h) = hint {
            self.check_handle(h);
        }
        match self.hint_equal_pos(raw(hint), KO::key(&value)) {
            Some((parent, left)) => self.link(value, parent, left),
            None => self.insert_equal(value),
        }
    }

    fn hint_unique_pos(&self, hint: u32, k: &KO::Key) -> Option<Result<(u32, bool), u32>> {
        if hint == NIL {
            if self.len > 0 && self.comp.less(self.key_of(self.last), k) {
                return Some(Ok((self.last, false)));
            }
            return None;
        }
        if self.comp.less(k, self.key_of(hint)) {
            if hint == self.first {
                return Some(Ok((hint, true)));
            }
            let before = predecessor(&self.nodes, hint);
            if self.comp.less(self.key_of(before), k) {
                return Some(Ok(if self.n(before).right == NIL {
                    (before, false)
                } else {
                    (hint, true)
                }));
            }
            return None;
        }
        if self.comp.less(self.key_of(hint), k) {
            if hint == self.last {
                return Some(Ok((hint, false)));
            }
            let after = successor(&self.nodes, hint);
            if self.comp.less(k, self.key_of(after)) {
                return Some(Ok(if self.n(hint).right == NIL {
                    (hint, false)
                } else {
                    (after, true)
                }));
            }
            return None;
        }
        Some(Err(hint))
    }

    /// Unique insert near `hint` (`None` = end).
    pub fn insert_hint_unique(
        &mut self,
        hint: Option<Handle>,
        value: T,
    ) -> Result<(Handle, Option<T>), InsertError<T>> {
        if let Some(h) = hint {
            self.check_handle(h);
        }
        let pos = match self.hint_unique_pos(raw(hint), KO::key(&value)) {
            Some(pos) => pos,
            None => self.unique_pos(KO::key(&value)),
        };
        match pos {
            Ok((parent, left)) => Ok((self.link(value, parent, left)?, None)),
            Err(j) => Ok((Handle(j), Some(value))),
        }
    }

    fn transplant(&mut self, u: u32, v: u32) {
        let up = self.n(u).parent;
        if up == NIL {
            self.root = v;
        } else if u == self.n(up).left {
            self.nm(up).left = v;
        } else {
            self.nm(up).right = v;
        }
        if v != NIL {
            self.nm(v).parent = up;
        }
    }

    fn erase_fixup(&mut self, mut x: u32, mut xp: u32) {
        while x != self.root && !self.is_red(x) {
            if x == self.n(xp).left {
                let mut w = self.n(xp).right;
                if self.is_red(w) {
                    self.nm(w).red = false;
                    self.nm(xp).red = true;
                    self.rotate_left(xp);
                    w = self.n(xp).right;
                }
                if !self.is_red(self.n(w).left) && !self.is_red(self.n(w).right) {
                    self.nm(w).red = true;
                    x = xp;
                    xp = self.n(x).parent;
                } else {
                    if !self.is_red(self.n(w).right) {
                        let wl = self.n(w).left;
                        self.nm(wl).red = false;
                        self.nm(w).red = true;
                        self.rotate_right(w);
                        w = self.n(xp).right;
                    }
                    self.nm(w).red = self.n(xp).red;
                    self.nm(xp).red = false;
                    let wr = self.n(w).right;
                    self.nm(wr).red = false;
                    self.rotate_left(xp);
                    x = self.root;
                    break;
                }
            } else {
                let mut w = self.n(xp).left;
                if self.is_red(w) {
                    self.nm(w).red = false;
                    self.nm(xp).red = true;
                    self.rotate_right(xp);
                    w = self.n(xp).left;
                }
                if !self.is_red(self.n(w).right) && !self.is_red(self.n(w).left) {
                    self.nm(w).red = true;
                    x = xp;
                    xp = self.n(x).parent;
                } else {
                    if !self.is_red(self.n(w).left) {
                        let wr = self.n(w).right;
                        self.nm(wr).red = false;
                        self.nm(w).red = true;
                        self.rotate_left(w);
                        w = self.n(xp).left;
                    }
                    self.nm(w).red = self.n(xp).red;
                    self.nm(xp).red = false;
                    let wl = self.n(w).left;
                    self.nm(wl).red = false;
                    self.rotate_right(xp);
                    x = self.root;
                    break;
                }
            }
        }
        if x != NIL {
            self.nm(x).red = false;
        }
    }

    /// Remove the element at `h` and return it. Other handles stay valid.
    /// # Panics
    ///
    /// Panics if `h` does not refer to a live element.
    pub fn erase(&mut self, h: Handle) -> T {
        self.check_handle(h);
        let z = h.0;
        if z == self.first {
            self.first = successor(&self.nodes, z);
        }
        if z == self.last {
            self.last = predecessor(&self.nodes, z);
        }
        let (zl, zr) = (self.n(z).left, self.n(z).right);
        let mut y_red = self.n(z).red;
        let x;
        let xp;
        if zl == NIL {
            x = zr;
            xp = self.n(z).parent;
            self.transplant(z, zr);
        } else if zr == NIL {
            x = zl;
            xp = self.n(z).parent;
            self.transplant(z, zl);
        } else {
            // Splice in the successor node itself, so its handle is unchanged.
            let y = minimum(&self.nodes, zr);
            y_red = self.n(y).red;
            x = self.n(y).right;
            if self.n(y).parent == z {
                xp = y;
            } else {
                xp = self.n(y).parent;
                self.transplant(y, x);
                self.nm(y).right = zr;
                self.nm(zr).parent = y;
            }
            self.transplant(z, y);
            self.nm(y).left = zl;
            self.nm(zl).parent = y;
            self.nm(y).red = self.n(z).red;
        }
        if !y_red {
            self.erase_fixup(x, xp);
        }
        self.len -= 1;
        unsafe {
            let value = ptr::read(self.n(z).value.as_ptr());
            self.nodes.release(z);
            value
        }
    }

    /// Remove every element with key equal to `q`, returning how many were removed.
    pub fn erase_key<Q: ?Sized>(&mut self, q: &Q) -> usize
    where
        C: Compare<KO::Key, Q>,
    {
        let mut n = 0;
        let mut x = raw(self.lower_bound(q));
        while x != NIL && self.comp.compare(self.key_of(x), q) == Ordering::Equal {
            let next = successor(&self.nodes, x);
            drop(self.erase(Handle(x)));
            x = next;
            n += 1;
        }
        n
    }

    /// Remove the elements from `from` up to but excluding `to` (`None` = end), returning
    /// the handle after the removed range.
    pub fn erase_range(&mut self, from: Option<Handle>, to: Option<Handle>) -> Option<Handle> {
        if let Some(t) = to {
            self.check_handle(t);
        }
        let to = raw(to);
        let mut x = raw(from);
        while x != to && x != NIL {
            let next = successor(&self.nodes, x);
            drop(self.erase(Handle(x)));
            x = next;
        }
        some(to)
    }

    /// Keep only the elements for which `f` returns true.
    pub fn retain<F: FnMut(&T) -> bool>(&mut self, mut f: F) -> usize {
        let mut n = 0;
        let mut x = self.first;
        while x != NIL {
            let next = successor(&self.nodes, x);
            if !f(self.value(x)) {
                drop(self.erase(Handle(x)));
                n += 1;
            }
            x = next;
        }
        n
    }

    /// Remove and return the least element.
    pub fn pop_first(&mut self) -> Option<T> {
        let h = self.first()?;
        Some(self.erase(h))
    }

    /// Remove and return the greatest element.
    pub fn pop_last(&mut self) -> Option<T> {
        let h = self.last()?;
        Some(self.erase(h))
    }

    /// Append `value` after the last element without comparing.
    /// The caller guarantees it does not sort before the last element.
    pub(crate) fn push_last(&mut self, value: T) -> Result<Handle, InsertError<T>> {
        let last = self.last;
        self.link(value, last, last == NIL)
    }

    /// Check the red-black and ordering invariants, panicking on a violation.
    #[cfg(test)]
    pub(crate) fn check(&self) {
        fn black_height<T, KO, C, A>(t: &RbTree<T, KO, C, A>, x: u32, parent: u32) -> usize
        where
            KO: KeyOf<T>,
            C: Compare<KO::Key>,
            A: NodeAlloc<T>,
        {
            if x == NIL {
                return 1;
            }
            let n = t.n(x);
            assert_eq!(n.parent, parent, "parent link");
            if n.red {
                assert!(!t.is_red(n.left) && !t.is_red(n.right), "red node with red child");
            }
            let l = black_height(t, n.left, x);
            let r = black_height(t, n.right, x);
            assert_eq!(l, r, "black height");
            l + usize::from(!n.red)
        }
        assert!(!self.is_red(self.root), "red root");
        black_height(self, self.root, NIL);
        let mut n = 0;
        let mut prev = NIL;
        let mut x = self.first;
        while x != NIL {
            if prev != NIL {
                assert!(!self.comp.less(self.key_of(x), self.key_of(prev)), "order");
            }
            prev = x;
            x = successor(&self.nodes, x);
            n += 1;
        }
        assert_eq!(n, self.len, "len");
        assert_eq!(prev, self.last, "last");
        if self.root != NIL {
            assert_eq!(self.first, minimum(&self.nodes, self.root), "first");
        }
    }
}

impl<T, KO, C, A: NodeAlloc<T>> RbTree<T, KO, C, A> {
    /// Drop every value, leaving the store holding dead slots.
    fn drop_values(&mut self) {
        let mut x = self.first;
        let len = self.len;
        self.first = NIL;
        self.last = NIL;
        self.root = NIL;
        self.len = 0;
        for _ in 0..len {
            let next = successor(&self.nodes, x);
            unsafe {
                let p = self.nodes.base_mut().add(x as usize);
                ptr::drop_in_place((*p).value.as_mut_ptr());
            }
            x = next;
        }
    }

    /// Remove all elements.
    pub fn clear(&mut self) {
        self.drop_values();
        self.nodes.reset();
    }
}

impl<T: Clone, KO, C, A> Clone for RbTree<T, KO, C, A>
where
    KO: KeyOf<T>,
    C: Compare<KO::Key> + Clone,
    A: NodeAlloc<T> + Default,
{
    /// # Panics
    ///
    /// Panics if the node store fails, which cannot happen for a store of the same capacity.
    fn clone(&self) -> Self {
        let mut t = Self::new_in(self.comp.clone(), A::default());
        for v in self.iter() {
            if let Err(e) = t.push_last(v.clone()) {
                panic!("RbTree::clone: {}", e.error());
            }
        }
        t
    }
}

impl<T: fmt::Debug, KO, C, A: NodeAlloc<T>> fmt::Debug for RbTree<T, KO, C, A>
where
    KO: KeyOf<T>,
    C: Compare<KO::Key>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Iterator over a tree in key order.
pub struct Iter<'a, T, A: NodeAlloc<T>> {
    nodes: &'a A,
    front: u32,
    back: u32,
    remaining: usize,
    marker: PhantomData<&'a T>,
}

impl<T, A: NodeAlloc<T>> Clone for Iter<'_, T, A> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
            marker: PhantomData,
        }
    }
}

impl<'a, T, A: NodeAlloc<T>> Iter<'a, T, A> {
    /// Handle of the next element from the front.
    pub fn peek_handle(&self) -> Option<Handle> {
        if self.remaining == 0 {
            None
        } else {
            some(self.front)
        }
    }
}

impl<'a, T, A: NodeAlloc<T>> Iterator for Iter<'a, T, A> {
    type Item = &'a T;
    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let x = self.front;
        self.remaining -= 1;
        if self.remaining > 0 {
            self.front = successor(self.nodes, x);
        }
        Some(unsafe { node(self.nodes, x).value.assume_init_ref() })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T, A: NodeAlloc<T>> DoubleEndedIterator for Iter<'a, T, A> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let x = self.back;
        self.remaining -= 1;
        if self.remaining > 0 {
            self.back = predecessor(self.nodes, x);
        }
        Some(unsafe { node(self.nodes, x).value.assume_init_ref() })
    }
}

impl<T, A: NodeAlloc<T>> ExactSizeIterator for Iter<'_, T, A> {}
impl<T, A: NodeAlloc<T>> FusedIterator for Iter<'_, T, A> {}

/// Mutable iterator over a tree in key order. Links are read through the raw base
/// pointer so that yielded references never overlap a read.
pub(crate) struct IterMut<'a, T, A: NodeAlloc<T>> {
    base: *mut Node<T>,
    front: u32,
    back: u32,
    remaining: usize,
    marker: PhantomData<(&'a mut T, &'a mut A)>,
}

impl<T, A: NodeAlloc<T>> IterMut<'_, T, A> {
    unsafe fn step(&self, x: u32, forward: bool) -> u32 {
        unsafe {
            let link = |h: u32, right: bool| {
                let n = self.base.add(h as usize);
                if right {
                    (*n).right
                } else {
                    (*n).left
                }
            };
            let parent = |h: u32| (*self.base.add(h as usize)).parent;
            let down = link(x, forward);
            if down != NIL {
                let mut y = down;
                loop {
                    let z = link(y, !forward);
                    if z == NIL {
                        return y;
                    }
                    y = z;
                }
            }
            let mut x = x;
            let mut p = parent(x);
            while p != NIL && x == link(p, forward) {
                x = p;
                p = parent(p);
            }
            p
        }
    }
}

impl<'a, T, A: NodeAlloc<T>> Iterator for IterMut<'a, T, A> {
    type Item = &'a mut T;
    fn next(&mut self) -> Option<&'a mut T> {
        if self.remaining == 0 {
            return None;
        }
        let x = self.front;
        self.remaining -= 1;
        unsafe {
            if self.remaining > 0 {
                self.front = self.step(x, true);
            }
            Some(&mut *(*self.base.add(x as usize)).value.as_mut_ptr())
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T, A: NodeAlloc<T>> DoubleEndedIterator for IterMut<'a, T, A> {
    fn next_back(&mut self) -> Option<&'a mut T> {
        if self.remaining == 0 {
            return None;
        }
        let x = self.back;
        self.remaining -= 1;
        unsafe {
            if self.remaining > 0 {
                self.back = self.step(x, false);
            }
            Some(&mut *(*self.base.add(x as usize)).value.as_mut_ptr())
        }
    }
}

impl<T, A: NodeAlloc<T>> ExactSizeIterator for IterMut<'_, T, A> {}

/// Consuming iterator.
pub struct IntoIter<T, KO, C, A: NodeAlloc<T>>(RbTree<T, KO, C, A>);

impl<T, KO, C, A> IntoIterator for RbTree<T, KO, C, A>
where
    KO: KeyOf<T>,
    C: Compare<KO::Key>,
    A: NodeAlloc<T>,
{
    type Item = T;
    type IntoIter = IntoIter<T, KO, C, A>;
    fn into_iter(self) -> IntoIter<T, KO, C, A> {
        IntoIter(self)
    }
}

impl<T, KO, C, A> Iterator for IntoIter<T, KO, C, A>
where
    KO: KeyOf<T>,
    C: Compare<KO::Key>,
    A: NodeAlloc<T>,
{
    type Item = T;
    fn next(&mut self) -> Option<T> {
        self.0.pop_first()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.0.len, Some(self.0.len))
    }
}

impl<T, KO, C, A> DoubleEndedIterator for IntoIter<T, KO, C, A>
where
    KO: KeyOf<T>,
    C: Compare<KO::Key>,
    A: NodeAlloc<T>,
{
    fn next_back(&mut self) -> Option<T> {
        self.0.pop_last()
    }
}

impl<T, KO, C, A> ExactSizeIterator for IntoIter<T, KO, C, A>
where
    KO: KeyOf<T>,
    C: Compare<KO::Key>,
    A: NodeAlloc<T>,
{
}
