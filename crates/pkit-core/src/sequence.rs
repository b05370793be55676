//! Ordered result sequence backed by an index-stable arena.
//!
//! Nodes live in a vector and are linked by index. Removing a node repairs
//! both neighbours in O(1) and puts its slot on a free list. Callers only ever
//! see opaque [`Position`]s.

use std::cmp::Ordering;

/// Opaque handle to an element of a [`ResultSequence`].
///
/// A position is invalidated when its element is removed; using it afterwards
/// yields `None` rather than another element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    index: usize,
    generation: u32,
}

#[derive(Debug)]
struct Node<T> {
    value: Option<T>,
    generation: u32,
    prev: Option<usize>,
    next: Option<usize>,
}

#[derive(Debug)]
pub struct ResultSequence<T> {
    nodes: Vec<Node<T>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> Default for ResultSequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ResultSequence<T> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn position(&self, index: usize) -> Position {
        Position {
            index,
            generation: self.nodes[index].generation,
        }
    }

    fn live(&self, pos: Position) -> Option<&Node<T>> {
        self.nodes
            .get(pos.index)
            .filter(|n| n.generation == pos.generation && n.value.is_some())
    }

    fn value(&self, index: usize) -> &T {
        match &self.nodes[index].value {
            Some(value) => value,
            None => unreachable!("linked node {index} has no value"),
        }
    }

    pub fn push_back(&mut self, value: T) -> Position {
        let index = match self.free.pop() {
            Some(index) => {
                let node = &mut self.nodes[index];
                node.value = Some(value);
                node.prev = self.tail;
                node.next = None;
                index
            }
            None => {
                self.nodes.push(Node {
                    value: Some(value),
                    generation: 0,
                    prev: self.tail,
                    next: None,
                });
                self.nodes.len() - 1
            }
        };

        match self.tail {
            Some(tail) => self.nodes[tail].next = Some(index),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.len += 1;

        self.position(index)
    }

    pub fn first(&self) -> Option<Position> {
        self.head.map(|index| self.position(index))
    }

    pub fn next(&self, pos: Position) -> Option<Position> {
        self.live(pos)?.next.map(|index| self.position(index))
    }

    pub fn get(&self, pos: Position) -> Option<&T> {
        self.live(pos)?.value.as_ref()
    }

    /// Removes the element at `pos` and returns the position following it.
    pub fn remove(&mut self, pos: Position) -> Option<Position> {
        self.take(pos).and_then(|(_, next)| next)
    }

    /// Removes the element at `pos`, returning it with the position following it.
    pub fn take(&mut self, pos: Position) -> Option<(T, Option<Position>)> {
        self.live(pos)?;

        let node = &mut self.nodes[pos.index];
        let value = node.value.take()?;
        let (prev, next) = (node.prev.take(), node.next.take());
        node.generation = node.generation.wrapping_add(1);

        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }

        self.free.push(pos.index);
        self.len -= 1;

        Some((value, next.map(|index| self.position(index))))
    }

    /// Removes every element for which `keep` returns false, preserving order.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&T) -> bool,
    {
        let mut cursor = self.first();
        while let Some(pos) = cursor {
            cursor = match self.get(pos) {
                Some(value) if !keep(value) => self.remove(pos),
                _ => self.next(pos),
            };
        }
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            seq: self,
            cursor: self.head,
        }
    }

    /// Stable two-way merge.
    ///
    /// The left element is taken whenever `cmp(left, right)` is not
    /// [`Ordering::Greater`], so ties keep `self` first. Nodes of `other` are
    /// moved into this arena and relinked; no value is cloned.
    pub fn merge_by<F>(mut self, mut other: Self, mut cmp: F) -> Self
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        if other.is_empty() {
            return self;
        }
        if self.is_empty() {
            return other;
        }

        let offset = self.nodes.len();
        let shift = |link: Option<usize>| link.map(|i| i + offset);
        let (other_head, other_tail) = (shift(other.head), shift(other.tail));

        self.free.extend(other.free.drain(..).map(|i| i + offset));
        self.nodes.extend(other.nodes.drain(..).map(|node| {
            Node {
                value: node.value,
                generation: node.generation,
                prev: shift(node.prev),
                next: shift(node.next),
            }
        }));

        let mut left = self.head;
        let mut right = other_head;
        let mut head = None;
        let mut last: Option<usize> = None;

        while let (Some(l), Some(r)) = (left, right) {
            let picked = if cmp(self.value(l), self.value(r)) != Ordering::Greater {
                left = self.nodes[l].next;
                l
            } else {
                right = self.nodes[r].next;
                r
            };

            self.nodes[picked].prev = last;
            match last {
                Some(prev) => self.nodes[prev].next = Some(picked),
                None => head = Some(picked),
            }
            last = Some(picked);
        }

        let (rest, tail) = match (left, right) {
            (Some(l), _) => (l, self.tail),
            (None, Some(r)) => (r, other_tail),
            (None, None) => unreachable!("merge loop consumes one side at a time"),
        };
        self.nodes[rest].prev = last;
        if let Some(prev) = last {
            self.nodes[prev].next = Some(rest);
        }

        self.head = head.or(Some(rest));
        self.tail = tail;
        self.len += other.len;
        self
    }
}

impl<T> FromIterator<T> for ResultSequence<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut seq = Self::new();
        seq.extend(iter);
        seq
    }
}

impl<T> Extend<T> for ResultSequence<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

pub struct Iter<'a, T> {
    seq: &'a ResultSequence<T>,
    cursor: Option<usize>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        self.cursor = self.seq.nodes[index].next;
        Some(self.seq.value(index))
    }
}

impl<'a, T> IntoIterator for &'a ResultSequence<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

pub struct IntoIter<T> {
    seq: ResultSequence<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let first = self.seq.first()?;
        self.seq.take(first).map(|(value, _)| value)
    }
}

impl<T> IntoIterator for ResultSequence<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            seq: self,
        }
    }
}
