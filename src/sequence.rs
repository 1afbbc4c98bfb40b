/// Arena-backed doubly linked list of byte fragments.
///
/// Nodes live in parallel vectors indexed by [`Handle`]; links are indices
/// with `NIL` marking a boundary.  Removal only unlinks and clears the
/// liveness flag, so storage grows monotonically until the whole sequence
/// is dropped and a handle is never reissued.
use std::fmt;

use crate::error::{Error, Result};

const NIL: usize = usize::MAX;

/// Stable identifier of a node.  Handles are issued in append order, so a
/// smaller handle always sits further left in the original input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(usize);

impl Handle {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub struct Sequence {
    parts: Vec<Vec<u8>>,
    next: Vec<usize>,
    prev: Vec<usize>,
    alive: Vec<bool>,
    head: usize,
    tail: usize,
    live: usize,
}

impl Default for Sequence {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Sequence {
            parts: Vec::with_capacity(n),
            next: Vec::with_capacity(n),
            prev: Vec::with_capacity(n),
            alive: Vec::with_capacity(n),
            head: NIL,
            tail: NIL,
            live: 0,
        }
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn append(&mut self, content: impl Into<Vec<u8>>) -> Handle {
        let i = self.parts.len();
        self.parts.push(content.into());
        self.next.push(NIL);
        self.prev.push(self.tail);
        self.alive.push(true);
        if self.tail == NIL {
            self.head = i;
        } else {
            self.next[self.tail] = i;
        }
        self.tail = i;
        self.live += 1;
        Handle(i)
    }

    pub fn contains(&self, h: Handle) -> bool {
        self.alive.get(h.0).copied().unwrap_or(false)
    }

    pub fn get(&self, h: Handle) -> Result<&[u8]> {
        self.check(h)?;
        Ok(&self.parts[h.0])
    }

    pub fn set(&mut self, h: Handle, content: impl Into<Vec<u8>>) -> Result<()> {
        self.check(h)?;
        self.parts[h.0] = content.into();
        Ok(())
    }

    pub fn prev(&self, h: Handle) -> Result<Option<Handle>> {
        self.check(h)?;
        Ok(link(self.prev[h.0]))
    }

    pub fn next(&self, h: Handle) -> Result<Option<Handle>> {
        self.check(h)?;
        Ok(link(self.next[h.0]))
    }

    pub fn head(&self) -> Option<Handle> {
        link(self.head)
    }

    /// Unlinks `h`, joining its neighbours.  The slot keeps its content but
    /// the handle is dead for good.
    pub fn remove(&mut self, h: Handle) -> Result<()> {
        self.check(h)?;
        let (p, n) = (self.prev[h.0], self.next[h.0]);
        if p == NIL {
            self.head = n;
        } else {
            self.next[p] = n;
        }
        if n == NIL {
            self.tail = p;
        } else {
            self.prev[n] = p;
        }
        self.alive[h.0] = false;
        self.live -= 1;
        Ok(())
    }

    /// Live handles from head to tail.
    pub fn handles(&self) -> Handles<'_> {
        Handles {
            seq: self,
            cur: self.head,
        }
    }

    fn check(&self, h: Handle) -> Result<()> {
        if self.contains(h) {
            Ok(())
        } else {
            Err(Error::InvalidHandle(h))
        }
    }
}

pub struct Handles<'a> {
    seq: &'a Sequence,
    cur: usize,
}

impl Iterator for Handles<'_> {
    type Item = Handle;

    fn next(&mut self) -> Option<Handle> {
        let h = link(self.cur)?;
        self.cur = self.seq.next[h.0];
        Some(h)
    }
}

#[inline]
fn link(i: usize) -> Option<Handle> {
    if i == NIL {
        None
    } else {
        Some(Handle(i))
    }
}
