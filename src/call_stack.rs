//! Qubit provenance: the path of module calls that produced a qubit (spec §3, §4.9).
//!
//! Represented as a persistent (structurally shared) singly-linked list rather
//! than a `Vec` that gets cloned: pushing a frame allocates one new node that
//! points at the previous top, so "snapshot the stack, push a frame, use it for
//! this call, then discard it" is just building one `Rc` node and dropping it —
//! sibling calls that later snapshot the pre-push stack are completely
//! unaffected, since the original `Rc` was never mutated.

use std::rc::Rc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallFrame {
    pub target_module: String,
    /// `None` for the seed frame the driver pushes for the entry module.
    pub is_call: Option<bool>,
    pub source_line: Option<usize>,
}

#[derive(Debug)]
pub struct CallStack {
    frame: CallFrame,
    parent: Option<Rc<CallStack>>,
}

impl CallStack {
    /// Starts a new stack with a single frame — the bottom frame always
    /// corresponds to the entry module.
    pub fn seed(frame: CallFrame) -> Rc<CallStack> {
        Rc::new(CallStack { frame, parent: None })
    }

    /// Returns a new, independent stack with `frame` pushed on top of `base`.
    /// `base` itself is left untouched (it's shared, not mutated), so any
    /// other `Rc` clone of it — e.g. one already baked into a sibling's
    /// qubits — keeps seeing the stack as it was.
    pub fn push(base: &Rc<CallStack>, frame: CallFrame) -> Rc<CallStack> {
        Rc::new(CallStack {
            frame,
            parent: Some(Rc::clone(base)),
        })
    }

    pub fn top(&self) -> &CallFrame {
        &self.frame
    }

    /// Frames from bottom (entry module) to top (current).
    pub fn frames(&self) -> Vec<CallFrame> {
        let mut frames = Vec::new();
        let mut node = self;
        loop {
            frames.push(node.frame.clone());
            match &node.parent {
                Some(parent) => node = parent,
                None => break,
            }
        }
        frames.reverse();
        frames
    }

    pub fn depth(&self) -> usize {
        self.frames().len()
    }

    /// True if `self`'s frames are exactly a leading prefix of `other`'s
    /// frames — the provenance-closure invariant from spec §8.
    pub fn is_prefix_of(&self, other: &CallStack) -> bool {
        let mine = self.frames();
        let theirs = other.frames();
        theirs.len() >= mine.len() && theirs[..mine.len()] == mine[..]
    }
}
