//! LIFO pool of scratch values for expression evaluation
//!
//! The evaluator reserves a destination slot per operator node, evaluates
//! the children into deeper slots, computes, then rolls the watermark back
//! past its own slot. `save_pos`/`restore_pos` bracket whole statement
//! evaluations so every reservation is released on every control-flow path.
//!
//! Slots keep their buffers between uses, so steady-state evaluation does
//! no heap allocation. A pool belongs to exactly one executing context;
//! it is never shared across threads.

use crate::value::Value;

pub struct ValuePool {
    slots: Vec<Value>,
    pos: usize,
    saved: Vec<usize>,
}

impl Default for ValuePool {
    fn default() -> Self {
        Self::new()
    }
}

/// Read access to the slots above a reserved destination, handed out by
/// [`ValuePool::dst_split`].
pub struct PoolView<'a> {
    tail: &'a [Value],
    offset: usize,
}

impl<'a> PoolView<'a> {
    /// The slot at pool index `i`, which must lie above the destination.
    pub fn slot(&self, i: usize) -> &'a Value {
        &self.tail[i - self.offset]
    }
}

impl ValuePool {
    pub fn new() -> Self {
        ValuePool {
            slots: Vec::new(),
            pos: 0,
            saved: Vec::new(),
        }
    }

    /// Reserves the next slot and returns its index.
    pub fn get(&mut self) -> usize {
        if self.pos == self.slots.len() {
            self.slots.push(Value::default());
        }
        let idx = self.pos;
        self.pos += 1;
        idx
    }

    /// Releases the most recent slot.
    pub fn free(&mut self) {
        if self.pos == 0 {
            panic!("value pool: underflow: free without a matching get");
        }
        self.pos -= 1;
    }

    /// The current watermark.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Rolls the watermark back to an earlier snapshot.
    pub fn set_pos(&mut self, pos: usize) {
        if pos > self.pos {
            panic!("value pool: watermark moved forward: unbalanced evaluation");
        }
        self.pos = pos;
    }

    /// Pushes the current watermark on the save stack.
    pub fn save_pos(&mut self) {
        self.saved.push(self.pos);
    }

    /// Pops the save stack and restores that watermark.
    pub fn restore_pos(&mut self) {
        let pos = self
            .saved
            .pop()
            .expect("value pool: restore without a matching save");
        self.set_pos(pos);
    }

    pub fn value(&self, idx: usize) -> &Value {
        &self.slots[idx]
    }

    pub fn value_mut(&mut self, idx: usize) -> &mut Value {
        &mut self.slots[idx]
    }

    /// Simultaneous access to two distinct slots: `src` read-only, `dst`
    /// mutable.
    pub fn pair_mut(&mut self, src: usize, dst: usize) -> (&Value, &mut Value) {
        assert_ne!(src, dst, "value pool: aliasing slot access");
        if src < dst {
            let (head, tail) = self.slots.split_at_mut(dst);
            (&head[src], &mut tail[0])
        } else {
            let (head, tail) = self.slots.split_at_mut(src);
            (&tail[0], &mut head[dst])
        }
    }

    /// Splits the pool at a reserved destination: the destination slot
    /// mutably, plus read access to every slot above it. Operand slots are
    /// always reserved after (hence above) their destination.
    pub fn dst_split(&mut self, dst: usize) -> (&mut Value, PoolView<'_>) {
        let (head, tail) = self.slots.split_at_mut(dst + 1);
        (
            &mut head[dst],
            PoolView {
                tail,
                offset: dst + 1,
            },
        )
    }
}
