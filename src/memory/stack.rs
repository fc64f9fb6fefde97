//! Hardware stack for return addresses and spilled registers.

use serde::{Serialize, Deserialize};

/// Maximum number of bytes the stack can hold.
pub const STACK_SIZE: usize = 256;

/// A bounded LIFO byte stack.
///
/// Pushing onto a full stack drops the value and popping an empty stack
/// yields zero; neither is an error for the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stack {
    data: Vec<u8>,
    last_added: u8,
}

impl Stack {
    pub fn new() -> Self {
        Self {
            data: Vec::with_capacity(STACK_SIZE),
            last_added: 0,
        }
    }

    pub fn push(&mut self, value: u8) {
        if self.data.len() >= STACK_SIZE {
            log::warn!("stack overflow, dropping {:#04x}", value);
            return;
        }
        self.data.push(value);
        self.last_added = value;
    }

    pub fn pop(&mut self) -> u8 {
        self.data.pop().unwrap_or_else(|| {
            log::warn!("stack underflow, returning 0");
            0
        })
    }

    /// Number of values currently on the stack.
    pub fn depth(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The value most recently pushed, whether or not it has been popped since.
    pub fn top(&self) -> u8 {
        self.last_added
    }

    /// Current contents, bottom first.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Empty the stack.
    pub fn reset(&mut self) {
        self.data.clear();
        self.last_added = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_order() {
        let mut stack = Stack::new();
        stack.push(1);
        stack.push(2);
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.pop(), 2);
        assert_eq!(stack.pop(), 1);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_top_survives_pop() {
        let mut stack = Stack::new();
        stack.push(9);
        stack.pop();
        assert_eq!(stack.top(), 9);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_underflow_yields_zero() {
        let mut stack = Stack::new();
        assert_eq!(stack.pop(), 0);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_overflow_drops_value() {
        let mut stack = Stack::new();
        for i in 0..STACK_SIZE {
            stack.push(i as u8);
        }
        stack.push(0xEE);
        assert_eq!(stack.depth(), STACK_SIZE);
        assert_eq!(stack.top(), (STACK_SIZE - 1) as u8);
        assert_eq!(stack.pop(), (STACK_SIZE - 1) as u8);
    }

    #[test]
    fn test_reset() {
        let mut stack = Stack::new();
        stack.push(4);
        stack.reset();
        assert!(stack.is_empty());
        assert_eq!(stack.top(), 0);
    }
}
