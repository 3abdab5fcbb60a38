//! The two fixed-capacity circular stacks. A stack pointer is one byte, so every push and pop
//! wraps modulo 256 without complaint. Running off either end silently reuses old slots.

use std::ops::{Index, IndexMut};

pub const STACK_CELLS: usize = 256;

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Stack {
  cells   : [i32; STACK_CELLS],
  pub ptr : u8,
}

impl Stack {

  pub fn new() -> Stack {
    Stack {
      cells : [0; STACK_CELLS],
      ptr   : 0
    }
  }

  /// The slot at the stack pointer.
  pub fn top(&self) -> i32 {
    self[self.ptr]
  }

  pub fn set_top(&mut self, value: i32) {
    let ptr = self.ptr;
    self[ptr] = value;
  }

  /// Advances the pointer and stores `value` in the new slot.
  pub fn push(&mut self, value: i32) {
    self.ptr = self.ptr.wrapping_add(1);
    self.set_top(value);
  }

  /// Reads the slot at the pointer and retreats.
  pub fn pop(&mut self) -> i32 {
    let value = self.top();
    self.ptr  = self.ptr.wrapping_sub(1);
    value
  }

  /// Retreats the pointer without reading.
  pub fn discard(&mut self) {
    self.ptr = self.ptr.wrapping_sub(1);
  }

  /// The slot `depth` places below the pointer.
  pub fn below(&self, depth: u8) -> i32 {
    self[self.ptr.wrapping_sub(depth)]
  }

  pub fn set_below(&mut self, depth: u8, value: i32) {
    let at = self.ptr.wrapping_sub(depth);
    self[at] = value;
  }
}

impl Default for Stack {
  fn default() -> Stack {
    Stack::new()
  }
}

impl Index<u8> for Stack {
  type Output = i32;
  fn index(&self, at: u8) -> &i32 {
    &self.cells[at as usize]
  }
}

impl IndexMut<u8> for Stack {
  fn index_mut(&mut self, at: u8) -> &mut i32 {
    &mut self.cells[at as usize]
  }
}
