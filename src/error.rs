//! Failures that can end a run of the machine.
//!
//! Illegal opcodes and division by zero are deliberately absent: the former is a diagnostic
//! reported by `Machine::step`, the latter degrades silently inside the arithmetic primitives.

use std::fmt::{Display, Formatter};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, VmError>;

/// Which view of memory an out-of-range address was used with.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum Access {
  Word,
  Byte,
  /// Opcode fetch from the byte stream at `P`.
  Fetch,
}

impl Display for Access {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Access::Word  => write!(f, "word"),
      Access::Byte  => write!(f, "byte"),
      Access::Fetch => write!(f, "opcode fetch"),
    }
  }
}

#[derive(Debug, Error)]
pub enum VmError {
  #[error("{access} access to address {address:#010X} is outside memory")]
  AddressOutOfRange { address: u32, access: Access },

  #[error("console i/o failed: {0}")]
  Io(#[from] std::io::Error),

  #[error("image line {line}: {message}")]
  Image { line: usize, message: String },

  #[error("image of {cells} cells does not fit in {capacity} cells of memory")]
  ImageTooLarge { cells: usize, capacity: usize },

  #[error("undefined label: {0}")]
  UndefinedLabel(String),

  #[error("duplicate label: {0}")]
  DuplicateLabel(String),
}
