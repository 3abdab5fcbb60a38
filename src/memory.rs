/*!
  One block of cells seen two ways. The word view indexes whole cells; the byte view indexes
  the same storage one byte at a time, little-endian within each cell. Addresses held by the
  machine are always byte addresses, so word access at address `a` touches cell `a >> 2` and
  byte access at `b` touches byte `b & 3` of cell `b >> 2`.

  The low two bits of a word address are ignored, as they would be by the hardware this design
  comes from. Alignment is the program's responsibility, bounds are ours: anything past the
  end of the block is an `AddressOutOfRange` error rather than a stray access.
*/

use crate::error::{Access, Result, VmError};

pub type Word = u32;

/// Bytes per cell.
pub const CELL_BYTES: u32 = 4;
/// Default size of memory in cells.
pub const MEMORY_CELLS: usize = 4096;

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Memory {
  cells: Vec<Word>,
}

impl Memory {

  pub fn new(cells: usize) -> Memory {
    Memory {
      cells: vec![0; cells]
    }
  }

  /// Size in cells.
  pub fn len(&self) -> usize {
    self.cells.len()
  }

  pub fn is_empty(&self) -> bool {
    self.cells.is_empty()
  }

  /// Size in bytes, the first byte address past the end.
  pub fn byte_len(&self) -> usize {
    self.cells.len() * CELL_BYTES as usize
  }

  /// The word view, in address order.
  pub fn cells(&self) -> &[Word] {
    &self.cells
  }

  /// Copies `image` into the start of memory and zeroes the rest.
  pub fn load(&mut self, image: &[Word]) -> Result<()> {
    if image.len() > self.cells.len() {
      return Err(VmError::ImageTooLarge { cells: image.len(), capacity: self.cells.len() });
    }
    self.cells[..image.len()].copy_from_slice(image);
    for cell in self.cells[image.len()..].iter_mut() {
      *cell = 0;
    }
    Ok(())
  }

  fn word_index(&self, address: u32, access: Access) -> Result<usize> {
    let index = (address >> 2) as usize;
    match index < self.cells.len() {
      true  => Ok(index),
      false => Err(VmError::AddressOutOfRange { address, access })
    }
  }

  // region Word view

  pub fn read_word(&self, address: u32) -> Result<Word> {
    let index = self.word_index(address, Access::Word)?;
    Ok(self.cells[index])
  }

  pub fn write_word(&mut self, address: u32, value: Word) -> Result<()> {
    let index = self.word_index(address, Access::Word)?;
    self.cells[index] = value;
    Ok(())
  }

  // endregion

  // region Byte view

  pub fn read_byte(&self, address: u32) -> Result<u8> {
    let index = self.word_index(address, Access::Byte)?;
    Ok(self.cells[index].to_le_bytes()[(address & 3) as usize])
  }

  pub fn write_byte(&mut self, address: u32, value: u8) -> Result<()> {
    let index     = self.word_index(address, Access::Byte)?;
    let mut bytes = self.cells[index].to_le_bytes();
    bytes[(address & 3) as usize] = value;
    self.cells[index] = Word::from_le_bytes(bytes);
    Ok(())
  }

  /// Reads the opcode byte at `p`. Same decoding as `read_byte`, reported as a fetch failure.
  pub fn fetch(&self, p: u32) -> Result<u8> {
    self.read_byte(p).map_err(|_| VmError::AddressOutOfRange { address: p, access: Access::Fetch })
  }

  // endregion
}

impl Default for Memory {
  fn default() -> Memory {
    Memory::new(MEMORY_CELLS)
  }
}
