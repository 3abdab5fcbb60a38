/*!
  Packing of opcodes into cells. Byte `i` of a cell's little-endian representation is the
  opcode found at byte address `4·cell + i`, which is the order the dispatch loop reads them.
*/

use super::Opcode;
use crate::memory::{Word, CELL_BYTES};

/// Unused trailing bytes of a code field. Zero decodes as `nop`.
pub const CODE_FIELD_PADDING: u8 = 0;

/**
  Packs a sequence of opcodes into whole cells, four to a cell, padding the last cell with
  `CODE_FIELD_PADDING`. An empty sequence still occupies one cell.
*/
pub fn encode_code_field(opcodes: &[Opcode]) -> Vec<Word> {
  if opcodes.is_empty() {
    return vec![Word::from_le_bytes([CODE_FIELD_PADDING; 4])];
  }
  opcodes
    .chunks(CELL_BYTES as usize)
    .map(|chunk| {
      let mut bytes = [CODE_FIELD_PADDING; 4];
      for (byte, opcode) in bytes.iter_mut().zip(chunk) {
        *byte = opcode.code();
      }
      Word::from_le_bytes(bytes)
    })
    .collect()
}

/// Splits a cell into the four opcodes it would dispatch, `None` for illegal bytes.
pub fn decode_cell(word: Word) -> [Option<Opcode>; 4] {
  let bytes = word.to_le_bytes();
  [
    Opcode::decode(bytes[0]),
    Opcode::decode(bytes[1]),
    Opcode::decode(bytes[2]),
    Opcode::decode(bytes[3]),
  ]
}
