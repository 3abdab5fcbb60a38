/*!
  A small assembler for dictionaries. The bootstrap dictionary normally arrives as an opaque
  image, but tests, demos, and tools need to build their own, and writing cell values by hand
  is error prone. `ImageBuilder` lays out code fields and token lists in the same shape the
  machine expects and resolves symbolic references at the end.

  The machine starts with `P = 0` and `WP = 4`, so a `dolist` code field at address 0 enters a
  token list that begins at address 4. `ImageBuilder::boot` emits exactly that.

  Labels map names to byte addresses in a `BiMap`, which lets a listing name the address it
  is looking at as easily as the builder can look up a name.
*/

use std::fmt::Write as FmtWrite;

use bimap::BiMap;

use crate::bytecode::{decode_cell, encode_code_field, Opcode};
use crate::error::{Result, VmError};
use crate::memory::{Word, CELL_BYTES};

/// One cell of a token list.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Token<'a> {
  /// The address of a label: a command to call or a branch target.
  Ref(&'a str),
  /// A raw cell, e.g. the literal after `dolit`.
  Cell(i32),
  /// Defines a label at this point of the list. Emits nothing.
  Label(&'a str),
}

/// An assembled dictionary together with its symbol table.
#[derive(Clone, Debug)]
pub struct Image {
  pub cells : Vec<Word>,
  symbols   : BiMap<String, u32>,
}

impl Image {

  /// An image without symbols, such as one read from a snapshot.
  pub fn from_cells(cells: Vec<Word>) -> Image {
    Image {
      cells,
      symbols: BiMap::new()
    }
  }

  pub fn address(&self, name: &str) -> Option<u32> {
    self.symbols.get_by_left(name).copied()
  }

  pub fn name_at(&self, address: u32) -> Option<&str> {
    self.symbols.get_by_right(&address).map(String::as_str)
  }

  /// A listing of every cell: address, label, raw value, and the opcodes the cell would
  /// dispatch if executed as code.
  pub fn disassemble(&self) -> String {
    let mut listing = String::new();
    for (i, word) in self.cells.iter().enumerate() {
      let address = i as u32 * CELL_BYTES;
      let opcodes = decode_cell(*word)
        .iter()
        .map(|opcode| match opcode {
          Some(opcode) => opcode.mnemonic().to_string(),
          None         => "??".to_string(),
        })
        .collect::<Vec<String>>()
        .join(" ");
      let _ = writeln!(
        listing,
        "{:08X} {:>12} 0x{:08X}  {}",
        address,
        self.name_at(address).unwrap_or(""),
        word,
        opcodes
      );
    }
    listing
  }
}

#[derive(Default)]
pub struct ImageBuilder {
  cells      : Vec<Word>,
  symbols    : BiMap<String, u32>,
  fixups     : Vec<(usize, String)>,
  duplicates : Vec<String>,
}

impl ImageBuilder {

  pub fn new() -> ImageBuilder {
    ImageBuilder::default()
  }

  /// Byte address of the next cell to be emitted.
  pub fn here(&self) -> u32 {
    self.cells.len() as u32 * CELL_BYTES
  }

  /// Pads with zero cells up to the cell containing byte `address`.
  pub fn origin(&mut self, address: u32) -> &mut Self {
    let index = (address / CELL_BYTES) as usize;
    if index > self.cells.len() {
      self.cells.resize(index, 0);
    }
    self
  }

  pub fn label(&mut self, name: &str) -> &mut Self {
    let here = self.here();
    if self.symbols.insert_no_overwrite(name.to_string(), here).is_err() {
      self.duplicates.push(name.to_string());
    }
    self
  }

  pub fn cell(&mut self, value: Word) -> &mut Self {
    self.cells.push(value);
    self
  }

  /// A cell holding the byte address of `name`, filled in by `finish`.
  pub fn reference(&mut self, name: &str) -> &mut Self {
    self.fixups.push((self.cells.len(), name.to_string()));
    self.cells.push(0);
    self
  }

  pub fn tokens(&mut self, tokens: &[Token]) -> &mut Self {
    for token in tokens {
      match token {
        Token::Ref(name)   => { self.reference(name); }
        Token::Cell(value) => { self.cell(*value as Word); }
        Token::Label(name) => { self.label(name); }
      }
    }
    self
  }

  /// A primitive command: a labelled code field holding `opcodes`.
  pub fn primitive(&mut self, name: &str, opcodes: &[Opcode]) -> &mut Self {
    self.label(name);
    for word in encode_code_field(opcodes) {
      self.cell(word);
    }
    self
  }

  /// A compound command: a `dolist` code field followed by its token list.
  pub fn colon(&mut self, name: &str, tokens: &[Token]) -> &mut Self {
    self.primitive(name, &[Opcode::Dolist]);
    self.tokens(tokens)
  }

  /// A constant: `docon` then the value in the parameter field.
  pub fn constant(&mut self, name: &str, value: i32) -> &mut Self {
    self.primitive(name, &[Opcode::Docon, Opcode::Nop]);
    self.cell(value as Word)
  }

  /// A variable: `dovar` then one cell of storage.
  pub fn variable(&mut self, name: &str, initial: i32) -> &mut Self {
    self.primitive(name, &[Opcode::Dovar, Opcode::Nop]);
    self.cell(initial as Word)
  }

  /// A counted string at a label, padded to whole cells.
  pub fn counted_string(&mut self, name: &str, text: &str) -> &mut Self {
    self.label(name);
    let mut bytes = Vec::with_capacity(text.len() + 1);
    bytes.push(text.len().min(u8::MAX as usize) as u8);
    bytes.extend(text.bytes().take(u8::MAX as usize));
    for chunk in bytes.chunks(CELL_BYTES as usize) {
      let mut word = [0u8; 4];
      word[..chunk.len()].copy_from_slice(chunk);
      self.cell(Word::from_le_bytes(word));
    }
    self
  }

  /// The start-up command at address 0, entered through the reset value of `WP`.
  pub fn boot(&mut self, tokens: &[Token]) -> &mut Self {
    self.origin(0);
    self.colon("boot", tokens)
  }

  /// Resolves references and hands back the image.
  pub fn finish(&mut self) -> Result<Image> {
    if let Some(name) = self.duplicates.first() {
      return Err(VmError::DuplicateLabel(name.clone()));
    }
    let mut cells = self.cells.clone();
    for (index, name) in &self.fixups {
      match self.symbols.get_by_left(name) {
        Some(address) => cells[*index] = *address,
        None          => return Err(VmError::UndefinedLabel(name.clone())),
      }
    }
    Ok(Image {
      cells,
      symbols: self.symbols.clone()
    })
  }
}
