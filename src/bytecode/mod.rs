/*!

  The VM uses a 32 bit little-endian cell. Bytecode is a stream of single byte opcodes read
  through the byte view of memory, so four opcodes fit in one cell. A primitive command in the
  dictionary is a code field holding its opcodes, usually the primitive's own opcode followed
  by `nop`, which hands control back to the inner interpreter. A compound command's code field
  holds `dolist` and its parameter field holds the token list.

  Only 65 opcodes are defined, numbered as in the classic eForth virtual machine. The numbering
  does not follow any perceived order and is fixed by the dictionaries built against it, so the
  discriminants below are explicit. Five slots are reserved and behave exactly like `nop`.

*/

mod binary;

pub use binary::{encode_code_field, decode_cell, CODE_FIELD_PADDING};

use std::convert::TryFrom;

use strum_macros::{Display as StrumDisplay, EnumString, IntoStaticStr, EnumIter};
use num_enum::{TryFromPrimitive, IntoPrimitive};

/// Number of defined opcodes. Bytes at or above this value are illegal.
pub const OPCODE_COUNT: u8 = 65;

/// Opcodes of the virtual machine. The mnemonic of each variant is its lowercase name.
#[derive(
  StrumDisplay, IntoStaticStr, EnumString, EnumIter, TryFromPrimitive, IntoPrimitive,
  Clone,        Copy,          Eq,         PartialEq, Debug,          Hash
)]
#[strum(serialize_all = "lowercase")]
#[repr(u8)]
pub enum Opcode {
  // Inner interpreter and I/O //
  Nop        =  0, // ( -- )
  Bye        =  1, // ( -- )
  Qrx        =  2, // ( -- c T | 0 )
  Txsto      =  3, // ( c -- )
  Docon      =  4, // ( -- n )
  Dolit      =  5, // ( -- w )
  Dolist     =  6, // ( -- )
  Exitt      =  7, // ( -- )
  Execu      =  8, // ( a -- )
  Donext     =  9, // ( -- )
  Qbran      = 10, // ( f -- )
  Bran       = 11, // ( -- )

  // Memory //
  Store      = 12, // ( n a -- )
  At         = 13, // ( a -- n )
  Cstor      = 14, // ( c b -- )
  Cat        = 15, // ( b -- c )
  Reserved16 = 16,
  Reserved17 = 17,

  // Return stack //
  Rfrom      = 18, // ( -- n )
  Rat        = 19, // ( -- n )
  Tor        = 20, // ( n -- )
  Reserved21 = 21,
  Reserved22 = 22,

  // Data stack and logic //
  Drop       = 23, // ( w -- )
  Dup        = 24, // ( w -- w w )
  Swap       = 25, // ( w1 w2 -- w2 w1 )
  Over       = 26, // ( w1 w2 -- w1 w2 w1 )
  Zless      = 27, // ( n -- f )
  Andd       = 28, // ( w w -- w )
  Orr        = 29, // ( w w -- w )
  Xorr       = 30, // ( w w -- w )
  Uplus      = 31, // ( w w -- w cy )
  Reserved32 = 32,
  Qdup       = 33, // ( w -- w w | 0 )
  Rot        = 34, // ( w1 w2 w3 -- w2 w3 w1 )
  Ddrop      = 35, // ( w w -- )
  Ddup       = 36, // ( w1 w2 -- w1 w2 w1 w2 )

  // Arithmetic //
  Plus       = 37, // ( w w -- sum )
  Inver      = 38, // ( w -- w )
  Negat      = 39, // ( n -- -n )
  Dnega      = 40, // ( d -- -d )
  Subb       = 41, // ( n1 n2 -- n1-n2 )
  Abss       = 42, // ( n -- n )
  Equal      = 43, // ( w w -- t )
  Uless      = 44, // ( u1 u2 -- t )
  Less       = 45, // ( n1 n2 -- t )
  Ummod      = 46, // ( udl udh u -- ur uq )
  Msmod      = 47, // ( d n -- r q )
  Slmod      = 48, // ( n1 n2 -- r q )
  Mod        = 49, // ( n n -- r )
  Slash      = 50, // ( n n -- q )
  Umsta      = 51, // ( u1 u2 -- ud )
  Star       = 52, // ( n n -- n )
  Mstar      = 53, // ( n1 n2 -- d )
  Ssmod      = 54, // ( n1 n2 n3 -- r q )
  Stasl      = 55, // ( n1 n2 n3 -- q )
  Pick       = 56, // ( ... +n -- ... w )

  // Memory, continued //
  Pstor      = 57, // ( n a -- )
  Dstor      = 58, // ( d a -- )
  Dat        = 59, // ( a -- d )
  Count      = 60, // ( b -- b+1 +n )
  Dovar      = 61, // ( -- a )
  Maxx       = 62, // ( n1 n2 -- n )
  Minn       = 63, // ( n1 n2 -- n )
  Great      = 64, // ( n1 n2 -- t )
}

impl Opcode {
  pub fn code(&self) -> u8 {
    Into::<u8>::into(*self)
  }

  /// Validates a fetched byte. `None` is the illegal-opcode case.
  pub fn decode(byte: u8) -> Option<Opcode> {
    Opcode::try_from(byte).ok()
  }

  pub fn mnemonic(&self) -> &'static str {
    self.into()
  }

  /// Whether the slot is one of the unassigned ones that behave as `nop`.
  pub fn is_reserved(&self) -> bool {
    matches!(
      self,
      Opcode::Reserved16 | Opcode::Reserved17 | Opcode::Reserved21
      | Opcode::Reserved22 | Opcode::Reserved32
    )
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use std::str::FromStr;
  use strum::IntoEnumIterator;

  #[test]
  fn every_byte_below_the_count_is_an_opcode() {
    for byte in 0..=255u8 {
      match Opcode::decode(byte) {
        Some(opcode) => assert_eq!(opcode.code(), byte),
        None         => assert!(byte >= OPCODE_COUNT, "{} should decode", byte),
      }
    }
    assert_eq!(Opcode::iter().count(), OPCODE_COUNT as usize);
  }

  #[test]
  fn mnemonics_round_trip() {
    assert_eq!(Opcode::Dolist.to_string(), "dolist");
    assert_eq!(Opcode::Ummod.mnemonic(), "ummod");
    assert_eq!(Opcode::from_str("exitt").unwrap(), Opcode::Exitt);
    assert_eq!(Opcode::from_str("reserved21").unwrap(), Opcode::Reserved21);
    assert!(Opcode::from_str("jump").is_err());
  }

  #[test]
  fn reference_numbering() {
    assert_eq!(Opcode::Bye.code(), 1);
    assert_eq!(Opcode::Dolist.code(), 6);
    assert_eq!(Opcode::Rfrom.code(), 18);
    assert_eq!(Opcode::Qdup.code(), 33);
    assert_eq!(Opcode::Count.code(), 60);
    assert_eq!(Opcode::Great.code(), 64);
    assert!(Opcode::Reserved32.is_reserved());
    assert!(!Opcode::Nop.is_reserved());
  }
}
