/*!
  A virtual Forth machine: a small core that runs a fixed set of 65 byte-sized opcodes over a
  pre-built dictionary. Everything above the primitives, the text interpreter, the compiler,
  number formatting, is expected to live in the dictionary as threaded code.

  The pieces, leaves first:

    `memory`     One block of cells with a word view and an aliased byte view.
    `stack`      The 256 cell circular data and return stacks.
    `bytecode`   The opcode table and packing of opcodes into code fields.
    `machine`    Registers, the dispatch loop, and the machine state as a whole.
    `primitives` The 65 primitives, including the inner interpreter.
    `console`    Character I/O for `qrx` and `txsto`.
    `image`      Textual snapshots of memory for loading and dumping.
    `assembler`  Building dictionaries with symbolic labels.
*/

pub mod assembler;
pub mod bytecode;
pub mod console;
pub mod error;
pub mod image;
pub mod machine;
pub mod memory;
pub mod primitives;
pub mod stack;

pub use assembler::{Image, ImageBuilder, Token};
pub use bytecode::Opcode;
pub use console::{Console, LineConsole};
pub use error::{Access, Result, VmError};
pub use machine::{Machine, MachineConfig, Registers, Step, FALSE, TRUE};
pub use memory::{Memory, Word};
