//! Structures and functions for the virtual Forth machine: the register file, the two stacks,
//! memory, and the outer dispatch loop that feeds opcodes to the primitives.

use std::fmt::{Display, Formatter};

use prettytable::{format as TableFormat, row, table, Table};
use lazy_static::lazy_static;
use tracing::{info, warn};
#[cfg(feature = "trace_computation")]
use tracing::trace;

use crate::bytecode::Opcode;
use crate::console::Console;
use crate::error::Result;
use crate::memory::{Memory, Word, CELL_BYTES, MEMORY_CELLS};
use crate::stack::Stack;

/// The all-ones cell every comparison returns for true.
pub const TRUE: i32 = -1;
pub const FALSE: i32 = 0;

/// Rows of each stack shown when the machine is displayed.
const STACK_WINDOW: u8 = 8;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct MachineConfig {
  /// Size of memory in cells.
  pub memory_cells : usize,
  /// Whether illegal opcodes are also reported on the console, not just the log.
  pub echo_illegal : bool,
}

impl Default for MachineConfig {
  fn default() -> MachineConfig {
    MachineConfig {
      memory_cells : MEMORY_CELLS,
      echo_illegal : true,
    }
  }
}

/// The registers that are not stack pointers. All of them hold raw cell values.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct Registers {
  /// Program counter, a byte address into the opcode stream.
  pub p   : i32,
  /// Instruction pointer, the next cell of the token list being threaded.
  pub ip  : i32,
  /// Work pointer, the parameter field of the command being executed.
  pub wp  : i32,
  /// The cached top element of the data stack.
  pub top : i32,
}

/// What a single turn of the dispatch loop did.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Step {
  Continue,
  /// The fetched byte is not an opcode. `p` is the program counter after the fetch.
  IllegalOpcode { opcode: u8, p: i32 },
  /// `bye` was executed.
  Halt,
}

pub struct Machine<C: Console> {
  pub(crate) memory    : Memory,
  pub(crate) registers : Registers,
  /// Everything below the cached top of the data stack.
  pub(crate) data      : Stack,
  pub(crate) returns   : Stack,
  pub(crate) console   : C,
  pub(crate) halted    : bool,
  config               : MachineConfig,
}

impl<C: Console> Machine<C> {

  // region Display methods

  fn make_stack_table(stack: &Stack, top: Option<i32>) -> Table {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Slot", ubl->"Contents"]);

    if let Some(top) = top {
      table.add_row(row![r->"top =", format!("{}", top)]);
    }
    for depth in 0..STACK_WINDOW {
      let slot = stack.ptr.wrapping_sub(depth);
      match depth == 0 {

        true  => {
          table.add_row(row![r->format!("* --> [{}] =", slot), format!("{}", stack[slot])]);
        }

        false => {
          table.add_row(row![r->format!("[{}] =", slot), format!("{}", stack[slot])]);
        }

      }
    }
    table
  }

  fn make_register_table(&self) -> Table {
    let mut table = Table::new();

    table.set_format(*TABLE_DISPLAY_FORMAT);
    table.set_titles(row![ubr->"Register", ubl->"Contents"]);
    table.add_row(row![r->"P =",  format!("{:08X}", self.registers.p)]);
    table.add_row(row![r->"IP =", format!("{:08X}", self.registers.ip)]);
    table.add_row(row![r->"WP =", format!("{:08X}", self.registers.wp)]);
    table.add_row(row![r->"S =",  format!("{}", self.data.ptr)]);
    table.add_row(row![r->"R =",  format!("{}", self.returns.ptr)]);
    table
  }

  // endregion

  // region Construction and state access

  pub fn new(config: MachineConfig, console: C) -> Machine<C> {
    let mut machine = Machine {
      memory    : Memory::new(config.memory_cells),
      registers : Registers::default(),
      data      : Stack::new(),
      returns   : Stack::new(),
      console,
      halted    : false,
      config,
    };
    machine.reset();
    machine
  }

  /// Puts the registers and stack pointers in the start state. Memory is left alone.
  pub fn reset(&mut self) {
    self.registers = Registers {
      p   : 0,
      ip  : 0,
      wp  : CELL_BYTES as i32,
      top : 0,
    };
    self.data.ptr    = 0;
    self.returns.ptr = 0;
    self.halted      = false;
  }

  /// Loads an initial image into the word view and resets the registers.
  pub fn load(&mut self, image: &[Word]) -> Result<()> {
    self.memory.load(image)?;
    self.reset();
    Ok(())
  }

  pub fn memory(&self) -> &Memory {
    &self.memory
  }

  pub fn memory_mut(&mut self) -> &mut Memory {
    &mut self.memory
  }

  pub fn registers(&self) -> &Registers {
    &self.registers
  }

  pub fn registers_mut(&mut self) -> &mut Registers {
    &mut self.registers
  }

  pub fn data_stack(&self) -> &Stack {
    &self.data
  }

  pub fn return_stack(&self) -> &Stack {
    &self.returns
  }

  pub fn console(&self) -> &C {
    &self.console
  }

  pub fn is_halted(&self) -> bool {
    self.halted
  }

  pub fn top(&self) -> i32 {
    self.registers.top
  }

  // endregion

  // region Stack discipline

  /// Pushes `value`: the old top moves into the array, `value` becomes the cached top.
  pub fn push(&mut self, value: i32) {
    self.data.push(self.registers.top);
    self.registers.top = value;
  }

  /// Discards the cached top, refilling it from the array.
  pub fn pop(&mut self) {
    self.registers.top = self.data.pop();
  }

  pub fn push_return(&mut self, value: i32) {
    self.returns.push(value);
  }

  pub fn pop_return(&mut self) -> i32 {
    self.returns.pop()
  }

  /// The element just below the cached top.
  pub(crate) fn second(&self) -> i32 {
    self.data.top()
  }

  pub(crate) fn set_second(&mut self, value: i32) {
    self.data.set_top(value);
  }

  // endregion

  // region Memory helpers

  pub(crate) fn cell_at(&self, address: i32) -> Result<i32> {
    Ok(self.memory.read_word(address as u32)? as i32)
  }

  pub(crate) fn set_cell_at(&mut self, address: i32, value: i32) -> Result<()> {
    self.memory.write_word(address as u32, value as Word)
  }

  pub(crate) fn byte_at(&self, address: i32) -> Result<i32> {
    Ok(self.memory.read_byte(address as u32)? as i32)
  }

  pub(crate) fn set_byte_at(&mut self, address: i32, value: i32) -> Result<()> {
    self.memory.write_byte(address as u32, value as u8)
  }

  // endregion

  // region Outer interpreter

  /// Fetches one opcode at `P`, advances `P`, and dispatches it.
  pub fn step(&mut self) -> Result<Step> {
    let byte           = self.memory.fetch(self.registers.p as u32)?;
    self.registers.p   = self.registers.p.wrapping_add(1);

    let opcode =
      match Opcode::decode(byte) {
        Some(opcode) => opcode,
        None         => return self.report_illegal(byte),
      };

    #[cfg(feature = "trace_computation")]
    trace!(
      code = %opcode, p = self.registers.p, ip = self.registers.ip, wp = self.registers.wp,
      top = self.registers.top, s = self.data.ptr, r = self.returns.ptr, second = self.second(),
      "dispatch"
    );

    self.execute(opcode)?;

    match self.halted {
      true  => {
        info!(p = self.registers.p, "machine halted");
        Ok(Step::Halt)
      }
      false => Ok(Step::Continue)
    }
  }

  fn report_illegal(&mut self, opcode: u8) -> Result<Step> {
    let p = self.registers.p;
    warn!(opcode, p, "illegal opcode");
    if self.config.echo_illegal {
      for byte in format!("\n Illegal code= {:x} P= {:x}", opcode, p).bytes() {
        self.console.putchar(byte)?;
      }
    }
    Ok(Step::IllegalOpcode { opcode, p })
  }

  /// Runs until `bye`. Errors end the run; illegal opcodes do not.
  pub fn run(&mut self) -> Result<()> {
    loop {
      if let Step::Halt = self.step()? {
        return Ok(());
      }
    }
  }

  /// Runs at most `limit` steps, returning the last step taken.
  pub fn run_steps(&mut self, limit: usize) -> Result<Step> {
    let mut last = Step::Continue;
    for _ in 0..limit {
      last = self.step()?;
      if last == Step::Halt {
        break;
      }
    }
    Ok(last)
  }

  /// Invokes the primitive for `opcode`.
  pub fn execute(&mut self, opcode: Opcode) -> Result<()> {
    match opcode {
      Opcode::Nop        => self.nop()?,
      Opcode::Bye        => self.bye(),
      Opcode::Qrx        => self.qrx()?,
      Opcode::Txsto      => self.txsto()?,
      Opcode::Docon      => self.docon()?,
      Opcode::Dolit      => self.dolit()?,
      Opcode::Dolist     => self.dolist()?,
      Opcode::Exitt      => self.exitt()?,
      Opcode::Execu      => self.execu(),
      Opcode::Donext     => self.donext()?,
      Opcode::Qbran      => self.qbran()?,
      Opcode::Bran       => self.bran()?,
      Opcode::Store      => self.store()?,
      Opcode::At         => self.at()?,
      Opcode::Cstor      => self.cstor()?,
      Opcode::Cat        => self.cat()?,
      Opcode::Reserved16 => self.nop()?,
      Opcode::Reserved17 => self.nop()?,
      Opcode::Rfrom      => self.rfrom(),
      Opcode::Rat        => self.rat(),
      Opcode::Tor        => self.tor(),
      Opcode::Reserved21 => self.nop()?,
      Opcode::Reserved22 => self.nop()?,
      Opcode::Drop       => self.drop(),
      Opcode::Dup        => self.dup(),
      Opcode::Swap       => self.swap(),
      Opcode::Over       => self.over(),
      Opcode::Zless      => self.zless(),
      Opcode::Andd       => self.andd(),
      Opcode::Orr        => self.orr(),
      Opcode::Xorr       => self.xorr(),
      Opcode::Uplus      => self.uplus(),
      Opcode::Reserved32 => self.nop()?,
      Opcode::Qdup       => self.qdup(),
      Opcode::Rot        => self.rot(),
      Opcode::Ddrop      => self.ddrop(),
      Opcode::Ddup       => self.ddup(),
      Opcode::Plus       => self.plus(),
      Opcode::Inver      => self.inver(),
      Opcode::Negat      => self.negat(),
      Opcode::Dnega      => self.dnega(),
      Opcode::Subb       => self.subb(),
      Opcode::Abss       => self.abss(),
      Opcode::Equal      => self.equal(),
      Opcode::Uless      => self.uless(),
      Opcode::Less       => self.less(),
      Opcode::Ummod      => self.ummod(),
      Opcode::Msmod      => self.msmod(),
      Opcode::Slmod      => self.slmod(),
      Opcode::Mod        => self.modulo(),
      Opcode::Slash      => self.slash(),
      Opcode::Umsta      => self.umsta(),
      Opcode::Star       => self.star(),
      Opcode::Mstar      => self.mstar(),
      Opcode::Ssmod      => self.ssmod(),
      Opcode::Stasl      => self.stasl(),
      Opcode::Pick       => self.pick(),
      Opcode::Pstor      => self.pstor()?,
      Opcode::Dstor      => self.dstor()?,
      Opcode::Dat        => self.dat()?,
      Opcode::Count      => self.count()?,
      Opcode::Dovar      => self.dovar(),
      Opcode::Maxx       => self.maxx(),
      Opcode::Minn       => self.minn(),
      Opcode::Great      => self.great(),
    }
    Ok(())
  }

  // endregion
}


lazy_static! {
  static ref TABLE_DISPLAY_FORMAT: TableFormat::TableFormat =
    TableFormat::FormatBuilder::new()
      .column_separator('│')
      .borders(' ')
      .separator(
        TableFormat::LinePosition::Title,
        TableFormat::LineSeparator::new('─', '┼', ' ', ' ')
      )
      .separator(
        TableFormat::LinePosition::Bottom,
        TableFormat::LineSeparator::new('─', '┴', ' ', ' ')
      )
      .padding(1, 1)
      .build();
}

impl<C: Console> Display for Machine<C> {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    let r_table = self.make_register_table();
    let s_table = Self::make_stack_table(&self.data, Some(self.registers.top));
    let k_table = Self::make_stack_table(&self.returns, None);

    let mut combined_table = table!([r_table, s_table, k_table]);

    combined_table.set_titles(row![ub->"Registers", ub->"Data Stack", ub->"Return Stack"]);
    combined_table.set_format(*TABLE_DISPLAY_FORMAT);

    let state = match self.halted {
      true  => "Halted.",
      false => "Running."
    };

    write!(f, "{}\n{}", state, combined_table)
  }
}
