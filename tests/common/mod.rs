#![allow(dead_code)]

use std::io::Cursor;

use vfm::{Image, LineConsole, Machine, MachineConfig, Opcode};

pub type TestConsole = LineConsole<Cursor<Vec<u8>>, Vec<u8>>;

pub fn console(input: &str) -> TestConsole {
  LineConsole::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
}

/// A machine with a small memory and the given console input.
pub fn machine_with_input(input: &str) -> Machine<TestConsole> {
  let config = MachineConfig {
    memory_cells : 256,
    ..MachineConfig::default()
  };
  Machine::new(config, console(input))
}

pub fn new_machine() -> Machine<TestConsole> {
  machine_with_input("")
}

/// A machine loaded with `image`.
pub fn booted(image: &Image) -> Machine<TestConsole> {
  let mut machine = new_machine();
  machine.load(&image.cells).unwrap();
  machine
}

/// Everything the machine has written to its console.
pub fn output(machine: &Machine<TestConsole>) -> String {
  String::from_utf8_lossy(machine.console().output()).into_owned()
}

/// Pushes each value in order, so the last one ends up on top.
pub fn push_all(machine: &mut Machine<TestConsole>, values: &[i32]) {
  for value in values {
    machine.push(*value);
  }
}

pub fn run(machine: &mut Machine<TestConsole>, opcodes: &[Opcode]) {
  for opcode in opcodes {
    machine.execute(*opcode).unwrap();
  }
}

/// The top `count` data stack items, deepest first.
pub fn stack_items(machine: &Machine<TestConsole>, count: u8) -> Vec<i32> {
  let mut items: Vec<i32> = (1..count)
    .rev()
    .map(|depth| machine.data_stack().below(depth - 1))
    .collect();
  items.push(machine.top());
  items
}
