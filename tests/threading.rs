mod common;

use common::*;
use vfm::image;
use vfm::{Access, ImageBuilder, Machine, Opcode, Step, Token, VmError};

use Token::{Cell, Label, Ref};

/// The primitive commands the test programs call, each a code field that falls back into
/// `next` through a trailing `nop` or calls it itself.
fn primitives(builder: &mut ImageBuilder) -> &mut ImageBuilder {
  builder
    .primitive("lit",     &[Opcode::Dolit])
    .primitive("exit",    &[Opcode::Exitt])
    .primitive("next",    &[Opcode::Donext])
    .primitive("?branch", &[Opcode::Qbran])
    .primitive("branch",  &[Opcode::Bran])
    .primitive("bye",     &[Opcode::Bye])
    .primitive("+",       &[Opcode::Plus, Opcode::Nop])
    .primitive("-",       &[Opcode::Subb, Opcode::Nop])
    .primitive("dup",     &[Opcode::Dup, Opcode::Nop])
    .primitive("drop",    &[Opcode::Drop, Opcode::Nop])
    .primitive(">r",      &[Opcode::Tor, Opcode::Nop])
    .primitive("r@",      &[Opcode::Rat, Opcode::Nop])
    .primitive("emit",    &[Opcode::Txsto, Opcode::Nop])
    .primitive("execute", &[Opcode::Execu])
    .primitive("!",       &[Opcode::Store, Opcode::Nop])
    .primitive("@",       &[Opcode::At, Opcode::Nop])
    .primitive("count",   &[Opcode::Count, Opcode::Nop])
}

#[test]
fn compound_command_returns_to_its_caller() {
  let mut builder = ImageBuilder::new();
  builder
    .boot(&[Ref("sum"), Ref("bye")])
    .colon("sum", &[Ref("lit"), Cell(5), Ref("lit"), Cell(7), Ref("+"), Ref("exit")]);
  let image = primitives(&mut builder).finish().unwrap();

  let mut machine = booted(&image);
  machine.run().unwrap();

  assert_eq!(machine.top(), 12);
  // `exit` resumed the boot list right after its reference to `sum`.
  assert_eq!(machine.registers().ip, 12);
  assert_eq!(machine.registers().p, image.address("bye").unwrap() as i32 + 1);
  // Only the boot word's own entry remains on the return stack.
  assert_eq!(machine.return_stack().ptr, 1);
  assert_eq!(machine.return_stack().top(), 0);
  assert!(machine.is_halted());
}

#[test]
fn donext_with_count_one_falls_through() {
  let mut machine = new_machine();
  // IP points at the branch target cell; the token after it is at cell 3.
  machine.memory_mut().write_word(8, 400).unwrap();
  machine.memory_mut().write_word(12, 64).unwrap();
  machine.registers_mut().ip = 8;
  machine.push_return(1);

  machine.execute(Opcode::Donext).unwrap();

  assert_eq!(machine.return_stack().ptr, 0);
  assert_eq!(machine.registers().ip, 16);
  assert_eq!(machine.registers().p, 64);
  assert_eq!(machine.registers().wp, 68);
}

#[test]
fn donext_branches_while_the_count_lasts() {
  let mut machine = new_machine();
  machine.memory_mut().write_word(8, 40).unwrap();
  machine.memory_mut().write_word(40, 100).unwrap();
  machine.registers_mut().ip = 8;
  machine.push_return(3);

  machine.execute(Opcode::Donext).unwrap();

  assert_eq!(machine.return_stack().ptr, 1);
  assert_eq!(machine.return_stack().top(), 2);
  assert_eq!(machine.registers().ip, 44);
  assert_eq!(machine.registers().p, 100);
}

#[test]
fn for_next_loop_counts_down() {
  let mut builder = ImageBuilder::new();
  builder
    .boot(&[
      Ref("lit"), Cell(3), Ref(">r"),
      Label("loop"),
        Ref("r@"), Ref("lit"), Cell('0' as i32), Ref("+"), Ref("emit"),
      Ref("next"), Ref("loop"),
      Ref("bye"),
    ]);
  let image = primitives(&mut builder).finish().unwrap();

  let mut machine = booted(&image);
  machine.run().unwrap();

  assert_eq!(output(&machine), "321");
  assert_eq!(machine.return_stack().ptr, 1);
}

#[test]
fn conditional_branches() {
  // Emits 'y' when the flag is non-zero, 'n' otherwise.
  let mut builder = ImageBuilder::new();
  builder
    .boot(&[
      Ref("lit"), Cell(0), Ref("yes?"),
      Ref("lit"), Cell(-1), Ref("yes?"),
      Ref("bye"),
    ])
    .colon("yes?", &[
      Ref("?branch"), Ref("no"),
      Ref("lit"), Cell('y' as i32), Ref("emit"), Ref("exit"),
      Label("no"),
      Ref("lit"), Cell('n' as i32), Ref("emit"), Ref("branch"), Ref("done"),
      Ref("lit"), Cell('!' as i32), Ref("emit"),
      Label("done"),
      Ref("exit"),
    ]);
  let image = primitives(&mut builder).finish().unwrap();

  let mut machine = booted(&image);
  machine.run().unwrap();

  assert_eq!(output(&machine), "ny");
}

#[test]
fn constants_variables_and_execute() {
  let mut builder = ImageBuilder::new();
  builder
    .boot(&[
      Ref("answer"),
      Ref("counter"), Ref("!"),
      Ref("lit"), Ref("star"), Ref("execute"),
      Ref("counter"), Ref("@"),
      Ref("bye"),
    ])
    .constant("answer", 42)
    .variable("counter", 0)
    .colon("star", &[Ref("lit"), Cell('*' as i32), Ref("emit"), Ref("exit")]);
  let image = primitives(&mut builder).finish().unwrap();

  let mut machine = booted(&image);
  machine.run().unwrap();

  let counter = image.address("counter").unwrap();
  assert_eq!(machine.memory().read_word(counter + 4).unwrap(), 42);
  assert_eq!(machine.top(), 42);
  assert_eq!(output(&machine), "*");
}

#[test]
fn counted_string_type_loop() {
  let mut builder = ImageBuilder::new();
  builder
    .boot(&[
      Ref("lit"), Ref("greeting"), Ref("count"), Ref(">r"),
      Label("again"),
        Ref("dup"), Ref("c@"), Ref("emit"), Ref("lit"), Cell(1), Ref("+"),
      Ref("next"), Ref("again"),
      Ref("drop"), Ref("bye"),
    ])
    .primitive("c@", &[Opcode::Cat, Opcode::Nop])
    .counted_string("greeting", "hello");
  let image = primitives(&mut builder).finish().unwrap();

  let mut machine = booted(&image);
  machine.run().unwrap();

  // `next` decrements before testing, so a count of 5 runs the body five times.
  assert_eq!(output(&machine), "hello");
  assert_eq!(machine.return_stack().ptr, 1);
}

const DISPATCH_AT: i32 = 200;

/// A machine whose every register, stack item, and memory cell a primitive might follow points
/// somewhere inside its memory.
fn dispatch_fixture(p: i32, code: u8) -> Machine<TestConsole> {
  let mut machine = new_machine();
  for address in (64..128).step_by(4) {
    machine.memory_mut().write_word(address, 128).unwrap();
  }
  machine.memory_mut().write_byte(DISPATCH_AT as u32, code).unwrap();
  machine.registers_mut().p  = p;
  machine.registers_mut().ip = 64;
  push_all(&mut machine, &[16, 32, 48]);
  machine.push_return(3);
  machine.push_return(96);
  machine
}

#[test]
fn every_opcode_byte_dispatches_its_primitive() {
  for code in 0..=64u8 {
    let opcode = Opcode::decode(code).unwrap();

    let mut stepped = dispatch_fixture(DISPATCH_AT, code);
    let step        = stepped.step().unwrap();

    let mut direct = dispatch_fixture(DISPATCH_AT + 1, code);
    direct.execute(opcode).unwrap();

    let expected = match opcode {
      Opcode::Bye => Step::Halt,
      _           => Step::Continue,
    };
    assert_eq!(step, expected, "{}", opcode);
    assert_eq!(stepped.registers(), direct.registers(), "{}", opcode);
    assert_eq!(stepped.data_stack(), direct.data_stack(), "{}", opcode);
    assert_eq!(stepped.return_stack(), direct.return_stack(), "{}", opcode);
    assert_eq!(stepped.memory().cells(), direct.memory().cells(), "{}", opcode);
    assert_eq!(output(&stepped), output(&direct), "{}", opcode);
  }
}

#[test]
fn illegal_opcode_is_reported_and_skipped() {
  let mut machine = new_machine();
  machine.memory_mut().write_word(0, u32::from_le_bytes([200, Opcode::Bye.code(), 0, 0])).unwrap();
  let before = *machine.registers();

  let step = machine.step().unwrap();

  assert_eq!(step, Step::IllegalOpcode { opcode: 200, p: 1 });
  let after = *machine.registers();
  assert_eq!(after.p, 1);
  assert_eq!((after.ip, after.wp, after.top), (before.ip, before.wp, before.top));
  assert_eq!(machine.data_stack().ptr, 0);
  assert_eq!(machine.return_stack().ptr, 0);
  assert_eq!(output(&machine), "\n Illegal code= c8 P= 1");

  assert_eq!(machine.step().unwrap(), Step::Halt);
}

#[test]
fn reserved_opcodes_act_as_nop() {
  for opcode in [
    Opcode::Nop, Opcode::Reserved16, Opcode::Reserved17,
    Opcode::Reserved21, Opcode::Reserved22, Opcode::Reserved32
  ] {
    let mut machine = new_machine();
    machine.memory_mut().write_word(0, 24).unwrap();
    machine.execute(opcode).unwrap();
    assert_eq!(machine.registers().p, 24);
    assert_eq!(machine.registers().wp, 28);
    assert_eq!(machine.registers().ip, 4);
  }
}

#[test]
fn memory_faults_end_the_run() {
  let mut builder = ImageBuilder::new();
  builder.boot(&[Ref("lit"), Cell(0x10_0000), Ref("@"), Ref("bye")]);
  let image = primitives(&mut builder).finish().unwrap();

  let mut machine = booted(&image);
  assert!(matches!(
    machine.run(),
    Err(VmError::AddressOutOfRange { address: 0x10_0000, access: Access::Word })
  ));

  let mut machine = new_machine();
  machine.registers_mut().p = 256 * 4;
  assert!(matches!(
    machine.step(),
    Err(VmError::AddressOutOfRange { access: Access::Fetch, .. })
  ));
}

#[test]
fn memory_snapshot_round_trips_through_the_machine() {
  let mut builder = ImageBuilder::new();
  builder
    .boot(&[Ref("lit"), Cell(-7), Ref("slot"), Ref("!"), Ref("bye")])
    .variable("slot", 0);
  let image = primitives(&mut builder).finish().unwrap();

  let mut machine = booted(&image);
  machine.run_steps(1_000).unwrap();
  assert!(machine.is_halted());

  let text  = image::dump_to_string(machine.memory()).unwrap();
  let cells = image::parse(&text).unwrap();
  assert_eq!(cells, machine.memory().cells().to_vec());

  let slot = image.address("slot").unwrap() as usize / 4 + 1;
  assert_eq!(cells[slot], -7i32 as u32);
}
