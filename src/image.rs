/*!
  The textual memory snapshot. `bye` writes the whole word view in address order, one cell per
  line, in a form that can be read back as the initial image of a later run:

  ```text
  // vfm memory image: 4096 cells
  /* 00000000 */ 0x00000006,
  /* 00000004 */ 0x00000018,
  ```

  The address comment is informational. The parser also takes blank lines, `//` comments, and
  decimal values, so hand-written images are fine too.
*/

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use nom::{
  branch::alt,
  bytes::complete::{tag, tag_no_case, take_until},
  character::complete::{char as one_char, digit1, hex_digit1, not_line_ending, space0},
  combinator::{all_consuming, map_res, opt, recognize},
  sequence::{delimited, pair, preceded, terminated, tuple},
  IResult,
};
use tracing::debug;

use crate::error::{Result, VmError};
use crate::memory::{Memory, Word, CELL_BYTES};

/// `strftime` pattern for snapshot file names.
pub const SNAPSHOT_NAME_FORMAT: &str = "%m-%d-%Y %H_%M_%S_rom.txt";

/// Writes the snapshot of `memory` to `writer`.
pub fn dump<W: Write>(memory: &Memory, writer: &mut W) -> Result<()> {
  writeln!(writer, "// vfm memory image: {} cells", memory.len())?;
  for (i, word) in memory.cells().iter().enumerate() {
    writeln!(writer, "/* {:08X} */ 0x{:08X},", i as u32 * CELL_BYTES, word)?;
  }
  Ok(())
}

pub fn dump_to_string(memory: &Memory) -> Result<String> {
  let mut buffer = Vec::new();
  dump(memory, &mut buffer)?;
  Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Writes a snapshot into `dir`, named by the current local time. Returns the path written.
pub fn dump_file(memory: &Memory, dir: &Path) -> Result<PathBuf> {
  let name = chrono::Local::now().format(SNAPSHOT_NAME_FORMAT).to_string();
  let path = dir.join(name);
  let mut file = fs::File::create(&path)?;
  dump(memory, &mut file)?;
  file.flush()?;
  debug!(path = %path.display(), cells = memory.len(), "wrote memory snapshot");
  Ok(path)
}

fn hex_value(input: &str) -> IResult<&str, Word> {
  map_res(
    preceded(tag_no_case("0x"), hex_digit1),
    |digits: &str| Word::from_str_radix(digits, 16)
  )(input)
}

fn decimal_value(input: &str) -> IResult<&str, Word> {
  map_res(digit1, |digits: &str| digits.parse::<Word>())(input)
}

fn address_comment(input: &str) -> IResult<&str, &str> {
  recognize(tuple((tag("/*"), take_until("*/"), tag("*/"))))(input)
}

/// One cell line: `[/* addr */] value[,] [// comment]`.
fn cell_line(input: &str) -> IResult<&str, Word> {
  all_consuming(
    delimited(
      pair(space0, opt(terminated(address_comment, space0))),
      alt((hex_value, decimal_value)),
      tuple((space0, opt(one_char(',')), space0, opt(pair(tag("//"), not_line_ending))))
    )
  )(input)
}

/// Parses snapshot text into cell values.
pub fn parse(text: &str) -> Result<Vec<Word>> {
  let mut cells = Vec::new();
  for (i, line) in text.lines().enumerate() {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with("//") {
      continue;
    }
    match cell_line(line) {
      Ok((_, word)) => cells.push(word),
      Err(_)        => {
        return Err(VmError::Image {
          line    : i + 1,
          message : format!("expected a cell value, found `{}`", trimmed)
        });
      }
    }
  }
  Ok(cells)
}

/// Reads a snapshot file, rejecting images larger than `capacity` cells.
pub fn load_file(path: &Path, capacity: usize) -> Result<Vec<Word>> {
  let text  = fs::read_to_string(path)?;
  let cells = parse(&text)?;
  if cells.len() > capacity {
    return Err(VmError::ImageTooLarge { cells: cells.len(), capacity });
  }
  debug!(path = %path.display(), cells = cells.len(), "loaded memory image");
  Ok(cells)
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dump_then_parse_is_lossless() {
    let mut memory = Memory::new(5);
    memory.load(&[0, 0xFFFF_FFFF, 0x8000_0000, 0x0000_0006, 12345]).unwrap();

    let text = dump_to_string(&memory).unwrap();
    assert!(text.contains("/* 00000004 */ 0xFFFFFFFF,"));
    assert_eq!(parse(&text).unwrap(), memory.cells().to_vec());
  }

  #[test]
  fn parses_hand_written_images() {
    let text = "\
      // a tiny image\n\
      \n\
      0x18,\n\
      42 // answer\n\
      /* 00000008 */ 0XaBcD\n";
    assert_eq!(parse(text).unwrap(), vec![0x18, 42, 0xABCD]);
  }

  #[test]
  fn reports_the_offending_line() {
    let text = "0x1,\nnot a cell\n";
    match parse(text) {
      Err(VmError::Image { line, .. }) => assert_eq!(line, 2),
      other                            => panic!("unexpected result: {:?}", other),
    }
  }

  #[test]
  fn rejects_values_wider_than_a_cell() {
    assert!(parse("0x100000000\n").is_err());
  }
}
