/*!
  The character I/O collaborator behind `qrx` and `txsto`.

  Input is taken a line at a time. Each line is handed out one byte per `getchar` call and is
  terminated by a carriage return, the end-of-line the dictionary's line editor waits for. A
  line with no text yields a single line feed instead. Once the source runs dry every call
  returns 0, which `qrx` reports as "no character".
*/

use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};

/// End-of-line marker delivered after each line of text.
pub const CARRIAGE_RETURN: i32 = 13;
/// Delivered for a line that has no text.
pub const LINE_FEED: i32 = 10;
/// "No character available."
pub const NO_CHARACTER: i32 = 0;

pub trait Console {
  /// The next input character, or `NO_CHARACTER`.
  fn getchar(&mut self) -> io::Result<i32>;

  fn putchar(&mut self, byte: u8) -> io::Result<()>;
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum InputState {
  /// No character of the current line has been delivered; the next call reads a line.
  Idle,
  /// Delivering `line`; `position == line.len()` means only the carriage return is left.
  Reading { line: Vec<u8>, position: usize },
  /// The source hit end of input.
  Exhausted,
}

pub struct LineConsole<R: BufRead, W: Write> {
  input  : R,
  output : W,
  state  : InputState,
}

impl<R: BufRead, W: Write> LineConsole<R, W> {

  pub fn new(input: R, output: W) -> Self {
    LineConsole {
      input,
      output,
      state: InputState::Idle
    }
  }

  pub fn state(&self) -> &InputState {
    &self.state
  }

  pub fn output(&self) -> &W {
    &self.output
  }

  pub fn into_output(self) -> W {
    self.output
  }

  /// Reads one line with its line ending removed, `None` at end of input.
  fn read_line(&mut self) -> io::Result<Option<Vec<u8>>> {
    let mut line = Vec::new();
    if self.input.read_until(b'\n', &mut line)? == 0 {
      return Ok(None);
    }
    if line.last() == Some(&b'\n') {
      line.pop();
    }
    if line.last() == Some(&b'\r') {
      line.pop();
    }
    Ok(Some(line))
  }
}

impl<R: BufRead, W: Write> Console for LineConsole<R, W> {

  fn getchar(&mut self) -> io::Result<i32> {
    let state = std::mem::replace(&mut self.state, InputState::Idle);
    let (character, next_state) =
      match state {

        InputState::Idle => {
          match self.read_line()? {
            None                          => (NO_CHARACTER, InputState::Exhausted),
            Some(line) if line.is_empty() => (LINE_FEED, InputState::Idle),
            Some(line)                    => {
              (line[0] as i32, InputState::Reading { line, position: 1 })
            }
          }
        }

        InputState::Reading { line, position } if position < line.len() => {
          (line[position] as i32, InputState::Reading { line, position: position + 1 })
        }

        InputState::Reading { .. } => (CARRIAGE_RETURN, InputState::Idle),

        InputState::Exhausted => (NO_CHARACTER, InputState::Exhausted),

      };
    self.state = next_state;
    Ok(character)
  }

  fn putchar(&mut self, byte: u8) -> io::Result<()> {
    self.output.write_all(&[byte])?;
    self.output.flush()
  }
}

/// A console over the process's standard input and output.
pub fn stdio() -> LineConsole<BufReader<Stdin>, Stdout> {
  LineConsole::new(BufReader::new(io::stdin()), io::stdout())
}
