/*!
  The primitive library. Each primitive transforms registers, stacks, and memory, and only
  `qrx` and `txsto` touch anything else. Stack effects are given in the usual Forth notation,
  rightmost item on top.

  The data stack's top element lives in `Registers::top`; the array only holds the second
  element and below. Every primitive leaves `top` holding the first element and the array
  slot at the stack pointer holding the second.

  Primitives that thread through a token list end by calling `next`. The rest fall through
  to the following opcode in their code field, which is normally `nop`.
*/

use crate::console::Console;
use crate::error::Result;
use crate::machine::{Machine, FALSE, TRUE};
use crate::memory::CELL_BYTES;

const CELL: i32 = CELL_BYTES as i32;

/// Maps a test onto the machine's flag cells.
pub fn logical(test: bool) -> i32 {
  match test {
    true  => TRUE,
    false => FALSE
  }
}

/// True if `x < y` as unsigned cells.
pub fn lower(x: i32, y: i32) -> i32 {
  logical((x as u32) < (y as u32))
}

/// Joins a high and a low cell into a signed double. The low cell contributes its full
/// unsigned range.
fn signed_double(high: i32, low: i32) -> i64 {
  ((high as i64) << 32) + (low as u32 as i64)
}

fn unsigned_double(high: i32, low: i32) -> u64 {
  ((high as u32 as u64) << 32) + (low as u32 as u64)
}

impl<C: Console> Machine<C> {

  // region Inner interpreter

  /// Threads to the next token: `P` gets the code field address at `IP`, `WP` its parameter
  /// field, and `IP` moves on one cell.
  pub(crate) fn next(&mut self) -> Result<()> {
    self.registers.p  = self.cell_at(self.registers.ip)?;
    self.registers.wp = self.registers.p.wrapping_add(CELL);
    self.registers.ip = self.registers.ip.wrapping_add(CELL);
    Ok(())
  }

  /// nop ( -- )
  pub(crate) fn nop(&mut self) -> Result<()> {
    self.next()
  }

  /// bye ( -- ) Stops the dispatch loop.
  pub(crate) fn bye(&mut self) {
    self.halted = true;
  }

  /// dovar ( -- a ) The parameter field address of a variable.
  pub(crate) fn dovar(&mut self) {
    self.push(self.registers.wp);
  }

  /// docon ( -- n ) The cell stored in a constant's parameter field.
  pub(crate) fn docon(&mut self) -> Result<()> {
    let value = self.cell_at(self.registers.wp)?;
    self.push(value);
    Ok(())
  }

  /// dolit ( -- w ) Pushes the in-line literal following the current token.
  pub(crate) fn dolit(&mut self) -> Result<()> {
    let value = self.cell_at(self.registers.ip)?;
    self.push(value);
    self.registers.ip = self.registers.ip.wrapping_add(CELL);
    self.next()
  }

  /// dolist ( -- ) Enters a compound command, saving `IP` on the return stack.
  pub(crate) fn dolist(&mut self) -> Result<()> {
    self.push_return(self.registers.ip);
    self.registers.ip = self.registers.wp;
    self.next()
  }

  /// exitt ( -- ) Leaves a compound command, resuming the caller's token list.
  pub(crate) fn exitt(&mut self) -> Result<()> {
    self.registers.ip = self.pop_return();
    self.next()
  }

  /// execu ( a -- ) Executes the code field at `a`.
  pub(crate) fn execu(&mut self) {
    self.registers.p  = self.registers.top;
    self.registers.wp = self.registers.p.wrapping_add(CELL);
    self.pop();
  }

  /**
    donext ( -- ) Closes a counted loop. The count on top of the return stack is decremented;
    while it is non-zero, control branches to the address in the following cell. When it
    reaches zero the count is dropped and the branch address skipped.
  */
  pub(crate) fn donext(&mut self) -> Result<()> {
    let count = self.returns.top().wrapping_sub(1);
    match count != 0 {

      true  => {
        self.returns.set_top(count);
        self.registers.ip = self.cell_at(self.registers.ip)?;
      }

      false => {
        self.registers.ip = self.registers.ip.wrapping_add(CELL);
        self.returns.discard();
      }

    }
    self.next()
  }

  /// qbran ( f -- ) Branches to the address in the following cell if `f` is zero.
  pub(crate) fn qbran(&mut self) -> Result<()> {
    match self.registers.top == 0 {
      true  => self.registers.ip = self.cell_at(self.registers.ip)?,
      false => self.registers.ip = self.registers.ip.wrapping_add(CELL),
    }
    self.pop();
    self.next()
  }

  /// bran ( -- ) Branches to the address in the following cell.
  pub(crate) fn bran(&mut self) -> Result<()> {
    self.registers.ip = self.cell_at(self.registers.ip)?;
    self.next()
  }

  // endregion

  // region Console

  /// qrx ( -- c T | 0 ) A character and a true flag, or just 0 when nothing was received.
  pub(crate) fn qrx(&mut self) -> Result<()> {
    let character = self.console.getchar()?;
    self.push(character);
    if self.registers.top != 0 {
      self.push(TRUE);
    }
    Ok(())
  }

  /// txsto ( c -- ) Sends the low byte of `c` to the console.
  pub(crate) fn txsto(&mut self) -> Result<()> {
    self.console.putchar(self.registers.top as u8)?;
    self.pop();
    Ok(())
  }

  // endregion

  // region Memory access

  /// store ( n a -- )
  pub(crate) fn store(&mut self) -> Result<()> {
    self.set_cell_at(self.registers.top, self.second())?;
    self.data.discard();
    self.pop();
    Ok(())
  }

  /// at ( a -- n )
  pub(crate) fn at(&mut self) -> Result<()> {
    self.registers.top = self.cell_at(self.registers.top)?;
    Ok(())
  }

  /// cstor ( c b -- )
  pub(crate) fn cstor(&mut self) -> Result<()> {
    self.set_byte_at(self.registers.top, self.second())?;
    self.data.discard();
    self.pop();
    Ok(())
  }

  /// cat ( b -- c )
  pub(crate) fn cat(&mut self) -> Result<()> {
    self.registers.top = self.byte_at(self.registers.top)?;
    Ok(())
  }

  /// pstor ( n a -- ) Adds `n` to the cell at `a`.
  pub(crate) fn pstor(&mut self) -> Result<()> {
    let address = self.registers.top;
    let sum     = self.cell_at(address)?.wrapping_add(self.second());
    self.set_cell_at(address, sum)?;
    self.data.discard();
    self.pop();
    Ok(())
  }

  /// dstor ( d a -- ) Low cell at `a`, high cell at `a` plus one cell.
  pub(crate) fn dstor(&mut self) -> Result<()> {
    let address = self.registers.top;
    self.set_cell_at(address.wrapping_add(CELL), self.second())?;
    self.data.discard();
    self.set_cell_at(address, self.second())?;
    self.data.discard();
    self.pop();
    Ok(())
  }

  /// dat ( a -- d )
  pub(crate) fn dat(&mut self) -> Result<()> {
    let address = self.registers.top;
    let low     = self.cell_at(address)?;
    let high    = self.cell_at(address.wrapping_add(CELL))?;
    self.registers.top = low;
    self.push(high);
    Ok(())
  }

  /// count ( b -- b+1 +n ) Splits a counted string into its text address and length.
  pub(crate) fn count(&mut self) -> Result<()> {
    let address = self.registers.top;
    let length  = self.byte_at(address)?;
    self.data.push(address.wrapping_add(1));
    self.registers.top = length;
    Ok(())
  }

  // endregion

  // region Return stack

  /// rfrom ( -- n ) Moves the top of the return stack to the data stack.
  pub(crate) fn rfrom(&mut self) {
    let value = self.pop_return();
    self.push(value);
  }

  /// rat ( -- n ) Copies the top of the return stack.
  pub(crate) fn rat(&mut self) {
    self.push(self.returns.top());
  }

  /// tor ( n -- ) Moves the top of the data stack to the return stack.
  pub(crate) fn tor(&mut self) {
    self.push_return(self.registers.top);
    self.pop();
  }

  // endregion

  // region Stack shuffles

  /// drop ( w -- )
  pub(crate) fn drop(&mut self) {
    self.pop();
  }

  /// dup ( w -- w w )
  pub(crate) fn dup(&mut self) {
    self.data.push(self.registers.top);
  }

  /// swap ( w1 w2 -- w2 w1 )
  pub(crate) fn swap(&mut self) {
    let top = self.registers.top;
    self.registers.top = self.second();
    self.set_second(top);
  }

  /// over ( w1 w2 -- w1 w2 w1 )
  pub(crate) fn over(&mut self) {
    self.push(self.second());
  }

  /// qdup ( w -- w w | 0 )
  pub(crate) fn qdup(&mut self) {
    if self.registers.top != 0 {
      self.data.push(self.registers.top);
    }
  }

  /// rot ( w1 w2 w3 -- w2 w3 w1 )
  pub(crate) fn rot(&mut self) {
    let w1 = self.data.below(1);
    self.data.set_below(1, self.second());
    self.set_second(self.registers.top);
    self.registers.top = w1;
  }

  /// ddrop ( w w -- )
  pub(crate) fn ddrop(&mut self) {
    self.pop();
    self.pop();
  }

  /// ddup ( w1 w2 -- w1 w2 w1 w2 )
  pub(crate) fn ddup(&mut self) {
    self.over();
    self.over();
  }

  /// pick ( ... +n -- ... w ) Copies the item `n` slots below the stack pointer. Unchecked.
  pub(crate) fn pick(&mut self) {
    self.registers.top = self.data.below(self.registers.top as u8);
  }

  // endregion

  // region Logic

  /// zless ( n -- f )
  pub(crate) fn zless(&mut self) {
    self.registers.top = logical(self.registers.top < 0);
  }

  /// andd ( w w -- w )
  pub(crate) fn andd(&mut self) {
    self.registers.top &= self.second();
    self.data.discard();
  }

  /// orr ( w w -- w )
  pub(crate) fn orr(&mut self) {
    self.registers.top |= self.second();
    self.data.discard();
  }

  /// xorr ( w w -- w )
  pub(crate) fn xorr(&mut self) {
    self.registers.top ^= self.second();
    self.data.discard();
  }

  /// equal ( w w -- t )
  pub(crate) fn equal(&mut self) {
    self.registers.top = logical(self.second() == self.registers.top);
    self.data.discard();
  }

  /// uless ( u1 u2 -- t )
  pub(crate) fn uless(&mut self) {
    self.registers.top = lower(self.second(), self.registers.top);
    self.data.discard();
  }

  /// less ( n1 n2 -- t )
  pub(crate) fn less(&mut self) {
    self.registers.top = logical(self.second() < self.registers.top);
    self.data.discard();
  }

  /// great ( n1 n2 -- t )
  pub(crate) fn great(&mut self) {
    self.registers.top = logical(self.second() > self.registers.top);
    self.data.discard();
  }

  /// maxx ( n1 n2 -- n )
  pub(crate) fn maxx(&mut self) {
    match self.registers.top < self.second() {
      true  => self.pop(),
      false => self.data.discard(),
    }
  }

  /// minn ( n1 n2 -- n )
  pub(crate) fn minn(&mut self) {
    match self.registers.top < self.second() {
      true  => self.data.discard(),
      false => self.pop(),
    }
  }

  // endregion

  // region Single cell arithmetic

  /// uplus ( w w -- w cy ) Sum and carry. The carry is the bit itself, 0 or 1, so it can be
  /// added straight into a high cell.
  pub(crate) fn uplus(&mut self) {
    let sum = self.second().wrapping_add(self.registers.top);
    self.set_second(sum);
    self.registers.top = ((sum as u32) < (self.registers.top as u32)) as i32;
  }

  /// plus ( w w -- sum )
  pub(crate) fn plus(&mut self) {
    self.registers.top = self.registers.top.wrapping_add(self.second());
    self.data.discard();
  }

  /// subb ( n1 n2 -- n1-n2 )
  pub(crate) fn subb(&mut self) {
    self.registers.top = self.second().wrapping_sub(self.registers.top);
    self.data.discard();
  }

  /// star ( n n -- n )
  pub(crate) fn star(&mut self) {
    self.registers.top = self.registers.top.wrapping_mul(self.second());
    self.data.discard();
  }

  /// inver ( w -- w ) One's complement.
  pub(crate) fn inver(&mut self) {
    self.registers.top = !self.registers.top;
  }

  /// negat ( n -- -n ) Two's complement.
  pub(crate) fn negat(&mut self) {
    self.registers.top = self.registers.top.wrapping_neg();
  }

  /// abss ( n -- n ) The most negative cell is its own absolute value.
  pub(crate) fn abss(&mut self) {
    self.registers.top = self.registers.top.wrapping_abs();
  }

  /// slmod ( n1 n2 -- r q ) Truncating. Both operands stay put when `n2` is zero.
  pub(crate) fn slmod(&mut self) {
    let divisor = self.registers.top;
    if divisor != 0 {
      let dividend = self.second();
      self.set_second(dividend.wrapping_rem(divisor));
      self.registers.top = dividend.wrapping_div(divisor);
    }
  }

  /// mod ( n n -- r ) Division by zero leaves the dividend.
  pub(crate) fn modulo(&mut self) {
    let divisor  = self.registers.top;
    let dividend = self.second();
    self.registers.top =
      match divisor != 0 {
        true  => dividend.wrapping_rem(divisor),
        false => dividend
      };
    self.data.discard();
  }

  /// slash ( n n -- q ) Division by zero leaves the dividend, zeroing the vacated slot.
  pub(crate) fn slash(&mut self) {
    let divisor  = self.registers.top;
    let dividend = self.second();
    match divisor != 0 {

      true  => self.registers.top = dividend.wrapping_div(divisor),

      false => {
        self.registers.top = dividend;
        self.set_second(0);
      }

    }
    self.data.discard();
  }

  // endregion

  // region Double cell arithmetic

  /// dnega ( d -- -d ) Built from the single cell primitives: invert both halves, then add
  /// one with carry into the high cell.
  pub(crate) fn dnega(&mut self) {
    self.inver();
    self.tor();
    self.inver();
    self.push(1);
    self.uplus();
    self.rfrom();
    self.plus();
  }

  /// umsta ( u1 u2 -- ud )
  pub(crate) fn umsta(&mut self) {
    let product = (self.second() as u32 as u64) * (self.registers.top as u32 as u64);
    self.registers.top = (product >> 32) as i32;
    self.set_second(product as u32 as i32);
  }

  /// mstar ( n1 n2 -- d )
  pub(crate) fn mstar(&mut self) {
    let product = (self.second() as i64) * (self.registers.top as i64);
    self.registers.top = (product >> 32) as i32;
    self.set_second(product as i32);
  }

  /// ummod ( udl udh u -- ur uq ) A zero divisor gives all-ones for both results.
  pub(crate) fn ummod(&mut self) {
    let divisor  = self.registers.top as u32 as u64;
    let dividend = unsigned_double(self.second(), self.data.below(1));
    self.pop();
    match divisor {

      0 => {
        self.registers.top = TRUE;
        self.set_second(TRUE);
      }

      _ => {
        self.registers.top = (dividend / divisor) as u32 as i32;
        self.set_second((dividend % divisor) as u32 as i32);
      }

    }
  }

  /// msmod ( d n -- r q ) Signed and truncating. A zero divisor gives all-ones for both.
  pub(crate) fn msmod(&mut self) {
    let divisor  = self.registers.top as i64;
    let dividend = signed_double(self.second(), self.data.below(1));
    self.pop();
    self.set_quotient_remainder(dividend, divisor);
  }

  /// ssmod ( n1 n2 n3 -- r q ) `n2` and `n1` are joined as the high and low cells of a
  /// double, which is divided by `n3`.
  pub(crate) fn ssmod(&mut self) {
    let divisor  = self.registers.top as i64;
    let dividend = signed_double(self.second(), self.data.below(1));
    self.pop();
    self.set_quotient_remainder(dividend, divisor);
  }

  /// stasl ( n1 n2 n3 -- q ) As `ssmod`, keeping only the quotient.
  pub(crate) fn stasl(&mut self) {
    let divisor  = self.registers.top as i64;
    let dividend = signed_double(self.second(), self.data.below(1));
    self.pop();
    self.pop();
    self.registers.top =
      match divisor {
        0 => TRUE,
        _ => dividend.wrapping_div(divisor) as i32
      };
  }

  fn set_quotient_remainder(&mut self, dividend: i64, divisor: i64) {
    match divisor {

      0 => {
        self.registers.top = TRUE;
        self.set_second(TRUE);
      }

      _ => {
        self.registers.top = dividend.wrapping_div(divisor) as i32;
        self.set_second(dividend.wrapping_rem(divisor) as i32);
      }

    }
  }

  // endregion
}
