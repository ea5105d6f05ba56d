use anyhow::Result;
use crossterm::{
    cursor::MoveUp,
    queue,
    terminal::{Clear, ClearType},
};
use std::io::Write;

/// One render pass worth of terminal output. Everything is buffered and written
/// with a single `write_all` + `flush` so a pass never reaches the terminal half done.
pub struct Frame<'a, W: Write> {
    output: &'a mut W,
    bytes: Vec<u8>,
}

impl<'a, W: Write> Frame<'a, W> {
    pub fn new(output: &'a mut W) -> Self {
        Self {
            output,
            bytes: Vec::new(),
        }
    }

    /// Removes the `lines` rows above the cursor: for each one, move up, clear
    /// it and return to column 0.
    pub fn erase(&mut self, lines: usize) -> Result<&mut Self> {
        for _ in 0..lines {
            queue!(self.bytes, MoveUp(1), Clear(ClearType::CurrentLine))?;
            self.bytes.push(b'\r');
        }
        Ok(self)
    }

    pub fn line(&mut self, line: &str) -> &mut Self {
        self.bytes.extend(line.as_bytes());
        self
    }

    pub fn render(&mut self) -> Result<()> {
        self.output.write_all(&self.bytes)?;
        self.output.flush()?;
        self.bytes.clear();
        Ok(())
    }
}
