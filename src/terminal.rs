/// Where the render loop learns how many columns it has to work with. Queried
/// once per render pass so resizes are picked up.
pub trait WidthSource: Send {
    /// Current column count, or `None` if it can't be determined.
    fn columns(&self) -> Option<u16>;
}

/// The controlling terminal's width as reported by crossterm.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalWidth;

impl WidthSource for TerminalWidth {
    fn columns(&self) -> Option<u16> {
        match crossterm::terminal::size() {
            Ok((columns, _rows)) if columns > 0 => Some(columns),
            Ok(_) => None,
            Err(err) => {
                log::trace!("terminal size unavailable: {err}");
                None
            }
        }
    }
}

/// A width that never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedWidth(pub u16);

impl WidthSource for FixedWidth {
    fn columns(&self) -> Option<u16> {
        Some(self.0)
    }
}

/// A source that always fails, as a terminal does when output is redirected.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct NoTerminal;

#[cfg(test)]
impl WidthSource for NoTerminal {
    fn columns(&self) -> Option<u16> {
        None
    }
}
