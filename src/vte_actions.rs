//! Decodes what the render loop wrote back into semantic terminal actions, so
//! tests can assert on cursor movement and clearing instead of raw escape bytes.

use crate::vte_actions::VteAction::{CarriageReturn, CursorUp, EraseLine, LineFeed, Text};
use vte::{Params, Parser, Perform};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VteAction {
    /// A run of printable characters.
    Text(String),
    LineFeed,
    CarriageReturn,
    CursorUp(u16),
    /// `CSI n K`, with the mode parameter (2 = whole line).
    EraseLine(u16),
}

pub fn parse_actions(bytes: &[u8]) -> Vec<VteAction> {
    let mut parser = Parser::new();
    let mut performer = Performer::default();
    for byte in bytes {
        parser.advance(&mut performer, *byte);
    }
    performer.actions
}

/// Splits the actions into passes: everything between two runs of erase
/// sequences. Returns, for each pass, the number of lines erased before it and
/// the text lines printed in it.
pub fn passes(actions: &[VteAction]) -> Vec<(usize, Vec<String>)> {
    let mut passes: Vec<(usize, Vec<String>)> = Vec::new();
    let mut erased = 0;
    let mut current: Option<Vec<String>> = None;
    let mut pending = String::new();
    for action in actions {
        match action {
            Text(text) => pending.push_str(text),
            LineFeed => current
                .get_or_insert_with(Vec::new)
                .push(std::mem::take(&mut pending)),
            CursorUp(_) => {
                if let Some(lines) = current.take() {
                    passes.push((erased, lines));
                    erased = 0;
                }
            }
            EraseLine(2) => erased += 1,
            EraseLine(_) | CarriageReturn => {}
        }
    }
    if let Some(lines) = current {
        passes.push((erased, lines));
    }
    passes
}

#[derive(Default)]
struct Performer {
    actions: Vec<VteAction>,
}

// Implementation largely inspired by vt100-rust:
// https://github.com/doy/vt100-rust/blob/main/src/perform.rs
impl Perform for Performer {
    fn print(&mut self, c: char) {
        if let Some(Text(text)) = self.actions.last_mut() {
            text.push(c);
        } else {
            self.actions.push(Text(c.to_string()));
        }
    }

    fn execute(&mut self, byte: u8) {
        let action = match byte {
            10 => LineFeed,
            13 => CarriageReturn,
            _ => return,
        };
        self.actions.push(action);
    }

    fn csi_dispatch(&mut self, params: &Params, intermediates: &[u8], _ignore: bool, c: char) {
        if intermediates.is_empty() {
            let action = match c {
                'A' => CursorUp(params.canonicalize(1)),
                'K' => EraseLine(params.first_or(0)),
                _ => return,
            };
            self.actions.push(action);
        }
    }
}

trait ParamsCanonicalize {
    fn first_or(&self, default: u16) -> u16;

    /// Like [first_or](Self::first_or), but an explicit 0 also means `default`.
    fn canonicalize(&self, default: u16) -> u16;
}

impl ParamsCanonicalize for Params {
    fn first_or(&self, default: u16) -> u16 {
        self.iter()
            .next()
            .and_then(|x| x.first().copied())
            .unwrap_or(default)
    }

    fn canonicalize(&self, default: u16) -> u16 {
        match self.first_or(default) {
            0 => default,
            x => x,
        }
    }
}

#[cfg(test)]
mod test {
    use crate::vte_actions::{parse_actions, passes, VteAction::*};

    #[test]
    fn decodes_erase_and_text() {
        let actions = parse_actions(b"ab\n\x1b[1A\x1b[2K\r");
        assert_eq!(
            actions,
            vec![
                Text("ab".to_string()),
                LineFeed,
                CursorUp(1),
                EraseLine(2),
                CarriageReturn
            ]
        );
    }

    #[test]
    fn groups_output_into_passes() {
        let actions = parse_actions(b"a> 1\nb> 1\n\x1b[1A\x1b[2K\r\x1b[1A\x1b[2K\ra> 2\nb> 2\n");
        assert_eq!(
            passes(&actions),
            vec![
                (0, vec!["a> 1".to_string(), "b> 1".to_string()]),
                (2, vec!["a> 2".to_string(), "b> 2".to_string()]),
            ]
        );
    }
}
