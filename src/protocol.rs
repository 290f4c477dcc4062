//! Device wire protocol.
//!
//! The encoder firmware sends one token per line: `l`/`r` for a full detent
//! left or right, `d`/`u` for button down and up, each followed by a single
//! `\n`. Anything else on a line is noise and gets dropped.

use memchr::memchr;
use once_cell::sync::Lazy;
use regex::Regex;

static EXPECTED_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[lrud]\n$").expect("token pattern is valid"));

/// Longest run of bytes without a newline that the splitter keeps.
pub const MAX_PENDING_LINE: usize = 256;

/// One decoded input from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    /// Encoder turned one step counter-clockwise.
    Left,
    /// Encoder turned one step clockwise.
    Right,
    /// Button pressed.
    Down,
    /// Button released.
    Up,
}

impl Token {
    /// Parse a raw line including its trailing `\n`.
    ///
    /// Returns `None` for anything but exactly one token character followed
    /// by a line feed (`"r\r\n"` and `"rr\n"` are both rejected).
    pub fn parse_line(line: &str) -> Option<Self> {
        if !EXPECTED_LINE.is_match(line) {
            return None;
        }
        match line.as_bytes()[0] {
            b'l' => Some(Self::Left),
            b'r' => Some(Self::Right),
            b'd' => Some(Self::Down),
            b'u' => Some(Self::Up),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::Left => 'l',
            Self::Right => 'r',
            Self::Down => 'd',
            Self::Up => 'u',
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Reassembles newline-terminated lines from arbitrary read chunks.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
    /// Set after an overflow; bytes are dropped through the next `\n`.
    discarding: bool,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and get back every line it completed, each still ending
    /// in `\n`. A partial line without a newline is held for the next chunk,
    /// up to [`MAX_PENDING_LINE`] bytes; a line longer than that is dropped
    /// as a whole, including its terminator.
    pub fn push(&mut self, mut chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();

        while let Some(pos) = memchr(b'\n', chunk) {
            if self.discarding {
                self.discarding = false;
            } else if self.pending.len() + pos > MAX_PENDING_LINE {
                self.pending.clear();
            } else {
                self.pending.extend_from_slice(&chunk[..=pos]);
                lines.push(String::from_utf8_lossy(&self.pending).into_owned());
                self.pending.clear();
            }
            chunk = &chunk[pos + 1..];
        }

        if self.discarding {
            return lines;
        }
        if self.pending.len() + chunk.len() > MAX_PENDING_LINE {
            self.pending.clear();
            self.discarding = true;
        } else {
            self.pending.extend_from_slice(chunk);
        }

        lines
    }
}
