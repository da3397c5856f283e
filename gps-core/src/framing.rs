//! Message framing for the device byte stream.
//!
//! - `Framing::PerRead`: each transport read is one message.
//! - `Framing::Lines`: messages are `\n`-terminated; a trailing partial line
//!   is held until more bytes arrive or the caller flushes it (idle / EOF).

use std::fmt;
use std::str::FromStr;

/// Upper bound on a single message, matching the device's receive buffer.
pub const DEFAULT_MAX_LINE: usize = 1024;

/// How the device stream is split into messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framing {
    #[default]
    Lines,
    PerRead,
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Framing::Lines => f.write_str("lines"),
            Framing::PerRead => f.write_str("per-read"),
        }
    }
}

impl FromStr for Framing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lines" | "line" | "newline" => Ok(Framing::Lines),
            "per-read" | "per_read" | "read" => Ok(Framing::PerRead),
            other => Err(format!("unknown framing '{other}' (expected 'lines' or 'per-read')")),
        }
    }
}

/// One unit produced by the framer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A complete message, terminator and trailing `\r` removed.
    Line(Vec<u8>),
    /// A message exceeded the length limit; this many bytes were dropped.
    Overflow(usize),
}

/// Accumulates stream bytes and splits them on `\n`.
#[derive(Debug)]
pub struct LineFramer {
    buf: Vec<u8>,
    max_line: usize,
    // Set after an overflow: skip bytes up to the next terminator.
    discarding: bool,
}

impl LineFramer {
    pub fn new(max_line: usize) -> Self {
        LineFramer {
            buf: Vec::new(),
            max_line: max_line.max(1),
            discarding: false,
        }
    }

    /// Feed bytes from one read; returns every message they complete.
    pub fn push(&mut self, data: &[u8]) -> Vec<Frame> {
        let mut frames = Vec::new();
        let mut rest = data;

        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            let (head, tail) = rest.split_at(pos);
            rest = &tail[1..];

            if self.discarding {
                self.discarding = false;
                continue;
            }

            self.buf.extend_from_slice(head);
            let line = std::mem::take(&mut self.buf);
            if line.len() > self.max_line {
                frames.push(Frame::Overflow(line.len()));
            } else if let Some(line) = non_blank(line) {
                frames.push(Frame::Line(line));
            }
        }

        if self.discarding {
            return frames;
        }

        self.buf.extend_from_slice(rest);
        if self.buf.len() > self.max_line {
            frames.push(Frame::Overflow(self.buf.len()));
            self.buf.clear();
            self.discarding = true;
        }

        frames
    }

    /// True when bytes of an unterminated message are buffered.
    pub fn has_partial(&self) -> bool {
        !self.buf.is_empty()
    }

    /// Take the buffered partial message, if it holds anything but whitespace.
    pub fn flush(&mut self) -> Option<Vec<u8>> {
        self.discarding = false;
        non_blank(std::mem::take(&mut self.buf))
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        LineFramer::new(DEFAULT_MAX_LINE)
    }
}

fn non_blank(mut line: Vec<u8>) -> Option<Vec<u8>> {
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    if line.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        Some(line)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
