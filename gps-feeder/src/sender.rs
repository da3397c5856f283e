//! TCP connection to the tracker's device port.

use std::io::{self, Write};
use std::net::TcpStream;

/// Writes telemetry messages the way a device does: one write per message.
pub struct TelemetrySender {
    stream: TcpStream,
    newline: bool,
    pub sent: u64,
}

impl TelemetrySender {
    pub fn connect(addr: &str, newline: bool) -> io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        Ok(TelemetrySender {
            stream,
            newline,
            sent: 0,
        })
    }

    /// Send one message, `\n`-terminated unless disabled.
    pub fn send(&mut self, message: &str) -> io::Result<()> {
        let mut out = Vec::with_capacity(message.len() + 1);
        out.extend_from_slice(message.as_bytes());
        if self.newline {
            out.push(b'\n');
        }
        self.stream.write_all(&out)?;
        self.sent += 1;
        Ok(())
    }
}
