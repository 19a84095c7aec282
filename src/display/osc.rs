//! Minimal OSC 1.0 message encoder.
//!
//! Packet layout:
//! ```text
//! ┌──────────────┬──────────────┬───────────────┐
//! │ address      │ type tags    │ arguments     │
//! │ str0, pad 4  │ ",si…" pad 4 │ big-endian    │
//! └──────────────┴──────────────┴───────────────┘
//! ```
//! Only the two argument types the wall needs are supported.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OscArg {
    Int(i32),
    Str(String),
}

impl OscArg {
    fn tag(&self) -> char {
        match self {
            OscArg::Int(_) => 'i',
            OscArg::Str(_) => 's',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OscMessage {
    pub address: String,
    pub args: Vec<OscArg>,
}

impl OscMessage {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: OscArg) -> Self {
        self.args.push(arg);
        self
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64);
        write_padded_str(&mut buf, &self.address);

        let tags: String = std::iter::once(',')
            .chain(self.args.iter().map(OscArg::tag))
            .collect();
        write_padded_str(&mut buf, &tags);

        for arg in &self.args {
            match arg {
                OscArg::Int(v) => buf.extend_from_slice(&v.to_be_bytes()),
                OscArg::Str(s) => write_padded_str(&mut buf, s),
            }
        }
        buf
    }
}

/// Null-terminate and pad to a 4-byte boundary. `buf` is always aligned on
/// entry.
fn write_padded_str(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
    while buf.len() % 4 != 0 {
        buf.push(0);
    }
}
