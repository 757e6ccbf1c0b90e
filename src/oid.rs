//! 12 byte ObjectIds.
//!
//! Layout of a generated id:
//!
//! ```text
//! | seconds since epoch (4, BE) | process value (5) | counter (3, BE) |
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use tracing::trace;

use crate::error::{Error, Result};

/// A MongoDB ObjectId, or the explicitly invalid id.
///
/// Parsing never fails, bad input gives an invalid id that callers check with
/// [`Oid::is_valid`]. Ids compare lexicographically by their bytes, every
/// invalid id is equal to the others and sorts before all valid ones.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Oid {
    bytes: Option<[u8; 12]>,
}

struct Generator {
    process: [u8; 5],
    counter: AtomicU32,
}

static GENERATOR: OnceLock<Generator> = OnceLock::new();

fn generator() -> &'static Generator {
    GENERATOR.get_or_init(|| {
        let mut rng = rand::rng();
        let process: [u8; 5] = rng.random();
        let counter = rng.random::<u32>() & 0x00FF_FFFF;
        trace!(counter, "seeded object id generator");
        Generator {
            process,
            counter: AtomicU32::new(counter),
        }
    })
}

fn now_seconds() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

impl Oid {
    /// Generates a fresh id from the clock, the process value and the counter.
    pub fn new() -> Self {
        Oid::with_timestamp(now_seconds())
    }

    /// Generates a fresh id carrying `seconds` as its timestamp.
    pub fn with_timestamp(seconds: u32) -> Self {
        let gen = generator();
        let count = gen.counter.fetch_add(1, Ordering::Relaxed) & 0x00FF_FFFF;

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(&gen.process);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        Oid { bytes: Some(bytes) }
    }

    /// Parses 24 hexadecimal characters, anything else is an invalid id.
    pub fn parse(s: &str) -> Self {
        if s.len() != 24 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Oid::default();
        }
        match bintext::hex::decode(s) {
            Ok(bytes) => Oid::from_bytes(&bytes),
            Err(_) => Oid::default(),
        }
    }

    /// Wraps exactly 12 raw bytes, anything else is an invalid id.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.len() != 12 {
            return Oid::default();
        }
        let mut raw = [0u8; 12];
        raw.copy_from_slice(bytes);
        Oid { bytes: Some(raw) }
    }

    pub fn is_valid(&self) -> bool {
        self.bytes.is_some()
    }

    pub fn bytes(&self) -> Option<&[u8; 12]> {
        self.bytes.as_ref()
    }

    /// Seconds since the unix epoch stored in the first four bytes.
    pub fn timestamp(&self) -> Option<u32> {
        self.bytes
            .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Lower case hexadecimal, empty for the invalid id.
    pub fn to_hex(&self) -> String {
        match &self.bytes {
            Some(bytes) => {
                let mut hex = bintext::hex::encode(&bytes[..]);
                hex.make_ascii_lowercase();
                hex
            }
            None => String::new(),
        }
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_valid() {
            write!(f, "Oid({})", self.to_hex())
        } else {
            f.write_str("Oid(invalid)")
        }
    }
}

impl FromStr for Oid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let oid = Oid::parse(s);
        if oid.is_valid() {
            Ok(oid)
        } else {
            Err(Error::InvalidOid)
        }
    }
}
