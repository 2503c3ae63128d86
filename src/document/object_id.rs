//! 12-byte unique identifiers
//!
//! Layout (big-endian): 4 bytes unix seconds, 3 bytes machine id,
//! 2 bytes process id, 3 bytes increment. Ordering is bytewise, so ids sort
//! by creation time first.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

use chrono::{DateTime, TimeZone, Utc};
use rand::Rng;

use super::errors::DocumentError;

static MACHINE_ID: OnceLock<u32> = OnceLock::new();
static INCREMENT: OnceLock<AtomicU32> = OnceLock::new();

/// Unique identifier generated without coordination
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    /// Creates a new id for the current instant
    pub fn new() -> Self {
        let seconds = Utc::now().timestamp() as u32;
        let machine = *MACHINE_ID.get_or_init(|| rand::thread_rng().gen::<u32>() & 0x00ff_ffff);
        let pid = std::process::id() as u16;
        let increment = INCREMENT
            .get_or_init(|| AtomicU32::new(rand::thread_rng().gen::<u32>()))
            .fetch_add(1, Ordering::Relaxed)
            & 0x00ff_ffff;

        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..7].copy_from_slice(&machine.to_be_bytes()[1..4]);
        bytes[7..9].copy_from_slice(&pid.to_be_bytes());
        bytes[9..12].copy_from_slice(&increment.to_be_bytes()[1..4]);
        Self(bytes)
    }

    /// Wraps raw bytes
    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes
    pub fn as_bytes(&self) -> &[u8; 12] {
        &self.0
    }

    /// Creation time encoded in the first four bytes
    pub fn timestamp(&self) -> DateTime<Utc> {
        let seconds = u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]]);
        Utc.timestamp_opt(i64::from(seconds), 0)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Lowercase hex representation (24 chars)
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for ObjectId {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 24 || !s.is_ascii() {
            return Err(DocumentError::InvalidObjectId(s.to_string()));
        }

        let mut bytes = [0u8; 12];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .map_err(|_| DocumentError::InvalidObjectId(s.to_string()))?;
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
