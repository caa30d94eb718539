//! Value to hash-slot mapping
//!
//! Integers hash their 8-byte big-endian encoding. Strings that read as an
//! integer hash the same way, so `id = '7'` and `id = 7` land on the same
//! slot; any other string hashes its UTF-8 bytes.

/// Default number of hash slots
pub const DEFAULT_SLOTS: u32 = 4096;

/// A shard-key value as the router sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShardValue<'a> {
    Int(i64),
    Str(&'a str),
}

impl ShardValue<'_> {
    /// Hash slot of this value in a space of `slots` slots
    pub fn slot(&self, slots: u32) -> u32 {
        crc32fast::hash(&self.key_bytes()) % slots
    }

    fn key_bytes(&self) -> Vec<u8> {
        match self {
            ShardValue::Int(v) => v.to_be_bytes().to_vec(),
            ShardValue::Str(s) => match s.trim().parse::<i64>() {
                Ok(v) => v.to_be_bytes().to_vec(),
                Err(_) => s.as_bytes().to_vec(),
            },
        }
    }
}
