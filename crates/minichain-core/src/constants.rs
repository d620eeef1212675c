pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
/// A difficulty counts leading `'0'` hex characters, so it can never exceed the digest width.
pub const MAX_DIFFICULTY: u32 = HASH_HEX_SIZE as u32;
pub const DEFAULT_DIFFICULTY: u32 = 4;
/// Fractional digits used when rendering a transaction amount for hashing.
pub const AMOUNT_PRECISION: usize = 6;
pub const GENESIS_PREV_HASH: &str = "";
