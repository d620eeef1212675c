use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::VecDeque;

pub mod chain;
pub mod clock;
pub mod constants;
pub mod error;
pub mod mine;
pub mod pow;

pub use chain::{Chain, MinePolicy};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ChainError, Result};
pub use pow::CancelFlag;

use constants::{AMOUNT_PRECISION, HASH_HEX_SIZE};

/// Lowercase hex SHA-256 digest.
pub type HexHash = String;

pub fn sha256_hex(data: impl AsRef<[u8]>) -> HexHash {
    let mut hasher = Sha256::new();
    hasher.update(data.as_ref());
    hex::encode(hasher.finalize())
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Transaction {
    #[serde(alias = "sender")]
    pub sender: String,
    #[serde(alias = "recipient")]
    pub recipient: String,
    #[serde(alias = "amount")]
    pub amount: f64,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: f64) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
        }
    }

    /// SHA-256 over `sender ++ recipient ++ amount` with the amount fixed at six decimals.
    pub fn hash(&self) -> HexHash {
        let mut record =
            String::with_capacity(self.sender.len() + self.recipient.len() + 16);
        record.push_str(&self.sender);
        record.push_str(&self.recipient);
        record.push_str(&format_amount(self.amount));
        sha256_hex(record)
    }

    /// Only non-finite amounts are rejected; empty parties and zero or negative
    /// amounts pass through untouched.
    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_finite() {
            return Err(ChainError::InvalidTransaction(format!(
                "amount must be a finite number, got {}",
                format_amount(self.amount)
            )));
        }
        Ok(())
    }
}

/// Locale-independent `%f` rendering of an amount.
pub fn format_amount(amount: f64) -> String {
    if amount.is_nan() {
        "NaN".to_string()
    } else if amount == f64::INFINITY {
        "+Inf".to_string()
    } else if amount == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        format!("{:.*}", AMOUNT_PRECISION, amount)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Block {
    pub index: u64,
    pub timestamp: String,
    pub transactions: Vec<Transaction>,
    pub nonce: u64,
    pub prev_hash: HexHash,
    pub hash: HexHash,
    pub merkle_root: HexHash,
}

impl Block {
    /// An empty block waiting for transactions.
    pub fn pending(index: u64) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    /// A block ready to be committed and mined.
    pub fn candidate(index: u64, timestamp: String, transactions: Vec<Transaction>) -> Self {
        Self {
            index,
            timestamp,
            transactions,
            ..Self::default()
        }
    }

    /// Every header field except the nonce, in hashing order.
    pub fn header_prefix(&self) -> String {
        let mut prefix = String::with_capacity(
            20 + self.timestamp.len() + self.merkle_root.len() + self.prev_hash.len(),
        );
        prefix.push_str(&self.index.to_string());
        prefix.push_str(&self.timestamp);
        prefix.push_str(&self.merkle_root);
        prefix.push_str(&self.prev_hash);
        prefix
    }

    /// Block hash over `index ++ timestamp ++ merkle_root ++ prev_hash ++ nonce`.
    /// Transactions only enter through the merkle root.
    pub fn compute_hash(&self) -> HexHash {
        hash_with_nonce(&self.header_prefix(), self.nonce)
    }

    /// Fix the merkle root from the current transaction list.
    pub fn commit(&mut self) {
        self.merkle_root = merkle_root(&self.transactions);
    }

    /// Checks the cached hash and merkle root against the block's contents and
    /// the difficulty prefix. Linkage is the chain's concern.
    pub fn is_valid(&self, difficulty: u32) -> bool {
        self.hash.len() == HASH_HEX_SIZE
            && self.hash == self.compute_hash()
            && self.merkle_root == merkle_root(&self.transactions)
            && pow::is_hash_valid(&self.hash, difficulty)
    }
}

pub(crate) fn hash_with_nonce(prefix: &str, nonce: u64) -> HexHash {
    let mut hasher = Sha256::new();
    hasher.update(prefix.as_bytes());
    hasher.update(nonce.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Sequential merkle accumulator: the two leftmost digests are hashed together
/// and the parent goes to the back of the queue until one digest is left. A lone
/// leaf is paired with itself. Empty input yields an empty string.
pub fn merkle_root(txs: &[Transaction]) -> HexHash {
    let mut queue: VecDeque<HexHash> = txs.iter().map(Transaction::hash).collect();
    loop {
        let Some(left) = queue.pop_front() else {
            return String::new();
        };
        let right = queue.pop_front().unwrap_or_else(|| left.clone());
        let parent = sha256_hex(format!("{left}{right}"));
        if queue.is_empty() {
            return parent;
        }
        queue.push_back(parent);
    }
}
