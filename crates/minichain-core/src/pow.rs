use crate::{
    constants::MAX_DIFFICULTY,
    error::{ChainError, Result},
    hash_with_nonce, Block,
};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::info;

/// Cooperative cancellation for a running nonce search. Clones share one flag.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// True when the hex digest starts with `difficulty` `'0'` characters.
pub fn is_hash_valid(hash: &str, difficulty: u32) -> bool {
    let difficulty = difficulty as usize;
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}

pub fn check_difficulty(difficulty: u32) -> Result<()> {
    if difficulty > MAX_DIFFICULTY {
        return Err(ChainError::DifficultyOutOfRange {
            difficulty,
            max: MAX_DIFFICULTY,
        });
    }
    Ok(())
}

/// Mine the block in place: fix the merkle root, then bump the nonce from its
/// current value until the block hash meets `difficulty`.
pub fn mine_block(block: &mut Block, difficulty: u32) -> Result<()> {
    mine_block_cancellable(block, difficulty, &CancelFlag::default())
}

/// Like [`mine_block`], checking `cancel` before every attempt.
pub fn mine_block_cancellable(
    block: &mut Block,
    difficulty: u32,
    cancel: &CancelFlag,
) -> Result<()> {
    check_difficulty(difficulty)?;
    block.commit();
    let prefix = block.header_prefix();

    loop {
        if cancel.is_cancelled() {
            return Err(ChainError::Cancelled {
                index: block.index,
                nonce: block.nonce,
            });
        }
        let hash = hash_with_nonce(&prefix, block.nonce);
        if is_hash_valid(&hash, difficulty) {
            block.hash = hash;
            info!(
                "Mined block {} with nonce {} and hash {}",
                block.index, block.nonce, block.hash
            );
            return Ok(());
        }
        block.nonce = block
            .nonce
            .checked_add(1)
            .ok_or(ChainError::NonceOverflow { index: block.index })?;
    }
}
