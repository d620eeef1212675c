use crate::{
    error::{ChainError, Result},
    hash_with_nonce,
    pow::{check_difficulty, is_hash_valid, CancelFlag},
    Block,
};
use rayon::prelude::*;
use tracing::info;

/// Searches nonces across the rayon pool, starting at `block.nonce`.
/// `find_first` keeps the lowest winning nonce, so the result matches
/// [`crate::pow::mine_block`] for the same inputs.
pub fn mine_block_parallel(block: &Block, difficulty: u32, cancel: &CancelFlag) -> Result<Block> {
    check_difficulty(difficulty)?;

    let mut mined = block.clone();
    mined.commit();
    let prefix = mined.header_prefix();

    let found = (mined.nonce..=u64::MAX).into_par_iter().find_first(|nonce| {
        cancel.is_cancelled() || is_hash_valid(&hash_with_nonce(&prefix, *nonce), difficulty)
    });

    let Some(nonce) = found else {
        return Err(ChainError::NonceOverflow { index: mined.index });
    };
    let hash = hash_with_nonce(&prefix, nonce);
    if !is_hash_valid(&hash, difficulty) {
        // only reachable by the cancel short-circuit above
        return Err(ChainError::Cancelled {
            index: mined.index,
            nonce,
        });
    }

    mined.nonce = nonce;
    mined.hash = hash;
    info!(
        "Mined block {} with nonce {} and hash {}",
        mined.index, mined.nonce, mined.hash
    );
    Ok(mined)
}
