use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChainError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("nothing to mine: the chain is empty and no transactions are pending")]
    EmptyChainMineRequest,

    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("nonce space exhausted while mining block {index}")]
    NonceOverflow { index: u64 },

    #[error("difficulty {difficulty} is out of range (max {max})")]
    DifficultyOutOfRange { difficulty: u32, max: u32 },

    #[error("mining of block {index} cancelled at nonce {nonce}")]
    Cancelled { index: u64, nonce: u64 },
}
