use crate::{
    clock::{Clock, SystemClock},
    constants::GENESIS_PREV_HASH,
    error::{ChainError, Result},
    pow::{mine_block_cancellable, CancelFlag},
    Block, Transaction,
};
use std::{fmt, str::FromStr};
use tracing::debug;

/// Where a freshly mined block takes its transactions from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MinePolicy {
    /// The previous block's transactions followed by whatever is pending.
    /// Each block carries the full history, as the original service did.
    #[default]
    ReplayLast,
    /// Only the pending transactions; the pending block is emptied per mine.
    DrainPending,
}

impl FromStr for MinePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "replay-last" => Ok(Self::ReplayLast),
            "drain-pending" => Ok(Self::DrainPending),
            other => Err(format!(
                "unknown policy {other:?} (expected replay-last or drain-pending)"
            )),
        }
    }
}

impl fmt::Display for MinePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ReplayLast => "replay-last",
            Self::DrainPending => "drain-pending",
        })
    }
}

/// In-memory, append-only chain of mined blocks plus one pending block that
/// collects transactions until the next mine.
///
/// Not synchronised: the host serialises access (e.g. behind a mutex).
#[derive(Debug)]
pub struct Chain<C: Clock = SystemClock> {
    blocks: Vec<Block>,
    pending: Option<Block>,
    policy: MinePolicy,
    clock: C,
}

impl Chain<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for Chain<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Chain<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            blocks: Vec::new(),
            pending: None,
            policy: MinePolicy::default(),
            clock,
        }
    }

    pub fn with_policy(mut self, policy: MinePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> MinePolicy {
        self.policy
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn last_block(&self) -> Option<&Block> {
        self.blocks.last()
    }

    pub fn pending(&self) -> Option<&Block> {
        self.pending.as_ref()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Hash the next block links to. Empty before the first block.
    pub fn tip_hash(&self) -> &str {
        self.blocks
            .last()
            .map(|b| b.hash.as_str())
            .unwrap_or(GENESIS_PREV_HASH)
    }

    /// Queue a transaction on the pending block, creating it at the next index
    /// if needed.
    pub fn append_pending_transaction(&mut self, tx: Transaction) -> Result<&Transaction> {
        tx.validate()?;
        let index = self.blocks.len() as u64;
        let pending = self.pending.get_or_insert_with(|| Block::pending(index));
        debug!(
            "pending tx for block {}: {} -> {} ({})",
            pending.index, tx.sender, tx.recipient, tx.amount
        );
        pending.transactions.push(tx);
        Ok(pending
            .transactions
            .last()
            .expect("pending block holds the transaction just pushed"))
    }

    pub fn mine_next(&mut self, difficulty: u32) -> Result<&Block> {
        self.mine_next_cancellable(difficulty, &CancelFlag::default())
    }

    /// Build the next block, link it to the tip, mine it and append it.
    /// The header is final before the nonce search starts, so the stored
    /// nonce is the one that meets `difficulty`. On error nothing changes.
    pub fn mine_next_cancellable(
        &mut self,
        difficulty: u32,
        cancel: &CancelFlag,
    ) -> Result<&Block> {
        let mut candidate = self.next_candidate()?;
        candidate.prev_hash = self.tip_hash().to_owned();
        mine_block_cancellable(&mut candidate, difficulty, cancel)?;

        self.pending = None;
        let at = self.blocks.len();
        self.blocks.push(candidate);
        Ok(&self.blocks[at])
    }

    fn next_candidate(&self) -> Result<Block> {
        let pending = self.pending.as_ref().map(|b| b.transactions.as_slice());
        let last = self.blocks.last();
        if last.is_none() && pending.is_none() {
            return Err(ChainError::EmptyChainMineRequest);
        }

        let mut transactions = Vec::new();
        if self.policy == MinePolicy::ReplayLast {
            if let Some(last) = last {
                transactions.extend_from_slice(&last.transactions);
            }
        }
        transactions.extend_from_slice(pending.unwrap_or_default());

        Ok(Block::candidate(
            self.blocks.len() as u64,
            self.clock.now(),
            transactions,
        ))
    }

    /// Link `block` to the current tip, recompute its hash and append it.
    /// No proof-of-work check: the hash is whatever the header now yields.
    /// A pending block moves up to the new next index.
    pub fn add_block(&mut self, mut block: Block) -> &Block {
        block.prev_hash = self.tip_hash().to_owned();
        block.hash = block.compute_hash();
        let at = self.blocks.len();
        self.blocks.push(block);
        if let Some(pending) = self.pending.as_mut() {
            pending.index = self.blocks.len() as u64;
        }
        &self.blocks[at]
    }

    /// Indices, linkage, cached hashes, merkle roots and the difficulty prefix
    /// for every block.
    pub fn is_valid(&self, difficulty: u32) -> bool {
        let mut prev_hash = GENESIS_PREV_HASH;
        for (position, block) in self.blocks.iter().enumerate() {
            if block.index != position as u64
                || block.prev_hash != prev_hash
                || !block.is_valid(difficulty)
            {
                return false;
            }
            prev_hash = block.hash.as_str();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    const TS: &str = "2024-01-01T00:00:00Z";

    fn chain() -> Chain<FixedClock> {
        Chain::with_clock(FixedClock::new(TS))
    }

    #[test]
    fn mine_on_empty_chain_fails() {
        let mut chain = chain();
        assert_eq!(
            chain.mine_next(0).unwrap_err(),
            ChainError::EmptyChainMineRequest
        );
        assert!(chain.is_empty());
    }

    #[test]
    fn first_mine_scenario() {
        let mut chain = chain();
        chain
            .append_pending_transaction(Transaction::new("A", "B", 10.0))
            .unwrap();
        let block = chain.mine_next(0).unwrap();
        assert_eq!(block.index, 0);
        assert_eq!(block.prev_hash, "");
        assert_eq!(block.nonce, 0);
        assert_eq!(
            block.merkle_root,
            "053a4a110eff65a00cb04705cf6c97b5777a2020c96199043567c5d4ef2f3a63"
        );
        assert_eq!(
            block.hash,
            "b91c31aa7da2717f8e4ea206856f3c85e192f617ee1b3cf2e9609c67c01478c8"
        );
        assert!(chain.pending().is_none());
    }

    #[test]
    fn linked_mining_example() {
        let mut chain = chain();
        chain
            .append_pending_transaction(Transaction::new("A", "B", 10.0))
            .unwrap();
        let first = chain.mine_next(2).unwrap().clone();
        assert_eq!(first.nonce, 1169);
        assert_eq!(
            first.hash,
            "00464a882285c523cc7b23be7fee3518cd4bdd98ff0214737b71673dc20be040"
        );

        let second = chain.mine_next(2).unwrap();
        assert_eq!(second.index, 1);
        assert_eq!(second.prev_hash, first.hash);
        assert_eq!(second.transactions, first.transactions);
        assert_eq!(second.nonce, 81);
        assert_eq!(
            second.hash,
            "00750394d24add5a91551307c63edb390fdb5a7fd851fc9d5a2a7f03fa6c0ced"
        );
        assert!(chain.is_valid(2));
    }

    #[test]
    fn pending_index_tracks_chain_length() {
        let mut chain = chain();
        chain
            .append_pending_transaction(Transaction::new("A", "B", 1.0))
            .unwrap();
        assert_eq!(chain.pending().unwrap().index, 0);
        chain.mine_next(0).unwrap();
        chain
            .append_pending_transaction(Transaction::new("C", "D", 2.0))
            .unwrap();
        assert_eq!(chain.pending().unwrap().index, 1);
    }

    #[test]
    fn replay_last_accumulates() {
        let mut chain = chain();
        chain
            .append_pending_transaction(Transaction::new("A", "B", 1.0))
            .unwrap();
        chain.mine_next(0).unwrap();
        chain
            .append_pending_transaction(Transaction::new("C", "D", 2.0))
            .unwrap();
        let block = chain.mine_next(0).unwrap();
        assert_eq!(
            block.transactions,
            vec![
                Transaction::new("A", "B", 1.0),
                Transaction::new("C", "D", 2.0)
            ]
        );
        // mined blocks are never touched by later appends
        assert_eq!(chain.blocks()[0].transactions.len(), 1);
    }

    #[test]
    fn drain_pending_takes_only_new() {
        let mut chain = chain().with_policy(MinePolicy::DrainPending);
        chain
            .append_pending_transaction(Transaction::new("A", "B", 1.0))
            .unwrap();
        chain.mine_next(0).unwrap();
        chain
            .append_pending_transaction(Transaction::new("C", "D", 2.0))
            .unwrap();
        let block = chain.mine_next(0).unwrap();
        assert_eq!(block.transactions, vec![Transaction::new("C", "D", 2.0)]);

        let empty = chain.mine_next(0).unwrap();
        assert!(empty.transactions.is_empty());
        assert_eq!(empty.merkle_root, "");
        assert!(chain.is_valid(0));
    }

    #[test]
    fn failed_mine_keeps_pending() {
        let mut chain = chain().with_policy(MinePolicy::DrainPending);
        chain
            .append_pending_transaction(Transaction::new("A", "B", 1.0))
            .unwrap();
        let cancel = CancelFlag::new();
        cancel.cancel();
        assert!(matches!(
            chain.mine_next_cancellable(3, &cancel),
            Err(ChainError::Cancelled { .. })
        ));
        assert!(chain.is_empty());
        assert_eq!(chain.pending().unwrap().transactions.len(), 1);
    }

    #[test]
    fn invalid_transaction_is_not_queued() {
        let mut chain = chain();
        let err = chain
            .append_pending_transaction(Transaction::new("A", "B", f64::NAN))
            .unwrap_err();
        assert!(matches!(err, ChainError::InvalidTransaction(_)));
        assert!(chain.pending().is_none());
    }

    #[test]
    fn add_block_links_and_rehashes() {
        let mut chain = chain();
        let first = chain
            .add_block(Block::candidate(0, TS.into(), vec![]))
            .clone();
        assert_eq!(first.prev_hash, "");
        assert_eq!(first.hash, first.compute_hash());

        let mut stale = Block::candidate(1, TS.into(), vec![]);
        stale.prev_hash = "bogus".into();
        stale.hash = "bogus".into();
        let second = chain.add_block(stale);
        assert_eq!(second.prev_hash, first.hash);
        assert_eq!(second.hash, second.compute_hash());
        assert!(chain.is_valid(0));
    }

    #[test]
    fn add_block_moves_pending_to_next_index() {
        let mut chain = chain();
        chain
            .append_pending_transaction(Transaction::new("A", "B", 1.0))
            .unwrap();
        chain.add_block(Block::candidate(0, TS.into(), vec![]));
        assert_eq!(chain.pending().unwrap().index, 1);

        chain
            .append_pending_transaction(Transaction::new("C", "D", 2.0))
            .unwrap();
        chain.add_block(Block::candidate(1, TS.into(), vec![]));
        let pending = chain.pending().unwrap();
        assert_eq!(pending.index, chain.len() as u64);
        assert_eq!(pending.transactions.len(), 2);

        let mined = chain.mine_next(0).unwrap();
        assert_eq!(mined.index, 2);
    }

    #[test]
    fn append_returns_the_queued_transaction() {
        let mut chain = chain();
        chain
            .append_pending_transaction(Transaction::new("A", "B", 1.0))
            .unwrap();
        let queued = chain
            .append_pending_transaction(Transaction::new("C", "D", 2.0))
            .unwrap();
        assert_eq!(queued, &Transaction::new("C", "D", 2.0));
    }

    #[test]
    fn tampering_breaks_validity() {
        let mut chain = chain();
        chain
            .append_pending_transaction(Transaction::new("A", "B", 1.0))
            .unwrap();
        chain.mine_next(1).unwrap();
        chain.mine_next(1).unwrap();
        assert!(chain.is_valid(1));
        chain.blocks[0].transactions[0].amount = 100.0;
        assert!(!chain.is_valid(1));
    }

    #[test]
    fn policy_parsing() {
        assert_eq!(
            "replay-last".parse::<MinePolicy>().unwrap(),
            MinePolicy::ReplayLast
        );
        assert_eq!(
            "drain-pending".parse::<MinePolicy>().unwrap(),
            MinePolicy::DrainPending
        );
        assert!("fifo".parse::<MinePolicy>().is_err());
        assert_eq!(MinePolicy::DrainPending.to_string(), "drain-pending");
    }
}
