use crate::{error::ApiError, AppState};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use minichain_core::{Block, CancelFlag, ChainError, Transaction};
use serde::Serialize;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Serialize)]
pub struct Health {
    status: &'static str,
}

#[derive(Serialize)]
pub struct ChainView {
    length: usize,
    blocks: Vec<Block>,
}

#[derive(Serialize)]
pub struct Validity {
    valid: bool,
    length: usize,
}

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn new_transaction(
    State(state): State<AppState>,
    payload: Result<Json<Transaction>, JsonRejection>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let Json(tx) = payload.map_err(|_| ApiError::BadRequest)?;
    let mut chain = state.chain.lock().await;
    let accepted = chain.append_pending_transaction(tx)?.clone();
    Ok((StatusCode::CREATED, Json(accepted)))
}

/// Cancels the miner when dropped, so a request abandoned mid-search
/// frees the chain instead of mining on with the lock held.
struct CancelOnDrop(CancelFlag);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Mines on the blocking pool with the chain locked.
pub async fn mine(State(state): State<AppState>) -> Result<Json<Block>, ApiError> {
    let cancel = CancelFlag::new();
    let _guard = CancelOnDrop(cancel.clone());
    let chain = state.chain.clone();
    let difficulty = state.difficulty;
    let flag = cancel.clone();
    let task = tokio::task::spawn_blocking(move || {
        let mut chain = chain.blocking_lock();
        chain.mine_next_cancellable(difficulty, &flag).cloned()
    });

    let block = join_miner(task, &cancel, state.mine_timeout).await?;
    info!("block {} appended ({} txs)", block.index, block.transactions.len());
    Ok(Json(block))
}

/// Waits for the miner. Past the deadline the search is cancelled and the task
/// still joined: a block appended before the miner saw the flag is returned.
pub(crate) async fn join_miner(
    mut task: JoinHandle<minichain_core::Result<Block>>,
    cancel: &CancelFlag,
    limit: Option<Duration>,
) -> Result<Block, ApiError> {
    let Some(limit) = limit else {
        return Ok(task.await??);
    };
    if let Ok(joined) = tokio::time::timeout(limit, &mut task).await {
        return Ok(joined??);
    }

    cancel.cancel();
    match task.await? {
        Ok(block) => Ok(block),
        Err(ChainError::Cancelled { index, nonce }) => {
            warn!("mining of block {index} exceeded {limit:?}, stopped at nonce {nonce}");
            Err(ApiError::MiningTimedOut(limit))
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn chain(State(state): State<AppState>) -> Json<ChainView> {
    let chain = state.chain.lock().await;
    Json(ChainView {
        length: chain.len(),
        blocks: chain.blocks().to_vec(),
    })
}

pub async fn validate(State(state): State<AppState>) -> Json<Validity> {
    let chain = state.chain.lock().await;
    Json(Validity {
        valid: chain.is_valid(state.difficulty),
        length: chain.len(),
    })
}
