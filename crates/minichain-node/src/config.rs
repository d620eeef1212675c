use crate::constants::{DEFAULT_HOST, DEFAULT_MINE_TIMEOUT_SECS, DEFAULT_PORT};
use clap::Parser;
use minichain_core::{constants::DEFAULT_DIFFICULTY, MinePolicy};
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "minichain-node")]
#[command(about = "HTTP node for the minimal proof-of-work chain")]
pub struct Args {
    /// Interface to bind
    #[arg(long, env = "HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port on which the server will run
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Leading '0' hex characters required of every mined block hash
    #[arg(long, env = "DIFFICULTY", default_value_t = DEFAULT_DIFFICULTY)]
    pub difficulty: u32,

    /// Abort a mine request after this many seconds (0 = never)
    #[arg(long, env = "MINE_TIMEOUT_SECS", default_value_t = DEFAULT_MINE_TIMEOUT_SECS)]
    pub mine_timeout_secs: u64,

    /// Transactions carried by a new block: replay-last or drain-pending
    #[arg(long, env = "MINE_POLICY", default_value_t = MinePolicy::ReplayLast)]
    pub policy: MinePolicy,
}

impl Args {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn mine_timeout(&self) -> Option<Duration> {
        (self.mine_timeout_secs > 0).then(|| Duration::from_secs(self.mine_timeout_secs))
    }
}
