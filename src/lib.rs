use {
    anyhow::{anyhow, bail, ensure, Context, Error},
    arguments::Arguments,
    bitcoin::{
        block::Header,
        consensus::{self, encode, Decodable},
        hashes::Hash,
        locktime::absolute::LockTime,
        script::write_scriptint,
        Address, Amount, Block, BlockHash, OutPoint, ScriptBuf, Sequence, Target, Transaction,
        TxIn, TxOut, Txid, VarInt, Witness,
    },
    bitcoincore_rpc::Auth,
    block_template::BlockTemplate,
    chain::Chain,
    clap::{Parser, ValueEnum},
    coinbase::CoinbaseBuilder,
    connection::Connection,
    extranonces::Extranonces,
    futures::{sink::SinkExt, stream::StreamExt},
    generator::Generator,
    hashrate::HashRate,
    job::Job,
    jobs::Jobs,
    options::Options,
    rpc::RpcClient,
    serde::{Deserialize, Serialize},
    serde_json::{json, Value},
    stats::{Stats, WorkerStats},
    std::{
        collections::{BTreeMap, HashMap, HashSet, VecDeque},
        fmt::{self, Display, Formatter},
        io,
        net::SocketAddr,
        path::PathBuf,
        process,
        str::FromStr,
        sync::{
            atomic::{AtomicBool, AtomicU64, Ordering},
            Arc,
        },
        time::{Duration, Instant, SystemTime, UNIX_EPOCH},
    },
    stratum::{
        Authorize, Configure, Difficulty, Extranonce, Id, JobId, JsonRpcError, MerkleNode, Message,
        Nbits, Nonce, Notify, Ntime, PrevHash, SetDifficulty, StratumError, Submit, Subscribe,
        SubscribeResult, SuggestDifficulty, Version,
    },
    tokio::{
        io::{AsyncRead, AsyncWrite},
        net::TcpListener,
        runtime::Runtime,
        sync::{mpsc, watch},
        task::{self, JoinHandle},
        time::{interval, MissedTickBehavior},
    },
    tokio_util::{
        codec::{FramedRead, FramedWrite, LinesCodec},
        sync::CancellationToken,
    },
    tracing::{debug, error, info, warn},
    tracing_appender::non_blocking,
    tracing_subscriber::EnvFilter,
    vardiff::Vardiff,
    workbase::Workbase,
};

mod arguments;
mod block_template;
mod chain;
mod coinbase;
mod connection;
mod extranonces;
mod generator;
mod hashrate;
mod job;
mod jobs;
mod options;
mod rpc;
mod signal;
mod stats;
pub mod stratum;
mod subcommand;
mod validator;
mod vardiff;
mod workbase;

pub const COIN_VALUE: u64 = 100_000_000;

pub const EXTRANONCE1_SIZE: usize = 4;
pub const EXTRANONCE2_SIZE: usize = 4;
pub const MAX_MESSAGE_SIZE: usize = 8 * 1024;
/// Jobs older than this many broadcasts are forgotten; late submissions
/// against them come back as "Job not found".
pub const JOB_RETENTION: usize = 8;
/// Subscription IDs do not seem to have a purpose in Stratum, hardcoding for now
pub const SUBSCRIPTION_ID: &str = "deadbeef";

const SEND_QUEUE_DEPTH: usize = 64;
const MAX_MALFORMED_LINES: u32 = 16;

type Result<T = (), E = Error> = std::result::Result<T, E>;

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

pub fn main() {
    let (writer, _guard) = non_blocking(io::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(writer)
        .init();

    let args = Arguments::parse();

    Runtime::new()
        .expect("Failed to create tokio runtime")
        .block_on(async {
            let cancel_token = signal::setup_signal_handler();

            match args.run(cancel_token).await {
                Err(err) => {
                    error!("error: {err}");

                    if std::env::var_os("RUST_BACKTRACE")
                        .map(|val| val == "1")
                        .unwrap_or_default()
                    {
                        error!("{}", err.backtrace());
                    }
                    process::exit(1);
                }
                Ok(_) => {
                    process::exit(0);
                }
            }
        });
}
