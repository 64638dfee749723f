//! Stratum V1 wire types. Every parameter position is modeled as a typed
//! value rather than an open-ended JSON value; hex fields are lowercase
//! without a 0x prefix.

use {
    bitcoin::{
        block, hashes::sha256d, hashes::Hash, BlockHash, CompactTarget, Target, Txid,
    },
    byteorder::{BigEndian, ByteOrder, LittleEndian},
    derive_more::Display,
    hex::FromHex,
    primitive_types::U256,
    rand::RngCore,
    serde::{
        de::{self, Deserializer},
        ser::{SerializeMap, SerializeSeq, Serializer},
        Deserialize, Serialize,
    },
    serde_json::Value,
    serde_with::{DeserializeFromStr, SerializeDisplay},
    snafu::{ResultExt, Snafu},
    std::{
        collections::BTreeMap,
        fmt::{self, Formatter},
        str::FromStr,
        sync::LazyLock,
    },
};

pub use {
    authorize::Authorize,
    configure::Configure,
    difficulty::Difficulty,
    error::{InternalError, JsonRpcError, Result, StratumError},
    extranonce::Extranonce,
    job_id::JobId,
    merkle::{merkle_branches, merkle_root, MerkleNode},
    message::{Id, Message},
    nbits::Nbits,
    nonce::Nonce,
    notify::Notify,
    ntime::Ntime,
    prevhash::PrevHash,
    set_difficulty::SetDifficulty,
    si::{format_si, parse_si},
    submit::Submit,
    subscribe::{Subscribe, SubscribeResult},
    suggest_difficulty::SuggestDifficulty,
    version::Version,
};

mod authorize;
mod configure;
mod difficulty;
mod error;
mod extranonce;
mod job_id;
mod merkle;
mod message;
mod nbits;
mod nonce;
mod notify;
mod ntime;
mod prevhash;
mod set_difficulty;
mod si;
mod submit;
mod subscribe;
mod suggest_difficulty;
mod version;
