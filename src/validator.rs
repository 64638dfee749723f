use super::*;

/// How far behind the template's curtime a rolled ntime may fall.
const NTIME_PAST_SLACK: u64 = 600;
/// How far into the future (relative to wall clock) it may run.
const NTIME_FUTURE_SLACK: u64 = 7200;

/// Outcome of a structurally sound submission that met the share target.
#[derive(Debug)]
pub(crate) struct Assessment {
    pub(crate) hash: BlockHash,
    /// Present when the hash also meets the network target; ready to hand
    /// to `submitblock`.
    pub(crate) block: Option<Block>,
}

/// Shape checks that precede the duplicate test: extranonce2 width and the
/// ntime window. The hex widths of ntime and nonce are enforced by their
/// wire types.
pub(crate) fn precheck(job: &Job, submit: &Submit, now: u64) -> Result<(), JsonRpcError> {
    if submit.extranonce2.len() != EXTRANONCE2_SIZE {
        return Err(StratumError::Unknown.with_reason(format!(
            "Invalid extranonce2 length: expected {EXTRANONCE2_SIZE} bytes, got {}",
            submit.extranonce2.len()
        )));
    }

    let ntime = u64::from(submit.ntime);
    let curtime = job.workbase.template().current_time;

    if ntime < curtime.saturating_sub(NTIME_PAST_SLACK) || ntime > now + NTIME_FUTURE_SLACK {
        return Err(StratumError::Unknown.with_reason("Ntime out of range"));
    }

    Ok(())
}

/// Rebuilds the header from the submitted fields and classifies the share.
/// Hashing happens here, outside every shared lock.
pub(crate) fn assess(
    job: &Job,
    extranonce1: &Extranonce,
    submit: &Submit,
    share_target: Target,
) -> Result<Assessment, JsonRpcError> {
    let merkle_root = stratum::merkle_root(
        job.workbase.coinb1(),
        job.workbase.coinb2(),
        extranonce1,
        &submit.extranonce2,
        job.workbase.merkle_branches(),
    )
    .map_err(|err| {
        error!("Merkle root computation failed: {err}");
        StratumError::Unknown.with_reason("internal")
    })?;

    let header = Header {
        version: job.version().into(),
        prev_blockhash: job.workbase.template().previous_block_hash,
        merkle_root: merkle_root.to_raw_hash().into(),
        time: submit.ntime.into(),
        bits: job.nbits().to_compact(),
        nonce: submit.nonce.into(),
    };

    let hash = header.block_hash();

    if !share_target.is_met_by(hash) {
        return Err(StratumError::LowDifficultyShare.into_response(None));
    }

    let block = if job.network_target().is_met_by(hash) {
        Some(assemble_block(job, header, extranonce1, &submit.extranonce2)?)
    } else {
        None
    };

    Ok(Assessment { hash, block })
}

/// header ‖ varint(tx count) ‖ coinbase ‖ template transactions, via the
/// consensus encoding of a `Block`.
fn assemble_block(
    job: &Job,
    header: Header,
    extranonce1: &Extranonce,
    extranonce2: &Extranonce,
) -> Result<Block, JsonRpcError> {
    let coinbase_bin = hex::decode(format!(
        "{}{extranonce1}{extranonce2}{}",
        job.workbase.coinb1(),
        job.workbase.coinb2(),
    ))
    .map_err(|err| {
        error!("Coinbase reassembly failed: {err}");
        StratumError::Unknown.with_reason("internal")
    })?;

    let mut cursor = bitcoin::io::Cursor::new(&coinbase_bin);
    let coinbase = Transaction::consensus_decode_from_finite_reader(&mut cursor).map_err(|err| {
        error!("Coinbase decode failed: {err}");
        StratumError::Unknown.with_reason("internal")
    })?;

    let txdata = std::iter::once(coinbase)
        .chain(
            job.workbase
                .template()
                .transactions
                .iter()
                .map(|tx| tx.transaction.clone()),
        )
        .collect();

    Ok(Block { header, txdata })
}
