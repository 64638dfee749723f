use super::*;

/// One unit of work handed to miners. All connections share the same job:
/// rewards go to the single configured pool address, so the coinbase halves
/// are client-independent and only the extranonces vary per miner.
#[derive(Debug)]
pub(crate) struct Job {
    pub(crate) job_id: JobId,
    pub(crate) clean_jobs: bool,
    pub(crate) workbase: Arc<Workbase>,
}

impl Job {
    pub(crate) fn new(job_id: JobId, clean_jobs: bool, workbase: Arc<Workbase>) -> Self {
        Self {
            job_id,
            clean_jobs,
            workbase,
        }
    }

    pub(crate) fn prevhash(&self) -> PrevHash {
        PrevHash::from(self.workbase.template().previous_block_hash)
    }

    pub(crate) fn version(&self) -> Version {
        self.workbase.template().version
    }

    pub(crate) fn nbits(&self) -> Nbits {
        self.workbase.template().bits
    }

    pub(crate) fn ntime(&self) -> Ntime {
        Ntime::try_from(self.workbase.template().current_time).expect("fits into u32 until ~2106")
    }

    pub(crate) fn height(&self) -> u64 {
        self.workbase.template().height
    }

    pub(crate) fn network_target(&self) -> Target {
        self.workbase.network_target()
    }

    /// The broadcast flag is a property of how the job entered the registry;
    /// a fresh subscriber always gets `clean_jobs=true`.
    pub(crate) fn notify(&self, clean_jobs: bool) -> Notify {
        Notify {
            job_id: self.job_id,
            prevhash: self.prevhash(),
            coinb1: self.workbase.coinb1().to_string(),
            coinb2: self.workbase.coinb2().to_string(),
            merkle_branches: self.workbase.merkle_branches().to_vec(),
            version: self.version(),
            nbits: self.nbits(),
            ntime: self.ntime(),
            clean_jobs,
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, bitcoin::address::NetworkUnchecked};

    fn job() -> Job {
        let address = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4"
            .parse::<Address<NetworkUnchecked>>()
            .unwrap()
            .assume_checked();

        Job::new(
            JobId::new(7),
            true,
            Arc::new(Workbase::new(BlockTemplate::default(), &address, b"tag").unwrap()),
        )
    }

    #[test]
    fn notify_mirrors_job_fields() {
        let job = job();
        let notify = job.notify(job.clean_jobs);

        assert_eq!(notify.job_id, job.job_id);
        assert_eq!(notify.prevhash, job.prevhash());
        assert_eq!(notify.coinb1, job.workbase.coinb1());
        assert_eq!(notify.coinb2, job.workbase.coinb2());
        assert_eq!(notify.merkle_branches, job.workbase.merkle_branches());
        assert_eq!(notify.version, job.version());
        assert_eq!(notify.nbits, job.nbits());
        assert_eq!(notify.ntime, job.ntime());
        assert!(notify.clean_jobs);
    }

    #[test]
    fn notify_flag_is_caller_controlled() {
        let job = job();
        assert!(!job.notify(false).clean_jobs);
        assert!(job.notify(true).clean_jobs);
    }
}
