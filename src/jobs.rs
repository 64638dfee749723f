use {super::*, parking_lot::Mutex};

/// A submission is identified by everything the miner contributes; the same
/// tuple is accepted at most once per job.
pub(crate) type SubmissionKey = (Extranonce, Extranonce, Ntime, Nonce);

struct Entry {
    job: Arc<Job>,
    submissions: HashSet<SubmissionKey>,
}

#[derive(Default)]
struct Inner {
    next_id: u32,
    order: VecDeque<JobId>,
    entries: HashMap<JobId, Entry>,
}

/// Registry of the last [`JOB_RETENTION`] jobs, shared between the template
/// refresh task and every connection. Late submissions against a retained
/// job still validate; anything older is gone.
pub(crate) struct Jobs {
    inner: Mutex<Inner>,
}

impl Jobs {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    pub(crate) fn next_id(&self) -> JobId {
        let mut inner = self.inner.lock();
        let id = JobId::new(inner.next_id);
        inner.next_id = inner.next_id.wrapping_add(1);
        id
    }

    pub(crate) fn insert(&self, job: Arc<Job>) {
        let mut inner = self.inner.lock();

        inner.order.push_back(job.job_id);
        inner.entries.insert(
            job.job_id,
            Entry {
                job,
                submissions: HashSet::new(),
            },
        );

        while inner.order.len() > JOB_RETENTION {
            if let Some(evicted) = inner.order.pop_front() {
                inner.entries.remove(&evicted);
            }
        }
    }

    pub(crate) fn get(&self, id: &JobId) -> Option<Arc<Job>> {
        self.inner.lock().entries.get(id).map(|entry| entry.job.clone())
    }

    pub(crate) fn latest(&self) -> Option<Arc<Job>> {
        let inner = self.inner.lock();
        inner
            .order
            .back()
            .and_then(|id| inner.entries.get(id))
            .map(|entry| entry.job.clone())
    }

    /// Returns false when the tuple was already submitted for this job (or
    /// the job is no longer retained).
    pub(crate) fn record_submission(&self, id: &JobId, key: SubmissionKey) -> bool {
        let mut inner = self.inner.lock();
        match inner.entries.get_mut(id) {
            Some(entry) => entry.submissions.insert(key),
            None => false,
        }
    }
}
