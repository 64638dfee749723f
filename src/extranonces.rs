use {super::*, parking_lot::Mutex};

/// Registry of extranonce1 values currently assigned to live connections.
/// Allocation retries until a value unused by any concurrent subscriber
/// comes up; release happens when the connection drops.
pub(crate) struct Extranonces {
    live: Mutex<HashSet<Extranonce>>,
}

impl Extranonces {
    pub(crate) fn new() -> Self {
        Self {
            live: Mutex::new(HashSet::new()),
        }
    }

    pub(crate) fn allocate(&self) -> Extranonce {
        let mut live = self.live.lock();
        loop {
            let candidate = Extranonce::random(EXTRANONCE1_SIZE);
            if live.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    pub(crate) fn release(&self, extranonce1: &Extranonce) {
        self.live.lock().remove(extranonce1);
    }

    #[cfg(test)]
    pub(crate) fn live_count(&self) -> usize {
        self.live.lock().len()
    }
}
