use super::*;

/// Template refresh loop. Polls the node, rebuilds the job when the chain
/// tip moves (clean) or the force-refresh interval elapses (not clean), and
/// publishes through a watch channel every connection selects on. Poll
/// failures keep the previous job current.
pub(crate) struct Generator {
    rpc: Arc<RpcClient>,
    jobs: Arc<Jobs>,
    address: Address,
    tag: Vec<u8>,
    poll_interval: Duration,
    refresh_interval: Duration,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Generator {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        rpc: Arc<RpcClient>,
        jobs: Arc<Jobs>,
        address: Address,
        tag: Vec<u8>,
        poll_interval: Duration,
        refresh_interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            rpc,
            jobs,
            address,
            tag,
            poll_interval,
            refresh_interval,
            cancel,
            handle: None,
        }
    }

    pub(crate) async fn spawn(&mut self) -> Result<watch::Receiver<Option<Arc<Job>>>> {
        let initial = fetch_template(self.rpc.clone())
            .await
            .context("initial block template fetch failed")?;

        let mut prev_block_hash = initial.previous_block_hash;

        let job = self.build_job(initial, true)?;
        let (tx, rx) = watch::channel(Some(job));

        let rpc = self.rpc.clone();
        let jobs = self.jobs.clone();
        let address = self.address.clone();
        let tag = self.tag.clone();
        let poll_interval = self.poll_interval;
        let refresh_interval = self.refresh_interval;
        let cancel = self.cancel.clone();

        let handle = tokio::spawn(async move {
            info!("Spawning template refresh task");

            let mut ticker = interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;

            let mut last_broadcast = Instant::now();

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let template = match fetch_template(rpc.clone()).await {
                            Ok(template) => template,
                            Err(err) => {
                                warn!("Failed to fetch new block template: {err}");
                                continue;
                            }
                        };

                        let clean_jobs = template.previous_block_hash != prev_block_hash;

                        if !clean_jobs && last_broadcast.elapsed() < refresh_interval {
                            continue;
                        }

                        prev_block_hash = template.previous_block_hash;

                        let workbase = match Workbase::new(template, &address, &tag) {
                            Ok(workbase) => Arc::new(workbase),
                            Err(err) => {
                                error!("Failed to build job from template: {err}");
                                continue;
                            }
                        };

                        let job = Arc::new(Job::new(jobs.next_id(), clean_jobs, workbase));
                        jobs.insert(job.clone());

                        info!(
                            "New job {} at height {} (clean_jobs={clean_jobs})",
                            job.job_id,
                            job.height(),
                        );

                        last_broadcast = Instant::now();
                        tx.send_replace(Some(job));
                    }
                }
            }

            info!("Shutting down template refresh task");
        });

        self.handle = Some(handle);

        Ok(rx)
    }

    fn build_job(&self, template: BlockTemplate, clean_jobs: bool) -> Result<Arc<Job>> {
        info!("New block template for height {}", template.height);

        let workbase = Arc::new(Workbase::new(template, &self.address, &self.tag)?);
        let job = Arc::new(Job::new(self.jobs.next_id(), clean_jobs, workbase));
        self.jobs.insert(job.clone());

        Ok(job)
    }

    pub(crate) async fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

async fn fetch_template(rpc: Arc<RpcClient>) -> Result<BlockTemplate> {
    task::spawn_blocking(move || rpc.get_block_template())
        .await
        .context("template fetch task panicked")?
}
