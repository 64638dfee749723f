use {
    super::*, crate::subcommand::pool::pool_config::PoolConfig,
    tokio::sync::mpsc::error::TrySendError,
};

#[derive(Debug)]
pub(crate) enum State {
    Connected,
    Subscribed,
    Authorized,
    Working,
}

/// One miner connection. Reads line-delimited JSON requests, dispatches on
/// method name, and pushes notifications through a bounded outbound queue
/// drained by a dedicated writer task, so a stalled peer only ever blocks
/// itself. Queue overflow closes the connection.
pub(crate) struct Connection<R, W> {
    stats: Arc<Stats>,
    jobs: Arc<Jobs>,
    rpc: Arc<RpcClient>,
    extranonces: Arc<Extranonces>,
    peer: SocketAddr,
    reader: FramedRead<R, LinesCodec>,
    outbound: mpsc::Sender<String>,
    job_receiver: watch::Receiver<Option<Arc<Job>>>,
    cancel: CancellationToken,
    state: State,
    extranonce1: Option<Extranonce>,
    worker_name: Option<String>,
    worker: Option<Arc<WorkerStats>>,
    vardiff: Vardiff,
    malformed: u32,
    _writer: JoinHandle<()>,
    _writer_transport: std::marker::PhantomData<W>,
}

impl<R, W> Connection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        config: Arc<PoolConfig>,
        stats: Arc<Stats>,
        jobs: Arc<Jobs>,
        rpc: Arc<RpcClient>,
        extranonces: Arc<Extranonces>,
        peer: SocketAddr,
        reader: R,
        writer: W,
        job_receiver: watch::Receiver<Option<Arc<Job>>>,
        cancel: CancellationToken,
    ) -> Self {
        let vardiff = Vardiff::new(
            config.start_diff(),
            config.target_share_time(),
            config.min_diff(),
            config.max_diff(),
        );

        let (outbound, mut outbound_rx) = mpsc::channel::<String>(SEND_QUEUE_DEPTH);

        let writer_task = tokio::spawn(async move {
            let mut writer = FramedWrite::new(writer, LinesCodec::new());
            while let Some(frame) = outbound_rx.recv().await {
                if let Err(err) = writer.send(frame).await {
                    debug!("Write to {peer} failed: {err}");
                    break;
                }
            }
        });

        stats.connection_opened();

        Self {
            stats,
            jobs,
            rpc,
            extranonces,
            peer,
            reader: FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_MESSAGE_SIZE)),
            outbound,
            job_receiver,
            cancel,
            state: State::Connected,
            extranonce1: None,
            worker_name: None,
            worker: None,
            vardiff,
            malformed: 0,
            _writer: writer_task,
            _writer_transport: std::marker::PhantomData,
        }
    }

    pub(crate) async fn serve(&mut self) -> Result {
        let mut job_receiver = self.job_receiver.clone();
        let cancel_token = self.cancel.clone();

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => {
                    info!("Disconnecting from {}", self.peer);
                    break;
                }
                line = self.read_line() => {
                    let Some(line) = line? else {
                        break;
                    };

                    self.handle_line(&line).await?;
                }
                changed = job_receiver.changed() => {
                    if changed.is_err() {
                        warn!("Job channel dropped, closing connection with {}", self.peer);
                        break;
                    }

                    let job = job_receiver.borrow_and_update().clone();

                    if matches!(self.state, State::Connected) {
                        continue;
                    }

                    if let Some(job) = job {
                        self.notify(&job, job.clean_jobs)?;
                    }
                }
            }
        }

        Ok(())
    }

    async fn read_line(&mut self) -> Result<Option<String>> {
        match self.reader.next().await {
            Some(Ok(line)) => Ok(Some(line)),
            // Oversized lines and broken transport are fatal framing errors.
            Some(Err(err)) => Err(anyhow!("read error from {}: {err}", self.peer)),
            None => {
                info!("Connection {} disconnected", self.peer);
                Ok(None)
            }
        }
    }

    async fn handle_line(&mut self, line: &str) -> Result {
        match serde_json::from_str::<Message>(line) {
            Ok(Message::Request { id, method, params }) => {
                self.malformed = 0;
                self.dispatch(id, &method, params).await
            }
            Ok(message) => {
                warn!(?message, "Ignoring non-request from {}", self.peer);
                Ok(())
            }
            Err(err) => self.handle_malformed(line, err),
        }
    }

    fn handle_malformed(&mut self, line: &str, err: serde_json::Error) -> Result {
        self.malformed += 1;
        warn!(
            "Malformed message from {} ({}/{MAX_MALFORMED_LINES}): {err}",
            self.peer, self.malformed
        );

        // Answer with a parse error when the id is still recoverable.
        if let Ok(value) = serde_json::from_str::<Value>(line) {
            let id = value.get("id").cloned().unwrap_or(Value::Null);
            if let Ok(id @ (Id::Number(_) | Id::String(_))) = serde_json::from_value::<Id>(id) {
                self.send_error(id, StratumError::Unknown.with_reason("parse"))?;
            }
        }

        ensure!(
            self.malformed <= MAX_MALFORMED_LINES,
            "too many malformed messages from {}",
            self.peer
        );

        Ok(())
    }

    async fn dispatch(&mut self, id: Id, method: &str, params: Value) -> Result {
        match method {
            "mining.subscribe" => match serde_json::from_value::<Subscribe>(params) {
                Ok(subscribe) => self.subscribe(id, subscribe),
                Err(err) => self.bad_params(id, method, err),
            },
            "mining.authorize" => match serde_json::from_value::<Authorize>(params) {
                Ok(authorize) => self.authorize(id, authorize),
                Err(err) => self.bad_params(id, method, err),
            },
            "mining.configure" => match serde_json::from_value::<Configure>(params) {
                Ok(configure) => self.configure(id, configure),
                Err(err) => self.bad_params(id, method, err),
            },
            "mining.suggest_difficulty" => {
                match serde_json::from_value::<SuggestDifficulty>(params) {
                    Ok(suggest) => self.suggest_difficulty(id, suggest),
                    Err(err) => self.bad_params(id, method, err),
                }
            }
            "mining.submit" => match serde_json::from_value::<Submit>(params) {
                Ok(submit) => self.submit(id, submit).await,
                Err(err) => self.bad_params(id, method, err),
            },
            method => {
                warn!("Unknown method {method} from {}", self.peer);
                self.send_error(
                    id,
                    StratumError::Unknown.with_reason(format!("Unknown method '{method}'")),
                )
            }
        }
    }

    fn bad_params(&mut self, id: Id, method: &str, err: serde_json::Error) -> Result {
        self.malformed += 1;
        warn!("Bad params for {method} from {}: {err}", self.peer);

        self.send_error(id, StratumError::Unknown.with_reason("parse"))?;

        ensure!(
            self.malformed <= MAX_MALFORMED_LINES,
            "too many malformed messages from {}",
            self.peer
        );

        Ok(())
    }

    fn subscribe(&mut self, id: Id, subscribe: Subscribe) -> Result {
        if !matches!(self.state, State::Connected) {
            return self.send_error(id, StratumError::Unknown.with_reason("Already subscribed"));
        }

        debug!(
            "SUBSCRIBE from {} (user agent {:?})",
            self.peer, subscribe.user_agent
        );

        let extranonce1 = self.extranonces.allocate();

        let result = SubscribeResult {
            subscriptions: vec![
                (
                    "mining.set_difficulty".to_string(),
                    SUBSCRIPTION_ID.to_string(),
                ),
                ("mining.notify".to_string(), SUBSCRIPTION_ID.to_string()),
            ],
            extranonce1: extranonce1.clone(),
            extranonce2_size: EXTRANONCE2_SIZE,
        };

        self.send(Message::Response {
            id,
            result: Some(json!(result)),
            error: None,
        })?;

        info!(
            "Client {} subscribed with extranonce1 {extranonce1}",
            self.peer
        );

        self.extranonce1 = Some(extranonce1);
        self.state = State::Subscribed;

        self.send_set_difficulty(self.vardiff.current())?;

        let current = self.job_receiver.borrow().clone();
        if let Some(job) = current {
            self.notify(&job, true)?;
        }

        Ok(())
    }

    fn authorize(&mut self, id: Id, authorize: Authorize) -> Result {
        if matches!(self.state, State::Connected) {
            return self.send_error(id, StratumError::NotSubscribed.into_response(None));
        }

        // Solo coordinator: any credentials are accepted.
        self.send(Message::Response {
            id,
            result: Some(json!(true)),
            error: None,
        })?;

        if self.worker.is_none() {
            info!("Authorized worker {} from {}", authorize.username, self.peer);
            self.worker = Some(self.stats.worker_connected(&authorize.username));
            self.worker_name = Some(authorize.username);
        }

        if matches!(self.state, State::Subscribed) {
            self.state = State::Authorized;
        }

        Ok(())
    }

    fn configure(&mut self, id: Id, configure: Configure) -> Result {
        if !configure.extensions.is_empty() {
            debug!(
                "Unsupported extensions from {}: {:?}",
                self.peer, configure.extensions
            );
        }

        self.send(Message::Response {
            id,
            result: Some(json!({})),
            error: None,
        })
    }

    fn suggest_difficulty(&mut self, id: Id, suggest: SuggestDifficulty) -> Result {
        debug!(
            "Client {} suggested difficulty {}",
            self.peer,
            suggest.difficulty()
        );

        self.vardiff.suggest(suggest.difficulty().as_f64());

        self.send(Message::Response {
            id,
            result: Some(json!(true)),
            error: None,
        })
    }

    async fn submit(&mut self, id: Id, submit: Submit) -> Result {
        if matches!(self.state, State::Connected | State::Subscribed) {
            self.send_error(id, StratumError::UnauthorizedWorker.into_response(None))?;
            self.stats.record_invalid(self.worker.as_deref());
            return Ok(());
        }

        let extranonce1 = self
            .extranonce1
            .clone()
            .ok_or_else(|| anyhow!("authorized connection without extranonce1"))?;

        let Some(job) = self.jobs.get(&submit.job_id) else {
            debug!(
                "Submission for unknown job {} from {}",
                submit.job_id, self.peer
            );
            self.send_error(id, StratumError::JobNotFound.into_response(None))?;
            self.stats.record_stale(self.worker.as_deref());
            return Ok(());
        };

        if let Err(error) = validator::precheck(&job, &submit, unix_now()) {
            self.send_error(id, error)?;
            self.stats.record_invalid(self.worker.as_deref());
            return Ok(());
        }

        let key = (
            extranonce1.clone(),
            submit.extranonce2.clone(),
            submit.ntime,
            submit.nonce,
        );

        if !self.jobs.record_submission(&submit.job_id, key) {
            self.send_error(id, StratumError::DuplicateShare.into_response(None))?;
            self.stats.record_invalid(self.worker.as_deref());
            return Ok(());
        }

        let difficulty = self.vardiff.current();

        match validator::assess(&job, &extranonce1, &submit, difficulty.to_target()) {
            Err(error) => {
                debug!("Share rejected from {}: {error}", self.peer);
                self.send_error(id, error)?;
                self.stats.record_invalid(self.worker.as_deref());
            }
            Ok(assessment) => {
                if let Some(block) = assessment.block {
                    self.submit_block(block, &job, assessment.hash).await;
                }

                self.send(Message::Response {
                    id,
                    result: Some(json!(true)),
                    error: None,
                })?;

                let worker = self.worker.clone().ok_or_else(|| {
                    anyhow!("accepted share without an authorized worker")
                })?;
                self.stats.record_valid(&worker, difficulty.as_f64());

                debug!(
                    "Share accepted from {} | diff={difficulty} hash={}",
                    self.peer, assessment.hash
                );

                if matches!(self.state, State::Authorized) {
                    self.state = State::Working;
                }

                if let Some(new_difficulty) = self.vardiff.record_share() {
                    info!(
                        "Retargeting {} from {difficulty} to {new_difficulty}",
                        self.peer
                    );
                    self.send_set_difficulty(new_difficulty)?;
                }
            }
        }

        Ok(())
    }

    async fn submit_block(&mut self, block: Block, job: &Job, hash: BlockHash) {
        info!(
            "Block candidate {hash} at height {} meets the network target",
            job.height()
        );

        let rpc = self.rpc.clone();
        let result = task::spawn_blocking(move || rpc.submit_block(&block)).await;

        // A share that found a block stays a valid share even when the node
        // turns the block down.
        match result {
            Ok(Ok(None)) => {
                info!("SUCCESSFULLY mined block {hash}");
                self.stats.add_block_found();
            }
            Ok(Ok(Some(reason))) => {
                warn!("Block {hash} rejected by the node: {reason}");
                self.stats.add_block_rejected();
            }
            Ok(Err(err)) => {
                error!("Failed to submit block {hash}: {err}");
                self.stats.add_block_rejected();
            }
            Err(err) => {
                error!("Block submission task failed: {err}");
                self.stats.add_block_rejected();
            }
        }
    }

    fn notify(&mut self, job: &Job, clean_jobs: bool) -> Result {
        debug!("Sending job {} to {}", job.job_id, self.peer);

        self.send(Message::Notification {
            method: "mining.notify".into(),
            params: json!(job.notify(clean_jobs)),
        })
    }

    fn send_set_difficulty(&mut self, difficulty: Difficulty) -> Result {
        self.send(Message::Notification {
            method: "mining.set_difficulty".into(),
            params: json!(SetDifficulty(difficulty)),
        })
    }

    fn send(&mut self, message: Message) -> Result {
        let frame = serde_json::to_string(&message)?;

        match self.outbound.try_send(frame) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => bail!("send queue overflow for {}", self.peer),
            Err(TrySendError::Closed(_)) => bail!("writer for {} is gone", self.peer),
        }
    }

    fn send_error(&mut self, id: Id, error: JsonRpcError) -> Result {
        self.send(Message::Response {
            id,
            result: None,
            error: Some(error),
        })
    }
}

impl<R, W> Drop for Connection<R, W> {
    fn drop(&mut self) {
        if let Some(extranonce1) = &self.extranonce1 {
            self.extranonces.release(extranonce1);
        }

        if let Some(worker_name) = &self.worker_name {
            self.stats.worker_disconnected(worker_name);
        }

        self.stats.connection_closed();
        info!(
            "Connection {} closed (remaining: {})",
            self.peer,
            self.stats.total_connections()
        );
    }
}
