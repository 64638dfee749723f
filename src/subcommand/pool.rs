use {super::*, pool_config::PoolConfig};

pub(crate) mod pool_config;

#[derive(Parser, Debug)]
pub(crate) struct Pool {
    #[command(flatten)]
    pub(crate) config: PoolConfig,
}

impl Pool {
    pub(crate) async fn run(self, options: Options, cancel_token: CancellationToken) -> Result {
        let config = Arc::new(self.config);
        let chain = options.chain();

        let pool_address = config.pool_address(chain)?;

        let rpc = Arc::new(RpcClient::new(
            options.bitcoin_rpc_url(),
            options.bitcoin_credentials()?,
            chain,
        )?);

        let stats = Arc::new(Stats::new());
        let jobs = Arc::new(Jobs::new());
        let extranonces = Arc::new(Extranonces::new());

        let mut generator = Generator::new(
            rpc.clone(),
            jobs.clone(),
            pool_address.clone(),
            config.coinbase_tag().into_bytes(),
            config.poll_interval(),
            config.refresh_interval(),
            cancel_token.clone(),
        );

        let job_receiver = generator.spawn().await?;

        let listener = TcpListener::bind((config.address(), config.port())).await?;

        eprintln!("Listening on {}:{}", config.address(), config.port());
        info!("Block rewards will be sent to {pool_address}");

        let mut status_ticker = interval(Duration::from_secs(60));
        status_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                result = listener.accept() => {
                    let (stream, peer) = match result {
                        Ok(accepted) => accepted,
                        Err(err) => {
                            warn!("Failed to accept connection: {err}");
                            continue;
                        }
                    };

                    stream.set_nodelay(true)?;

                    info!("Accepted connection from {peer}");

                    let (reader, writer) = stream.into_split();

                    let mut connection = Connection::new(
                        config.clone(),
                        stats.clone(),
                        jobs.clone(),
                        rpc.clone(),
                        extranonces.clone(),
                        peer,
                        reader,
                        writer,
                        job_receiver.clone(),
                        cancel_token.clone(),
                    );

                    task::spawn(async move {
                        if let Err(err) = connection.serve().await {
                            warn!("Connection error from {peer}: {err}");
                        }
                    });
                }
                _ = status_ticker.tick() => {
                    let snapshot = stats.snapshot();
                    info!(
                        "hashrate={}  miners={}  shares={}  blocks={} (rejected {})  uptime={}s",
                        HashRate(snapshot.hashrate),
                        snapshot.connected_miners,
                        snapshot.total_shares,
                        snapshot.blocks_found,
                        stats.blocks_rejected(),
                        snapshot.uptime_seconds,
                    );

                    for (workername, worker) in stats.worker_snapshots() {
                        debug!(
                            "worker {workername}: {} valid / {} invalid / {} stale, {}",
                            worker.shares.valid,
                            worker.shares.invalid,
                            worker.shares.stale,
                            HashRate(worker.hashrate),
                        );
                    }
                }
                _ = cancel_token.cancelled() => {
                    info!("Shutting down stratum server");
                    generator.shutdown().await;
                    break;
                }
            }
        }

        Ok(())
    }
}
