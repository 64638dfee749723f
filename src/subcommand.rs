use super::*;

pub(crate) mod pool;

#[derive(Debug, Parser)]
pub(crate) enum Subcommand {
    #[command(about = "Run the solo mining coordinator")]
    Pool(pool::Pool),
}

impl Subcommand {
    pub(crate) async fn run(self, options: Options, cancel_token: CancellationToken) -> Result {
        match self {
            Self::Pool(pool) => pool.run(options, cancel_token).await,
        }
    }
}
