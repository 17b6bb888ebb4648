use std::num::NonZeroUsize;

use clap::Parser;

/// Serves pages of a fixed collection with a saved order and selection.
#[derive(Parser, Debug, Clone)]
#[command(name = "pagewise-server")]
#[command(version)]
pub struct ServerArgs {
    /// Bind address
    #[arg(long, default_value = "0.0.0.0", env = "PAGEWISE_HOST")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 3000, env = "PAGEWISE_PORT")]
    pub port: u16,

    /// Number of items in the collection (ids 1..=N)
    #[arg(short = 'n', long, default_value_t = pagewise::DEFAULT_COLLECTION_LEN, env = "PAGEWISE_ITEMS")]
    pub items: usize,

    /// Page size used when a request has no `limit`
    #[arg(long, default_value = "20", env = "PAGEWISE_DEFAULT_PAGE_SIZE")]
    pub default_page_size: NonZeroUsize,

    /// Largest accepted `limit`
    #[arg(long, default_value = "1000", env = "PAGEWISE_MAX_PAGE_SIZE")]
    pub max_page_size: NonZeroUsize,
}

impl ServerArgs {
    #[must_use]
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
