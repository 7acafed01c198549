use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "research-digest", author, version, about = "Weekly research digest web app", long_about = None)]
pub struct Args {
    /// Config file (TOML, or JSON with a .json extension); falls back to
    /// DIGEST_CONFIG, then research-digest.toml
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// SQLite database path
    #[arg(long, env = "DIGEST_DB", default_value = "digest.db")]
    pub db: PathBuf,

    /// Bind host
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Bind port
    #[arg(long, default_value = "8000")]
    pub port: u16,

    /// Force regenerate this week's digest before serving
    #[arg(long)]
    pub refresh_on_start: bool,

    /// Generate (or load) this week's digest, print it as JSON and exit
    #[arg(long)]
    pub once_json: bool,
}

impl Args {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
