//! Downloads a model snapshot from the hub into a local directory.
//!
//! Fetches the safetensors weights plus JSON and text metadata for the
//! configured model, leaving everything else in the repository behind.

use pipekit::hub::{HubClient, SnapshotRequest};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const REPO_ID: &str = "ibm-granite/granite-3.0-2b-instruct";
const LOCAL_DIR: &str = "./models";
const ALLOW_PATTERNS: [&str; 3] = ["*.safetensors", "*.json", "*.txt"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let client = HubClient::new();
    let request = SnapshotRequest::new(REPO_ID, LOCAL_DIR).with_allow_patterns(ALLOW_PATTERNS);
    client.snapshot_download(&request).await?;

    Ok(())
}
