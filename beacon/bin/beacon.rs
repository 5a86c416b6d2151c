#![deny(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::must_use_candidate)]

#[cfg(not(any(target_os = "macos", unix)))]
compile_error!("Only macos and unix are currently supported");

use beacon::{Beacon, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let beacon = Beacon::load(Config::locate()?).await?;

    beacon.run().await
}
