//! Shared helpers for host-level tests
#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::{
    net::SocketAddr,
    path::PathBuf,
    time::Duration,
};

use beacon::Beacon;
use tempfile::TempDir;

/// A configuration file in a scratch directory that tests can rewrite
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("scratch directory"),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.path().join("beacon.config.ron")
    }

    /// A path inside the scratch directory, for drain markers
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write_config(&self, content: &str) {
        std::fs::write(self.config_path(), content).expect("write config");
    }

    pub fn touch(&self, name: &str) {
        std::fs::write(self.path(name), b"").expect("touch marker");
    }
}

/// Config with a local health endpoint and one drain per `(name, marker)`
pub fn drain_config(scratch: &Scratch, drains: &[(&str, &str)], lameduck: &str) -> String {
    let subsystems = drains
        .iter()
        .map(|(name, marker)| {
            format!(
                "Drain(name: {name:?}, path: {:?}, interval_ms: 20),",
                scratch.path(marker).display().to_string()
            )
        })
        .collect::<String>();

    format!(
        r#"(
            health: (address: "127.0.0.1:0", lameduck: {lameduck:?}),
            subsystems: [{subsystems}],
        )"#
    )
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

pub async fn get_health(addr: SocketAddr) -> (u16, String) {
    let response = client()
        .get(format!("http://{addr}/health"))
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.text().await.unwrap())
}

/// Poll `/health` until it answers `expected`
pub async fn wait_for_health(addr: SocketAddr, expected: (u16, &str)) {
    let mut last = (0, String::new());
    for _ in 0..100 {
        last = get_health(addr).await;
        if (last.0, last.1.as_str()) == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("health never became {expected:?}, last answer {last:?}");
}

pub async fn health_addr(beacon: &Beacon) -> SocketAddr {
    let health = beacon.health().expect("health configured");
    for _ in 0..100 {
        if let Some(addr) = health.local_addr() {
            return addr;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("health endpoint never started");
}
