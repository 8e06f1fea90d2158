use clap::Parser;

/// Entry point for the `dockstat` docker telemetry tool.
///
/// Reads cgroup v1 accounting files of docker containers and prints them as JSON lines.
/// Logging is configured through `RUST_LOG`.
///
/// # Examples
///
/// ```bash
/// RUST_LOG=debug dockstat mem 3f4e...
/// ROOTFS_MOUNT_PATH=/rootfs dockstat watch --interval 5
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    dockstat::run(dockstat::config::Cli::parse()).await
}
