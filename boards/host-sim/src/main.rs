//! LoRaWAN temperature node on the host
//!
//! Runs the node core unchanged against a simulated probe and MAC, on the
//! embassy std executor. Settings come from the environment:
//!
//! - `RUST_LOG`: log filter, `info` by default
//! - `SIM_SEED`: seed for the probe and network randomness
//! - `SIM_PROBE_DETACHED`: set to simulate a probe missing from the bus

#![deny(unsafe_code)]

use anyhow::{Context, Result};
use embassy_executor::Executor;
use embassy_time::{Delay, Timer};
use env_logger::Builder;
use hal_abstractions::Duration;
use log::{info, LevelFilter};
use node_core::{Node, NodeConfig, NodeStatus};

mod clock;
mod mac;
mod panel;
mod probe;

use mac::{SimMac, SimMacConfig};
use panel::{LogDisplay, SimLed};
use probe::SimProbe;

type HostNode = Node<SimProbe, SimMac, LogDisplay, SimLed>;

/// Wake-up when neither the jobs nor the MAC asked for one
const IDLE_WAKEUP: Duration = Duration::secs(60);

#[embassy_executor::task]
async fn node_task(mut node: HostNode) {
    node.boot(clock::now(), &mut Delay);

    let mut reported = node.status();
    loop {
        let now = clock::now();
        let wake = node.run_once(now).unwrap_or(now + IDLE_WAKEUP);

        let status = node.status();
        if status.tx_completed != reported.tx_completed {
            report(&node, &status);
        }
        reported = status;

        Timer::at(clock::to_embassy(wake)).await;
    }
}

fn report(node: &HostNode, status: &NodeStatus) {
    info!(
        "Joined {}, uplinks queued {} completed {} skipped {}, FCnt {}, link check {}, last reading {:.2} C",
        status.joined,
        status.frames_queued,
        status.tx_completed,
        status.attempts_skipped,
        node.mac().frame_counter(),
        node.mac().link_check(),
        node.record().celsius()
    );
}

fn seed_from_env() -> Result<u64> {
    match std::env::var("SIM_SEED") {
        Ok(value) => value
            .parse()
            .with_context(|| format!("SIM_SEED is not a number: {value:?}")),
        Err(_) => Ok(rand::random()),
    }
}

fn main() -> Result<()> {
    Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let seed = seed_from_env()?;
    let attached = std::env::var_os("SIM_PROBE_DETACHED").is_none();
    info!("Simulation seed {}, probe attached: {}", seed, attached);

    let probe = SimProbe::new(seed, attached);
    let mac = SimMac::new(SimMacConfig::DEFAULT, seed.wrapping_add(1), clock::now());
    let node = Node::new(
        NodeConfig::DEFAULT,
        probe,
        mac,
        LogDisplay::default(),
        SimLed::default(),
    )
    .context("invalid node configuration")?;

    // Leak the executor to satisfy the 'static lifetime required by run()
    let executor: &'static mut Executor = Box::leak(Box::new(Executor::new()));
    executor.run(move |spawner| {
        let _ = spawner.spawn(node_task(node));
    })
}
