//! Headless engine runner. Logs what is sounding instead of drawing it.
//!
//! Usage: `mivi-headless [config.toml]`

use mivi::prelude::*;
use std::env;
use std::thread;
use std::time::Duration;
use tracing::info;

const REPORT_INTERVAL: Duration = Duration::from_secs(1);

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = match env::args().nth(1) {
        Some(path) => MiviConfig::load(path)?,
        None => MiviConfig::default(),
    };
    let threshold = config.engine.attenuation.held_threshold;

    let engine = MiviEngine::builder().config(config).build()?;
    info!("Running headless with {:?} input", engine.active_input());

    loop {
        thread::sleep(REPORT_INTERVAL);
        let state = engine.state();
        let sounding: Vec<u8> = KeyIndex::all()
            .filter(|&key| state.note_velocity(key) > threshold)
            .map(KeyIndex::get)
            .collect();
        let history = state.with_past_notes(|ring| ring.len());
        info!(
            "Sounding {:?}, history {}/{}",
            sounding,
            history,
            state.history_capacity()
        );
    }
}
