//! List the supported sync modes.

use wled_link_client::SyncModeRegistry;
use wled_link_core::ModeSettings;

/// Run the modes command.
pub fn run() {
    println!("=== wled-link sync modes ===");
    println!();
    for line in describe(&SyncModeRegistry::standard()) {
        println!("  {}", line);
    }
}

/// One line per registered mode with its defaults.
fn describe(registry: &SyncModeRegistry) -> Vec<String> {
    registry
        .modes()
        .into_iter()
        .filter_map(|mode| {
            let entry = registry.lookup(mode).ok()?;
            let defaults = match entry.template() {
                ModeSettings::Udp(udp) => format!(
                    "port {}, indexed pixels {}",
                    udp.port,
                    if udp.include_indexes { "on" } else { "off" }
                ),
                ModeSettings::Ddp(ddp) => format!("port {}", ddp.port),
                ModeSettings::E131(e131) => format!(
                    "port {}, universe {}, {} channels/universe, offset {}",
                    e131.port, e131.universe, e131.universe_size, e131.channel_offset
                ),
            };
            Some(format!("{:<5} {}", mode.as_str(), defaults))
        })
        .collect()
}
