//! Opt-in debugging switches read from the environment.

use std::env;

/// Environment variable holding debug flags, e.g. `EMBER_DEBUG=trace,hooks`
/// or `EMBER_DEBUG=all`.
pub const DEBUG_ENV: &str = "EMBER_DEBUG";

/// Whether debugging for `flag` is switched on via `EMBER_DEBUG`.
pub fn debug_on(flag: &str) -> bool {
    env::var(DEBUG_ENV).is_ok_and(|level| level_enables(&level, flag))
}

fn level_enables(level: &str, flag: &str) -> bool {
    level == "all" || (!flag.is_empty() && level.contains(flag))
}
