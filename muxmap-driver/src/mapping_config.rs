// SPDX-License-Identifier: Apache-2.0

use clap::ArgMatches;
use serde::Deserialize;

/// `[mapping]` table of a `muxmap.toml` file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MappingConfig {
    /// Rule file (TOML, or JSON by extension) to use instead of the built-in
    /// rule table. Relative paths are taken relative to the working directory.
    pub rules: Option<String>,

    /// Reject rules whose target cell has no output function.
    pub require_functional: Option<bool>,
}

/// Rules path from the `--rules` flag if given, else from the config.
pub fn get_rules_path(matches: &ArgMatches, config: &Option<MappingConfig>) -> Option<String> {
    if let Some(rules) = matches.get_one::<String>("rules") {
        Some(rules.to_string())
    } else if let Some(config) = config {
        config.rules.clone()
    } else {
        None
    }
}

/// `--require_functional` if given, else the config value, else `true`.
pub fn get_require_functional(matches: &ArgMatches, config: &Option<MappingConfig>) -> bool {
    if let Some(value) = matches.get_one::<String>("require_functional") {
        value == "true"
    } else if let Some(config) = config {
        config.require_functional.unwrap_or(true)
    } else {
        true
    }
}
