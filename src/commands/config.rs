// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

use crate::config::{self, Config};
use anyhow::Result;

pub fn run(config: &Config, key: Option<&str>) -> Result<()> {
    let Some(key) = key else {
        tracing::debug!("Default config file: {:?}", config::default_path());
        print!("{}", config::to_toml(config)?);
        return Ok(());
    };

    match config::get(config, key)? {
        toml::Value::String(s) => println!("{s}"),
        table @ toml::Value::Table(_) => print!("{}", toml::to_string_pretty(&table)?),
        other => println!("{other}"),
    }
    Ok(())
}
