// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{env, fs, path::PathBuf};

use anyhow::Context;
use serde_derive::Deserialize;
use tracing::{info, instrument};

use super::consts;

#[instrument(skip_all)]
pub fn read_config(config_file: &Option<String>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    if let Some(config_path) = config_file {
        info!("parsing explicitly passed in config ({})", config_path);
        let config_str = fs::read_to_string(config_path).context("reading config toml (1)")?;
        config = toml::from_str(&config_str).context("parsing config file (1)")?;
    } else if let Ok(home) = env::var("HOME") {
        let mut config_path = PathBuf::from(home);
        config_path.push(".config");
        config_path.push("calc");
        config_path.push("config.toml");
        if config_path.exists() {
            let config_str = fs::read_to_string(config_path).context("reading config toml (2)")?;
            config = toml::from_str(&config_str).context("parsing config file (2)")?;
        }
    }

    Ok(config)
}

#[derive(Deserialize, Default, Debug, Clone)]
pub struct Config {
    /// The TCP port the http server listens on. Both the `PORT`
    /// environment variable and the `--port` flag override this.
    pub port: Option<u16>,
}

/// Pick the port for the http server to listen on.
///
/// Precedence: the `--port` flag, then the `PORT` environment
/// variable, then the config file, then 8080. An empty `PORT`
/// counts as unset, but one that fails to parse is a startup error
/// rather than something to silently fall past.
pub fn resolve_port(
    flag: Option<u16>,
    env_port: Option<&str>,
    config: &Config,
) -> anyhow::Result<u16> {
    if let Some(port) = flag {
        return Ok(port);
    }

    match env_port {
        Some(raw) if !raw.is_empty() => {
            raw.parse().with_context(|| format!("parsing PORT value '{raw}'"))
        }
        _ => Ok(config.port.unwrap_or(consts::DEFAULT_PORT)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use ntest::timeout;

    #[test]
    #[timeout(30000)]
    fn parse() -> anyhow::Result<()> {
        let cases = vec![
            r#"
            port = 9090
            "#,
            "",
        ];

        for case in cases.into_iter() {
            let _: Config = toml::from_str(case)?;
        }

        Ok(())
    }

    #[test]
    #[timeout(30000)]
    fn port_precedence() -> anyhow::Result<()> {
        let file_config = Config { port: Some(3000) };

        assert_eq!(resolve_port(Some(4000), Some("5000"), &file_config)?, 4000);
        assert_eq!(resolve_port(None, Some("5000"), &file_config)?, 5000);
        assert_eq!(resolve_port(None, None, &file_config)?, 3000);
        assert_eq!(resolve_port(None, None, &Config::default())?, consts::DEFAULT_PORT);

        // an empty PORT counts as unset
        assert_eq!(resolve_port(None, Some(""), &Config::default())?, consts::DEFAULT_PORT);

        assert!(resolve_port(None, Some("not-a-port"), &Config::default()).is_err());

        Ok(())
    }
}
