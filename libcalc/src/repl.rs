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

use std::io::{self, BufRead};

use anyhow::Context;
use tracing::{info, instrument};

use super::{consts, eval};

/// Read expressions from stdin until an `exit` line (or end of
/// input) and print each result back on stdout. A malformed
/// expression gets a diagnostic on stderr and the loop keeps going.
#[instrument(skip_all)]
pub fn run() -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        println!("input expression");
        let Some(line) = lines.next() else {
            info!("stdin closed, shutting down");
            return Ok(());
        };
        let line = line.context("reading expression from stdin")?;
        let expression = line.trim();

        if expression == consts::EXIT_COMMAND {
            info!("shutting down cleanly");
            return Ok(());
        }

        match eval::evaluate(expression) {
            Ok(value) => println!("{expression} = {value}"),
            Err(err) => eprintln!("failed to calculate expression: {err}"),
        }
    }
}
