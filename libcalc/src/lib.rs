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

//! libcalc contains the implementation of the calc tool, a small
//! arithmetic expression evaluator fronted by an http api and an
//! interactive repl.

use std::io;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::{fmt::format::FmtSpan, prelude::*};

mod config;
mod consts;
pub mod eval;
mod repl;
mod server;

/// The command line arguments that calc expects. These can be
/// directly parsed with clap or manually constructed in order to
/// present some other user interface.
///
/// NOTE: You must check `version()` and handle it yourself
/// if it is set. Clap won't do a good job with its
/// automatic version support for a library.
#[derive(Parser, Debug)]
#[clap(author, about)]
pub struct Args {
    #[clap(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Show more in logs, may be provided multiple times",
    )]
    pub verbose: u8,

    #[clap(short, long, action, help = "a toml file containing configuration")]
    pub config_file: Option<String>,

    #[clap(subcommand)]
    pub command: Commands,
}

/// The subcommands that calc supports.
#[derive(Subcommand, Debug)]
pub enum Commands {
    #[clap(about = "Print version")]
    Version,

    #[clap(about = "Starts the http server that evaluates expressions

The server exposes a single POST route, /api/v1/calculate, that
accepts {\"expression\": \"2 + 2\"} and answers {\"result\": \"4\"}.
The listen port comes from the --port flag, the PORT environment
variable, or the config file, in that order.")]
    Serve {
        #[clap(short, long, help = "The port to listen on, overrides PORT and the config file")]
        port: Option<u16>,
    },

    #[clap(about = "Evaluates expressions read interactively from stdin

Each line is evaluated as one expression. A literal 'exit' line
ends the session.")]
    Repl,
}

impl Args {
    /// Version indicates if the wrapping binary must display the
    /// version then exit.
    pub fn version(&self) -> bool {
        matches!(self.command, Commands::Version)
    }
}

/// Run the calc tool with the given arguments.
pub fn run(args: Args) -> anyhow::Result<()> {
    let log_level_filter = if args.verbose == 0 {
        tracing_subscriber::filter::LevelFilter::INFO
    } else if args.verbose == 1 {
        tracing_subscriber::filter::LevelFilter::DEBUG
    } else {
        tracing_subscriber::filter::LevelFilter::TRACE
    };

    tracing_subscriber::registry::Registry::default()
        .with(log_level_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_thread_ids(true)
                .with_target(false)
                .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
                .with_writer(io::stderr),
        )
        .init();

    let config = config::read_config(&args.config_file)?;

    let res: anyhow::Result<()> = match args.command {
        Commands::Version => return Err(anyhow!("wrapper binary must handle version")),
        Commands::Serve { port } => server::run(config, port),
        Commands::Repl => repl::run(),
    };

    if let Err(err) = res {
        error!("{:?}", err);
        std::process::exit(1);
    }

    Ok(())
}
