// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ovsguard daemon (ogd)
//!
//! Keeps the Open vSwitch pair alive: probes `ovsdb-server` and
//! `ovs-vswitchd` over their control sockets on a periodic tick,
//! restarts them when probes fail, runs a recovery command when every
//! controller disconnects, and reboots the host when chronic failure
//! accumulates.

use std::process::ExitCode;

use og_core::Config;
use og_daemon::{cli, logging, Engine};
use tracing::{debug, error};

use og_daemon::logging::{MAX_LOG_FILE_SIZE, MIN_LOG_FILE_SIZE};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let options = match cli::parse_args(std::env::args().skip(1)) {
        Ok(cli::Cli::Help) => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Ok(cli::Cli::Run(options)) => options,
        Err(err) => {
            eprintln!("{err}");
            print_usage();
            return ExitCode::from(2);
        }
    };

    // Keep the guard alive so buffered file output is flushed on exit.
    let _log_guard = match logging::init(&options.log) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("failed to initialize logger - aborting: {err}");
            return ExitCode::from(1);
        }
    };

    let mut conf = Config::default();
    if let Some(path) = &options.config_path {
        if let Err(err) = conf.load_file(path) {
            error!("failed to load configuration from file \"{path}\": {err}");
            return ExitCode::from(1);
        }
    }
    // environment overrides win over file values
    conf.load_env();

    debug!("started");

    let mut engine = Engine::new(conf);
    if let Err(err) = engine.run().await {
        error!("{err}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

fn print_usage() {
    println!("Usage:");
    println!("    ogd -h");
    println!("    ogd [-c FILE] [-l LEVEL] [-f NAME [-r COUNT] [-m SIZE]] [-s]");
    println!("Where:");
    println!(
        "    -c FILE - load configuration from FILE (max length is {})",
        cli::MAX_CONFIG_PATH
    );
    println!("    -h - print this page");
    println!("    -l LEVEL - set log level:");
    println!("        1 - error (default)");
    println!("        2 - warning");
    println!("        3 - informational");
    println!("        4 - debug");
    println!("    -f NAME - log file name (may include a full path)");
    println!("    -s - silent mode - no console output");
    println!("    -r COUNT - rotation file count (1 <= count <= 9, default is 1)");
    println!(
        "    -m SIZE - log file size limit in bytes (max is {MAX_LOG_FILE_SIZE} (used by default), min is {MIN_LOG_FILE_SIZE})"
    );
}
