// Copyright 2024 Gibson Core Authors.
// Licensed under the BSD-3-Clause license.

//! `gibsond` is the single-threaded front end for the query-processing
//! core: it parses the command line, loads configuration, binds the
//! listening socket, and drives `Server::run` to completion. Grounded in
//! `server/segcache/src/main.rs`'s CLI + panic hook + config loading
//! shape.

mod codec;
mod connection;
mod server;

use backtrace::Backtrace;
use cache_config::Config;
use clap::{Arg, Command};

use crate::server::Server;

fn main() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("{info}");
        eprintln!("{:?}", Backtrace::new());
        std::process::exit(101);
    }));

    logger::init(logger::Level::Info);
    common::metrics::init();

    let matches = Command::new(env!("CARGO_BIN_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .about("query-processing core for an in-memory key/value cache")
        .arg(
            Arg::new("CONFIG")
                .help("server configuration file")
                .action(clap::ArgAction::Set)
                .index(1),
        )
        .arg(
            Arg::new("print-config")
                .short('c')
                .long("print-config")
                .help("print the resolved configuration and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let config = if let Some(file) = matches.get_one::<String>("CONFIG") {
        log::debug!("loading config: {file}");
        match Config::load(file) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("error loading config file: {file}\n{e}");
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    if matches.get_flag("print-config") {
        config.print();
        std::process::exit(0);
    }

    let mut server = match Server::bind(config.listen(), config.limits) {
        Ok(server) => server,
        Err(e) => {
            eprintln!("error binding listener: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        eprintln!("server error: {e}");
        std::process::exit(1);
    }
}
