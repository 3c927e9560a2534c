//! # httpserver - Entry Point
//! src/main.rs
//!
//! `httpserver [-t threads] <port>`
//!
//! Los logs van a stderr junto al audit log; por defecto solo se muestran
//! warnings. Con `RUST_LOG=info` se ve el resumen de arranque.

use httpserver::config::Config;
use httpserver::server::Server;
use std::process;

const USAGE: &str = "Usage: httpserver [-t threads] <port>";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = match Config::new() {
        Ok(config) => config,
        Err(e) => {
            // --help y --version no son errores
            if !e.use_stderr() {
                let _ = e.print();
                process::exit(0);
            }
            eprintln!("{}", e);
            eprintln!("{}", USAGE);
            process::exit(1);
        }
    };

    if let Err(msg) = config.validate() {
        eprintln!("{}", msg);
        process::exit(1);
    }

    config.print_summary();

    let server = match Server::bind(config) {
        Ok(server) => server,
        Err(e) => {
            eprintln!("💥 Error fatal: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        eprintln!("💥 Error fatal: {}", e);
        process::exit(1);
    }
}
