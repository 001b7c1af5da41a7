#[macro_use] extern crate clap;
#[macro_use] extern crate lazy_static;

pub mod graphics;
pub mod interface;

use std::process;

use log::{error, LevelFilter};

use interface::cli::{self, Command};

fn init_logging(filter: Option<&str>) {
    let mut builder = env_logger::Builder::new();

    match filter.map(String::from).or_else(|| std::env::var("RUST_LOG").ok()) {
        Some(filter) => builder.parse_filters(&filter),
        None => builder.filter_level(LevelFilter::Info),
    };

    builder.init();
}

fn main() {
    let options = match cli::parse() {
        Ok(options) => options,
        Err(e) => {
            init_logging(None);
            error!("{:#}", e);
            process::exit(1);
        }
    };

    init_logging(options.log_filter.as_deref());

    let result = match options.command {
        Command::Run(config) => graphics::window::run(config),
        Command::Check(config) => graphics::window::check(&config).map(|all_valid| {
            if !all_valid {
                process::exit(1);
            }
        }),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        process::exit(1);
    }
}
