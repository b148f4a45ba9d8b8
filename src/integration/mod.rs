use std::env;
use std::str::FromStr;
use std::{fs::File, net::SocketAddr};

use axum::http::HeaderValue;
use dotenv::dotenv;
use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, TermLogger, TerminalMode, WriteLogger};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin};

use crate::auth;

pub mod db;
pub mod storage;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid environment: {0}")]
    InvalidEnv(String),

    #[error(transparent)]
    _Env(#[from] env::VarError),
    #[error(transparent)]
    _ParseInt(#[from] std::num::ParseIntError),
    #[error(transparent)]
    _Io(#[from] std::io::Error),
    #[error(transparent)]
    _R2d2(#[from] r2d2::Error),
    #[error(transparent)]
    _Diesel(#[from] diesel::result::Error),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Env {
    Local,
    Dev,
    Stage,
    Production,
}

impl FromStr for Env {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "local" => Ok(Env::Local),
            "dev" => Ok(Env::Dev),
            "stg" => Ok(Env::Stage),
            "prod" => Ok(Env::Production),
            _ => Err(Error::InvalidEnv(s.to_owned())),
        }
    }
}

impl Env {
    pub fn addr(&self) -> SocketAddr {
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(5002);

        match self {
            Env::Local => SocketAddr::from(([127, 0, 0, 1], port)),
            Env::Dev | Env::Stage | Env::Production => SocketAddr::from(([0, 0, 0, 0], port)),
        }
    }

    pub fn allow_origin(&self) -> AllowOrigin {
        match self {
            Env::Local | Env::Dev => AllowOrigin::any(),
            Env::Stage | Env::Production => {
                let origins = env::var("ALLOW_ORIGIN")
                    .unwrap_or_default()
                    .split(',')
                    .filter(|o| !o.is_empty())
                    .filter_map(|o| HeaderValue::from_str(o).ok())
                    .collect::<Vec<HeaderValue>>();
                AllowOrigin::list(origins)
            }
        }
    }

    pub fn allow_methods(&self) -> AllowMethods {
        AllowMethods::any()
    }

    pub fn allow_headers(&self) -> AllowHeaders {
        AllowHeaders::any()
    }
}

#[derive(Clone)]
pub struct Config {
    pub env: Env,

    pub pg: db::Config,
    pub uploads: storage::Config,
    pub auth: auth::Config,
}

impl Default for Config {
    fn default() -> Self {
        dotenv().ok();

        let env = env::var("ENV")
            .map_err(Error::from)
            .and_then(|e| e.parse())
            .unwrap_or(Env::Local);

        Self {
            env,
            pg: db::Config::env().unwrap_or_default(),
            uploads: storage::Config::env().unwrap_or_default(),
            auth: auth::Config::env().unwrap_or_default(),
        }
    }
}

pub fn init_logger() {
    dotenv().ok();

    let rust_log = env::var("RUST_LOG").unwrap_or("info".into());
    let level = LevelFilter::from_str(&rust_log).unwrap_or(LevelFilter::Info);
    let log_file = env::var("SERVICE_NAME")
        .map(|pkg| format!("{pkg}.log"))
        .unwrap_or("service.log".into());

    let mut loggers: Vec<Box<dyn simplelog::SharedLogger>> = vec![TermLogger::new(
        level,
        simplelog::Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    match File::create(&log_file) {
        Ok(file) => loggers.push(WriteLogger::new(level, simplelog::Config::default(), file)),
        Err(e) => eprintln!("Failed to create log file {log_file}: {e}"),
    }

    if let Err(e) = CombinedLogger::init(loggers) {
        eprintln!("Failed to initialize logger: {e}");
    }
}
