mod config;
mod load;

pub use config::{Config, Display, Engine, Simulation};
pub use load::{get, init, load_time, ConfigError};
