// scorewatch-core/src/infrastructure/config/mod.rs

pub mod monitor;

pub use monitor::{
    FairnessConfig, FeatureList, MonitorConfig, PathsConfig, find_config_file,
    load_monitor_config,
};
