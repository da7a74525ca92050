//! Command-line interface definitions using clap

use std::path::{Path, PathBuf};

use clap::Parser;

/// GeoProxy - IP to country lookup proxy with rate-limited upstream failover
#[derive(Parser, Debug)]
#[command(name = "geoproxy")]
#[command(version)]
#[command(about = "IP to country lookup proxy with rate-limited upstream failover", long_about = None)]
pub struct Cli {
    /// Configuration file (TOML or JSON)
    #[arg(value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Configuration file, same as the positional argument
    #[arg(short = 'c', long = "config", value_name = "FILE", conflicts_with = "config_file")]
    pub config: Option<PathBuf>,

    /// Print a sample configuration to stdout and exit
    #[arg(long)]
    pub generate_config: bool,
}

impl Cli {
    /// 命令行指定的配置文件路径（`-c` 优先）
    pub fn config_path(&self) -> Option<&Path> {
        self.config.as_deref().or(self.config_file.as_deref())
    }
}
