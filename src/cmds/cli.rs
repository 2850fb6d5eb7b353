//! Flag surface, structured the way `cmd/load.go`/`cmd/watch.go` nest a
//! sink-specific subcommand (`configmap`/`secret`/`folder`) under each
//! top-level verb.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "git2kube", version, about = "Projects a git branch onto a ConfigMap, Secret, or folder")]
pub struct Opts {
    #[command(subcommand)]
    pub command: Command,

    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Logfmt)]
    pub log_format: LogFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    /// Disables logging entirely; `tracing_subscriber::EnvFilter` has no
    /// separate fatal/panic tier, so this is the closest equivalent.
    Off,
}

impl LogLevel {
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Logfmt,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch once and upload, then exit.
    Load(LoadCmd),
    /// Fetch and upload on an interval until terminated.
    Watch(WatchCmd),
    /// Print the version and exit.
    Version,
    /// Write CLI reference documentation to a directory.
    Gendoc(GendocArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Remote repository URL, in https:// or scp-like ssh form.
    #[arg(short = 'g', long)]
    pub git: String,

    #[arg(short = 'b', long, default_value = "master")]
    pub branch: String,

    /// Local directory used to mirror the remote repository between refreshes.
    #[arg(short = 'c', long = "cache-folder", default_value = "/tmp/git2kube/data/")]
    pub cache_folder: PathBuf,

    #[arg(long, default_value = ".*")]
    pub include: Vec<String>,

    #[arg(long, default_value = "^\\..*")]
    pub exclude: Vec<String>,

    /// Private key used for ssh authentication; ignored for http(s) URLs.
    #[arg(short = 'p', long = "ssh-key")]
    pub ssh_key: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct LoadCmd {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub target: TargetCmd,
}

#[derive(Args, Debug)]
pub struct WatchCmd {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Refresh interval, in seconds.
    #[arg(short = 'i', long, default_value_t = 10)]
    pub interval: u64,

    #[arg(long)]
    pub healthcheck_file: Option<PathBuf>,

    #[command(subcommand)]
    pub target: TargetCmd,
}

#[derive(Subcommand, Debug)]
pub enum TargetCmd {
    Configmap(ConfigMapArgs),
    Secret(SecretArgs),
    Folder(FolderArgs),
}

#[derive(Args, Debug)]
pub struct ConfigMapArgs {
    /// `true` reads the local kubeconfig (`~/.kube/config` or `$KUBECONFIG`);
    /// `false` uses the in-cluster service account.
    #[arg(short = 'k', long, default_value_t = false)]
    pub kubeconfig: bool,
    #[arg(short = 'n', long, default_value = "default")]
    pub namespace: String,
    #[arg(short = 'm', long = "configmap")]
    pub name: String,
    #[arg(long = "label")]
    pub labels: Vec<String>,
    #[arg(long = "annotation")]
    pub annotations: Vec<String>,
    #[arg(long = "merge-type", default_value = "delete")]
    pub merge_type: String,
}

#[derive(Args, Debug)]
pub struct SecretArgs {
    #[arg(short = 'k', long, default_value_t = false)]
    pub kubeconfig: bool,
    #[arg(short = 'n', long, default_value = "default")]
    pub namespace: String,
    #[arg(short = 's', long = "secret")]
    pub name: String,
    #[arg(long = "label")]
    pub labels: Vec<String>,
    #[arg(long = "annotation")]
    pub annotations: Vec<String>,
    #[arg(long = "merge-type", default_value = "delete")]
    pub merge_type: String,
}

#[derive(Args, Debug)]
pub struct FolderArgs {
    #[arg(short = 't', long)]
    pub target_folder: PathBuf,
}

#[derive(Args, Debug)]
pub struct GendocArgs {
    #[arg(short = 'd', long)]
    pub destination: PathBuf,
}
