mod build;
mod cli;
mod gendoc;
mod load;
mod version;
mod watch;

use clap::Parser;
use cli::{Command, LogFormat, LogLevel, Opts};
use tracing_subscriber::EnvFilter;

fn init_logging(log_level: LogLevel, log_format: LogFormat) {
    // RUST_LOG sets the baseline for every crate; --log-level only adds a
    // directive scoped to this one, so raising it doesn't also turn up
    // logging in git2/kube/h2/tower.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive(
            format!("git2kube={}", log_level.as_filter_str())
                .parse()
                .expect("log level always parses as a directive"),
        );
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    if log_format == LogFormat::Json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[tokio::main]
async fn main() {
    let raw_args: Vec<String> = std::env::args().collect();
    let expanded = git2kube::util::expand_args(&raw_args[1..]);
    let argv = std::iter::once(raw_args[0].clone()).chain(expanded);
    let opts = Opts::parse_from(argv);

    init_logging(opts.log_level, opts.log_format);

    let result = match opts.command {
        Command::Load(cmd) => load::run(cmd).await,
        Command::Watch(cmd) => watch::run(cmd).await,
        Command::Version => {
            version::run();
            Ok(())
        }
        Command::Gendoc(args) => gendoc::run(&args.destination),
    };

    if let Err(e) = result {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}
