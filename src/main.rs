use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use distro_tracker::config::{Config, ConfigError};
use distro_tracker::distro::XbstrapScanner;
use distro_tracker::logging::{self, LogFormat};
use distro_tracker::notify::{EmailNotifier, NotifyingHooks, SmtpMailer};
use distro_tracker::reconcile::{PassReport, PassStatus, Reconciler, status_of};
use distro_tracker::status::freshness_report;
use distro_tracker::store::{StateStore, Store};
use distro_tracker::sync::GitSync;
use distro_tracker::upstream::{NixosResolver, UpstreamRepository, UpstreamResolver};

#[derive(Parser)]
#[command(name = "distro-tracker")]
#[command(version, about = "Track distribution package versions against upstream")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite state file
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Log file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one reconciliation pass
    Run(RunArgs),
    /// Print recorded package freshness
    Report(ReportArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Root of the distribution tree
    #[arg(long)]
    distribution_path: Option<PathBuf>,

    /// Upstream repository to compare against
    #[arg(long, value_enum)]
    upstream: Option<UpstreamRepository>,

    /// Pull the distribution tree before scanning
    #[arg(long)]
    update_git: bool,

    #[arg(long)]
    git_remote: Option<String>,

    #[arg(long)]
    git_branch: Option<String>,

    /// Notify maintainers of stale packages by e-mail
    #[arg(long)]
    email_notifications: bool,

    #[arg(long)]
    smtp_server: Option<String>,

    #[arg(long)]
    smtp_port: Option<u16>,

    #[arg(long)]
    smtp_username: Option<String>,

    #[arg(long)]
    smtp_password: Option<String>,

    #[arg(long)]
    sender_email: Option<String>,

    /// Recipient for packages without a maintainer address
    #[arg(long)]
    fallback_email: Option<String>,

    /// Connect to the SMTP server without STARTTLS
    #[arg(long)]
    no_tls: bool,

    #[arg(long)]
    nixos_index_url: Option<String>,

    #[arg(long)]
    resolve_concurrency: Option<usize>,

    /// Record upstream versions of new sources without firing hooks
    #[arg(long)]
    quiet_new_sources: bool,
}

impl RunArgs {
    fn apply(self, config: &mut Config) {
        override_with(&mut config.distribution_path, self.distribution_path);
        override_with(&mut config.upstream, self.upstream);
        override_with(&mut config.git.branch, self.git_branch);
        override_with(&mut config.notifications.server, self.smtp_server);
        override_with(&mut config.notifications.username, self.smtp_username);
        override_with(&mut config.notifications.password, self.smtp_password);

        if self.update_git {
            config.git.enabled = true;
        }
        if let Some(remote) = self.git_remote {
            config.git.remote = remote;
        }
        if self.email_notifications {
            config.notifications.enabled = true;
        }
        if let Some(port) = self.smtp_port {
            config.notifications.port = port;
        }
        if let Some(sender) = self.sender_email {
            config.notifications.sender = sender;
        }
        if let Some(fallback) = self.fallback_email {
            config.notifications.fallback = fallback;
        }
        if self.no_tls {
            config.notifications.use_tls = false;
        }
        if let Some(url) = self.nixos_index_url {
            config.nixos.index_url = url;
        }
        if let Some(concurrency) = self.resolve_concurrency {
            config.resolve_concurrency = concurrency;
        }
        if self.quiet_new_sources {
            config.announce_new_sources = false;
        }
    }
}

#[derive(Args)]
struct ReportArgs {
    /// Only packages older than their upstream version
    #[arg(long, conflicts_with = "missing_maintainer")]
    outdated: bool,

    /// Only packages without a maintainer
    #[arg(long)]
    missing_maintainer: bool,

    /// List sources whose name contains this term instead
    #[arg(long, conflicts_with_all = ["outdated", "missing_maintainer"])]
    search: Option<String>,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn override_with<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    override_with(&mut config.database_path, cli.database);
    override_with(&mut config.log.file, cli.log_file);
    if cli.json_logs {
        config.log.json = true;
    }

    let _guard = logging::init(
        LogFormat::from_json_flag(config.log.json),
        Some(config.log.file_path().as_path()),
    )?;

    match cli.command {
        Command::Run(args) => {
            args.apply(&mut config);
            tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?
                .block_on(run(config))
        }
        Command::Report(args) => report(&config, &args),
    }
}

fn open_store(path: &Path) -> anyhow::Result<Store> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Store::open(path).with_context(|| format!("failed to open database {}", path.display()))
}

fn build_resolver(repository: UpstreamRepository, config: &Config) -> Arc<dyn UpstreamResolver> {
    match repository {
        UpstreamRepository::Nixos => Arc::new(
            NixosResolver::new(config.nixos.index_url.clone())
                .with_cache(config.nixos.cache_path(), config.nixos.max_age()),
        ),
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    config.validate()?;
    let root = config
        .distribution_path
        .clone()
        .ok_or(ConfigError::MissingDistributionPath)?;
    let store = Arc::new(open_store(&config.database_path())?);

    let mut reconciler = Reconciler::new(
        Arc::clone(&store),
        XbstrapScanner::new(config.root_file.clone()),
        root,
    )
    .with_options(config.reconcile_options());

    if let Some(repository) = config.upstream {
        reconciler = reconciler.with_resolver(build_resolver(repository, &config));
    }

    if config.git.enabled {
        reconciler = reconciler.with_sync(GitSync::new(
            config.git.remote.clone(),
            config.git.branch.clone(),
        ));
    }

    if config.notifications.enabled {
        let mailer = SmtpMailer::new(&config.notifications.smtp_settings()?)?;
        let notifier = EmailNotifier::new(
            Arc::new(mailer),
            config.notifications.sender.clone(),
            config.notifications.fallback.clone(),
        );
        info!(
            "E-mail notifications enabled via {}",
            config.notifications.server.as_deref().unwrap_or_default()
        );
        reconciler = reconciler.with_hooks(Arc::new(NotifyingHooks::new(
            Arc::clone(&store),
            notifier,
        )));
    }

    let result = reconciler.run_pass().await;
    let status = status_of(&result);
    let report = result.context("reconciliation pass aborted")?;
    print_summary(status, &report);
    Ok(())
}

fn print_summary(status: PassStatus, report: &PassReport) {
    let counts = &report.counts;
    println!(
        "{status}: sources +{} ~{} -{}, packages +{} ~{} -{}, upstream updates {}",
        counts.sources_added,
        counts.sources_updated,
        counts.sources_removed,
        counts.packages_added,
        counts.packages_updated,
        counts.packages_removed,
        counts.upstream_updates,
    );

    if !report.unresolved.is_empty() {
        println!("upstream unknown: {}", report.unresolved.join(", "));
    }
    for entry in &report.skipped {
        warn!(
            "Skipped {} {} in {}: {}",
            entry.kind.as_str(),
            entry.name.as_deref().unwrap_or("<unnamed>"),
            entry.file.display(),
            entry.reason
        );
    }
    for warning in &report.warnings {
        println!("warning: {warning}");
    }
}

fn report(config: &Config, args: &ReportArgs) -> anyhow::Result<()> {
    let store = open_store(&config.database_path())?;

    if let Some(term) = &args.search {
        let sources = store.search_sources(term)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&sources)?);
        } else {
            for source in &sources {
                println!("{:<32} {}", source.name, source.local_version);
            }
        }
        return Ok(());
    }

    if args.missing_maintainer {
        let packages = store.packages_missing_maintainer()?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&packages)?);
        } else {
            for package in &packages {
                println!("{:<32} {}", package.name, package.source_name);
            }
        }
        return Ok(());
    }

    let mut entries = freshness_report(&store)?;
    if args.outdated {
        entries.retain(|entry| entry.is_outdated());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for entry in &entries {
            println!(
                "{:<32} {:<24} {:<16} {:<16} {}",
                entry.package,
                entry.source,
                entry.local_version,
                entry.upstream_version.as_deref().unwrap_or("-"),
                entry.status
            );
        }
    }
    Ok(())
}
