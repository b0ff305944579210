use clap::{Parser, Subcommand};
use console::style;
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use adaptive_proxy_scheduler::format_utils::FormatUtils;
use adaptive_proxy_scheduler::{DispatchMode, Orchestrator, RequestContext, Result, SchedulerConfig, VERSION};

#[derive(Parser)]
#[command(name = "proxy-scheduler", version = VERSION, about = "Adaptive outbound proxy scheduler")]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Preheat the endpoint pool, replay a batch of synthetic requests
    /// through the Dispatcher, and print the resulting decisions.
    Run,
    /// Print the effective (layered) configuration and exit.
    ShowConfig,
}

/// A small, fixed batch of synthetic requests used to demonstrate the
/// Dispatcher's classification and selection behaviour end to end.
fn demo_requests() -> Vec<RequestContext> {
    vec![
        RequestContext {
            host: "api.openai.com".to_string(),
            port: 443,
            protocol: "tls".to_string(),
            user_tag: Some("demo".to_string()),
            ..Default::default()
        },
        RequestContext {
            host: "cdn.netflix.com".to_string(),
            port: 443,
            protocol: "tls".to_string(),
            url_hint: Some("video/mp4 stream for cdn.netflix.com".to_string()),
            payload_size_bytes: 8 * 1024 * 1024,
            user_tag: Some("demo".to_string()),
            ..Default::default()
        },
        RequestContext {
            host: "matchmaking.steamgames.com".to_string(),
            port: 27015,
            protocol: "udp".to_string(),
            user_tag: Some("demo".to_string()),
            ..Default::default()
        },
        RequestContext {
            host: "example.com".to_string(),
            port: 80,
            protocol: "http".to_string(),
            user_tag: Some("demo".to_string()),
            ..Default::default()
        },
    ]
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{}: {}", style("Error").red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!("adaptive-proxy-scheduler v{}", VERSION);

    let config = SchedulerConfig::load().unwrap_or_else(|e| {
        eprintln!("{}: failed to load config, using defaults: {e}", style("Warning").yellow().bold());
        SchedulerConfig::default()
    });

    match cli.command.unwrap_or(Command::Run) {
        Command::ShowConfig => {
            println!("{}", toml::to_string_pretty(&config).unwrap_or_default());
            Ok(())
        }
        Command::Run => {
            let orchestrator = Orchestrator::new(config)?;
            orchestrator.start().await?;

            let endpoints = orchestrator.registry().all();
            println!("{} endpoint(s) registered:", endpoints.len());
            for endpoint in &endpoints {
                println!("  {} [{}] quality={}", endpoint.id, endpoint.address(), FormatUtils::format_score(endpoint.quality));
            }

            println!("\nreplaying {} synthetic request(s):", demo_requests().len());
            for ctx in demo_requests() {
                let decision = orchestrator.dispatch(&ctx)?;
                match &decision.mode {
                    DispatchMode::Direct => println!("  {} -> direct", ctx.host),
                    DispatchMode::Proxy(endpoint) => {
                        println!(
                            "  {} -> proxy {} (video={} ai={} gaming={} cache_hit={})",
                            ctx.host, endpoint.id, decision.classification.is_video, decision.classification.is_ai, decision.classification.is_gaming, decision.cache_hit
                        );
                    }
                }
            }

            orchestrator.shutdown()?;
            Ok(())
        }
    }
}

/// Initialize structured logging with appropriate level.
fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("failed to set tracing subscriber");
}
