//! parley - chat with LLMs from the terminal

mod ask;
mod chat;
mod commands;
mod compare;
mod config;
mod demo;
mod reason;
mod utils;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use futures::future::join_all;
use parley_agent::{
    Agent, AgentConfig, CompressionPolicy, ConversationStore, FileStore, ProviderGateway,
    SessionPool,
};
use parley_ai::{ProviderKind, RequestOptions};
use tracing_subscriber::EnvFilter;

/// parley - chat with LLMs, keeping long conversations within budget
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Provider (claude, deepseek, yandexgpt)
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// Model to use (provider default when unset)
    #[arg(short, long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive chat with stored history (default)
    Chat {
        /// Session to resume or create
        #[arg(short, long, default_value = "default")]
        session: String,

        /// Start a new session with a generated id
        #[arg(long, conflicts_with = "session")]
        new: bool,

        /// System prompt
        #[arg(long)]
        system: Option<String>,

        /// Never summarize older history
        #[arg(long)]
        no_compression: bool,
    },

    /// Run the scripted demo conversations
    Demo {
        /// Case number to run (1-based); all cases when omitted
        #[arg(short, long)]
        case: Option<usize>,
    },

    /// Send a single prompt without history
    Ask {
        prompt: String,

        #[arg(short, long)]
        temperature: Option<f32>,

        #[arg(long)]
        max_tokens: Option<u32>,

        /// System prompt
        #[arg(long)]
        system: Option<String>,

        /// Stop sequence
        #[arg(long)]
        stop: Option<String>,
    },

    /// Send one prompt to several models and compare time, tokens and cost
    Compare {
        prompt: String,

        /// Comma-separated models; `--model`, then a provider default set,
        /// when omitted
        #[arg(long, value_delimiter = ',')]
        models: Vec<String>,

        /// Ask the default model of every provider with an API key
        #[arg(long, conflicts_with = "models")]
        all_providers: bool,

        /// Comma-separated temperatures to try each model at
        #[arg(long, value_delimiter = ',')]
        temperatures: Vec<f32>,
    },

    /// Solve a puzzle with several prompting strategies and rank the replies
    Reason {
        /// Puzzle to solve; the river-crossing puzzle when omitted
        puzzle: Option<String>,
    },

    /// List saved sessions
    Sessions {
        /// Delete this session instead of listing
        #[arg(long)]
        delete: Option<String>,
    },

    /// Initialize config file
    InitConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup tracing
    let filter = if args.verbose {
        EnvFilter::new("parley=debug,parley_agent=debug,parley_ai=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Load config file
    let cfg = config::Config::load();

    let command = args.command.unwrap_or(Command::Chat {
        session: "default".to_string(),
        new: false,
        system: None,
        no_compression: false,
    });

    match command {
        Command::InitConfig => {
            match config::Config::init() {
                Ok(path) => {
                    println!("Config file created at: {}", path.display());
                    println!("\nExample config:\n{}", config::example_config());
                }
                Err(e) => {
                    eprintln!("Error creating config: {}", e);
                    std::process::exit(1);
                }
            }
            Ok(())
        }

        Command::Sessions { delete } => {
            let store = FileStore::new(cfg.storage_dir());
            match delete {
                Some(session) => {
                    store.delete(&session)?;
                    println!("Deleted session {}", session);
                    Ok(())
                }
                None => list_sessions(&store),
            }
        }

        Command::Chat {
            session,
            new,
            system,
            no_compression,
        } => {
            let session = if new {
                uuid::Uuid::new_v4().simple().to_string()
            } else {
                session
            };
            let kind = cfg.provider_kind(args.provider.as_deref())?;
            let mut options = options_from(&cfg, args.model);
            if system.is_some() {
                options.system = system;
            }
            let compression = if no_compression {
                CompressionPolicy::disabled()
            } else {
                cfg.compression.clone()
            };

            let mut agent = Agent::new(
                AgentConfig {
                    options,
                    compression,
                },
                make_gateway(&cfg, kind)?,
                Arc::new(FileStore::new(cfg.storage_dir())),
                session,
            )?;

            let stdin = std::io::stdin();
            chat::run_interactive(&mut agent, kind, stdin.lock(), std::io::stdout()).await
        }

        Command::Demo { case } => {
            let kind = cfg.provider_kind(args.provider.as_deref())?;
            let numbers: Vec<usize> = match case {
                Some(n) if (1..=demo::DEMO_CASES.len()).contains(&n) => vec![n],
                Some(n) => anyhow::bail!(
                    "No demo case {} (choose 1-{})",
                    n,
                    demo::DEMO_CASES.len()
                ),
                None => (1..=demo::DEMO_CASES.len()).collect(),
            };

            let pool = SessionPool::new(
                AgentConfig {
                    options: options_from(&cfg, args.model),
                    compression: cfg.compression.clone(),
                },
                make_gateway(&cfg, kind)?,
                Arc::new(FileStore::new(cfg.storage_dir())),
            );

            // Cases run concurrently; each prints once it is done
            let runs = numbers.into_iter().map(|n| {
                let pool = &pool;
                async move {
                    let mut out = Vec::new();
                    let agent = pool.get(&demo::session_for(n))?;
                    let mut agent = agent.lock().await;
                    let result = demo::run_case(&mut agent, n, &demo::DEMO_CASES[n - 1], &mut out).await;
                    anyhow::Ok((out, result))
                }
            });

            let mut failed = false;
            for run in join_all(runs).await {
                let (out, result) = run?;
                print!("{}", String::from_utf8_lossy(&out));
                if let Err(e) = result {
                    eprintln!("Error: {}", e);
                    failed = true;
                }
            }
            if failed {
                std::process::exit(1);
            }
            Ok(())
        }

        Command::Ask {
            prompt,
            temperature,
            max_tokens,
            system,
            stop,
        } => {
            let kind = cfg.provider_kind(args.provider.as_deref())?;
            let mut options = options_from(&cfg, args.model);
            options.temperature = temperature.or(options.temperature);
            options.max_tokens = max_tokens.or(options.max_tokens);
            if system.is_some() {
                options.system = system;
            }
            if stop.is_some() {
                options.stop = stop;
            }

            let gateway = make_gateway(&cfg, kind)?;
            ask::run(gateway.as_ref(), kind, &prompt, &options, &mut std::io::stdout()).await?;
            Ok(())
        }

        Command::Compare {
            prompt,
            models,
            all_providers,
            temperatures,
        } => {
            let contenders = if all_providers {
                if args.model.is_some() {
                    anyhow::bail!("--model names one provider's model; it cannot be used with --all-providers");
                }
                let mut contenders = Vec::new();
                for kind in cfg.configured_providers() {
                    match make_gateway(&cfg, kind) {
                        Ok(gateway) => contenders.push(compare::Contender {
                            kind,
                            gateway,
                            models: vec![kind.default_model().to_string()],
                        }),
                        Err(e) => eprintln!("Skipping {}: {}", kind.name(), e),
                    }
                }
                if contenders.is_empty() {
                    anyhow::bail!("No provider has an API key configured");
                }
                contenders
            } else {
                let kind = cfg.provider_kind(args.provider.as_deref())?;
                let requested = compare::requested_models(models, args.model);
                vec![compare::Contender {
                    kind,
                    gateway: make_gateway(&cfg, kind)?,
                    models: compare::models_for(kind, &requested),
                }]
            };

            let requests: usize = contenders.iter().map(|c| c.models.len()).sum::<usize>()
                * temperatures.len().max(1);
            println!("Sending {} requests...\n", requests);
            let runs = compare::run_all(&contenders, &prompt, &temperatures, &cfg.request_options()).await;
            compare::report(&mut std::io::stdout(), &runs)?;
            Ok(())
        }

        Command::Reason { puzzle } => {
            let kind = cfg.provider_kind(args.provider.as_deref())?;
            let puzzle = puzzle.unwrap_or_else(|| reason::DEFAULT_PUZZLE.to_string());
            let gateway = make_gateway(&cfg, kind)?;

            println!("Puzzle: {}\n", puzzle);
            let runs = reason::run_all(gateway.as_ref(), &puzzle, &options_from(&cfg, args.model)).await;
            reason::report(&mut std::io::stdout(), &runs)?;
            Ok(())
        }
    }
}

/// Config request options, with the command-line model taking precedence
fn options_from(cfg: &config::Config, model: Option<String>) -> RequestOptions {
    let mut options = cfg.request_options();
    if model.is_some() {
        options.model = model;
    }
    options
}

fn make_gateway(cfg: &config::Config, kind: ProviderKind) -> anyhow::Result<Arc<ProviderGateway>> {
    let provider = parley_ai::create_provider(kind, &cfg.provider_settings(kind))?;
    tracing::debug!("Using provider {}", kind.name());
    Ok(Arc::new(ProviderGateway::new(provider)))
}

fn list_sessions(store: &FileStore) -> anyhow::Result<()> {
    match store.list() {
        Ok(sessions) => {
            if sessions.is_empty() {
                println!("No saved sessions found.");
                println!("Sessions are stored in: {}", store.dir().display());
            } else {
                println!("Saved sessions:\n");
                println!("{:<24} {:<20} {:<8} Summary", "ID", "Updated", "Msgs");
                println!("{}", "-".repeat(62));
                for s in sessions {
                    println!(
                        "{:<24} {:<20} {:<8} {}",
                        s.id,
                        s.updated_at_display(),
                        s.message_count,
                        if s.has_summary { "yes" } else { "no" }
                    );
                }
                println!("\nResume with: parley chat --session <id>");
            }
        }
        Err(e) => {
            eprintln!("Error listing sessions: {}", e);
        }
    }
    Ok(())
}
