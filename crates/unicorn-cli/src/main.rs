//! unicorn - swipe through startup pitches in the terminal
//!
//! 対話モードでは 1 行 1 判定（`i` = invest, `r` = reject）。
//! `--script IRRI...` を渡すと非対話で実行する。
//! 結果表示のあと、共有先を入力するか `--share <PLATFORM>` で共有を記録する。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};
use unicorn_core::app::{ArchetypeClassifier, CollectorBuilder, CurrentItem, SwipeCollector};
use unicorn_core::config::{DeckSource, SwipeConfig};
use unicorn_core::domain::{ClassificationResult, Decision, Direction, Progress, SwipeError};
use unicorn_core::impls::{
    ChatGenerator, RestClient, RestDeckProvider, RestEventSink, RestSessionStore, Shuffler,
    StaticDeckProvider, TopUpDeckProvider,
};
use unicorn_core::ports::DeckProvider;

type Input = Lines<BufReader<Stdin>>;

#[derive(Debug, Parser)]
#[command(name = "unicorn", version, about = "Find out what kind of founder you are")]
struct Args {
    /// TOML config file
    #[arg(short, long, env = "UNICORN_CONFIG")]
    config: Option<PathBuf>,

    /// Shuffle seed
    #[arg(long)]
    seed: Option<u64>,

    /// Decisions to apply without prompting, e.g. `IRRIIRIRII`
    #[arg(long)]
    script: Option<String>,

    /// Ignore the configured store and generator
    #[arg(long)]
    offline: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Record the result as shared to this platform (e.g. `twitter`)
    #[arg(long, value_name = "PLATFORM")]
    share: Option<String>,
}

enum Command {
    Swipe(Direction),
    Reset,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    match line.trim().to_ascii_lowercase().as_str() {
        "i" | "invest" | "right" | "y" => Some(Command::Swipe(Direction::Invest)),
        "r" | "reject" | "left" | "n" => Some(Command::Swipe(Direction::Reject)),
        "reset" => Some(Command::Reset),
        "q" | "quit" | "exit" => Some(Command::Quit),
        _ => None,
    }
}

fn parse_script(script: &str) -> Result<Vec<Direction>> {
    script
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c.to_ascii_uppercase() {
            'I' => Ok(Direction::Invest),
            'R' => Ok(Direction::Reject),
            other => bail!("unexpected '{other}' in script (use I or R)"),
        })
        .collect()
}

fn load_config(args: &Args) -> Result<SwipeConfig> {
    let mut config = SwipeConfig::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(seed) = args.seed {
        config.shuffle_seed = Some(seed);
    }
    if args.offline {
        config.deck_source = DeckSource::Sample;
        config.store = None;
        config.generator = None;
    }
    Ok(config)
}

fn build_collector(config: &SwipeConfig) -> Result<SwipeCollector> {
    let rest = config.store.as_ref().map(RestClient::new);
    let generator = config.generator.as_ref().map(|g| Arc::new(ChatGenerator::from_config(g)));
    let mut builder = CollectorBuilder::new().config(config);

    let deck: Arc<dyn DeckProvider> = match (config.deck_source, &rest) {
        (DeckSource::Remote, Some(client)) => Arc::new(RestDeckProvider::new(
            client.clone(),
            Shuffler::from_seed(config.shuffle_seed),
        )),
        (source, _) => {
            if source == DeckSource::Remote {
                warn!("remote deck requested but no store configured; using the sample deck");
            }
            let sample = StaticDeckProvider::sample();
            let sample = match config.shuffle_seed {
                Some(seed) => sample.with_seed(seed),
                None => sample,
            };
            Arc::new(sample)
        }
    };
    // 生成器があれば足りないデッキを生成ピッチで埋める
    builder = match &generator {
        Some(pitches) => builder.deck_provider(Arc::new(TopUpDeckProvider::new(
            deck,
            pitches.clone(),
            config.generation_timeout(),
        ))),
        None => builder.deck_provider(deck),
    };

    if let Some(client) = rest {
        info!("mirroring sessions to the configured store");
        builder = builder
            .session_store(Arc::new(RestSessionStore::new(client.clone())))
            .event_sink(Arc::new(RestEventSink::new(client)));
    }
    if let (Some(generator), Some(settings)) = (generator, &config.generator) {
        info!(model = %settings.model, "generative archetypes enabled");
        builder = builder.generator(generator);
    }

    Ok(builder.build()?)
}

/// Load a deck, asking to retry while none is available.
async fn start(collector: &SwipeCollector, mut input: Option<&mut Input>) -> Result<Progress> {
    loop {
        match collector.start().await {
            Ok(progress) => return Ok(progress),
            Err(err @ SwipeError::DeckUnavailable { .. }) => {
                println!("{err}");
                let Some(lines) = input.as_deref_mut() else {
                    return Err(err.into());
                };
                println!("Retry? [Y/n]");
                match lines.next_line().await? {
                    Some(answer) if answer.trim().eq_ignore_ascii_case("n") => return Err(err.into()),
                    Some(_) => continue,
                    None => return Err(err.into()),
                }
            }
            Err(err) => return Err(err.into()),
        }
    }
}

fn show_card(collector: &SwipeCollector) {
    let (CurrentItem::Item(item), Some(progress)) = (collector.current_item(), collector.progress())
    else {
        return;
    };
    println!();
    println!(
        "[{}/{}] {}",
        progress.completed + 1,
        progress.total(),
        item.text
    );
    println!("  (i)nvest / (r)eject / reset / q");
}

async fn run_interactive(collector: &SwipeCollector, lines: &mut Input) -> Result<bool> {
    show_card(collector);
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Some(Command::Swipe(direction)) => match collector.submit(direction).await {
                Ok(progress) if progress.is_complete() => return Ok(true),
                Ok(_) => {}
                Err(err) if err.is_user_visible() => println!("{err}"),
                Err(err) => warn!(error = %err, "swipe ignored"),
            },
            Some(Command::Reset) => {
                start_over(collector, lines).await?;
            }
            Some(Command::Quit) => return Ok(false),
            None => println!("unknown command '{}'", line.trim()),
        }
        show_card(collector);
    }
    Ok(false)
}

async fn start_over(collector: &SwipeCollector, lines: &mut Input) -> Result<Progress> {
    match collector.reset().await {
        Ok(progress) => Ok(progress),
        Err(SwipeError::DeckUnavailable { .. }) => start(collector, Some(lines)).await,
        Err(err) => Err(err.into()),
    }
}

async fn run_script(collector: &SwipeCollector, directions: Vec<Direction>) -> Result<bool> {
    for direction in directions {
        match collector.submit(direction).await {
            Ok(progress) if progress.is_complete() => return Ok(true),
            Ok(_) => {}
            Err(SwipeError::SessionAlreadyComplete) => return Ok(true),
            Err(err) => return Err(err.into()),
        }
    }
    Ok(false)
}

#[derive(Serialize)]
struct Report<'a> {
    result: &'a ClassificationResult,
    decisions: &'a [Decision],
}

/// Platform typed at the share prompt; blank skips sharing.
fn parse_share(line: &str) -> Option<String> {
    let platform = line.trim().to_ascii_lowercase();
    (!platform.is_empty()).then_some(platform)
}

async fn ask_share(lines: &mut Input) -> Result<Option<String>> {
    println!();
    println!("Share your startup pack? Type a platform (e.g. twitter) or press Enter to skip.");
    Ok(lines.next_line().await?.as_deref().and_then(parse_share))
}

fn share_text(result: &ClassificationResult) -> String {
    format!(
        "Check out my startup: {} - {}",
        result.pack.company_name, result.pack.tagline
    )
}

fn render(result: &ClassificationResult) {
    let archetype = &result.archetype;
    let pack = &result.pack;
    let summary = &result.summary;

    println!();
    println!("{} {}", archetype.emoji, archetype.title);
    println!("{}", archetype.description);
    println!("Traits: {}", archetype.traits.join(", "));
    println!();
    println!(
        "Invested in {} of {} pitches ({:.0}%)",
        summary.invested_count, summary.total_swipes, summary.investment_rate
    );
    println!();
    println!("Your startup: {}", pack.company_name);
    println!("  For:         {}", pack.persona);
    println!("  Tagline:     {}", pack.tagline);
    println!("  Growth hack: {}", pack.growth_hack);
    println!("  {}", pack.slogan);
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;
    info!(
        deck_size = config.deck_size,
        deck_source = ?config.deck_source,
        "starting unicorn v{}",
        env!("CARGO_PKG_VERSION")
    );

    let script = args.script.as_deref().map(parse_script).transpose()?;
    let collector = build_collector(&config)?;

    let mut input = match script {
        Some(_) => None,
        None => Some(BufReader::new(tokio::io::stdin()).lines()),
    };
    start(&collector, input.as_mut()).await?;

    let finished = match (script, input.as_mut()) {
        (Some(directions), _) => run_script(&collector, directions).await?,
        (None, Some(lines)) => run_interactive(&collector, lines).await?,
        (None, None) => false,
    };

    if finished {
        // 表示側はハンドオフから結果を受け取る
        let Some(handoff) = collector.handoff().take() else {
            bail!("no results to show; start a new run");
        };
        let result = match collector.result() {
            Some(result) => result,
            None => handoff.classify_with(&ArchetypeClassifier::fixed()).await?,
        };

        if args.json {
            let report = Report {
                result: &result,
                decisions: &handoff.decisions,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            render(&result);
        }

        // リモートセッションの id が届いてから表示・共有を記録する
        collector.mirror().drain().await;
        collector.result_viewed();

        let platform = match (args.share, input.as_mut()) {
            (Some(platform), _) => parse_share(&platform),
            (None, Some(lines)) => ask_share(lines).await?,
            (None, None) => None,
        };
        if let Some(platform) = platform {
            if !args.json {
                println!("{}", share_text(&result));
            }
            info!(%platform, "result shared");
            collector.result_shared(platform);
        }
    } else {
        println!("Session not finished.");
    }

    collector.mirror().drain().await;
    Ok(())
}
