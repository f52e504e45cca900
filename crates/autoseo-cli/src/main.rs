//! AutoSEO CLI - autonomous content optimization
//!
//! Usage:
//!   autoseo init                  Write .autoseo/config.toml with defaults
//!   autoseo run                   Scan, score, generate and publish until Ctrl-C
//!   autoseo run --priority-only   Work through pinned URLs, then exit
//!   autoseo analyze <url>         Print the health analysis of one page
//!   autoseo history               List stored generated content

use anyhow::{bail, Context, Result};
use autoseo_agent::{
    AnthropicGenerator, EnvConfigSource, HtmlPageAnalyzer, SitemapSource, WordPressPublisher,
};
use autoseo_core::{EngineConfig, Priority, PriorityUrl};
use autoseo_engine::{
    ActivityJournal, Collaborators, ContentStore, Engine, EngineEvent, JsonlContentStore,
    PageAnalyzer, StartOptions,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "autoseo")]
#[command(author, version, about = "Autonomous SEO content optimization")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Project root holding .autoseo/
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,

    /// Run the optimization engine
    Run {
        /// Only process the priority URLs, never scan the site
        #[arg(long)]
        priority_only: bool,

        /// Pin a URL, optionally with a priority (URL or URL=critical)
        #[arg(long = "priority-url", value_name = "URL[=PRIORITY]", value_parser = parse_priority_url)]
        priority_urls: Vec<PriorityUrl>,

        /// Publish content that passes the quality threshold
        #[arg(long)]
        auto_publish: bool,
    },

    /// Analyze a single page
    Analyze {
        /// Page URL
        url: String,
    },

    /// Show stored generated content
    History {
        /// Number of most recent entries to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
}

fn parse_priority_url(raw: &str) -> std::result::Result<PriorityUrl, String> {
    let (url, priority) = raw
        .rsplit_once('=')
        .and_then(|(url, level)| level.parse::<Priority>().ok().map(|p| (url, p)))
        .unwrap_or((raw, Priority::default()));
    if url.is_empty() {
        return Err("URL must not be empty".to_string());
    }
    Ok(PriorityUrl {
        url: url.to_string(),
        priority,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Init => cmd_init(&cli.root),
        Commands::Run {
            priority_only,
            priority_urls,
            auto_publish,
        } => cmd_run(&cli.root, priority_only, priority_urls, auto_publish).await,
        Commands::Analyze { url } => cmd_analyze(url).await,
        Commands::History { limit } => cmd_history(&cli.root, limit).await,
    }
}

fn cmd_init(root: &Path) -> Result<()> {
    let config_path = root.join(".autoseo/config.toml");
    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
        return Ok(());
    }

    EngineConfig::write_default(root).context("Failed to write default config")?;

    println!("Initialized AutoSEO in {}", root.display());
    println!("Created:");
    println!("  .autoseo/config.toml");
    println!("\nNext steps:");
    println!("  1. Set [site] url in .autoseo/config.toml");
    println!("  2. Export ANTHROPIC_API_KEY (and WORDPRESS_* to publish)");
    println!("  3. Run 'autoseo run'");
    Ok(())
}

async fn cmd_run(
    root: &Path,
    priority_only: bool,
    priority_urls: Vec<PriorityUrl>,
    auto_publish: bool,
) -> Result<()> {
    let mut config = EngineConfig::load_or_default(root).context("Failed to load config")?;
    if auto_publish {
        config.publishing.auto_publish = true;
    }

    let sitemap = config.site.sitemap_location();
    if !priority_only && sitemap.is_none() {
        bail!("No site configured. Set [site] url or sitemap_url in .autoseo/config.toml");
    }

    let options = if priority_only {
        let urls = if priority_urls.is_empty() {
            config.site.priority_urls.clone()
        } else {
            priority_urls
        };
        StartOptions::priority_only(urls)
    } else {
        StartOptions {
            priority_only: false,
            priority_urls,
        }
    };

    let collaborators = Collaborators {
        source: Arc::new(SitemapSource::new(sitemap.unwrap_or_default())),
        analyzer: Arc::new(HtmlPageAnalyzer::new()),
        generator: Arc::new(AnthropicGenerator::new()),
        publisher: Arc::new(WordPressPublisher::new()),
        store: Arc::new(JsonlContentStore::in_state_dir(root)),
        settings: Arc::new(EnvConfigSource::new().with_fallback_cms_url(config.site.url.clone())),
    };

    let journal = config.recorder.journal;
    let engine = Engine::new(config, collaborators);
    let engine = if journal {
        engine.with_journal(ActivityJournal::new(root.join(".autoseo")))
    } else {
        engine
    };

    let mut events = engine.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_event(&event),
                Err(RecvError::Lagged(missed)) => {
                    println!("  ... {} events skipped", missed);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    engine
        .start(options)
        .await
        .context("Failed to start engine")?;

    if priority_only {
        tokio::select! {
            _ = engine.wait_idle() => info!("Priority list complete"),
            _ = tokio::signal::ctrl_c() => info!("Interrupted, stopping"),
        }
    } else {
        tokio::signal::ctrl_c()
            .await
            .context("Failed to listen for Ctrl-C")?;
        info!("Interrupted, stopping");
    }

    engine.shutdown().await;
    printer.abort();

    let stats = engine.state().stats;
    println!("\nSession Summary");
    println!("===============");
    println!("Processed: {}", stats.total_processed);
    println!("Succeeded: {}", stats.success_count);
    println!("Errors: {}", stats.error_count);
    println!("Average quality: {:.1}", stats.avg_quality_score);
    println!("Words generated: {}", stats.total_words_generated);
    Ok(())
}

// Activity entries already reach stdout through the tracing subscriber
fn print_event(event: &EngineEvent) {
    match event {
        EngineEvent::History { entry } => {
            let quality = entry
                .quality_score
                .map(|q| format!(" (quality {})", q))
                .unwrap_or_default();
            println!("  {} {}{}", entry.action, entry.url, quality);
            if let Some(link) = &entry.wordpress_url {
                println!("    -> {}", link);
            }
        }
        EngineEvent::GenerationProgress { url, message } => {
            tracing::debug!(url = %url, "{}", message);
        }
        EngineEvent::StatusChanged { status } => println!("Engine {}", status),
        _ => {}
    }
}

async fn cmd_analyze(url: String) -> Result<()> {
    let analysis = HtmlPageAnalyzer::new()
        .analyze(&url)
        .await
        .with_context(|| format!("Failed to analyze {}", url))?;

    println!("{}", analysis.url);
    println!(
        "Health: {}/100 ({} priority)",
        analysis.health_score,
        Priority::from_health_score(analysis.health_score)
    );
    if analysis.issues.is_empty() {
        println!("No issues found");
        return Ok(());
    }

    println!("\nIssues:");
    for issue in &analysis.issues {
        println!("  - {}", issue);
    }
    println!("\nRecommendations:");
    for rec in &analysis.recommendations {
        println!("  - {}", rec);
    }
    Ok(())
}

async fn cmd_history(root: &Path, limit: usize) -> Result<()> {
    let store = JsonlContentStore::in_state_dir(root);
    let artifacts = store
        .load_all()
        .await
        .with_context(|| format!("Failed to read {}", store.path().display()))?;

    if artifacts.is_empty() {
        println!("No generated content yet");
        return Ok(());
    }

    println!("Generated content ({} total)", artifacts.len());
    for artifact in artifacts.iter().rev().take(limit) {
        println!(
            "\n{} [{:?}] quality {} · {} words",
            artifact.created_at.format("%Y-%m-%d %H:%M"),
            artifact.status,
            artifact.content.quality_score,
            artifact.content.word_count
        );
        println!("  {}", artifact.url);
        println!("  {}", artifact.content.title);
        if let Some(remote) = &artifact.remote_url {
            println!("  -> {}", remote);
        }
        if let Some(note) = &artifact.note {
            println!("  note: {}", note);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_priority_url() {
        let pinned = parse_priority_url("https://example.com/pricing=critical").unwrap();
        assert_eq!(pinned.url, "https://example.com/pricing");
        assert_eq!(pinned.priority, Priority::Critical);

        // Query strings keep their '=' when no priority follows
        let pinned = parse_priority_url("https://example.com/?p=12").unwrap();
        assert_eq!(pinned.url, "https://example.com/?p=12");
        assert_eq!(pinned.priority, Priority::Medium);

        assert!(parse_priority_url("=low").is_err());
    }

    #[test]
    fn test_cli_parses_run_flags() {
        let cli = Cli::try_parse_from([
            "autoseo",
            "run",
            "--priority-only",
            "--priority-url",
            "https://example.com/a=low",
            "--priority-url",
            "https://example.com/b",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                priority_only,
                priority_urls,
                auto_publish,
            } => {
                assert!(priority_only);
                assert!(!auto_publish);
                assert_eq!(priority_urls.len(), 2);
                assert_eq!(priority_urls[0].priority, Priority::Low);
            }
            _ => panic!("expected run"),
        }
    }
}
