use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::{
    collections::BTreeMap,
    fs,
    io::{self, Read, Write},
    path::{Path, PathBuf},
};
use time::{macros::format_description, OffsetDateTime};
use tracing_subscriber::EnvFilter;
use umbrella_scan::{
    config,
    history::{LocalStore, RelayConfig},
    provider::ProviderId,
    relay::{Relay, DEFAULT_RELAY_TIMEOUT},
    ScanResult, WebsiteContent,
};

/// umbrellactl — scan pages through a running umbrella-server and manage local state.
///
/// Scans go through the same relay the extension uses: if the server is unreachable a
/// local fallback result (confidence 0.0) is recorded instead.
#[derive(Debug, Parser)]
#[command(name = "umbrellactl")]
#[command(version)]
struct Cli {
    /// Backend base URL (defaults to the one saved in the local store)
    #[arg(long)]
    backend: Option<String>,

    /// Local store file (config + scan history)
    #[arg(long, env = "UMBRELLA_STORE")]
    store: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// GET /health
    Health,

    /// Analyze a page. Body text comes from --text-file or stdin.
    Scan {
        /// Page URL
        url: String,

        #[arg(long, default_value = "")]
        title: String,

        /// Read page text from this file instead of stdin
        #[arg(long)]
        text_file: Option<PathBuf>,

        /// Outbound link (repeatable)
        #[arg(long = "link")]
        links: Vec<String>,

        /// Metadata entry as key=value (repeatable)
        #[arg(long = "meta", value_parser = parse_key_value)]
        metadata: Vec<(String, String)>,

        /// Provider for this scan only (gemini|deepseek)
        #[arg(long)]
        provider: Option<String>,

        /// Do not add the result to the local history
        #[arg(long, default_value_t = false)]
        no_record: bool,
    },

    /// Inspect or clear the local scan history.
    History {
        #[command(subcommand)]
        cmd: HistoryCmd,
    },

    /// Show or change the saved relay settings.
    Relay {
        #[command(subcommand)]
        cmd: RelayCmd,
    },

    /// Print/validate/edit a server config file.
    Config {
        #[command(subcommand)]
        cmd: ConfigCmd,
    },
}

#[derive(Debug, Subcommand)]
enum HistoryCmd {
    /// Most recent first
    List {
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Print raw JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    Clear,
}

#[derive(Debug, Subcommand)]
enum RelayCmd {
    Show,
    /// Select the provider sent with each scan
    Provider { id: String },
    /// Set the backend base URL
    Backend { url: String },
}

#[derive(Debug, Subcommand)]
enum ConfigCmd {
    /// Print a config example to stdout
    Example,

    /// Validate a config file
    Validate {
        #[arg(long)]
        path: PathBuf,
    },

    /// Show a config file (raw TOML)
    Show {
        #[arg(long)]
        path: PathBuf,
    },

    /// Set a value by dotted key, e.g. `analysis.default_provider deepseek`.
    ///
    /// true/false, integers and floats are written typed; anything else as a string.
    Set {
        #[arg(long)]
        path: PathBuf,
        key: String,
        value: String,
    },

    /// Remove a value by dotted key
    Unset {
        #[arg(long)]
        path: PathBuf,
        key: String,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got {s:?}"))
}

fn main() -> Result<()> {
    // stdout carries command output; diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let store = LocalStore::open(cli.store.clone().unwrap_or_else(LocalStore::default_path));

    match cli.cmd {
        Cmd::Health => {
            let base = cli.backend.unwrap_or_else(|| store.config().backend_url);
            let u = format!("{}/health", base.trim_end_matches('/'));
            let txt = reqwest::blocking::get(&u)
                .with_context(|| format!("GET {u}"))?
                .text()
                .context("read response")?;
            println!("{txt}");
        }

        Cmd::Scan {
            url,
            title,
            text_file,
            links,
            metadata,
            provider,
            no_record,
        } => {
            let text = match text_file {
                Some(p) => fs::read_to_string(&p).with_context(|| format!("read {p:?}"))?,
                None => {
                    let mut s = String::new();
                    io::stdin().read_to_string(&mut s).context("read stdin")?;
                    s
                }
            };
            let content = WebsiteContent {
                url,
                title,
                text,
                links,
                metadata: metadata.into_iter().collect::<BTreeMap<_, _>>(),
            };

            let mut relay_cfg = store.config();
            if let Some(b) = cli.backend {
                relay_cfg.backend_url = b;
            }
            if let Some(p) = provider {
                relay_cfg.provider = p;
            }

            let scan = scan(&relay_cfg, &content)?;
            println!("{}", serde_json::to_string_pretty(&scan)?);
            let badge = scan.analysis.risk.badge();
            eprintln!(
                "[{}] {} confidence={:.2}",
                badge.text, scan.url, scan.analysis.confidence_score
            );
            if !no_record {
                store.record(scan)?;
            }
        }

        Cmd::History { cmd } => match cmd {
            HistoryCmd::List { limit, json } => {
                let history: Vec<ScanResult> = store.history().into_iter().take(limit).collect();
                if json {
                    println!("{}", serde_json::to_string_pretty(&history)?);
                } else {
                    for s in &history {
                        println!(
                            "{}  {:<4}  {:.2}  {}",
                            format_millis(s.timestamp),
                            s.analysis.risk.badge().text,
                            s.analysis.confidence_score,
                            s.url
                        );
                    }
                }
            }
            HistoryCmd::Clear => {
                store.clear_history()?;
                eprintln!("OK: cleared history in {:?}", store.path());
            }
        },

        Cmd::Relay { cmd } => handle_relay(&store, cmd)?,

        Cmd::Config { cmd } => handle_config(cmd)?,
    }

    Ok(())
}

fn scan(cfg: &RelayConfig, content: &WebsiteContent) -> Result<ScanResult> {
    let relay = Relay::from_config(cfg, DEFAULT_RELAY_TIMEOUT)?;
    let rt = tokio::runtime::Runtime::new().context("start tokio runtime")?;
    Ok(rt.block_on(relay.analyze(content)))
}

fn format_millis(ms: u64) -> String {
    let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000)
        .ok()
        .and_then(|t| t.format(&fmt).ok())
        .unwrap_or_else(|| ms.to_string())
}

fn handle_relay(store: &LocalStore, cmd: RelayCmd) -> Result<()> {
    let mut cfg = store.config();
    match cmd {
        RelayCmd::Show => {
            println!("{}", serde_json::to_string_pretty(&cfg)?);
            return Ok(());
        }
        RelayCmd::Provider { id } => {
            if ProviderId::parse(&id).is_none() {
                eprintln!("warning: unknown provider {id:?}; the server will use its default");
            }
            cfg.provider = id;
        }
        RelayCmd::Backend { url } => {
            cfg.backend_url = url.trim_end_matches('/').to_string();
        }
    }
    store.save_config(cfg)?;
    eprintln!("OK: saved relay settings to {:?}", store.path());
    Ok(())
}

fn handle_config(cmd: ConfigCmd) -> Result<()> {
    match cmd {
        ConfigCmd::Example => {
            print!("{}", include_str!("../../config.example.toml"));
            Ok(())
        }
        ConfigCmd::Validate { path } => {
            config::Config::load(&path)?;
            eprintln!("OK: {path:?}");
            Ok(())
        }
        ConfigCmd::Show { path } => {
            let txt = fs::read_to_string(&path).with_context(|| format!("read {path:?}"))?;
            print!("{txt}");
            Ok(())
        }
        ConfigCmd::Set { path, key, value } => {
            edit_config(&path, &key, |table, leaf| {
                table.insert(leaf, typed_value(&value));
            })?;
            eprintln!("OK: set {key} in {path:?}");
            Ok(())
        }
        ConfigCmd::Unset { path, key } => {
            edit_config(&path, &key, |table, leaf| {
                table.remove(leaf);
            })?;
            eprintln!("OK: unset {key} in {path:?}");
            Ok(())
        }
    }
}

fn typed_value(s: &str) -> toml_edit::Item {
    let t = s.trim();
    if t.eq_ignore_ascii_case("true") || t.eq_ignore_ascii_case("false") {
        return toml_edit::value(t.eq_ignore_ascii_case("true"));
    }
    if let Ok(i) = t.parse::<i64>() {
        return toml_edit::value(i);
    }
    if let Ok(f) = t.parse::<f64>() {
        return toml_edit::value(f);
    }
    toml_edit::value(t)
}

/// Apply `op` to the table holding the last segment of `dotted_key`, then validate the
/// whole document against [`config::Config`] before replacing the file.
fn edit_config(
    path: &Path,
    dotted_key: &str,
    op: impl FnOnce(&mut toml_edit::Table, &str),
) -> Result<()> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {path:?}"))?;
    let mut doc = raw
        .parse::<toml_edit::DocumentMut>()
        .context("parse toml")?;

    let parts: Vec<&str> = dotted_key.split('.').filter(|p| !p.is_empty()).collect();
    let Some((leaf, parents)) = parts.split_last() else {
        anyhow::bail!("invalid key: {dotted_key:?}");
    };

    let mut table = doc.as_table_mut();
    for p in parents {
        let entry = table
            .entry(p)
            .or_insert(toml_edit::Item::Table(toml_edit::Table::new()));
        table = entry
            .as_table_mut()
            .with_context(|| format!("{p} is not a table"))?;
    }
    op(table, *leaf);

    let new_txt = doc.to_string();
    let _: config::Config = toml::from_str(&new_txt).context("validate config")?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tf = tempfile::NamedTempFile::new_in(dir).context("create temp file")?;
    tf.write_all(new_txt.as_bytes()).context("write temp")?;
    tf.persist(path)
        .map_err(|e| anyhow::anyhow!(e))
        .context("persist")?;
    Ok(())
}
