use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use newscheck_rs::config::{Config, EmbeddingConfig};
use newscheck_rs::history::{HistorySink, JsonlHistory};
use newscheck_rs::types::ResultCategory;
use newscheck_rs::{HybridVerifier, VerificationRequest, VerifyError};

#[derive(Parser)]
#[command(name="newscheck", version, about="Classify a news passage as credible, fake or unverified")]
struct Cli {
  #[command(subcommand)]
  cmd: Cmd,
  /// JSON config file; defaults apply when omitted
  #[arg(long, env="NEWSCHECK_CONFIG")] config: Option<PathBuf>,
  /// Classifier bundle (overrides config)
  #[arg(long, env="NEWSCHECK_MODEL")] model: Option<PathBuf>,
  /// History log (overrides config)
  #[arg(long, env="NEWSCHECK_HISTORY")] history: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Cmd {
  /// Verify one passage, or every line of a JSONL file of {"text", "source_url"}
  Verify {
    #[arg(long, conflicts_with="input_file", required_unless_present="input_file")] text: Option<String>,
    #[arg(long)] source_url: Option<String>,
    #[arg(long)] input_file: Option<PathBuf>,
    #[arg(long)] output: Option<PathBuf>,
    /// OpenAI-compatible embeddings endpoint; enables embedding similarity
    #[arg(long, env="NEWSCHECK_EMBEDDINGS_URL")] embeddings_url: Option<String>,
    #[arg(long, env="NEWSCHECK_EMBEDDINGS_KEY", hide_env_values=true)] embeddings_key: Option<String>,
    #[arg(long)] no_history: bool,
  },
  History {
    #[command(subcommand)]
    cmd: HistoryCmd,
  },
}

#[derive(Subcommand)]
enum HistoryCmd {
  List { #[arg(long, default_value_t=1)] page: usize, #[arg(long, default_value_t=10)] limit: usize, #[arg(long)] result: Option<String> },
  Clear,
  Export { #[arg(long, default_value="data/history_export.csv")] out: PathBuf },
}

fn init_tracing() {
  tracing_subscriber::registry()
    .with(tracing_subscriber::EnvFilter::new(
      std::env::var("RUST_LOG").unwrap_or_else(|_| "newscheck_rs=info,newscheck=info".into()),
    ))
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
  let mut cfg = Config::load(cli.config.as_deref())?;
  if let Some(m) = &cli.model { cfg.model_path = m.clone(); }
  if let Some(h) = &cli.history { cfg.history_path = h.clone(); }
  Ok(cfg)
}

async fn verify_one(verifier: &HybridVerifier, history: Option<&JsonlHistory>, req: VerificationRequest) -> Result<serde_json::Value> {
  let source_url = req.source_url.clone();
  let resp = verifier.analyze(req.clone()).await?;
  if let Some(h) = history {
    h.record(req.text.trim(), source_url.as_deref(), resp.result, resp.verification_method).await?;
  }
  Ok(serde_json::to_value(&resp)?)
}

async fn run_batch(verifier: &HybridVerifier, history: Option<&JsonlHistory>, input: &Path, output: Option<&Path>) -> Result<()> {
  let raw = tokio::fs::read_to_string(input).await.with_context(|| format!("reading {}", input.display()))?;
  let mut out = String::new();
  for (n, line) in raw.lines().enumerate().filter(|(_, l)| !l.trim().is_empty()) {
    let req: VerificationRequest = match serde_json::from_str(line) {
      Ok(r) => r,
      Err(e) => { warn!(line = n + 1, error = %e, "skipping malformed request"); continue; }
    };
    match verify_one(verifier, history, req).await {
      Ok(v) => { out.push_str(&serde_json::to_string(&v)?); out.push('\n'); }
      Err(e) if matches!(e.downcast_ref::<VerifyError>(), Some(VerifyError::EmptyText)) => {
        warn!(line = n + 1, "skipping request without text");
      }
      Err(e) => return Err(e),
    }
  }
  match output {
    Some(p) => tokio::fs::write(p, out).await.with_context(|| format!("writing {}", p.display()))?,
    None => tokio::io::stdout().write_all(out.as_bytes()).await?,
  }
  Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
  init_tracing();
  let cli = Cli::parse();
  let mut cfg = load_config(&cli)?;
  let history = JsonlHistory::new(cfg.history_path.clone());

  match cli.cmd {
    Cmd::Verify { text, source_url, input_file, output, embeddings_url, embeddings_key, no_history } => {
      if embeddings_url.is_some() {
        let e = cfg.embedding.get_or_insert_with(EmbeddingConfig::default);
        e.base_url = embeddings_url;
        e.api_key = embeddings_key.or(e.api_key.take());
      }
      let verifier = HybridVerifier::from_config(&cfg).context("startup failed")?;
      info!(model = %cfg.model_path.display(), "ready");
      let sink = (!no_history).then_some(&history);
      match (text, input_file) {
        (_, Some(path)) => run_batch(&verifier, sink, &path, output.as_deref()).await?,
        (Some(text), None) => {
          let v = verify_one(&verifier, sink, VerificationRequest { text, source_url }).await?;
          println!("{}", serde_json::to_string_pretty(&v)?);
        }
        (None, None) => anyhow::bail!("provide --text or --input-file"),
      }
    }
    Cmd::History { cmd: HistoryCmd::List { page, limit, result } } => {
      let page = page.max(1);
      let limit = limit.clamp(1, 100);
      let filter = result.as_deref().and_then(ResultCategory::parse);
      let items = history.fetch(limit, (page - 1) * limit, filter).await?;
      let body = serde_json::json!({ "items": items, "page": page, "limit": limit, "result_filter": filter });
      println!("{}", serde_json::to_string_pretty(&body)?);
    }
    Cmd::History { cmd: HistoryCmd::Clear } => {
      history.clear().await?;
      println!("{}", serde_json::json!({ "message": "History cleared." }));
    }
    Cmd::History { cmd: HistoryCmd::Export { out } } => {
      let path = history.export_csv(&out).await?;
      println!("{}", path.display());
    }
  }
  Ok(())
}
