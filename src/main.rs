use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use futures::future::join_all;

use stridelog::api::EXPECTED_COLLECTIONS;
use stridelog::config::{self, Config};
use stridelog::health::{HealthProbe, HealthResult};

#[derive(Parser, Debug)]
#[command(name = "stridelog")]
#[command(about = "Diagnostics for the stridelog data service")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/stridelog/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Validate that connection configuration is present
  Check,
  /// Decode the role claim embedded in the configured credential
  Token,
  /// List the expected collections and probe their routes
  Collections,
  /// Run the full connection diagnosis
  Status,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .init();

  let args = Args::parse();
  let config = Config::load(args.config.as_deref())?;

  match args.command {
    Command::Check => check(&config),
    Command::Token => token(),
    Command::Collections => collections(&config).await,
    Command::Status => status(&config).await,
  }
}

fn check(config: &Config) -> Result<()> {
  let base_url = config.base_url()?;
  println!("base url:   {}", base_url);

  let api_key = Config::api_key()?;
  println!("credential: present ({} chars)", api_key.len());

  println!("configuration ok");
  Ok(())
}

fn token() -> Result<()> {
  let api_key = Config::api_key()?;
  let role = config::token_role(&api_key)?;
  println!("credential role: {}", role);
  Ok(())
}

async fn collections(config: &Config) -> Result<()> {
  let probe = HealthProbe::new(config)?;

  let checks = join_all(EXPECTED_COLLECTIONS.iter().map(|collection| {
    let probe = &probe;
    async move {
      probe
        .check_endpoint(&format!("data/{}?limit=1", collection))
        .await
    }
  }))
  .await;

  for check in checks {
    let status = match (check.available, check.status_code) {
      (true, Some(code)) => format!("ok ({})", code),
      (false, Some(code)) => format!("error ({})", code),
      (_, None) => "unreachable".to_string(),
    };
    println!("{:<36} {}", check.path, status);
  }

  Ok(())
}

async fn status(config: &Config) -> Result<()> {
  let probe = HealthProbe::new(config)?;
  let diagnosis = probe.diagnose_connection().await;

  println!(
    "network:  {}",
    if diagnosis.network_online {
      "host resolves"
    } else {
      "host does not resolve"
    }
  );
  print_result("primary", &diagnosis.primary);
  if let Some(fallback) = &diagnosis.fallback {
    print_result("fallback", fallback);
  }

  if diagnosis.causes.is_empty() {
    println!("service looks healthy");
  } else {
    println!("candidate causes:");
    for (i, cause) in diagnosis.causes.iter().enumerate() {
      println!("  {}. {}", i + 1, cause);
    }
  }

  Ok(())
}

fn print_result(label: &str, result: &HealthResult) {
  let detail = match (result.status_code, result.cause) {
    (Some(code), _) => format!("http {}", code),
    (None, Some(cause)) => format!("{:?}", cause).to_lowercase(),
    (None, None) => "no answer".to_string(),
  };
  let latency = result
    .latency_ms
    .map(|ms| format!(", {} ms", ms))
    .unwrap_or_default();
  let limited = if result.limited { ", limited" } else { "" };

  println!(
    "{}:  {:?} ({}{}{})",
    label, result.status, detail, latency, limited
  );
}
