//! Geolane — one-shot geocoding queries from the command line.

use std::path::{Path, PathBuf};

use anyhow::Context;
use geolane_client::{Endpoint, Error, Geocoder, GeocoderConfig, Query, QueryValue};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn resolve_config() -> anyhow::Result<GeocoderConfig> {
    let path = std::env::var("GEOLANE_CONFIG").ok().map(PathBuf::from);
    let mut config = load_config(path.as_deref())?;
    config.apply_env();
    Ok(config)
}

/// An explicitly named config file must be readable; invalid contents fall
/// back to defaults.
fn load_config(path: Option<&Path>) -> anyhow::Result<GeocoderConfig> {
    let Some(path) = path else {
        return Ok(GeocoderConfig::default());
    };
    info!("Config file: {}", path.display());
    match GeocoderConfig::try_load(path) {
        Ok(config) => Ok(config),
        Err(e @ Error::Io(_)) => {
            Err(e).with_context(|| format!("cannot read config {}", path.display()))
        }
        Err(e) => {
            warn!("Ignoring invalid config {}: {}", path.display(), e);
            Ok(GeocoderConfig::default())
        }
    }
}

/// Parse `name=value`. The value is typed as bool, integer, or float only
/// when that type prints back to exactly the same text; anything else is
/// sent verbatim as a string.
fn parse_param(arg: &str) -> Option<(String, QueryValue)> {
    let (name, raw) = arg.split_once('=')?;
    if name.is_empty() {
        return None;
    }
    let value = if let Some(b) = raw.parse::<bool>().ok().filter(|b| b.to_string() == raw) {
        QueryValue::Bool(b)
    } else if let Some(n) = raw.parse::<i64>().ok().filter(|n| n.to_string() == raw) {
        QueryValue::Int(n)
    } else if let Some(x) = raw
        .parse::<f64>()
        .ok()
        .filter(|x| x.is_finite() && x.to_string() == raw)
    {
        QueryValue::Float(x)
    } else {
        QueryValue::Str(raw.to_string())
    };
    Some((name.to_string(), value))
}

fn print_help() {
    println!("Geolane — cached, rate-limited geocoding client");
    println!();
    println!("Usage: geolane <operation> [name=value ...]");
    println!();
    println!("Operations:");
    println!("  search   q=<text> | street=.. city=.. country=..");
    println!("  reverse  lat=<lat> lon=<lon>");
    println!("  lookup   osm_ids=<N123,W456,...>");
    println!("  help     Show this help message");
    println!();
    println!("Environment:");
    println!("  GEOLANE_CONFIG           JSON config file");
    println!("  GEOLANE_HOST             Service host");
    println!("  GEOLANE_CLIENT_ID        Client identification");
    println!("  GEOLANE_INSECURE         Default to http://");
    println!("  GEOLANE_NO_CACHE         Disable the response cache");
    println!("  GEOLANE_MIN_INTERVAL_MS  Minimum spacing between requests");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let endpoint = match args.get(1).map(String::as_str) {
        None | Some("--help") | Some("-h") | Some("help") => {
            print_help();
            return Ok(());
        }
        Some(op) => match op.parse::<Endpoint>() {
            Ok(endpoint) => endpoint,
            Err(_) => {
                eprintln!("Unknown command: {}. Use 'geolane help' for usage.", op);
                std::process::exit(1);
            }
        },
    };

    let mut query = Query::new();
    for arg in &args[2..] {
        match parse_param(arg) {
            Some((name, value)) => query.set(name, value),
            None => {
                eprintln!("Expected name=value, got '{}'", arg);
                std::process::exit(1);
            }
        }
    }

    let config = resolve_config()?;
    let geocoder = Geocoder::new(config)?;

    info!("{} {}", endpoint, geocoder.url_for(endpoint));
    let response = geocoder.execute(endpoint, &query, None).await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
