//! Event commands: build an analytic from CLI args and hand it to a client

use anyhow::{bail, Context, Result};
use paykit_analytics::{
    AnalyticEvent, Analytic, AnalyticsClient, ApiErrorDetails, CollectionMode, EventAnalytic,
    Params, UsageKey,
};
use serde_json::Value;
use std::time::Duration;
use tracing::info;

use super::EventArgs;
use crate::config::{load_config, AppConfig};

/// Print every event name and usage key
pub fn list_events() {
    println!("Events:");
    for event in AnalyticEvent::ALL {
        println!("  {}", event);
    }
    println!();
    println!("Usage keys:");
    for key in UsageKey::ALL {
        println!("  {}", key);
    }
}

/// Parse `key=value`; the value is JSON when it parses as JSON, else a string
pub fn parse_param(raw: &str) -> Result<(String, Value)> {
    let Some((key, value)) = raw.split_once('=') else {
        bail!("param '{}' must be in key=value form", raw);
    };
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// Build the analytic described by the args
pub fn build_analytic(args: &EventArgs) -> Result<Analytic> {
    let event: AnalyticEvent = args.event.parse()?;

    let params = args
        .params
        .iter()
        .map(|raw| parse_param(raw))
        .collect::<Result<Params>>()?;
    let analytic = EventAnalytic::new(event)
        .params(params)
        .context("Invalid event params")?;

    Ok(match &args.error_type {
        Some(error_type) => {
            let mut error = ApiErrorDetails::new(error_type.as_str());
            if let Some(code) = &args.error_code {
                error = error.with_code(code.as_str());
            }
            analytic.with_error(&error).into()
        }
        None => analytic.into(),
    })
}

fn prepare_client(config: &AppConfig, args: &EventArgs) -> Result<AnalyticsClient> {
    let client = AnalyticsClient::new(config.analytics.clone())
        .context("Failed to create analytics client")?;

    for raw in &args.usage {
        let key: UsageKey = raw.parse()?;
        client.register_usage(key);
    }
    for tag in &args.info {
        client.add_additional_info(tag.as_str());
    }

    Ok(client)
}

/// `paykit payload`
pub fn print_payload(args: &EventArgs) -> Result<()> {
    let config = load_config()?;
    let client = prepare_client(&config, args)?;
    let analytic = build_analytic(args)?;

    let payload = client.payload(&analytic, &config.environment_info());
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

/// `paykit log`
pub async fn log_event(args: &EventArgs, wait_ms: u64) -> Result<()> {
    let config = load_config()?;
    let client = prepare_client(&config, args)?;
    let analytic = build_analytic(args)?;

    let mode = client.collection_mode();
    client.log(&analytic, &config.environment_info());
    info!(event = %analytic.event(), ?mode, "Analytic logged");

    match mode {
        CollectionMode::Enabled => {
            // The send is spawned on this runtime; give it time before exit.
            tokio::time::sleep(Duration::from_millis(wait_ms)).await;
            println!("sent {} to {}", analytic.event(), client.endpoint());
        }
        CollectionMode::TestHarness => {
            let captured = client.test_log_history();
            println!("captured {} payload(s) in test log history", captured.len());
        }
        CollectionMode::Virtualized | CollectionMode::OptedOut => {
            println!("collection disabled ({:?}); payload dropped", mode);
        }
    }

    Ok(())
}
