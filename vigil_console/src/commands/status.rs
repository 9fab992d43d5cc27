//! Status command - one-shot portal health summary
//!
//! Fetches all three dashboard endpoints once and prints a compact report,
//! suitable for scripts and cron. Exits non-zero only when the portal is
//! completely unreachable; partial failures are reported inline.

use anyhow::bail;
use colored::*;
use serde_json::{json, Value};

use vigil_core::{ConsoleConfig, MetricsSnapshot, PortalClient, UsageLevel, VigilResult};

pub async fn run(config: &ConsoleConfig, json_output: bool) -> anyhow::Result<()> {
    let client = PortalClient::new(&config.api_url, config.request_timeout())?;
    let (metrics, logs, recovery) = futures::join!(
        client.metrics(),
        client.logs(config.log_limit),
        client.recovery()
    );

    if json_output {
        let combined = json!({
            "metrics": to_json(metrics),
            "logs": to_json(logs),
            "recovery": to_json(recovery),
        });
        println!("{}", serde_json::to_string_pretty(&combined)?);
        return Ok(());
    }

    println!("{}", "Vigil Portal Status".green().bold());
    println!("  {}", config.api_url.dimmed());
    println!();

    let mut failures = 0;
    print_metrics(&metrics, &mut failures);
    print_logs(&logs, &mut failures);
    print_recovery(&recovery, &mut failures);

    println!();
    if failures == 3 {
        bail!("portal unreachable at {}", config.api_url);
    }
    if failures > 0 {
        println!("{} {} of 3 endpoints unavailable", "!".yellow(), failures);
    } else {
        println!("{} all endpoints responding", "✓".green());
    }
    Ok(())
}

fn to_json(result: VigilResult<Value>) -> Value {
    match result {
        Ok(value) => value,
        Err(e) => json!({ "error": e.to_string() }),
    }
}

fn print_metrics(result: &VigilResult<Value>, failures: &mut u32) {
    println!("{}", "System Metrics".bold());
    match result {
        Ok(payload) => {
            let snap = MetricsSnapshot::new(payload.clone());
            print_usage("CPU", snap.percent("performance.cpu.usage_percent"));
            print_usage("Memory", snap.percent("performance.memory.usage_percent"));
            print_usage("Disk", snap.percent("performance.disk.usage_percent"));
            if let Some(host) = snap.text("hostname") {
                println!("  {:<8} {}", "Host", host);
            }
            if let Some(ts) = snap.timestamp() {
                println!("  {:<8} {}", "As of", ts.format("%Y-%m-%d %H:%M:%S UTC"));
            }
        }
        Err(e) => {
            *failures += 1;
            println!("  {} {}", "✗".red(), e);
        }
    }
    println!();
}

fn print_logs(result: &VigilResult<Value>, failures: &mut u32) {
    println!("{}", "System Logs".bold());
    match result {
        Ok(payload) => {
            let snap = MetricsSnapshot::new(payload.clone());
            let entries = snap.array("logs").map(Vec::as_slice).unwrap_or(&[]);
            println!("  {} recent entries", entries.len());
            if let Some(last) = entries.last() {
                let level = last
                    .get("level")
                    .and_then(Value::as_str)
                    .unwrap_or("info")
                    .to_uppercase();
                let message = last.get("message").and_then(Value::as_str).unwrap_or("");
                println!("  {:<8} {}", level, message);
            }
        }
        Err(e) => {
            *failures += 1;
            println!("  {} {}", "✗".red(), e);
        }
    }
    println!();
}

fn print_recovery(result: &VigilResult<Value>, failures: &mut u32) {
    println!("{}", "Crash Recovery".bold());
    match result {
        Ok(payload) => {
            let snap = MetricsSnapshot::new(payload.clone());
            let components = snap.array("components").map(Vec::as_slice).unwrap_or(&[]);
            let failed: Vec<&str> = components
                .iter()
                .filter(|c| {
                    matches!(
                        c.get("state").and_then(Value::as_str),
                        Some("failed") | Some("crashed")
                    )
                })
                .filter_map(|c| c.get("name").and_then(Value::as_str))
                .collect();
            if failed.is_empty() {
                println!("  {} {} components healthy", "✓".green(), components.len());
            } else {
                println!("  {} failed: {}", "✗".red(), failed.join(", "));
            }
        }
        Err(e) => {
            *failures += 1;
            println!("  {} {}", "✗".red(), e);
        }
    }
}

fn print_usage(label: &str, pct: Option<f64>) {
    match pct {
        Some(pct) => {
            let rendered = format!("{:5.1}%", pct);
            let colored_pct = match UsageLevel::from_percent(pct) {
                UsageLevel::Normal => rendered.green(),
                UsageLevel::Warning => rendered.yellow(),
                UsageLevel::Danger => rendered.red(),
            };
            println!("  {:<8} {}", label, colored_pct);
        }
        None => println!("  {:<8} {}", label, "--".dimmed()),
    }
}
