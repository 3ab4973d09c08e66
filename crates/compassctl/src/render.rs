//! Terminal rendering for daemon replies.

use crate::prefs::Preferences;
use compass_common::{
    Capability, HealthResponse, QueryResponse, Source, ToolOutcome, ToolSettings, ToolsResponse,
};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::time::Duration;

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Spinner while waiting on the daemon; hidden when stdout is not a TTY
pub fn thinking_spinner(message: &str) -> ProgressBar {
    if !std::io::stdout().is_terminal() {
        return ProgressBar::hidden();
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(SPINNER_FRAMES)
        .template("{spinner:.cyan} {msg}")
    {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

pub fn print_response(response: &QueryResponse) {
    println!();
    println!("{}  {}", "[compass]".bright_cyan(), response.query.bold());
    if let Some(vision) = response.vision.as_deref().filter(|v| !v.trim().is_empty()) {
        println!("{}", format!("  vision: {}", vision).dimmed());
    }
    println!();

    println!("{}", "Summary".bold().underline());
    println!("  {}", response.summary);
    println!();

    println!("{}", "Plan".bold().underline());
    for (i, step) in response.plan.iter().enumerate() {
        println!("  {}. {}", (i + 1).bright_yellow(), step);
    }
    println!();

    if !response.sources.is_empty() {
        println!("{}", "Sources".bold().underline());
        for source in &response.sources {
            print_source(source);
        }
        println!();
    }

    let diag = &response.diagnostics;
    let traced: Vec<String> = diag.tool_trace.iter().map(trace_badge).collect();
    if !traced.is_empty() {
        println!("{}  {}", "tools".dimmed(), traced.join("  "));
    }
    if let Some(bias) = &diag.vision_bias {
        if !bias.is_empty() {
            println!("{}   {}", "bias".dimmed(), bias.join(", ").dimmed());
        }
    }
    for error in diag.errors() {
        println!("{}  {}", "error".red(), error);
    }
    println!(
        "{}",
        response
            .timestamp
            .with_timezone(&chrono::Local)
            .format("answered %Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
}

fn print_source(source: &Source) {
    println!(
        "  {} {} {}",
        confidence_bar(source.confidence).green(),
        format!("[{}]", source.kind).cyan(),
        source.title.bold()
    );
    if let Some(url) = &source.url {
        println!("      {}", url.dimmed());
    }
    if !source.snippet.is_empty() {
        println!("      {}", source.snippet);
    }
}

/// Five-cell bar, filled proportionally to confidence
pub fn confidence_bar(confidence: f64) -> String {
    let filled = (confidence.clamp(0.0, 1.0) * 5.0).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(5 - filled))
}

fn trace_badge(entry: &compass_common::ToolTraceEntry) -> String {
    let label = format!("{}:{}", entry.tool, entry.source_count);
    match entry.outcome {
        ToolOutcome::Ok => label.green().to_string(),
        ToolOutcome::Empty => label.yellow().to_string(),
        ToolOutcome::Error | ToolOutcome::Timeout => label.red().to_string(),
    }
}

/// `search, system` or `none`
pub fn tool_list(tools: &ToolSettings) -> String {
    let enabled = tools.enabled();
    if enabled.is_empty() {
        return "none".to_string();
    }
    enabled
        .iter()
        .map(Capability::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn print_prefs(prefs: &Preferences, path: &std::path::Path) {
    println!("{}  preferences", "[compass]".bright_cyan());
    println!("  file    {}", path.display().dimmed());
    match prefs.vision_text() {
        Some(vision) => println!("  vision  {}", vision),
        None => println!("  vision  {}", "(none)".dimmed()),
    }
    println!("  tools   {}", tool_list(&prefs.tools));
}

pub fn print_health(health: &HealthResponse, url: &str) {
    println!(
        "{}  {} v{} at {} (up {}s)",
        "[compass]".bright_cyan(),
        health.status.green(),
        health.version,
        url,
        health.uptime_seconds
    );
}

pub fn print_tools(tools: &ToolsResponse) {
    println!("{}  tools", "[compass]".bright_cyan());
    for cap in &tools.tools {
        let wired = tools.configured.contains(cap);
        let default_on = tools.defaults.is_enabled(*cap);
        println!(
            "  {:<10} {}  {}",
            cap.as_str(),
            if wired { "configured".green().to_string() } else { "missing".red().to_string() },
            (if default_on { "on by default" } else { "off by default" }).dimmed()
        );
    }
}
