//! Compass Control - CLI client for the Compass daemon

use anyhow::Result;
use clap::Parser;
use compassctl::cli::{Cli, Commands, PrefsCommands};
use compassctl::client::{default_url, CompassClient};
use compassctl::prefs::{parse_tool_list, Preferences};
use compassctl::{build_request, render, AskOverrides};
use owo_colors::OwoColorize;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let url = cli.url.unwrap_or_else(default_url);

    match cli.command {
        Commands::Ask {
            query,
            vision,
            no_vision,
            tools,
            json,
        } => {
            let prefs = Preferences::load()?;
            let overrides = AskOverrides {
                vision,
                no_vision,
                tools,
            };
            let request = build_request(&query.join(" "), &prefs, &overrides)?;
            let client = CompassClient::new(&url)?;

            let spinner = (!json).then(|| render::thinking_spinner("compass (thinking)..."));
            let result = client.query(&request).await;
            if let Some(spinner) = spinner {
                spinner.finish_and_clear();
            }

            let response = result?;
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                render::print_response(&response);
            }
        }

        Commands::Prefs { action } => {
            let mut prefs = Preferences::load()?;
            match action {
                PrefsCommands::Show => {}
                PrefsCommands::SetVision { text } => {
                    prefs.vision = Some(text.join(" "));
                    prefs.save()?;
                    println!("{}  vision remembered", "[compass]".bright_cyan());
                }
                PrefsCommands::ClearVision => {
                    prefs.vision = None;
                    prefs.save()?;
                    println!("{}  vision cleared", "[compass]".bright_cyan());
                }
                PrefsCommands::SetTools { list } => {
                    prefs.tools = parse_tool_list(&list)?;
                    prefs.save()?;
                    println!("{}  tools remembered", "[compass]".bright_cyan());
                }
            }
            render::print_prefs(&prefs, &Preferences::path()?);
        }

        Commands::Health => {
            let client = CompassClient::new(&url)?;
            let health = client.health().await?;
            render::print_health(&health, client.base_url());
        }

        Commands::Tools => {
            let client = CompassClient::new(&url)?;
            render::print_tools(&client.tools().await?);
        }
    }

    Ok(())
}
