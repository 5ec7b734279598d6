//! Timer template management commands for CLI.

use std::path::PathBuf;

use clap::Subcommand;
use zenith_core::{TemplateStore, TimerConfiguration};

#[derive(Subcommand)]
pub enum TemplateAction {
    /// List built-in and custom templates
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one template as JSON
    Show {
        /// Template ID
        id: String,
    },
    /// Add or replace a custom template
    Add {
        /// Template as JSON
        json: Option<String>,
        /// Read the template JSON from a file instead
        #[arg(long, conflicts_with = "json")]
        file: Option<PathBuf>,
    },
    /// Remove a custom template
    Remove {
        /// Template ID
        id: String,
    },
}

pub fn run(action: TemplateAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = TemplateStore::open()?;

    match action {
        TemplateAction::List { json } => {
            let templates = store.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&templates)?);
                return Ok(());
            }
            for template in &templates {
                let origin = if template.is_custom() { "custom" } else { "built-in" };
                println!(
                    "{:<24} {:<32} {:>3} segments  {:>8}  {}{}",
                    template.id,
                    template.name,
                    template.segments.len(),
                    format_duration(template.cycle_duration_secs()),
                    origin,
                    if template.repeat { ", repeats" } else { "" },
                );
            }
        }
        TemplateAction::Show { id } => {
            let template = store.get(&id)?;
            println!("{}", serde_json::to_string_pretty(&template)?);
        }
        TemplateAction::Add { json, file } => {
            let raw = match (json, file) {
                (Some(json), _) => json,
                (None, Some(path)) => std::fs::read_to_string(path)?,
                (None, None) => return Err("provide template JSON or --file".into()),
            };
            let template: TimerConfiguration = serde_json::from_str(&raw)?;
            let saved = store.save(template)?;
            println!("Template saved: {}", saved.id);
        }
        TemplateAction::Remove { id } => {
            store.remove(&id)?;
            println!("Template removed: {id}");
        }
    }
    Ok(())
}

/// `1h 05m`, `12m 30s`, `45s`.
fn format_duration(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}h {m:02}m")
    } else if m > 0 {
        format!("{m}m {s:02}s")
    } else {
        format!("{s}s")
    }
}
