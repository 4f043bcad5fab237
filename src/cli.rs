//! Command-line interface.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;

use crate::config::{load_settings, Settings};
use crate::server;
use crate::services::{AuditReport, EditService};
use crate::tables::{
    load_category_assignments, load_category_table, load_citation_table, load_image_replacements,
    ASSIGNMENTS_FILE, CATEGORIES_FILE, CITATIONS_FILE, IMAGE_URLS_FILE,
};
use crate::transform::{AssignmentStatus, CategoryTableChange, UpsertOutcome};

#[derive(Debug, Parser)]
#[command(name = "timeline", version, about = "Edit and serve the timeline data file")]
pub struct Cli {
    /// Config file (defaults to ./timeline.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Data file to edit
    #[arg(long, global = true, env = "TIMELINE_DATA")]
    pub data: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Number the sources for each dated entry and append citation markers
    Cite {
        /// Citation table (defaults to tables/citations.toml)
        #[arg(long)]
        table: Option<PathBuf>,
    },

    /// Reassign entry categories, then replace the category table
    Categorize {
        /// Assignment table (defaults to tables/category-assignments.toml)
        #[arg(long)]
        table: Option<PathBuf>,
        /// Category definitions (defaults to tables/categories.toml)
        #[arg(long)]
        categories: Option<PathBuf>,
    },

    /// Replace the category table only
    Categories {
        /// Category definitions (defaults to tables/categories.toml)
        #[arg(long)]
        table: Option<PathBuf>,
    },

    /// Recover a data file that no longer parses and rewrite it cleanly
    Repair,

    /// Replace typographic quotes and ellipses, keeping the file's layout
    FixQuotes,

    /// Apply the image URL replacement table
    RewriteImages {
        /// Replacement table (defaults to tables/image-urls.toml)
        #[arg(long)]
        table: Option<PathBuf>,
    },

    /// Report citation problems and entries without pictures
    Audit {
        /// Skip entries dated after this year in the image report
        #[arg(long)]
        year_cutoff: Option<u32>,
    },

    /// Apply an admin-form submission
    Upsert {
        /// Submission JSON file
        submission: PathBuf,
    },

    /// Run the development web server
    Serve {
        #[arg(long, env = "TIMELINE_HOST")]
        host: Option<String>,
        #[arg(short, long, env = "TIMELINE_PORT")]
        port: Option<u16>,
        /// Directory to serve
        #[arg(long)]
        root: Option<PathBuf>,
    },
}

impl Cli {
    /// Settings from the config file with command-line overrides applied.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = load_settings(self.config.as_deref())?;
        if let Some(ref data) = self.data {
            settings.data_file = data.clone();
        }
        Ok(settings)
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = cli.settings()?;
    let service = EditService::new(&settings.data_file, settings.layout());

    match cli.command {
        Commands::Cite { table } => {
            let path = settings.table_path(CITATIONS_FILE, table.as_deref());
            let table = load_citation_table(&path)?;
            let summary = service
                .cite(&table)
                .with_context(|| format!("citing {}", service.path().display()))?;
            println!(
                "{} Assigned {} citations to {} entries",
                style("✓").green(),
                summary.citations,
                summary.annotated_entries
            );
        }

        Commands::Categorize { table, categories } => {
            let assignments =
                load_category_assignments(&settings.table_path(ASSIGNMENTS_FILE, table.as_deref()))?;
            let definitions =
                load_category_table(&settings.table_path(CATEGORIES_FILE, categories.as_deref()))?;
            let summary = service
                .categorize(&assignments, Some(definitions))
                .with_context(|| format!("categorizing {}", service.path().display()))?;

            let mut not_found = Vec::new();
            for (assignment, status) in &summary.assignments.results {
                match status {
                    AssignmentStatus::Updated { .. } => println!(
                        "{} Updated '{}' to {}",
                        style("✓").green(),
                        assignment.title,
                        assignment.category
                    ),
                    AssignmentStatus::Unchanged => println!(
                        "{} '{}' already in {}",
                        style("=").dim(),
                        assignment.title,
                        assignment.category
                    ),
                    AssignmentStatus::NotFound => not_found.push(assignment),
                }
            }
            if !not_found.is_empty() {
                println!();
                println!("{}", style("Not found:").yellow().bold());
                for assignment in not_found {
                    println!("  - {} ({})", assignment.title, assignment.date);
                }
            }
            if let Some(change) = summary.table {
                print_table_change(&change);
            }
        }

        Commands::Categories { table } => {
            let definitions =
                load_category_table(&settings.table_path(CATEGORIES_FILE, table.as_deref()))?;
            let change = service.replace_categories(definitions)?;
            print_table_change(&change);
        }

        Commands::Repair => {
            let summary = service
                .repair()
                .with_context(|| format!("repairing {}", service.path().display()))?;
            let how = if summary.repaired {
                "after repair"
            } else {
                "without repair"
            };
            println!(
                "{} Parsed {} entries {} ({} typographic characters normalized)",
                style("✓").green(),
                summary.entries,
                how,
                summary.punctuation
            );
        }

        Commands::FixQuotes => {
            let fix = service.fix_quotes()?;
            if fix.replaced == 0 {
                println!("No typographic quotes found");
            } else {
                println!(
                    "{} Replaced {} typographic characters",
                    style("✓").green(),
                    fix.replaced
                );
            }
        }

        Commands::RewriteImages { table } => {
            let replacements =
                load_image_replacements(&settings.table_path(IMAGE_URLS_FILE, table.as_deref()))?;
            let changed = service.rewrite_images(&replacements)?;
            println!("{} Rewrote {} image URLs", style("✓").green(), changed);
        }

        Commands::Audit { year_cutoff } => {
            let cutoff = year_cutoff.unwrap_or(settings.image_year_cutoff);
            let report = service.audit(cutoff)?;
            print_audit(&report, cutoff);
        }

        Commands::Upsert { submission } => {
            let applied = service
                .apply_submission(&submission)
                .with_context(|| format!("applying submission {}", submission.display()))?;
            match applied.outcome {
                UpsertOutcome::Replaced { index } => {
                    println!("{} Replaced entry {}", style("✓").green(), index)
                }
                UpsertOutcome::Appended { fallback: false } => {
                    println!("{} Added new entry", style("✓").green())
                }
                UpsertOutcome::Appended { fallback: true } => println!(
                    "{} Original entry not found, added as new",
                    style("!").yellow()
                ),
            }
            println!("  moved submission to {}", applied.processed.display());
        }

        Commands::Serve { host, port, root } => {
            if let Some(root) = root {
                settings.serve_root = root;
            }
            let host = host.unwrap_or_else(|| settings.host.clone());
            let port = port.unwrap_or(settings.port);
            server::serve(&settings, &host, port).await?;
        }
    }

    Ok(())
}

fn print_table_change(change: &CategoryTableChange) {
    println!("{} Category table replaced", style("✓").green());
    if !change.dropped.is_empty() {
        println!("  dropped: {}", change.dropped.join(", "));
    }
    if !change.added.is_empty() {
        println!("  added: {}", change.added.join(", "));
    }
}

fn print_audit(report: &AuditReport, cutoff: u32) {
    let citations = &report.citations;
    println!("{}", style("Citations").bold());
    println!("  defined: {}", citations.defined);
    println!("  in use:  {}", citations.in_use);

    if citations.is_clean() {
        println!("  {} every citation is defined and used", style("✓").green());
    }
    if !citations.orphaned.is_empty() {
        println!("  {}", style("Orphaned (never referenced):").yellow());
        for c in &citations.orphaned {
            println!("    [{}] {}", c.number, c.source);
        }
    }
    if !citations.missing.is_empty() {
        println!("  {}", style("Missing from the index:").red());
        for m in &citations.missing {
            println!("    [{}] {} ({})", m.citation, m.title, m.date);
        }
    }

    println!();
    println!(
        "{} ({} up to {})",
        style("Entries without images").bold(),
        report.without_images.len(),
        cutoff
    );
    for (date, title) in &report.without_images {
        println!("  {}: {}", date, title);
    }

    if !report.undefined_categories.is_empty() {
        println!();
        println!("{}", style("Undefined categories").bold());
        for u in &report.undefined_categories {
            println!("  {} ({})", u.title, u.category);
        }
    }
}
