//! Planwright - business-plan intake and versioned refinement
//!
//! CLI entry point for the intake flow, refinement sessions, and version
//! history commands.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result, eyre};
use serde_json::Value;
use tracing::info;

use planstore::{PlanStore, Version};
use planwright::cli::{Cli, Command, OutputFormat};
use planwright::config::Config;
use planwright::domain::{BusinessCaseDocument, SectionKey, TopicId};
use planwright::intake::{AnswerInput, IntakeMachine, IntakeState, IntakeStep, TopicKind, default_topics};
use planwright::llm::{LlmClient, Message, create_client};
use planwright::plan::PlanGenerator;
use planwright::refine::{RefineError, RefinementSession, SectionDiff, diff, resolve};

fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("planwright")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Write to a log file, not stdout, so interactive prompts stay clean
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file = fs::File::create(log_dir.join("planwright.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(
        "Planwright loaded config: provider={}, model={}",
        config.llm.provider, config.llm.model
    );

    match cli.command {
        Command::Intake { idea } => cmd_intake(&config, idea).await,
        Command::Refine {
            document,
            section,
            instruction,
        } => cmd_refine(&config, &document, section.as_deref(), instruction).await,
        Command::Versions { document, format } => cmd_versions(&config, &document, format),
        Command::Restore { document, version } => cmd_restore(&config, &document, version),
        Command::Show {
            document,
            version,
            format,
        } => cmd_show(&config, &document, version, format),
        Command::Documents => cmd_documents(&config),
    }
}

/// Open the store, creating its parent directory if needed
fn open_store(config: &Config) -> Result<PlanStore> {
    if let Some(parent) = config.storage.store_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).context("Failed to create store directory")?;
    }
    PlanStore::open(&config.storage.store_path)
        .context(format!("Failed to open store at {}", config.storage.store_path.display()))
}

/// Run the question flow, generate the plan, persist version 1
async fn cmd_intake(config: &Config, idea: Option<String>) -> Result<()> {
    config.validate()?;
    let llm: Arc<dyn LlmClient> = create_client(&config.llm)?;

    let topics = default_topics();
    let mut machine = IntakeMachine::new(topics.clone());
    let mut seeded = idea;

    let answers = loop {
        let active = match machine.state() {
            IntakeState::Complete => break machine.answers().clone(),
            IntakeState::AwaitingAnswer { topic } | IntakeState::AwaitingFollowUp { topic, .. } => topic,
        };
        let prompt = machine.current_prompt().unwrap_or_default();
        println!("\n{}", prompt.bold());

        let input = match machine.topics()[active].kind {
            TopicKind::MultiSelect { options } => {
                for (i, option) in options.iter().enumerate() {
                    println!("  {}. {}", i + 1, option);
                }
                let line = read_line("> ")?;
                match parse_selection(&line, options) {
                    Some(selected) => AnswerInput::Selection(selected),
                    None => {
                        println!("{}", "Enter option numbers separated by commas (e.g. 1,3).".yellow());
                        continue;
                    }
                }
            }
            TopicKind::FreeText => match seeded.take() {
                Some(text) => {
                    println!("> {}", text);
                    AnswerInput::Text(text)
                }
                None => AnswerInput::Text(read_line("> ")?),
            },
        };

        match machine.submit_answer(active, input) {
            Ok(IntakeStep::Complete { answers }) => break answers,
            Ok(_) => {}
            Err(e) => println!("{}", e.to_string().yellow()),
        }
    };

    println!("\n{}", "Generating your business case...".cyan());
    let generator = PlanGenerator::new(llm, config.llm.max_tokens);
    let document = generator
        .generate(&topics, &answers)
        .await
        .context("Plan generation failed; your answers were not saved, run intake again to retry")?;

    let title = derive_title(&answers);
    let content = serde_json::to_value(&document)?;
    let mut store = open_store(config)?;
    let (record, version) = store.create_document(&config.owner.id, &title, &content, "Initial plan from intake")?;

    println!("\n{}", document.render_markdown(&title));
    println!(
        "{} {} (version {})",
        "Saved as document".green(),
        record.id.bold(),
        version.version_number
    );
    Ok(())
}

/// Refinement session: instruction, proposal, diff review, accept or reject
async fn cmd_refine(
    config: &Config,
    document_id: &str,
    section: Option<&str>,
    instruction: Option<String>,
) -> Result<()> {
    config.validate()?;
    let llm: Arc<dyn LlmClient> = create_client(&config.llm)?;
    let mut store = open_store(config)?;
    let owner = &config.owner.id;

    let record = store.get_document(owner, document_id)?;
    let mut latest = store.latest_version(owner, document_id)?;
    let mut current: BusinessCaseDocument =
        serde_json::from_value(latest.content.clone()).context("Stored document content is not a business case")?;

    let focus = section
        .map(|s| SectionKey::parse(s).ok_or_else(|| eyre!("Unknown section: {}", s)))
        .transpose()?;

    let session = RefinementSession::new(llm, config.llm.max_tokens);
    let mut history: Vec<Message> = Vec::new();
    let one_shot = instruction.is_some();
    let mut pending = instruction;

    println!("Refining {} ({})", record.title.bold(), document_id);
    if !one_shot {
        println!("{}", "Type an instruction, or an empty line to finish.".cyan());
    }

    loop {
        let instruction = match pending.take() {
            Some(text) => text,
            None => {
                let line = read_line("\nrefine> ")?;
                if line.trim().is_empty() {
                    break;
                }
                line
            }
        };

        match session.propose(&current, &instruction, focus, &history).await {
            Err(RefineError::NoChanges(reason)) => {
                println!("{} {}", "No changes proposed:".yellow(), reason);
            }
            Err(e) => return Err(e.into()),
            Ok(proposal) => {
                println!("\n{}", proposal.changes_summary.bold());
                print_diffs(&diff(&current, &proposal.refined_content));

                let accept = confirm("Accept these changes? [y/N] ")?;
                let merged = resolve(&current, &proposal.refined_content, accept);
                if accept {
                    let content = serde_json::to_value(&merged)?;
                    let version = store.append_version(
                        owner,
                        document_id,
                        &content,
                        &proposal.changes_summary,
                        Some(&latest.id),
                    )?;
                    println!("{} version {}", "Saved".green(), version.version_number);
                    latest = version;
                    current = merged;
                } else {
                    println!("{}", "Rejected; document unchanged.".yellow());
                }

                history.push(Message::user(instruction));
                history.push(Message::assistant(proposal.changes_summary));
            }
        }

        if one_shot {
            break;
        }
    }

    Ok(())
}

/// Show a document's version history
fn cmd_versions(config: &Config, document_id: &str, format: OutputFormat) -> Result<()> {
    let store = open_store(config)?;
    let versions = store.list_versions(&config.owner.id, document_id)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&versions)?),
        OutputFormat::Text => {
            for version in &versions {
                println!(
                    "{:>4}  {}  {}",
                    format!("v{}", version.version_number).bold(),
                    format_timestamp(version.created_at),
                    version.changes_summary
                );
            }
        }
    }
    Ok(())
}

/// Restore an earlier version as a new latest version
fn cmd_restore(config: &Config, document_id: &str, version_number: i64) -> Result<()> {
    let mut store = open_store(config)?;
    let owner = &config.owner.id;

    let target = find_version(&store, owner, document_id, version_number)?;
    let restored = store.restore(owner, document_id, &target.id)?;

    println!(
        "{} version {} as new version {}",
        "Restored".green(),
        version_number,
        restored.version_number
    );
    Ok(())
}

/// Render a document version as markdown or JSON
fn cmd_show(config: &Config, document_id: &str, version_number: Option<i64>, format: OutputFormat) -> Result<()> {
    let store = open_store(config)?;
    let owner = &config.owner.id;

    let record = store.get_document(owner, document_id)?;
    let version = match version_number {
        Some(number) => find_version(&store, owner, document_id, number)?,
        None => store.latest_version(owner, document_id)?,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&version.content)?),
        OutputFormat::Text => {
            let document: BusinessCaseDocument = serde_json::from_value(version.content.clone())
                .context("Stored document content is not a business case")?;
            println!("{}", document.render_markdown(&record.title));
            println!(
                "{}",
                format!("(version {} of {})", version.version_number, record.id).dimmed()
            );
        }
    }
    Ok(())
}

/// List all documents for the configured owner
fn cmd_documents(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    let documents = store.list_documents(&config.owner.id)?;

    if documents.is_empty() {
        println!("No documents yet. Run `pw intake` to create one.");
        return Ok(());
    }

    for document in &documents {
        println!(
            "{}  {}  {}",
            document.id,
            format_timestamp(document.updated_at),
            document.title.bold()
        );
    }
    Ok(())
}

/// Look up a version by its user-facing number
fn find_version(store: &PlanStore, owner: &str, document_id: &str, number: i64) -> Result<Version> {
    store
        .list_versions(owner, document_id)?
        .into_iter()
        .find(|v| v.version_number == number)
        .ok_or_else(|| eyre!("Version {} of document {} not found", number, document_id))
}

/// Title derived from the business idea answer
fn derive_title(answers: &planwright::domain::FormAnswers) -> String {
    let idea = answers
        .get(TopicId::BusinessIdea)
        .map(|a| a.as_prompt_text())
        .unwrap_or_default();
    let first_line = idea.lines().next().unwrap_or("").trim();
    if first_line.is_empty() {
        return "Business case".to_string();
    }
    let title: String = first_line.chars().take(60).collect();
    title
}

fn read_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

fn confirm(prompt: &str) -> Result<bool> {
    let line = read_line(prompt)?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

/// Parse "1,3" style input against the option list
fn parse_selection(line: &str, options: &[&str]) -> Option<Vec<String>> {
    let mut selected = Vec::new();
    for token in line.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let index: usize = token.parse().ok()?;
        if index == 0 || index > options.len() {
            return None;
        }
        let option = options[index - 1].to_string();
        if !selected.contains(&option) {
            selected.push(option);
        }
    }
    if selected.is_empty() { None } else { Some(selected) }
}

/// Section-by-section diff rendering, old content red, new content green
fn print_diffs(diffs: &[SectionDiff]) {
    for entry in diffs {
        println!("\n{}", entry.section.heading().bold().underline());
        match &entry.original {
            Some(original) => {
                for line in value_lines(original) {
                    println!("{}", format!("- {}", line).red());
                }
            }
            None => println!("{}", "- (not present)".red().dimmed()),
        }
        for line in value_lines(&entry.proposed) {
            println!("{}", format!("+ {}", line).green());
        }
    }
    println!();
}

/// Flatten a section value into display lines
fn value_lines(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => s.lines().map(str::to_string).collect(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => serde_json::to_string(other).unwrap_or_default(),
            })
            .collect(),
        other => serde_json::to_string_pretty(other)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect(),
    }
}

fn format_timestamp(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| millis.to_string())
}
