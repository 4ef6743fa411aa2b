//! Predictor hub CLI module
//!
//! Command-line interface for single and batch predictions, schema
//! inspection, and serving the hub over HTTP.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::batch::read_csv_path;
use crate::coercion::{coerce, RawInput};
use crate::error::HubError;
use crate::export::write_csv;
use crate::inference::{predict_batch, predict_row, ModelLoader, PredictionResult};
use crate::schema::{FeatureKind, ModelPage, SchemaRegistry};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

/// Rows shown when previewing a batch result
const PREVIEW_ROWS: usize = 10;

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn report_errors(err: &HubError) {
    for message in err.messages() {
        println!("  {} {}", "✗".red(), message);
    }
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "predictor-hub")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run pre-trained models on form input or CSV uploads")]
#[command(long_about = None)]
pub struct Cli {
    /// Directory holding the model artifacts (defaults to $MODELS_DIR or ./models)
    #[arg(long, global = true)]
    pub models_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the available model pages
    Models,

    /// Show a model's input features and their defaults
    Schema {
        /// Model id (wheat_seeds, used_car, melbourne_housing)
        #[arg(short, long)]
        model: String,
    },

    /// Predict a single row; unset features take their defaults
    Predict {
        /// Model id
        #[arg(short, long)]
        model: String,

        /// Feature value as NAME=VALUE (repeatable)
        #[arg(short, long = "set", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
    },

    /// Predict every row of a CSV file
    Batch {
        /// Model id
        #[arg(short, long)]
        model: String,

        /// Input CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// Output CSV file (defaults to the model's download name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start the web server
    Serve {
        /// Server port
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Server host
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
    },
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    if name.trim().is_empty() {
        return Err(format!("missing feature name in '{}'", s));
    }
    Ok((name.trim().to_string(), value.to_string()))
}

/// Models directory from the flag, else the server configuration default
pub fn resolve_models_dir(flag: Option<&Path>) -> PathBuf {
    match flag {
        Some(dir) => dir.to_path_buf(),
        None => PathBuf::from(crate::server::ServerConfig::default().models_dir),
    }
}

fn print_result(result: &PredictionResult) {
    println!();
    println!("{}", result.table().head(Some(PREVIEW_ROWS)));
    if result.height() > PREVIEW_ROWS {
        println!("  {}", dim(&format!("… {} more rows", result.height() - PREVIEW_ROWS)));
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_models(models_dir: &Path) -> anyhow::Result<()> {
    section("Models");

    let registry = SchemaRegistry::builtin()?;
    let loader = ModelLoader::new(models_dir);

    println!("  {:<20} {:<36} {:<16} {}", muted("Id"), muted("Title"), muted("Task"), muted("Artifact"));
    println!("  {}", dim(&"─".repeat(86)));

    for page in registry.pages() {
        let path = loader.artifact_path(page);
        let artifact = if path.exists() {
            ok(&path.display().to_string())
        } else {
            format!("{} (missing)", path.display()).yellow()
        };
        println!("  {:<20} {:<36} {:<16} {}", page.id.white(), page.title, page.task.to_string(), artifact);
    }

    println!();
    Ok(())
}

pub fn cmd_schema(model_id: &str) -> anyhow::Result<()> {
    let registry = SchemaRegistry::builtin()?;
    let page = registry.page(model_id)?;

    section(&page.title);
    println!("  {:<24} {:<12} {}", muted("Feature"), muted("Kind"), muted("Default"));
    println!("  {}", dim(&"─".repeat(56)));

    for feature in page.schema.features() {
        let kind = match feature.kind {
            FeatureKind::Numeric => "numeric".cyan(),
            FeatureKind::Categorical => "categorical".magenta(),
        };
        println!("  {:<24} {:<12} {}", feature.name, kind, feature.default.to_input_string());
    }

    println!();
    Ok(())
}

fn run_single(page: &ModelPage, raw: &RawInput, models_dir: &Path) -> anyhow::Result<()> {
    let row = match coerce(&page.schema, raw) {
        Ok(row) => row,
        Err(errors) => {
            let err = HubError::Validation(errors);
            report_errors(&err);
            return Err(err.into());
        }
    };

    step_run("Loading model");
    let predictor = ModelLoader::new(models_dir).load(page)?;
    step_done(page.task.to_string().as_str());

    step_run("Predicting");
    let start = Instant::now();
    let result = predict_row(predictor.as_ref(), &page.schema, &row)?;
    step_done(&format!("{:?}", start.elapsed()));

    print_result(&result);
    Ok(())
}

pub fn cmd_predict(model_id: &str, set: &[(String, String)], models_dir: &Path) -> anyhow::Result<()> {
    let registry = SchemaRegistry::builtin()?;
    let page = registry.page(model_id)?;
    section(&page.title);

    let mut raw = page.schema.default_raw_input();
    for (name, value) in set {
        if page.schema.get(name).is_none() {
            anyhow::bail!("'{}' is not an input of {}", name, page.id);
        }
        raw.insert(name.clone(), value.clone());
    }

    run_single(page, &raw, models_dir)
}

fn run_batch(page: &ModelPage, data_path: &Path, output: &Path, models_dir: &Path) -> anyhow::Result<()> {
    step_run("Loading data");
    let table = read_csv_path(data_path)?;
    step_done(&format!("{} rows × {} cols", table.height(), table.width()));

    step_run("Loading model");
    let predictor = ModelLoader::new(models_dir).load(page)?;
    step_done(page.task.to_string().as_str());

    step_run("Predicting");
    let start = Instant::now();
    let mut result = match predict_batch(predictor.as_ref(), &page.schema, &table) {
        Ok(result) => result,
        Err(err) => {
            println!("{}", "failed".red());
            report_errors(&err);
            return Err(err.into());
        }
    };
    step_done(&format!("{} rows in {:?}", result.height(), start.elapsed()));

    print_result(&result);

    step_run(&format!("Saving → {}", output.display()));
    write_csv(result.table_mut(), output)?;
    step_done(&format!("{} rows × {} cols", result.height(), result.table().width()));

    println!();
    Ok(())
}

pub fn cmd_batch(
    model_id: &str,
    data_path: &Path,
    output: Option<&Path>,
    models_dir: &Path,
) -> anyhow::Result<()> {
    let registry = SchemaRegistry::builtin()?;
    let page = registry.page(model_id)?;
    section(&page.title);

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&page.download_name));
    run_batch(page, data_path, &output, models_dir)
}

// ─── Serve ─────────────────────────────────────────────────────────────────────

pub async fn cmd_serve(host: &str, port: u16, models_dir: &Path) -> anyhow::Result<()> {
    use crate::server::{run_server, ServerConfig};

    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "ML Predictor Hub".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("Hub    ", &format!("http://{}:{}", host, port)));
    line_box(&kv("Models ", &format!("http://{}:{}/api/models", host, port)));
    line_box(&kv("Health ", &format!("http://{}:{}/api/health", host, port)));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_empty();
    line_box_bottom();
    println!();

    let config = ServerConfig {
        host: host.to_string(),
        port,
        models_dir: models_dir.display().to_string(),
        ..Default::default()
    };

    run_server(config).await
}

// ─── Interactive mode ──────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("       {}", "ML Predictor Hub".truecolor(120, 170, 255).bold());
    println!("       {}", dim(&format!("v{}  ·  rust", env!("CARGO_PKG_VERSION"))));
    println!();
}

/// Edit each feature in a prompt pre-filled with its default
fn prompt_inputs(
    page: &ModelPage,
    theme: &dialoguer::theme::ColorfulTheme,
    previous: &RawInput,
) -> anyhow::Result<RawInput> {
    use dialoguer::Input;

    let mut raw = RawInput::new();
    for (name, default) in page.schema.default_inputs() {
        let initial = previous.get(&name).cloned().unwrap_or(default);
        let value: String = Input::with_theme(theme)
            .with_prompt(&name)
            .default(initial)
            .allow_empty(true)
            .interact_text()?;
        raw.insert(name, value);
    }
    Ok(raw)
}

fn interactive_single(page: &ModelPage, theme: &dialoguer::theme::ColorfulTheme, models_dir: &Path) -> anyhow::Result<()> {
    use dialoguer::Confirm;

    let mut raw = page.schema.default_raw_input();
    loop {
        raw = prompt_inputs(page, theme, &raw)?;
        match run_single(page, &raw, models_dir) {
            Ok(()) => return Ok(()),
            Err(e) => match e.downcast_ref::<HubError>() {
                Some(err) if err.is_recoverable() => {
                    let retry = Confirm::with_theme(theme)
                        .with_prompt("Fix the inputs and try again?")
                        .default(true)
                        .interact()?;
                    if !retry {
                        return Ok(());
                    }
                }
                _ => return Err(e),
            },
        }
    }
}

fn interactive_batch(page: &ModelPage, theme: &dialoguer::theme::ColorfulTheme, models_dir: &Path) -> anyhow::Result<()> {
    use dialoguer::Input;

    let data: String = Input::with_theme(theme)
        .with_prompt("CSV file with the required columns")
        .interact_text()?;
    let output: String = Input::with_theme(theme)
        .with_prompt("Save predictions to")
        .default(page.download_name.clone())
        .interact_text()?;

    run_batch(page, Path::new(data.trim()), Path::new(output.trim()), models_dir)
}

pub async fn cmd_interactive(models_dir: &Path) -> anyhow::Result<()> {
    use dialoguer::{theme::ColorfulTheme, Select};

    print_banner();

    let theme = ColorfulTheme {
        active_item_prefix: dialoguer::console::style("  ›".to_string()).for_stderr().cyan(),
        active_item_style: dialoguer::console::Style::new().for_stderr().white().bold(),
        inactive_item_prefix: dialoguer::console::style("   ".to_string()).for_stderr(),
        inactive_item_style: dialoguer::console::Style::new().for_stderr().color256(245),
        prompt_prefix: dialoguer::console::style("  ?".to_string()).for_stderr().color256(111),
        prompt_style: dialoguer::console::Style::new().for_stderr().white().bold(),
        ..ColorfulTheme::default()
    };

    let registry = SchemaRegistry::builtin()?;

    loop {
        let mut items: Vec<String> = registry.pages().iter().map(|p| p.title.clone()).collect();
        items.push("Start Server          web + rest api on :8080".to_string());
        items.push("Exit".to_string());

        println!();
        let sel = Select::with_theme(&theme)
            .with_prompt("Select a model")
            .items(&items)
            .default(0)
            .interact_opt()?;

        let n_pages = registry.pages().len();
        match sel {
            Some(i) if i < n_pages => {
                let page = &registry.pages()[i];
                section(&page.title);

                let mode = Select::with_theme(&theme)
                    .with_prompt("Choose input mode")
                    .items(&["Single Prediction", "Batch Upload"])
                    .default(0)
                    .interact()?;

                let outcome = if mode == 0 {
                    interactive_single(page, &theme, models_dir)
                } else {
                    interactive_batch(page, &theme, models_dir)
                };
                if let Err(e) = outcome {
                    println!("  {} {}", "✗".red(), e);
                }
            }
            Some(i) if i == n_pages => {
                cmd_serve("0.0.0.0", 8080, models_dir).await?;
                break;
            }
            _ => {
                println!();
                println!("  {}", dim("goodbye"));
                println!();
                break;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("Brand_Model=Maruti Alto"),
            Ok(("Brand_Model".to_string(), "Maruti Alto".to_string()))
        );
        assert_eq!(parse_assignment("Property_Type="), Ok(("Property_Type".to_string(), String::new())));
        assert!(parse_assignment("Area").is_err());
        assert!(parse_assignment("=1").is_err());
    }

    #[test]
    fn test_cli_parses_predict() {
        let cli = Cli::try_parse_from([
            "predictor-hub",
            "predict",
            "-m",
            "wheat_seeds",
            "--set",
            "Area=14.1",
            "--set",
            "Groove=5.0",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Predict { model, set }) => {
                assert_eq!(model, "wheat_seeds");
                assert_eq!(set.len(), 2);
            }
            _ => panic!("expected predict command"),
        }
    }

    #[test]
    fn test_explicit_models_dir_wins() {
        assert_eq!(resolve_models_dir(Some(Path::new("/opt/models"))), PathBuf::from("/opt/models"));
    }
}
