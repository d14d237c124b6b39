//! yaml-intelligence - completions, lint and hover for Quarto YAML from the command line
//!
//! Results are printed as the JSON an editor would receive.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use quarto_yaml_intelligence::{FileType, Position, SchemaCatalog, YamlIntelligence, YamlIntelligenceContext};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "yaml-intelligence")]
#[command(about = "Completions, lint and hover for YAML in Quarto documents", long_about = None)]
struct Cli {
    /// JSON bundle of schema resources (`schema/front-matter.yml`, ...)
    #[arg(long, value_name = "FILE", global = true)]
    resources: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Complete at the cursor
    Complete(Request),
    /// Validate every YAML region of the file
    Lint {
        #[command(flatten)]
        request: Request,

        /// Treat the request as triggered while typing
        #[arg(long)]
        implicit: bool,
    },
    /// Describe the key on the cursor row
    Hover(Request),
}

#[derive(Args, Debug)]
struct Request {
    /// Read the whole request context from a JSON file
    #[arg(long, value_name = "FILE", conflicts_with = "file")]
    context: Option<PathBuf>,

    /// Buffer to work on
    #[arg(required_unless_present = "context")]
    file: Option<PathBuf>,

    /// Cursor row (zero-based)
    #[arg(long, default_value_t = 0)]
    row: usize,

    /// Cursor column (zero-based, in characters)
    #[arg(long, default_value_t = 0)]
    column: usize,

    /// Kind of buffer; guessed from the file extension by default
    #[arg(long, value_enum)]
    filetype: Option<FileTypeArg>,

    /// Language of a code cell buffer
    #[arg(long)]
    language: Option<String>,

    /// Execution engine whose cell options apply
    #[arg(long)]
    engine: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum FileTypeArg {
    Yaml,
    Script,
    Markdown,
}

impl From<FileTypeArg> for FileType {
    fn from(arg: FileTypeArg) -> Self {
        match arg {
            FileTypeArg::Yaml => FileType::Yaml,
            FileTypeArg::Script => FileType::Script,
            FileTypeArg::Markdown => FileType::Markdown,
        }
    }
}

fn guess_filetype(path: &Path) -> FileType {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("qmd" | "md" | "rmd" | "Rmd") => FileType::Markdown,
        Some("yml" | "yaml") => FileType::Yaml,
        _ => FileType::Script,
    }
}

impl Request {
    fn load(&self) -> Result<YamlIntelligenceContext> {
        if let Some(path) = &self.context {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read context file: {}", path.display()))?;
            return serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse context file: {}", path.display()));
        }

        let path = self.file.as_ref().context("No input file given")?;
        let code = fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {}", path.display()))?;
        let filetype = self.filetype.map_or_else(|| guess_filetype(path), FileType::from);

        let mut context = YamlIntelligenceContext::new(filetype, code, Position::new(self.row, self.column))
            .with_path(path.display().to_string());
        context.language = self.language.clone();
        context.engine = self.engine.clone();
        Ok(context)
    }
}

fn load_catalog(resources: Option<&Path>) -> Result<SchemaCatalog> {
    let Some(path) = resources else {
        tracing::warn!("no --resources given; no schemas are available");
        return Ok(SchemaCatalog::new());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read resources file: {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse resources file: {}", path.display()))?;
    SchemaCatalog::from_resources(&value)
        .with_context(|| format!("Failed to load schemas from {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yaml_intelligence=info,quarto_yaml_intelligence=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let engine = YamlIntelligence::new(load_catalog(cli.resources.as_deref())?);

    match cli.command {
        Commands::Complete(request) => {
            let context = request.load()?;
            tracing::debug!(filetype = ?context.filetype, row = context.position.row, "completing");
            print_json(&engine.get_completions(&context).await)
        }
        Commands::Lint { request, implicit } => {
            let mut context = request.load()?;
            if implicit {
                context.explicit = Some(false);
            }
            print_json(&engine.get_lint(&context).await)
        }
        Commands::Hover(request) => {
            let context = request.load()?;
            print_json(&engine.get_hover(&context).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_filetype() {
        assert_eq!(guess_filetype(Path::new("doc.qmd")), FileType::Markdown);
        assert_eq!(guess_filetype(Path::new("_quarto.yml")), FileType::Yaml);
        assert_eq!(guess_filetype(Path::new("cell.py")), FileType::Script);
    }

    #[test]
    fn test_cli_parses_requests() {
        let cli = Cli::try_parse_from([
            "yaml-intelligence",
            "complete",
            "doc.qmd",
            "--row",
            "2",
            "--column",
            "4",
            "--resources",
            "bundle.json",
        ])
        .unwrap();
        assert_eq!(cli.resources, Some(PathBuf::from("bundle.json")));
        let Commands::Complete(request) = cli.command else {
            panic!("expected complete");
        };
        assert_eq!((request.row, request.column), (2, 4));

        let cli = Cli::try_parse_from(["yaml-intelligence", "lint", "--context", "ctx.json", "--implicit"]).unwrap();
        assert!(matches!(cli.command, Commands::Lint { implicit: true, .. }));

        assert!(Cli::try_parse_from(["yaml-intelligence", "hover"]).is_err());
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
