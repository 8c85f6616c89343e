use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use quizmark_config::Config;
use quizmark_engine::{
    MarkdownRenderer, ParseOptions, PlainTextRenderer, Quiz, QuizEntry, parse_quiz,
};

#[derive(Parser)]
#[command(name = "quizmark")]
#[command(about = "Check a quiz file and print a summary of its contents", long_about = None)]
struct Cli {
    /// Quiz file to parse
    file: PathBuf,

    /// Execute `{.lang .run}` code blocks and parse their output
    #[arg(long, default_value_t = false)]
    run_code_blocks: bool,

    /// Directory that relative image paths are resolved against
    /// (defaults to the quiz file's directory)
    #[arg(long)]
    resource_path: Option<PathBuf>,

    /// Escape text instead of rendering Markdown
    #[arg(long, default_value_t = false)]
    plain: bool,

    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("{e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    let bytes = std::fs::read(&cli.file)
        .with_context(|| format!("Failed to read {}", cli.file.display()))?;
    let text = String::from_utf8(bytes)
        .with_context(|| format!("{} is not valid UTF-8", cli.file.display()))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

    let options = ParseOptions {
        source_name: Some(cli.file.display().to_string()),
        run_code_blocks: cli.run_code_blocks || config.run_code_blocks,
        python_executable: config.python_executable,
    };
    log::info!("Parsing {}", cli.file.display());

    let quiz = if cli.plain {
        parse_quiz(text, &mut PlainTextRenderer, &options)?
    } else {
        let resource_dir = cli
            .resource_path
            .or_else(|| cli.file.parent().map(Path::to_path_buf))
            .unwrap_or_default();
        parse_quiz(text, &mut MarkdownRenderer::with_resource_dir(resource_dir), &options)?
    };

    for line in summarize(&quiz) {
        println!("{line}");
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let loaded = match path {
        Some(path) => {
            let config = Config::load_from_path(path)?;
            if config.is_none() {
                anyhow::bail!("Config file {} does not exist", path.display());
            }
            config
        }
        None => Config::load()?,
    };
    match loaded {
        Some(config) => {
            log::info!("Loaded config");
            Ok(config)
        }
        None => {
            log::info!("No config file at {}", Config::config_path().display());
            Ok(Config::default())
        }
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

/// One line per quiz element, indented inside groups.
fn summarize(quiz: &Quiz) -> Vec<String> {
    let mut lines = vec![
        format!("Quiz: {}", quiz.title_raw.as_deref().unwrap_or(&quiz.title)),
        format!("Points possible: {}", quiz.points_possible),
        format!("Id: {}", quiz.id),
    ];

    let mut indent = "";
    let mut number = 0;
    for entry in quiz.entries() {
        match entry {
            QuizEntry::Question(q) => {
                number += 1;
                lines.push(format!(
                    "{indent}{number}. [{}, {} pts] {}",
                    q.question_type,
                    q.points,
                    first_line(&q.raw)
                ));
            }
            QuizEntry::GroupStart(g) => {
                lines.push(format!(
                    "GROUP pick {} of {} ({} pts each)",
                    g.pick,
                    g.population(),
                    g.points_per_question
                ));
                indent = "  ";
            }
            QuizEntry::GroupEnd(_) => {
                indent = "";
                lines.push("END_GROUP".to_string());
            }
            QuizEntry::Text(t) => {
                let label = match (&t.title_raw, &t.text) {
                    (Some(title), _) => title.clone(),
                    (None, Some(text)) => first_line(&text.raw).to_string(),
                    (None, None) => String::new(),
                };
                lines.push(format!("{indent}Text: {label}"));
            }
        }
    }

    if !quiz.resources.is_empty() {
        lines.push("Resources:".to_string());
        for resource in &quiz.resources {
            lines.push(format!(
                "  {} <- {}",
                resource.package_path(),
                resource.path.display()
            ));
        }
    }
    lines
}
