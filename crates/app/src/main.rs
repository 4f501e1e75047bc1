use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use quiz_core::model::{AnswerIndex, Question, ScoreReport, SessionId};
use services::{QuizConfig, SessionRegistry};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    EmptyName,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::EmptyName => write!(f, "please enter your name"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--config <path>] [--name <display name>] [--export]");
    eprintln!();
    eprintln!("Without --name the quiz asks for one on stdin.");
    eprintln!("--export prints the final results as JSON.");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  RUST_LOG (overrides log.filter), QUIZ_BANK__PATH, QUIZ_BANK__VALIDATE");
}

struct Args {
    config: Option<PathBuf>,
    name: Option<String>,
    export: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            config: None,
            name: None,
            export: false,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => parsed.config = Some(require_value(args, "--config")?.into()),
                "--name" => {
                    let value = require_value(args, "--name")?;
                    parsed.name = Some(normalize_name(&value)?);
                }
                "--export" => parsed.export = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }
}

/// Trim a display name and reject blanks before it reaches the registry.
fn normalize_name(raw: &str) -> Result<String, ArgsError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ArgsError::EmptyName);
    }
    Ok(trimmed.to_string())
}

fn init_tracing(config: &QuizConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log.filter.as_str()));
    // Logs go to stderr so they never interleave with the quiz prompts on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn prompt(input: &mut impl BufRead, out: &mut impl Write, text: &str) -> io::Result<Option<String>> {
    write!(out, "{text}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn show_question(
    out: &mut impl Write,
    question: &Question,
    position: usize,
    total: usize,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Question {position} of {total} [{}]", question.category())?;
    writeln!(out, "{}", question.text())?;
    for (i, option) in question.options().iter().enumerate() {
        writeln!(out, "  {}. {option}", i + 1)?;
    }
    Ok(())
}

fn show_results(out: &mut impl Write, report: &ScoreReport) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Results for {}", report.owner_name)?;
    writeln!(
        out,
        "Score: {}/{} ({:.1}%) grade {:?}",
        report.correct, report.total, report.percentage, report.grade
    )?;
    writeln!(out, "{}", report.grade.remark())?;
    for (category, score) in &report.categories {
        writeln!(out, "  {category}: {}/{} ({}%)", score.correct, score.total, score.percent())?;
    }
    for result in report.results.iter().filter(|r| !r.is_correct) {
        writeln!(
            out,
            "  missed #{}: {} -> {}",
            result.question_id,
            result.text,
            result.correct_option.as_deref().unwrap_or("?")
        )?;
    }
    Ok(())
}

/// Drive one session from stdin until it completes or input ends.
fn play(
    registry: &SessionRegistry,
    id: SessionId,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<Option<ScoreReport>, Box<dyn std::error::Error>> {
    loop {
        let Some((question, progress)) = registry
            .with_session(id, |s| s.current_question().cloned().map(|q| (q, s.progress())))
            .flatten()
        else {
            return Ok(registry.complete_session(id).map(|s| s.report(registry.clock().now())));
        };

        show_question(out, &question, progress.position, progress.total)?;
        let Some(raw) = prompt(input, out, "Your answer: ")? else {
            return Ok(None);
        };
        // Displayed options are one-based; anything unparseable counts as no valid option.
        let answer: AnswerIndex = raw.parse::<AnswerIndex>().map_or(-1, |n| n.saturating_sub(1));

        let Some(outcome) = registry.answer_current(id, answer) else {
            return Ok(None);
        };
        writeln!(out, "{}", if outcome.is_correct { "Correct!" } else { "Not quite." })?;
        if let Some(report) = outcome.report {
            return Ok(Some(report));
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let config = QuizConfig::load(args.config.as_deref())?;
    init_tracing(&config);
    let registry = SessionRegistry::new(config.build_bank()?);
    tracing::info!(
        questions = registry.bank().len(),
        bank = ?config.bank.path,
        "question bank loaded"
    );

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout().lock();

    let name = match args.name {
        Some(name) => name,
        None => {
            let raw = prompt(&mut input, &mut out, "Your name: ")?.unwrap_or_default();
            normalize_name(&raw)?
        }
    };

    let id = registry.create_session(&name);
    let report = play(&registry, id, &mut input, &mut out)?;

    if let Some(report) = report {
        show_results(&mut out, &report)?;
        if args.export {
            if let Some(json) = services::export_json(&registry, id)? {
                writeln!(out, "{json}")?;
            }
        }
    }

    registry.delete_session(id);
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
