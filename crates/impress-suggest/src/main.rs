//! impress-suggest CLI
//!
//! Replays a typing script through matchers loaded from TOML and prints one
//! JSON object per session event.
//!
//! Script lines:
//!
//! ```text
//! type @alice       # type text, one character at a time
//! backspace 2
//! move -3           # move the cursor by characters
//! cursor 0          # put the cursor at a byte offset
//! select 0 6
//! key Enter         # offer a key press, e.g. Escape, ArrowDown, shift+Tab
//! ```

use std::io::{self, Read, Write};
use std::path::PathBuf;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use impress_suggest::{
    Controller, Key, KeyEvent, MatcherHandlers, MemoryDocument, Reason, Session, SuggestConfig,
};

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "impress-suggest", version, about = "Replay a typing script through suggestion matchers")]
struct Args {
    /// Matcher configuration with `[[matcher]]` tables.
    #[arg(long, short)]
    config: PathBuf,

    /// Script to replay. Reads stdin when omitted.
    script: Option<PathBuf>,

    /// Initial document text; the cursor starts at its end.
    #[arg(long, default_value = "")]
    text: String,

    /// Print the final document after the script.
    #[arg(long)]
    dump: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum ScriptStep {
    Type(String),
    Backspace(usize),
    Move(isize),
    Cursor(usize),
    Select(usize, usize),
    Key(KeyEvent),
}

fn parse_line(line: &str) -> Result<Option<ScriptStep>, String> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let (command, rest) = trimmed.split_once(' ').unwrap_or((trimmed, ""));
    let number = |value: &str| {
        value
            .trim()
            .parse::<usize>()
            .map_err(|e| format!("{command}: {e}"))
    };

    let step = match command {
        // Everything after the first space is typed verbatim.
        "type" => ScriptStep::Type(rest.to_string()),
        "backspace" if rest.trim().is_empty() => ScriptStep::Backspace(1),
        "backspace" => ScriptStep::Backspace(number(rest)?),
        "move" => ScriptStep::Move(
            rest.trim()
                .parse::<isize>()
                .map_err(|e| format!("move: {e}"))?,
        ),
        "cursor" => ScriptStep::Cursor(number(rest)?),
        "select" => {
            let (anchor, head) = rest
                .trim()
                .split_once(' ')
                .ok_or_else(|| "select: expected <anchor> <head>".to_string())?;
            ScriptStep::Select(number(anchor)?, number(head)?)
        }
        "key" => ScriptStep::Key(parse_key_event(rest.trim())?),
        other => return Err(format!("unknown script command: {other}")),
    };
    Ok(Some(step))
}

fn parse_key_event(spec: &str) -> Result<KeyEvent, String> {
    let mut parts: Vec<&str> = spec.split('+').collect();
    // "key +" and "key shift++" name the plus key itself.
    if spec.ends_with("++") || spec == "+" {
        parts.retain(|part| !part.is_empty());
        parts.push("+");
    }
    let key_name = parts.pop().ok_or_else(|| "key: missing key name".to_string())?;
    let mut event = KeyEvent::new(key_name.parse::<Key>()?);
    for modifier in parts {
        match modifier.to_ascii_lowercase().as_str() {
            "shift" => event.shift = true,
            "ctrl" | "control" => event.ctrl = true,
            "alt" | "option" => event.alt = true,
            "meta" | "cmd" | "super" => event.meta = true,
            other => return Err(format!("key: unknown modifier {other}")),
        }
    }
    Ok(event)
}

/// Handlers used by the CLI for every configured matcher: Enter commits the
/// suggestion, Escape dismisses it, and removals clean up stale annotations.
fn cli_handlers() -> MatcherHandlers<usize> {
    MatcherHandlers::new()
        .bind_key(Key::Enter, |ctx| {
            ctx.run();
            true
        })
        .bind_key(Key::Escape, |ctx| {
            ctx.dismiss();
            true
        })
        .on_exit(|ctx| {
            let range = ctx.matched.matched.range;
            let annotated = ctx
                .editor()
                .has_annotation(range.from..range.end, ctx.command.mark_kind());
            if ctx.matched.reason.is_removal() || (ctx.matched.reason == Reason::Split && annotated) {
                ctx.run();
            }
        })
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = SuggestConfig::from_path(&args.config)?;
    let mut controller = Controller::new();
    for matcher in config.build_indexed()? {
        controller.register(matcher, cli_handlers())?;
    }
    info!(matchers = controller.matchers().count(), "loaded matchers");

    let script = match &args.script {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let mut session = Session::new(MemoryDocument::new(args.text), controller);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for (number, line) in script.lines().enumerate() {
        let step = parse_line(line).map_err(|e| format!("line {}: {e}", number + 1))?;
        let Some(step) = step else {
            continue;
        };
        debug!(line = number + 1, ?step, "replaying");

        match step {
            ScriptStep::Type(text) => session.type_text(&text),
            ScriptStep::Backspace(count) => (0..count).for_each(|_| session.backspace()),
            ScriptStep::Move(delta) => session.move_cursor(delta),
            ScriptStep::Cursor(pos) => session.set_cursor(pos),
            ScriptStep::Select(anchor, head) => session.select(anchor, head),
            ScriptStep::Key(event) => {
                session.press_key(event);
            }
        }

        for event in session.take_events() {
            writeln!(out, "{}", serde_json::to_string(&event)?)?;
        }
    }

    if args.dump {
        writeln!(out, "{}", serde_json::to_string(session.doc())?)?;
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(Args::parse()) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
