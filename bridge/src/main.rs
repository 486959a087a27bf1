//! rimebridge-demo: replay a key script through the C exports.
//!
//! Script tokens (whitespace separated):
//! - `nihao`    one key per letter
//! - `<bs>`     BackSpace
//! - `<enter>`  Return
//! - `#N`       select candidate N
//! - `<clear>`  clear the composition
//! - `<state>`  query the current state

use anyhow::{bail, Context, Result};
use clap::Parser;
use rimebridge::{
    RimeClearComposition, RimeDestroy, RimeFreeResult, RimeGetCurrentState, RimeGetVersion,
    RimeInitialize, RimeIsAvailable, RimeProcessKey, RimeResult, RimeSelectCandidate,
};
use rimebridge_core::{KEY_BACKSPACE, KEY_RETURN};
use std::ffi::{c_int, CStr, CString};
use std::path::PathBuf;
use std::ptr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "rimebridge-demo",
    version,
    about = "Drive a composition session from the command line"
)]
struct Args {
    /// Directory holding rimebridge.toml and user_dictionary.json
    #[arg(long)]
    user_data_dir: Option<PathBuf>,

    /// Directory holding the compiled lexicon or dictionary.json
    #[arg(long)]
    shared_data_dir: Option<PathBuf>,

    /// Print one JSON object per step
    #[arg(long)]
    json: bool,

    /// Key script to replay
    #[arg(default_value = "nihao #0 wo <clear> <state>")]
    script: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
enum Step {
    Key(c_int),
    Select(c_int),
    Clear,
    State,
}

fn parse_script(tokens: &[String]) -> Result<Vec<Step>> {
    let mut steps = Vec::new();
    for token in tokens.iter().flat_map(|t| t.split_whitespace()) {
        match token {
            "<bs>" => steps.push(Step::Key(KEY_BACKSPACE)),
            "<enter>" => steps.push(Step::Key(KEY_RETURN)),
            "<clear>" => steps.push(Step::Clear),
            "<state>" => steps.push(Step::State),
            _ if token.starts_with('#') => {
                let index = token[1..]
                    .parse()
                    .with_context(|| format!("bad candidate index in {:?}", token))?;
                steps.push(Step::Select(index));
            }
            _ if token.starts_with('<') => bail!("unknown key {:?}", token),
            _ => steps.extend(token.chars().map(|ch| Step::Key(ch as c_int))),
        }
    }
    Ok(steps)
}

fn c_path(path: &Option<PathBuf>) -> Result<Option<CString>> {
    path.as_ref()
        .map(|p| CString::new(p.to_string_lossy().into_owned()).context("path contains NUL"))
        .transpose()
}

fn run_step(session: c_int, step: &Step) -> RimeResult {
    let mut result = RimeResult::zeroed();
    // SAFETY: `result` is a live, writable RimeResult for each call.
    unsafe {
        match *step {
            Step::Key(code) => RimeProcessKey(session, code, &mut result),
            Step::Select(index) => RimeSelectCandidate(session, index, &mut result),
            Step::Clear => RimeClearComposition(session, &mut result),
            Step::State => RimeGetCurrentState(session, &mut result),
        }
    }
    result
}

fn print_human(step: &Step, result: &RimeResult) {
    let decoded = result.decode();
    let label = match step {
        Step::Key(code) => match char::from_u32(*code as u32) {
            Some(ch) if ch.is_ascii_graphic() => format!("key '{}'", ch),
            _ => format!("key 0x{:x}", code),
        },
        Step::Select(index) => format!("select #{}", index),
        Step::Clear => "clear".to_string(),
        Step::State => "state".to_string(),
    };
    println!(
        "{:<12} {:?}  composition=\"{}\"",
        label, decoded.status, decoded.snapshot.composition
    );
    if !decoded.error_message.is_empty() {
        println!("{:<12} error: {}", "", decoded.error_message);
    }
    if !decoded.selected_text.is_empty() {
        println!("{:<12} selected: {}", "", decoded.selected_text);
    }
    for (i, cand) in decoded.snapshot.candidates.iter().enumerate() {
        println!("{:<12} {}. {} ({})", "", i, cand.text, cand.annotation);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rimebridge=info,rimebridge_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let steps = parse_script(&args.script)?;

    let user_dir = c_path(&args.user_data_dir)?;
    let shared_dir = c_path(&args.shared_data_dir)?;
    let as_ptr = |s: &Option<CString>| s.as_ref().map_or(ptr::null(), |c| c.as_ptr());

    // SAFETY: both pointers are null or point to CStrings alive for the call.
    let session = unsafe { RimeInitialize(as_ptr(&user_dir), as_ptr(&shared_dir)) };
    if session == 0 {
        bail!("failed to create a session");
    }

    if !args.json {
        // SAFETY: RimeGetVersion returns a static NUL-terminated string.
        let version = unsafe { CStr::from_ptr(RimeGetVersion()) };
        println!("{} (available: {})", version.to_string_lossy(), RimeIsAvailable() == 1);
        println!("session {}", session);
    }

    for step in &steps {
        let mut result = run_step(session, step);
        if args.json {
            println!("{}", serde_json::to_string(&result.decode())?);
        } else {
            print_human(step, &result);
        }
        // SAFETY: `result` was filled by the library and is freed once here.
        unsafe { RimeFreeResult(&mut result) };
    }

    RimeDestroy(session);
    Ok(())
}
