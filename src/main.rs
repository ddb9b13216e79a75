//! readaid main entry point
//!
//! Loads text, prepares it for reading and speaks it while painting the
//! current word or line. The main thread is the interaction thread: it pumps
//! highlight events out of the playback controller and applies keyboard
//! commands, which a helper thread reads from the terminal.

use log::{debug, error, info};
use readaid::config::Config;
use readaid::display::TerminalView;
use readaid::playback::{HighlightMode, PlaybackController};
use readaid::source::{export_file, read_clipboard, read_file, read_stdin};
use readaid::speech::create_engine;
use readaid::text::preprocess;
use readaid::{ReadAidError, Result};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

/// How long the main loop waits for a highlight before checking commands
const PUMP_INTERVAL: Duration = Duration::from_millis(50);

/// Words per minute added or removed by `+` and `-`
const RATE_STEP: u32 = 10;

const USAGE: &str = "\
Usage: readaid [OPTIONS] [FILE|-]

Reads FILE (or standard input) aloud, highlighting the current word or line.

Options:
  -d, --debug           Write a debug log to readaid.log
      --silent          Keep time without audio output
      --paste           Read the text from the clipboard
      --mode word|line  Highlight granularity
      --rate WPM        Speech rate in words per minute (120-250)
      --json            Print highlight events as JSON lines
      --raw             Skip whitespace normalization
      --export PATH     Write the prepared text to PATH
      --save            Store --mode and --rate as the new defaults
      --print-settings  Print the resolved settings as JSON and exit
  -h, --help            Show this help

While reading from a file or the clipboard, type a command and press Enter:
  p pause   r resume   s stop   q quit   + faster   - slower   w/l word/line mode";

/// Command-line options
#[derive(Debug, Default)]
struct Options {
    silent: bool,
    paste: bool,
    json: bool,
    raw: bool,
    save: bool,
    print_settings: bool,
    help: bool,
    mode: Option<String>,
    rate: Option<String>,
    export: Option<PathBuf>,
    input: Option<String>,
}

/// Keyboard commands from the helper thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Pause,
    Resume,
    Stop,
    Quit,
    Faster,
    Slower,
    Mode(HighlightMode),
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let debug_mode = args.iter().any(|arg| arg == "--debug" || arg == "-d");

    // Initialize logger
    if debug_mode {
        // Debug mode: write to readaid.log file
        use std::fs::OpenOptions;
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open("readaid.log")
        {
            Ok(log_file) => {
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Debug)
                    .target(env_logger::Target::Pipe(Box::new(log_file)))
                    .init();
            }
            Err(e) => {
                eprintln!("Warning: Failed to open readaid.log for debug logging: {}", e);
                eprintln!("Continuing without file logging...");
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Warn)
                    .init();
            }
        }

        info!(
            "readaid version {} starting (debug mode, logging to readaid.log)",
            readaid::VERSION
        );
    } else {
        // Normal mode: warnings and errors to stderr
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Warn)
            .init();
    }

    if let Err(e) = run(args) {
        error!("Fatal error: {}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn parse_args(args: Vec<String>) -> Result<Options> {
    let mut opts = Options::default();
    let mut iter = args.into_iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            // Logging is set up in main before parsing
            "-d" | "--debug" => {}
            "--silent" => opts.silent = true,
            "--paste" => opts.paste = true,
            "--json" => opts.json = true,
            "--raw" => opts.raw = true,
            "--save" => opts.save = true,
            "--print-settings" => opts.print_settings = true,
            "-h" | "--help" => opts.help = true,
            "--mode" => opts.mode = Some(expect_value(&mut iter, "--mode")?),
            "--rate" => opts.rate = Some(expect_value(&mut iter, "--rate")?),
            "--export" => opts.export = Some(expect_value(&mut iter, "--export")?.into()),
            flag if flag.starts_with("--") => {
                return Err(ReadAidError::Other(format!("Unknown option: {}", flag)))
            }
            other => {
                if opts.input.is_some() {
                    return Err(ReadAidError::Other(format!("Unexpected argument: {}", other)));
                }
                opts.input = Some(other.to_string());
            }
        }
    }

    Ok(opts)
}

fn expect_value(iter: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    iter.next()
        .ok_or_else(|| ReadAidError::Other(format!("{} needs a value", flag)))
}

fn run(args: Vec<String>) -> Result<()> {
    let opts = parse_args(args)?;
    debug!("Options: {:?}", opts);

    if opts.help {
        println!("{}", USAGE);
        return Ok(());
    }

    let mut config = Config::load()?;
    info!("Configuration loaded from {:?}", config.path());

    if opts.print_settings {
        println!("{}", serde_json::to_string_pretty(&config.snapshot())?);
        return Ok(());
    }

    let mode = opts
        .mode
        .as_deref()
        .map(HighlightMode::parse_lenient)
        .unwrap_or_else(|| config.highlight_mode());
    let rate = match opts.rate.as_deref() {
        Some(value) => value
            .trim()
            .parse::<u32>()
            .map_err(|_| ReadAidError::Other(format!("--rate expects a number, got {:?}", value)))?,
        None => config.rate(),
    };

    if opts.save {
        config.set_highlight_mode(mode);
        config.set_rate(rate);
        config.save()?;
        info!("Saved mode {} and rate {} as defaults", mode, rate);
    }

    // Commands can only come from the terminal when it isn't the text source
    let stdin_is_text = !opts.paste && matches!(opts.input.as_deref(), None | Some("-"));
    let raw = if opts.paste {
        read_clipboard()?
    } else {
        match opts.input.as_deref() {
            Some("-") | None => {
                if io::stdin().is_terminal() {
                    eprintln!("{}", USAGE);
                    return Err(ReadAidError::Input(
                        "no text given: pass a FILE, '-' or --paste".to_string(),
                    ));
                }
                read_stdin()?
            }
            Some(path) => read_file(Path::new(path))?,
        }
    };

    let text = if opts.raw { raw } else { preprocess(&raw) };
    if let Some(path) = &opts.export {
        export_file(path, &text)?;
        info!("Prepared text exported to {:?}", path);
    }

    let mut controller = PlaybackController::new(create_engine(opts.silent));
    controller.set_highlight_mode(mode);
    controller.set_rate(rate);

    match controller.speak(&text) {
        Ok(()) => {}
        Err(ReadAidError::EmptyInput) => {
            eprintln!("Warning: No text to read.");
            return Ok(());
        }
        Err(e) => return Err(e),
    }

    let table = controller
        .table()
        .ok_or_else(|| ReadAidError::Other("utterance table missing".to_string()))?;
    let view = TerminalView::new(table, &config.snapshot()).json(opts.json);
    let in_place = !view.is_json() && io::stdout().is_terminal();
    if view.is_json() {
        println!("{}", view.style_line()?);
    }
    let painter = view.clone();
    controller.set_callback(move |event| match painter.render(event) {
        Ok(line) => {
            let mut stdout = io::stdout();
            let written = if in_place {
                write!(stdout, "\r\x1b[2K{}", line)
            } else {
                writeln!(stdout, "{}", line)
            };
            if let Err(e) = written.and_then(|_| stdout.flush()) {
                error!("Failed to write highlight: {}", e);
            }
        }
        Err(e) => error!("Failed to render highlight: {}", e),
    });

    let commands = if !stdin_is_text && io::stdin().is_terminal() {
        Some(spawn_command_reader())
    } else {
        None
    };

    let repaint = if in_place { Some(&view) } else { None };
    pump(&mut controller, commands.as_ref(), repaint)?;

    if in_place {
        println!();
    }
    Ok(())
}

/// Deliver highlights and apply commands until the session ends
///
/// With `repaint`, pausing or stopping redraws the current line without its
/// highlight.
fn pump(
    controller: &mut PlaybackController,
    commands: Option<&Receiver<Command>>,
    repaint: Option<&TerminalView>,
) -> Result<()> {
    loop {
        controller.wait_and_dispatch(PUMP_INTERVAL);

        if let Some(commands) = commands {
            while let Ok(command) = commands.try_recv() {
                debug!("Command: {:?}", command);
                match command {
                    Command::Pause => {
                        controller.pause()?;
                        clear_highlight(repaint, controller.last_line_index());
                    }
                    Command::Resume => controller.resume()?,
                    Command::Stop => {
                        let line = controller.last_line_index();
                        controller.stop()?;
                        clear_highlight(repaint, line);
                    }
                    Command::Quit => {
                        let line = controller.last_line_index();
                        controller.stop()?;
                        clear_highlight(repaint, line);
                        return Ok(());
                    }
                    Command::Faster => {
                        let rate = controller.set_rate(controller.rate() + RATE_STEP);
                        info!("Rate now {} wpm (fully applies to the next reading)", rate);
                    }
                    Command::Slower => {
                        let rate = controller.set_rate(controller.rate().saturating_sub(RATE_STEP));
                        info!("Rate now {} wpm (fully applies to the next reading)", rate);
                    }
                    Command::Mode(mode) => controller.set_highlight_mode(mode),
                }
            }
        }

        if !controller.state().is_active() {
            info!("Reading ended in state {:?}", controller.state());
            return Ok(());
        }
    }
}

/// Redraw `line` plain once reading pauses or stops
fn clear_highlight(repaint: Option<&TerminalView>, line: Option<usize>) {
    let (Some(view), Some(line)) = (repaint, line) else {
        return;
    };
    let mut stdout = io::stdout();
    if let Err(e) = write!(stdout, "\r\x1b[2K{}", view.render_plain(line))
        .and_then(|_| stdout.flush())
    {
        error!("Failed to clear highlight: {}", e);
    }
}

fn parse_command(line: &str) -> Option<Command> {
    match line.trim() {
        "p" => Some(Command::Pause),
        "r" => Some(Command::Resume),
        "s" => Some(Command::Stop),
        "q" => Some(Command::Quit),
        "+" => Some(Command::Faster),
        "-" => Some(Command::Slower),
        "w" => Some(Command::Mode(HighlightMode::Word)),
        "l" => Some(Command::Mode(HighlightMode::Line)),
        _ => None,
    }
}

/// Read commands from the terminal on a helper thread
fn spawn_command_reader() -> Receiver<Command> {
    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name("readaid-commands".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                match parse_command(&line) {
                    Some(command) => {
                        if tx.send(command).is_err() {
                            break;
                        }
                    }
                    None => debug!("Unknown command {:?}", line),
                }
            }
        });
    if let Err(e) = spawned {
        error!("Failed to start command reader: {}", e);
    }
    rx
}
