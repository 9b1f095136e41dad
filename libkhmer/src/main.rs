use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use libkhmer::{
    create_headless_engine, khmer_layout, open_library, parse_script, replay, resolver,
    HeadlessHost, ImeEngine, KhmerConfig, KhmerLibrary, ModifierState, INVISIBLE_MARKER,
};

#[derive(Parser)]
#[command(name = "libkhmer")]
#[command(about = "Khmer input method engine: layout, typing and saved documents")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// redb document store (overrides the config)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive REPL: one keystroke script per line
    Repl,
    /// Replay a keystroke script and print the result
    Type {
        /// Strokes such as `KeyK Shift+KeyA v:ShiftLeft Space`
        script: String,
        /// Type with the placeholder view on
        #[arg(long)]
        show_invisibles: bool,
        /// Start in Latin passthrough mode
        #[arg(long)]
        latin: bool,
        /// What to print
        #[arg(long, value_enum, default_value_t = Output::Text)]
        output: Output,
    },
    /// Show what one key emits under a modifier combination
    Resolve {
        /// Key code, e.g. `KeyA` or `Digit5`
        code: String,
        #[arg(long)]
        shift: bool,
        #[arg(long)]
        altgr: bool,
        #[arg(long)]
        caps: bool,
        /// Resolve the Latin variants
        #[arg(long)]
        latin: bool,
    },
    /// Print the keyboard layout
    Layout {
        #[arg(long, value_enum, default_value_t = LayoutFormat::Grid)]
        format: LayoutFormat,
    },
    /// Manage saved documents
    Docs {
        #[command(subcommand)]
        action: DocsAction,
    },
}

#[derive(Subcommand)]
enum DocsAction {
    /// List saved documents, newest first
    List,
    /// Print a saved document's content
    Show { id: String },
    /// Type a keystroke script into a new document and save it
    Save {
        #[arg(short, long)]
        title: Option<String>,
        script: String,
    },
    /// Delete a saved document
    Delete { id: String },
}

#[derive(ValueEnum, Clone, Copy)]
enum Output {
    /// Plain text, invisible markers shown as `·`
    Text,
    /// Persisted markup
    Markup,
    /// Plain text plus counts as JSON
    Json,
}

#[derive(ValueEnum, Clone, Copy)]
enum LayoutFormat {
    Grid,
    Json,
}

fn load_config(cli: &Cli) -> Result<KhmerConfig> {
    let mut config = match &cli.config {
        Some(path) => KhmerConfig::load_toml(path)
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => KhmerConfig::default(),
    };
    if let Some(store) = &cli.store {
        config.store_path = Some(store.display().to_string());
    }
    Ok(config)
}

fn visible(text: &str) -> String {
    text.replace(INVISIBLE_MARKER, "·")
}

fn type_script(engine: &mut ImeEngine<HeadlessHost>, script: &str) -> Result<usize> {
    let strokes = parse_script(script).context("parsing keystroke script")?;
    Ok(replay(engine, &strokes))
}

fn print_engine(engine: &ImeEngine<HeadlessHost>, output: Output) -> Result<()> {
    let surface = engine.surface();
    match output {
        Output::Text => {
            println!("{}", visible(&surface.plain_text()));
            let ctx = engine.context();
            println!("chars: {}  words: {}", ctx.char_count, ctx.word_count);
        }
        Output::Markup => println!("{}", surface.serialize_for_persistence()),
        Output::Json => {
            let value = serde_json::json!({
                "text": surface.plain_text(),
                "statistics": surface.statistics(),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(())
}

fn handle_resolve(code: &str, shift: bool, altgr: bool, caps: bool, latin: bool) -> Result<()> {
    let layout = khmer_layout()?;
    let Some(key) = layout.get(code) else {
        bail!("`{code}` is not in the layout");
    };
    let state = ModifierState::with_levels(shift, altgr, caps);
    let level = resolver::shift_level(code, &state, !latin);
    match resolver::resolve(key, &state, !latin) {
        Some(text) => {
            let scalars: Vec<String> = text.chars().map(|c| format!("U+{:04X}", c as u32)).collect();
            println!("{code} [{level:?}] -> {} ({})", visible(text), scalars.join(" "));
        }
        None => println!("{code} [{level:?}] -> (nothing)"),
    }
    Ok(())
}

fn handle_layout(format: LayoutFormat) -> Result<()> {
    let layout = khmer_layout()?;
    match format {
        LayoutFormat::Json => println!("{}", serde_json::to_string_pretty(layout.rows())?),
        LayoutFormat::Grid => {
            for row in layout.rows() {
                let cells: Vec<String> = row
                    .iter()
                    .map(|k| match &k.label {
                        Some(label) if !k.has_native_variant() => format!("[{label}]"),
                        _ => visible(&k.base),
                    })
                    .collect();
                println!("{}", cells.join(" "));
            }
        }
    }
    Ok(())
}

fn handle_docs(action: DocsAction, config: &KhmerConfig) -> Result<()> {
    let mut library = open_library(config).context("opening document library")?;
    match action {
        DocsAction::List => {
            if library.documents().is_empty() {
                println!("(no saved documents)");
            }
            for doc in library.documents() {
                println!("{}  {}  {}", doc.id, doc.timestamp, doc.title);
            }
        }
        DocsAction::Show { id } => {
            let Some(doc) = library.get(&id) else {
                bail!("no document with id `{id}`");
            };
            println!("{}", doc.content);
        }
        DocsAction::Save { title, script } => {
            let mut engine = create_headless_engine(config)?;
            type_script(&mut engine, &script)?;
            let saved = library.save(engine.surface(), title.as_deref())?;
            println!("saved {} ({})", saved.id, saved.title);
        }
        DocsAction::Delete { id } => {
            if !library.delete(&id)? {
                bail!("no document with id `{id}`");
            }
            println!("deleted {id}");
        }
    }
    Ok(())
}

fn repl_command(
    line: &str,
    engine: &mut ImeEngine<HeadlessHost>,
    library: &mut KhmerLibrary,
) -> Result<bool> {
    let (cmd, arg) = line.split_once(' ').unwrap_or((line, ""));
    match cmd {
        ":q" | ":quit" => return Ok(false),
        ":invisibles" => {
            let on = engine.toggle_invisibles();
            println!("invisibles view {}", if on { "on" } else { "off" });
        }
        ":latin" => {
            let native = engine.toggle_native_mode();
            println!("{} mode", if native { "Khmer" } else { "Latin" });
        }
        ":new" => {
            library.new_document(engine.surface_mut());
            engine.refresh();
        }
        ":save" => {
            let saved = library.save(engine.surface(), Some(arg))?;
            println!("saved {} ({})", saved.id, saved.title);
        }
        ":load" => {
            if library.load(arg.trim(), engine.surface_mut()) {
                engine.refresh();
            } else {
                println!("no document with id `{}`", arg.trim());
            }
        }
        ":markup" => println!("{}", engine.surface().serialize_for_persistence()),
        _ => println!("unknown command `{cmd}`"),
    }
    Ok(true)
}

fn run_repl(config: &KhmerConfig) -> Result<()> {
    let mut engine = create_headless_engine(config)?;
    let mut library = open_library(config)?;

    println!("libkhmer REPL - type keystroke scripts, e.g. `KeyK KeyA Space`");
    println!("Commands: :invisibles :latin :new :save TITLE :load ID :markup :quit");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with(':') {
            if !repl_command(line, &mut engine, &mut library)? {
                break;
            }
        } else if let Err(e) = type_script(&mut engine, line) {
            println!("error: {e:#}");
            continue;
        }
        let ctx = engine.context();
        println!(
            "{}  [{} chars, {} words]",
            visible(&engine.surface().plain_text()),
            ctx.char_count,
            ctx.word_count
        );
        stdout.flush()?;
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Some(Commands::Repl) | None => run_repl(&config),
        Some(Commands::Type {
            script,
            show_invisibles,
            latin,
            output,
        }) => {
            let mut engine = create_headless_engine(&config)?;
            if show_invisibles {
                engine.set_show_invisibles(true);
            }
            if latin {
                engine.set_native_mode(false);
            }
            let handled = type_script(&mut engine, &script)?;
            tracing::debug!(handled, "replayed script");
            print_engine(&engine, output)
        }
        Some(Commands::Resolve {
            code,
            shift,
            altgr,
            caps,
            latin,
        }) => handle_resolve(&code, shift, altgr, caps, latin),
        Some(Commands::Layout { format }) => handle_layout(format),
        Some(Commands::Docs { action }) => handle_docs(action, &config),
    }
}
