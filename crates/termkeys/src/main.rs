//! termkeys - headless driver for the virtual key row
//!
//! Replays a pointer-event script against the configured layout and writes
//! the bytes a terminal would receive.
//!
//! Usage:
//!
//! ```text
//! termkeys [--raw] [--config-dir DIR] [SCRIPT]   replay SCRIPT (stdin when omitted or `-`)
//! termkeys --init                                write the default config file
//! termkeys --get NAME                            print a setting by its flat name
//! termkeys --set SECTION.KEY=VALUE               update one key in the config file
//! ```

mod script;

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use script::{parse_script, Step};
use settings::ConfigWatcher;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Instant;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};
use virtual_keys::{
    KeyClick, KeyMatrix, OverlayPopup, PointerEvent, TerminalKeyEncoder, TerminalSink,
    VirtualKeysView, WriterSink,
};

/// Startup time for the summary line
static STARTUP_TIME: Lazy<Instant> = Lazy::new(Instant::now);

/// Check if debug mode is enabled via environment variable.
fn is_debug_mode() -> bool {
    std::env::var("TERMKEYS_DEBUG").is_ok()
}

/// Initialize the logging system. Logs go to stderr so stdout carries only
/// terminal bytes.
fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default_filter = if is_debug_mode() {
        "termkeys=trace,virtual_keys=trace,settings=debug,theme=debug,info"
    } else {
        "termkeys=info,warn"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_line_number(true),
        )
        .with(filter)
        .init();

    if is_debug_mode() {
        info!(
            "termkeys v{} starting up (DEBUG MODE ENABLED)",
            env!("CARGO_PKG_VERSION")
        );
    } else {
        debug!("termkeys v{} starting up", env!("CARGO_PKG_VERSION"));
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Replay,
    Init,
    Get(String),
    Set {
        section: String,
        key: String,
        value: String,
    },
}

struct Args {
    command: Command,
    raw: bool,
    config_dir: Option<PathBuf>,
    script: Option<PathBuf>,
}

fn parse_assignment(arg: &str) -> Result<Command> {
    let (path, value) = arg
        .split_once('=')
        .with_context(|| format!("expected SECTION.KEY=VALUE, got {arg:?}"))?;
    let (section, key) = path
        .split_once('.')
        .with_context(|| format!("expected SECTION.KEY, got {path:?}"))?;
    Ok(Command::Set {
        section: section.trim().to_string(),
        key: key.trim().to_string(),
        value: value.trim().to_string(),
    })
}

/// Typed TOML value for a command-line string.
fn toml_value(raw: &str) -> toml_edit::Value {
    if let Ok(b) = raw.parse::<bool>() {
        b.into()
    } else if let Ok(i) = raw.parse::<i64>() {
        i.into()
    } else if let Ok(f) = raw.parse::<f64>() {
        f.into()
    } else {
        raw.into()
    }
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let mut parsed = Self {
            command: Command::Replay,
            raw: false,
            config_dir: None,
            script: None,
        };
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--raw" => parsed.raw = true,
                "--config-dir" => {
                    let dir = args.next().context("--config-dir needs a directory")?;
                    parsed.config_dir = Some(PathBuf::from(dir));
                }
                "--init" => parsed.command = Command::Init,
                "--get" => {
                    let name = args.next().context("--get needs a setting name")?;
                    parsed.command = Command::Get(name);
                }
                "--set" => {
                    let assignment = args.next().context("--set needs SECTION.KEY=VALUE")?;
                    parsed.command = parse_assignment(&assignment)?;
                }
                "-" => parsed.script = None,
                flag if flag.starts_with("--") => bail!("unknown flag {flag}"),
                path => parsed.script = Some(PathBuf::from(path)),
            }
        }
        Ok(parsed)
    }

    fn read_script(&self) -> Result<String> {
        match &self.script {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read script {:?}", path)),
            None => {
                let mut input = String::new();
                std::io::stdin()
                    .read_to_string(&mut input)
                    .context("Failed to read script from stdin")?;
                Ok(input)
            }
        }
    }
}

/// Writes each keystroke as an escaped line, for humans.
struct EscapedSink<W: Write>(W);

impl<W: Write> TerminalSink for EscapedSink<W> {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        writeln!(self.0, "{}", bytes.escape_ascii()).context("Failed to write output")
    }
}

/// Configured layout, falling back to the stock one.
fn load_matrix(config: &settings::Config) -> KeyMatrix {
    let path = config
        .virtual_keys
        .layout
        .clone()
        .unwrap_or_else(termkeys_paths::layout_file);
    if !path.exists() {
        return virtual_keys::default_layout();
    }
    match virtual_keys::load_layout(&path) {
        Ok(matrix) => {
            info!("Loaded layout from {:?}", path);
            matrix
        }
        Err(e) => {
            warn!("Using default layout: {:#}", e);
            virtual_keys::default_layout()
        }
    }
}

fn load_theme(config: &settings::Config) -> theme::Theme {
    let mut registry = theme::ThemeRegistry::new();
    let dir = termkeys_paths::themes_dir();
    if dir.is_dir() {
        if let Err(e) = registry.load_dir(&dir) {
            warn!("Failed to load themes: {:#}", e);
        }
    }
    registry
        .resolve(&config.appearance.theme)
        .with_amoled(config.appearance.amoled)
}

struct Driver<S> {
    view: VirtualKeysView,
    clicks: mpsc::Receiver<KeyClick>,
    encoder: TerminalKeyEncoder<S>,
}

impl<S: TerminalSink> Driver<S> {
    fn new(config: &settings::Config, sink: S) -> Self {
        let theme = load_theme(config);
        let mut view = VirtualKeysView::new(Handle::current());
        view.apply_settings(config);
        view.set_ui_colors(theme.ui_colors());
        view.set_button_colors(theme.button_colors());
        view.set_popup_presenter(OverlayPopup::new());
        view.reload(load_matrix(config));

        let (tx, clicks) = mpsc::channel();
        view.set_click_handler(move |click| {
            let _ = tx.send(click.clone());
        });

        Self {
            view,
            clicks,
            encoder: TerminalKeyEncoder::new(sink),
        }
    }

    fn pointer(&mut self, key: &script::KeyRef, event: PointerEvent) -> Result<()> {
        let id = key
            .resolve(self.view.matrix())
            .with_context(|| format!("no key {:?} in layout", key))?;
        self.view.handle_pointer(id, event);
        Ok(())
    }

    /// Encode clicks delivered so far, reading modifiers once per keystroke.
    fn flush(&mut self) -> Result<()> {
        self.view.process_timer_events();
        while let Ok(click) = self.clicks.try_recv() {
            let mods = self.view.read_modifiers(true);
            self.encoder.send_key(&click.key, mods)?;
        }
        for refresh in self.view.take_refreshes() {
            debug!("Button {} active={}", refresh.button, refresh.active);
        }
        Ok(())
    }

    async fn run(&mut self, steps: Vec<Step>, watcher: Option<ConfigWatcher>) -> Result<()> {
        for step in steps {
            match &step {
                Step::Down(key) => self.pointer(key, PointerEvent::Down)?,
                Step::Up(key) => self.pointer(key, PointerEvent::Up)?,
                Step::Tap(key) => {
                    self.pointer(key, PointerEvent::Down)?;
                    self.pointer(key, PointerEvent::Up)?;
                }
                Step::Move(key, y) => self.pointer(key, PointerEvent::Move { y: *y })?,
                Step::Cancel(key) => self.pointer(key, PointerEvent::Cancel)?,
                Step::Wait(duration) => {
                    let deadline = tokio::time::sleep(*duration);
                    tokio::pin!(deadline);
                    loop {
                        tokio::select! {
                            _ = &mut deadline => break,
                            _ = self.view.next_timer_event() => self.flush()?,
                        }
                    }
                }
                Step::Type(text) => {
                    self.flush()?;
                    let mods = self.view.read_modifiers(true);
                    self.encoder.send_text(text, mods)?;
                }
            }
            self.flush()?;

            if let Some(config) = watcher.as_ref().and_then(|w| w.poll()) {
                info!("Config changed, reapplying");
                self.view.apply_settings(&config);
            }
        }
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let _ = *STARTUP_TIME;
    init_logging();

    let args = Args::parse(std::env::args().skip(1))?;
    if let Some(dir) = args.config_dir.clone() {
        termkeys_paths::set_config_dir(dir);
    }

    match &args.command {
        Command::Replay => {}
        Command::Init => {
            let path = settings::ensure_config_file().context("Failed to create config file")?;
            println!("{}", path.display());
            return Ok(());
        }
        Command::Get(name) => {
            let value = settings::load_config()
                .legacy_value(name)
                .with_context(|| format!("unknown setting {name:?}"))?;
            println!("{value}");
            return Ok(());
        }
        Command::Set {
            section,
            key,
            value,
        } => {
            return settings::save_setting(section, key, toml_value(value));
        }
    }

    let steps = parse_script(&args.read_script()?)?;
    let config = settings::load_config();
    let watcher = settings::watch_config(settings::config_path());

    if args.raw {
        Driver::new(&config, WriterSink(std::io::stdout().lock()))
            .run(steps, watcher)
            .await?;
    } else {
        Driver::new(&config, EscapedSink(std::io::stdout().lock()))
            .run(steps, watcher)
            .await?;
    }

    debug!("Finished in {:?}", STARTUP_TIME.elapsed());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args> {
        Args::parse(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_flags_and_script() {
        let parsed = args(&["--raw", "keys.txt"]).unwrap();
        assert!(parsed.raw);
        assert_eq!(parsed.script, Some(PathBuf::from("keys.txt")));
    }

    #[test]
    fn config_dir_takes_a_value() {
        let parsed = args(&["--config-dir", "/tmp/tk"]).unwrap();
        assert_eq!(parsed.config_dir, Some(PathBuf::from("/tmp/tk")));
        assert!(args(&["--config-dir"]).is_err());
    }

    #[test]
    fn parses_settings_commands() {
        assert_eq!(args(&["--init"]).unwrap().command, Command::Init);
        assert_eq!(
            args(&["--get", "vibrate"]).unwrap().command,
            Command::Get("vibrate".into())
        );
        assert_eq!(
            args(&["--set", "virtual-keys.repeat-delay-ms=50"]).unwrap().command,
            Command::Set {
                section: "virtual-keys".into(),
                key: "repeat-delay-ms".into(),
                value: "50".into(),
            }
        );
        assert!(args(&["--set", "vibrate"]).is_err());
        assert!(args(&["--set", "vibrate=false"]).is_err());
    }

    #[test]
    fn toml_values_are_typed() {
        assert_eq!(toml_value("true").as_bool(), Some(true));
        assert_eq!(toml_value("80").as_integer(), Some(80));
        assert_eq!(toml_value("0.5").as_float(), Some(0.5));
        assert_eq!(toml_value("Dracula").as_str(), Some("Dracula"));
    }

    #[test]
    fn dash_means_stdin() {
        assert_eq!(args(&["-"]).unwrap().script, None);
    }

    #[test]
    fn rejects_unknown_flags() {
        assert!(args(&["--fast"]).is_err());
    }

    #[test]
    fn escaped_sink_writes_one_line_per_keystroke() {
        let mut sink = EscapedSink(Vec::new());
        sink.write_bytes(b"\x1b[A").unwrap();
        sink.write_bytes(b"x").unwrap();
        assert_eq!(String::from_utf8(sink.0).unwrap(), "\\x1b[A\nx\n");
    }

    #[tokio::test(start_paused = true)]
    async fn replays_script_into_bytes() {
        let steps = parse_script("tap CTRL\ntap c\ndown UP\nwait 500\nup UP\n").unwrap();
        let mut driver = Driver::new(&settings::Config::default(), Vec::new());
        driver.view.reload(virtual_keys::parse_layout(r#"[["CTRL", "c", "UP"]]"#).unwrap());
        driver.run(steps, None).await.unwrap();

        let bytes = driver.encoder.into_sink();
        assert!(bytes.starts_with(b"\x03\x1b[A\x1b[A"), "{:?}", bytes.escape_ascii().to_string());
    }

    #[tokio::test(start_paused = true)]
    async fn repeats_reach_the_sink_while_waiting() {
        let steps = parse_script("down UP\nwait 500\n").unwrap();
        let mut driver = Driver::new(&settings::Config::default(), Vec::new());
        driver.view.reload(virtual_keys::parse_layout(r#"[["UP"]]"#).unwrap());
        driver.run(steps, None).await.unwrap();

        assert_eq!(driver.encoder.sink().as_slice(), b"\x1b[A\x1b[A");
    }
}
