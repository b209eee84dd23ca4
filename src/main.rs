//! conbuf - demo of the double-buffered console grid
//!
//! Draws a framed scene with centered and escape-colored text, commits it
//! in one flush, then asks for a number on the grid itself.
//!
//! # Quick Start
//!
//! ```text
//! conbuf                 # Draw on the current console
//! conbuf --headless      # Draw into memory and print the frame
//! conbuf -W 60 -H 15     # Fixed grid size
//! ```

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use conbuf::{
    Attribute, Color, Config as ConbufConfig, Console, ConsoleOption, Device, MemoryDevice,
    TerminalDevice, Vector2,
};

/// Command line options
#[derive(Default)]
struct Options {
    /// Draw into memory and print the frame instead of taking over the console
    headless: bool,
    /// Use the crossterm device even on a native console
    #[cfg_attr(not(windows), allow(dead_code))]
    terminal: bool,
    /// Config file overriding `~/.conbuf/config.toml`
    config_path: Option<PathBuf>,
    /// Grid size overrides
    width: Option<i32>,
    height: Option<i32>,
}

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Grid size used by `--headless` when none is given
const HEADLESS_SIZE: Vector2 = Vector2::new(60, 12);

/// Smallest grid the demo scene fits in
const MIN_SIZE: Vector2 = Vector2::new(40, 10);

fn print_version() {
    eprintln!("conbuf {}", VERSION);
}

fn print_help() {
    eprintln!("conbuf {} - double-buffered console grid demo", VERSION);
    eprintln!();
    eprintln!("Usage: conbuf [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --headless            Render into memory and print the frame");
    eprintln!("  -t, --terminal        Use the crossterm device on Windows too");
    eprintln!("  -c, --config <PATH>   Config file (default: ~/.conbuf/config.toml)");
    eprintln!("  -W, --width <N>       Grid width in characters");
    eprintln!("  -H, --height <N>      Grid height in characters");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Inline colors in drawn text:");
    eprintln!("  #FB                   Foreground F, background B (0-9, X keeps)");
    eprintln!();
    eprintln!("Logging: ~/.conbuf/conbuf.log, level from CONBUF_LOG (default: info)");
}

fn parse_dimension(args: &[String], i: usize, name: &str) -> Result<i32, String> {
    let value = args
        .get(i)
        .ok_or_else(|| format!("Missing {} argument", name))?;
    match value.parse::<i32>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(format!("Invalid {}: {} (expected a positive number)", name, value)),
    }
}

fn parse_args() -> Result<Options, String> {
    let args: Vec<String> = env::args().collect();
    let mut options = Options::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "--headless" => {
                options.headless = true;
            }
            "-t" | "--terminal" => {
                options.terminal = true;
            }
            "-c" | "--config" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing config argument".to_string());
                }
                options.config_path = Some(PathBuf::from(&args[i]));
            }
            "-W" | "--width" => {
                i += 1;
                options.width = Some(parse_dimension(&args, i, "width")?);
            }
            "-H" | "--height" => {
                i += 1;
                options.height = Some(parse_dimension(&args, i, "height")?);
            }
            arg => {
                return Err(format!("Unknown argument: {}. Use -h for help.", arg));
            }
        }
        i += 1;
    }

    Ok(options)
}

/// Log to a file so nothing is printed over the grid
fn init_logging() {
    let log_path = ConbufConfig::config_dir()
        .map(|dir| dir.join("conbuf.log"))
        .unwrap_or_else(|| PathBuf::from("conbuf.log"));

    // Create log directory if needed
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_env("CONBUF_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn main() -> anyhow::Result<()> {
    let options = match parse_args() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    init_logging();
    info!("conbuf {} starting...", VERSION);

    let mut config = match &options.config_path {
        Some(path) => ConbufConfig::load_from(path)?,
        None => ConbufConfig::load(),
    };
    // command line overrides the config file
    if options.width.is_some() {
        config.grid.width = options.width;
    }
    if options.height.is_some() {
        config.grid.height = options.height;
    }
    if let Err(message) = config.grid.validate() {
        bail!("Invalid config: {}", message);
    }

    if options.headless {
        let window = config.grid.resolve(HEADLESS_SIZE);
        let mut console = Console::with_config(MemoryDevice::new(window), &config)?;
        draw_scene(&mut console)?;
        console.flush()?;
        print!("{}", console.device().dump());
        return Ok(());
    }

    #[cfg(windows)]
    if !options.terminal {
        let device = conbuf::Win32Console::open()?;
        return run_interactive(device, &config);
    }

    run_interactive(TerminalDevice::open()?, &config)
}

/// Draw the scene, then prompt on the grid until a valid byte is entered
fn run_interactive<D: Device>(device: D, config: &ConbufConfig) -> anyhow::Result<()> {
    let mut console = Console::with_config(device, config)?;
    console.disable(ConsoleOption::Cursor)?;

    let prompt_row = draw_scene(&mut console)?;
    console.flush()?;

    let label = Attribute::fg(Color::WHITE);
    let value = loop {
        let span = console.draw_string(Vector2::new(2, prompt_row), label, "Pick a color (0-255): ")?;
        console.flush()?;

        match console.read_byte(Vector2::new(span.end(), prompt_row))? {
            Some(value) => break value,
            None => {
                console.draw_string(
                    Vector2::new(2, prompt_row + 1),
                    Attribute::fg(Color::RED | Color::INTENSE),
                    "Not a number between 0 and 255, try again",
                )?;
            }
        }
    };

    info!("Picked attribute word {:#04x}", value);
    let picked = Attribute::from_native_word(value as u16);
    console.draw_string(
        Vector2::new(2, prompt_row + 1),
        picked,
        format_args!(" attribute {:#04x} looks like this            ", value),
    )?;
    console.draw_string(Vector2::new(2, prompt_row + 2), label, "Press Enter to exit")?;
    console.flush()?;

    console.read_line(Vector2::new(0, prompt_row + 2))?;
    Ok(())
}

/// Draw the demo scene and return the row left free for the prompt
fn draw_scene<D: Device>(console: &mut Console<D>) -> anyhow::Result<i32> {
    let size = console.size();
    if size.x < MIN_SIZE.x || size.y < MIN_SIZE.y {
        bail!(
            "Grid {}x{} is too small for the demo (need {}x{})",
            size.x,
            size.y,
            MIN_SIZE.x,
            MIN_SIZE.y
        );
    }

    let frame = Attribute::fg(Color::CYAN);
    console.clear();
    console.hline(0, frame, '─');
    console.hline(size.y - 1, frame, '─');
    console.vline(0, frame, '│');
    console.vline(size.x - 1, frame, '│');
    console.character(Vector2::new(0, 0), frame, '┌');
    console.character(Vector2::new(size.x - 1, 0), frame, '┐');
    console.character(Vector2::new(0, size.y - 1), frame, '└');
    console.character(Vector2::new(size.x - 1, size.y - 1), frame, '┘');

    console
        .draw_string_centered(
            Vector2::new(size.x / 2, 0),
            Attribute::new(Color::BLACK, Color::CYAN),
            " conbuf ",
        )
        .context("drawing title")?;

    // all 16 colors as background swatches
    let swatch = console.draw_string(Vector2::new(2, 2), Attribute::fg(Color::WHITE), "Palette: ")?;
    for i in 0..16 {
        let color = Color::from_nibble(i);
        console.character(Vector2::new(swatch.end() + i as i32, 2), Attribute::new(color, color), ' ');
    }

    let text = "#60gold#70 text, #27green on white#70, \\#3 skipped";
    let len = console.string_len(text)?;
    let span = console.draw_string(Vector2::new(2, 4), Attribute::fg(Color::WHITE), text)?;
    console.draw_string(
        Vector2::new(span.end() + 1, 4),
        Attribute::fg(Color::WHITE),
        format_args!("#8X({} cells)", len),
    )?;

    console.draw_string_centered(
        Vector2::new(size.x / 2, 6),
        Attribute::fg(Color::GOLD | Color::INTENSE),
        "centered on the middle column",
    )?;

    Ok(size.y - 3)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_dimension() {
        let args = args(&["conbuf", "-W", "60", "0", "-3", "wide"]);
        assert_eq!(parse_dimension(&args, 2, "width"), Ok(60));
        assert!(parse_dimension(&args, 3, "width").is_err());
        assert!(parse_dimension(&args, 4, "width").is_err());
        assert!(parse_dimension(&args, 5, "width").is_err());
        assert_eq!(
            parse_dimension(&args, 6, "width"),
            Err("Missing width argument".to_string())
        );
    }
}
