use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use owo_colors::OwoColorize;
use prosa::repl;
use prosa::session::Session;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "prosa")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Prosa language interpreter", long_about = None)]
struct Args {
    /// Script to execute; with no script an interactive session starts.
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    #[arg(long = "color", value_name = "WHEN", default_value = "auto")]
    color: ColorChoice,

    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Complete {
        #[arg(value_name = "SHELL")]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl std::str::FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            _ => Err(format!(
                "Invalid color choice: {}. Must be 'auto', 'always', or 'never'",
                s
            )),
        }
    }
}

struct AppConfig {
    color_enabled: bool,
    verbose: bool,
}

impl AppConfig {
    fn from_args(args: &Args) -> Self {
        let color_enabled = match args.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => atty::is(atty::Stream::Stderr) && atty::is(atty::Stream::Stdout),
        };
        AppConfig {
            color_enabled,
            verbose: args.verbose,
        }
    }
}

fn main() {
    let args = Args::parse();

    if let Some(Commands::Complete { shell }) = args.command {
        generate_completions(shell);
        return;
    }

    let config = AppConfig::from_args(&args);
    verbose_log(&config, "Starting prosa");

    match &args.file {
        Some(path) => run_file(path, &config),
        None => run_interactive(&config),
    }
}

fn run_file(path: &Path, config: &AppConfig) {
    let source = match read_file(path) {
        Ok(source) => source,
        Err(message) => {
            error_message(config, &message);
            std::process::exit(1);
        }
    };
    verbose_log(
        config,
        &format!("Read {} bytes from {}", source.len(), path.display()),
    );

    let mut session = Session::new();
    let label = path.display().to_string();
    match session.execute(&source, &label) {
        Ok(execution) => {
            print!("{}", execution.stdout);
            io::stdout().flush().ok();
            eprint!("{}", execution.stderr);
            if !execution.succeeded() {
                std::process::exit(1);
            }
        }
        Err(request) => {
            verbose_log(config, "Script requested termination");
            std::process::exit(request.code);
        }
    }
}

fn run_interactive(config: &AppConfig) {
    println!(
        "Prosa {} (interpretador interativo)\nDigite 'sair()' para sair.",
        env!("CARGO_PKG_VERSION")
    );
    verbose_log(config, "Entering interactive session");
    let session = Session::new();
    if let Some(request) = repl::run(session) {
        std::process::exit(request.code);
    }
}

fn generate_completions(shell: Shell) {
    let mut cmd = Args::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, &bin_name, &mut io::stdout());
}

fn read_file(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))
}

fn verbose_log(config: &AppConfig, message: &str) {
    if config.verbose {
        eprintln!("[prosa:debug] {}", message);
    }
}

fn error_message(config: &AppConfig, message: &str) {
    if config.color_enabled {
        eprintln!("{}", message.red().bold());
    } else {
        eprintln!("{}", message);
    }
}
