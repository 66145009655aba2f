use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use clap::Parser;
use fsh::config::ShellConfig;
use fsh::engine::FileOps;
use fsh::history::HistoryStore;
use fsh::shell::Shell;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "fsh")]
#[command(about = "A small shell for everyday file management")]
#[command(version)]
struct Cli {
    /// Run one command line and exit with its status
    #[arg(short = 'c')]
    command: Option<String>,

    /// Config file (default: ./fsh.toml when present)
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// History log path
    #[arg(long = "history")]
    history: Option<PathBuf>,

    /// off, error, warn, info, debug or trace
    #[arg(long = "log-level")]
    log_level: Option<String>,
}

fn init_logging(config: &ShellConfig, cwd: &std::path::Path) -> Result<(), String> {
    let Some(level) = config.level().map_err(|e| e.to_string())? else {
        return Ok(());
    };
    let builder = FmtSubscriber::builder().with_max_level(level).with_ansi(false);

    let log_file = config.log_file.as_ref().filter(|p| !p.as_os_str().is_empty());
    let result = match log_file {
        Some(path) => {
            let path = cwd.join(path);
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| format!("Cannot open log file: {}: {}", path.display(), e))?;
            tracing::subscriber::set_global_default(builder.with_writer(Mutex::new(file)).finish())
        }
        None => tracing::subscriber::set_global_default(builder.with_writer(io::stderr).finish()),
    };
    result.map_err(|e| e.to_string())
}

fn main() {
    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => {
            eprintln!("Error: Cannot determine the working directory: {}", e);
            std::process::exit(1);
        }
    };

    let mut config = match ShellConfig::discover(cli.config.as_deref(), &cwd) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(history) = cli.history {
        config.history_file = history;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    if let Err(e) = init_logging(&config, &cwd) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let history = HistoryStore::new(cwd.join(&config.history_file));
    if let Err(e) = history.ensure_exists() {
        eprintln!("Error: Cannot create history file: {}", e);
        std::process::exit(1);
    }
    tracing::info!(cwd = %cwd.display(), history = %history.path().display(), "session started");

    let mut shell = Shell::new(FileOps::native(&cwd), history);
    let stdout = io::stdout();
    let stderr = io::stderr();
    let status = match cli.command {
        Some(line) => shell.run_line(&line, &mut stdout.lock(), &mut stderr.lock()),
        None => shell.run(io::stdin().lock(), &mut stdout.lock(), &mut stderr.lock(), &config.prompt),
    };

    match status {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
