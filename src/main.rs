use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use colored::Colorize;
use runbun::server::{start_server, AppState};
use runbun::{render_update, validate_update_request, Config, FixedSlotLocator, HttpSheetsClient};
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "runbun")]
#[command(author, version, about = "Render Run & Bun nuzlocke runs into a Google spreadsheet")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service the companion app posts to
    Serve {
        /// Interface to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Config file (default: nearest .runbun/config.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the batchUpdate body an /updateRun payload would produce
    Preview {
        /// Payload file, or "-" for stdin
        payload: PathBuf,

        /// Treat every run as already present at this block slot
        #[arg(long)]
        slot: Option<usize>,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

fn read_payload(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut body = String::new();
        std::io::stdin()
            .read_to_string(&mut body)
            .context("failed to read payload from stdin")?;
        return Ok(body);
    }
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn serve(host: Option<String>, port: Option<u16>, config: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = Config::load(config.as_deref())?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if config.auth.api_password.is_empty() {
        eprintln!(
            "{} no API password configured, /updateRun will reject every request",
            "warning:".yellow().bold()
        );
    }

    let sheets = HttpSheetsClient::new(&config.sheets)?;
    start_server(AppState::new(config, Box::new(sheets)))?;
    Ok(())
}

fn preview(payload: PathBuf, slot: Option<usize>, pretty: bool) -> anyhow::Result<()> {
    let body = read_payload(&payload)?;
    let request = validate_update_request(&body)?;
    let (batch, summary) = render_update(&request, &FixedSlotLocator(slot))?;

    let json = if pretty {
        serde_json::to_string_pretty(&batch)?
    } else {
        serde_json::to_string(&batch)?
    };
    println!("{}", json);
    eprintln!(
        "{} {} requests ({} created, {} patched, {} pokemon cards)",
        "preview:".cyan().bold(),
        summary.requests,
        summary.created,
        summary.patched,
        summary.pokemon_cards
    );
    Ok(())
}

fn main() {
    runbun::logging::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Serve { host, port, config } => serve(host, port, config),
        Command::Preview {
            payload,
            slot,
            pretty,
        } => preview(payload, slot, pretty),
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "runbun", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
