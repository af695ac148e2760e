//! Binary entrypoint for the keynav command-line client.
use std::{
    path::{Path, PathBuf},
    process,
};

use clap::{Parser, Subcommand};
use keynav_protocol::{Command as Request, Response};
use keynav_server::{Client, default_socket_path};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(
    name = "keynav",
    about = "Send commands to the keynav daemon",
    version,
    after_help = "Daemon commands: ping, start, stop, idle, status, config,\n\
                  hints [actions|scroll|left_click|right_click|double_click|middle_click|move_mouse],\n\
                  grid, action [left_click|right_click|middle_click|mouse_down|mouse_up|scroll]..."
)]
/// Command-line interface for the `keynav` binary.
struct Cli {
    /// What to do.
    #[command(subcommand)]
    command: Command,

    /// Socket path of the daemon
    #[arg(long, global = true)]
    socket: Option<String>,

    /// Logging controls
    #[command(flatten)]
    log: logging::LogArgs,
}

#[derive(Subcommand, Debug)]
/// Top-level CLI subcommands.
enum Command {
    /// Load and validate the configuration then exit.
    Check {
        /// Path to configuration file to check (defaults to the search path)
        path: Option<PathBuf>,

        /// Dump the parsed configuration as JSON to stdout
        #[arg(long)]
        dump: bool,
    },
    /// Any other word is sent to the daemon with its arguments.
    #[command(external_subcommand)]
    Daemon(Vec<String>),
}

/// Print a response the way users read it: data as pretty JSON, otherwise
/// the message. Returns the process exit code.
fn report(resp: &Response) -> i32 {
    if resp.success {
        match &resp.data {
            Some(data) => match serde_json::to_string_pretty(data) {
                Ok(s) => println!("{s}"),
                Err(_) => println!("{data}"),
            },
            None if !resp.message.is_empty() => println!("{}", resp.message),
            None => {}
        }
        0
    } else {
        eprintln!("error: {}", resp.message);
        1
    }
}

fn check(path: Option<&Path>, dump: bool) -> i32 {
    match config::load(path) {
        Ok(loaded) => {
            if dump {
                match serde_json::to_string_pretty(&loaded.config.to_json()) {
                    Ok(s) => println!("{s}"),
                    Err(e) => {
                        eprintln!("failed to render config: {e}");
                        return 1;
                    }
                }
            } else {
                println!("config ok: {}", loaded.source());
            }
            0
        }
        Err(e) => {
            eprintln!("{}", e.pretty());
            1
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log);

    let code = match cli.command {
        Command::Check { path, dump } => check(path.as_deref(), dump),
        Command::Daemon(words) => {
            let mut words = words.into_iter();
            let Some(action) = words.next() else {
                eprintln!("error: no command given");
                process::exit(2);
            };
            let req = Request::new(action, words);
            let socket = cli.socket.unwrap_or_else(default_socket_path);
            debug!(action = %req.action, socket = %socket, "sending command");
            match Client::new_with_socket(socket).send(&req).await {
                Ok(resp) => report(&resp),
                Err(e) => {
                    eprintln!("error: {e}");
                    1
                }
            }
        }
    };
    process::exit(code);
}
