//! Host commands: typed on stdin or raised by Ctrl+C, drained by the frame
//! loop at iteration boundaries.

use std::io::BufRead;
use std::str::FromStr;
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Recapture,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown command '{0}' (expected start, stop, recapture or quit)")]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" | "s" => Ok(Command::Start),
            "stop" | "x" => Ok(Command::Stop),
            "recapture" | "r" => Ok(Command::Recapture),
            "quit" | "q" | "exit" => Ok(Command::Quit),
            other => Err(UnknownCommand(other.to_string())),
        }
    }
}

/// Read commands from stdin, one per line, on a background thread.
///
/// Blank lines are skipped and unknown words are logged. The thread ends at
/// EOF or once the receiver is gone.
pub fn spawn_stdin_reader(tx: Sender<Command>) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("stdin-commands".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(command) => {
                        if tx.send(command).is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::warn!("{}", e),
                }
            }
            tracing::debug!("stdin command reader finished");
        })
}

/// Turn Ctrl+C into a `Quit` command
pub fn install_ctrlc(tx: Sender<Command>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        let _ = tx.send(Command::Quit);
    })
}
