use std::io::BufRead;
use std::thread;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::event::ScreenEvent;
use crate::main_loop::MainHandle;

/// Map a terminal line to a screen event
///
/// An empty line or `r` presses the capture control, `q` closes the screen.
pub fn parse_command(line: &str) -> Option<ScreenEvent> {
    match line.trim() {
        "" | "r" | "record" => Some(ScreenEvent::RecordPressed),
        "q" | "quit" => Some(ScreenEvent::Destroy),
        _ => None,
    }
}

/// Read capture commands from stdin on a dedicated thread
///
/// The thread is detached: a read blocked on an idle terminal does not hold
/// the process open once the screen is gone.
pub fn spawn_terminal_input(
    main: MainHandle<ScreenEvent>,
) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("clipcam-input".to_string())
        .spawn(move || forward_commands(std::io::stdin().lock(), &main))
}

/// Post commands read from `input` until quit, EOF, or a closed main loop
pub fn forward_commands<R: BufRead>(input: R, main: &MainHandle<ScreenEvent>) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to read input: {}", e);
                main.post(ScreenEvent::Destroy);
                return;
            }
        };

        match parse_command(&line) {
            Some(event) => {
                let quit = matches!(event, ScreenEvent::Destroy);
                if !main.post(event) || quit {
                    return;
                }
            }
            None => warn!("Unknown command {:?} (Enter = record, q = quit)", line.trim()),
        }
    }

    info!("Input closed");
    main.post(ScreenEvent::Destroy);
}

/// Destroy the screen on Ctrl+C
pub fn spawn_ctrl_c(main: MainHandle<ScreenEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupted");
                main.post(ScreenEvent::Destroy);
            }
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
    })
}
