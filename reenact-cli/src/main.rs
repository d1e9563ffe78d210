use std::io::Write;
use std::pin::pin;

use anyhow::Result;
use reenact::{
    EventKind, InputEvent, Player, PlayerConfig, Recorder, RecorderConfig, Recording, ReenactError,
};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::signal::ctrl_c;
use tokio_stream::StreamExt;
use tracing::error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const MACRO_FILE: &str = "macro.json";

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    println!("Reenact desktop macro recorder");
    println!("1 - record a new macro");
    println!("2 - play the last macro");
    println!("3 - show the macro file");
    println!("4 - exit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\nChoose an action: ");
        std::io::stdout().flush()?;

        let Some(choice) = lines.next_line().await? else {
            break;
        };
        match choice.trim() {
            "1" => {
                if let Err(err) = record(&mut lines).await {
                    error!("recording failed: {err:#}");
                }
            }
            "2" => {
                if let Err(err) = play().await {
                    error!("playback failed: {err:#}");
                }
            }
            "3" => show_file(),
            "4" => break,
            "" => {}
            other => println!("Invalid choice: {other}"),
        }
    }
    Ok(())
}

/// Record a macro until the operator presses Enter, then save it
async fn record(lines: &mut Lines<BufReader<Stdin>>) -> Result<()> {
    let mut recorder = Recorder::new(RecorderConfig::default());

    let mut events = recorder.event_stream();
    let progress = tokio::spawn(async move {
        while let Some(event) = events.next().await {
            print_progress(&event);
        }
    });

    recorder.start().await?;
    println!("Recording started. Press Enter in this window to stop and save...");
    let _ = lines.next_line().await?;
    recorder.stop().await?;
    progress.abort();

    let recording = recorder.recording();
    recording.save_to_file(MACRO_FILE)?;

    let stats = recording.stats();
    println!(
        "Saved {} events to {MACRO_FILE} (keys: {}, clicks: {}, moves: {})",
        recording.len(),
        stats.key_events,
        stats.mouse_clicks,
        stats.mouse_moves,
    );
    Ok(())
}

/// Load the last saved macro and replay it once
async fn play() -> Result<()> {
    let recording = match Recording::load_from_file(MACRO_FILE) {
        Ok(recording) => recording,
        Err(ReenactError::FileNotFound(path)) => {
            println!("Macro file {} does not exist! Record one first.", path.display());
            return Ok(());
        }
        Err(ReenactError::Parse { source, contents }) => {
            println!("Failed to parse the macro file: {source}");
            println!("File contents:");
            println!("{contents}");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };
    if recording.is_empty() {
        println!("Nothing to play!");
        return Ok(());
    }

    println!(
        "Replaying {} events. Switch to the target window within 3 seconds; Ctrl+C stops playback.",
        recording.len(),
    );
    let player = Player::new(PlayerConfig::default());
    let mut playing = pin!(player.play(&recording, false));
    tokio::select! {
        result = &mut playing => result?,
        _ = ctrl_c() => {
            println!("\nStopping playback...");
            player.cancel();
            playing.await?;
        }
    }
    println!("Playback finished.");
    Ok(())
}

/// Dump the raw macro file for inspection
fn show_file() {
    match std::fs::read_to_string(MACRO_FILE) {
        Ok(contents) => {
            println!("Contents of {MACRO_FILE}:");
            println!("{contents}");
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            println!("Macro file {MACRO_FILE} does not exist!");
        }
        Err(err) => println!("Failed to read {MACRO_FILE}: {err}"),
    }
}

/// One human-readable progress line per captured event
fn print_progress(event: &InputEvent) {
    match event.kind {
        EventKind::KeyPress => {
            let direction = if event.is_pressed { "pressed" } else { "released" };
            println!("Key {direction}: code={}", event.key_code);
        }
        EventKind::MouseClick => {
            let direction = if event.is_pressed { "pressed" } else { "released" };
            println!(
                "Mouse button {direction}: button={}, x={}, y={}",
                event.mouse_button, event.x, event.y
            );
        }
        EventKind::MouseMove => {
            println!("Cursor moved: x={}, y={}", event.x, event.y);
        }
    }
}
