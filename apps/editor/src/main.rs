use std::{pin::Pin, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{EditorController, EditorError, EditorEvent, ReconnectPolicy};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    time::Sleep,
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

mod command;
mod render;

use command::{parse_line, EditorCommand, HELP};
use render::render_sequence;

#[derive(Parser, Debug)]
#[command(about = "Terminal editor for a controller's motion sequence")]
struct Args {
    /// Controller page URL; the sync socket is `/ws` on the same host.
    #[arg(long, default_value = "http://127.0.0.1:8080/")]
    url: Url,
    /// Reconnect this many milliseconds after the connection drops.
    #[arg(long)]
    reconnect_delay_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let reconnect_policy = args
        .reconnect_delay_ms
        .map(|ms| ReconnectPolicy::FixedDelay(Duration::from_millis(ms)))
        .unwrap_or_default();
    let mut controller = EditorController::new().with_reconnect_policy(reconnect_policy);

    info!(url = %args.url, ?reconnect_policy, "editor starting");
    if let Err(err) = controller.connect(&args.url).await {
        println!("error: {err}");
    }
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut reconnect: Option<Pin<Box<Sleep>>> = None;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                match parse_line(&line) {
                    Ok(None) => {}
                    Ok(Some(EditorCommand::Quit)) => break,
                    Ok(Some(command)) => run_command(&mut controller, command).await?,
                    Err(err) => println!("error: {err}"),
                }
            }
            Some(event) = controller.next_event() => {
                report(&event);
                if let EditorEvent::Error(EditorError::ChannelClosed { .. }) = event {
                    if let Some(delay) = controller.reconnect_policy().delay() {
                        println!("reconnecting in {} ms", delay.as_millis());
                        reconnect = Some(Box::pin(tokio::time::sleep(delay)));
                    }
                }
            }
            _ = async {
                if let Some(sleep) = reconnect.as_mut() {
                    sleep.await;
                }
            }, if reconnect.is_some() => {
                reconnect = None;
                if let Err(err) = controller.reconnect().await {
                    println!("error: {err}");
                }
            }
        }
    }

    controller.disconnect().await;
    Ok(())
}

async fn run_command(controller: &mut EditorController, command: EditorCommand) -> Result<()> {
    match command {
        EditorCommand::Show => print!("{}", render_sequence(controller.sequence())),
        EditorCommand::Json => println!("{}", serde_json::to_string_pretty(controller.sequence())?),
        EditorCommand::Help => println!("{HELP}"),
        EditorCommand::Edit(intent) => match controller.apply_intent(intent) {
            Ok(()) => print!("{}", render_sequence(controller.sequence())),
            Err(err) => println!("error: {err}"),
        },
        EditorCommand::Save => match controller.on_save().await {
            Ok(()) => println!("save sent"),
            Err(err) => println!("error: {err}"),
        },
        EditorCommand::Quit => {}
    }
    Ok(())
}

fn report(event: &EditorEvent) {
    match event {
        EditorEvent::SequenceReplaced(sequence) => {
            println!("sequence received from controller");
            print!("{}", render_sequence(sequence));
        }
        EditorEvent::SequenceEdited(sequence) => print!("{}", render_sequence(sequence)),
        EditorEvent::SaveSent => println!("save sent"),
        EditorEvent::Error(err) => println!("error: {err}"),
    }
}
