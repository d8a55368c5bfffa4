use anyhow::{bail, Context};
use hotspot_core::{HotspotSet, Size, TimeUs};
use hotspot_player::{logging, MpvVideoSource, PlayerCommand, PlayerConfig, PlayerDriver};
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

const USAGE: &str = "usage: hotspot_player <video> [hotspots.json] [--config <player.json>]";

struct Args {
    video: String,
    hotspots: Option<String>,
    config: Option<String>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut positional = vec![];
    let mut config = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => config = Some(args.next().context("--config needs a path")?),
            "-h" | "--help" => bail!(USAGE),
            _ => positional.push(arg),
        }
    }
    let mut positional = positional.into_iter();
    let Some(video) = positional.next() else {
        bail!(USAGE);
    };
    Ok(Args {
        video,
        hotspots: positional.next(),
        config,
    })
}

/// One line of stdin to a driver command.
fn parse_command(line: &str) -> anyhow::Result<PlayerCommand> {
    let mut words = line.split_whitespace();
    let verb = words.next().unwrap_or_default();
    let mut arg = || words.next().context("missing argument");
    Ok(match verb {
        "play" => PlayerCommand::Play,
        "pause" => PlayerCommand::Pause,
        "toggle" => PlayerCommand::TogglePlay,
        "seek" => PlayerCommand::Seek(TimeUs::parse_mmss(arg()?)?),
        "edit" => PlayerCommand::ToggleEditMode,
        "add" => PlayerCommand::SetCreating(true),
        "place" => PlayerCommand::ClickSurface,
        "click" => PlayerCommand::ClickHotspot(arg()?.parse::<Uuid>()?),
        "delete" => PlayerCommand::DeleteHotspot(arg()?.parse::<Uuid>()?),
        "dismiss" => PlayerCommand::DismissMessage,
        "quit" | "exit" => PlayerCommand::Shutdown,
        other => bail!("unknown command {other:?}"),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let args = parse_args()?;

    let config = match &args.config {
        Some(path) => PlayerConfig::load_from_file(path)
            .with_context(|| format!("loading config {path}"))?,
        None => PlayerConfig::default(),
    };
    let hotspots: HotspotSet = match &args.hotspots {
        Some(path) => serde_json::from_str(
            &std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?,
        )?,
        None => HotspotSet::default(),
    };

    hotspots
        .validate(None)
        .context("hotspot file is not a valid set")?;

    let mut video = MpvVideoSource::spawn(&config).await?;
    video.load_file(&args.video)?;

    let (driver, handle) = PlayerDriver::new(args.video.clone(), video, hotspots, &config);
    let task = driver.spawn();
    handle
        .send(PlayerCommand::ResizeViewport(Size::new(1280.0, 720.0)))
        .await?;

    let mut snapshots = handle.subscribe();
    tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let line = serde_json::to_string(&*snapshots.borrow_and_update());
            if let Ok(line) = line {
                println!("{line}");
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match parse_command(&line) {
            Ok(PlayerCommand::Shutdown) => break,
            Ok(command) => handle.send(command).await?,
            Err(e) => eprintln!("{e}"),
        }
    }

    handle.shutdown().await?;
    let mut video = task.await?;
    video.stop().await;
    Ok(())
}
