use std::{
    fs,
    io::{self, BufRead, BufReader, Write},
    path::{Path, PathBuf},
    thread::JoinHandle,
};

use clap::{Parser, Subcommand};
use natya_pose_core::{
    AppConfig, LandmarkFrame, PoseType, ScoringSession, SpeechSink, VoiceChannel,
};
use tracing_subscriber::EnvFilter;

fn main() -> natya_pose_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Score {
            frames,
            pose,
            config,
        } => run_score(&frames, pose.as_deref(), config.as_deref()),
        Commands::Capture {
            frame,
            pose,
            output,
        } => run_capture(&frame, &pose, output.as_deref()),
        Commands::Profiles { config } => run_profiles(config.as_deref()),
    }
}

fn run_score(
    frames: &Path,
    pose: Option<&str>,
    config: Option<&Path>,
) -> natya_pose_core::Result<()> {
    let config = load_config(config)?;
    let mut session = ScoringSession::from_config(&config)?;
    if let Some(pose) = pose {
        let pose: PoseType = pose.parse()?;
        if !session.select(pose) {
            tracing::warn!(%pose, "no reference set for selected pose");
        }
    }
    tracing::info!(?frames, pose = %session.active_pose(), "scoring recorded frames");

    let voice = VoiceChannel::new(LogSink);
    let mut speech: Option<JoinHandle<()>> = None;
    let reader = BufReader::new(fs::File::open(frames)?);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let frame: Option<LandmarkFrame> = serde_json::from_str(&line)?;
        let outcome = session.process(&frame.unwrap_or_default());

        tracing::debug!(
            frame = index,
            status = %outcome.report.status,
            overall = outcome.report.overall,
            "evaluated frame"
        );
        for text in outcome.utterances() {
            if let Some(handle) = voice.request(text) {
                // The channel only accepts a request once the previous worker is done.
                if let Some(previous) = speech.replace(handle) {
                    join_speech(previous);
                }
            }
        }

        serde_json::to_writer(&mut out, &outcome)?;
        writeln!(out)?;
    }

    if let Some(handle) = speech {
        join_speech(handle);
    }

    tracing::info!(level = %session.level(), "finished scoring");
    Ok(())
}

fn join_speech(handle: JoinHandle<()>) {
    if handle.join().is_err() {
        tracing::warn!("speech worker panicked");
    }
}

fn run_capture(frame: &Path, pose: &str, output: Option<&Path>) -> natya_pose_core::Result<()> {
    let pose: PoseType = pose.parse()?;
    let frame: LandmarkFrame = serde_json::from_str(&fs::read_to_string(frame)?)?;

    let mut session = ScoringSession::new();
    let profile = session.capture(pose, &frame)?;
    let json = serde_json::to_string_pretty(&profile)?;

    match output {
        Some(path) => {
            fs::write(path, json)?;
            tracing::info!(?path, %pose, "wrote reference profile");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run_profiles(config: Option<&Path>) -> natya_pose_core::Result<()> {
    let config = load_config(config)?;
    let session = ScoringSession::from_config(&config)?;
    let json = serde_json::to_string_pretty(&session.store().profiles())?;
    println!("{json}");
    Ok(())
}

fn load_config(path: Option<&Path>) -> natya_pose_core::Result<AppConfig> {
    match path {
        Some(path) => {
            tracing::info!(?path, "loading configuration");
            AppConfig::load(path)
        }
        None => Ok(AppConfig::default()),
    }
}

/// Stands in for a text-to-speech backend by logging each utterance.
struct LogSink;

impl SpeechSink for LogSink {
    fn speak(&self, text: &str) -> natya_pose_core::Result<()> {
        tracing::info!(text, "speak");
        Ok(())
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Bharatanatyam stance scoring", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score a JSON-lines file of landmark frames against a reference stance.
    Score {
        /// One `{"landmarks": [...]}` object per line.
        frames: PathBuf,
        /// Pose to score against (Araimandi, Muzhumandi or Samapadam).
        #[arg(short, long)]
        pose: Option<String>,
        /// Optional JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Capture a reference profile from a single landmark frame.
    Capture {
        /// JSON file holding one landmark frame.
        frame: PathBuf,
        /// Pose the frame demonstrates.
        #[arg(short, long)]
        pose: String,
        /// Where to write the profile. Printed to stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the effective reference stances.
    Profiles {
        /// Optional JSON configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
