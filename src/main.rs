use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use haven_gateway::voice::{AudioBlob, SpeechToText, Synthesizer, TextToSpeech, Transcriber};
use haven_gateway::{Config, Gateway};

/// Haven - voice companion gateway
#[derive(Parser)]
#[command(name = "haven", version, about)]
struct Cli {
    /// Port to listen on (overrides config)
    #[arg(long, env = "HAVEN_PORT")]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP gateway (default)
    Serve,
    /// Synthesize text with the configured voice and write an MP3
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
        /// Output file
        #[arg(short, long, default_value = "haven-tts-test.mp3")]
        out: PathBuf,
    },
    /// Transcribe an audio file with the configured recognizer
    Transcribe {
        /// Audio file (webm, ogg, wav, mp3, flac)
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let filter = match cli.verbose {
        0 => "info,haven_gateway=info",
        1 => "info,haven_gateway=debug",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load();
    if let Some(port) = cli.port {
        config.api_server.port = port;
    }
    tracing::debug!(?config, "loaded configuration");

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => Gateway::new(config)?.run().await?,
        Command::TestTts { text, out } => test_tts(&config, &text, &out).await?,
        Command::Transcribe { file } => transcribe(&config, &file).await?,
    }

    Ok(())
}

async fn test_tts(config: &Config, text: &str, out: &Path) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let tts = TextToSpeech::from_config(&config.voice, &config.api_keys, config.provider_timeout)?;

    println!("Synthesizing speech with {}...", tts.name());
    let mp3_data = tts.synthesize(text).await?;
    println!("Got {} bytes of audio data", mp3_data.len());

    std::fs::write(out, &mp3_data)?;
    println!("Wrote {}", out.display());

    Ok(())
}

async fn transcribe(config: &Config, file: &Path) -> anyhow::Result<()> {
    let stt = SpeechToText::from_config(&config.voice, &config.api_keys, config.provider_timeout)?;

    let bytes = std::fs::read(file)?;
    println!("Transcribing {} ({} bytes) with {}...", file.display(), bytes.len(), stt.name());

    let audio = AudioBlob::new(bytes, content_type_for(file).map(str::to_string));
    let transcript = stt.transcribe(&audio).await?;
    println!("{}", transcript.as_str());

    Ok(())
}

fn content_type_for(file: &Path) -> Option<&'static str> {
    let ext = file.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "webm" => Some("audio/webm"),
        "ogg" | "opus" => Some("audio/ogg"),
        "wav" => Some("audio/wav"),
        "mp3" => Some("audio/mpeg"),
        "flac" => Some("audio/flac"),
        _ => None,
    }
}
