use anyhow::{bail, Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use mora::args::{Cli, Commands};
use mora::config::{MoraConfig, VocoderConfig};
use mora::features::MelFeatures;
use mora::phoneme::{classify, PhoneticTable};
use mora::render::Vocoder;
use mora::selector::SynthesisRequest;
use mora::vocoder::strategy_by_name;
use mora::{analysis, audio};
use std::path::{Path, PathBuf};
use std::process;

const PROFILES_FILE: &str = "profiles.kdl";

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        log::error!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let mora_config = load_config(cli.config.as_deref())?;
    let config = mora_config.apply(VocoderConfig::default());

    match cli.command {
        Commands::Analyze { audio: audio_path, features } => {
            let input = audio::load_audio(&audio_path)
                .with_context(|| format!("Failed to load audio from {}", audio_path.display()))?;
            if input.sample_rate != config.sample_rate {
                log::warn!(
                    "{} is {}Hz, analysing as if it were {}Hz",
                    audio_path.display(),
                    input.sample_rate,
                    config.sample_rate
                );
            }
            let frames = analysis::analyze(&input.samples, &config).context("Mel analysis failed")?;
            MelFeatures::new(frames, &config).save(&features)?;
        }
        Commands::Render { features, out_file, phoneme_data, tokens, strategy } => {
            let mel = MelFeatures::load(&features)?;
            mel.check_framing(&config)?;

            let mut vocoder = Vocoder::new(config.clone());
            let has_phoneme_training_data = match &phoneme_data {
                Some(dir) => {
                    let available = has_training_data(dir);
                    if available {
                        if let Some(table) = load_measured(dir, &mora_config)? {
                            vocoder = vocoder.with_measured(table);
                        }
                    }
                    available
                }
                None => false,
            };
            if let Some(name) = strategy {
                let Some(chosen) = strategy_by_name(&name) else {
                    bail!("Unknown strategy '{}'", name);
                };
                vocoder = vocoder.with_chain(vec![chosen]);
            }

            let request = SynthesisRequest {
                has_phoneme_training_data,
                token_count: tokens.unwrap_or(mel.token_count),
            };
            let output = vocoder.render(&mel.frames, &request).context("Rendering failed")?;
            audio::save_audio(&out_file, &output)
                .with_context(|| format!("Failed to save audio to {}", out_file.display()))?;
        }
        Commands::Classify { features } => {
            let mel = MelFeatures::load(&features)?;
            for (i, frame) in mel.frames.frames().enumerate() {
                println!("{}\t{}", i, classify(frame));
            }
        }
    }
    Ok(())
}

fn load_config(explicit: Option<&Path>) -> Result<MoraConfig> {
    let path: Option<PathBuf> = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => ProjectDirs::from("com", "mora", "mora")
            .map(|dirs| dirs.config_dir().join("config.kdl"))
            .filter(|path| path.exists()),
    };
    match path {
        Some(path) => {
            log::info!("Loading config from {}", path.display());
            MoraConfig::load(&path).with_context(|| format!("Failed to load config {}", path.display()))
        }
        None => Ok(MoraConfig::default()),
    }
}

/// A phoneme directory only counts when it exists and holds at least one entry.
fn has_training_data(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

fn load_measured(dir: &Path, mora_config: &MoraConfig) -> Result<Option<PhoneticTable>> {
    let mut overrides = mora_config.profiles.clone();
    let profiles_path = dir.join(PROFILES_FILE);
    if profiles_path.exists() {
        overrides.extend(MoraConfig::load(&profiles_path)?.profiles);
    }
    if overrides.is_empty() {
        log::warn!("{} has no measured profiles", dir.display());
        return Ok(None);
    }
    let table = PhoneticTable::measured(&overrides)?;
    log::info!("Loaded {} measured phoneme profiles", overrides.len());
    Ok(Some(table))
}
