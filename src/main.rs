mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::AtomicBool;

use cli::Cli;
use mashup::audio::analysis::analyze_tracks;
use mashup::audio::features::TrackSummary;
use mashup::config;
use mashup::{create_mashup, load_tracks};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    // Explicit --config path, or auto-detect mashup.toml / user config
    let config_path = cli.config.clone().or_else(config::find_config);
    let mut cfg = config::Config::default();
    if let Some(ref path) = config_path {
        if let Some(loaded) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            cfg = loaded;
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    // Merge: CLI values win unless left at their defaults
    let settings = &mut cfg.settings;
    if cli.segment != 30.0 { settings.mix.segment_duration = cli.segment; }
    if cli.transition != 8.0 { settings.mix.transition_duration = cli.transition; }
    if cli.edge_fade != 2.0 { settings.mix.edge_fade = cli.edge_fade; }
    if cli.makeup_gain != 1.8 { settings.render.makeup_gain = cli.makeup_gain; }
    if cli.output.as_os_str() == "mashup.wav" { cli.output = cfg.output.path.clone(); }
    if cli.report.is_none() { cli.report = cfg.output.report.clone(); }

    if cli.inputs.len() < 2 {
        anyhow::bail!("Select at least 2 input tracks (got {})", cli.inputs.len());
    }

    log::info!("mashup - automatic DJ mix renderer");
    for input in &cli.inputs {
        log::info!("Input: {}", input);
    }
    log::info!("Output: {}", cli.output.display());

    let cancel_flag = AtomicBool::new(false);

    // 1. Fetch & decode all inputs before any analysis starts
    log::info!("Decoding {} tracks...", cli.inputs.len());
    let tracks = load_tracks(&cli.inputs, &cancel_flag).context("Analysis failed")?;

    if cli.analyze_only {
        let analyzed = analyze_tracks(tracks, &cfg.settings.analysis, &cancel_flag)
            .context("Analysis failed")?;
        let summaries: Vec<TrackSummary> = analyzed.iter().map(|t| t.summary()).collect();
        let json = serde_json::to_string_pretty(&summaries)?;
        match cli.report {
            Some(ref path) => std::fs::write(path, json)
                .with_context(|| format!("Failed to write report: {}", path.display()))?,
            None => println!("{}", json),
        }
        return Ok(());
    }

    // 2. Analyze, schedule, render, encode
    let pb = ProgressBar::new(tracks.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} tracks rendered")
            .context("Invalid progress template")?
            .progress_chars("=>-"),
    );

    let result = create_mashup(tracks, &cfg.settings, &cancel_flag, &|id: &str| {
        pb.inc(1);
        log::debug!("Rendered track chain: {}", id);
    })
    .context("Mashup creation failed")?;

    pb.finish_with_message("Rendering complete");

    // 3. Write output
    std::fs::write(&cli.output, &result.wav)
        .with_context(|| format!("Failed to write output: {}", cli.output.display()))?;

    let report = result.report();
    for entry in &report.tracks {
        log::info!(
            "  {}. {} - {} BPM, energy {:.4}: {:.2}s - {:.2}s",
            entry.order,
            entry.track.id,
            entry.track.bpm,
            entry.track.energy,
            entry.start,
            entry.start + entry.duration
        );
    }
    log::info!("Target BPM: {}, duration {:.2}s", report.target_bpm, report.total_duration);

    if let Some(ref path) = cli.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        log::info!("Report: {}", path.display());
    }

    log::info!("Done! Output: {}", cli.output.display());
    Ok(())
}
