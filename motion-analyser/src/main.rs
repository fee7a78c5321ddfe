//! Replay motion block captures and print the regions found in every frame.

use clap::*;
use log::*;
use mvregion::prelude::v1::{Error, Result, *};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};

/// Prints every event as a line of JSON.
struct JsonTracker<W> {
    out: W,
    error: Option<Error>,
}

impl<W: Write> Tracker for JsonTracker<W> {
    fn setup_sizes(&mut self, rows: usize, cols: usize) {
        info!("tracking on a {cols}x{rows} grid");
    }

    fn update_tracks(&mut self, event: &FrameMotionEvent) {
        if self.error.is_some() {
            return;
        }

        let res = serde_json::to_writer(&mut self.out, event)
            .map_err(Error::from)
            .and_then(|_| writeln!(self.out).map_err(Into::into));

        if let Err(e) = res {
            self.error = Some(e);
        }
    }
}

#[derive(Debug, Default)]
struct Stats {
    frames: usize,
    calibrations: usize,
    global_motion: usize,
    regions: usize,
    rejects: usize,
}

impl Stats {
    fn record(&mut self, outcome: FrameOutcome) {
        self.frames += 1;
        match outcome {
            FrameOutcome::Calibrated => self.calibrations += 1,
            FrameOutcome::GlobalMotion { .. } => self.global_motion += 1,
            FrameOutcome::Processed {
                regions, rejects, ..
            } => {
                self.regions += regions;
                self.rejects += rejects;
            }
        }
    }
}

fn load_config(path: Option<&str>) -> Result<AnalyserConfig> {
    match path {
        Some(path) => {
            let reader = BufReader::new(File::open(path)?);
            Ok(serde_json::from_reader(reader)?)
        }
        None => Ok(Default::default()),
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let matches = Command::new("motion-analyser")
        .version(crate_version!())
        .author(crate_authors!())
        .about(crate_description!())
        .arg(
            Arg::new("rows")
                .long("rows")
                .short('r')
                .takes_value(true)
                .required_unless_present("list"),
        )
        .arg(
            Arg::new("cols")
                .long("cols")
                .short('c')
                .takes_value(true)
                .required_unless_present("list"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("JSON settings file")
                .takes_value(true),
        )
        .arg(
            Arg::new("set")
                .long("set")
                .short('s')
                .help("Override a setting, as name=value")
                .takes_value(true)
                .multiple_occurrences(true),
        )
        .arg(
            Arg::new("write-config")
                .long("write-config")
                .help("Write the effective settings to a JSON file")
                .takes_value(true),
        )
        .arg(
            Arg::new("capture")
                .long("capture")
                .help("Raw capture output used when debug is enabled")
                .takes_value(true),
        )
        .arg(
            Arg::new("stats")
                .long("stats")
                .help("Print a summary to stderr"),
        )
        .arg(
            Arg::new("list")
                .long("list")
                .short('l')
                .help("List available settings and exit"),
        )
        .arg(Arg::new("input").takes_value(true).required_unless_present("list"))
        .get_matches();

    let mut config = load_config(matches.value_of("config"))?;

    for setting in matches.values_of("set").into_iter().flatten() {
        let (name, value) = setting
            .split_once('=')
            .ok_or_else(|| anyhow!("Invalid setting `{setting}`, expected name=value"))?;
        if !config.set_prop_str(name.trim(), value)? {
            warn!("ignoring invalid value for {name}: {value}");
        }
    }

    if matches.is_present("list") {
        for (name, prop) in config.props() {
            println!("{name}: {prop}");
        }
        return Ok(());
    }

    if let Some(path) = matches.value_of("write-config") {
        let out = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(out, &config)?;
    }

    let rows: usize = matches.value_of("rows").unwrap().parse()?;
    let cols: usize = matches.value_of("cols").unwrap().parse()?;
    let input = matches.value_of("input").unwrap();

    let mut source = motion_loader::create_source(input, rows, cols)?;

    let stdout = std::io::stdout();
    let tracker = JsonTracker {
        out: BufWriter::new(stdout.lock()),
        error: None,
    };

    let mut analyser = MotionAnalyser::new(SharedConfig::new(config), tracker);

    if let Some(path) = matches.value_of("capture") {
        analyser = analyser.with_debug_sink(DebugSink::to_file(path));
    }

    let mut grid = MotionGrid::new(rows, cols);
    let mut stats = Stats::default();

    while source.next_frame(&mut grid)? {
        let outcome = analyser.process_frame(source.frame_index(), &grid)?;
        stats.record(outcome);

        if let Some(e) = analyser.tracker_mut().error.take() {
            return Err(e);
        }
    }

    analyser.tracker_mut().out.flush()?;

    if matches.is_present("stats") {
        eprintln!(
            "frames: {}, calibrations: {}, global motion: {}, regions: {}, rejects: {}",
            stats.frames, stats.calibrations, stats.global_motion, stats.regions, stats.rejects
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_count_every_outcome() {
        let mut stats = Stats::default();

        stats.record(FrameOutcome::Calibrated);
        stats.record(FrameOutcome::GlobalMotion { moving: 200 });
        stats.record(FrameOutcome::Processed {
            moving: 3,
            regions: 2,
            rejects: 1,
        });
        stats.record(FrameOutcome::Processed {
            moving: 1,
            regions: 1,
            rejects: 0,
        });

        assert_eq!(stats.frames, 4);
        assert_eq!(stats.calibrations, 1);
        assert_eq!(stats.global_motion, 1);
        assert_eq!(stats.regions, 3);
        assert_eq!(stats.rejects, 1);
    }
}
