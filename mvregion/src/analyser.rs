//! # Per-frame motion analysis
//!
//! [`MotionAnalyser`] drives the whole pipeline. It starts out uncalibrated: the first frame only
//! establishes the grid dimensions and the movement cap. Every following frame is masked,
//! extracted, merged and aggregated, and the resulting regions are handed to the tracker.
//!
//! A first frame without usable dimensions leaves the analyser faulted, and every later frame is
//! refused with the same error.

use crate::aggregate::VectorAggregator;
use crate::config::{AnalyserConfig, SharedConfig};
use crate::debug::DebugSink;
use crate::error::Error;
use crate::extract::{ComponentFinder, FloodFill, RegionExtractor};
use crate::grid::MotionGrid;
use crate::mask::{MovementCap, ThresholdMasker};
use crate::merge::RectangleMerger;
use crate::tracker::{FrameMotionEvent, Tracker};
use anyhow::Result;
use log::*;
use std::io;
use std::time::Instant;

/// Calibration state of the analyser.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Uncalibrated,
    Active {
        width: usize,
        height: usize,
        cap: MovementCap,
    },
    Faulted {
        width: usize,
        height: usize,
    },
}

/// What happened to a single frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame was used to calibrate the grid dimensions. Nothing was emitted.
    Calibrated,
    /// Too many blocks moved. An empty region list was emitted.
    GlobalMotion { moving: usize },
    /// The frame was fully analysed.
    Processed {
        moving: usize,
        regions: usize,
        rejects: usize,
    },
}

/// Motion grid to region converter.
///
/// # Examples
///
/// ```
/// # use assert_approx_eq::assert_approx_eq;
/// use mvregion::prelude::v1::*;
///
/// let events: Vec<FrameMotionEvent> = vec![];
/// let mut analyser = MotionAnalyser::new(SharedConfig::default(), events);
///
/// let mut grid = MotionGrid::new(30, 40);
/// analyser.process_frame(0, &grid).unwrap();
///
/// grid.set(20, 20, MotionBlock::new(-2, -2, 90));
/// analyser.process_frame(1, &grid).unwrap();
///
/// let event = &analyser.tracker()[0];
/// assert_eq!(event.regions[0].rect, Rectangle::new(20, 20, 1, 1));
/// assert_approx_eq!(event.regions[0].vector.x, -2.0);
/// ```
pub struct MotionAnalyser<T, F = FloodFill> {
    config: SharedConfig,
    tracker: T,
    extractor: RegionExtractor<F>,
    state: State,
    debug: DebugSink,
    debug_error: Option<io::Error>,
    processed_frames: usize,
    last_frame: Option<Instant>,
}

impl<T: Tracker> MotionAnalyser<T> {
    /// Create a new analyser using the built-in connectivity search.
    pub fn new(config: SharedConfig, tracker: T) -> Self {
        Self::with_finder(config, tracker, FloodFill)
    }
}

impl<T: Tracker, F: ComponentFinder> MotionAnalyser<T, F> {
    /// Create a new analyser with a custom connectivity search.
    pub fn with_finder(config: SharedConfig, tracker: T, finder: F) -> Self {
        Self {
            config,
            tracker,
            extractor: RegionExtractor::new(finder),
            state: State::Uncalibrated,
            debug: DebugSink::default(),
            debug_error: None,
            processed_frames: 0,
            last_frame: None,
        }
    }

    /// Use a custom sink for raw frame captures.
    pub fn with_debug_sink(mut self, sink: DebugSink) -> Self {
        self.debug = sink;
        self
    }

    /// Handle to the live configuration.
    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut T {
        &mut self.tracker
    }

    pub fn into_tracker(self) -> T {
        self.tracker
    }

    /// Number of frames passed to `process_frame`.
    pub fn processed_frames(&self) -> usize {
        self.processed_frames
    }

    /// Calibrated grid dimensions, as `(width, height)`.
    pub fn dim(&self) -> Option<(usize, usize)> {
        match self.state {
            State::Active { width, height, .. } => Some((width, height)),
            _ => None,
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.dim().is_some()
    }

    /// Take the last error of the raw frame capture, if any.
    pub fn take_debug_error(&mut self) -> Option<io::Error> {
        self.debug_error.take()
    }

    /// Analyse a single frame.
    ///
    /// # Arguments
    ///
    /// * `frame` - index of the frame in the stream.
    /// * `grid` - motion grid of the frame.
    pub fn process_frame(&mut self, frame: usize, grid: &MotionGrid) -> Result<FrameOutcome> {
        let now = Instant::now();
        let dt = self.last_frame.replace(now).map(|t| now - t);
        self.processed_frames += 1;

        let config = self.config.snapshot();

        let (width, height, cap) = match self.state {
            State::Uncalibrated => {
                self.calibrate(grid)?;
                self.capture(&config, grid);
                return Ok(FrameOutcome::Calibrated);
            }
            State::Active { width, height, cap } => (width, height, cap),
            State::Faulted { width, height } => {
                return Err(Error::MalformedGrid {
                    rows: height,
                    cols: width,
                }
                .into())
            }
        };

        if grid.dim() != (width, height) {
            return Err(Error::DimensionMismatch {
                expected: (width, height),
                got: grid.dim(),
            }
            .into());
        }

        // Captures hold fixed-size frames, so only calibrated grids are written.
        self.capture(&config, grid);

        let mask = ThresholdMasker::from(&config).mask(grid);
        let moving = mask.count();

        if cap.exceeded(moving) {
            debug!(
                "frame {frame}: {moving} moving blocks over the limit of {}",
                cap.limit()
            );
            self.tracker.update_tracks(&FrameMotionEvent {
                frame,
                regions: vec![],
            });
            return Ok(FrameOutcome::GlobalMotion { moving });
        }

        let rects = self.extractor.extract(&mask, config.max_area);
        let rects = RectangleMerger::merge(width, height, rects);
        let (regions, rejects) = VectorAggregator::from(&config).aggregate(grid, &rects);

        debug!(
            "frame {frame}: {} regions, {rejects} rejects, {moving} moving ({:.1}ms)",
            regions.len(),
            dt.map(|dt| dt.as_secs_f64() * 1000.0).unwrap_or_default()
        );

        let outcome = FrameOutcome::Processed {
            moving,
            regions: regions.len(),
            rejects,
        };

        self.tracker
            .update_tracks(&FrameMotionEvent { frame, regions });

        Ok(outcome)
    }

    fn calibrate(&mut self, grid: &MotionGrid) -> Result<()> {
        let (width, height) = grid.dim();

        if width == 0 || height == 0 {
            self.state = State::Faulted { width, height };
            return Err(Error::MalformedGrid {
                rows: height,
                cols: width,
            }
            .into());
        }

        let cap = MovementCap::new(width, height);
        info!(
            "calibrated to {width}x{height} blocks, movement limit {}",
            cap.limit()
        );

        self.tracker.setup_sizes(height, width);
        self.state = State::Active { width, height, cap };

        Ok(())
    }

    /// Forward the raw frame to the capture sink, if enabled.
    fn capture(&mut self, config: &AnalyserConfig, grid: &MotionGrid) {
        if !config.debug {
            self.debug.close();
            return;
        }

        if let Err(e) = self.debug.write(grid.as_bytes()) {
            error!("motion capture unavailable: {e}");
            self.debug_error = Some(e);
        }
    }
}
