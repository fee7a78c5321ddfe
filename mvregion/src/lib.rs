//! # Motion Vector Region Extraction
//!
//! This library turns the per-block motion grids emitted by hardware motion estimators (such as
//! the ones found in camera ISPs and video encoders) into a handful of candidate moving regions,
//! each with a composite velocity vector, ready to be handed off to a multi-frame tracker.
//!
//! Every frame goes through the same stages:
//!
//! 1. [`mask::ThresholdMasker`] classifies blocks as moving and guards against global motion.
//! 2. [`extract::RegionExtractor`] bounds every connected group of moving blocks.
//! 3. [`merge::RectangleMerger`] fuses nearby rectangles of the same object.
//! 4. [`aggregate::VectorAggregator`] rejects noise and computes the composite vectors.
//! 5. [`analyser::MotionAnalyser`] drives the stages and hands the regions to a
//!    [`tracker::Tracker`].
//!
//! The easiest way to use the library is to import its prelude:
//!
//! ```
//! use mvregion::prelude::v1::*;
//! ```

pub mod aggregate;
pub mod analyser;
pub mod config;
pub mod debug;
pub mod error;
pub mod extract;
pub mod grid;
pub mod mask;
pub mod merge;
pub mod properties;
pub mod rect;
pub mod source;
pub mod tracker;

pub use error::Error;

pub mod prelude {
    pub mod v1 {
        pub use crate::{
            aggregate::{Region, VectorAggregator},
            analyser::{FrameOutcome, MotionAnalyser},
            config::{AnalyserConfig, SharedConfig},
            debug::DebugSink,
            extract::{ComponentFinder, FloodFill, RegionExtractor},
            grid::{MotionBlock, MotionGrid},
            mask::{MovementCap, MovementMask, ThresholdMasker},
            merge::RectangleMerger,
            properties::{BoundedProp, Properties, Property},
            rect::Rectangle,
            source::MotionSource,
            tracker::{FrameMotionEvent, Tracker},
        };
        pub use anyhow::{anyhow, Error, Result};
    }
}
