//! Delay-and-sum imaging for multistatic UWB radar.
//!
//! [`delay_map::build_delay_map`] turns a voxel grid and antenna positions
//! into per-channel round-trip delays and delay-weighted phase factors.
//! [`beamformer::Beamformer`] then projects complex baseband samples taken at
//! those delays onto the expected carrier phase and sums them per voxel.

pub mod array;
pub mod beamformer;
pub mod cache;
pub mod delay_map;
pub mod error;
pub mod geom;
pub mod interp;
pub mod matched_filter;
pub mod scene;
pub mod time_align;
pub mod utils;

pub use array::{ChannelIndex, ChannelLayout, GridShape, MapShape, VoxelIndex};
pub use beamformer::{delay_and_sum, BasebandSignal, Beamformer, RadarMap};
pub use cache::DelayMapCache;
pub use delay_map::{build_delay_map, DelayMap, FocusingMaps, PhaseFactorMap};
pub use error::{ErrorKind, ImagingError, Result};
pub use geom::{AntennaPositions, VoxelGrid, C};
pub use time_align::{Bracket, TimeSupport};
