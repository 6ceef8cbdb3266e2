//! Rebuild-on-change holder for focusing maps.
//!
//! Maps stay valid while the voxel grid, the antenna positions and the
//! carrier frequency are unchanged. Any change to those marks the cache dirty
//! and the next request rebuilds.

use tracing::debug;

use crate::beamformer::Beamformer;
use crate::delay_map::{build_delay_map, check_carrier};
use crate::error::{ImagingError, Result};
use crate::geom::{AntennaPositions, VoxelGrid};

/// Inputs the maps depend on, compared bit for bit.
#[derive(Clone, Debug, PartialEq)]
struct Fingerprint {
    grid: VoxelGrid,
    carrier_bits: u64,
    pos_tx: AntennaPositions,
    pos_rx: AntennaPositions,
}

#[derive(Clone, Debug)]
pub struct DelayMapCache {
    grid: VoxelGrid,
    carrier_hz: f64,
    pos_tx: AntennaPositions,
    pos_rx: AntennaPositions,
    built_for: Option<Fingerprint>,
    beamformer: Option<Beamformer>,
    dirty: bool,
    rebuilds: usize,
}

impl DelayMapCache {
    pub fn new(
        grid: VoxelGrid,
        carrier_hz: f64,
        pos_tx: AntennaPositions,
        pos_rx: AntennaPositions,
    ) -> Result<Self> {
        check_carrier(carrier_hz)?;
        Ok(Self {
            grid,
            carrier_hz,
            pos_tx,
            pos_rx,
            built_for: None,
            beamformer: None,
            dirty: true,
            rebuilds: 0,
        })
    }

    fn fingerprint(&self) -> Fingerprint {
        Fingerprint {
            grid: self.grid.clone(),
            carrier_bits: self.carrier_hz.to_bits(),
            pos_tx: self.pos_tx.clone(),
            pos_rx: self.pos_rx.clone(),
        }
    }

    fn refresh_dirty(&mut self) {
        let current = self.fingerprint();
        self.dirty = self.built_for.as_ref() != Some(&current);
    }

    pub fn set_grid(&mut self, grid: VoxelGrid) {
        self.grid = grid;
        self.refresh_dirty();
    }

    pub fn set_carrier(&mut self, carrier_hz: f64) -> Result<()> {
        check_carrier(carrier_hz)?;
        self.carrier_hz = carrier_hz;
        self.refresh_dirty();
        Ok(())
    }

    pub fn set_positions(&mut self, pos_tx: AntennaPositions, pos_rx: AntennaPositions) {
        self.pos_tx = pos_tx;
        self.pos_rx = pos_rx;
        self.refresh_dirty();
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of times the maps have been built.
    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }

    pub fn carrier_hz(&self) -> f64 {
        self.carrier_hz
    }

    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    /// Beamformer for the current inputs, rebuilding the maps when dirty.
    pub fn beamformer(&mut self) -> Result<&Beamformer> {
        if self.dirty || self.beamformer.is_none() {
            debug!(rebuilds = self.rebuilds, "rebuilding focusing maps");
            let maps = build_delay_map(&self.grid, self.carrier_hz, &self.pos_tx, &self.pos_rx)?;
            self.beamformer = Some(Beamformer::new(maps)?);
            self.built_for = Some(self.fingerprint());
            self.dirty = false;
            self.rebuilds += 1;
        } else {
            debug!("reusing cached focusing maps");
        }
        self.beamformer
            .as_ref()
            .ok_or_else(|| ImagingError::domain("focusing maps are not built"))
    }
}
