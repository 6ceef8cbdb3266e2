use crate::array::{GridShape, VoxelIndex};
use crate::error::{ImagingError, Result};

pub const C: f64 = 299792458.0; // Speed of light in m/s

// --- Imaging Geometry ---
// Voxel (p): a sampling point of the rectilinear imaging volume.
// Transmitter (tx) / receiver (rx): antenna phase centres, Cartesian metres.
// Round-trip delay: tau = (|p - tx| + |p - rx|) / C
//   tx and rx enter symmetrically, so swapping them leaves tau unchanged.
// ------------------------------

fn check_axis(name: &str, values: &[f64]) -> Result<()> {
    if values.is_empty() {
        return Err(ImagingError::shape(format!("{name} must contain at least one coordinate")));
    }
    if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
        return Err(ImagingError::domain(format!(
            "{name}[{pos}] is not a finite coordinate"
        )));
    }
    Ok(())
}

/// Rectilinear sampling volume. Axes need not be uniform or sorted.
#[derive(Clone, Debug, PartialEq)]
pub struct VoxelGrid {
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
}

impl VoxelGrid {
    pub fn new(x: Vec<f64>, y: Vec<f64>, z: Vec<f64>) -> Result<Self> {
        check_axis("x", &x)?;
        check_axis("y", &y)?;
        check_axis("z", &z)?;
        Ok(Self { x, y, z })
    }

    /// `count` evenly spaced points from `start` to `stop` inclusive.
    pub fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
        match count {
            0 => Vec::new(),
            1 => vec![start],
            _ => {
                let step = (stop - start) / (count - 1) as f64;
                (0..count).map(|i| start + step * i as f64).collect()
            }
        }
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn z(&self) -> &[f64] {
        &self.z
    }

    pub fn shape(&self) -> GridShape {
        GridShape {
            nx: self.x.len(),
            ny: self.y.len(),
            nz: self.z.len(),
        }
    }

    pub fn point(&self, idx: VoxelIndex) -> Option<[f64; 3]> {
        Some([
            *self.x.get(idx.x)?,
            *self.y.get(idx.y)?,
            *self.z.get(idx.z)?,
        ])
    }
}

/// An `n x 3` matrix of antenna positions, one row per antenna.
#[derive(Clone, Debug, PartialEq)]
pub struct AntennaPositions {
    rows: Vec<[f64; 3]>,
}

impl AntennaPositions {
    pub fn new(rows: Vec<[f64; 3]>) -> Result<Self> {
        if rows.is_empty() {
            return Err(ImagingError::shape("antenna positions need at least one row"));
        }
        for (row_idx, row) in rows.iter().enumerate() {
            if row.iter().any(|v| !v.is_finite()) {
                return Err(ImagingError::domain(format!(
                    "antenna position row {row_idx} is not finite"
                )));
            }
        }
        Ok(Self { rows })
    }

    /// Row-major buffer with a declared column count, which must be 3.
    pub fn from_row_major(values: &[f64], columns: usize) -> Result<Self> {
        if columns != 3 {
            return Err(ImagingError::shape(format!(
                "antenna positions must be an n by 3 matrix, got {columns} columns"
            )));
        }
        if values.len() % 3 != 0 {
            return Err(ImagingError::shape(format!(
                "{} values do not form rows of 3 coordinates",
                values.len()
            )));
        }
        let rows = values
            .chunks_exact(3)
            .map(|row| [row[0], row[1], row[2]])
            .collect();
        Self::new(rows)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[[f64; 3]] {
        &self.rows
    }

    pub fn get(&self, idx: usize) -> Option<[f64; 3]> {
        self.rows.get(idx).copied()
    }
}

#[inline(always)]
pub fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Propagation time tx -> voxel -> rx in seconds.
#[inline(always)]
pub fn round_trip_delay(voxel: [f64; 3], tx: [f64; 3], rx: [f64; 3]) -> f64 {
    (distance(voxel, tx) + distance(voxel, rx)) / C
}
