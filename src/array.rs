//! Strided voxel and voxel-by-channel arrays.
//!
//! Storage is row-major over `(x, y, z)` with `z` fastest. Channel arrays
//! append a `(tx, rx)` block per voxel, `rx` fastest, so the channels of one
//! voxel sit next to each other and a voxel is the unit of parallel work.

use std::ops::Index;

use crate::error::{ImagingError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VoxelIndex {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl VoxelIndex {
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelIndex {
    pub voxel: VoxelIndex,
    pub tx: usize,
    pub rx: usize,
}

impl ChannelIndex {
    pub const fn new(voxel: VoxelIndex, tx: usize, rx: usize) -> Self {
        Self { voxel, tx, rx }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridShape {
    pub(crate) nx: usize,
    pub(crate) ny: usize,
    pub(crate) nz: usize,
}

impl GridShape {
    pub fn new(nx: usize, ny: usize, nz: usize) -> Result<Self> {
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(ImagingError::shape(format!(
                "grid extents must be at least 1, got ({nx}, {ny}, {nz})"
            )));
        }
        Ok(Self { nx, ny, nz })
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    pub fn nz(&self) -> usize {
        self.nz
    }

    pub fn len(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dims(&self) -> [usize; 3] {
        [self.nx, self.ny, self.nz]
    }

    pub fn contains(&self, idx: VoxelIndex) -> bool {
        idx.x < self.nx && idx.y < self.ny && idx.z < self.nz
    }

    pub fn offset(&self, idx: VoxelIndex) -> Option<usize> {
        if !self.contains(idx) {
            return None;
        }
        Some((idx.x * self.ny + idx.y) * self.nz + idx.z)
    }

    /// Inverse of [`GridShape::offset`]. `offset` must be below `len()`.
    pub fn voxel_at(&self, offset: usize) -> VoxelIndex {
        debug_assert!(offset < self.len());
        let z = offset % self.nz;
        let rest = offset / self.nz;
        VoxelIndex::new(rest / self.ny, rest % self.ny, z)
    }
}

/// Transmit/receive extents of a channel array. A single pair carries no
/// channel axes, which is what makes a 1x1 map rank 3.
///
/// Only [`ChannelLayout::new`] and [`ChannelLayout::SINGLE`] build one, so
/// both extents are at least 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelLayout {
    n_tx: usize,
    n_rx: usize,
}

impl ChannelLayout {
    pub const SINGLE: ChannelLayout = ChannelLayout { n_tx: 1, n_rx: 1 };

    pub fn new(n_tx: usize, n_rx: usize) -> Result<Self> {
        if n_tx == 0 || n_rx == 0 {
            return Err(ImagingError::shape(format!(
                "channel extents must be at least 1, got n_tx={n_tx}, n_rx={n_rx}"
            )));
        }
        Ok(Self { n_tx, n_rx })
    }

    pub fn n_tx(&self) -> usize {
        self.n_tx
    }

    pub fn n_rx(&self) -> usize {
        self.n_rx
    }

    pub fn pairs(&self) -> usize {
        self.n_tx * self.n_rx
    }

    pub fn is_single(&self) -> bool {
        self.pairs() == 1
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MapShape {
    pub(crate) grid: GridShape,
    pub(crate) channels: ChannelLayout,
}

impl MapShape {
    pub fn new(grid: GridShape, channels: ChannelLayout) -> Self {
        Self { grid, channels }
    }

    pub fn grid(&self) -> GridShape {
        self.grid
    }

    pub fn channels(&self) -> ChannelLayout {
        self.channels
    }

    /// Accepts rank 3 `(nx, ny, nz)` or rank 5 `(nx, ny, nz, n_tx, n_rx)`.
    pub fn from_dims(dims: &[usize]) -> Result<Self> {
        match *dims {
            [nx, ny, nz] => Ok(Self::new(GridShape::new(nx, ny, nz)?, ChannelLayout::SINGLE)),
            [nx, ny, nz, n_tx, n_rx] => Ok(Self::new(
                GridShape::new(nx, ny, nz)?,
                ChannelLayout::new(n_tx, n_rx)?,
            )),
            _ => Err(ImagingError::shape(format!(
                "map must be rank 3 or rank 5, got rank {}",
                dims.len()
            ))),
        }
    }

    pub fn rank(&self) -> usize {
        if self.channels.is_single() {
            3
        } else {
            5
        }
    }

    pub fn dims(&self) -> Vec<usize> {
        let mut dims = self.grid.dims().to_vec();
        if !self.channels.is_single() {
            dims.push(self.channels.n_tx());
            dims.push(self.channels.n_rx());
        }
        dims
    }

    pub fn len(&self) -> usize {
        self.grid.len() * self.channels.pairs()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn offset(&self, idx: ChannelIndex) -> Option<usize> {
        if idx.tx >= self.channels.n_tx() || idx.rx >= self.channels.n_rx() {
            return None;
        }
        let voxel = self.grid.offset(idx.voxel)?;
        Some(voxel * self.channels.pairs() + idx.tx * self.channels.n_rx() + idx.rx)
    }
}

/// Real or complex values over the voxel grid.
#[derive(Clone, Debug, PartialEq)]
pub struct VoxelArray<T> {
    shape: GridShape,
    data: Vec<T>,
}

impl<T: Clone> VoxelArray<T> {
    pub fn filled(shape: GridShape, value: T) -> Self {
        Self {
            shape,
            data: vec![value; shape.len()],
        }
    }
}

impl<T> VoxelArray<T> {
    pub fn from_vec(shape: GridShape, data: Vec<T>) -> Result<Self> {
        if data.len() != shape.len() {
            return Err(ImagingError::shape(format!(
                "voxel array of shape {:?} needs {} values, got {}",
                shape.dims(),
                shape.len(),
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn get(&self, idx: VoxelIndex) -> Option<&T> {
        self.shape.offset(idx).map(|offset| &self.data[offset])
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl VoxelArray<f64> {
    /// Voxel holding the largest value; the first one wins on ties.
    pub fn argmax(&self) -> Option<(VoxelIndex, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (offset, &value) in self.data.iter().enumerate() {
            match best {
                Some((_, current)) if value <= current => {}
                _ if value.is_nan() => {}
                _ => best = Some((offset, value)),
            }
        }
        best.map(|(offset, value)| (self.shape.voxel_at(offset), value))
    }
}

impl<T> Index<VoxelIndex> for VoxelArray<T> {
    type Output = T;

    fn index(&self, idx: VoxelIndex) -> &T {
        match self.get(idx) {
            Some(value) => value,
            None => panic!(
                "voxel index {:?} out of bounds for shape {:?}",
                idx,
                self.shape.dims()
            ),
        }
    }
}

/// Values over `(voxel, tx, rx)`.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelArray<T> {
    shape: MapShape,
    data: Vec<T>,
}

impl<T> ChannelArray<T> {
    pub fn from_vec(shape: MapShape, data: Vec<T>) -> Result<Self> {
        if data.len() != shape.len() {
            return Err(ImagingError::shape(format!(
                "map of shape {:?} needs {} values, got {}",
                shape.dims(),
                shape.len(),
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    /// Builds a map from explicit dims in the storage order described at the
    /// top of this module.
    pub fn from_shape_vec(dims: &[usize], data: Vec<T>) -> Result<Self> {
        Self::from_vec(MapShape::from_dims(dims)?, data)
    }

    pub fn shape(&self) -> MapShape {
        self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    pub fn dims(&self) -> Vec<usize> {
        self.shape.dims()
    }

    pub fn get(&self, idx: ChannelIndex) -> Option<&T> {
        self.shape.offset(idx).map(|offset| &self.data[offset])
    }

    pub fn voxel_channels(&self, voxel: VoxelIndex) -> Option<&[T]> {
        let pairs = self.shape.channels.pairs();
        let start = self.shape.grid.offset(voxel)? * pairs;
        Some(&self.data[start..start + pairs])
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

impl<T> Index<ChannelIndex> for ChannelArray<T> {
    type Output = T;

    fn index(&self, idx: ChannelIndex) -> &T {
        match self.get(idx) {
            Some(value) => value,
            None => panic!(
                "channel index {:?} out of bounds for shape {:?}",
                idx,
                self.shape.dims()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_offset_round_trips_through_voxel_at() {
        let grid = GridShape::new(3, 4, 5).unwrap();
        for offset in 0..grid.len() {
            assert_eq!(grid.offset(grid.voxel_at(offset)), Some(offset));
        }
        assert_eq!(grid.offset(VoxelIndex::new(0, 0, 1)), Some(1));
        assert_eq!(grid.offset(VoxelIndex::new(0, 1, 0)), Some(5));
        assert_eq!(grid.offset(VoxelIndex::new(1, 0, 0)), Some(20));
        assert_eq!(grid.offset(VoxelIndex::new(3, 0, 0)), None);
    }

    #[test]
    fn zero_extent_grid_is_rejected() {
        assert!(GridShape::new(2, 0, 2).is_err());
    }

    #[test]
    fn single_pair_collapses_to_rank_three() {
        let shape = MapShape::from_dims(&[2, 2, 2, 1, 1]).unwrap();
        assert_eq!(shape.rank(), 3);
        assert_eq!(shape.dims(), vec![2, 2, 2]);
        let shape = MapShape::from_dims(&[2, 2, 2, 1, 3]).unwrap();
        assert_eq!(shape.rank(), 5);
        assert_eq!(shape.dims(), vec![2, 2, 2, 1, 3]);
    }

    #[test]
    fn every_constructor_enforces_channel_extents() {
        assert_eq!(ChannelLayout::new(1, 1).unwrap(), ChannelLayout::SINGLE);
        assert!(ChannelLayout::new(0, 3).is_err());
        assert!(ChannelLayout::new(2, 0).is_err());
        assert!(MapShape::from_dims(&[1, 1, 1, 0, 3]).is_err());

        let grid = GridShape::new(1, 1, 2).unwrap();
        let explicit = MapShape::new(grid, ChannelLayout::new(1, 1).unwrap());
        let from_dims = MapShape::from_dims(&[1, 1, 2, 1, 1]).unwrap();
        assert_eq!(explicit, from_dims);
        assert_eq!(explicit.rank(), 3);

        let map = ChannelArray::from_vec(explicit, vec![0.5, 1.5]).unwrap();
        assert_eq!(map.dims(), vec![1, 1, 2]);
        assert_eq!(map.voxel_channels(VoxelIndex::new(0, 0, 1)).unwrap(), &[1.5]);

        let wide = MapShape::new(grid, ChannelLayout::new(2, 3).unwrap());
        assert_eq!(wide.channels().pairs(), 6);
        assert_eq!(wide.grid().nz(), 2);
        assert_eq!(wide.len(), 12);
    }

    #[test]
    fn unsupported_rank_is_a_shape_error() {
        let err = MapShape::from_dims(&[2, 2, 2, 2]).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InputShape);
    }

    #[test]
    fn channel_index_keeps_voxel_and_channel_axes_apart() {
        let values: Vec<usize> = (0..2 * 1 * 1 * 2 * 3).collect();
        let map = ChannelArray::from_shape_vec(&[2, 1, 1, 2, 3], values).unwrap();
        let voxel = VoxelIndex::new(1, 0, 0);
        assert_eq!(map[ChannelIndex::new(voxel, 0, 0)], 6);
        assert_eq!(map[ChannelIndex::new(voxel, 1, 2)], 11);
        assert_eq!(map.voxel_channels(voxel).unwrap(), &[6, 7, 8, 9, 10, 11]);
        assert!(map.get(ChannelIndex::new(voxel, 2, 0)).is_none());
        assert!(map.get(ChannelIndex::new(voxel, 0, 3)).is_none());
    }

    #[test]
    fn length_mismatch_is_rejected() {
        assert!(ChannelArray::from_shape_vec(&[2, 2, 2], vec![0.0; 7]).is_err());
    }

    #[test]
    fn argmax_skips_nan_and_keeps_first_maximum() {
        let grid = GridShape::new(1, 2, 2).unwrap();
        let map = VoxelArray::from_vec(grid, vec![1.0, f64::NAN, 3.0, 3.0]).unwrap();
        let (idx, value) = map.argmax().unwrap();
        assert_eq!(idx, VoxelIndex::new(0, 1, 0));
        assert_eq!(value, 3.0);
    }
}
