//! External DDR and local scratch memory
//!
//! DDR is byte-addressed. DMem is an array of 32-bit words, addressed by
//! word index the way the DMA engine sees it; typed views over it are
//! zero-copy `bytemuck` casts, so an `i8` feature map and an `i32`
//! accumulator volume are just different lenses on the same words.
//!
//! Words hold bytes in host order, which keeps `i8` views byte-identical to
//! what was staged in DDR.

use crate::error::{Result, SocError};
use std::ops::Range;

/// External memory (DDR), byte-addressed.
#[derive(Debug, Clone)]
pub struct ExternalMemory {
    bytes: Vec<u8>,
}

impl ExternalMemory {
    /// Zero-filled DDR of `len` bytes.
    pub fn new(len: usize) -> Self {
        Self {
            bytes: vec![0; len],
        }
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the memory has zero size.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn range(&self, addr: u32, len: usize) -> Result<Range<usize>> {
        let start = addr as usize;
        match start.checked_add(len) {
            Some(end) if end <= self.bytes.len() => Ok(start..end),
            _ => Err(SocError::ExternalOutOfBounds {
                addr,
                len,
                limit: self.bytes.len(),
            }),
        }
    }

    /// Borrow `len` bytes at `addr`.
    ///
    /// # Errors
    ///
    /// Returns error if the range leaves DDR.
    pub fn slice(&self, addr: u32, len: usize) -> Result<&[u8]> {
        let r = self.range(addr, len)?;
        Ok(&self.bytes[r])
    }

    /// Mutably borrow `len` bytes at `addr`.
    ///
    /// # Errors
    ///
    /// Returns error if the range leaves DDR.
    pub fn slice_mut(&mut self, addr: u32, len: usize) -> Result<&mut [u8]> {
        let r = self.range(addr, len)?;
        Ok(&mut self.bytes[r])
    }

    /// Copy `data` into DDR at `addr`.
    ///
    /// # Errors
    ///
    /// Returns error if the range leaves DDR.
    pub fn write(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        self.slice_mut(addr, data.len())?.copy_from_slice(data);
        Ok(())
    }

    /// Copy DDR at `addr` into `buffer`.
    ///
    /// # Errors
    ///
    /// Returns error if the range leaves DDR.
    pub fn read(&self, addr: u32, buffer: &mut [u8]) -> Result<()> {
        buffer.copy_from_slice(self.slice(addr, buffer.len())?);
        Ok(())
    }
}

/// A word range in local memory: `addr` is the DMem word address the DMA
/// engine is programmed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalRegion {
    /// First word.
    pub addr: u32,
    /// Length in words.
    pub words: usize,
}

impl LocalRegion {
    /// Region of `words` words at word address `addr`.
    pub const fn new(addr: u32, words: usize) -> Self {
        Self { addr, words }
    }

    /// Word range as indices into DMem.
    pub const fn range(&self) -> Range<usize> {
        self.addr as usize..self.addr as usize + self.words
    }

    /// Length in bytes.
    pub const fn bytes(&self) -> usize {
        self.words * 4
    }

    /// Whether the two regions share any word.
    pub const fn overlaps(&self, other: &Self) -> bool {
        let a = self.range();
        let b = other.range();
        a.start < b.end && b.start < a.end
    }
}

/// Local scratch memory (DMem), word-addressed.
#[derive(Debug, Clone)]
pub struct LocalMemory {
    words: Vec<u32>,
}

impl LocalMemory {
    /// Zero-filled DMem of `words` 32-bit words.
    pub fn new(words: usize) -> Self {
        Self {
            words: vec![0; words],
        }
    }

    /// Size in words.
    pub fn len_words(&self) -> usize {
        self.words.len()
    }

    /// Check that `region` lies inside DMem.
    ///
    /// # Errors
    ///
    /// Returns error if the region leaves DMem.
    pub fn check(&self, region: LocalRegion) -> Result<()> {
        if region.range().end > self.words.len() {
            return Err(SocError::LocalOutOfBounds {
                word: region.addr,
                words: region.words,
                limit: self.words.len(),
            });
        }
        Ok(())
    }

    /// Raw words of `region`.
    ///
    /// # Panics
    ///
    /// Panics if the region leaves DMem.
    pub fn words(&self, region: LocalRegion) -> &[u32] {
        &self.words[region.range()]
    }

    /// Mutable raw words of `region`.
    ///
    /// # Panics
    ///
    /// Panics if the region leaves DMem.
    pub fn words_mut(&mut self, region: LocalRegion) -> &mut [u32] {
        &mut self.words[region.range()]
    }

    /// `region` viewed as packed `i8` samples.
    pub fn i8s(&self, region: LocalRegion) -> &[i8] {
        bytemuck::cast_slice(self.words(region))
    }

    /// `region` viewed as mutable packed `i8` samples.
    pub fn i8s_mut(&mut self, region: LocalRegion) -> &mut [i8] {
        bytemuck::cast_slice_mut(self.words_mut(region))
    }

    /// `region` viewed as `i32` accumulators.
    pub fn i32s(&self, region: LocalRegion) -> &[i32] {
        bytemuck::cast_slice(self.words(region))
    }

    /// `region` viewed as mutable `i32` accumulators.
    pub fn i32s_mut(&mut self, region: LocalRegion) -> &mut [i32] {
        bytemuck::cast_slice_mut(self.words_mut(region))
    }

    /// `region` viewed as raw bytes.
    pub fn bytes(&self, region: LocalRegion) -> &[u8] {
        bytemuck::cast_slice(self.words(region))
    }

    /// `region` viewed as mutable raw bytes.
    pub fn bytes_mut(&mut self, region: LocalRegion) -> &mut [u8] {
        bytemuck::cast_slice_mut(self.words_mut(region))
    }

    /// Split DMem into a writable `output` region and a read-only view of
    /// everything else, so a stage can read its inputs while writing its
    /// output in place.
    ///
    /// # Panics
    ///
    /// Panics if `output` leaves DMem.
    pub fn split_output(&mut self, output: LocalRegion) -> (LocalView<'_>, &mut [u32]) {
        let r = output.range();
        let (lo, rest) = self.words.split_at_mut(r.start);
        let (out, hi) = rest.split_at_mut(r.len());
        (
            LocalView {
                lo,
                hi,
                hole: output,
            },
            out,
        )
    }
}

/// Read-only view of DMem with one region carved out for writing.
#[derive(Debug)]
pub struct LocalView<'a> {
    lo: &'a [u32],
    hi: &'a [u32],
    hole: LocalRegion,
}

impl<'a> LocalView<'a> {
    /// Raw words of `region`.
    ///
    /// # Panics
    ///
    /// Panics if `region` overlaps the carved-out output region or leaves
    /// DMem.
    pub fn words(&self, region: LocalRegion) -> &'a [u32] {
        assert!(
            !region.overlaps(&self.hole),
            "region {region:?} overlaps output {:?}",
            self.hole
        );
        let r = region.range();
        if r.end <= self.lo.len() {
            &self.lo[r]
        } else {
            let base = self.hole.range().end;
            &self.hi[r.start - base..r.end - base]
        }
    }

    /// `region` viewed as packed `i8` samples.
    pub fn i8s(&self, region: LocalRegion) -> &'a [i8] {
        bytemuck::cast_slice(self.words(region))
    }

    /// `region` viewed as `i32` accumulators.
    pub fn i32s(&self, region: LocalRegion) -> &'a [i32] {
        bytemuck::cast_slice(self.words(region))
    }
}
