// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Page addressing for external memories.
//!
//! A device is a flat byte range split into fixed-size pages. Writes on these devices must not
//! cross a page boundary, so a linear `(offset, length)` request is planned as a sequence of
//! [`Chunk`]s, each fully inside one page. Together they tile `[offset, offset + length)` with
//! no gap and no overlap.

use crate::error::RangeError;

/// Geometry of a paged memory device.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MemoryRegion {
    capacity: u32,
    page_size: u32,
}

impl MemoryRegion {
    /// Describe a device of `capacity` bytes organised in pages of `page_size` bytes.
    ///
    /// The capacity is rounded down to a whole number of pages. `page_size` must be non-zero.
    pub const fn new(capacity: u32, page_size: u32) -> Self {
        assert!(page_size > 0, "page size must be non-zero");
        Self {
            capacity: capacity - capacity % page_size,
            page_size,
        }
    }

    /// Describe a device by its page count.
    pub const fn with_pages(page_count: u32, page_size: u32) -> Self {
        Self::new(page_count * page_size, page_size)
    }

    #[inline]
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    #[inline]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    #[inline]
    pub const fn page_count(&self) -> u32 {
        self.capacity / self.page_size
    }

    /// Split a flat offset into `(page, byte_in_page)`.
    #[inline]
    pub const fn locate(&self, offset: u32) -> (u32, u32) {
        (offset / self.page_size, offset % self.page_size)
    }

    /// Flat offset of `byte_in_page` within `page`.
    #[inline]
    pub const fn offset_of(&self, page: u32, byte_in_page: u32) -> u32 {
        page * self.page_size + byte_in_page
    }

    /// Check that `[offset, offset + len)` is a non-empty range inside the device.
    pub fn check_range(&self, offset: u32, len: usize) -> Result<(), RangeError> {
        let len = u32::try_from(len).map_err(|_| RangeError)?;
        if len == 0 {
            return Err(RangeError);
        }
        match offset.checked_add(len) {
            Some(end) if end <= self.capacity => Ok(()),
            _ => Err(RangeError),
        }
    }

    /// Check a single-page access: the page exists, the byte address is inside the page and
    /// `len` bytes starting there do not run past the end of the page.
    pub fn check_page(&self, page: u32, byte_in_page: u32, len: usize) -> Result<(), RangeError> {
        if page >= self.page_count() || byte_in_page >= self.page_size {
            return Err(RangeError);
        }
        let len = u32::try_from(len).map_err(|_| RangeError)?;
        if len == 0 || byte_in_page + len > self.page_size {
            return Err(RangeError);
        }
        Ok(())
    }

    /// Plan a transfer of `length` bytes starting at `offset`.
    ///
    /// Fails if `length` is zero or the range runs past the device capacity.
    pub fn plan_transfer(&self, offset: u32, length: usize) -> Result<PageCursor, RangeError> {
        self.check_range(offset, length)?;
        let (page_index, byte_in_page) = self.locate(offset);
        Ok(PageCursor {
            page_index,
            byte_in_page,
            remaining: length as u32,
            consumed: 0,
            page_size: self.page_size,
        })
    }
}

/// One page-bounded piece of a transfer.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Chunk {
    pub page: u32,
    pub byte_in_page: u32,
    pub len: u32,
    /// Position of this chunk in the caller's buffer.
    pub buffer_offset: usize,
}

impl Chunk {
    /// Range of the caller's buffer covered by this chunk.
    #[inline]
    pub fn buffer_range(&self) -> core::ops::Range<usize> {
        self.buffer_offset..self.buffer_offset + self.len as usize
    }
}

/// Iterator over the chunks of a planned transfer.
#[derive(Clone, Debug)]
pub struct PageCursor {
    page_index: u32,
    byte_in_page: u32,
    remaining: u32,
    consumed: u32,
    page_size: u32,
}

impl PageCursor {
    #[inline]
    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    #[inline]
    pub fn byte_in_page(&self) -> u32 {
        self.byte_in_page
    }

    #[inline]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

impl Iterator for PageCursor {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.remaining == 0 {
            return None;
        }

        let len = self.remaining.min(self.page_size - self.byte_in_page);
        let chunk = Chunk {
            page: self.page_index,
            byte_in_page: self.byte_in_page,
            len,
            buffer_offset: self.consumed as usize,
        };

        self.remaining -= len;
        self.consumed += len;
        if self.remaining > 0 {
            self.page_index += 1;
            self.byte_in_page = 0;
        }

        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.remaining == 0 {
            return (0, Some(0));
        }
        let first = self.page_size - self.byte_in_page;
        let n = if self.remaining <= first {
            1
        } else {
            1 + (self.remaining - first).div_ceil(self.page_size)
        };
        (n as usize, Some(n as usize))
    }
}

impl ExactSizeIterator for PageCursor {}
