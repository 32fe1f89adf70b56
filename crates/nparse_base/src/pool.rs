//! Preallocated byte pool for analysis states.
//!
//! The traveller spawns states at a very high rate and discards them all at
//! once when a parse completes, so states come from a monotonic bump pool:
//! allocation advances a cursor, and only the most recent allocation can be
//! returned (the traveller's blocking cascade reclaims states in reverse
//! spawn order). Usage, peak usage and the total evicted size are tracked
//! for diagnostics.
//!
//! # Backing Strategies
//!
//! - **Heap**: a preallocated in-process region, the default.
//! - **Mapped**: a memory-mapped swap file for exceptionally large parses,
//!   selected with [`StatePool::set_swap_file`].
//!
//! # Example
//!
//! ```
//! use nparse_base::StatePool;
//!
//! let mut pool = StatePool::new();
//! pool.set_capacity(256).unwrap();
//!
//! let a = pool.allocate(64).unwrap();
//! let b = pool.allocate(64).unwrap();
//! assert_eq!((a, b), (0, 64));
//!
//! // Only the last allocation can be evicted.
//! assert!(!pool.evict(a, 64));
//! assert!(pool.evict(b, 64));
//! assert_eq!(pool.usage(), 64);
//! assert_eq!(pool.peak_usage(), 128);
//! ```

use crate::error::{Error, ErrorKind, Result};
use std::fs::OpenOptions;
use std::path::PathBuf;

enum Backing {
    /// No region reserved yet; capacity is zero.
    Empty,
    /// In-process heap region.
    Heap(Box<[u8]>),
    /// Memory-mapped swap file.
    Mapped(memmap2::MmapMut),
}

impl Backing {
    fn capacity(&self) -> usize {
        match self {
            Backing::Empty => 0,
            Backing::Heap(region) => region.len(),
            Backing::Mapped(map) => map.len(),
        }
    }
}

/// Monotonic bump pool with last-in eviction and peak tracking.
pub struct StatePool {
    backing: Backing,
    swap_file: Option<PathBuf>,
    used: usize,
    peak: usize,
    evicted: usize,
}

impl StatePool {
    /// Creates a pool with no reserved region; call
    /// [`set_capacity`](Self::set_capacity) before allocating.
    pub fn new() -> Self {
        StatePool {
            backing: Backing::Empty,
            swap_file: None,
            used: 0,
            peak: 0,
            evicted: 0,
        }
    }

    /// Selects a swap file to back the pool region.
    ///
    /// Takes effect on the next [`set_capacity`](Self::set_capacity) call.
    /// Errors with [`ErrorKind::Logic`] while the pool is in use.
    pub fn set_swap_file(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        if self.used > 0 {
            return Err(Error::new(
                ErrorKind::Logic,
                "unable to change the backing of a pool that is already in use",
            ));
        }
        self.swap_file = Some(path.into());
        Ok(())
    }

    /// Reserves a region of the given size, replacing any previous region.
    ///
    /// A size of zero releases the region. Errors with [`ErrorKind::Logic`]
    /// while the pool is in use.
    pub fn set_capacity(&mut self, size: usize) -> Result<()> {
        if self.used > 0 {
            return Err(Error::new(
                ErrorKind::Logic,
                "unable to change the capacity of a pool that is already in use",
            ));
        }
        if size == 0 {
            self.backing = Backing::Empty;
            return Ok(());
        }
        self.backing = match &self.swap_file {
            None => Backing::Heap(vec![0u8; size].into_boxed_slice()),
            Some(path) => {
                let file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(path)?;
                file.set_len(size as u64)?;
                // SAFETY: the pool owns the file for its whole lifetime and
                // nothing else maps or resizes it.
                let map = unsafe { memmap2::MmapMut::map_mut(&file)? };
                Backing::Mapped(map)
            }
        };
        Ok(())
    }

    /// Total reserved size in bytes.
    pub fn capacity(&self) -> usize {
        self.backing.capacity()
    }

    /// Currently allocated size in bytes.
    pub fn usage(&self) -> usize {
        self.used
    }

    /// Highest usage observed since the last [`clear`](Self::clear).
    pub fn peak_usage(&self) -> usize {
        self.peak
    }

    /// Total size returned through [`evict`](Self::evict) since the last
    /// [`clear`](Self::clear).
    pub fn evicted_size(&self) -> usize {
        self.evicted
    }

    /// Allocates `size` bytes, returning the offset of the segment.
    ///
    /// Errors with [`ErrorKind::PoolOverflow`] on exhaustion.
    pub fn allocate(&mut self, size: usize) -> Result<usize> {
        if self.used + size > self.backing.capacity() {
            return Err(Error::new(ErrorKind::PoolOverflow, "state pool exhausted"));
        }
        let offset = self.used;
        self.used += size;
        if self.used > self.peak {
            self.peak = self.used;
        }
        Ok(offset)
    }

    /// Tries to return the segment at `offset`; succeeds only for the most
    /// recent allocation.
    pub fn evict(&mut self, offset: usize, size: usize) -> bool {
        if offset + size == self.used {
            self.used -= size;
            self.evicted += size;
            true
        } else {
            false
        }
    }

    /// Releases every allocation and resets the statistics. The region
    /// itself stays reserved.
    pub fn clear(&mut self) {
        self.used = 0;
        self.peak = 0;
        self.evicted = 0;
    }

    /// Mutable view of an allocated segment.
    pub fn bytes_mut(&mut self, offset: usize, size: usize) -> &mut [u8] {
        debug_assert!(offset + size <= self.used);
        match &mut self.backing {
            Backing::Empty => &mut [],
            Backing::Heap(region) => &mut region[offset..offset + size],
            Backing::Mapped(map) => &mut map[offset..offset + size],
        }
    }
}

impl Default for StatePool {
    fn default() -> Self {
        Self::new()
    }
}
