//! Bump allocator over a reserved address range.
//!
//! [`ScratchAllocator`] hands out [`ScratchBlock`]s that borrow the
//! allocator. Epoch resets ([`reset`](ScratchAllocator::reset),
//! [`reset_to_marker`](ScratchAllocator::reset_to_marker)) take `&mut self`,
//! so the borrow checker proves no block survives the epoch that produced
//! it.

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::ScratchConfig;
use crate::error::ScratchError;
use crate::raw::{self, RawSlice, Region};

/// Round `value` up to the next multiple of `align` (a power of two).
///
/// Returns `None` on overflow.
pub fn align_up(value: usize, align: usize) -> Option<usize> {
    debug_assert!(align.is_power_of_two());
    value.checked_add(align - 1).map(|v| v & !(align - 1))
}

// ── ScratchMarker ─────────────────────────────────────────────────

/// A saved arena offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScratchMarker(usize);

impl ScratchMarker {
    /// Byte offset the marker restores to.
    pub fn offset(self) -> usize {
        self.0
    }
}

// ── ScratchBlock ──────────────────────────────────────────────────

/// A block of scratch memory, valid until the arena is next reset.
pub struct ScratchBlock<'a> {
    raw: RawSlice,
    offset: usize,
    _arena: PhantomData<&'a ScratchAllocator>,
}

impl ScratchBlock<'_> {
    /// Byte offset of this block from the arena base.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Absolute start address. Useful for alignment checks.
    pub fn addr(&self) -> usize {
        self.raw.addr()
    }
}

impl Deref for ScratchBlock<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.raw.as_slice()
    }
}

impl DerefMut for ScratchBlock<'_> {
    fn deref_mut(&mut self) -> &mut [u8] {
        self.raw.as_mut_slice()
    }
}

impl fmt::Debug for ScratchBlock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScratchBlock")
            .field("offset", &self.offset)
            .field("len", &self.raw.len())
            .finish()
    }
}

// ── ScratchAllocator ──────────────────────────────────────────────

struct ArenaState {
    region: Option<Region>,
    current: usize,
    minimum_block: usize,
    page_size: usize,
}

/// Linear allocator over one large reserved range.
///
/// Invariant: `0 <= current <= committed <= reserved`. Every block is
/// aligned up from `current`, lies entirely in committed memory, and never
/// overlaps another block from the same epoch.
///
/// `allocate`, `try_allocate` and `ensure_free_size` take an internal
/// mutex and may be called from several threads at once. Everything that
/// moves `current` backwards needs `&mut self`.
pub struct ScratchAllocator {
    state: Mutex<ArenaState>,
}

impl ScratchAllocator {
    /// An allocator with no memory. Call [`initialize`](Self::initialize)
    /// before allocating.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ArenaState {
                region: None,
                current: 0,
                minimum_block: 0,
                page_size: raw::page_size(),
            }),
        }
    }

    /// Create and initialise from a [`ScratchConfig`].
    pub fn from_config(config: &ScratchConfig) -> Result<Self, ScratchError> {
        let mut arena = Self::new();
        arena.initialize(config.minimum_block_size, config.reserve_size)?;
        Ok(arena)
    }

    fn lock(&self) -> MutexGuard<'_, ArenaState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&mut self) -> &mut ArenaState {
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reserve `reserve_size` bytes of address space and set the commit
    /// granularity.
    ///
    /// Any previous region is released first. On failure the arena is
    /// left without memory.
    pub fn initialize(
        &mut self,
        minimum_block_size: usize,
        reserve_size: usize,
    ) -> Result<(), ScratchError> {
        let state = self.state_mut();
        state.region = None;
        state.current = 0;
        if reserve_size == 0 {
            return Err(ScratchError::InvalidReserveSize);
        }
        let page = state.page_size;
        let rounded = align_up(reserve_size, page).ok_or(ScratchError::ReservationFailed {
            requested: reserve_size,
            reason: "size overflows the address space".into(),
        })?;
        state.region = Some(Region::reserve(rounded)?);
        state.minimum_block = minimum_block_size.max(page);
        log::debug!(
            "scratch arena reserved {rounded} bytes, committing in {} byte chunks",
            state.minimum_block
        );
        Ok(())
    }

    /// `true` once [`initialize`](Self::initialize) succeeded and the
    /// memory has not been freed.
    pub fn is_initialized(&self) -> bool {
        self.lock().region.is_some()
    }

    /// Base address of the reserved range, or `None` when uninitialised or
    /// freed.
    pub fn base(&self) -> Option<usize> {
        self.lock().region.as_ref().map(Region::base_addr)
    }

    /// Grow the committed prefix so `[0, end)` is backed.
    fn commit_through(
        region: &mut Region,
        end: usize,
        minimum_block: usize,
        page: usize,
    ) -> Result<(), ScratchError> {
        let committed = region.committed();
        if end <= committed {
            return Ok(());
        }
        let grow = (end - committed).max(minimum_block);
        let target = committed
            .checked_add(grow)
            .and_then(|t| align_up(t, page))
            .map_or(region.reserved(), |t| t.min(region.reserved()));
        region.commit(target)
    }

    /// Allocate `size` bytes aligned to `alignment`.
    ///
    /// Returns `Ok(None)` for `size == 0`. With `clear_to_zero` the block
    /// is zero-filled; otherwise it may hold bytes from an earlier epoch.
    pub fn try_allocate(
        &self,
        size: usize,
        alignment: usize,
        clear_to_zero: bool,
    ) -> Result<Option<ScratchBlock<'_>>, ScratchError> {
        if size == 0 {
            return Ok(None);
        }
        let mut guard = self.lock();
        let ArenaState {
            region,
            current,
            minimum_block,
            page_size,
        } = &mut *guard;
        if alignment == 0 || !alignment.is_power_of_two() || alignment > *page_size {
            return Err(ScratchError::InvalidAlignment { alignment });
        }
        let region = region.as_mut().ok_or(ScratchError::NotInitialized)?;

        let reserved = region.reserved();
        let start = align_up(*current, alignment).unwrap_or(usize::MAX);
        let end = match start.checked_add(size) {
            Some(end) if end <= reserved => end,
            _ => {
                return Err(ScratchError::CapacityExceeded {
                    requested: size,
                    available: reserved.saturating_sub(start),
                })
            }
        };
        Self::commit_through(region, end, *minimum_block, *page_size)?;
        let mut raw = region.carve(start, size);
        *current = end;
        drop(guard);

        if clear_to_zero {
            raw.as_mut_slice().fill(0);
        }
        Ok(Some(ScratchBlock {
            raw,
            offset: start,
            _arena: PhantomData,
        }))
    }

    /// Allocate `size` bytes aligned to `alignment`.
    ///
    /// Returns `None` for `size == 0`.
    ///
    /// # Panics
    ///
    /// Panics if the block does not fit in the reserved range, the
    /// alignment is invalid, or the arena is uninitialised. The arena is
    /// sized up front; running out is a configuration bug, not a runtime
    /// condition. Use [`try_allocate`](Self::try_allocate) to branch
    /// instead.
    pub fn allocate(
        &self,
        size: usize,
        alignment: usize,
        clear_to_zero: bool,
    ) -> Option<ScratchBlock<'_>> {
        match self.try_allocate(size, alignment, clear_to_zero) {
            Ok(block) => block,
            Err(e) => panic!("scratch allocation of {size} bytes failed: {e}"),
        }
    }

    /// Commit enough memory that the next `size` bytes can be allocated
    /// without touching the OS.
    pub fn ensure_free_size(&self, size: usize) -> Result<(), ScratchError> {
        let mut guard = self.lock();
        let ArenaState {
            region,
            current,
            minimum_block,
            page_size,
        } = &mut *guard;
        let region = region.as_mut().ok_or(ScratchError::NotInitialized)?;
        let end = match current.checked_add(size) {
            Some(end) if end <= region.reserved() => end,
            _ => {
                return Err(ScratchError::CapacityExceeded {
                    requested: size,
                    available: region.reserved() - *current,
                })
            }
        };
        Self::commit_through(region, end, *minimum_block, *page_size)
    }

    /// Start a new epoch at offset zero.
    ///
    /// With `free_memory` the whole range is returned to the OS and
    /// [`base`](Self::base) reports `None` until the next `initialize`.
    pub fn reset(&mut self, free_memory: bool) {
        let state = self.state_mut();
        state.current = 0;
        if free_memory {
            if let Some(region) = state.region.take() {
                log::debug!("scratch arena released {} bytes", region.reserved());
            }
        }
    }

    /// Save the current offset.
    pub fn marker(&self) -> ScratchMarker {
        ScratchMarker(self.lock().current)
    }

    /// Rewind to a saved offset, freeing everything allocated since.
    pub fn reset_to_marker(&mut self, marker: ScratchMarker) -> Result<(), ScratchError> {
        let state = self.state_mut();
        if marker.0 > state.current {
            return Err(ScratchError::InvalidMarker {
                marker: marker.0,
                current: state.current,
            });
        }
        state.current = marker.0;
        Ok(())
    }

    /// Offset the next allocation with `alignment` would start at.
    pub fn current_offset(&self, alignment: usize) -> usize {
        let current = self.lock().current;
        if alignment.is_power_of_two() {
            align_up(current, alignment).unwrap_or(current)
        } else {
            current
        }
    }

    /// Bytes handed out in the current epoch, including alignment padding.
    pub fn used(&self) -> usize {
        self.lock().current
    }

    /// Bytes of the range currently backed by memory.
    pub fn committed(&self) -> usize {
        self.lock().region.as_ref().map_or(0, Region::committed)
    }

    /// Bytes of address space reserved.
    pub fn reserved(&self) -> usize {
        self.lock().region.as_ref().map_or(0, Region::reserved)
    }

    /// Committed bytes not yet handed out in this epoch.
    pub fn committed_left(&self) -> usize {
        let state = self.lock();
        state
            .region
            .as_ref()
            .map_or(0, |r| r.committed() - state.current)
    }

    /// Reserved bytes not yet handed out in this epoch.
    pub fn reserved_left(&self) -> usize {
        let state = self.lock();
        state
            .region
            .as_ref()
            .map_or(0, |r| r.reserved() - state.current)
    }

    /// OS page size the arena commits in.
    pub fn page_size(&self) -> usize {
        self.lock().page_size
    }

    /// Commit granularity in bytes.
    pub fn minimum_block_size(&self) -> usize {
        self.lock().minimum_block
    }
}

impl Default for ScratchAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ScratchAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ScratchAllocator")
            .field("initialized", &state.region.is_some())
            .field("current", &state.current)
            .field("committed", &state.region.as_ref().map_or(0, Region::committed))
            .field("reserved", &state.region.as_ref().map_or(0, Region::reserved))
            .finish()
    }
}

// Compile-time assertion: the arena can be shared with backend worker
// threads.
const _: () = {
    #[allow(dead_code)]
    fn assert_send_sync<T: Send + Sync>() {}
    #[allow(dead_code)]
    fn check() {
        assert_send_sync::<ScratchAllocator>();
        assert_send_sync::<ScratchBlock<'static>>();
    }
};
