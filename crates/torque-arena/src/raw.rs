//! Page-level memory primitives for the scratch arena.
//!
//! [`Region`] owns one reserved virtual range. On unix the range is mapped
//! `PROT_NONE` and pages are made accessible on commit; elsewhere it falls
//! back to one zeroed heap allocation and commit only moves a counter.
//!
//! [`RawSlice`] is a view of a committed sub-range. The arena guarantees
//! that live slices never overlap, which is what makes handing out
//! `&mut [u8]` from them sound.

#![allow(unsafe_code)]

use std::ptr::NonNull;

use crate::error::ScratchError;

const FALLBACK_PAGE_SIZE: usize = 4096;

/// OS page size in bytes.
pub(crate) fn page_size() -> usize {
    #[cfg(unix)]
    {
        // SAFETY: sysconf has no preconditions and does not touch memory
        // we own.
        let n = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if n > 0 {
            return n as usize;
        }
    }
    FALLBACK_PAGE_SIZE
}

// ── Region ────────────────────────────────────────────────────────

/// A reserved virtual address range with a committed prefix.
pub(crate) struct Region {
    base: NonNull<u8>,
    reserved: usize,
    committed: usize,
}

// SAFETY: Region exclusively owns its mapping. The base pointer is never
// reassigned, and all writes to the mapped memory go through RawSlices
// the arena keeps disjoint.
unsafe impl Send for Region {}
// SAFETY: see above. `&Region` only exposes the base pointer and sizes.
unsafe impl Sync for Region {}

#[cfg(any(target_os = "linux", target_os = "android"))]
const MAP_EXTRA: libc::c_int = libc::MAP_NORESERVE;
#[cfg(all(unix, not(any(target_os = "linux", target_os = "android"))))]
const MAP_EXTRA: libc::c_int = 0;

impl Region {
    /// Reserve `size` bytes of address space. `size` must be a non-zero
    /// multiple of the page size.
    #[cfg(unix)]
    pub(crate) fn reserve(size: usize) -> Result<Self, ScratchError> {
        // SAFETY: anonymous private mapping with a null hint; no existing
        // memory is affected. PROT_NONE means nothing is readable until
        // `commit`.
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                size,
                libc::PROT_NONE,
                libc::MAP_PRIVATE | libc::MAP_ANON | MAP_EXTRA,
                -1,
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(ScratchError::ReservationFailed {
                requested: size,
                reason: std::io::Error::last_os_error().to_string(),
            });
        }
        let base = NonNull::new(ptr.cast::<u8>()).ok_or_else(|| ScratchError::ReservationFailed {
            requested: size,
            reason: "mmap returned null".into(),
        })?;
        Ok(Self {
            base,
            reserved: size,
            committed: 0,
        })
    }

    /// Reserve `size` bytes. Without virtual memory control the whole
    /// range is allocated (zeroed) immediately.
    #[cfg(not(unix))]
    pub(crate) fn reserve(size: usize) -> Result<Self, ScratchError> {
        let layout = std::alloc::Layout::from_size_align(size, page_size()).map_err(|e| {
            ScratchError::ReservationFailed {
                requested: size,
                reason: e.to_string(),
            }
        })?;
        // SAFETY: layout has non-zero size (checked by the caller).
        let ptr = unsafe { std::alloc::alloc_zeroed(layout) };
        let base = NonNull::new(ptr).ok_or_else(|| ScratchError::ReservationFailed {
            requested: size,
            reason: "allocation failed".into(),
        })?;
        Ok(Self {
            base,
            reserved: size,
            committed: 0,
        })
    }

    /// Start address of the range.
    pub(crate) fn base_addr(&self) -> usize {
        self.base.as_ptr() as usize
    }

    pub(crate) fn reserved(&self) -> usize {
        self.reserved
    }

    pub(crate) fn committed(&self) -> usize {
        self.committed
    }

    /// Grow the committed prefix to `target` bytes. `target` must be a
    /// page multiple no larger than the reservation. Shrinking is a no-op.
    pub(crate) fn commit(&mut self, target: usize) -> Result<(), ScratchError> {
        debug_assert!(target <= self.reserved);
        if target <= self.committed {
            return Ok(());
        }
        #[cfg(unix)]
        {
            let len = target - self.committed;
            // SAFETY: [committed, target) lies inside our mapping and
            // `committed` is page aligned, as mprotect requires. Newly
            // accessible anonymous pages read as zero.
            let rc = unsafe {
                libc::mprotect(
                    self.base.as_ptr().add(self.committed).cast::<libc::c_void>(),
                    len,
                    libc::PROT_READ | libc::PROT_WRITE,
                )
            };
            if rc != 0 {
                return Err(ScratchError::CommitFailed {
                    target,
                    reason: std::io::Error::last_os_error().to_string(),
                });
            }
        }
        self.committed = target;
        Ok(())
    }

    /// View `[offset, offset + len)` of the committed prefix.
    ///
    /// The caller must not carve a range overlapping any slice still in
    /// use.
    pub(crate) fn carve(&self, offset: usize, len: usize) -> RawSlice {
        assert!(
            offset.checked_add(len).is_some_and(|end| end <= self.committed),
            "carve outside committed memory"
        );
        // SAFETY: offset <= committed <= reserved, so the result stays
        // inside the mapping and cannot be null.
        let ptr = unsafe { NonNull::new_unchecked(self.base.as_ptr().add(offset)) };
        RawSlice { ptr, len }
    }
}

impl Drop for Region {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            // SAFETY: base/reserved describe exactly the mapping created
            // in `reserve`. No RawSlice outlives the Region: blocks borrow
            // the arena, and the arena needs `&mut` to drop its Region.
            let rc = unsafe {
                libc::munmap(self.base.as_ptr().cast::<libc::c_void>(), self.reserved)
            };
            if rc != 0 {
                log::warn!(
                    "munmap of {} scratch bytes failed: {}",
                    self.reserved,
                    std::io::Error::last_os_error()
                );
            }
        }
        #[cfg(not(unix))]
        {
            if let Ok(layout) = std::alloc::Layout::from_size_align(self.reserved, page_size()) {
                // SAFETY: allocated in `reserve` with this exact layout.
                unsafe { std::alloc::dealloc(self.base.as_ptr(), layout) };
            }
        }
    }
}

// ── RawSlice ──────────────────────────────────────────────────────

/// An exclusively owned, committed byte range inside a [`Region`].
pub(crate) struct RawSlice {
    ptr: NonNull<u8>,
    len: usize,
}

// SAFETY: a RawSlice is the only handle to its bytes, like `&mut [u8]`.
unsafe impl Send for RawSlice {}
// SAFETY: shared access only produces `&[u8]`.
unsafe impl Sync for RawSlice {}

impl RawSlice {
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn addr(&self) -> usize {
        self.ptr.as_ptr() as usize
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        // SAFETY: ptr..ptr+len is committed, readable memory that no other
        // live RawSlice covers (see `Region::carve`).
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: as above, and `&mut self` rules out other borrows of
        // this slice.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}
