//! Per-thread memoization for cell-to-slice resolution.
//!
//! A small direct-mapped cache: 16x16 slots indexed by the low bits of
//! the quart coordinate pair, each holding the full packed coordinate
//! fingerprint, the owning overlay's identity token, and the resolved
//! slice index. A fingerprint or token mismatch is a miss and
//! recomputes, so the cache is purely a memoization layer and can never
//! change an answer.

const CACHE_BITS: u32 = 4;
const CACHE_SIZE: usize = 1 << (2 * CACHE_BITS);
const CACHE_MASK: i32 = (1 << CACHE_BITS) - 1;

#[derive(Clone, Copy)]
struct CacheEntry {
    /// Packed (x, z) pair; disambiguates every coordinate sharing a slot.
    fingerprint: u64,
    /// Owning overlay's identity token. Tokens are process-unique, so a
    /// rebuilt overlay over the same partition and seed never hits a
    /// predecessor's entries.
    token: u64,
    slice_index: u32,
}

/// Fixed-size slice resolution cache. One per thread, shared by every
/// overlay on that thread.
pub(crate) struct SliceCache {
    entries: [Option<CacheEntry>; CACHE_SIZE],
}

impl SliceCache {
    pub(crate) const fn new() -> Self {
        Self {
            entries: [None; CACHE_SIZE],
        }
    }

    /// Look up the slice index for a position, computing and storing it
    /// on a miss.
    pub(crate) fn get_or_insert(
        &mut self,
        token: u64,
        quart_x: i32,
        quart_z: i32,
        compute: impl FnOnce() -> u32,
    ) -> u32 {
        let slot = Self::slot(quart_x, quart_z);
        let fingerprint = Self::fingerprint(quart_x, quart_z);

        if let Some(entry) = self.entries[slot]
            && entry.fingerprint == fingerprint
            && entry.token == token
        {
            return entry.slice_index;
        }

        let slice_index = compute();
        self.entries[slot] = Some(CacheEntry {
            fingerprint,
            token,
            slice_index,
        });
        slice_index
    }

    #[inline]
    fn slot(quart_x: i32, quart_z: i32) -> usize {
        ((quart_x & CACHE_MASK) as usize) | (((quart_z & CACHE_MASK) as usize) << CACHE_BITS)
    }

    #[inline]
    fn fingerprint(quart_x: i32, quart_z: i32) -> u64 {
        (u64::from(quart_x as u32) << 32) | u64::from(quart_z as u32)
    }
}
