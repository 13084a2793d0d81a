//! Two interchangeable representations of the population-protocol transition
//! function δ: `(c1, c2) -> (c1', c2')` over `u32` color identifiers.
//!
//! - [`ArrayPairMap`] is a dense `ncolors * ncolors` table: `O(1)` access,
//!   last writer wins on duplicate inserts.
//! - [`HashPairMap`] is a chained hash table sized to the next prime at or
//!   above the requested capacity, hashed with 64-bit xxh3 over the
//!   concatenated key pair; the collision chain is sorted by `(k1, k2)` to
//!   allow early exit on lookup miss, and first writer wins on duplicate
//!   inserts.
//!
//! Both are ported from `lib/intpmap.c`, collapsed to a single `u32` key/
//! value width rather than the five width-specialized variants the
//! reference implementation picks between at construction time.

mod error;
mod nextprime;

pub use error::PairMapError;
pub use nextprime::nextprime;

use xxhash_rust::xxh3::xxh3_64;

/// A realization of the transition function δ.
///
/// `lookup` returns `None` when the pair was never inserted; callers that
/// want the "unset transitions are the identity" convention apply that
/// fallback themselves (this mirrors `popsimio.c`'s `hlookup`, which layers
/// the identity fallback on top of the bare map lookup rather than baking it
/// into the map).
pub trait Delta: Send + Sync {
    /// Insert `(k1, k2) -> (v1, v2)`. Duplicate-key behavior on repeated
    /// inserts of the same `(k1, k2)` is realization-specific (see the
    /// module docs).
    fn insert(&mut self, k1: u32, k2: u32, v1: u32, v2: u32);

    /// Look up `(k1, k2)`, returning `None` if absent.
    fn lookup(&self, k1: u32, k2: u32) -> Option<(u32, u32)>;
}

/// Dense `ncolors * ncolors` realization of δ.
pub struct ArrayPairMap {
    ncolors: u32,
    table: Vec<Option<(u32, u32)>>,
}

impl ArrayPairMap {
    /// Allocate a new dense pair map over `ncolors` colors (`0..ncolors`).
    ///
    /// # Errors
    ///
    /// Returns [`PairMapError::DomainError`] if `ncolors == u32::MAX` (the
    /// reserved sentinel), or [`PairMapError::OutOfMemory`] if the
    /// `ncolors^2` backing table cannot be allocated.
    pub fn new(ncolors: u32) -> Result<Self, PairMapError> {
        if ncolors == u32::MAX {
            return Err(PairMapError::DomainError);
        }
        let cells = (ncolors as usize)
            .checked_mul(ncolors as usize)
            .ok_or(PairMapError::OutOfMemory)?;
        let mut table = Vec::new();
        table
            .try_reserve_exact(cells)
            .map_err(|_| PairMapError::OutOfMemory)?;
        table.resize(cells, None);
        Ok(ArrayPairMap { ncolors, table })
    }

    #[inline]
    fn index(&self, k1: u32, k2: u32) -> usize {
        k1 as usize * self.ncolors as usize + k2 as usize
    }
}

impl Delta for ArrayPairMap {
    fn insert(&mut self, k1: u32, k2: u32, v1: u32, v2: u32) {
        let idx = self.index(k1, k2);
        self.table[idx] = Some((v1, v2));
    }

    fn lookup(&self, k1: u32, k2: u32) -> Option<(u32, u32)> {
        self.table[self.index(k1, k2)]
    }
}

const CHAIN_START_SIZE: usize = 256;
const NO_NEXT: u64 = u64::MAX;

#[derive(Clone, Copy)]
struct Entry {
    key: (u32, u32),
    value: (u32, u32),
    next: u64,
}

impl Entry {
    const EMPTY: Entry = Entry {
        key: (u32::MAX, u32::MAX),
        value: (u32::MAX, u32::MAX),
        next: NO_NEXT,
    };
}

/// Chained-hash realization of δ, sized to the next prime above the
/// requested element count.
pub struct HashPairMap {
    nel: u64,
    buckets: Vec<Entry>,
    chain: Vec<Entry>,
}

impl HashPairMap {
    /// Allocate a new hash-backed pair map expecting approximately `nel`
    /// entries.
    ///
    /// # Errors
    ///
    /// Returns [`PairMapError::OutOfMemory`] if the bucket table cannot be
    /// allocated.
    pub fn new(nel: u64) -> Result<Self, PairMapError> {
        let nel = nextprime(nel.max(1));
        let mut buckets = Vec::new();
        buckets
            .try_reserve_exact(nel as usize)
            .map_err(|_| PairMapError::OutOfMemory)?;
        buckets.resize(nel as usize, Entry::EMPTY);

        let mut chain = Vec::new();
        chain
            .try_reserve_exact(CHAIN_START_SIZE)
            .map_err(|_| PairMapError::OutOfMemory)?;

        Ok(HashPairMap {
            nel,
            buckets,
            chain,
        })
    }

    fn hash(&self, k1: u32, k2: u32) -> usize {
        let mut bytes = [0u8; 16];
        bytes[0..4].copy_from_slice(&k1.to_le_bytes());
        bytes[4..8].copy_from_slice(&0u32.to_le_bytes());
        bytes[8..12].copy_from_slice(&k2.to_le_bytes());
        bytes[12..16].copy_from_slice(&0u32.to_le_bytes());
        (xxh3_64(&bytes) % self.nel) as usize
    }

    fn greater(a: (u32, u32), b: (u32, u32)) -> bool {
        a.0 > b.0 || (a.0 == b.0 && a.1 > b.1)
    }
}

impl Delta for HashPairMap {
    fn insert(&mut self, k1: u32, k2: u32, v1: u32, v2: u32) {
        let key = (k1, k2);
        let slot = self.hash(k1, k2);

        if self.buckets[slot].key == Entry::EMPTY.key {
            self.buckets[slot].key = key;
            self.buckets[slot].value = (v1, v2);
            return;
        }
        if self.buckets[slot].key == key {
            // First writer already occupies the bucket head.
            return;
        }

        // Walk the sorted chain, tracking the predecessor (either the
        // bucket head or a chain node) of the current position, exactly as
        // `intpmap_insert`'s `be`/`bn` pair does, stopping early on a
        // duplicate key so the first writer keeps priority.
        enum Prev {
            Bucket,
            Chain(usize),
        }
        let mut prev = Prev::Bucket;
        let mut cur = self.buckets[slot].next;

        while cur != NO_NEXT {
            let cur_idx = cur as usize;
            let cur_key = self.chain[cur_idx].key;
            if cur_key == key {
                return;
            }
            if !Self::greater(key, cur_key) {
                break;
            }
            prev = Prev::Chain(cur_idx);
            cur = self.chain[cur_idx].next;
        }

        let new_idx = self.chain.len() as u64;
        self.chain.push(Entry {
            key,
            value: (v1, v2),
            next: cur,
        });
        match prev {
            Prev::Bucket => self.buckets[slot].next = new_idx,
            Prev::Chain(p) => self.chain[p].next = new_idx,
        }
    }

    fn lookup(&self, k1: u32, k2: u32) -> Option<(u32, u32)> {
        let key = (k1, k2);
        let slot = self.hash(k1, k2);
        let bucket = &self.buckets[slot];
        if bucket.key == key {
            return Some(bucket.value);
        }
        if bucket.next == NO_NEXT {
            return None;
        }

        let mut cursor = bucket.next as usize;
        while self.chain[cursor].next != NO_NEXT && Self::greater(key, self.chain[cursor].key) {
            cursor = self.chain[cursor].next as usize;
        }

        if self.chain[cursor].key == key {
            Some(self.chain[cursor].value)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_pair_map_roundtrips() {
        let mut m = ArrayPairMap::new(5).unwrap();
        assert_eq!(m.lookup(1, 2), None);
        m.insert(1, 2, 3, 4);
        assert_eq!(m.lookup(1, 2), Some((3, 4)));
        assert_eq!(m.lookup(2, 1), None);
    }

    #[test]
    fn array_pair_map_last_writer_wins() {
        let mut m = ArrayPairMap::new(3).unwrap();
        m.insert(0, 0, 1, 1);
        m.insert(0, 0, 2, 2);
        assert_eq!(m.lookup(0, 0), Some((2, 2)));
    }

    #[test]
    fn array_pair_map_rejects_sentinel_ncolors() {
        assert_eq!(ArrayPairMap::new(u32::MAX), Err(PairMapError::DomainError));
    }

    #[test]
    fn hash_pair_map_roundtrips_many_entries() {
        let mut m = HashPairMap::new(1000).unwrap();
        for i in 0u32..500 {
            m.insert(i, i + 1, i * 2, i * 2 + 1);
        }
        for i in 0u32..500 {
            assert_eq!(m.lookup(i, i + 1), Some((i * 2, i * 2 + 1)));
        }
        assert_eq!(m.lookup(9999, 9999), None);
    }

    #[test]
    fn hash_pair_map_first_writer_wins() {
        let mut m = HashPairMap::new(16).unwrap();
        m.insert(1, 1, 10, 10);
        m.insert(1, 1, 20, 20);
        assert_eq!(m.lookup(1, 1), Some((10, 10)));
    }

    #[test]
    fn hash_pair_map_chain_duplicate_first_writer_wins() {
        // Force several distinct keys into the same bucket's chain, then
        // reinsert one of them: first-writer-wins must hold for chain
        // entries, not just for the bucket head.
        let mut m = HashPairMap::new(2).unwrap();
        for i in 0u32..8 {
            m.insert(i, 100 - i, i, i);
        }
        m.insert(3, 97, 999, 999);
        assert_eq!(m.lookup(3, 97), Some((3, 3)));
        for i in 0u32..8 {
            if i != 3 {
                assert_eq!(m.lookup(i, 100 - i), Some((i, i)));
            }
        }
    }

    #[test]
    fn hash_pair_map_handles_collisions_within_small_table() {
        // A tiny table forces every insert into the same handful of
        // buckets, exercising the sorted chain walk.
        let mut m = HashPairMap::new(2).unwrap();
        for i in 0u32..64 {
            m.insert(i, 100 - i, i, i);
        }
        for i in 0u32..64 {
            assert_eq!(m.lookup(i, 100 - i), Some((i, i)));
        }
    }
}
