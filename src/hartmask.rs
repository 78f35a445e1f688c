use core::fmt;

use crate::MAX_HARTS;

const BITS_PER_WORD: usize = usize::BITS as usize;
const WORDS: usize = MAX_HARTS.div_ceil(BITS_PER_WORD);

/// Fixed capacity set of hart ids.
///
/// Ids at or above [`MAX_HARTS`] are never members: `set`/`clear` ignore them and `test`
/// reports `false`.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct HartMask {
    bits: [usize; WORDS],
}

impl HartMask {
    pub const fn new() -> Self {
        Self { bits: [0; WORDS] }
    }

    pub fn set(&mut self, hartid: usize) {
        if hartid < MAX_HARTS {
            self.bits[hartid / BITS_PER_WORD] |= 1 << (hartid % BITS_PER_WORD);
        }
    }

    pub fn clear(&mut self, hartid: usize) {
        if hartid < MAX_HARTS {
            self.bits[hartid / BITS_PER_WORD] &= !(1 << (hartid % BITS_PER_WORD));
        }
    }

    pub fn test(&self, hartid: usize) -> bool {
        hartid < MAX_HARTS && self.bits[hartid / BITS_PER_WORD] & (1 << (hartid % BITS_PER_WORD)) != 0
    }

    pub fn clear_all(&mut self) {
        self.bits = [0; WORDS];
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|w| *w == 0)
    }

    pub fn count(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_subset_of(&self, other: &HartMask) -> bool {
        self.bits
            .iter()
            .zip(other.bits.iter())
            .all(|(a, b)| a & !b == 0)
    }

    /// Member hart ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..MAX_HARTS).filter(move |h| self.test(*h))
    }

    /// Returns one machine word of the set starting at `hbase`: bit `i` of the result is hart
    /// `hbase + i`. This is the `(hart_mask, hart_mask_base)` view SBI calls work with.
    pub fn window(&self, hbase: usize) -> usize {
        if hbase >= MAX_HARTS {
            return 0;
        }

        let word = hbase / BITS_PER_WORD;
        let offset = hbase % BITS_PER_WORD;

        let mut ret = self.bits[word] >> offset;
        if offset != 0 && word + 1 < WORDS {
            ret |= (self.bits[word + 1] & ((1 << offset) - 1)) << (BITS_PER_WORD - offset);
        }
        ret
    }
}

impl FromIterator<usize> for HartMask {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut mask = HartMask::new();
        for hartid in iter {
            mask.set(hartid);
        }
        mask
    }
}

impl fmt::Debug for HartMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
