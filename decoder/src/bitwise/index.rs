use std::ops::Add;

/// Zero-based position of a bit, counted from the least significant bit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BitIndex(usize);

impl BitIndex {
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

/// Number of bits in a field or value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BitSize(usize);

impl BitSize {
    #[must_use]
    pub const fn new(size: usize) -> Self {
        Self(size)
    }

    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl Add<BitSize> for BitIndex {
    type Output = Self;

    fn add(self, size: BitSize) -> Self {
        Self(self.0.saturating_add(size.0))
    }
}

/// A run of `size` contiguous bits starting at `begin`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BitRange {
    begin: BitIndex,
    size: BitSize,
}

impl BitRange {
    #[must_use]
    pub const fn new(begin: BitIndex, size: BitSize) -> Self {
        Self { begin, size }
    }

    #[must_use]
    pub const fn begin(self) -> BitIndex {
        self.begin
    }

    #[must_use]
    pub const fn size(self) -> BitSize {
        self.size
    }

    /// First index past the range.
    #[must_use]
    pub const fn end(self) -> BitIndex {
        BitIndex(self.begin.0.saturating_add(self.size.0))
    }
}
