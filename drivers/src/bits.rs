use bitvec::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Reference,
    ApGain,
    LfpGain,
    Reserved,
    FullBandwidth,
    CompP,
    CompN,
    Slope,
    Fine,
    Coarse,
    Cfix,
}

impl std::fmt::Display for Field {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, formatter)
    }
}

/// A value to be written low bit first at `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldWrite {
    pub field: Field,
    pub offset: usize,
    pub width: usize,
    pub value: u32,
}

impl FieldWrite {
    pub const fn new(field: Field, offset: usize, width: usize, value: u32) -> Self {
        Self {
            field,
            offset,
            width,
            value,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{field} value {value:#X} does not fit in {width} bits")]
    FieldOverflow {
        field: Field,
        value: u32,
        width: usize,
    },

    #[error("{field} bits [{offset}, {}) exceed the {length} bits array", .offset + .width)]
    OutOfBounds {
        field: Field,
        offset: usize,
        width: usize,
        length: usize,
    },
}

#[derive(Debug)]
pub struct Builder {
    bits: BitVec<u8, Lsb0>,
}

impl Builder {
    /// All bits start cleared.
    pub fn new(length: usize) -> Self {
        Self {
            bits: BitVec::repeat(false, length),
        }
    }

    pub fn write(&mut self, write: FieldWrite) -> Result<&mut Self, Error> {
        if write.width < 32 && write.value >> write.width != 0 {
            return Err(Error::FieldOverflow {
                field: write.field,
                value: write.value,
                width: write.width,
            });
        }
        if write.offset + write.width > self.bits.len() {
            return Err(Error::OutOfBounds {
                field: write.field,
                offset: write.offset,
                width: write.width,
                length: self.bits.len(),
            });
        }
        for index in 0..write.width {
            self.bits
                .set(write.offset + index, (write.value >> index) & 1 == 1);
        }
        Ok(self)
    }

    pub fn write_all<I: IntoIterator<Item = FieldWrite>>(
        &mut self,
        writes: I,
    ) -> Result<&mut Self, Error> {
        for write in writes {
            self.write(write)?;
        }
        Ok(self)
    }

    pub fn build(self) -> Bits {
        Bits { bits: self.bits }
    }
}

/// Read-only bit array produced by [`Builder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bits {
    bits: BitVec<u8, Lsb0>,
}

impl Bits {
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        self.bits.get(index).map(|bit| *bit)
    }

    /// Reads `width` bits starting at `offset`, low bit first.
    pub fn field(&self, offset: usize, width: usize) -> Option<u32> {
        let slice = self.bits.get(offset..offset + width)?;
        Some(
            slice
                .iter()
                .enumerate()
                .fold(0, |value, (index, bit)| value | ((*bit as u32) << index)),
        )
    }

    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }

    /// Bit `i` lands in byte `i / 8` at position `i % 8`; padding bits are zero.
    pub fn as_raw_slice(&self) -> &[u8] {
        self.bits.as_raw_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn writes_low_bit_first() {
        let mut builder = Builder::new(16);
        builder
            .write(FieldWrite::new(Field::CompP, 3, 5, 0b10110))
            .unwrap();
        let bits = builder.build();
        assert_eq!(bits.len(), 16);
        assert_eq!(bits.get(3), Some(false));
        assert_eq!(bits.get(4), Some(true));
        assert_eq!(bits.get(5), Some(true));
        assert_eq!(bits.get(6), Some(false));
        assert_eq!(bits.get(7), Some(true));
        assert_eq!(bits.field(3, 5), Some(0b10110));
        assert_eq!(bits.as_raw_slice(), &[0b1011_0000, 0b0000_0000]);
        assert_eq!(bits.get(16), None);
    }

    #[test]
    fn chained_writes() {
        let mut builder = Builder::new(12);
        builder
            .write(FieldWrite::new(Field::ApGain, 0, 3, 2))
            .unwrap()
            .write(FieldWrite::new(Field::LfpGain, 3, 3, 5))
            .unwrap();
        let bits = builder.build();
        assert_eq!(bits.field(0, 3), Some(2));
        assert_eq!(bits.field(3, 3), Some(5));
        assert_eq!(bits.count_ones(), 3);
    }

    #[test]
    fn rejects_overflowing_values() {
        let mut builder = Builder::new(8);
        assert_matches!(
            builder.write(FieldWrite::new(Field::Slope, 0, 3, 8)),
            Err(Error::FieldOverflow {
                field: Field::Slope,
                value: 8,
                width: 3
            })
        );
    }

    #[test]
    fn rejects_out_of_bounds_writes() {
        let mut builder = Builder::new(8);
        assert_matches!(
            builder.write(FieldWrite::new(Field::Cfix, 6, 4, 1)),
            Err(Error::OutOfBounds {
                field: Field::Cfix,
                offset: 6,
                width: 4,
                length: 8
            })
        );
        assert_eq!(builder.build().count_ones(), 0);
    }
}
