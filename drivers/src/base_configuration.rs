use crate::bits;
use crate::calibration;
use crate::configuration;

use bits::{Field, FieldWrite};

pub const BIT_COUNT: usize = 2448;

// [0, 576): one 3-bit reference field per channel of the chain (192 × 3 bits)
// [576, 2112): one 8-bit options field per channel of the chain (192 × 8 bits)
// [2112, 2448): ADC comparator and slope fields
pub const CHANNEL_OPTIONS_OFFSET: usize = 576;

const REFERENCE_WIDTH: usize = 3;
const CHANNEL_OPTIONS_STRIDE: usize = 4;

/// Channels covered by the two chains (192 each).
pub const CHANNEL_CAPACITY: usize = 2 * CHANNEL_OPTIONS_OFFSET / REFERENCE_WIDTH;

/// Converters covered by the ADC region (16 blocks of 21 bits per chain).
pub const CONVERTER_CAPACITY: usize = 32;

// The last ADC block sits at the end of the chain (2406 + 10 + 21 + 11 = 2448).
// Two consecutive blocks share 42 bits, the second one shifted by 10 bits.
const ADC_COMPARATOR_ANCHOR: usize = 2406;
const ADC_ANCHOR_STRIDE: usize = 42;
const ADC_SUB_STRIDE: usize = 10;
const ADC_SLOPE_GAP: usize = 20;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Bits(#[from] bits::Error),

    #[error("Too many channels (the base configuration holds {capacity}, got {count})")]
    TooManyChannels { count: usize, capacity: usize },

    #[error("Too many ADCs (the base configuration holds {capacity}, got {count})")]
    TooManyConverters { count: usize, capacity: usize },
}

/// Chain (0 for even channels, 1 for odd channels) holding a channel's fields.
pub fn chain(channel: usize) -> usize {
    channel % 2
}

// Channels are wired in reverse order: the last channel of each parity sits at offset 0.
// Requires channel < channel_count.
fn reference_offset(channel: usize, channel_count: usize) -> usize {
    let parity = chain(channel);
    let last = if (channel_count - 1) % 2 == parity {
        channel_count - 1
    } else {
        channel_count - 2
    };
    (last - channel) / 2 * REFERENCE_WIDTH
}

/// Offset of a channel's options byte (AP gain, LFP gain, reserved bit, full bandwidth bit).
pub fn channel_options_offset(channel: usize) -> usize {
    CHANNEL_OPTIONS_OFFSET + (channel - chain(channel)) * CHANNEL_OPTIONS_STRIDE
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ConverterOffsets {
    chain: usize,
    comparator: usize, // CompP (5 bits) then CompN (5 bits)
    slope: usize,      // Slope (3 bits), Fine (2 bits), Coarse (2 bits), Cfix (4 bits)
}

// Requires converter < CONVERTER_CAPACITY.
fn converter_offsets(converter: usize) -> ConverterOffsets {
    let pair = converter / 2;
    let comparator =
        ADC_COMPARATOR_ANCHOR - ADC_ANCHOR_STRIDE * (pair / 2) + (pair % 2) * ADC_SUB_STRIDE;
    ConverterOffsets {
        chain: converter % 2,
        comparator,
        slope: comparator + ADC_SLOPE_GAP + (pair % 2),
    }
}

fn channel_writes(
    channel: usize,
    channel_count: usize,
    configuration: &configuration::Configuration,
) -> [FieldWrite; 5] {
    let options = channel_options_offset(channel);
    [
        FieldWrite::new(
            Field::Reference,
            reference_offset(channel, channel_count),
            REFERENCE_WIDTH,
            configuration.reference.bits() as u32,
        ),
        FieldWrite::new(Field::ApGain, options, 3, configuration.ap_gain.index() as u32),
        FieldWrite::new(
            Field::LfpGain,
            options + 3,
            3,
            configuration.lfp_gain.index() as u32,
        ),
        FieldWrite::new(Field::Reserved, options + 6, 1, 0),
        FieldWrite::new(
            Field::FullBandwidth,
            options + 7,
            1,
            (!configuration.ap_filter) as u32,
        ),
    ]
}

fn converter_writes(
    offsets: &ConverterOffsets,
    converter: &calibration::ConverterCalibration,
) -> [FieldWrite; 6] {
    [
        FieldWrite::new(Field::CompP, offsets.comparator, 5, converter.comp_p as u32),
        FieldWrite::new(Field::CompN, offsets.comparator + 5, 5, converter.comp_n as u32),
        FieldWrite::new(Field::Slope, offsets.slope, 3, converter.slope as u32),
        FieldWrite::new(Field::Fine, offsets.slope + 3, 2, converter.fine as u32),
        FieldWrite::new(Field::Coarse, offsets.slope + 5, 2, converter.coarse as u32),
        FieldWrite::new(Field::Cfix, offsets.slope + 7, 4, converter.cfix as u32),
    ]
}

/// Builds the even-channel (index 0) and odd-channel (index 1) base configuration chains.
pub fn assemble(
    configuration: &configuration::Configuration,
    channel_count: usize,
    converters: &[calibration::ConverterCalibration],
) -> Result<[bits::Bits; 2], Error> {
    if channel_count > CHANNEL_CAPACITY {
        return Err(Error::TooManyChannels {
            count: channel_count,
            capacity: CHANNEL_CAPACITY,
        });
    }
    if converters.len() > CONVERTER_CAPACITY {
        return Err(Error::TooManyConverters {
            count: converters.len(),
            capacity: CONVERTER_CAPACITY,
        });
    }
    let mut builders = [bits::Builder::new(BIT_COUNT), bits::Builder::new(BIT_COUNT)];
    for channel in 0..channel_count {
        builders[chain(channel)].write_all(channel_writes(channel, channel_count, configuration))?;
    }
    for (index, converter) in converters.iter().enumerate() {
        let offsets = converter_offsets(index);
        builders[offsets.chain].write_all(converter_writes(&offsets, converter))?;
    }
    let [even, odd] = builders;
    Ok([even.build(), odd.build()])
}
