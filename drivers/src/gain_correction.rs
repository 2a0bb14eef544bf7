use crate::calibration;
use crate::registers;
use crate::transport;

use transport::Transport;

pub const FRACTIONAL_BITS: u32 = 14;

const OFFSET_MASK: u32 = 0x3F;
const THRESHOLD_MASK: u32 = 0x3FF;

/// Converts a gain correction coefficient to the headstage's Q14 format.
///
/// Values outside [0, 2^18) saturate when cast; keeping coefficients in range is up to the caller.
pub fn fixed_point(coefficient: f64) -> u32 {
    (coefficient * (1u32 << FRACTIONAL_BITS) as f64).round() as u32
}

fn offset_threshold(index: usize, converter: &calibration::ConverterCalibration) -> u32 {
    let offset = converter.offset as u32;
    let threshold = converter.threshold as u32;
    if offset & !OFFSET_MASK != 0 || threshold & !THRESHOLD_MASK != 0 {
        tracing::warn!(
            converter = index,
            offset = converter.offset,
            threshold = converter.threshold,
            "ADC offset or threshold truncated to 6 and 10 bits"
        );
    }
    ((offset & OFFSET_MASK) << 10) | (threshold & THRESHOLD_MASK)
}

/// Packs two converters into one register word.
///
/// MSB [odd offset (6), odd threshold (10), even offset (6), even threshold (10)] LSB
pub fn pack_offset_threshold(
    index: usize,
    even: &calibration::ConverterCalibration,
    odd: Option<&calibration::ConverterCalibration>,
) -> u32 {
    let odd = odd.map_or(0, |odd| offset_threshold(index + 1, odd));
    (odd << 16) | offset_threshold(index, even)
}

pub fn write<T: Transport>(
    transport: &mut T,
    calibration: &calibration::Calibration,
) -> Result<(), transport::Error> {
    for (pair, converters) in calibration.converters.chunks(2).enumerate() {
        let index = pair * 2;
        registers::ADC_OFFSET_THRESHOLD.set(
            transport,
            index,
            pack_offset_threshold(index, &converters[0], converters.get(1)),
        )?;
    }
    let record = &calibration.record;
    for (channel, (lfp, ap)) in record
        .lfp_gain_correction
        .iter()
        .zip(record.ap_gain_correction.iter())
        .enumerate()
    {
        registers::CHANNEL_LFP_GAIN.set(transport, channel, fixed_point(*lfp))?;
        registers::CHANNEL_AP_GAIN.set(transport, channel, fixed_point(*ap))?;
    }
    tracing::debug!(
        converters = calibration.converters.len(),
        channels = record.channel_count(),
        "gain correction written"
    );
    Ok(())
}
