use crate::base_configuration;
use crate::calibration;
use crate::codec;
use crate::configuration;
use crate::gain_correction;
use crate::initialization;
use crate::shift_register;
use crate::transport;

use configuration::PROPERTIES;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Calibration(#[from] calibration::Error),

    #[error(transparent)]
    BaseConfiguration(#[from] base_configuration::Error),

    #[error(transparent)]
    Codec(#[from] codec::Error),

    #[error(transparent)]
    ShiftRegister(#[from] shift_register::Error),

    #[error(transparent)]
    Transport(#[from] transport::Error),

    #[error("The calibration covers {calibration} channels (the probe has {probe})")]
    ChannelCount { calibration: usize, probe: usize },

    #[error("The calibration covers {calibration} ADCs (the probe has {probe})")]
    ConverterCount { calibration: usize, probe: usize },

    #[error("The calibration was loaded for AP gain {calibration_ap} and LFP gain {calibration_lfp} (the configuration uses {ap} and {lfp})")]
    GainMismatch {
        calibration_ap: configuration::Gain,
        calibration_lfp: configuration::Gain,
        ap: configuration::Gain,
        lfp: configuration::Gain,
    },
}

fn check_gains(
    configuration: &configuration::Configuration,
    calibration: &calibration::Calibration,
) -> Result<(), Error> {
    let record = &calibration.record;
    if record.ap_gain != configuration.ap_gain || record.lfp_gain != configuration.lfp_gain {
        return Err(Error::GainMismatch {
            calibration_ap: record.ap_gain,
            calibration_lfp: record.lfp_gain,
            ap: configuration.ap_gain,
            lfp: configuration.lfp_gain,
        });
    }
    Ok(())
}

/// A configuration session for one probe.
///
/// Construction runs every validation step (calibration, bit assembly, encoding) without
/// touching the hardware. [`Probe::configure`] then drives the probe.
#[derive(Debug)]
pub struct Probe {
    configuration: configuration::Configuration,
    calibration: calibration::Calibration,
    images: [codec::Image; 2],
}

fn images(
    configuration: &configuration::Configuration,
    calibration: &calibration::Calibration,
) -> Result<[codec::Image; 2], Error> {
    let [even, odd] = base_configuration::assemble(
        configuration,
        calibration.record.channel_count(),
        &calibration.converters,
    )?;
    Ok([codec::encode(&even)?, codec::encode(&odd)?])
}

impl Probe {
    pub fn new(
        configuration: configuration::Configuration,
        calibration: calibration::Calibration,
    ) -> Result<Self, Error> {
        if calibration.record.channel_count() != PROPERTIES.channel_count {
            return Err(Error::ChannelCount {
                calibration: calibration.record.channel_count(),
                probe: PROPERTIES.channel_count,
            });
        }
        if calibration.converters.len() != PROPERTIES.converter_count {
            return Err(Error::ConverterCount {
                calibration: calibration.converters.len(),
                probe: PROPERTIES.converter_count,
            });
        }
        check_gains(&configuration, &calibration)?;
        let images = images(&configuration, &calibration)?;
        Ok(Self {
            configuration,
            calibration,
            images,
        })
    }

    /// Loads both calibration files for the probe's channel and ADC counts.
    pub fn open(
        configuration: configuration::Configuration,
        gain_calibration_path: Option<&std::path::Path>,
        adc_calibration_path: Option<&std::path::Path>,
    ) -> Result<Self, Error> {
        let calibration = calibration::Calibration::from_files(
            gain_calibration_path,
            adc_calibration_path,
            configuration.ap_gain,
            configuration.lfp_gain,
            PROPERTIES.channel_count,
            PROPERTIES.converter_count,
        )?;
        Self::new(configuration, calibration)
    }

    pub fn serial_number(&self) -> u64 {
        self.calibration.serial_number()
    }

    pub fn current_configuration(&self) -> &configuration::Configuration {
        &self.configuration
    }

    pub fn images(&self) -> &[codec::Image; 2] {
        &self.images
    }

    /// Rebuilds the shift register images.
    ///
    /// Gain correction columns are selected when the calibration is loaded, so gain changes
    /// require a new [`Probe`] (see [`Probe::open`]).
    pub fn update_configuration(
        &mut self,
        configuration: configuration::Configuration,
    ) -> Result<(), Error> {
        check_gains(&configuration, &self.calibration)?;
        self.images = images(&configuration, &self.calibration)?;
        self.configuration = configuration;
        Ok(())
    }

    /// Writes the base configuration chains and the gain correction, then starts acquisition.
    ///
    /// Any error leaves the probe unconfigured; run the whole sequence again.
    pub fn configure<T: transport::Transport>(&self, transport: &mut T) -> Result<(), Error> {
        shift_register::write_base_configuration(transport, &self.images)?;
        gain_correction::write(transport, &self.calibration)?;
        initialization::initialize(transport)?;
        tracing::info!(
            serial = self.serial_number(),
            ap_gain = %self.configuration.ap_gain,
            lfp_gain = %self.configuration.lfp_gain,
            ap_filter = self.configuration.ap_filter,
            "probe configured"
        );
        Ok(())
    }
}
