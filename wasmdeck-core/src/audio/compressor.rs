//! Dynamics compressor stage.
//!
//! Sits between the master gain and the output so that many summed voices do
//! not clip. Feed-forward design: a smoothed level detector drives a soft-knee
//! gain computer; both channels of a frame share one gain value.

/// Compressor curve and ballistics.
#[derive(Clone, Copy, Debug)]
pub struct CompressorParams {
    /// Level above which compression starts taking effect, in dB.
    pub threshold_db: f32,
    /// Width of the soft transition region around the threshold, in dB.
    pub knee_db: f32,
    /// Input change, in dB, needed for 1 dB of output change.
    pub ratio: f32,
    /// Seconds to reduce the gain by 10 dB.
    pub attack: f32,
    /// Seconds to restore the gain by 10 dB.
    pub release: f32,
}

impl Default for CompressorParams {
    fn default() -> Self {
        Self {
            threshold_db: -50.0,
            knee_db: 40.0,
            ratio: 12.0,
            attack: 0.0,
            release: 0.25,
        }
    }
}

pub struct Compressor {
    params: CompressorParams,
    attack_coeff: f32,
    release_coeff: f32,
    /// Smoothed input level in dB.
    detector_db: f32,
}

const SILENCE_DB: f32 = -120.0;

fn smoothing_coeff(seconds: f32, sample_rate: u32) -> f32 {
    if seconds <= 0.0 {
        return 1.0;
    }
    1.0 - (-1.0 / (seconds * sample_rate as f32)).exp()
}

impl Compressor {
    pub fn new(params: CompressorParams, sample_rate: u32) -> Self {
        Self {
            params,
            attack_coeff: smoothing_coeff(params.attack, sample_rate),
            release_coeff: smoothing_coeff(params.release, sample_rate),
            detector_db: SILENCE_DB,
        }
    }

    /// Gain computer: output level in dB for an input level in dB.
    fn computed_db(&self, input_db: f32) -> f32 {
        let p = self.params;
        let over = input_db - p.threshold_db;
        if 2.0 * over < -p.knee_db {
            input_db
        } else if 2.0 * over.abs() <= p.knee_db {
            let knee = over + p.knee_db / 2.0;
            input_db + (1.0 / p.ratio - 1.0) * knee * knee / (2.0 * p.knee_db)
        } else {
            p.threshold_db + over / p.ratio
        }
    }

    /// Compress one stereo frame in place.
    pub fn process_frame(&mut self, left: &mut f32, right: &mut f32) {
        let peak = left.abs().max(right.abs());
        let level_db = if peak > 0.0 {
            20.0 * peak.log10()
        } else {
            SILENCE_DB
        };

        let coeff = if level_db > self.detector_db {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.detector_db += (level_db - self.detector_db) * coeff;

        let gain_db = self.computed_db(self.detector_db) - self.detector_db;
        let gain = 10.0f32.powf(gain_db / 20.0);
        *left *= gain;
        *right *= gain;
    }
}
