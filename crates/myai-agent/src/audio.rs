// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sample-level helpers used between the audio codec and the speech
//! collaborators.

use myai_core::MyaiError;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

/// Scales float samples by their peak into the 16-bit PCM range.
///
/// Silence (all zeros) stays silent. Non-finite samples are treated as zero.
pub fn normalize_to_pcm16(samples: &[f32]) -> Vec<i16> {
    let peak = samples
        .iter()
        .filter(|s| s.is_finite())
        .fold(0.0_f32, |peak, s| peak.max(s.abs()));

    if peak == 0.0 {
        return vec![0; samples.len()];
    }

    samples
        .iter()
        .map(|&s| {
            let s = if s.is_finite() { s } else { 0.0 };
            (s / peak * f32::from(i16::MAX)).round() as i16
        })
        .collect()
}

/// Frames fed to the resampler per call.
const RESAMPLE_CHUNK: usize = 1024;

/// Band-limited resampler for mono input.
///
/// Uses a windowed-sinc filter whose cutoff follows the lower of the two
/// Nyquist frequencies, so content above the target band is removed rather
/// than folded back. The filter delay is trimmed and the output holds
/// `len * to_rate / from_rate` frames (rounded).
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, MyaiError> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }
    if from_rate == 0 || to_rate == 0 {
        return Err(MyaiError::Audio(format!(
            "cannot resample between {from_rate} Hz and {to_rate} Hz"
        )));
    }

    let ratio = f64::from(to_rate) / f64::from(from_rate);
    let parameters = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, parameters, RESAMPLE_CHUNK, 1)
        .map_err(|e| MyaiError::Audio(format!("resampler init failed: {e}")))?;

    let expected = (samples.len() as f64 * ratio).round() as usize;
    let delay = resampler.output_delay();
    let mut output = Vec::with_capacity(expected + delay + RESAMPLE_CHUNK);

    let mut chunks = samples.chunks_exact(RESAMPLE_CHUNK);
    for chunk in &mut chunks {
        let frames = resampler.process(&[chunk], None).map_err(resample_error)?;
        output.extend_from_slice(&frames[0]);
    }
    let tail = chunks.remainder();
    if !tail.is_empty() {
        let frames = resampler
            .process_partial(Some(&[tail][..]), None)
            .map_err(resample_error)?;
        output.extend_from_slice(&frames[0]);
    }
    while output.len() < expected + delay {
        let frames = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(resample_error)?;
        if frames[0].is_empty() {
            break;
        }
        output.extend_from_slice(&frames[0]);
    }

    output.drain(..delay.min(output.len()));
    output.truncate(expected);
    Ok(output)
}

fn resample_error(err: rubato::ResampleError) -> MyaiError {
    MyaiError::Audio(format!("resampling failed: {err}"))
}
