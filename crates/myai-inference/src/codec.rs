// SPDX-FileCopyrightText: 2026 MyAI Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audio container decoding (symphonia) and WAV encoding (hound).

use std::io::Cursor;

use myai_core::{AudioCodec, MyaiError, Waveform};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

/// Decodes any container symphonia can probe into interleaved f32 samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaCodec;

impl SymphoniaCodec {
    pub fn new() -> Self {
        Self
    }
}

fn audio_error(context: &str, err: impl std::fmt::Display) -> MyaiError {
    MyaiError::Audio(format!("{context}: {err}"))
}

impl AudioCodec for SymphoniaCodec {
    fn decode(&self, bytes: &[u8]) -> Result<Waveform, MyaiError> {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

        let probed = symphonia::default::get_probe()
            .format(
                &Hint::new(),
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| audio_error("unrecognized audio container", e))?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| MyaiError::Audio("no supported audio track found".to_string()))?;
        let track_id = track.id;
        let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
        let mut channels = track
            .codec_params
            .channels
            .map(|c| c.count() as u16)
            .unwrap_or(0);

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| audio_error("unsupported codec", e))?;

        let mut samples = Vec::new();
        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(audio_error("failed to read packet", e)),
            };
            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    debug!(error = e, "skipping undecodable packet");
                    continue;
                }
                Err(e) => return Err(audio_error("decode failed", e)),
            };

            let spec = *decoded.spec();
            sample_rate = spec.rate;
            channels = spec.channels.count() as u16;

            let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            buffer.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buffer.samples());
        }

        if sample_rate == 0 || channels == 0 {
            return Err(MyaiError::Audio(
                "audio stream has no sample rate or channel layout".to_string(),
            ));
        }

        debug!(samples = samples.len(), channels, sample_rate, "audio decoded");
        Ok(Waveform {
            samples,
            channels,
            sample_rate,
        })
    }

    fn encode_wav(&self, pcm: &[i16], sample_rate: u32) -> Result<Vec<u8>, MyaiError> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut out = Vec::new();
        {
            let mut writer = hound::WavWriter::new(Cursor::new(&mut out), spec)
                .map_err(|e| audio_error("failed to start WAV", e))?;
            for &sample in pcm {
                writer
                    .write_sample(sample)
                    .map_err(|e| audio_error("failed to write WAV sample", e))?;
            }
            writer
                .finalize()
                .map_err(|e| audio_error("failed to finalize WAV", e))?;
        }
        Ok(out)
    }
}
