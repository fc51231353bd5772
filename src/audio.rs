//! Audio playback system: WAV track decoding, cpal output, and the shared
//! transport state (play/pause/seek/position) read by the UI each frame.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::params::PulseParams;

/// Synthetic pulse level driving the orb brightness.
///
/// A slow sine over elapsed wall-clock time, evaluated every frame whether
/// or not anything is playing. Deliberately decorative: this is not signal
/// analysis, and with default parameters it stays within `[0, 0.4]`.
pub fn pulse_level(time_s: f32, params: &PulseParams) -> f32 {
    (time_s * params.rate).sin() * params.amplitude + params.offset
}

/// A fully decoded audio track: interleaved stereo frames in memory.
pub struct TrackBuffer {
    frames: Vec<[f32; 2]>,
    sample_rate: u32,
}

impl TrackBuffer {
    pub fn new(frames: Vec<[f32; 2]>, sample_rate: u32) -> Self {
        Self {
            frames,
            sample_rate,
        }
    }

    /// Decode a WAV file into stereo `f32` frames. Mono tracks are
    /// duplicated to both channels; extra channels are dropped.
    pub fn load(path: &Path) -> Result<Self, String> {
        let mut reader = hound::WavReader::open(path)
            .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;
        let spec = reader.spec();
        let channels = spec.channels as usize;
        if channels == 0 {
            return Err(format!("{}: track has no channels", path.display()));
        }

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .map_err(|e| format!("Failed to decode {}: {}", path.display(), e))?,
            hound::SampleFormat::Int => {
                let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<Result<_, _>>()
                    .map_err(|e| format!("Failed to decode {}: {}", path.display(), e))?
            }
        };

        let frames = samples
            .chunks_exact(channels)
            .map(|frame| {
                let left = frame[0];
                let right = if channels > 1 { frame[1] } else { frame[0] };
                [left, right]
            })
            .collect();

        Ok(Self::new(frames, spec.sample_rate))
    }

    pub fn len_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Track length in seconds.
    pub fn duration(&self) -> f32 {
        self.frames.len() as f32 / self.sample_rate as f32
    }

    /// Linearly interpolated frame at a fractional cursor position.
    /// Out-of-range cursors read as silence.
    pub fn sample_at(&self, cursor: f64) -> [f32; 2] {
        if cursor < 0.0 || self.frames.is_empty() {
            return [0.0, 0.0];
        }
        let index = cursor as usize;
        if index >= self.frames.len() {
            return [0.0, 0.0];
        }

        let a = self.frames[index];
        let b = *self.frames.get(index + 1).unwrap_or(&[0.0, 0.0]);
        let t = (cursor - index as f64) as f32;
        [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t]
    }
}

/// Transport state shared between the audio callback and the UI thread.
struct TransportShared {
    /// Fractional playback cursor in source frames
    cursor: Mutex<f64>,
    playing: AtomicBool,
    /// Latched when the cursor reaches end of track
    ended: AtomicBool,
}

/// Audio system owning the output stream and the transport state.
///
/// The stream runs for the lifetime of the app and mixes silence while
/// paused, so play/pause never rebuilds the device pipeline.
pub struct AudioSystem {
    shared: Arc<TransportShared>,
    duration: f32,
    track_rate: u32,
    total_frames: f64,

    /// Audio output stream (kept alive)
    _stream: cpal::Stream,
}

impl AudioSystem {
    /// Open the default output device and start a (silent) stream mixing
    /// from `track`. Playback begins on the first `play()`.
    pub fn new(track: TrackBuffer) -> Result<Self, String> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or("No audio output device found")?;

        let config = device
            .default_output_config()
            .map_err(|e| format!("Failed to get audio config: {}", e))?;

        println!(
            "Audio: {} @ {}Hz",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            config.sample_rate().0
        );

        let output_channels = config.channels() as usize;
        // Nearest-rate conversion: step the source cursor by the rate ratio
        // per output frame, interpolating between source frames.
        let step = track.sample_rate() as f64 / config.sample_rate().0 as f64;
        let duration = track.duration();
        let track_rate = track.sample_rate();
        let total_frames = track.len_frames() as f64;

        let shared = Arc::new(TransportShared {
            cursor: Mutex::new(0.0),
            playing: AtomicBool::new(false),
            ended: AtomicBool::new(false),
        });
        let shared_cb = Arc::clone(&shared);

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut cursor = shared_cb.cursor.lock().unwrap();
                    let playing = shared_cb.playing.load(Ordering::Relaxed);

                    for frame in data.chunks_mut(output_channels) {
                        let [left, right] = if playing && *cursor < total_frames {
                            let out = track.sample_at(*cursor);
                            *cursor += step;
                            out
                        } else {
                            [0.0, 0.0]
                        };

                        for (channel, sample) in frame.iter_mut().enumerate() {
                            *sample = if channel == 0 { left } else { right };
                        }
                    }

                    if playing && *cursor >= total_frames {
                        *cursor = total_frames;
                        shared_cb.playing.store(false, Ordering::Relaxed);
                        shared_cb.ended.store(true, Ordering::Relaxed);
                    }
                },
                |err| eprintln!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| format!("Failed to build audio stream: {}", e))?;

        stream
            .play()
            .map_err(|e| format!("Failed to start audio stream: {}", e))?;

        Ok(Self {
            shared,
            duration,
            track_rate,
            total_frames,
            _stream: stream,
        })
    }

    /// Start playback. After the track has ended, playing again restarts
    /// from the beginning.
    pub fn play(&self) {
        {
            let mut cursor = self.shared.cursor.lock().unwrap();
            if *cursor >= self.total_frames {
                *cursor = 0.0;
            }
        }
        self.shared.ended.store(false, Ordering::Relaxed);
        self.shared.playing.store(true, Ordering::Relaxed);
    }

    pub fn pause(&self) {
        self.shared.playing.store(false, Ordering::Relaxed);
    }

    /// Toggle play/pause; returns the new playing state.
    pub fn toggle(&self) -> bool {
        if self.is_playing() {
            self.pause();
            false
        } else {
            self.play();
            true
        }
    }

    pub fn is_playing(&self) -> bool {
        self.shared.playing.load(Ordering::Relaxed)
    }

    /// Current playback position in seconds.
    pub fn position(&self) -> f32 {
        let cursor = *self.shared.cursor.lock().unwrap();
        (cursor / self.track_rate as f64) as f32
    }

    /// Track duration in seconds.
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Jump to an absolute position, clamped to the track length. Seeking
    /// off the end keeps the ended state; seeking back clears it.
    pub fn seek(&self, seconds: f32) {
        let clamped = seconds.clamp(0.0, self.duration) as f64 * self.track_rate as f64;
        let mut cursor = self.shared.cursor.lock().unwrap();
        *cursor = clamped.min(self.total_frames);
        if *cursor < self.total_frames {
            self.shared.ended.store(false, Ordering::Relaxed);
        }
    }

    /// Whether the track has played to the end (cleared by `play` or a
    /// backward `seek`).
    pub fn has_ended(&self) -> bool {
        self.shared.ended.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pulse_level_stays_in_range() {
        let params = PulseParams::default();
        for i in 0..10_000 {
            let t = i as f32 * 0.1;
            let level = pulse_level(t, &params);
            assert!((0.0..=0.4).contains(&level), "level {} out of range", level);
        }
    }

    #[test]
    fn test_pulse_level_oscillates() {
        let params = PulseParams::default();
        // Quarter period of the default 0.5 rad/s sine peaks at pi s.
        let peak = pulse_level(std::f32::consts::PI, &params);
        let trough = pulse_level(3.0 * std::f32::consts::PI, &params);
        assert!((peak - 0.4).abs() < 1e-3);
        assert!(trough.abs() < 1e-3);
    }

    #[test]
    fn test_track_duration() {
        let track = TrackBuffer::new(vec![[0.0, 0.0]; 44_100], 44_100);
        assert!((track.duration() - 1.0).abs() < 1e-6);

        let empty = TrackBuffer::new(Vec::new(), 44_100);
        assert_eq!(empty.duration(), 0.0);
    }

    #[test]
    fn test_sample_at_interpolates() {
        let track = TrackBuffer::new(vec![[0.0, 0.0], [1.0, -1.0]], 44_100);

        let mid = track.sample_at(0.5);
        assert!((mid[0] - 0.5).abs() < 1e-6);
        assert!((mid[1] + 0.5).abs() < 1e-6);

        let exact = track.sample_at(1.0);
        // Past the last frame the interpolation target is silence.
        assert!((exact[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_sample_at_out_of_range_is_silent() {
        let track = TrackBuffer::new(vec![[0.5, 0.5]; 4], 44_100);
        assert_eq!(track.sample_at(-1.0), [0.0, 0.0]);
        assert_eq!(track.sample_at(4.0), [0.0, 0.0]);
        assert_eq!(track.sample_at(100.0), [0.0, 0.0]);

        let empty = TrackBuffer::new(Vec::new(), 44_100);
        assert_eq!(empty.sample_at(0.0), [0.0, 0.0]);
    }
}
