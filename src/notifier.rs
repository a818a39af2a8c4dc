//! Side effects fired when a rest countdown runs out.
//!
//! Each output channel sits behind a trait so the notifier can be driven
//! with recording fakes. Channel failures are logged and swallowed: a
//! missing speaker must never interfere with the countdown bookkeeping.

use std::io::{self, Write};
use std::sync::mpsc;
use std::time::Duration;

use rodio::source::{SineWave, Source};
use rodio::{OutputStream, Sink};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{CompletionMode, NotificationSettings};

/// Shortest time a banner stays on screen
pub const MIN_BANNER_MS: u64 = 400;

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("output not supported on this platform")]
    Unsupported,

    #[error("no audio device: {0}")]
    NoDevice(String),

    #[error("audio playback failed: {0}")]
    Playback(String),
}

pub trait ToneOutput {
    fn play_tone(&self, duration: Duration) -> Result<(), ChannelError>;
}

pub trait HapticOutput {
    fn pulse(&self, duration: Duration) -> Result<(), ChannelError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ChannelStatus {
    #[default]
    Skipped,
    Fired,
    Failed,
}

/// Which channels a single `notify` call touched
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct NotifyOutcome {
    pub tone: ChannelStatus,
    pub haptic: ChannelStatus,
    pub banner: ChannelStatus,
}

impl NotifyOutcome {
    pub fn is_silent(&self) -> bool {
        *self == NotifyOutcome::default()
    }
}

/// A transient flash shown by the presentation layer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Banner {
    pub shown_at: u64,
    pub visible_ms: u64,
}

impl Banner {
    pub fn is_visible(&self, now: u64) -> bool {
        now.saturating_sub(self.shown_at) < self.visible_ms
    }
}

pub struct CompletionNotifier {
    tone: Box<dyn ToneOutput>,
    haptic: Box<dyn HapticOutput>,
    banner: Option<Banner>,
}

impl CompletionNotifier {
    pub fn new(tone: Box<dyn ToneOutput>, haptic: Box<dyn HapticOutput>) -> Self {
        Self {
            tone,
            haptic,
            banner: None,
        }
    }

    /// Notifier wired to the terminal: audio beep, no haptics
    pub fn terminal() -> Self {
        Self::new(Box::new(SineTone::default()), Box::new(NoHaptics))
    }

    pub fn notify(&mut self, settings: &NotificationSettings, now: u64) -> NotifyOutcome {
        let mut outcome = NotifyOutcome::default();
        let Some(duration_ms) = settings.completion_duration_ms() else {
            debug!("completion notification disabled");
            return outcome;
        };
        let duration = Duration::from_millis(duration_ms);

        match settings.completion_mode {
            CompletionMode::Sound => outcome.tone = self.fire_tone(duration),
            CompletionMode::Vibrate => outcome.haptic = self.fire_haptic(duration),
            CompletionMode::Both => {
                outcome.tone = self.fire_tone(duration);
                outcome.haptic = self.fire_haptic(duration);
            }
            CompletionMode::Banner => {
                self.banner = Some(Banner {
                    shown_at: now,
                    visible_ms: duration_ms.max(MIN_BANNER_MS),
                });
                outcome.banner = ChannelStatus::Fired;
            }
        }
        outcome
    }

    fn fire_tone(&self, duration: Duration) -> ChannelStatus {
        match self.tone.play_tone(duration) {
            Ok(()) => ChannelStatus::Fired,
            Err(e) => {
                warn!("rest tone failed: {e}");
                ChannelStatus::Failed
            }
        }
    }

    fn fire_haptic(&self, duration: Duration) -> ChannelStatus {
        match self.haptic.pulse(duration) {
            Ok(()) => ChannelStatus::Fired,
            Err(e) => {
                warn!("rest vibration unavailable: {e}");
                ChannelStatus::Failed
            }
        }
    }

    /// The banner if it is still on screen
    pub fn banner(&self, now: u64) -> Option<Banner> {
        self.banner.filter(|b| b.is_visible(now))
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }
}

impl std::fmt::Debug for CompletionNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionNotifier")
            .field("banner", &self.banner)
            .finish_non_exhaustive()
    }
}

/// Terminals have no vibration motor
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHaptics;

impl HapticOutput for NoHaptics {
    fn pulse(&self, _duration: Duration) -> Result<(), ChannelError> {
        Err(ChannelError::Unsupported)
    }
}

/// Sine beep streamed to the default audio device
#[derive(Debug, Clone, Copy)]
pub struct SineTone {
    pub frequency_hz: f32,
    pub volume: f32,
}

impl Default for SineTone {
    fn default() -> Self {
        Self {
            frequency_hz: 880.0,
            volume: 0.3,
        }
    }
}

impl SineTone {
    /// Lazily generated samples, so long tones cost no memory up front
    pub fn source(&self, duration: Duration) -> impl Source<Item = f32> + Send + 'static {
        SineWave::new(self.frequency_hz)
            .take_duration(duration)
            .amplify(self.volume)
    }
}

impl ToneOutput for SineTone {
    fn play_tone(&self, duration: Duration) -> Result<(), ChannelError> {
        let source = self.source(duration);
        let (ready_tx, ready_rx) = mpsc::channel();

        // the output stream is not Send, so it lives and dies on the player thread
        std::thread::spawn(move || {
            let (_stream, handle) = match OutputStream::try_default() {
                Ok(pair) => pair,
                Err(e) => {
                    let _ = ready_tx.send(Err(ChannelError::NoDevice(e.to_string())));
                    return;
                }
            };
            let sink = match Sink::try_new(&handle) {
                Ok(sink) => sink,
                Err(e) => {
                    let _ = ready_tx.send(Err(ChannelError::Playback(e.to_string())));
                    return;
                }
            };
            let _ = ready_tx.send(Ok(()));
            sink.append(source);
            sink.sleep_until_end();
        });

        let ready = ready_rx
            .recv()
            .unwrap_or_else(|_| Err(ChannelError::Playback("audio thread exited".to_string())));
        match ready {
            Ok(()) => {
                debug!(?duration, "rest tone playing");
                Ok(())
            }
            Err(e) => {
                ring_bell();
                Err(e)
            }
        }
    }
}

/// Terminal bell for hosts without an audio device
fn ring_bell() {
    let mut out = io::stdout();
    let _ = out.write_all(b"\x07");
    let _ = out.flush();
}
