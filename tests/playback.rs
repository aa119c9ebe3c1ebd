//! End-to-end playback through `std::fs` storage
//!
//! Fixtures are written with `hound` into a temporary directory and played
//! against the simulated I2S, timer, watchdog and amplifier pin.

use std::path::Path;
use std::time::Duration;

use wav_i2s_player::hal::fs::StdStorage;
use wav_i2s_player::hal::sim::{EventLog, HwEvent, SimI2s, SimPin, SimTimer, SimWatchdog};
use wav_i2s_player::{
    FormatErrorKind, HardwareGate, InterruptPlayer, PlaybackEngine, PlayerConfig, PlayerError,
    PollingPlayer, Sample,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn write_wav16(path: &Path, channels: u16, sample_rate: u32, samples: &[i16]) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in samples {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();
}

fn write_wav8(path: &Path, sample_rate: u32, samples: &[i8]) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 8,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in samples {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();
}

struct Hardware {
    log: EventLog,
    i2s: SimI2s,
    pin: SimPin,
    watchdog: SimWatchdog,
    timer: SimTimer,
}

impl Hardware {
    fn new(fifo: usize) -> Self {
        let log = EventLog::new();
        Hardware {
            i2s: SimI2s::new(fifo, log.clone()),
            pin: SimPin::new(log.clone()),
            watchdog: SimWatchdog::new(log.clone()),
            timer: SimTimer::new(log.clone()),
            log,
        }
    }

    fn gate(&self) -> HardwareGate<SimPin, SimI2s, SimWatchdog> {
        HardwareGate::new(self.pin.clone(), self.i2s.clone(), self.watchdog.clone())
    }
}

type Polling = PollingPlayer<StdStorage, SimPin, SimI2s, SimWatchdog>;
type Interrupt = InterruptPlayer<StdStorage, SimPin, SimI2s, SimWatchdog, SimTimer>;

fn polling(dir: &Path, hw: &Hardware) -> Polling {
    PollingPlayer::new(StdStorage::new(dir), hw.gate(), PlayerConfig::default()).unwrap()
}

fn interrupt(dir: &Path, hw: &Hardware, config: PlayerConfig) -> Interrupt {
    InterruptPlayer::new(StdStorage::new(dir), hw.gate(), hw.timer.clone(), config).unwrap()
}

#[test]
fn polling_plays_whole_16bit_file() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let samples: Vec<i16> = (0..1600).map(|i| ((i * 37) % 20_000 - 10_000) as i16).collect();
    write_wav16(&dir.path().join("beep.wav"), 1, 16_000, &samples);
    let data_size = std::fs::metadata(dir.path().join("beep.wav")).unwrap().len() - 44;

    let hw = Hardware::new(512);
    let mut player = polling(dir.path(), &hw);
    player.play_file("/beep.wav").unwrap();

    assert_eq!(hw.i2s.written_count() as u64, data_size / 2);
    let written: Vec<i16> = hw.i2s.written().into_iter().map(Sample::as_i16).collect();
    assert_eq!(written, samples);
    assert!(!player.is_playing());
    assert_eq!(player.audio_sample_rate(), 16_000);
    assert_eq!(player.bits_per_sample(), 16);
    assert!(!hw.pin.is_high());
    assert_eq!(hw.watchdog.armed(), Some(Duration::from_secs(60)));
}

#[test]
fn polling_upscales_8bit_file() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    write_wav8(&dir.path().join("click.wav"), 8_000, &[-128, 0, 127]);

    let hw = Hardware::new(16);
    let mut player = polling(dir.path(), &hw);
    player.play_file("click.wav").unwrap();

    let raw: Vec<u16> = hw.i2s.written().into_iter().map(Sample::raw).collect();
    assert_eq!(raw, vec![0xE000, 0x0000, 0x1FC0]);
    assert_eq!(hw.i2s.rate(), 8_000);
}

#[test]
fn interrupt_feeds_across_ticks() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let samples: Vec<i16> = (0..10).map(|i| i * 10 - 50).collect();
    write_wav16(&dir.path().join("ten.wav"), 1, 16_000, &samples);

    let hw = Hardware::new(3);
    let mut player = interrupt(dir.path(), &hw, PlayerConfig::default());
    player.play_file("/ten.wav").unwrap();
    assert!(player.is_playing());

    let mut ticks = 0;
    while hw.timer.fire() {
        ticks += 1;
        hw.i2s.drain(3);
        assert!(ticks <= 4, "playback should end within four ticks");
    }

    assert_eq!(ticks, 4);
    let written: Vec<i16> = hw.i2s.written().into_iter().map(Sample::as_i16).collect();
    assert_eq!(written, samples);
    assert!(!player.is_playing());
    assert!(!hw.timer.is_enabled());
    assert!(!hw.pin.is_high());
}

#[test]
fn stereo_file_rejected_before_amplifier() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    write_wav16(&dir.path().join("stereo.wav"), 2, 44_100, &[1, -1, 2, -2]);

    let hw = Hardware::new(8);
    let mut player = polling(dir.path(), &hw);
    let err = player.play_file("/stereo.wav").unwrap_err();
    assert_eq!(err.format_kind(), Some(FormatErrorKind::UnsupportedChannelLayout(2)));

    let mut player = interrupt(dir.path(), &hw, PlayerConfig::default());
    let err = player.play_file("/stereo.wav").unwrap_err();
    assert_eq!(err.format_kind(), Some(FormatErrorKind::UnsupportedChannelLayout(2)));

    assert!(!hw.log.contains(&HwEvent::AmplifierOn));
    assert!(!hw.log.contains(&HwEvent::HandlerAttached));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let hw = Hardware::new(8);
    let mut player = polling(dir.path(), &hw);
    assert!(matches!(player.play_file("/gone.wav"), Err(PlayerError::Io(_))));
    assert!(hw.log.snapshot().is_empty());
}

#[test]
fn configuration_file_drives_timer_period() {
    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("player.json");
    std::fs::write(&cfg_path, r#"{ "refill_factor": 16, "timer_divider": "div16" }"#).unwrap();
    let config = PlayerConfig::load(&cfg_path).unwrap();
    write_wav16(&dir.path().join("a.wav"), 1, 32_000, &[0; 4]);

    let hw = Hardware::new(8);
    let mut player = interrupt(dir.path(), &hw, config);
    player.play_file("/a.wav").unwrap();

    // 32 kHz * 16 / 512 = 1000 fills/s; 80 MHz / 16 / 1000
    assert_eq!(hw.timer.period(), 5_000);
    assert!(player.stop());
}

#[test]
fn invalid_configuration_rejected_at_construction() {
    let dir = tempfile::tempdir().unwrap();
    let hw = Hardware::new(8);
    let config = PlayerConfig {
        watchdog_timeout_ms: 0,
        ..PlayerConfig::default()
    };
    let result = PollingPlayer::new(StdStorage::new(dir.path()), hw.gate(), config.clone());
    assert!(matches!(result, Err(PlayerError::Config(_))));
    let storage = StdStorage::new(dir.path());
    let result = InterruptPlayer::new(storage, hw.gate(), hw.timer.clone(), config);
    assert!(matches!(result, Err(PlayerError::Config(_))));
    assert!(hw.log.snapshot().is_empty());
}
