//! Full conversation-turn tests against mock hardware and scripted
//! collaborators: capture, transcription, emotion presentation, playback,
//! offline recovery, and shutdown.

use crossbeam_channel::bounded;
use noggin::audio::{AudioOut, AudioSink, MicStream, Microphone};
use noggin::config::HeadConfig;
use noggin::hal::{PixelStrip, ServoBus, SoftArmSwitch, StatusLight};
use noggin::integration::{AudioDevices, Collaborators, Hardware, Rig};
use noggin::llm::Responder;
use noggin::mouth::Rgb;
use noggin::speech::{AudioClip, Synthesizer, Transcriber};
use noggin::{HeadError, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

// ---- mock hardware ----

#[derive(Default)]
struct RecordingBus {
    writes: Mutex<Vec<(u8, u16)>>,
    relaxed: Mutex<Vec<u8>>,
}

impl ServoBus for RecordingBus {
    fn set_duty(&self, channel: u8, duty: u16) {
        self.writes.lock().push((channel, duty));
    }

    fn relax(&self, channel: u8) {
        self.relaxed.lock().push(channel);
    }
}

#[derive(Default)]
struct RecordingStrip {
    frames: Mutex<Vec<Vec<Rgb>>>,
}

impl PixelStrip for RecordingStrip {
    fn write(&self, pixels: &[Rgb]) {
        self.frames.lock().push(pixels.to_vec());
    }
}

impl RecordingStrip {
    fn saw_color(&self, color: Rgb) -> bool {
        self.frames
            .lock()
            .iter()
            .any(|f| f.iter().any(|&p| p == color))
    }
}

#[derive(Default)]
struct RecordingLight {
    states: Mutex<Vec<bool>>,
}

impl StatusLight for RecordingLight {
    fn set(&self, on: bool) {
        self.states.lock().push(on);
    }
}

// ---- scripted audio devices ----

/// Feeds one scripted utterance per `open` call: a loud burst followed by
/// silence, then closes the stream.
struct ScriptedMic {
    utterances: Mutex<VecDeque<usize>>,
}

impl ScriptedMic {
    fn with_utterances(count: usize) -> Self {
        Self {
            utterances: Mutex::new((0..count).collect()),
        }
    }
}

impl Microphone for ScriptedMic {
    fn open(&self) -> Result<MicStream> {
        if self.utterances.lock().pop_front().is_none() {
            return Err(HeadError::AudioDevice("script exhausted".into()));
        }

        let (tx, rx) = bounded::<Vec<f32>>(64);
        std::thread::spawn(move || {
            for _ in 0..10 {
                if tx.send(vec![0.5; 256]).is_err() {
                    return;
                }
                std::thread::sleep(Duration::from_millis(5));
            }
            for _ in 0..12 {
                if tx.send(vec![0.0005; 256]).is_err() {
                    return;
                }
                std::thread::sleep(Duration::from_millis(5));
            }
            // tx drops here; the session finishes on disconnect if the
            // silence window has not elapsed already
        });

        Ok(MicStream::new(rx, 8000, Box::new(())))
    }
}

#[derive(Default)]
struct CollectingOut {
    samples: Arc<Mutex<Vec<f32>>>,
}

struct CollectingSink {
    samples: Arc<Mutex<Vec<f32>>>,
}

impl AudioSink for CollectingSink {
    fn write(&mut self, frame: &[f32]) -> Result<()> {
        self.samples.lock().extend_from_slice(frame);
        Ok(())
    }
}

impl AudioOut for CollectingOut {
    fn open(&self, _sample_rate: u32) -> Result<Box<dyn AudioSink>> {
        Ok(Box::new(CollectingSink {
            samples: Arc::clone(&self.samples),
        }))
    }
}

// ---- scripted collaborators ----

struct ScriptedTranscriber {
    replies: Mutex<VecDeque<Result<String>>>,
    wav_sizes: Mutex<Vec<usize>>,
}

impl ScriptedTranscriber {
    fn new(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            wav_sizes: Mutex::new(Vec::new()),
        }
    }
}

impl Transcriber for ScriptedTranscriber {
    fn transcribe(&self, wav: &[u8]) -> Result<String> {
        self.wav_sizes.lock().push(wav.len());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(String::new()))
    }
}

struct ScriptedResponder {
    replies: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedResponder {
    fn new(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl Responder for ScriptedResponder {
    fn respond(&self, user_text: &str) -> Result<String> {
        self.prompts.lock().push(user_text.to_string());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok("Hm. [emotion: neutral]".to_string()))
    }
}

#[derive(Default)]
struct ClipSynthesizer {
    texts: Mutex<Vec<String>>,
}

impl Synthesizer for ClipSynthesizer {
    fn synthesize(&self, text: &str) -> Result<AudioClip> {
        self.texts.lock().push(text.to_string());
        Ok(AudioClip {
            samples: vec![0.3; 1024],
            sample_rate: 8000,
        })
    }
}

// ---- wiring ----

fn fast_config() -> HeadConfig {
    let mut config = HeadConfig::default();
    config.capture.sample_rate = 8000;
    config.capture.silence = Duration::from_millis(40);
    config.capture.poll = Duration::from_millis(10);
    config.eyes.move_delay = Duration::ZERO;
    config.blink.step_delay = Duration::ZERO;
    config.blink.side_delay = Duration::ZERO;
    config.blink.hold = Duration::ZERO;
    config.blink.settle = Duration::ZERO;
    config.blink.double_pause = Duration::ZERO;
    config.playback.lead = Duration::ZERO;
    config.mouth.alert_period = Duration::from_millis(1);
    config.gaze.hold_poll = Duration::from_millis(10);
    config.gaze.thinking_pause = Duration::from_millis(10);
    config.gaze.speaking_pause = (0.005, 0.01);
    config.gaze.idle_pause = (0.005, 0.01);
    config.indicator.blink_period = Duration::from_millis(5);
    config.indicator.poll = Duration::from_millis(5);
    config.idle.tick = Duration::from_millis(5);
    config
}

struct TestRig {
    rig: Arc<Rig>,
    bus: Arc<RecordingBus>,
    strip: Arc<RecordingStrip>,
    light: Arc<RecordingLight>,
    switch: Arc<SoftArmSwitch>,
    out_samples: Arc<Mutex<Vec<f32>>>,
    transcriber: Arc<ScriptedTranscriber>,
    responder: Arc<ScriptedResponder>,
    synthesizer: Arc<ClipSynthesizer>,
}

fn build_rig(
    config: HeadConfig,
    utterances: usize,
    transcripts: Vec<Result<String>>,
    responses: Vec<Result<String>>,
) -> TestRig {
    let bus = Arc::new(RecordingBus::default());
    let strip = Arc::new(RecordingStrip::default());
    let light = Arc::new(RecordingLight::default());
    let switch = Arc::new(SoftArmSwitch::new(true));
    let out = Arc::new(CollectingOut::default());
    let out_samples = Arc::clone(&out.samples);
    let transcriber = Arc::new(ScriptedTranscriber::new(transcripts));
    let responder = Arc::new(ScriptedResponder::new(responses));
    let synthesizer = Arc::new(ClipSynthesizer::default());

    let rig = Arc::new(
        Rig::new(
            config,
            Hardware {
                servo_bus: bus.clone(),
                pixel_strip: strip.clone(),
                status_light: light.clone(),
                arm_switch: switch.clone(),
            },
            AudioDevices {
                microphone: Arc::new(ScriptedMic::with_utterances(utterances)),
                output: out,
            },
            Collaborators {
                transcriber: transcriber.clone(),
                responder: responder.clone(),
                synthesizer: synthesizer.clone(),
            },
        )
        .expect("rig construction"),
    );

    TestRig {
        rig,
        bus,
        strip,
        light,
        switch,
        out_samples,
        transcriber,
        responder,
        synthesizer,
    }
}

// ---- tests ----

#[test]
fn test_full_turn_speaks_with_emotion_color_then_exits() {
    let t = build_rig(
        fast_config(),
        2,
        vec![Ok("what time is it".to_string()), Ok("quit".to_string())],
        vec![Ok("It is noon. [emotion: Happy]".to_string())],
    );

    t.rig.center_eyes();
    t.rig.run_conversation();

    // The utterance reached the responder as transcribed.
    assert_eq!(t.responder.prompts.lock().as_slice(), ["what time is it"]);

    // A real WAV container was handed to transcription, twice.
    let wav_sizes = t.transcriber.wav_sizes.lock();
    assert_eq!(wav_sizes.len(), 2);
    assert!(wav_sizes.iter().all(|&len| len > 44));

    // The label was stripped before synthesis.
    assert_eq!(t.synthesizer.texts.lock().as_slice(), ["It is noon."]);

    // Playback reached the sink in full.
    assert_eq!(t.out_samples.lock().len(), 1024);

    // The mouth animated in the happy presentation color.
    assert!(t.strip.saw_color(Rgb(0, 255, 255)));

    // "quit" shut everything down: flags cleared, servos relaxed, light off.
    assert!(!t.rig.state().is_running());
    assert!(!t.rig.state().is_thinking());
    assert!(!t.rig.state().is_speaking());
    let mut relaxed = t.bus.relaxed.lock().clone();
    relaxed.sort_unstable();
    relaxed.dedup();
    assert_eq!(relaxed, vec![0, 1, 2, 3, 4, 5]);
    assert_eq!(t.light.states.lock().last(), Some(&false));
}

#[test]
fn test_connectivity_failure_shows_offline_face_and_recovers() {
    let t = build_rig(
        fast_config(),
        2,
        vec![
            Err(HeadError::Connectivity("transcription unreachable".to_string())),
            Ok("quit".to_string()),
        ],
        vec![],
    );

    t.rig.center_eyes();
    t.rig.run_conversation();

    // The offline alert pulsed the whole strip in the alert color.
    assert!(t.strip.saw_color(Rgb(255, 0, 0)));

    // The cross-eyed pose was committed to the position table.
    let eyes = fast_config().eyes;
    assert_eq!(
        t.rig.position_table().get(noggin::servo::ServoId::LeftX),
        Some(eyes.x_limits.1)
    );
    assert_eq!(
        t.rig.position_table().get(noggin::servo::ServoId::RightX),
        Some(eyes.x_limits.0)
    );

    // The successful second turn cleared the offline flag again.
    assert!(!t.rig.state().is_offline());
    assert!(!t.rig.state().is_running());
}

#[test]
fn test_poses_commit_to_position_table() {
    let t = build_rig(fast_config(), 0, vec![], vec![]);
    let eyes = fast_config().eyes;
    let blink = fast_config().blink;

    t.rig.center_eyes();
    assert_eq!(
        t.rig.position_table().get(noggin::servo::ServoId::LeftX),
        Some(eyes.x_mid())
    );
    assert_eq!(
        t.rig.position_table().get(noggin::servo::ServoId::LeftLid),
        Some(blink.open_left)
    );

    t.rig.eyelids_closed();
    assert_eq!(
        t.rig.position_table().get(noggin::servo::ServoId::RightLid),
        Some(blink.closed_angle)
    );
    // Sleep de-energizes the lid channels.
    let relaxed = t.bus.relaxed.lock().clone();
    assert!(relaxed.contains(&2) && relaxed.contains(&5));

    t.rig.eyelids_open();
    assert_eq!(
        t.rig.position_table().get(noggin::servo::ServoId::RightLid),
        Some(blink.open_right)
    );
}

#[test]
fn test_disarm_mid_capture_skips_the_turn() {
    // Long silence window so the session cannot complete before the disarm.
    let mut config = fast_config();
    config.capture.silence = Duration::from_millis(500);
    let t = build_rig(config, 1, vec![], vec![]);

    let rig = Arc::clone(&t.rig);
    let driver = std::thread::spawn(move || rig.run_conversation());

    // Let the capture session start, then disarm and stop.
    std::thread::sleep(Duration::from_millis(40));
    t.switch.set(false);
    std::thread::sleep(Duration::from_millis(120));
    t.rig.state().stop();
    driver.join().unwrap();

    // The cancelled capture never reached transcription.
    assert!(t.transcriber.wav_sizes.lock().is_empty());
    assert!(t.synthesizer.texts.lock().is_empty());
}

#[test]
fn test_background_loops_stop_on_shutdown_and_idle_announces() {
    let mut config = fast_config();
    config.idle.threshold = Duration::from_millis(30);

    let t = build_rig(config.clone(), 0, vec![], vec![]);
    t.rig.center_eyes();
    t.rig.state().set_armed(true);

    let handles = t.rig.clone().start_loops();
    std::thread::sleep(Duration::from_millis(250));
    t.rig.shutdown();

    for handle in handles {
        handle.join().expect("loop thread panicked");
    }

    // The idle announcement fired with a phrase from the table.
    let texts = t.synthesizer.texts.lock();
    assert!(!texts.is_empty(), "idle announcement never fired");
    assert!(config.idle.phrases.contains(&texts[0]));

    // Gaze wandered: eye channels saw interpolated writes.
    let writes = t.bus.writes.lock();
    assert!(writes.iter().any(|(ch, _)| *ch == 0));

    // The status light ends dark.
    assert_eq!(t.light.states.lock().last(), Some(&false));
}
