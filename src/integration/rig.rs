//! The assembled head
//!
//! `Rig` wires the servo bank, mouth strip, status light, arm switch, audio
//! devices, and the three external collaborators together, owns the pose
//! library, and runs the conversation driver. The driver is the primary
//! writer of the thinking/speaking flags; connectivity failure handlers
//! write the offline flag.

use crate::audio::{encode_wav, run_session, AudioOut, CaptureOutcome, Microphone};
use crate::config::HeadConfig;
use crate::hal::{ArmSwitch, PixelStrip, ServoBus, StatusLight};
use crate::llm::{extract_emotion, EmotionPalette, Responder};
use crate::mouth::{play_clip, Mouth, MouthVisualizer, Rgb};
use crate::servo::{move_together, Blinker, PositionTable, ServoId, Servos};
use crate::speech::{Synthesizer, Transcriber};
use crate::state::HeadState;
use crate::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

const READY_PHRASE: &str = "I'm ready. Press the button and ask me a question.";

/// Physical outputs and inputs of the head.
pub struct Hardware {
    pub servo_bus: Arc<dyn ServoBus>,
    pub pixel_strip: Arc<dyn PixelStrip>,
    pub status_light: Arc<dyn StatusLight>,
    pub arm_switch: Arc<dyn ArmSwitch>,
}

/// Audio endpoints, opened per capture session / utterance.
pub struct AudioDevices {
    pub microphone: Arc<dyn Microphone>,
    pub output: Arc<dyn AudioOut>,
}

/// The three external services the head converses through.
pub struct Collaborators {
    pub transcriber: Arc<dyn Transcriber>,
    pub responder: Arc<dyn Responder>,
    pub synthesizer: Arc<dyn Synthesizer>,
}

/// A fully wired head.
pub struct Rig {
    config: HeadConfig,
    state: Arc<HeadState>,
    servos: Arc<Servos>,
    table: Arc<PositionTable>,
    blinker: Arc<Blinker>,
    mouth: Arc<Mouth>,
    status_light: Arc<dyn StatusLight>,
    arm_switch: Arc<dyn ArmSwitch>,
    microphone: Arc<dyn Microphone>,
    audio_out: Arc<dyn AudioOut>,
    transcriber: Arc<dyn Transcriber>,
    responder: Arc<dyn Responder>,
    synthesizer: Arc<dyn Synthesizer>,
    palette: EmotionPalette,
    visualizer: Mutex<MouthVisualizer>,
}

impl Rig {
    pub fn new(
        config: HeadConfig,
        hardware: Hardware,
        audio: AudioDevices,
        collaborators: Collaborators,
    ) -> Result<Self> {
        config.validate()?;

        let state = Arc::new(HeadState::new());
        let servos = Arc::new(Servos::new(hardware.servo_bus, config.servos.clone()));
        let blinker = Arc::new(Blinker::new(
            Arc::clone(&servos),
            Arc::clone(&state),
            config.blink.clone(),
        ));
        let mouth = Arc::new(Mouth::new(hardware.pixel_strip, config.mouth.pixels));
        let visualizer =
            Mutex::new(MouthVisualizer::new(config.playback.gain, config.playback.smoothing));

        Ok(Self {
            state,
            servos,
            table: Arc::new(PositionTable::new()),
            blinker,
            mouth,
            status_light: hardware.status_light,
            arm_switch: hardware.arm_switch,
            microphone: audio.microphone,
            audio_out: audio.output,
            transcriber: collaborators.transcriber,
            responder: collaborators.responder,
            synthesizer: collaborators.synthesizer,
            palette: EmotionPalette::default(),
            visualizer,
            config,
        })
    }

    /// Replace the emotion presentation table.
    pub fn with_palette(mut self, palette: EmotionPalette) -> Self {
        self.palette = palette;
        self
    }

    pub fn state(&self) -> &Arc<HeadState> {
        &self.state
    }

    pub fn blinker(&self) -> &Arc<Blinker> {
        &self.blinker
    }

    pub fn position_table(&self) -> &Arc<PositionTable> {
        &self.table
    }

    // ---- pose library ----

    /// Eyes and lids to their neutral positions; records the pose so the
    /// next relative move is seamless.
    pub fn center_eyes(&self) {
        let eyes = &self.config.eyes;
        let blink = &self.config.blink;
        let poses = [
            (ServoId::LeftX, eyes.x_mid()),
            (ServoId::LeftY, eyes.y_mid()),
            (ServoId::LeftLid, blink.open_left),
            (ServoId::RightX, eyes.x_mid()),
            (ServoId::RightY, eyes.y_mid()),
            (ServoId::RightLid, blink.open_right),
        ];
        for (id, angle) in poses {
            self.servos.set_angle(id, angle);
            self.table.set(id, angle);
        }
    }

    /// Open both lids to their trims (waking up).
    pub fn eyelids_open(&self) {
        let blink = &self.config.blink;
        self.servos.set_angle(ServoId::LeftLid, blink.open_left);
        self.servos.set_angle(ServoId::RightLid, blink.open_right);
        self.table.set(ServoId::LeftLid, blink.open_left);
        self.table.set(ServoId::RightLid, blink.open_right);
    }

    /// Close both lids and de-energize them (going to sleep). The settle
    /// delay lets the servos physically arrive before power is cut.
    pub fn eyelids_closed(&self) {
        let closed = self.config.blink.closed_angle;
        self.servos.set_angle(ServoId::LeftLid, closed);
        self.servos.set_angle(ServoId::RightLid, closed);
        self.table.set(ServoId::LeftLid, closed);
        self.table.set(ServoId::RightLid, closed);

        thread::sleep(self.config.blink.settle);

        self.servos.set_off(ServoId::LeftLid);
        self.servos.set_off(ServoId::RightLid);
    }

    /// Distinctive "no connectivity" presentation: cross-eyed pose, lids
    /// open, and a repeated alert pulse on the mouth strip.
    pub fn offline_face(&self) {
        warn!("connectivity lost, showing offline face");
        self.state.set_offline(true);
        self.state.set_thinking(false);
        self.state.set_speaking(false);

        let eyes = &self.config.eyes;
        let targets = HashMap::from([
            (ServoId::LeftX, eyes.x_limits.1),
            (ServoId::LeftY, eyes.y_mid()),
            (ServoId::RightX, eyes.x_limits.0),
            (ServoId::RightY, eyes.y_mid()),
        ]);
        move_together(&self.servos, &self.table, &targets, eyes.move_step, eyes.move_delay);
        self.eyelids_open();

        let mouth = &self.config.mouth;
        self.mouth
            .alert_pulse(mouth.alert_color, mouth.alert_pulses, mouth.alert_period);
    }

    // ---- speech output ----

    /// Synthesize and play `text` with the mouth animated in `color`.
    ///
    /// Connectivity failures switch to the offline face; a missing output
    /// device aborts the utterance gracefully. Neither stops any loop.
    pub fn speak(&self, text: &str, color: Rgb) {
        self.state.set_speaking(true);

        let clip = match self.synthesizer.synthesize(text) {
            Ok(clip) => {
                self.state.set_offline(false);
                clip
            }
            Err(e) if e.is_connectivity() => {
                warn!("speech synthesis unreachable: {e}");
                self.state.set_speaking(false);
                self.offline_face();
                return;
            }
            Err(e) => {
                warn!("speech synthesis failed: {e}");
                self.state.set_speaking(false);
                return;
            }
        };

        let mut sink = match self.audio_out.open(clip.sample_rate) {
            Ok(sink) => sink,
            Err(e) => {
                warn!("no speaker available: {e}");
                self.state.set_speaking(false);
                return;
            }
        };

        let mut visualizer = self.visualizer.lock();
        if let Err(e) = play_clip(
            &clip,
            sink.as_mut(),
            &self.mouth,
            &mut visualizer,
            color,
            &self.config.playback,
        ) {
            warn!("playback aborted: {e}");
            self.mouth.clear();
        }

        self.state.set_speaking(false);
    }

    // ---- lifecycle ----

    /// Initial pose and the startup announcement.
    pub fn startup(&self) {
        info!("animatronic head starting");
        self.center_eyes();
        self.mouth.clear();
        self.speak(READY_PHRASE, self.config.mouth.announce_color);
    }

    /// Spawn the gaze, indicator, and idle-announcement loops.
    pub fn start_loops(self: Arc<Self>) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();

        handles.push(thread::spawn({
            let servos = Arc::clone(&self.servos);
            let table = Arc::clone(&self.table);
            let blinker = Arc::clone(&self.blinker);
            let state = Arc::clone(&self.state);
            let eyes = self.config.eyes.clone();
            let gaze = self.config.gaze.clone();
            move || crate::behavior::gaze::run(servos, table, blinker, state, eyes, gaze)
        }));

        handles.push(thread::spawn({
            let light = Arc::clone(&self.status_light);
            let state = Arc::clone(&self.state);
            let config = self.config.indicator.clone();
            move || crate::behavior::indicator::run(light, state, config)
        }));

        handles.push(thread::spawn({
            let rig = Arc::clone(&self);
            let state = Arc::clone(&self.state);
            let config = self.config.idle.clone();
            let color = self.config.mouth.announce_color;
            move || {
                crate::behavior::idle::run(state, config, move |phrase| {
                    rig.speak(phrase, color);
                })
            }
        }));

        handles
    }

    /// Stop every loop, relax the servos, and darken the outputs. The only
    /// path that terminates the head.
    pub fn shutdown(&self) {
        info!("shutting down");
        self.state.stop();
        self.servos.relax_all();
        self.mouth.clear();
        self.status_light.set(false);
    }

    // ---- conversation driver ----

    /// Run the conversation loop until shutdown.
    ///
    /// One iteration: sample the arm switch, move the lids on arm
    /// transitions, capture an utterance, transcribe, dispatch easter eggs
    /// and exit phrases, ask for a response, and speak it with the
    /// emotion-resolved color.
    pub fn run_conversation(&self) {
        let mut last_armed = self.arm_switch.is_on();
        self.state.set_armed(last_armed);

        while self.state.is_running() {
            let armed = self.arm_switch.is_on();
            self.state.set_armed(armed);

            if armed != last_armed {
                if armed {
                    info!("armed, waking up");
                    self.eyelids_open();
                } else {
                    info!("disarmed, going to sleep");
                    self.eyelids_closed();
                }
                last_armed = armed;
            }

            if !armed {
                thread::sleep(Duration::from_millis(50));
                continue;
            }

            let (outcome, sample_rate) = match self.microphone.open() {
                Ok(stream) => {
                    let rate = stream.sample_rate;
                    (run_session(&stream.frames, &self.state, &self.config.capture), rate)
                }
                Err(e) => {
                    warn!("microphone unavailable: {e}");
                    (CaptureOutcome::NoDevice, 0)
                }
            };

            let samples = match outcome {
                CaptureOutcome::Complete { samples } => samples,
                CaptureOutcome::NoDevice => {
                    thread::sleep(Duration::from_millis(500));
                    continue;
                }
                CaptureOutcome::Cancelled { .. } | CaptureOutcome::Empty => {
                    self.state.set_thinking(false);
                    continue;
                }
            };

            self.state.set_thinking(true);

            let wav = match encode_wav(&samples, sample_rate) {
                Ok(wav) => wav,
                Err(e) => {
                    warn!("failed to serialize capture: {e}");
                    self.state.set_thinking(false);
                    continue;
                }
            };

            let text = match self.transcriber.transcribe(&wav) {
                Ok(text) => {
                    self.state.set_offline(false);
                    text
                }
                Err(e) if e.is_connectivity() => {
                    warn!("transcription unreachable: {e}");
                    self.offline_face();
                    continue;
                }
                Err(e) => {
                    warn!("transcription failed: {e}");
                    self.state.set_thinking(false);
                    continue;
                }
            };

            info!(%text, "heard");

            if text.trim().is_empty() {
                debug!("nothing transcribed, skipping turn");
                self.state.set_thinking(false);
                thread::sleep(Duration::from_millis(500));
                continue;
            }

            let norm = text.trim().to_lowercase();

            if wants_wink(&norm) {
                self.state.set_thinking(false);
                self.blinker.wink(None);
                continue;
            }

            if wants_double_blink(&norm) {
                self.state.set_thinking(false);
                self.blinker.double_blink();
                continue;
            }

            if is_exit_phrase(&norm) {
                info!("exit phrase, goodbye");
                self.shutdown();
                break;
            }

            let reply = match self.responder.respond(&text) {
                Ok(reply) => {
                    self.state.set_offline(false);
                    reply
                }
                Err(e) if e.is_connectivity() => {
                    warn!("chat unreachable: {e}");
                    self.offline_face();
                    continue;
                }
                Err(e) => {
                    warn!("chat failed: {e}");
                    self.state.set_thinking(false);
                    continue;
                }
            };

            let (spoken, label) = extract_emotion(&reply);
            let color = self.palette.color(&label);
            self.state.set_thinking(false);

            info!(%spoken, %label, "responding");
            self.speak(&spoken, color);
        }
    }
}

/// "wink for me", "wink…", "can you wink…"
fn wants_wink(norm: &str) -> bool {
    norm.contains("wink for me") || norm.starts_with("wink") || norm.contains("can you wink")
}

/// "blink twice if you understand…"
fn wants_double_blink(norm: &str) -> bool {
    norm.contains("blink twice") && norm.contains("understand")
}

fn is_exit_phrase(norm: &str) -> bool {
    matches!(norm, "quit" | "exit" | "stop")
}
