use anyhow::Result;
use noggin::audio::{AudioOut, AudioSink, MicStream, Microphone};
use noggin::config::HeadConfig;
use noggin::hal::{NullPixelStrip, NullServoBus, NullStatusLight, SoftArmSwitch};
use noggin::integration::{AudioDevices, Collaborators, Hardware, Rig};
use noggin::llm::Responder;
use noggin::mouth::Rgb;
use noggin::speech::{AudioClip, Synthesizer, Transcriber};
use noggin::HeadError;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Bench stand-ins for the external services and audio devices, so the
/// engine can be exercised end to end on a machine with no robot attached.
struct BenchMicrophone;

impl Microphone for BenchMicrophone {
    fn open(&self) -> noggin::Result<MicStream> {
        Err(HeadError::AudioDevice("bench rig has no microphone".into()))
    }
}

struct DiscardingOut;

struct DiscardingSink;

impl AudioSink for DiscardingSink {
    fn write(&mut self, _frame: &[f32]) -> noggin::Result<()> {
        Ok(())
    }
}

impl AudioOut for DiscardingOut {
    fn open(&self, _sample_rate: u32) -> noggin::Result<Box<dyn AudioSink>> {
        Ok(Box::new(DiscardingSink))
    }
}

struct BenchTranscriber;

impl Transcriber for BenchTranscriber {
    fn transcribe(&self, _wav: &[u8]) -> noggin::Result<String> {
        Ok(String::new())
    }
}

struct BenchResponder;

impl Responder for BenchResponder {
    fn respond(&self, _user_text: &str) -> noggin::Result<String> {
        Ok("All systems nominal. [emotion: happy]".to_string())
    }
}

/// Synthesizes a short amplitude-modulated tone so the mouth strip has
/// something to animate.
struct ToneSynthesizer;

impl Synthesizer for ToneSynthesizer {
    fn synthesize(&self, text: &str) -> noggin::Result<AudioClip> {
        let sample_rate = 48000u32;
        let secs = (text.len() as f32 * 0.01).clamp(0.3, 1.5);
        let samples = (0..(sample_rate as f32 * secs) as usize)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (t * 220.0 * std::f32::consts::TAU).sin() * (t * 3.0).sin().abs() * 0.4
            })
            .collect();
        Ok(AudioClip { samples, sample_rate })
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "noggin=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting noggin bench demo");

    let switch = Arc::new(SoftArmSwitch::new(false));
    let rig = Arc::new(Rig::new(
        HeadConfig::default(),
        Hardware {
            servo_bus: Arc::new(NullServoBus),
            pixel_strip: Arc::new(NullPixelStrip),
            status_light: Arc::new(NullStatusLight),
            arm_switch: switch.clone(),
        },
        AudioDevices {
            microphone: Arc::new(BenchMicrophone),
            output: Arc::new(DiscardingOut),
        },
        Collaborators {
            transcriber: Arc::new(BenchTranscriber),
            responder: Arc::new(BenchResponder),
            synthesizer: Arc::new(ToneSynthesizer),
        },
    )?);

    rig.startup();
    let handles = rig.clone().start_loops();

    // Arm the head and run through its expressive repertoire.
    switch.set(true);
    rig.state().set_armed(true);
    rig.eyelids_open();

    info!("blink");
    rig.blinker().blink(1.0);
    std::thread::sleep(Duration::from_millis(500));

    info!("wink");
    rig.blinker().wink(None);
    std::thread::sleep(Duration::from_millis(500));

    info!("double blink");
    rig.blinker().double_blink();

    info!("speaking with the happy presentation");
    rig.speak("This is the bench demo speaking.", Rgb(0, 255, 255));

    info!("offline face");
    rig.offline_face();
    rig.state().set_offline(false);

    std::thread::sleep(Duration::from_secs(2));

    rig.shutdown();
    for handle in handles {
        let _ = handle.join();
    }

    info!("bench demo finished");
    Ok(())
}
