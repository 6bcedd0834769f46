//! Spoken conversation: microphone in, Gemini Live in the middle, speakers out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FrameCount, StreamConfig};
use gemini_live::types::{Blob, Modality, Setup};
use gemini_live::{Client, Stats};
use ringbuf::traits::Split;
use rubato::{FastFixedIn, Resampler};
use secrecy::ExposeSecret;
use tokio::sync::{mpsc, oneshot};
use tutor_core::{PromptBook, VoiceEvent, VoiceSession, VoiceStatus};
use tutor_native_utils::audio::{self, FrameBuffer, LIVE_INPUT_MIME_TYPE};
use tutor_native_utils::playback::{OutputSink, OutputSource, PlaybackClock, PlaybackScheduler};

use crate::cli::VoiceArgs;
use crate::config::{
    Config, INPUT_CHUNK_SIZE, INPUT_FRAME_SIZE, OUTPUT_BUFFER_SECS, OUTPUT_CHUNK_SIZE,
    OUTPUT_RESAMPLE_CHUNK,
};
use crate::live_adapter;
use crate::render::chat_line;

/// Decides whether microphone audio may go to the server right now.
#[derive(Clone)]
struct MicGate {
    session_open: Arc<AtomicBool>,
    half_duplex: bool,
    scheduler: Arc<Mutex<PlaybackScheduler>>,
    clock: Arc<PlaybackClock>,
}

impl MicGate {
    fn open(&self) {
        self.session_open.store(true, Ordering::Release);
    }

    fn lexi_speaking(&self) -> bool {
        self.scheduler
            .lock()
            .map(|s| s.is_playing(self.clock.now()))
            .unwrap_or(false)
    }

    fn allows(&self) -> bool {
        if !self.session_open.load(Ordering::Acquire) {
            return false;
        }
        !(self.half_duplex && self.lexi_speaking())
    }
}

/// Decodes model audio into the output ring buffer and keeps the playback
/// timeline in step with it.
///
/// Server chunks rarely line up with the resampler's block size, so samples
/// that do not fill a block wait in `pending` for the next chunk. Only a
/// finished turn pads its tail.
struct Playback {
    sink: OutputSink,
    resampler: FastFixedIn<f32>,
    pending: FrameBuffer,
    scheduler: Arc<Mutex<PlaybackScheduler>>,
    clock: Arc<PlaybackClock>,
}

impl Playback {
    fn new(
        sink: OutputSink,
        resampler: FastFixedIn<f32>,
        scheduler: Arc<Mutex<PlaybackScheduler>>,
        clock: Arc<PlaybackClock>,
    ) -> Self {
        let pending = FrameBuffer::new(resampler.input_frames_next());
        Self {
            sink,
            resampler,
            pending,
            scheduler,
            clock,
        }
    }

    fn play(&mut self, base64_audio: &str) {
        let samples = audio::decode(base64_audio);
        if samples.is_empty() {
            return;
        }
        self.pending.push(&samples);
        let blocks = self.pending.pop_frames();
        self.queue(blocks);
    }

    /// Plays the leftover tail of a turn, padded to one resampler block.
    fn finish_turn(&mut self) {
        let tail = self.pending.take_remaining();
        if tail.is_empty() {
            return;
        }
        let blocks = audio::split_for_chunks(&tail, self.pending.frame_size());
        self.queue(blocks);
    }

    fn queue(&mut self, blocks: Vec<Vec<f32>>) {
        let mut pushed = 0usize;
        for block in blocks {
            match self.resampler.process(&[block.as_slice()], None) {
                Ok(resampled) => {
                    if let Some(resampled) = resampled.first() {
                        let n = self.sink.push(resampled);
                        if n < resampled.len() {
                            tracing::warn!(
                                "Playback buffer full, dropped {} samples",
                                resampled.len() - n
                            );
                        }
                        pushed += n;
                    }
                }
                Err(e) => tracing::warn!("Failed to resample output audio: {}", e),
            }
        }
        if pushed == 0 {
            return;
        }

        let now = self.clock.now();
        if let Ok(mut scheduler) = self.scheduler.lock() {
            let chunk = scheduler.schedule(now, pushed);
            tracing::trace!(
                "Scheduled chunk {} at frame {} ({} frames, {} active)",
                chunk.id,
                chunk.start,
                chunk.frames(),
                scheduler.active_sources()
            );
        }
    }

    /// Drops everything still queued; used when the learner talks over Lexi.
    fn interrupt(&mut self) {
        self.sink.flush(&self.clock);
        self.pending.clear();
        self.resampler.reset();

        let now = self.clock.now();
        if let Ok(mut scheduler) = self.scheduler.lock() {
            let cut = scheduler.pending(now);
            let dropped = scheduler.interrupt(now);
            tracing::debug!("Interrupted, dropped {} chunks ({:?} of speech)", dropped, cut);
        }
    }
}

/// Output callback body: skips flushed audio, copies mono samples to every
/// channel and advances the clock by the frames written.
fn fill_output(data: &mut [f32], channels: usize, source: &mut OutputSource, clock: &PlaybackClock) {
    let dropped = source.discard_flushed(clock);
    if dropped > 0 {
        tracing::trace!("Flushed {} buffered samples", dropped);
    }
    let channels = channels.max(1);
    for frame in data.chunks_mut(channels) {
        let sample = source.next_sample().unwrap_or(0.0);
        frame.fill(sample);
    }
    clock.advance((data.len() / channels) as u64);
}

/// Resamples microphone audio to 16 kHz, cuts it into fixed frames and
/// streams them until told to stop. Returns the session token usage.
async fn stream_microphone(
    mut client: Client,
    mut mic_rx: mpsc::Receiver<Vec<f32>>,
    mut stop_rx: oneshot::Receiver<()>,
    mut resampler: FastFixedIn<f32>,
    gate: MicGate,
) -> Result<Stats> {
    let mut raw = FrameBuffer::new(resampler.input_frames_next());
    let mut frames = FrameBuffer::new(INPUT_FRAME_SIZE);
    let mut muted = false;

    loop {
        tokio::select! {
            _ = &mut stop_rx => break,
            samples = mic_rx.recv() => {
                let Some(samples) = samples else { break };
                if !gate.allows() {
                    if !muted && gate.session_open.load(Ordering::Acquire) {
                        tracing::debug!("Microphone muted while Lexi speaks");
                        client.end_audio_stream().await.context("Failed to pause audio stream")?;
                    }
                    muted = true;
                    raw.clear();
                    frames.clear();
                    continue;
                }
                muted = false;

                raw.push(&samples);
                for chunk in raw.pop_frames() {
                    match resampler.process(&[chunk.as_slice()], None) {
                        Ok(resampled) => {
                            if let Some(resampled) = resampled.first() {
                                frames.push(resampled);
                            }
                        }
                        Err(e) => tracing::warn!("Failed to resample microphone audio: {}", e),
                    }
                }
                for frame in frames.pop_frames() {
                    let blob = Blob::new(LIVE_INPUT_MIME_TYPE, audio::encode(&frame));
                    client
                        .send_realtime_audio(blob)
                        .await
                        .context("Failed to send microphone audio")?;
                }
            }
        }
    }

    let stats = client.stats()?;
    client.close().await?;
    Ok(stats)
}

pub async fn run_voice(config: &Config, prompts: &PromptBook, args: VoiceArgs) -> Result<()> {
    let api_key = config
        .api_key
        .as_ref()
        .context("Voice chat needs GEMINI_API_KEY to be set")?;

    let mut session = VoiceSession::new();
    session.start();
    println!("{}", session.status().terminal_label());

    // --- Input device ---
    let input = tutor_native_utils::device::get_or_default_input(args.input_device)
        .context("Failed to get audio input device")?;
    tracing::info!("Using input device: {:?}", input.name()?);
    let input_config = input
        .default_input_config()
        .context("Failed to get default input config")?;
    let input_config = StreamConfig {
        channels: input_config.channels(),
        sample_rate: input_config.sample_rate(),
        buffer_size: cpal::BufferSize::Fixed(FrameCount::from(INPUT_CHUNK_SIZE as u32)),
    };
    let input_channel_count = input_config.channels as usize;
    let input_sample_rate = input_config.sample_rate.0 as f64;
    tracing::info!("Input stream config: {:?}", &input_config);

    let (mic_tx, mic_rx) = mpsc::channel::<Vec<f32>>(1024);
    let input_data_fn = move |data: &[f32], _: &cpal::InputCallbackInfo| {
        let mono = audio::downmix(data, input_channel_count);
        if let Err(e) = mic_tx.try_send(mono) {
            tracing::warn!("Failed to send microphone audio to buffer: {:?}", e);
        }
    };
    let input_stream = input.build_input_stream(
        &input_config,
        input_data_fn,
        move |err| tracing::error!("An error occurred on input stream: {}", err),
        None,
    )?;

    // --- Output device ---
    let output = tutor_native_utils::device::get_or_default_output(args.output_device)
        .context("Failed to get audio output device")?;
    tracing::info!("Using output device: {:?}", output.name()?);
    let output_config = output
        .default_output_config()
        .context("Failed to get default output config")?;
    let output_config = StreamConfig {
        channels: output_config.channels(),
        sample_rate: output_config.sample_rate(),
        buffer_size: cpal::BufferSize::Fixed(FrameCount::from(OUTPUT_CHUNK_SIZE as u32)),
    };
    let output_channel_count = output_config.channels as usize;
    let output_sample_rate = output_config.sample_rate.0;
    tracing::info!("Output stream config: {:?}", &output_config);

    let (producer, consumer) =
        audio::shared_buffer(output_sample_rate as usize * OUTPUT_BUFFER_SECS).split();
    let mut source = OutputSource::new(consumer);
    let clock = Arc::new(PlaybackClock::new());
    let scheduler = Arc::new(Mutex::new(PlaybackScheduler::new(output_sample_rate)));

    let output_clock = clock.clone();
    let output_data_fn = move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
        fill_output(data, output_channel_count, &mut source, &output_clock);
    };
    let output_stream = output.build_output_stream(
        &output_config,
        output_data_fn,
        move |err| tracing::error!("An error occurred on output stream: {}", err),
        None,
    )?;

    // --- Live session ---
    let live_config = gemini_live::Config::new(api_key.expose_secret())
        .with_base_url(&config.live_base_url())
        .with_model(&config.live_model);
    let mut client = match gemini_live::connect_with_config(1024, live_config).await {
        Ok(client) => client,
        Err(e) => {
            session.fail(&e.to_string());
            println!("{}", session.status().terminal_label());
            return Err(e).context("Failed to connect to Gemini Live");
        }
    };
    let mut voice_rx = live_adapter::spawn_translation(client.server_events()?);

    let setup = Setup::new(&config.live_model)
        .with_response_modalities(vec![Modality::Audio])
        .with_voice(&config.live_voice)
        .with_instructions(prompts.voice_persona())
        .with_input_audio_transcription()
        .with_output_audio_transcription();
    client.setup(setup).await.context("Failed to send session setup")?;

    input_stream.play()?;
    output_stream.play()?;

    let gate = MicGate {
        session_open: Arc::new(AtomicBool::new(false)),
        half_duplex: args.half_duplex,
        scheduler: scheduler.clone(),
        clock: clock.clone(),
    };
    let in_resampler =
        audio::create_resampler(input_sample_rate, audio::LIVE_INPUT_SAMPLE_RATE, INPUT_CHUNK_SIZE)?;
    let (stop_tx, stop_rx) = oneshot::channel();
    let mut mic_handle = tokio::spawn(stream_microphone(
        client,
        mic_rx,
        stop_rx,
        in_resampler,
        gate.clone(),
    ));

    let mut playback = Playback::new(
        OutputSink::new(producer),
        audio::create_resampler(
            audio::LIVE_OUTPUT_SAMPLE_RATE,
            output_sample_rate as f64,
            OUTPUT_RESAMPLE_CHUNK,
        )?,
        scheduler,
        clock,
    );

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut mic_result = None;

    loop {
        tokio::select! {
            event = voice_rx.recv() => {
                let Some(event) = event else { break };
                match &event {
                    VoiceEvent::SessionOpened => gate.open(),
                    VoiceEvent::Audio(data) => playback.play(data),
                    VoiceEvent::Interrupted => playback.interrupt(),
                    VoiceEvent::TurnComplete => playback.finish_turn(),
                    _ => {}
                }
                let before = session.status();
                for entry in session.apply(&event) {
                    println!("{}", chat_line(&entry));
                }
                if session.status() != before {
                    println!("{}", session.status().terminal_label());
                }
                if matches!(event, VoiceEvent::Error(_) | VoiceEvent::Closed) {
                    break;
                }
            }
            result = &mut mic_handle => {
                mic_result = Some(result);
                break;
            }
            _ = &mut ctrl_c => {
                tracing::info!("Received Ctrl-C, shutting down...");
                break;
            }
        }
    }

    let _ = stop_tx.send(());
    let mic_result = match mic_result {
        Some(result) => result,
        None => mic_handle.await,
    };
    match mic_result {
        Ok(Ok(stats)) => tracing::info!("Session used {}", stats),
        Ok(Err(e)) => session.fail(&format!("{:#}", e)),
        Err(e) => session.fail(&e.to_string()),
    }

    drop(input_stream);
    drop(output_stream);
    session.stop();
    println!("{}", session.status().terminal_label());

    if session.status() == VoiceStatus::Error {
        anyhow::bail!("voice session ended with an error");
    }
    Ok(())
}
