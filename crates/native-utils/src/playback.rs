//! Gapless playback bookkeeping for streamed speech.
//!
//! Audio arrives from the server in arbitrarily sized chunks. The scheduler
//! keeps a "next start" cursor so that each chunk begins exactly where the
//! previous one ends, or immediately if playback has already caught up.
//! All positions are measured in output frames against a [`PlaybackClock`]
//! that the output stream callback advances.
//!
//! Samples travel through [`OutputSink`] and [`OutputSource`], the two halves
//! of the output ring buffer. Both count the samples they have seen, so a
//! flush can name exactly which samples are stale and audio pushed after the
//! flush survives it.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use ringbuf::traits::{Consumer, Observer, Producer};
use ringbuf::{HeapCons, HeapProd};

/// Frame counter shared between the output callback and the scheduler.
#[derive(Debug, Default)]
pub struct PlaybackClock {
    played: AtomicU64,
    flush_until: AtomicU64,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames written to the output device so far.
    pub fn now(&self) -> u64 {
        self.played.load(Ordering::Acquire)
    }

    pub fn advance(&self, frames: u64) {
        self.played.fetch_add(frames, Ordering::AcqRel);
    }

    /// Marks every sample before position `until` of the sample stream as stale.
    pub fn request_flush(&self, until: u64) {
        self.flush_until.fetch_max(until, Ordering::AcqRel);
    }

    /// Stream position below which samples must not be played.
    pub fn flush_until(&self) -> u64 {
        self.flush_until.load(Ordering::Acquire)
    }
}

/// Producer half of the output buffer.
pub struct OutputSink {
    producer: HeapProd<f32>,
    written: u64,
}

impl OutputSink {
    pub fn new(producer: HeapProd<f32>) -> Self {
        Self {
            producer,
            written: 0,
        }
    }

    /// Queues as many samples as fit and returns that count.
    pub fn push(&mut self, samples: &[f32]) -> usize {
        let n = self.producer.push_slice(samples);
        self.written += n as u64;
        n
    }

    /// Makes everything pushed so far stale. Takes effect at once: the
    /// source skips those samples on its next read, whatever is pushed later.
    pub fn flush(&self, clock: &PlaybackClock) {
        clock.request_flush(self.written);
    }
}

/// Consumer half of the output buffer, read by the device callback.
pub struct OutputSource {
    consumer: HeapCons<f32>,
    taken: u64,
}

impl OutputSource {
    pub fn new(consumer: HeapCons<f32>) -> Self {
        Self { consumer, taken: 0 }
    }

    /// Drops samples queued before the latest flush. Returns how many.
    pub fn discard_flushed(&mut self, clock: &PlaybackClock) -> usize {
        let stale = clock.flush_until().saturating_sub(self.taken) as usize;
        if stale == 0 {
            return 0;
        }
        let skipped = self.consumer.skip(stale.min(self.consumer.occupied_len()));
        self.taken += skipped as u64;
        skipped
    }

    pub fn next_sample(&mut self) -> Option<f32> {
        let sample = self.consumer.try_pop()?;
        self.taken += 1;
        Some(sample)
    }

    pub fn buffered(&self) -> usize {
        self.consumer.occupied_len()
    }
}

/// A chunk of audio placed on the playback timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledChunk {
    pub id: u64,
    pub start: u64,
    pub end: u64,
}

impl ScheduledChunk {
    pub fn frames(&self) -> u64 {
        self.end - self.start
    }
}

#[derive(Debug)]
pub struct PlaybackScheduler {
    sample_rate: u32,
    next_start: u64,
    next_id: u64,
    active: VecDeque<ScheduledChunk>,
}

impl PlaybackScheduler {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            next_start: 0,
            next_id: 0,
            active: VecDeque::new(),
        }
    }

    /// Places `frames` frames on the timeline.
    ///
    /// The chunk starts at `max(next_start, now)` and the cursor moves to its end,
    /// so consecutive chunks never leave a gap or overlap.
    pub fn schedule(&mut self, now: u64, frames: usize) -> ScheduledChunk {
        self.reap(now);
        let start = self.next_start.max(now);
        let end = start + frames as u64;
        self.next_start = end;

        let chunk = ScheduledChunk {
            id: self.next_id,
            start,
            end,
        };
        self.next_id += 1;
        if frames > 0 {
            self.active.push_back(chunk);
        }
        chunk
    }

    /// Forgets chunks that finished playing. Returns how many were removed.
    pub fn reap(&mut self, now: u64) -> usize {
        let before = self.active.len();
        while self.active.front().is_some_and(|chunk| chunk.end <= now) {
            self.active.pop_front();
        }
        before - self.active.len()
    }

    /// Drops every pending chunk and rewinds the cursor to `now`.
    /// Returns how many chunks were still scheduled.
    pub fn interrupt(&mut self, now: u64) -> usize {
        let dropped = self.active.len();
        self.active.clear();
        self.next_start = now;
        dropped
    }

    pub fn is_playing(&self, now: u64) -> bool {
        self.next_start > now
    }

    /// Audio still queued ahead of the playback position.
    pub fn pending(&self, now: u64) -> Duration {
        self.frames_to_duration(self.next_start.saturating_sub(now))
    }

    pub fn next_start(&self) -> u64 {
        self.next_start
    }

    pub fn active_sources(&self) -> usize {
        self.active.len()
    }

    fn frames_to_duration(&self, frames: u64) -> Duration {
        Duration::from_secs_f64(frames as f64 / self.sample_rate as f64)
    }
}
