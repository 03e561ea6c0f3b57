//! Clip mixing
//!
//! Sums buffers sample-wise, all aligned at offset 0. The composite lasts as
//! long as the longest input. No clipping protection or renormalization is
//! applied; callers normalize downstream if they need to.

use crate::engine::resample::resample;
use crate::engine::AudioBuffer;
use crate::events::{NullObserver, ProgressEvent, ProgressObserver};

/// Merge buffers into one composite, or `None` if there is nothing to merge
///
/// Inputs at a lower sample rate are resampled to the highest rate present;
/// inputs with fewer channels repeat their last channel to fill the widest
/// layout, so a mono narration lands in both sides of a stereo bed.
pub fn merge(buffers: Vec<AudioBuffer>) -> Option<AudioBuffer> {
    merge_with_observer(buffers, &NullObserver)
}

/// [`merge`], reporting progress to `observer`
pub fn merge_with_observer(
    buffers: Vec<AudioBuffer>,
    observer: &dyn ProgressObserver,
) -> Option<AudioBuffer> {
    if buffers.is_empty() {
        observer.on_event(&ProgressEvent::NothingToMerge);
        return None;
    }

    observer.on_event(&ProgressEvent::Merging {
        clips: buffers.len(),
    });

    if buffers.len() == 1 {
        return buffers.into_iter().next();
    }

    let sample_rate = buffers.iter().map(|b| b.sample_rate).max().unwrap_or(0);
    let buffers: Vec<AudioBuffer> = buffers
        .into_iter()
        .map(|b| resample(b, sample_rate))
        .collect();

    let channels = buffers.iter().map(|b| b.channels()).max().unwrap_or(0);
    let len = buffers.iter().map(|b| b.len()).max().unwrap_or(0);

    let mut mixed = vec![vec![0.0_f32; len]; channels];
    for buffer in &buffers {
        if buffer.channels() == 0 {
            continue;
        }
        for (ch, out) in mixed.iter_mut().enumerate() {
            let source = buffer.channel(ch.min(buffer.channels() - 1));
            for (acc, &sample) in out.iter_mut().zip(source.iter()) {
                *acc += sample;
            }
        }
    }

    Some(AudioBuffer {
        samples: mixed,
        sample_rate,
    })
}
