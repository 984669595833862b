//! Dynamic-programming beat tracker.
//!
//! Picks the sequence of onset frames that maximizes total onset strength
//! while keeping consecutive beats close to the tempo period.

use tracing::debug;

/// Beat frames for an onset envelope at a given period (frames per beat)
///
/// Returns an empty list for a silent envelope.
pub fn track_beats(envelope: &[f32], period: f64, tightness: f32) -> Vec<usize> {
    if envelope.len() < 2 || !(period >= 1.0) || !envelope.iter().any(|&v| v > 0.0) {
        return Vec::new();
    }

    let std = sample_std(envelope);
    if std <= 0.0 {
        return Vec::new();
    }
    let normalized: Vec<f32> = envelope.iter().map(|&v| v / std).collect();
    let local = local_score(&normalized, period);

    let (backlink, cumscore) = dynamic_program(&local, period, tightness as f64);
    let Some(tail) = last_beat(&cumscore) else {
        return Vec::new();
    };

    let mut beats = vec![tail];
    let mut cursor = backlink[tail];
    while cursor >= 0 {
        beats.push(cursor as usize);
        cursor = backlink[cursor as usize];
    }
    beats.reverse();

    let trimmed = trim_weak_edges(&local, &beats);
    debug!(
        "Beat tracker: period {:.2} frames, {} beats ({} before trimming)",
        period,
        trimmed.len(),
        beats.len()
    );
    trimmed
}

/// Onset envelope smoothed by a Gaussian a fraction of a period wide
fn local_score(envelope: &[f32], period: f64) -> Vec<f64> {
    let half = period.round() as isize;
    let kernel: Vec<f64> = (-half..=half)
        .map(|k| (-0.5 * (k as f64 * 32.0 / period).powi(2)).exp())
        .collect();

    let n = envelope.len() as isize;
    (0..n)
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .map(|(j, &w)| {
                    let src = i + j as isize - half;
                    if (0..n).contains(&src) {
                        envelope[src as usize] as f64 * w
                    } else {
                        0.0
                    }
                })
                .sum()
        })
        .collect()
}

/// Cumulative best score per frame and the predecessor beat that achieves it
///
/// Predecessors are searched between half and twice a period back, with a
/// penalty on the squared log ratio of the gap to the period.
fn dynamic_program(local: &[f64], period: f64, tightness: f64) -> (Vec<isize>, Vec<f64>) {
    let n = local.len();
    let mut backlink = vec![-1isize; n];
    let mut cumscore = vec![0.0f64; n];

    let far = (2.0 * period).round() as isize;
    let near = (period / 2.0).round().max(1.0) as isize;
    let offsets: Vec<(isize, f64)> = (near..=far)
        .map(|gap| {
            let penalty = -tightness * (gap as f64 / period).ln().powi(2);
            (gap, penalty)
        })
        .collect();

    let max_local = local.iter().copied().fold(0.0f64, f64::max);
    let mut first_beat = true;

    for i in 0..n {
        let (gap, best) = offsets
            .iter()
            .map(|&(gap, penalty)| {
                let prev = i as isize - gap;
                let carried = if prev >= 0 { cumscore[prev as usize] } else { 0.0 };
                (gap, carried + penalty)
            })
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((0, 0.0));

        cumscore[i] = local[i] + best;
        if first_beat && local[i] < 0.01 * max_local {
            backlink[i] = -1;
        } else {
            backlink[i] = i as isize - gap;
            first_beat = false;
        }
    }

    (backlink, cumscore)
}

/// Final beat: the latest local maximum of the cumulative score that beats
/// half the median local-maximum score
fn last_beat(cumscore: &[f64]) -> Option<usize> {
    let n = cumscore.len();
    let is_peak = |i: usize| {
        let left = if i == 0 { cumscore[0] } else { cumscore[i - 1] };
        let right = if i + 1 == n { cumscore[i] } else { cumscore[i + 1] };
        cumscore[i] > left && cumscore[i] >= right
    };

    let mut peaks: Vec<f64> = (0..n).filter(|&i| is_peak(i)).map(|i| cumscore[i]).collect();
    if peaks.is_empty() {
        return None;
    }
    peaks.sort_by(f64::total_cmp);
    let median = if peaks.len() % 2 == 0 {
        (peaks[peaks.len() / 2 - 1] + peaks[peaks.len() / 2]) / 2.0
    } else {
        peaks[peaks.len() / 2]
    };

    (0..n).rev().find(|&i| is_peak(i) && 2.0 * cumscore[i] > median)
}

/// Drop leading and trailing beats whose smoothed local score is weak
fn trim_weak_edges(local: &[f64], beats: &[usize]) -> Vec<usize> {
    const HANN5: [f64; 5] = [0.0, 0.5, 1.0, 0.5, 0.0];

    let scores: Vec<f64> = beats.iter().map(|&b| local[b]).collect();
    let n = scores.len() as isize;
    let smooth: Vec<f64> = (0..n)
        .map(|i| {
            HANN5
                .iter()
                .enumerate()
                .map(|(j, &w)| {
                    let src = i + j as isize - 2;
                    if (0..n).contains(&src) {
                        scores[src as usize] * w
                    } else {
                        0.0
                    }
                })
                .sum()
        })
        .collect();

    if smooth.is_empty() {
        return Vec::new();
    }
    let rms = (smooth.iter().map(|v| v * v).sum::<f64>() / smooth.len() as f64).sqrt();
    let threshold = 0.5 * rms;

    let first = smooth.iter().position(|&v| v > threshold);
    let last = smooth.iter().rposition(|&v| v > threshold);
    match (first, last) {
        (Some(first), Some(last)) => beats[first..=last].to_vec(),
        _ => Vec::new(),
    }
}

fn sample_std(values: &[f32]) -> f32 {
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    let var = values
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / (n - 1.0);
    var.sqrt() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pulse_train(len: usize, period: usize, offset: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                if i >= offset && (i - offset) % period == 0 {
                    1.0
                } else {
                    0.0
                }
            })
            .collect()
    }

    #[test]
    fn test_tracks_regular_pulses() {
        let envelope = pulse_train(400, 20, 7);
        let beats = track_beats(&envelope, 20.0, 100.0);

        assert!(beats.len() >= 15, "only {} beats", beats.len());
        for &beat in &beats {
            assert_eq!((beat + 20 - 7) % 20, 0, "beat {beat} off the grid");
        }
        for pair in beats.windows(2) {
            assert_eq!(pair[1] - pair[0], 20);
        }
    }

    #[test]
    fn test_silence_has_no_beats() {
        assert!(track_beats(&[0.0; 300], 20.0, 100.0).is_empty());
        assert!(track_beats(&[], 20.0, 100.0).is_empty());
    }

    #[test]
    fn test_no_phantom_beats_after_music_stops() {
        // Pulses stop at frame ~200, envelope continues silent to 400
        let mut envelope = pulse_train(400, 20, 0);
        envelope[200..].fill(0.0);
        let beats = track_beats(&envelope, 20.0, 100.0);
        assert!(!beats.is_empty());
        assert!(*beats.last().unwrap() < 200);
    }

    #[test]
    fn test_sample_std() {
        let std = sample_std(&[1.0, 2.0, 3.0, 4.0]);
        assert!((std - 1.290_994).abs() < 1e-5);
    }
}
