use std::fmt::Display;
use std::time::Instant;

/// Statistics from a benchmark run.
///
/// Durations are in milliseconds. Throughput is in MB/s of encoded input.
#[derive(Default)]
pub struct BenchStats {
    /// Mean duration.
    pub mean: f32,

    /// Median duration.
    pub median: f32,

    /// Minimum duration.
    pub min: f32,

    /// Duration of longest run.
    pub max: f32,

    /// Throughput computed from the median duration.
    pub throughput: f32,
}

/// Run a decoding benchmark `f` for `trials` iterations and print statistics.
///
/// `input_bytes` is the number of encoded bytes each call to `f` decodes. It
/// is used to compute throughput.
pub fn run_bench<F: FnMut(), D: Display>(
    trials: usize,
    description: D,
    input_bytes: usize,
    mut f: F,
) -> BenchStats {
    if trials == 0 {
        return BenchStats::default();
    }

    let mut times: Vec<f32> = (0..trials)
        .map(|_| {
            let start = Instant::now();
            f();
            (start.elapsed().as_secs_f64() * 1000.0) as f32
        })
        .collect();
    times.sort_by(|a, b| a.total_cmp(b));

    let min = times[0];
    let max = times[times.len() - 1];
    let mid = times.len() / 2;
    let median = if times.len() % 2 == 1 {
        times[mid]
    } else {
        (times[mid - 1] + times[mid]) / 2.
    };
    let mean = times.iter().sum::<f32>() / times.len() as f32;
    let throughput = if median > 0. {
        (input_bytes as f32 / (1024. * 1024.)) / (median / 1000.)
    } else {
        0.
    };

    println!(
        "{}. mean {:.3}ms median {:.3} min {:.3} max {:.3} throughput {:.1} MB/s",
        description, mean, median, min, max, throughput
    );

    BenchStats {
        mean,
        median,
        min,
        max,
        throughput,
    }
}
