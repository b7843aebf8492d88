//! Evenly spaced grids.

/// Generate `steps` evenly spaced points between `min` and `max` (inclusive).
///
/// `steps == 1` yields `[min]`, `steps == 0` an empty grid.
pub fn linspace(min: f64, max: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let step = (max - min) / (steps as f64 - 1.0);
            let mut out = Vec::with_capacity(steps);
            for i in 0..steps - 1 {
                out.push(min + step * i as f64);
            }
            out.push(max);
            out
        }
    }
}
