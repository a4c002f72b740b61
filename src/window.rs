use ndarray::{Array, ArrayBase, Data, Dimension};

/// Mid-gray value returned for a zero-width window ("no contrast").
const DEGENERATE_GRAY: u8 = 128;

/// An intensity sub-range mapped linearly onto the 8-bit display range.
///
/// The constructor corrects inverted bounds instead of rejecting them, so a
/// `Window` always satisfies `low <= high`. This keeps interactive windowing
/// glitch-free while two sliders race each other.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    low: f32,
    high: f32,
}

impl Window {
    /// Create a window, swapping the bounds if they arrive out of order.
    pub fn new(low: f32, high: f32) -> Self {
        if low > high {
            Self {
                low: high,
                high: low,
            }
        } else {
            Self { low, high }
        }
    }

    /// Derive a window from the array's own minimum and maximum. Returns a
    /// zero-width window at 0 for an empty array.
    pub fn from_data_range<S, D>(intensity: &ArrayBase<S, D>) -> Self
    where
        S: Data<Elem = i32>,
        D: Dimension,
    {
        let mut iter = intensity.iter();
        let Some(&first) = iter.next() else {
            return Self::new(0.0, 0.0);
        };
        let (min, max) = iter.fold((first, first), |(min, max), &v| (min.min(v), max.max(v)));
        Self::new(min as f32, max as f32)
    }

    /// Derive a window from two percentiles of the array's value distribution,
    /// typically 1.0 and 99.0 so a stray outlier sample cannot collapse the
    /// visible range. Percentile ranks interpolate linearly between adjacent
    /// order statistics.
    pub fn from_percentiles<S, D>(intensity: &ArrayBase<S, D>, lower: f32, upper: f32) -> Self
    where
        S: Data<Elem = i32>,
        D: Dimension,
    {
        let mut values: Vec<i32> = intensity.iter().copied().collect();
        if values.is_empty() {
            return Self::new(0.0, 0.0);
        }
        values.sort_unstable();
        Self::new(percentile(&values, lower), percentile(&values, upper))
    }

    pub fn low(&self) -> f32 {
        self.low
    }

    pub fn high(&self) -> f32 {
        self.high
    }

    /// Map one intensity value into the display range: clip to the window,
    /// rescale to `[0, 1]`, scale by 255 and round. A zero-width window maps
    /// everything to mid-gray rather than dividing by zero.
    #[inline]
    pub fn apply(&self, value: i32) -> u8 {
        if self.low == self.high {
            return DEGENERATE_GRAY;
        }
        let clipped = (value as f32).clamp(self.low, self.high);
        (((clipped - self.low) / (self.high - self.low)) * 255.0).round() as u8
    }
}

/// `values` must be sorted and non-empty.
fn percentile(values: &[i32], pct: f32) -> f32 {
    let rank = (pct / 100.0).clamp(0.0, 1.0) * (values.len() - 1) as f32;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f32;
    values[lower] as f32 + (values[upper] - values[lower]) as f32 * fraction
}

/// Map an intensity array onto the 8-bit display range.
///
/// Bounds left as `None` default to the array's own minimum/maximum, which is
/// the single-slice preview behavior. Whole-volume display should derive its
/// bounds with [`Window::from_percentiles`] instead; the two modes are
/// deliberately distinct. Inverted bounds are swapped and equal bounds yield a
/// uniform mid-gray array, never an error.
///
/// The function is pure: identical inputs always produce identical output.
pub fn normalize_window<S, D>(
    intensity: &ArrayBase<S, D>,
    low: Option<f32>,
    high: Option<f32>,
) -> Array<u8, D>
where
    S: Data<Elem = i32>,
    D: Dimension,
{
    let range = Window::from_data_range(intensity);
    let window = Window::new(low.unwrap_or(range.low), high.unwrap_or(range.high));
    intensity.mapv(|v| window.apply(v))
}

/// Clinically meaningful intensity windows for common anatomical regions.
///
/// A static lookup table, not mutable state: each preset resolves to a fixed
/// (low, high) pair on the calibrated intensity scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    Brain,
    Chest,
    Abdomen,
    Neck,
    Bone,
    Lung,
    SoftTissue,
}

impl Preset {
    pub const ALL: [Preset; 7] = [
        Preset::Brain,
        Preset::Chest,
        Preset::Abdomen,
        Preset::Neck,
        Preset::Bone,
        Preset::Lung,
        Preset::SoftTissue,
    ];

    pub fn window(self) -> Window {
        let (low, high) = match self {
            Preset::Brain => (-100.0, 100.0),
            Preset::Chest => (-160.0, 240.0),
            Preset::Abdomen => (-150.0, 250.0),
            Preset::Neck => (-120.0, 200.0),
            Preset::Bone => (300.0, 2000.0),
            Preset::Lung => (-1000.0, 400.0),
            Preset::SoftTissue => (-100.0, 300.0),
        };
        Window::new(low, high)
    }

    pub fn name(self) -> &'static str {
        match self {
            Preset::Brain => "Brain",
            Preset::Chest => "Chest",
            Preset::Abdomen => "Abdomen",
            Preset::Neck => "Neck",
            Preset::Bone => "Bone",
            Preset::Lung => "Lung",
            Preset::SoftTissue => "Soft Tissue",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, array};

    #[test]
    fn output_stays_within_display_range() {
        let intensity = array![[-5000, -1, 0, 1, 5000], [42, 128, 255, 256, 1024]];
        let display = normalize_window(&intensity, Some(-100.0), Some(100.0));
        // u8 cannot leave [0, 255]; check the extremes map to the rails
        assert_eq!(display[[0, 0]], 0);
        assert_eq!(display[[0, 4]], 255);
    }

    #[test]
    fn degenerate_window_fills_mid_gray() {
        let intensity = array![[1, 2], [3, 4]];
        let display = normalize_window(&intensity, Some(40.0), Some(40.0));
        assert_eq!(display.dim(), intensity.dim());
        assert!(display.iter().all(|&v| v == 128));
    }

    #[test]
    fn inverted_bounds_are_swapped() {
        let intensity = array![[-200, -50, 0, 50, 200]];
        let forward = normalize_window(&intensity, Some(-100.0), Some(100.0));
        let reversed = normalize_window(&intensity, Some(100.0), Some(-100.0));
        assert_eq!(forward, reversed);
    }

    #[test]
    fn data_range_maps_extremes_to_rails() {
        let intensity = array![[10, 500], [250, 990]];
        let display = normalize_window(&intensity, None, None);
        assert_eq!(display[[0, 0]], 0);
        assert_eq!(display[[1, 1]], 255);
    }

    #[test]
    fn empty_array_stays_empty() {
        let intensity = Array2::<i32>::zeros((0, 0));
        let display = normalize_window(&intensity, None, None);
        assert_eq!(display.dim(), (0, 0));
    }

    #[test]
    fn percentile_interpolates_between_ranks() {
        // 0..=100 sorted: the p-th percentile is exactly p
        let values: Vec<i32> = (0..=100).collect();
        assert_eq!(percentile(&values, 1.0), 1.0);
        assert_eq!(percentile(&values, 99.0), 99.0);
        assert_eq!(percentile(&values, 50.0), 50.0);

        // four values: rank 1.5 sits halfway between 20 and 30
        assert_eq!(percentile(&[10, 20, 30, 40], 50.0), 25.0);
    }

    #[test]
    fn percentile_window_ignores_outliers() {
        let mut values: Vec<i32> = vec![0; 99];
        values.push(100_000);
        let intensity = Array2::from_shape_vec((10, 10), values).unwrap();
        let window = Window::from_percentiles(&intensity, 1.0, 99.0);
        assert!(window.high() < 100_000.0);
    }

    #[test]
    fn preset_table_matches_expected_bounds() {
        assert_eq!(Preset::Brain.window(), Window::new(-100.0, 100.0));
        assert_eq!(Preset::Lung.window(), Window::new(-1000.0, 400.0));
        assert_eq!(Preset::Bone.window(), Window::new(300.0, 2000.0));
        assert_eq!(Preset::ALL.len(), 7);
    }

    #[test]
    fn apply_rounds_to_nearest() {
        // value at the window midpoint: 0.5 * 255 = 127.5 rounds to 128
        let window = Window::new(-100.0, 100.0);
        assert_eq!(window.apply(0), 128);
        assert_eq!(window.apply(-100), 0);
        assert_eq!(window.apply(100), 255);
    }
}
