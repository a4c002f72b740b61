//! End-to-end pipeline scenarios: raw samples through intensity conversion,
//! ordering, assembly, windowing and plane extraction.

use ndarray::Array2;
use pretty_assertions::assert_eq;

use tomo_volume::{
    Orientation, Preset, RawSlice, SliceMetadata, Volume, Window, normalize_window, order_slices,
};

fn ct_metadata(position_z: f32) -> SliceMetadata {
    SliceMetadata {
        rescale_slope: Some(1.0),
        rescale_intercept: Some(-1024.0),
        position_z: Some(position_z),
        instance_number: Some(position_z as i32),
        pixel_spacing_row: Some(0.7),
        pixel_spacing_col: Some(0.7),
        slice_thickness: Some(2.0),
    }
}

#[test]
fn calibrated_sample_lands_on_mid_gray() {
    // raw 1024 with slope 1.0 and intercept -1024 is intensity 0; windowed
    // to (-100, 100) that normalizes to 0.5 and rounds to display value 128
    let slice = RawSlice::new(Array2::from_elem((2, 2), 1024u16), ct_metadata(0.0));
    let volume = Volume::assemble(&[slice]).unwrap();
    let display = volume.normalize(Some(Window::new(-100.0, 100.0)));
    let (plane, _) = display.extract_plane(Orientation::Axial, None);
    assert!(plane.iter().all(|&v| v == 128));
}

#[test]
fn volume_plane_matches_direct_slice_windowing() {
    // three 4x4 slices, fed out of order; values differ per slice so the
    // middle one is identifiable after assembly
    let slices: Vec<RawSlice> = [10.0_f32, 0.0, 20.0]
        .iter()
        .map(|&z| {
            // intensities land inside the brain window so the comparison
            // exercises the linear ramp, not just the clipped rails
            let samples = Array2::from_shape_fn((4, 4), |(r, c)| {
                1024 + z as i32 * 2 + (r * 4 + c) as i32 * 5 - 40
            });
            RawSlice::new(samples, ct_metadata(z))
        })
        .collect();
    let middle = slices[0].clone();

    let ordered = order_slices(slices);
    let volume = Volume::assemble(&ordered).unwrap();
    assert_eq!(volume.dim(), (4, 4, 3));

    let window = Preset::Brain.window();
    let display = volume.normalize(Some(window));
    let (plane, _) = display.extract_plane(Orientation::Axial, Some(1));

    let direct = normalize_window(
        &middle.to_intensity(),
        Some(window.low()),
        Some(window.high()),
    );
    assert_eq!(plane, direct);
}

#[test]
fn preview_and_volume_modes_stay_distinct() {
    // single-slice preview defaults to the slice's own min/max: extremes hit
    // the display rails even though the volume-mode percentile window would
    // not map them there
    let samples = Array2::from_shape_fn((10, 10), |(r, c)| (r * 10 + c) as i32);
    let slice = RawSlice::new(samples, SliceMetadata::default());

    let preview = normalize_window(&slice.to_intensity(), None, None);
    assert_eq!(preview[[0, 0]], 0);
    assert_eq!(preview[[9, 9]], 255);

    let volume = Volume::assemble(&[slice]).unwrap();
    let display = volume.normalize(None);
    // percentile bounds sit inside the data range, so the rails are reached
    // by clipping before the extreme values
    assert_eq!(display.data()[[0, 0, 0]], 0);
    assert_eq!(display.data()[[0, 1, 0]], 0);
    assert_eq!(display.data()[[9, 9, 0]], 255);
    assert_eq!(display.data()[[9, 8, 0]], 255);
}

#[test]
fn aspect_ratios_travel_with_extracted_planes() {
    let slices: Vec<RawSlice> = (0..8)
        .map(|z| RawSlice::new(Array2::<i32>::zeros((6, 6)), ct_metadata(z as f32)))
        .collect();
    let volume = Volume::assemble(&slices).unwrap();
    let display = volume.normalize(None);

    let (_, axial) = display.extract_plane(Orientation::Axial, None);
    let (_, sagittal) = display.extract_plane(Orientation::Sagittal, None);
    let (_, coronal) = display.extract_plane(Orientation::Coronal, None);

    assert_eq!(axial, 1.0);
    assert_eq!(sagittal, 0.35);
    assert_eq!(coronal, 2.0 / 0.7);
}
