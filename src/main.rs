use ndarray::Array2;

use tomo_volume::{
    enums::Orientation,
    series::order_slices,
    slice::{RawSlice, SliceMetadata},
    volume::Volume,
};

/// Synthetic phantom slice: a bright ellipsoid in air, raw counts offset by
/// +1024 so the rescale intercept brings air back to -1024.
fn phantom_slice(z: usize, rows: usize, cols: usize, depth: usize) -> RawSlice {
    let samples = Array2::from_shape_fn((rows, cols), |(r, c)| {
        let dr = (r as f32 - rows as f32 / 2.0) / (rows as f32 / 3.0);
        let dc = (c as f32 - cols as f32 / 2.0) / (cols as f32 / 3.0);
        let dz = (z as f32 - depth as f32 / 2.0) / (depth as f32 / 3.0);
        if dr * dr + dc * dc + dz * dz < 1.0 {
            1024u16 + 1000
        } else {
            1024u16
        }
    });
    let metadata = SliceMetadata {
        rescale_slope: Some(1.0),
        rescale_intercept: Some(-1024.0),
        position_z: Some(z as f32 * 2.5),
        instance_number: Some(z as i32),
        pixel_spacing_row: Some(0.8),
        pixel_spacing_col: Some(0.8),
        slice_thickness: Some(2.5),
    };
    RawSlice::new(samples, metadata)
}

fn main() {
    env_logger::init();

    let (rows, cols, depth) = (96, 96, 40);
    let slices: Vec<RawSlice> = (0..depth)
        .map(|z| phantom_slice(z, rows, cols, depth))
        .collect();

    let volume =
        Volume::assemble(&order_slices(slices)).expect("synthetic series should assemble");
    let display = volume.normalize(None);

    for orientation in [
        Orientation::Axial,
        Orientation::Sagittal,
        Orientation::Coronal,
    ] {
        let image = display
            .scaled_plane_image(orientation, None)
            .expect("should have rendered plane at center of volume");
        let name = format!("{orientation:?}").to_lowercase();
        image
            .save(format!("{name}.png"))
            .expect("should have saved plane image");
    }
}
