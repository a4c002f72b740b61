use ndarray::ArrayView2;

/// Sample a display plane at a fractional coordinate with bilinear weights.
#[inline]
pub(crate) fn bilinear_sample(plane: &ArrayView2<u8>, y: f32, x: f32) -> f32 {
    let (height, width) = plane.dim();

    let y0 = y.floor() as usize;
    let x0 = x.floor() as usize;
    let y1 = (y0 + 1).min(height - 1);
    let x1 = (x0 + 1).min(width - 1);

    let dy = y - y0 as f32;
    let dx = x - x0 as f32;
    let one_minus_dx = 1.0 - dx;
    let one_minus_dy = 1.0 - dy;

    let v00 = f32::from(plane[[y0, x0]]);
    let v01 = f32::from(plane[[y0, x1]]);
    let v10 = f32::from(plane[[y1, x0]]);
    let v11 = f32::from(plane[[y1, x1]]);

    let v0 = v00.mul_add(one_minus_dx, v01 * dx);
    let v1 = v10.mul_add(one_minus_dx, v11 * dx);

    v0.mul_add(one_minus_dy, v1 * dy)
}
