/// Canonical orthogonal viewing planes of an assembled volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Axial,
    Sagittal,
    Coronal,
}
