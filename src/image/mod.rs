pub(crate) mod buffer;
pub(crate) mod color;
pub(crate) mod geometry;
pub(crate) mod noise;
pub(crate) mod transformer;
