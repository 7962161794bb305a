pub(crate) mod level;
pub(crate) mod params;
