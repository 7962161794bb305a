pub(crate) mod analyzer;
pub(crate) mod phash;
pub(crate) mod risk;
pub(crate) mod spectral;
