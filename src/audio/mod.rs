pub(crate) mod filters;
pub(crate) mod pitch;
pub(crate) mod reverb;
pub(crate) mod transformer;
