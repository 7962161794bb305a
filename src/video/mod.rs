pub(crate) mod temporal;
pub(crate) mod transformer;
