pub(crate) mod csrf;
