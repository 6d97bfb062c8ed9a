pub(crate) mod bankid;
