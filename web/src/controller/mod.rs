pub(crate) mod bankid_controller;
pub(crate) mod health_check_controller;
