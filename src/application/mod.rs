pub(crate) mod run_lifecycle;
