pub(crate) mod support;

mod integration_test;
