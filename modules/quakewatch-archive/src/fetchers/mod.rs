pub(crate) mod browserless;
pub(crate) mod chrome;
pub(crate) mod plain;
