pub(crate) mod logs;
pub(crate) mod migrate;
pub(crate) mod run;
