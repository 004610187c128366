//! CLI command implementations.

pub(crate) mod run;
pub(crate) mod watch;

pub(crate) use run::RunArgs;
pub(crate) use watch::WatchArgs;
