use std::path::PathBuf;

use crate::config::types::Configuration;
use crate::domain::run::{RunMetadata, RunTiming};

pub(in crate::entry) struct InitPlan {
    pub(super) path: PathBuf,
    pub(super) config: Configuration,
}

pub(in crate::entry) struct StartPlan {
    pub(super) config: Configuration,
    pub(super) timing: RunTiming,
    pub(super) metadata: RunMetadata,
}

pub(in crate::entry) enum RunPlan {
    Init(InitPlan),
    Start(Box<StartPlan>),
    Stop,
}
