mod catalog;
mod cute;
mod export;
mod helpers;
mod schedule;

pub(crate) use catalog::{cmd_list, cmd_show};
pub(crate) use cute::cmd_cute;
pub(crate) use export::cmd_export;
pub(crate) use schedule::{cmd_interval, cmd_snooze, cmd_status, cmd_water};
