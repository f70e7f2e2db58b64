mod entry;
mod exercise;
mod export;
mod helpers;
mod reading;
mod snack;
mod stats;
mod user;

pub(crate) use entry::{
    cmd_entry_add, cmd_entry_delete, cmd_entry_list, cmd_entry_show, cmd_entry_update, cmd_session,
};
pub(crate) use exercise::{
    cmd_exercise_add, cmd_exercise_delete, cmd_exercise_edit, cmd_exercise_list,
};
pub(crate) use export::cmd_export;
pub(crate) use helpers::resolve_user;
pub(crate) use reading::{cmd_reading_add, cmd_reading_delete, cmd_reading_list};
pub(crate) use snack::{cmd_snack_add, cmd_snack_delete, cmd_snack_edit, cmd_snack_list};
pub(crate) use stats::cmd_stats;
pub(crate) use user::{cmd_user_add, cmd_user_list};
