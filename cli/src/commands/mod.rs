mod data;
mod day;
mod entry;
mod helpers;
mod placeholder;
mod settings;

pub(crate) use data::{cmd_clear, cmd_export, cmd_import};
pub(crate) use day::{cmd_day, cmd_recent};
pub(crate) use entry::{cmd_add, cmd_delete, cmd_edit, cmd_reorder};
pub(crate) use placeholder::{
    cmd_placeholder_add, cmd_placeholder_delete, cmd_placeholder_edit, cmd_placeholder_list,
    cmd_placeholder_reorder,
};
pub(crate) use settings::{cmd_settings_set, cmd_settings_show};
