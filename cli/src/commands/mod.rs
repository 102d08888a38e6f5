mod chat;
mod goal;
mod helpers;
mod hydration;
mod progress;
mod reminder;
mod settings;
mod tracking;
mod transfer;
mod weight;

pub(crate) use chat::{
    SaveOptions, cmd_chat, cmd_chat_history, cmd_saved_add, cmd_saved_categories,
    cmd_saved_delete, cmd_saved_list, cmd_saved_show, cmd_saved_update,
};
pub(crate) use goal::{cmd_goal_active, cmd_goal_list, cmd_goal_set, cmd_goal_target};
pub(crate) use hydration::{
    ProfileArgs, cmd_profile_set, cmd_profile_show, cmd_water_add, cmd_water_set,
    cmd_water_show, cmd_water_status,
};
pub(crate) use progress::{cmd_achievements, cmd_stats};
pub(crate) use reminder::{
    cmd_reminder_add, cmd_reminder_delete, cmd_reminder_list, cmd_reminder_toggle,
};
pub(crate) use settings::{
    NotificationArgs, cmd_notifications_set, cmd_notifications_show, cmd_settings_set,
    cmd_settings_show, cmd_theme_list, cmd_theme_show,
};
pub(crate) use tracking::{
    cmd_dashboard, cmd_drinks_add, cmd_drinks_set, cmd_drinks_show, cmd_pills_set, cmd_pills_show,
};
pub(crate) use transfer::{cmd_export, cmd_import};
pub(crate) use weight::{
    cmd_weight_delete, cmd_weight_log, cmd_weight_progress, cmd_weight_range, cmd_weight_show,
};
