//! Reminder slash commands: /remind, /reminders, /delete

use serenity::builder::CreateApplicationCommand;
use serenity::model::application::command::CommandOptionType;

/// Creates reminder commands
pub fn create_commands() -> Vec<CreateApplicationCommand> {
    vec![
        create_remind_command(),
        create_reminders_command(),
        create_delete_command(),
    ]
}

/// Creates the remind command
fn create_remind_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("remind")
        .description("Set a reminder")
        .create_option(|option| {
            option
                .name("message")
                .description("What to remind you about")
                .kind(CommandOptionType::String)
                .required(true)
        })
        .create_option(|option| {
            option
                .name("time")
                .description("When (e.g. 5m, 1h, 2d, 2024-12-25, 2024-12-25 14:30)")
                .kind(CommandOptionType::String)
                .required(true)
        })
        .to_owned()
}

/// Creates the reminders command
fn create_reminders_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("reminders")
        .description("List your active reminders")
        .to_owned()
}

/// Creates the delete command - without an id it lists what can be deleted
fn create_delete_command() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("delete")
        .description("Delete one of your reminders")
        .create_option(|option| {
            option
                .name("id")
                .description("Reminder id shown by /reminders")
                .kind(CommandOptionType::String)
                .required(false)
        })
        .to_owned()
}
