//! Chat session commands

use crate::chat::ChatList;
use crate::cli::ChatCommand;
use crate::config::Config;
use crate::error::{QuestgenError, Result};
use crate::view::ViewController;
use colored::Colorize;
use prettytable::{format, Table};

use super::view::print_session;

/// Handle chat commands
pub fn handle_chat(config: &Config, command: ChatCommand) -> Result<()> {
    let kv = super::open_store(config)?;
    let mut sessions = super::open_sessions(config, kv.clone())?;
    let mut view = ViewController::new(kv);
    let scheme = view.load_theme().resolve();

    match command {
        ChatCommand::New => {
            let id = sessions.create_session()?;
            let title = sessions
                .session(&id)
                .map(|s| s.title.clone())
                .unwrap_or_default();
            println!("{}", format!("Created {} ({})", title, id).green());
        }
        ChatCommand::List { all } => {
            sessions.set_expanded(all);
            print_chat_list(&sessions.render_list());
        }
        ChatCommand::Switch { id } => {
            let session = sessions.switch_session(&id)?;
            println!("{}", format!("Switched to {}", session.title).green());
            println!();
            print_session(&session, &view, scheme);
        }
        ChatCommand::Rename { id, title } => {
            if sessions.rename_session(&id, title.as_deref())? {
                println!("{}", format!("Renamed chat {}", id).green());
            } else {
                println!("{}", "Title unchanged.".yellow());
            }
        }
        ChatCommand::Delete { id } => {
            sessions.delete_session(&id)?;
            println!("{}", format!("Deleted chat {}", id).green());
            if let Some(active) = sessions.active_session() {
                println!("Active chat: {} ({})", active.title, active.id.cyan());
            }
        }
        ChatCommand::Show { id, collapsed } => {
            let session = match id.as_deref() {
                Some(id) => sessions
                    .session(id)
                    .ok_or_else(|| QuestgenError::UnknownSession(id.to_string()))?,
                None => sessions
                    .active_session()
                    .ok_or_else(|| QuestgenError::UnknownSession("<active>".to_string()))?,
            };
            view.toggle_result_panel(!collapsed);
            print_session(session, &view, scheme);
        }
    }

    Ok(())
}

fn print_chat_list(list: &ChatList) {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(prettytable::row!["", "ID".bold(), "Title".bold()]);

    for entry in &list.entries {
        let marker = if entry.is_active { "*" } else { "" };
        if entry.is_active {
            table.add_row(prettytable::row![
                marker.green(),
                entry.id.cyan(),
                entry.display_title.green()
            ]);
        } else {
            table.add_row(prettytable::row![marker, entry.id.cyan(), entry.display_title]);
        }
    }

    println!("\nChats:");
    table.printstd();

    if list.show_toggle {
        if list.expanded {
            println!("Showing all {} chats.", list.total);
        } else {
            println!(
                "Showing {} of {} chats. Use {} to show all.",
                list.entries.len(),
                list.total,
                "questgen chat list --all".cyan()
            );
        }
    }
    println!();
}
