//! # Commands
//!
//! The command vocabulary, the replies handed back to the transport and the
//! router that ties user events to the store and conversation state.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod messages;
pub mod router;

pub use router::CommandRouter;

use crate::features::reminders::RepeatInterval;

/// A named command a user can issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Start,
    Help,
    Create,
    List,
    Delete,
    SetRepeat,
}

impl Command {
    pub const ALL: [Command; 6] = [
        Command::Start,
        Command::Help,
        Command::Create,
        Command::List,
        Command::Delete,
        Command::SetRepeat,
    ];

    /// Name the command is registered under with the transport
    pub fn name(&self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Help => "help",
            Command::Create => "remind",
            Command::List => "my_reminders",
            Command::Delete => "del_reminder",
            Command::SetRepeat => "set_repeat",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Command::Start => "Главное меню",
            Command::Help => "Список команд",
            Command::Create => "Создать напоминание",
            Command::List => "Мои напоминания",
            Command::Delete => "Удалить напоминание",
            Command::SetRepeat => "Настроить повтор",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().trim_start_matches('/');
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Recognize a main menu label typed as text (emoji prefix optional)
    pub fn from_menu_label(text: &str) -> Option<Self> {
        let text = text.trim();
        Keyboard::MainMenu.buttons().into_iter().find_map(|button| {
            let command = Command::from_button_token(button.token)?;
            let bare = button.label.split_once(' ').map_or(button.label, |(_, rest)| rest);
            (text == button.label || text == bare).then_some(command)
        })
    }

    /// Token carried by this command's main menu button, if it has one
    pub fn button_token(&self) -> Option<&'static str> {
        match self {
            Command::Create => Some("menu_create"),
            Command::List => Some("menu_list"),
            Command::Delete => Some("menu_delete"),
            Command::SetRepeat => Some("menu_repeat"),
            Command::Start | Command::Help => None,
        }
    }

    pub fn from_button_token(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.button_token() == Some(token))
    }
}

/// One selectable button: what the user sees and the token sent back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Button {
    pub label: &'static str,
    pub token: &'static str,
}

/// Which keyboard the transport should show alongside a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyboard {
    /// The four main actions
    MainMenu,
    /// Daily / weekly / monthly / none
    RepeatChoice,
    /// No buttons, free text expected
    Remove,
}

impl Keyboard {
    pub fn buttons(&self) -> Vec<Button> {
        match self {
            Keyboard::MainMenu => vec![
                Button {
                    label: "➕ Создать напоминание",
                    token: "menu_create",
                },
                Button {
                    label: "📝 Мои напоминания",
                    token: "menu_list",
                },
                Button {
                    label: "❌ Удалить напоминание",
                    token: "menu_delete",
                },
                Button {
                    label: "🔄 Настроить повтор",
                    token: "menu_repeat",
                },
            ],
            Keyboard::RepeatChoice => [
                RepeatInterval::Daily,
                RepeatInterval::Weekly,
                RepeatInterval::Monthly,
                RepeatInterval::None,
            ]
            .into_iter()
            .map(|interval| Button {
                label: messages::interval_button_label(interval),
                token: interval.button_token(),
            })
            .collect(),
            Keyboard::Remove => Vec::new(),
        }
    }
}

/// What the bot answers to one user event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Keyboard,
}

impl Reply {
    pub fn new(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard,
        }
    }

    /// Reply that returns the user to the main menu
    pub fn menu(text: impl Into<String>) -> Self {
        Self::new(text, Keyboard::MainMenu)
    }
}
