//! Yes/no confirmations on the terminal

use dialoguer::Confirm;
use dialoguer::theme::ColorfulTheme;
use emuhub_emulator::Prompter;

/// Prompter over stdin; `--yes` answers every question with yes
pub struct ConsolePrompter {
    assume_yes: bool,
}

impl ConsolePrompter {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl Prompter for ConsolePrompter {
    fn confirm(&mut self, message: &str) -> bool {
        if self.assume_yes {
            println!("{} yes", message);
            return true;
        }

        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(message)
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}
