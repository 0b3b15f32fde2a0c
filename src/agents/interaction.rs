use crate::agents::inventory::InventorySnapshot;
use crate::error::Result;
use colored::Colorize;
use std::fmt;
use std::io::{self, BufRead, Write};

/// Number of versions offered when picking one for a single install.
pub const VERSION_PAGE_SIZE: usize = 10;

/// Entries of the interactive menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuChoice {
    SingleMode,
    MultiMode,
    ViewOutdated,
    Update,
    Uninstall,
    CreatePackage,
    Exit,
    Invalid(String),
}

impl MenuChoice {
    pub fn parse(input: &str) -> Self {
        match input.trim() {
            "1" => MenuChoice::SingleMode,
            "2" => MenuChoice::MultiMode,
            "3" => MenuChoice::ViewOutdated,
            "4" => MenuChoice::Update,
            "5" => MenuChoice::Uninstall,
            "6" => MenuChoice::CreatePackage,
            "0" => MenuChoice::Exit,
            other => MenuChoice::Invalid(other.to_string()),
        }
    }
}

impl fmt::Display for MenuChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MenuChoice::SingleMode => "1. Single Mode",
            MenuChoice::MultiMode => "2. Multi Mode",
            MenuChoice::ViewOutdated => "3. View Outdated Packages",
            MenuChoice::Update => "4. Update Packages",
            MenuChoice::Uninstall => "5. Uninstall Package",
            MenuChoice::CreatePackage => "6. Create Own Package",
            MenuChoice::Exit => "0. Exit",
            MenuChoice::Invalid(input) => return write!(f, "invalid choice '{}'", input),
        };
        f.write_str(label)
    }
}

const MENU_ENTRIES: [MenuChoice; 7] = [
    MenuChoice::SingleMode,
    MenuChoice::MultiMode,
    MenuChoice::ViewOutdated,
    MenuChoice::Update,
    MenuChoice::Uninstall,
    MenuChoice::CreatePackage,
    MenuChoice::Exit,
];

/// Manages user prompts for the interactive menu
///
/// Reads from any `BufRead` and writes prompts to any `Write`, so the menu
/// can be driven by stdin/stdout or by a script. End of input is treated as
/// a request to leave whatever prompt is active.
pub struct MenuInteraction<R, W> {
    input: R,
    output: W,
}

impl MenuInteraction<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> MenuInteraction<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn render_menu(&mut self, tool: &str, snapshot: &InventorySnapshot) -> Result<()> {
        writeln!(self.output, "\n{}", "===================================".cyan())?;
        writeln!(self.output, "{}", "           Pip Installer            ".cyan().bold())?;
        writeln!(self.output, "{}", "===================================".cyan())?;
        for entry in &MENU_ENTRIES {
            writeln!(self.output, "{}", entry)?;
        }
        writeln!(self.output, "{}", "-----------------------------------".dimmed())?;
        writeln!(self.output, "Package tool: {}", tool.bright_cyan())?;
        writeln!(
            self.output,
            "Installed packages: {}",
            snapshot.installed.to_string().yellow()
        )?;
        writeln!(
            self.output,
            "Updatable packages: {}",
            snapshot.outdated.to_string().yellow()
        )?;
        writeln!(self.output, "{}", "-----------------------------------".dimmed())?;
        Ok(())
    }

    pub fn read_choice(&mut self) -> Result<MenuChoice> {
        match self.prompt("Enter your choice: ")? {
            Some(line) => Ok(MenuChoice::parse(&line)),
            None => Ok(MenuChoice::Exit),
        }
    }

    /// Print `message` and read one trimmed line; `None` at end of input.
    pub fn prompt(&mut self, message: &str) -> Result<Option<String>> {
        write!(self.output, "{}", message.bold())?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Like [`prompt`](Self::prompt), but `q` also ends the prompt.
    pub fn prompt_or_quit(&mut self, message: &str) -> Result<Option<String>> {
        Ok(self
            .prompt(message)?
            .filter(|line| !line.eq_ignore_ascii_case("q")))
    }

    /// Offer the first page of `versions`; `None` means "latest".
    pub fn choose_version(&mut self, name: &str, versions: &[String]) -> Result<Option<String>> {
        let shown = &versions[..versions.len().min(VERSION_PAGE_SIZE)];
        if shown.is_empty() {
            return Ok(None);
        }

        writeln!(self.output, "Available versions for {}:", name.white().bold())?;
        for (index, version) in shown.iter().enumerate() {
            writeln!(self.output, "  {}. {}", index + 1, version)?;
        }

        let answer = self
            .prompt("Choose the version number (or press Enter for the latest version): ")?
            .unwrap_or_default();

        Ok(answer
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=shown.len()).contains(n))
            .map(|n| shown[n - 1].clone()))
    }

    /// Yes/no question defaulting to no.
    pub fn confirm(&mut self, message: &str) -> Result<bool> {
        let answer = self.prompt(&format!("{} [y/N]: ", message))?;
        Ok(matches!(
            answer.map(|a| a.to_lowercase()).as_deref(),
            Some("y") | Some("yes")
        ))
    }

    pub fn say(&mut self, message: impl fmt::Display) -> Result<()> {
        writeln!(self.output, "{}", message)?;
        Ok(())
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn interaction(input: &str) -> MenuInteraction<Cursor<Vec<u8>>, Vec<u8>> {
        MenuInteraction::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn versions() -> Vec<String> {
        (0..15).rev().map(|minor| format!("1.{}.0", minor)).collect()
    }

    #[test]
    fn parses_menu_choices() {
        assert_eq!(MenuChoice::parse(" 2 "), MenuChoice::MultiMode);
        assert_eq!(MenuChoice::parse("0"), MenuChoice::Exit);
        assert_eq!(MenuChoice::parse("7"), MenuChoice::Invalid("7".into()));
    }

    #[test]
    fn end_of_input_exits_menu() {
        let mut ui = interaction("");
        assert_eq!(ui.read_choice().unwrap(), MenuChoice::Exit);
    }

    #[test]
    fn quit_ends_prompt() {
        let mut ui = interaction("Q\nrequests\n");
        assert_eq!(ui.prompt_or_quit("name: ").unwrap(), None);
        assert_eq!(
            ui.prompt_or_quit("name: ").unwrap().as_deref(),
            Some("requests")
        );
        assert_eq!(ui.prompt_or_quit("name: ").unwrap(), None);
    }

    #[test]
    fn picks_version_by_number_within_first_page() {
        let mut ui = interaction("3\n");
        let chosen = ui.choose_version("demo", &versions()).unwrap();
        assert_eq!(chosen.as_deref(), Some("1.12.0"));
    }

    #[test]
    fn enter_or_out_of_range_means_latest() {
        let mut ui = interaction("\n11\nabc\n");
        assert_eq!(ui.choose_version("demo", &versions()).unwrap(), None);
        assert_eq!(ui.choose_version("demo", &versions()).unwrap(), None);
        assert_eq!(ui.choose_version("demo", &versions()).unwrap(), None);
    }

    #[test]
    fn only_first_page_is_listed() {
        let mut ui = interaction("\n");
        ui.choose_version("demo", &versions()).unwrap();
        let printed = String::from_utf8(ui.output).unwrap();
        assert!(printed.contains("10. 1.5.0"));
        assert!(!printed.contains("11. "));
    }

    #[test]
    fn confirm_defaults_to_no() {
        let mut ui = interaction("\nYes\n");
        assert!(!ui.confirm("Remove?").unwrap());
        assert!(ui.confirm("Remove?").unwrap());
        assert!(!ui.confirm("Remove?").unwrap());
    }

    #[test]
    fn menu_shows_counts() {
        let mut ui = interaction("");
        ui.render_menu(
            "pip",
            &InventorySnapshot {
                installed: 12,
                outdated: 3,
            },
        )
        .unwrap();
        let printed = String::from_utf8(ui.output).unwrap();
        assert!(printed.contains("4. Update Packages"));
        assert!(printed.contains("Installed packages: "));
        assert!(printed.contains("12"));
    }
}
