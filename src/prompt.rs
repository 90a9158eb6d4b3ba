// 💬 User Prompt - Capability for the presentation layer
//
// The engine itself never prompts. This trait is the seam the
// presentation layer plugs a console, dialog box, or test script
// into; the registration flow below is the only piece of glue that
// drives it, and it goes through the same registry commands any
// other caller would.

use crate::error::LedgerError;
use crate::registry::{HabitRegistry, HABITS_PER_USER};

// ============================================================================
// USER PROMPT CAPABILITY
// ============================================================================

pub trait UserPrompt {
    /// Ask for one line of text; None means the user cancelled
    fn ask_text(&mut self, prompt: &str) -> Option<String>;

    /// Yes/no question
    fn confirm(&mut self, prompt: &str) -> bool;

    /// One-way notification
    fn notify(&mut self, message: &str);
}

// ============================================================================
// REGISTRATION FLOW
// ============================================================================

/// Prompt-driven user registration: one name prompt, then one prompt
/// per habit. Cancelling any prompt, or entering a blank value,
/// aborts without touching the registry.
///
/// Returns the registered name, or None when the flow was aborted.
pub fn register_user_interactive(
    prompt: &mut dyn UserPrompt,
    registry: &mut HabitRegistry,
) -> Result<Option<String>, LedgerError> {
    let name = match prompt.ask_text("Enter user name:") {
        Some(name) => name,
        None => return Ok(None),
    };

    let name = name.trim().to_string();
    if name.is_empty() {
        prompt.notify("Please enter a valid user name.");
        return Ok(None);
    }

    if registry.contains(&name) {
        prompt.notify("This user already exists.");
        return Ok(None);
    }

    let mut habits = Vec::with_capacity(HABITS_PER_USER);
    for i in 1..=HABITS_PER_USER {
        let habit = match prompt.ask_text(&format!("Enter Habit {} for {}:", i, name)) {
            Some(habit) => habit,
            None => return Ok(None),
        };

        if habit.trim().is_empty() {
            prompt.notify(&format!("Please enter a valid habit {}.", i));
            return Ok(None);
        }

        habits.push(habit);
    }

    registry.register_user(&name, &habits)?;
    prompt.notify(&format!(
        "User \"{}\" has been added with {} habits.",
        name, HABITS_PER_USER
    ));

    Ok(Some(name))
}

// ============================================================================
// TESTS
// ============================================================================
