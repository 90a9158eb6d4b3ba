// 👤 Habit Registry - Users with their 5 habits and lifetime charges
//
// User name is a VALUE (the string key callers use), User UUID is
// IDENTITY (stable across storage round trips). Every user carries
// exactly HABITS_PER_USER habits, fixed at registration time.

use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Habits per user is fixed at registration and never changes
pub const HABITS_PER_USER: usize = 5;

// ============================================================================
// USER ENTITY
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Stable identity (UUID), preserved across storage round trips
    pub id: String,

    /// Unique display name, trimmed at registration
    pub name: String,

    /// Exactly HABITS_PER_USER non-blank descriptors, registration order
    pub habits: Vec<String>,

    /// Lifetime charge total; overwritten by the aggregator, never
    /// accumulated in place
    pub lifetime_charge: f64,

    pub registered_at: DateTime<Utc>,
}

impl User {
    fn new(name: String, habits: Vec<String>) -> Self {
        User {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            habits,
            lifetime_charge: 0.0,
            registered_at: Utc::now(),
        }
    }

    /// Position of a habit in this user's list, by exact descriptor text
    pub fn habit_index(&self, habit: &str) -> Option<usize> {
        self.habits.iter().position(|h| h == habit)
    }
}

// ============================================================================
// HABIT REGISTRY
// ============================================================================

/// Owns all User entities, in registration order
#[derive(Debug, Default)]
pub struct HabitRegistry {
    users: Vec<User>,
}

impl HabitRegistry {
    pub fn new() -> Self {
        HabitRegistry { users: Vec::new() }
    }

    /// Register a new user with exactly 5 non-blank habits.
    ///
    /// Name and habits are trimmed before validation. Fails with
    /// DuplicateUser / BlankUserName / InvalidHabit without touching
    /// the registry.
    pub fn register_user(&mut self, name: &str, habits: &[String]) -> Result<&User, LedgerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::BlankUserName);
        }

        if self.contains(name) {
            return Err(LedgerError::DuplicateUser {
                name: name.to_string(),
            });
        }

        let habits = Self::validate_habits(habits)?;

        self.users.push(User::new(name.to_string(), habits));
        Ok(self.users.last().expect("just pushed"))
    }

    /// Re-insert a user restored from storage, preserving its id and
    /// lifetime charge. Same validation as register_user.
    pub fn restore_user(&mut self, user: User) -> Result<&User, LedgerError> {
        let name = user.name.trim().to_string();
        if name.is_empty() {
            return Err(LedgerError::BlankUserName);
        }
        if self.contains(&name) {
            return Err(LedgerError::DuplicateUser { name });
        }
        let habits = Self::validate_habits(&user.habits)?;

        self.users.push(User {
            name,
            habits,
            ..user
        });
        Ok(self.users.last().expect("just pushed"))
    }

    fn validate_habits(habits: &[String]) -> Result<Vec<String>, LedgerError> {
        let trimmed: Vec<String> = habits
            .iter()
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .collect();

        if trimmed.len() != HABITS_PER_USER || habits.len() != HABITS_PER_USER {
            return Err(LedgerError::InvalidHabit {
                reason: format!(
                    "expected exactly {} non-blank habits, got {}",
                    HABITS_PER_USER,
                    trimmed.len()
                ),
            });
        }

        Ok(trimmed)
    }

    /// All users, registration order
    pub fn list_users(&self) -> &[User] {
        &self.users
    }

    pub fn get(&self, name: &str) -> Option<&User> {
        self.users.iter().find(|u| u.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn count(&self) -> usize {
        self.users.len()
    }

    /// Replace (never add to) a user's lifetime charge total.
    /// Used only by the summary aggregator, which keeps re-runs
    /// idempotent.
    pub fn set_lifetime_charge(&mut self, name: &str, amount: f64) -> Result<(), LedgerError> {
        let user = self
            .users
            .iter_mut()
            .find(|u| u.name == name)
            .ok_or_else(|| LedgerError::UserNotFound {
                name: name.to_string(),
            })?;

        user.lifetime_charge = amount;
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
