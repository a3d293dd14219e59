//! Users, roles, and the role permission matrix.
//!
//! A user is identified by a lowercase `0x`-prefixed wallet address.
//! Roles are closed: every permission decision is a `match`, so adding
//! a role forces every gate to be revisited at compile time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The five participant roles of the passport workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Contractor,
    Installer,
    Supplier,
    Regulator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Contractor => "contractor",
            Role::Installer => "installer",
            Role::Supplier => "supplier",
            Role::Regulator => "regulator",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "owner" => Some(Role::Owner),
            "contractor" => Some(Role::Contractor),
            "installer" => Some(Role::Installer),
            "supplier" => Some(Role::Supplier),
            "regulator" => Some(Role::Regulator),
            _ => None,
        }
    }

    /// Role permission matrix. Owners manage projects, contractors open
    /// passports, installers record installations, suppliers enrich.
    /// Regulators hold no write permission at all; their read access is
    /// granted separately at the project boundary.
    pub fn permits(&self, action: Action) -> bool {
        match action {
            Action::CreateProject => matches!(self, Role::Owner),
            Action::CreatePassport => matches!(self, Role::Contractor),
            Action::RecordInstallation => matches!(self, Role::Installer),
            Action::EnrichPassport => matches!(self, Role::Supplier),
        }
    }
}

/// Write operations guarded by the role matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateProject,
    CreatePassport,
    RecordInstallation,
    EnrichPassport,
}

impl Action {
    /// Human-readable name used in permission error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Action::CreateProject => "create projects",
            Action::CreatePassport => "create DPPs",
            Action::RecordInstallation => "update installation data",
            Action::EnrichPassport => "enrich DPPs",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub wallet_address: String,
    pub role: Role,
    pub name: String,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub profile_image: Option<String>,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Canonical form of a wallet address: trimmed and lowercased.
pub fn normalize_wallet(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// `0x` followed by exactly 40 hex digits.
pub fn is_wallet_address(s: &str) -> bool {
    s.len() == 42
        && s.starts_with("0x")
        && s[2..].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_strings() {
        for role in [
            Role::Owner,
            Role::Contractor,
            Role::Installer,
            Role::Supplier,
            Role::Regulator,
        ] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("auditor"), None);
    }

    #[test]
    fn permission_matrix() {
        assert!(Role::Owner.permits(Action::CreateProject));
        assert!(!Role::Owner.permits(Action::CreatePassport));

        assert!(Role::Contractor.permits(Action::CreatePassport));
        assert!(!Role::Contractor.permits(Action::RecordInstallation));

        assert!(Role::Installer.permits(Action::RecordInstallation));
        assert!(!Role::Installer.permits(Action::EnrichPassport));

        assert!(Role::Supplier.permits(Action::EnrichPassport));
        assert!(!Role::Supplier.permits(Action::CreateProject));

        // Regulators are read-only everywhere.
        for action in [
            Action::CreateProject,
            Action::CreatePassport,
            Action::RecordInstallation,
            Action::EnrichPassport,
        ] {
            assert!(!Role::Regulator.permits(action));
        }
    }

    #[test]
    fn wallet_normalization_lowercases() {
        assert_eq!(
            normalize_wallet("  0xABCDEF1234567890abcdef1234567890ABCDEF12 "),
            "0xabcdef1234567890abcdef1234567890abcdef12"
        );
    }

    #[test]
    fn wallet_format_check() {
        assert!(is_wallet_address("0xabcdef1234567890abcdef1234567890abcdef12"));
        assert!(is_wallet_address("0xABCDEF1234567890ABCDEF1234567890ABCDEF12"));
        assert!(!is_wallet_address("abcdef1234567890abcdef1234567890abcdef12"));
        assert!(!is_wallet_address("0xabc"));
        assert!(!is_wallet_address("0xzzcdef1234567890abcdef1234567890abcdef12"));
    }
}
