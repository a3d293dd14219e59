//! Construction projects and their per-role authorization lists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::random_suffix;
use super::user::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ProjectType {
    Residential,
    Commercial,
    Industrial,
    Infrastructure,
    #[serde(rename = "Mixed-Use")]
    MixedUse,
    Other,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Residential => "Residential",
            ProjectType::Commercial => "Commercial",
            ProjectType::Industrial => "Industrial",
            ProjectType::Infrastructure => "Infrastructure",
            ProjectType::MixedUse => "Mixed-Use",
            ProjectType::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Option<ProjectType> {
        match s {
            "Residential" => Some(ProjectType::Residential),
            "Commercial" => Some(ProjectType::Commercial),
            "Industrial" => Some(ProjectType::Industrial),
            "Infrastructure" => Some(ProjectType::Infrastructure),
            "Mixed-Use" => Some(ProjectType::MixedUse),
            "Other" => Some(ProjectType::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Active,
    Completed,
    #[serde(rename = "on-hold")]
    OnHold,
    Cancelled,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "active",
            ProjectStatus::Completed => "completed",
            ProjectStatus::OnHold => "on-hold",
            ProjectStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<ProjectStatus> {
        match s {
            "active" => Some(ProjectStatus::Active),
            "completed" => Some(ProjectStatus::Completed),
            "on-hold" => Some(ProjectStatus::OnHold),
            "cancelled" => Some(ProjectStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub pincode: Option<String>,
    pub coordinates: Option<Coordinates>,
}

impl Location {
    /// Field-wise merge for partial updates: provided fields win,
    /// absent ones keep their current value.
    pub fn merged(current: Option<Location>, patch: Location) -> Location {
        let cur = current.unwrap_or_default();
        Location {
            address: patch.address.or(cur.address),
            city: patch.city.or(cur.city),
            state: patch.state.or(cur.state),
            country: patch.country.or(cur.country),
            pincode: patch.pincode.or(cur.pincode),
            coordinates: patch.coordinates.or(cur.coordinates),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub start_date: Option<DateTime<Utc>>,
    pub expected_completion: Option<DateTime<Utc>>,
    pub actual_completion: Option<DateTime<Utc>>,
}

impl Timeline {
    pub fn merged(current: Option<Timeline>, patch: Timeline) -> Timeline {
        let cur = current.unwrap_or_default();
        Timeline {
            start_date: patch.start_date.or(cur.start_date),
            expected_completion: patch.expected_completion.or(cur.expected_completion),
            actual_completion: patch.actual_completion.or(cur.actual_completion),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub estimated: Option<f64>,
    pub actual: Option<f64>,
    pub currency: Option<String>,
}

impl Budget {
    pub fn merged(current: Option<Budget>, patch: Budget) -> Budget {
        let cur = current.unwrap_or_default();
        Budget {
            estimated: patch.estimated.or(cur.estimated),
            actual: patch.actual.or(cur.actual),
            currency: patch.currency.or(cur.currency),
        }
    }
}

/// One entry of a project's authorization list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizedParty {
    pub wallet_address: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub project_id: String,
    pub project_name: String,
    pub description: Option<String>,
    pub owner_wallet_address: String,
    pub project_type: ProjectType,
    pub status: ProjectStatus,
    pub location: Option<Location>,
    pub total_floors: Option<i64>,
    pub zones: Vec<String>,
    pub authorized_contractors: Vec<AuthorizedParty>,
    pub authorized_installers: Vec<AuthorizedParty>,
    pub authorized_suppliers: Vec<AuthorizedParty>,
    pub timeline: Option<Timeline>,
    pub budget: Option<Budget>,
    pub ipfs_hash: Option<String>,
    pub blockchain_tx_hash: Option<String>,
    pub verification_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// `PRJ-<unix millis>-<suffix>`.
    pub fn generate_id() -> String {
        format!("PRJ-{}-{}", Utc::now().timestamp_millis(), random_suffix())
    }

    /// Whether `wallet_address` may write to this project when acting
    /// with `role`. The owner is authorized for every role; everyone
    /// else must appear on the list matching their own role. Regulators
    /// are never write-authorized here; their read access is a separate
    /// override at the route layer.
    pub fn is_authorized(&self, wallet_address: &str, role: Role) -> bool {
        if self.owner_wallet_address == wallet_address {
            return true;
        }
        let list = match role {
            Role::Contractor => &self.authorized_contractors,
            Role::Installer => &self.authorized_installers,
            Role::Supplier => &self.authorized_suppliers,
            Role::Owner | Role::Regulator => return false,
        };
        list.iter().any(|p| p.wallet_address == wallet_address)
    }
}

/// Compact projection used by profile and dashboard listings.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub project_id: String,
    pub project_name: String,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn party(wallet: &str) -> AuthorizedParty {
        AuthorizedParty {
            wallet_address: wallet.to_string(),
            added_at: Utc::now(),
        }
    }

    fn sample_project() -> Project {
        Project {
            project_id: "PRJ-1-TEST".into(),
            project_name: "Tower A".into(),
            description: None,
            owner_wallet_address: "0xowner".into(),
            project_type: ProjectType::Residential,
            status: ProjectStatus::Active,
            location: None,
            total_floors: None,
            zones: vec![],
            authorized_contractors: vec![party("0xcontractor")],
            authorized_installers: vec![party("0xinstaller")],
            authorized_suppliers: vec![],
            timeline: None,
            budget: None,
            ipfs_hash: None,
            blockchain_tx_hash: None,
            verification_url: "http://localhost:5173/verify/PRJ-1-TEST".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn owner_is_authorized_for_every_role() {
        let project = sample_project();
        for role in [
            Role::Owner,
            Role::Contractor,
            Role::Installer,
            Role::Supplier,
            Role::Regulator,
        ] {
            assert!(project.is_authorized("0xowner", role));
        }
    }

    #[test]
    fn members_are_authorized_only_for_their_own_list() {
        let project = sample_project();
        assert!(project.is_authorized("0xcontractor", Role::Contractor));
        assert!(!project.is_authorized("0xcontractor", Role::Installer));
        assert!(project.is_authorized("0xinstaller", Role::Installer));
        assert!(!project.is_authorized("0xinstaller", Role::Supplier));
        assert!(!project.is_authorized("0xsupplier", Role::Supplier));
    }

    #[test]
    fn regulators_are_never_write_authorized() {
        let project = sample_project();
        assert!(!project.is_authorized("0xregulator", Role::Regulator));
    }

    #[test]
    fn generated_ids_carry_the_project_prefix() {
        let id = Project::generate_id();
        assert!(id.starts_with("PRJ-"));
        assert_eq!(id.split('-').count(), 3);
    }

    #[test]
    fn location_merge_keeps_unpatched_fields() {
        let current = Location {
            address: Some("1 Main St".into()),
            city: Some("Mumbai".into()),
            ..Default::default()
        };
        let patch = Location {
            city: Some("Pune".into()),
            ..Default::default()
        };
        let merged = Location::merged(Some(current), patch);
        assert_eq!(merged.address.as_deref(), Some("1 Main St"));
        assert_eq!(merged.city.as_deref(), Some("Pune"));
    }

    #[test]
    fn status_and_type_round_trip() {
        assert_eq!(
            ProjectStatus::parse("on-hold"),
            Some(ProjectStatus::OnHold)
        );
        assert_eq!(ProjectStatus::OnHold.as_str(), "on-hold");
        assert_eq!(ProjectType::parse("Mixed-Use"), Some(ProjectType::MixedUse));
        assert_eq!(ProjectType::MixedUse.as_str(), "Mixed-Use");
        assert_eq!(ProjectType::parse("Campground"), None);
    }
}
