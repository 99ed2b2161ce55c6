use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    FinancialAdmin,
    DepartmentHead,
    Faculty,
    Staff,
    Student,
    Parent,
    Auditor,
}

/// Which dashboard a role lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardKind {
    Admin,
    DepartmentHead,
    FacultyStaff,
    StudentParent,
    Auditor,
}

impl Role {
    pub const ALL: [Role; 8] = [
        Role::SuperAdmin,
        Role::FinancialAdmin,
        Role::DepartmentHead,
        Role::Faculty,
        Role::Staff,
        Role::Student,
        Role::Parent,
        Role::Auditor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::FinancialAdmin => "financial_admin",
            Role::DepartmentHead => "department_head",
            Role::Faculty => "faculty",
            Role::Staff => "staff",
            Role::Student => "student",
            Role::Parent => "parent",
            Role::Auditor => "auditor",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::FinancialAdmin)
    }

    pub fn dashboard(&self) -> DashboardKind {
        match self {
            Role::SuperAdmin | Role::FinancialAdmin => DashboardKind::Admin,
            Role::DepartmentHead => DashboardKind::DepartmentHead,
            Role::Faculty | Role::Staff => DashboardKind::FacultyStaff,
            Role::Student | Role::Parent => DashboardKind::StudentParent,
            Role::Auditor => DashboardKind::Auditor,
        }
    }

    /// Badge text, e.g. `DEPARTMENT HEAD`.
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ").to_uppercase()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == wanted)
            .ok_or_else(|| format!("unknown role: {s}"))
    }
}

/// Maps a stored role string to a dashboard. Unknown or missing roles get the
/// student/parent view, which only shows public aggregates.
pub fn dashboard_for(role: Option<&str>) -> DashboardKind {
    role.and_then(|r| r.parse::<Role>().ok())
        .map(|r| r.dashboard())
        .unwrap_or(DashboardKind::StudentParent)
}

/// Landing path after the login-time staff type prompt.
pub fn redirect_target(role: Role) -> &'static str {
    match role {
        Role::Staff => "/staff-dash",
        r if r.is_admin() => "/admin",
        _ => "/dashboard",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_role_round_trips_through_its_text_form() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("janitor".parse::<Role>().is_err());
    }

    #[test]
    fn dashboards_follow_role_groups() {
        assert_eq!(Role::SuperAdmin.dashboard(), DashboardKind::Admin);
        assert_eq!(Role::FinancialAdmin.dashboard(), DashboardKind::Admin);
        assert_eq!(Role::Staff.dashboard(), DashboardKind::FacultyStaff);
        assert_eq!(Role::Parent.dashboard(), DashboardKind::StudentParent);
        assert_eq!(Role::Auditor.dashboard(), DashboardKind::Auditor);
    }

    #[test]
    fn unknown_role_falls_back_to_student_parent() {
        assert_eq!(dashboard_for(Some("visitor")), DashboardKind::StudentParent);
        assert_eq!(dashboard_for(None), DashboardKind::StudentParent);
        assert_eq!(dashboard_for(Some("department_head")), DashboardKind::DepartmentHead);
    }

    #[test]
    fn staff_type_redirects() {
        assert_eq!(redirect_target(Role::Staff), "/staff-dash");
        assert_eq!(redirect_target(Role::FinancialAdmin), "/admin");
        assert_eq!(redirect_target(Role::Student), "/dashboard");
    }

    #[test]
    fn label_is_spaced_and_uppercased() {
        assert_eq!(Role::DepartmentHead.label(), "DEPARTMENT HEAD");
    }
}
