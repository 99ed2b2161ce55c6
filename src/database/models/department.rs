use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepartmentType {
    Academic,
    Support,
}

impl DepartmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Academic => "academic",
            Self::Support => "support",
        }
    }
}

impl FromStr for DepartmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "academic" => Ok(Self::Academic),
            "support" => Ok(Self::Support),
            other => Err(format!("unknown department type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub dept_type: DepartmentType,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDepartment {
    pub name: String,
    pub code: String,
    pub dept_type: DepartmentType,
    #[serde(default)]
    pub description: String,
}
