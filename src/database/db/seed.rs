use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{Pool, Sqlite};
use tracing::info;

use crate::auth::password::{hash_password, new_salt};
use crate::auth::Role;
use crate::database::db::queries::{self, NewUserRecord};
use crate::database::models::{
    AllocationInput, DepartmentType, FundSourceInput, FundType, NewAuditLog, NewDepartment,
    NewTransaction, TransactionStatus,
};
use crate::error::AppResult;

pub const DEMO_PASSWORD: &str = "demo1234";
pub const DEMO_FISCAL_YEAR: i32 = 2024;

struct DeptSeed {
    name: &'static str,
    code: &'static str,
    dept_type: DepartmentType,
    description: &'static str,
    // (category, fund index, allocated, spent)
    allocations: [(&'static str, usize, i64, i64); 2],
}

const DEPARTMENTS: [DeptSeed; 6] = [
    DeptSeed {
        name: "Computer Science",
        code: "CS",
        dept_type: DepartmentType::Academic,
        description: "Department of Computer Science and Engineering.",
        allocations: [
            ("salaries_benefits", 0, 1_200_000, 950_000),
            ("research_development", 4, 800_000, 550_000),
        ],
    },
    DeptSeed {
        name: "Mechanical Engineering",
        code: "ME",
        dept_type: DepartmentType::Academic,
        description: "Department of Mechanical Engineering.",
        allocations: [
            ("salaries_benefits", 1, 1_100_000, 800_000),
            ("equipment_supplies", 0, 700_000, 400_000),
        ],
    },
    DeptSeed {
        name: "Library",
        code: "LIB",
        dept_type: DepartmentType::Support,
        description: "Central Library and digital resources.",
        allocations: [
            ("student_services", 1, 600_000, 500_000),
            ("equipment_supplies", 2, 400_000, 300_000),
        ],
    },
    DeptSeed {
        name: "Sports",
        code: "SPT",
        dept_type: DepartmentType::Support,
        description: "Sports and recreation facilities.",
        allocations: [
            ("student_services", 3, 500_000, 400_000),
            ("infrastructure_maintenance", 2, 300_000, 200_000),
        ],
    },
    DeptSeed {
        name: "Electrical Engineering",
        code: "EE",
        dept_type: DepartmentType::Academic,
        description: "Department of Electrical Engineering.",
        allocations: [
            ("salaries_benefits", 0, 1_000_000, 700_000),
            ("research_development", 3, 600_000, 400_000),
        ],
    },
    DeptSeed {
        name: "Administration",
        code: "ADM",
        dept_type: DepartmentType::Support,
        description: "Administrative and support services.",
        allocations: [
            ("administrative_costs", 1, 800_000, 600_000),
            ("utilities", 0, 400_000, 300_000),
        ],
    },
];

// (name, type, total, available, description)
const FUNDS: [(&str, FundType, i64, i64, &str); 5] = [
    ("Government Grant", FundType::GovernmentGrants, 7_000_000, 3_500_000, "State and central government grants."),
    ("Tuition Fees", FundType::TuitionFees, 5_000_000, 2_000_000, "Student tuition and academic fees."),
    ("Alumni Donations", FundType::Donations, 1_000_000, 800_000, "Contributions from alumni."),
    ("Corporate Sponsorships", FundType::Endowment, 800_000, 600_000, "Industry partnerships and sponsorships."),
    ("Research Grants", FundType::ResearchGrants, 500_000, 300_000, "Sponsored research projects."),
];

// (dept code, allocation slot, description, vendor, amount, status, date, invoice)
const TRANSACTIONS: [(&str, usize, &str, &str, i64, TransactionStatus, (u32, u32), &str); 12] = [
    ("CS", 1, "Lab Equipment Purchase", "TechLabs Pvt Ltd", 500_000, TransactionStatus::Completed, (6, 15), "INV-2024-001"),
    ("CS", 1, "Event Funding", "National Level Hackathon", 250_000, TransactionStatus::Approved, (3, 5), "INV-2024-002"),
    ("CS", 0, "Visiting Faculty Honorarium", "Guest Lecture Series", 120_000, TransactionStatus::Completed, (1, 22), "INV-2024-003"),
    ("SPT", 0, "Intercollege Event", "Annual Sports Meet", 300_000, TransactionStatus::Completed, (4, 12), "INV-2024-004"),
    ("SPT", 1, "Renovation Work", "Builders Co.", 180_000, TransactionStatus::Completed, (5, 28), "INV-2024-005"),
    ("LIB", 0, "Digital Library Subscription", "EduSoft Pvt Ltd", 150_000, TransactionStatus::Pending, (2, 18), "INV-2024-006"),
    ("LIB", 1, "Reading Room Furniture", "Campus Interiors", 95_000, TransactionStatus::Completed, (7, 9), "INV-2024-007"),
    ("ME", 1, "CNC Machine Maintenance", "Precision Tools Ltd", 210_000, TransactionStatus::Completed, (8, 3), "INV-2024-008"),
    ("ME", 0, "Workshop Staff Overtime", "Payroll", 80_000, TransactionStatus::Flagged, (9, 14), "INV-2024-009"),
    ("EE", 1, "Power Systems Research Kit", "VoltEdge Systems", 175_000, TransactionStatus::Completed, (10, 21), "INV-2024-010"),
    ("ADM", 1, "Electricity Bill", "State Power Board", 140_000, TransactionStatus::Completed, (11, 30), "INV-2024-011"),
    ("ADM", 0, "Office Supplies", "Stationery Mart", 45_000, TransactionStatus::Rejected, (12, 10), "INV-2024-012"),
];

const ALERTS: [(&str, &str, &str, &str); 3] = [
    ("budget_overrun", "Budget overrun risk", "Computer Science research spending is approaching its allocation.", "high"),
    ("low_utilization", "Low utilization", "Electrical Engineering research funds are under 70% utilized.", "medium"),
    ("pending_approval", "Pending approvals", "Library subscription payment awaits approval.", "medium"),
];

// (email, name, role, dept code)
const ACCOUNTS: [(&str, &str, Role, Option<&str>); 5] = [
    ("admin@acear.edu", "Finance Office", Role::FinancialAdmin, None),
    ("cs.head@acear.edu", "CS Department Head", Role::DepartmentHead, Some("CS")),
    ("faculty@acear.edu", "CS Faculty Member", Role::Faculty, Some("CS")),
    ("student@acear.edu", "Demo Student", Role::Student, None),
    ("auditor@acear.edu", "Internal Auditor", Role::Auditor, None),
];

fn rupees(n: i64) -> Decimal {
    Decimal::from(n)
}

/// Loads the demo institution. Returns false when departments already exist.
pub async fn seed_demo_data(pool: &Pool<Sqlite>) -> AppResult<bool> {
    if !queries::list_departments(pool).await?.is_empty() {
        info!("store already holds departments; skipping demo seed");
        return Ok(false);
    }

    let period_start = NaiveDate::from_ymd_opt(DEMO_FISCAL_YEAR, 1, 1);
    let period_end = NaiveDate::from_ymd_opt(DEMO_FISCAL_YEAR, 12, 31);

    let mut fund_ids = Vec::with_capacity(FUNDS.len());
    for (name, fund_type, total, available, description) in FUNDS {
        let id = queries::create_fund_source(
            pool,
            &FundSourceInput {
                name: name.to_string(),
                fund_type,
                total_amount: rupees(total),
                available_amount: rupees(available),
                description: description.to_string(),
                grant_period_start: period_start,
                grant_period_end: period_end,
            },
        )
        .await?;
        fund_ids.push(id);
    }

    // dept code -> (department id, allocation ids)
    let mut placed: Vec<(&str, i64, Vec<i64>)> = Vec::new();
    for dept in &DEPARTMENTS {
        let dept_id = queries::create_department(
            pool,
            &NewDepartment {
                name: dept.name.to_string(),
                code: dept.code.to_string(),
                dept_type: dept.dept_type,
                description: dept.description.to_string(),
            },
        )
        .await?;

        let mut allocation_ids = Vec::new();
        for (category, fund_idx, allocated, spent) in dept.allocations {
            let id = queries::create_allocation(
                pool,
                &AllocationInput {
                    department_id: dept_id,
                    fund_source_id: fund_ids[fund_idx],
                    category: category.to_string(),
                    fiscal_year: DEMO_FISCAL_YEAR,
                    allocated_amount: rupees(allocated),
                    spent_amount: rupees(spent),
                },
            )
            .await?;
            allocation_ids.push(id);
        }
        placed.push((dept.code, dept_id, allocation_ids));
    }

    let salt = new_salt();
    let hash = hash_password(DEMO_PASSWORD, &salt)?;
    let mut faculty_id = None;
    for (email, name, role, dept_code) in ACCOUNTS {
        let department_id = dept_code
            .and_then(|code| placed.iter().find(|(c, _, _)| *c == code))
            .map(|(_, id, _)| *id);
        let user_id = queries::create_user_with_profile(
            pool,
            &NewUserRecord {
                email,
                password_hash: &hash,
                password_salt: &salt,
                verification_token: None,
                confirmed: true,
                full_name: name,
                role: Some(role.as_str()),
                department_id,
            },
        )
        .await?;
        if role == Role::Faculty {
            faculty_id = Some(user_id);
        }
    }

    // spent amounts above already include completed spend, so rows go in with their final status
    for (code, slot, description, vendor, amount, status, (month, day), invoice) in TRANSACTIONS {
        let Some((_, _, allocation_ids)) = placed.iter().find(|(c, _, _)| *c == code) else {
            continue;
        };
        let Some(date) = NaiveDate::from_ymd_opt(DEMO_FISCAL_YEAR, month, day) else {
            continue;
        };
        let created_by = if code == "CS" { faculty_id } else { None };
        queries::insert_transaction(
            pool,
            &NewTransaction {
                allocation_id: allocation_ids[slot],
                description: description.to_string(),
                vendor_name: Some(vendor.to_string()),
                amount: rupees(amount),
                transaction_date: date,
                invoice_number: Some(invoice.to_string()),
            },
            status,
            created_by,
        )
        .await?;
    }

    let now = Utc::now();
    for (i, (alert_type, title, description, severity)) in ALERTS.into_iter().enumerate() {
        queries::insert_alert(pool, alert_type, title, description, severity, now - Duration::hours(i as i64))
            .await?;
    }

    for entry in [
        NewAuditLog::info(Some("admin@acear.edu"), "Budget Approved", "budget_allocation", "FY2024 allocations approved"),
        NewAuditLog::info(Some("admin@acear.edu"), "Permission Changed", "profile", "cs.head@acear.edu -> department_head")
            .with_severity("warning"),
        NewAuditLog::info(Some("auditor@acear.edu"), "Transaction Flagged", "transaction", "INV-2024-009 overtime claim")
            .with_severity("warning"),
    ] {
        queries::append_audit(pool, &entry).await?;
    }

    info!(
        departments = DEPARTMENTS.len(),
        funds = FUNDS.len(),
        transactions = TRANSACTIONS.len(),
        "demo data loaded"
    );
    Ok(true)
}
