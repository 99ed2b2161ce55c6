mod common;

use finance_transparency::currency::Currency;
use finance_transparency::dashboards::{build_dashboard, Dashboard};
use finance_transparency::transparency::{self, PortalQuery, PortalSettings};
use rust_decimal::Decimal;

fn settings() -> PortalSettings {
    PortalSettings { fiscal_year: 2024, usd_rate: Decimal::new(12, 3) }
}

#[tokio::test]
async fn overview_totals_cover_every_department() {
    let pool = common::seeded_pool().await;

    let overview = transparency::overview(&pool, settings(), &PortalQuery::default()).await.unwrap();
    assert_eq!(overview.stats.total_allocated, Decimal::from(8_400_000));
    assert_eq!(overview.stats.total_spent, Decimal::from(6_100_000));
    assert_eq!(overview.stats.departments_count, 6);
    assert_eq!(overview.stats.fund_sources_count, 5);
    assert_eq!(overview.stats.utilization, Decimal::new(7262, 2));
    assert_eq!(overview.breakdown.academic_count, 3);
    assert_eq!(overview.breakdown.support_count, 3);
}

#[tokio::test]
async fn portal_filters_narrow_departments_and_stats() {
    let pool = common::seeded_pool().await;

    let q = PortalQuery { search: Some("eng".into()), ..Default::default() };
    let rows = transparency::public_departments(&pool, settings(), &q).await.unwrap();
    let names: Vec<_> = rows.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["Electrical Engineering", "Mechanical Engineering"]);

    let q = PortalQuery { vendor: Some("techlabs".into()), ..Default::default() };
    let stats = transparency::stats(&pool, settings(), &q).await.unwrap();
    assert_eq!(stats.departments_count, 1);
    assert_eq!(stats.total_allocated, Decimal::from(2_000_000));
    // CS draws on two funds
    assert_eq!(stats.fund_sources_count, 2);
}

#[tokio::test]
async fn usd_amounts_use_the_configured_rate() {
    let pool = common::seeded_pool().await;

    let q = PortalQuery { currency: Currency::Usd, ..Default::default() };
    let stats = transparency::stats(&pool, settings(), &q).await.unwrap();
    assert_eq!(stats.total_allocated, Decimal::from(100_800));
    assert_eq!(stats.utilization, Decimal::new(7262, 2));
}

#[tokio::test]
async fn spending_trend_is_chronological_and_cumulative() {
    let pool = common::seeded_pool().await;

    let points = transparency::spending_trends(&pool, settings(), Currency::Inr).await.unwrap();
    assert_eq!(points.len(), 8);
    assert_eq!(points[0].month, "Jan 2024");
    assert_eq!(points[7].month, "Nov 2024");
    assert!(points.windows(2).all(|w| w[1].cumulative > w[0].cumulative));
    assert_eq!(points[7].cumulative, Decimal::from(1_720_000));
}

#[tokio::test]
async fn each_role_gets_its_own_dashboard() {
    let pool = common::seeded_pool().await;

    let admin = common::sign_in_as(&pool, "admin@acear.edu").await;
    match build_dashboard(&pool, &admin, 2024).await.unwrap() {
        Dashboard::Admin(d) => {
            assert_eq!(d.department_count, 6);
            assert_eq!(d.pending_count, 1);
            assert_eq!(d.alerts.len(), 3);
            assert_eq!(d.recent_transactions.len(), 5);
        }
        other => panic!("unexpected dashboard: {other:?}"),
    }

    let head = common::sign_in_as(&pool, "cs.head@acear.edu").await;
    match build_dashboard(&pool, &head, 2024).await.unwrap() {
        Dashboard::DepartmentHead(d) => {
            assert_eq!(d.department.map(|d| d.code).as_deref(), Some("CS"));
            assert_eq!(d.allocations.len(), 2);
            assert_eq!(d.totals.allocated, Decimal::from(2_000_000));
        }
        other => panic!("unexpected dashboard: {other:?}"),
    }

    let faculty = common::sign_in_as(&pool, "faculty@acear.edu").await;
    match build_dashboard(&pool, &faculty, 2024).await.unwrap() {
        Dashboard::FacultyStaff(d) => {
            assert_eq!(d.transactions.len(), 3);
            assert_eq!(d.total_amount, Decimal::from(870_000));
        }
        other => panic!("unexpected dashboard: {other:?}"),
    }

    let student = common::sign_in_as(&pool, "student@acear.edu").await;
    match build_dashboard(&pool, &student, 2024).await.unwrap() {
        Dashboard::StudentParent(d) => {
            assert_eq!(d.title, "Student Portal");
            assert_eq!(d.student_services_spent, Decimal::from(900_000));
        }
        other => panic!("unexpected dashboard: {other:?}"),
    }

    let auditor = common::sign_in_as(&pool, "auditor@acear.edu").await;
    match build_dashboard(&pool, &auditor, 2024).await.unwrap() {
        Dashboard::Auditor(d) => {
            assert_eq!(d.flagged_transactions.len(), 1);
            assert_eq!(d.flagged_transactions[0].invoice_number.as_deref(), Some("INV-2024-009"));
        }
        other => panic!("unexpected dashboard: {other:?}"),
    }
}
