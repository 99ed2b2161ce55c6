pub mod accounts;
pub mod password;
pub mod role;
pub mod session;
pub mod validation;

pub use accounts::{
    choose_role, sign_in, sign_up, verify_email, RoleChoice, SignInOutcome, SignUpOutcome, SignUpRequest,
    SELF_SERVICE_ROLES,
};
pub use role::{dashboard_for, redirect_target, DashboardKind, Role};
pub use session::{authenticate, sign_out, token_from_headers, BudgetReach, CurrentUser};
