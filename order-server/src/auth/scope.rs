//! Tenant-scoped authorization
//!
//! An [`Actor`] is resolved once per request from the token claims and passed
//! explicitly into every service call. All checks here are pure predicates;
//! the services decide whether a failed check reads as "not found" (orders,
//! tickets) or "forbidden" (branch selection).

use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::Order;
use thiserror::Error;

/// Which part of a restaurant a staff member can see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AuthScope {
    /// Every branch of the restaurant, optionally narrowed to one
    Restaurant {
        restaurant_id: i64,
        branch_filter: Option<i64>,
    },
    /// A single branch; cannot be widened or moved
    Branch { branch_id: i64 },
}

/// Authenticated principal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Staff { user_id: i64, scope: AuthScope },
    Customer { customer_id: i64 },
    /// Internal callers (payment webhook); bypasses tenant checks
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    #[error("staff token carries neither restaurant nor branch")]
    ScopeMissing,
    #[error("branch-scoped staff cannot act on branch {requested}")]
    BranchOverrideDenied { requested: i64 },
    #[error("a branch must be specified")]
    BranchRequired,
    #[error("branch {0} not found")]
    BranchNotFound(i64),
    #[error("staff access required")]
    StaffRequired,
    #[error("customer access required")]
    CustomerRequired,
}

impl From<GuardError> for AppError {
    fn from(err: GuardError) -> Self {
        let code = match &err {
            GuardError::ScopeMissing => ErrorCode::ScopeMissing,
            GuardError::BranchOverrideDenied { .. } => ErrorCode::BranchOverrideDenied,
            GuardError::BranchRequired => ErrorCode::BranchRequired,
            GuardError::BranchNotFound(_) => ErrorCode::BranchNotFound,
            GuardError::StaffRequired => ErrorCode::StaffRequired,
            GuardError::CustomerRequired => ErrorCode::CustomerRequired,
        };
        crate::security_log!(WARN, "scope_denied", reason = %err);
        AppError::with_message(code, err.to_string())
    }
}

/// Outcome of choosing the branch an operation runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchChoice {
    /// Already proven by the scope itself
    Fixed(i64),
    /// Caller must confirm the branch belongs to `restaurant_id`
    Verify { branch_id: i64, restaurant_id: i64 },
    /// Customer: any existing branch is acceptable
    Any(i64),
}

/// Tenant constraint for listing queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TenantFilter {
    pub restaurant_id: Option<i64>,
    pub branch_id: Option<i64>,
    pub customer_id: Option<i64>,
}

impl AuthScope {
    /// Build the scope from token claims. When both ids are present the
    /// narrower branch scope wins.
    pub fn from_claims(
        restaurant_id: Option<i64>,
        branch_id: Option<i64>,
    ) -> Result<Self, GuardError> {
        match (restaurant_id, branch_id) {
            (_, Some(branch_id)) => Ok(Self::Branch { branch_id }),
            (Some(restaurant_id), None) => Ok(Self::Restaurant {
                restaurant_id,
                branch_filter: None,
            }),
            (None, None) => Err(GuardError::ScopeMissing),
        }
    }

    /// Narrow a restaurant scope to one branch; branch scopes ignore this.
    pub fn with_branch_filter(self, branch: Option<i64>) -> Self {
        match self {
            Self::Restaurant { restaurant_id, .. } => Self::Restaurant {
                restaurant_id,
                branch_filter: branch,
            },
            other => other,
        }
    }

    pub fn covers(&self, restaurant_id: i64, branch_id: i64) -> bool {
        match *self {
            Self::Restaurant {
                restaurant_id: own,
                branch_filter,
            } => own == restaurant_id && branch_filter.is_none_or(|b| b == branch_id),
            Self::Branch { branch_id: own } => own == branch_id,
        }
    }

    /// Whether a staff member bound to `restaurant_id` (and optionally one
    /// branch) falls inside this scope. Restaurant-wide admins are only
    /// visible to restaurant scopes.
    pub fn covers_staff(&self, restaurant_id: Option<i64>, branch_id: Option<i64>) -> bool {
        match *self {
            Self::Restaurant {
                restaurant_id: own,
                branch_filter,
            } => {
                restaurant_id == Some(own)
                    && match (branch_filter, branch_id) {
                        (Some(filter), Some(branch)) => filter == branch,
                        _ => true,
                    }
            }
            Self::Branch { branch_id: own } => branch_id == Some(own),
        }
    }

    /// Pick the branch for a write, given what the request asked for.
    pub fn choose_branch(&self, requested: Option<i64>) -> Result<BranchChoice, GuardError> {
        match *self {
            Self::Branch { branch_id } => match requested {
                Some(other) if other != branch_id => {
                    Err(GuardError::BranchOverrideDenied { requested: other })
                }
                _ => Ok(BranchChoice::Fixed(branch_id)),
            },
            Self::Restaurant {
                restaurant_id,
                branch_filter,
            } => Self::narrow(requested, branch_filter)?
                .map(|branch_id| BranchChoice::Verify {
                    branch_id,
                    restaurant_id,
                })
                .ok_or(GuardError::BranchRequired),
        }
    }

    /// Listing constraint, optionally narrowed by a requested branch.
    pub fn list_filter(&self, requested: Option<i64>) -> Result<TenantFilter, GuardError> {
        match *self {
            Self::Branch { branch_id } => match requested {
                Some(other) if other != branch_id => {
                    Err(GuardError::BranchOverrideDenied { requested: other })
                }
                _ => Ok(TenantFilter {
                    branch_id: Some(branch_id),
                    ..Default::default()
                }),
            },
            Self::Restaurant {
                restaurant_id,
                branch_filter,
            } => Ok(TenantFilter {
                restaurant_id: Some(restaurant_id),
                branch_id: Self::narrow(requested, branch_filter)?,
                customer_id: None,
            }),
        }
    }

    /// A branch filter in the claims can't be widened by the request.
    fn narrow(requested: Option<i64>, branch_filter: Option<i64>) -> Result<Option<i64>, GuardError> {
        match (requested, branch_filter) {
            (Some(other), Some(filter)) if other != filter => {
                Err(GuardError::BranchOverrideDenied { requested: other })
            }
            _ => Ok(requested.or(branch_filter)),
        }
    }
}

impl Actor {
    pub fn staff(user_id: i64, scope: AuthScope) -> Self {
        Self::Staff { user_id, scope }
    }

    pub fn customer(customer_id: i64) -> Self {
        Self::Customer { customer_id }
    }

    pub fn require_staff(&self) -> Result<(i64, AuthScope), GuardError> {
        match *self {
            Self::Staff { user_id, scope } => Ok((user_id, scope)),
            _ => Err(GuardError::StaffRequired),
        }
    }

    pub fn require_customer(&self) -> Result<i64, GuardError> {
        match *self {
            Self::Customer { customer_id } => Ok(customer_id),
            _ => Err(GuardError::CustomerRequired),
        }
    }

    pub fn customer_id(&self) -> Option<i64> {
        match *self {
            Self::Customer { customer_id } => Some(customer_id),
            _ => None,
        }
    }

    pub fn staff_user_id(&self) -> Option<i64> {
        match *self {
            Self::Staff { user_id, .. } => Some(user_id),
            _ => None,
        }
    }

    /// Whether the order is visible to this actor. Callers report `false` as
    /// "not found" so other tenants' orders are indistinguishable from
    /// missing ones.
    pub fn can_access_order(&self, order: &Order) -> bool {
        match self {
            Self::Staff { scope, .. } => scope.covers(order.restaurant_id, order.branch_id),
            Self::Customer { customer_id } => order.customer_id == Some(*customer_id),
            Self::System => true,
        }
    }

    /// Branch-level access for staff (kitchen board, ticket bump)
    pub fn can_access_branch(&self, restaurant_id: i64, branch_id: i64) -> bool {
        match self {
            Self::Staff { scope, .. } => scope.covers(restaurant_id, branch_id),
            Self::Customer { .. } => false,
            Self::System => true,
        }
    }

    pub fn choose_branch(&self, requested: Option<i64>) -> Result<BranchChoice, GuardError> {
        match self {
            Self::Staff { scope, .. } => scope.choose_branch(requested),
            Self::Customer { .. } | Self::System => {
                requested.map(BranchChoice::Any).ok_or(GuardError::BranchRequired)
            }
        }
    }

    pub fn list_filter(&self, requested_branch: Option<i64>) -> Result<TenantFilter, GuardError> {
        match self {
            Self::Staff { scope, .. } => scope.list_filter(requested_branch),
            Self::Customer { customer_id } => Ok(TenantFilter {
                branch_id: requested_branch,
                customer_id: Some(*customer_id),
                ..Default::default()
            }),
            Self::System => Ok(TenantFilter {
                branch_id: requested_branch,
                ..Default::default()
            }),
        }
    }
}
