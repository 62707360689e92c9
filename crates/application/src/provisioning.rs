//! Two-step account provisioning with compensating rollback.
//!
//! Account creation is atomic-looking but not transactional: the account
//! is created first, then its credential is assigned. A credential
//! failure triggers a best-effort delete of the fresh account so no
//! orphan is left behind without a usable credential. The state
//! transitions are modeled explicitly instead of relying on error
//! unwinding, which keeps the compensation contract testable against a
//! fake gateway.

use identra_core::{AppError, AppResult, GatewayStep};
use identra_domain::{CreateUserRequest, UserId};

use crate::{IdentityGateway, NewAccount};

/// Terminal state of one provisioning run.
#[derive(Debug)]
pub enum ProvisioningOutcome {
    /// Account created and credential assigned.
    Committed(UserId),
    /// Account creation itself failed; nothing to compensate.
    CreateFailed {
        /// Error from the create step.
        cause: AppError,
    },
    /// Credential assignment failed and the account was deleted again.
    RolledBack {
        /// Error from the failed credential step.
        cause: AppError,
    },
    /// Credential assignment failed and the compensating delete failed
    /// too; an inconsistent record is left on the provider.
    RollbackFailed {
        /// Error from the failed credential step.
        cause: AppError,
        /// Error from the failed compensating delete.
        rollback_cause: AppError,
    },
}

impl ProvisioningOutcome {
    /// Collapses the outcome into the service-level result.
    ///
    /// A successful rollback surfaces the original failure unchanged; a
    /// failed rollback surfaces `AppError::Consistency` carrying both
    /// failures.
    pub fn into_result(self) -> AppResult<UserId> {
        match self {
            Self::Committed(user_id) => Ok(user_id),
            Self::CreateFailed { cause } | Self::RolledBack { cause } => Err(cause),
            Self::RollbackFailed {
                cause,
                rollback_cause,
            } => Err(AppError::Consistency {
                step: GatewayStep::AssignCredential,
                message: cause.to_string(),
                rollback_message: rollback_cause.to_string(),
            }),
        }
    }
}

/// Creates an account and assigns its initial credential, compensating
/// on partial failure.
///
/// The rollback is awaited within the same future as the failed
/// credential step; it is never deferred or backgrounded past the
/// request's unit of work.
pub async fn provision_account(
    gateway: &dyn IdentityGateway,
    request: &CreateUserRequest,
) -> ProvisioningOutcome {
    let account = NewAccount::from(request);

    let user_id = match gateway.create_account(&account).await {
        Ok(user_id) => user_id,
        Err(cause) => return ProvisioningOutcome::CreateFailed { cause },
    };

    match gateway.assign_credential(user_id, &request.password).await {
        Ok(()) => ProvisioningOutcome::Committed(user_id),
        Err(cause) => match gateway.delete_account(user_id).await {
            Ok(()) => ProvisioningOutcome::RolledBack { cause },
            Err(rollback_cause) => ProvisioningOutcome::RollbackFailed {
                cause,
                rollback_cause,
            },
        },
    }
}
