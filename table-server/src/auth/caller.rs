//! Caller identity
//!
//! Every request is made by exactly one kind of caller. Guests carry a token
//! bound to one guest session; staff carry role and place claims.

use shared::error::AppError;
use shared::models::Place;

use super::jwt::{Claims, StaffRole, SubjectKind};
use crate::security_log;

/// Guest identity taken from a guest token
#[derive(Debug, Clone, PartialEq)]
pub struct GuestContext {
    pub session_id: String,
    pub table_id: String,
    pub group_id: String,
    /// The raw token, compared against stored sessions
    pub token: String,
}

/// Staff identity taken from a staff token
#[derive(Debug, Clone, PartialEq)]
pub struct StaffContext {
    pub staff_id: String,
    pub role: StaffRole,
    pub place_id: String,
    pub business_id: String,
}

impl StaffContext {
    /// Staff act on their own place; owners on every place of their business
    pub fn can_manage(&self, place: &Place) -> bool {
        self.place_id == place.id
            || (self.role == StaffRole::Owner && self.business_id == place.business_id)
    }

    /// Gate an action on something owned by `place_id`
    ///
    /// `place` is the stored place record when it exists; without it only a
    /// direct place match is accepted.
    pub fn authorize(&self, place_id: &str, place: Option<&Place>) -> Result<(), AppError> {
        let allowed = match place {
            Some(place) => self.can_manage(place),
            None => self.place_id == place_id,
        };
        if allowed {
            return Ok(());
        }
        security_log!(
            "WARN",
            "cross_place_action",
            staff_id = self.staff_id.as_str(),
            staff_place = self.place_id.as_str(),
            target_place = place_id
        );
        Err(AppError::permission_denied(
            "Staff may only act on tables of their own place",
        ))
    }
}

/// Who is calling
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Caller {
    /// No Authorization header
    #[default]
    Anonymous,
    Guest(GuestContext),
    Staff(StaffContext),
}

impl Caller {
    /// Build from verified claims; `token` is the raw bearer token
    pub fn from_claims(claims: Claims, token: &str) -> Result<Self, AppError> {
        match claims.kind {
            SubjectKind::Guest => {
                let (Some(table_id), Some(group_id)) = (claims.table_id, claims.group_id) else {
                    return Err(AppError::invalid_token("Guest token without table"));
                };
                Ok(Caller::Guest(GuestContext {
                    session_id: claims.session_id.unwrap_or(claims.sub),
                    table_id,
                    group_id,
                    token: token.to_string(),
                }))
            }
            SubjectKind::Staff => {
                let (Some(role), Some(place_id), Some(business_id)) =
                    (claims.role, claims.place_id, claims.business_id)
                else {
                    return Err(AppError::invalid_token("Staff token without role or place"));
                };
                Ok(Caller::Staff(StaffContext {
                    staff_id: claims.staff_id.unwrap_or(claims.sub),
                    role,
                    place_id,
                    business_id,
                }))
            }
        }
    }

    pub fn as_guest(&self) -> Option<&GuestContext> {
        match self {
            Caller::Guest(guest) => Some(guest),
            _ => None,
        }
    }

    pub fn as_staff(&self) -> Option<&StaffContext> {
        match self {
            Caller::Staff(staff) => Some(staff),
            _ => None,
        }
    }

    /// Staff or `StaffRequired`
    pub fn require_staff(&self) -> Result<&StaffContext, AppError> {
        self.as_staff()
            .ok_or_else(|| AppError::new(shared::ErrorCode::StaffRequired))
    }

    /// Short label for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Caller::Anonymous => "anonymous",
            Caller::Guest(_) => "guest",
            Caller::Staff(_) => "staff",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtService;
    use chrono::{Duration, Utc};
    use shared::ErrorCode;

    fn staff(role: StaffRole, place_id: &str, business_id: &str) -> StaffContext {
        StaffContext {
            staff_id: "staff-1".into(),
            role,
            place_id: place_id.into(),
            business_id: business_id.into(),
        }
    }

    fn place(id: &str, business_id: &str) -> Place {
        Place {
            id: id.into(),
            business_id: business_id.into(),
            name: "Harbor".into(),
        }
    }

    #[test]
    fn test_staff_place_rule() {
        let other_place = place("place-2", "biz-1");
        assert!(staff(StaffRole::Waiter, "place-2", "biz-1").can_manage(&other_place));
        assert!(!staff(StaffRole::Waiter, "place-1", "biz-1").can_manage(&other_place));
        assert!(!staff(StaffRole::Manager, "place-1", "biz-1").can_manage(&other_place));
        // Owners span the whole business, not other businesses
        assert!(staff(StaffRole::Owner, "place-1", "biz-1").can_manage(&other_place));
        assert!(!staff(StaffRole::Owner, "place-1", "biz-9").can_manage(&other_place));
    }

    #[test]
    fn test_authorize_without_place_record() {
        let owner = staff(StaffRole::Owner, "place-1", "biz-1");
        assert!(owner.authorize("place-1", None).is_ok());
        let err = owner.authorize("place-2", None).unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
        assert!(owner.authorize("place-2", Some(&place("place-2", "biz-1"))).is_ok());
    }

    #[test]
    fn test_caller_from_guest_claims() {
        let jwt = JwtService::new_with_secure_key().unwrap();
        let token = jwt
            .issue_guest_token("t-1", "s-1", "g-1", Utc::now() + Duration::minutes(5))
            .unwrap();
        let claims = jwt.verify(&token).unwrap();

        let caller = Caller::from_claims(claims, &token).unwrap();
        let guest = caller.as_guest().unwrap();
        assert_eq!(guest.session_id, "s-1");
        assert_eq!(guest.table_id, "t-1");
        assert_eq!(guest.token, token);
        assert_eq!(
            caller.require_staff().unwrap_err().code,
            ErrorCode::StaffRequired
        );
    }

    #[test]
    fn test_caller_from_staff_claims() {
        let jwt = JwtService::new_with_secure_key().unwrap();
        let token = jwt
            .issue_staff_token("staff-7", StaffRole::Manager, "place-1", "biz-1")
            .unwrap();
        let caller = Caller::from_claims(jwt.verify(&token).unwrap(), &token).unwrap();

        let staff = caller.require_staff().unwrap();
        assert_eq!(staff.staff_id, "staff-7");
        assert_eq!(staff.role, StaffRole::Manager);
        assert_eq!(caller.kind(), "staff");
    }
}
