//! # Identity Bootstrap Hook
//!
//! The identity provider calls this hook before a new account becomes
//! usable. Every prospective account is confirmed without a verification
//! challenge; email and phone are marked verified when the account has them.
//!
//! No check is made on the email or handle beyond what the provider already
//! required at submission. Deliverability and ownership are not verified.
//!
//! Fields this hook does not know about are carried through untouched, so the
//! returned event is the provider's own event with `response` filled in.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Pre-sign-up event as delivered by the identity provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreSignUpEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default)]
    pub request: PreSignUpRequest,
    #[serde(default)]
    pub response: PreSignUpResponse,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreSignUpRequest {
    #[serde(default)]
    pub user_attributes: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreSignUpResponse {
    #[serde(default)]
    pub auto_confirm_user: bool,
    #[serde(default)]
    pub auto_verify_email: bool,
    #[serde(default)]
    pub auto_verify_phone: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Confirm the account unconditionally.
pub fn decide(mut event: PreSignUpEvent) -> PreSignUpEvent {
    let attributes = &event.request.user_attributes;
    let has = |name: &str| attributes.get(name).is_some_and(|v| !v.is_empty());

    event.response.auto_confirm_user = true;
    event.response.auto_verify_email = has("email");
    event.response.auto_verify_phone = has("phone_number");

    tracing::debug!(
        trigger = event.trigger_source.as_deref().unwrap_or("-"),
        verify_email = event.response.auto_verify_email,
        verify_phone = event.response.auto_verify_phone,
        "account confirmed without challenge"
    );
    event
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(value: Value) -> PreSignUpEvent {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn confirms_and_verifies_email() {
        let out = decide(event(json!({
            "triggerSource": "PreSignUp_SignUp",
            "userName": "b1c2",
            "request": { "userAttributes": { "email": "a@example.com" } },
            "response": { "autoConfirmUser": false, "autoVerifyEmail": false, "autoVerifyPhone": false }
        })));
        assert!(out.response.auto_confirm_user);
        assert!(out.response.auto_verify_email);
        assert!(!out.response.auto_verify_phone);
    }

    #[test]
    fn confirms_even_without_attributes() {
        let out = decide(PreSignUpEvent::default());
        assert!(out.response.auto_confirm_user);
        assert!(!out.response.auto_verify_email);
    }

    #[test]
    fn phone_is_verified_when_present() {
        let out = decide(event(json!({
            "request": { "userAttributes": { "phone_number": "+15555550100" } }
        })));
        assert!(out.response.auto_verify_phone);
    }

    #[test]
    fn unknown_fields_survive() {
        let input = json!({
            "version": "1",
            "region": "eu-west-1",
            "userPoolId": "eu-west-1_abc",
            "callerContext": { "clientId": "app" },
            "triggerSource": "PreSignUp_SignUp",
            "userName": "b1c2",
            "request": { "userAttributes": { "email": "a@example.com" }, "validationData": null },
            "response": {}
        });
        let out = serde_json::to_value(decide(event(input))).unwrap();
        assert_eq!(out["version"], "1");
        assert_eq!(out["callerContext"]["clientId"], "app");
        assert_eq!(out["request"]["validationData"], Value::Null);
        assert_eq!(out["response"]["autoConfirmUser"], true);
        assert_eq!(out["response"]["autoVerifyEmail"], true);
    }
}
