//! Route-access policy: which paths are public, where each role lands, and
//! which paths each role may visit.
//!
//! A `RoutePolicy` is immutable once built and is injected into the guard.
//! It is validated on construction so the guard never has to handle a
//! missing landing path or a redirect target it would itself reject.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Role, RoutePattern};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("role {0} has no landing path")]
    MissingLanding(Role),

    #[error("landing path '{path}' is not allowed for role {role}")]
    LandingNotAllowed { role: Role, path: String },

    #[error("login path '{0}' must be public")]
    LoginNotPublic(String),

    #[error("forbidden path '{path}' is not reachable for role {role}")]
    ForbiddenNotReachable { role: Role, path: String },

    #[error("invalid policy document: {0}")]
    Document(String),
}

/// Serialized shape of a policy (JSON configuration file).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PolicyDocument {
    login_path: String,
    forbidden_path: String,
    #[serde(default = "default_root")]
    root_path: String,
    public: Vec<RoutePattern>,
    landing: BTreeMap<Role, String>,
    #[serde(default)]
    allow: BTreeMap<Role, Vec<RoutePattern>>,
}

fn default_root() -> String {
    "/".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePolicy {
    login_path: String,
    forbidden_path: String,
    root_path: String,
    public: Vec<RoutePattern>,
    landing: BTreeMap<Role, String>,
    allow: BTreeMap<Role, Vec<RoutePattern>>,
}

impl RoutePolicy {
    pub fn builder() -> RoutePolicyBuilder {
        RoutePolicyBuilder::default()
    }

    /// The CampEase route tables.
    pub fn campease() -> Self {
        const SHARED: &[&str] = &["/profile", "/notifications", "/403"];

        let mut builder = Self::builder()
            .login_path("/Login")
            .forbidden_path("/403")
            .public(["/", "/Login", "/Register", "/VerifyEmail", "/VerifyOtp", "/ResetPassword"])
            .landing(Role::Admin, "/admin/dashboard")
            .landing(Role::Staff, "/staff/dashboard")
            .landing(Role::Parent, "/parent/dashboard")
            .landing(Role::Camper, "/camper/dashboard")
            .allow(
                Role::Admin,
                [
                    "/admin/dashboard",
                    "/admin/camps",
                    "/admin/camps/create",
                    "/admin/camps/:campId",
                    "/admin/camps/:campId/edit",
                    "/admin/blogs",
                    "/admin/blogs/create",
                    "/admin/blogs/:blogId",
                    "/admin/blogs/:blogId/edit",
                    "/admin/vehicles",
                    "/admin/vehicles/create",
                    "/admin/vehicles/:vehicleId",
                    "/admin/vehicles/:vehicleId/edit",
                    "/admin/users",
                    "/admin/users/:userId",
                    "/admin/orders",
                    "/admin/orders/:orderId",
                ],
            )
            .allow(
                Role::Staff,
                [
                    "/staff/dashboard",
                    "/staff/orders",
                    "/staff/orders/:orderId",
                    "/staff/camps",
                    "/staff/camps/:campId",
                    "/staff/vehicles",
                    "/staff/vehicles/:vehicleId",
                    "/staff/campers",
                ],
            )
            .allow(
                Role::Parent,
                [
                    "/parent/dashboard",
                    "/parent/orders",
                    "/parent/orders/:orderId",
                    "/parent/campers",
                    "/parent/campers/:camperId",
                    "/camps",
                    "/camps/:campId",
                    "/camps/:campId/book",
                    "/camps/:campId/model",
                    "/blogs",
                    "/blogs/:blogId",
                    "/checkout",
                ],
            )
            .allow(
                Role::Camper,
                [
                    "/camper/dashboard",
                    "/camper/schedule",
                    "/camps",
                    "/camps/:campId",
                    "/camps/:campId/model",
                    "/blogs",
                    "/blogs/:blogId",
                ],
            );

        for role in Role::ALL {
            builder = builder.allow(role, SHARED.iter().copied());
        }

        match builder.build() {
            Ok(policy) => policy,
            // The tables above are constant and covered by tests.
            Err(err) => unreachable!("built-in CampEase policy is invalid: {err}"),
        }
    }

    /// Load a policy from its JSON document form.
    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        let doc: PolicyDocument =
            serde_json::from_str(json).map_err(|e| PolicyError::Document(e.to_string()))?;
        Self::from_document(doc)
    }

    pub fn to_json(&self) -> Result<String, PolicyError> {
        let doc = PolicyDocument {
            login_path: self.login_path.clone(),
            forbidden_path: self.forbidden_path.clone(),
            root_path: self.root_path.clone(),
            public: self.public.clone(),
            landing: self.landing.clone(),
            allow: self.allow.clone(),
        };
        serde_json::to_string_pretty(&doc).map_err(|e| PolicyError::Document(e.to_string()))
    }

    fn from_document(doc: PolicyDocument) -> Result<Self, PolicyError> {
        let policy = Self {
            login_path: doc.login_path,
            forbidden_path: doc.forbidden_path,
            root_path: doc.root_path,
            public: doc.public,
            landing: doc.landing,
            allow: doc.allow,
        };
        policy.validate()?;
        Ok(policy)
    }

    fn validate(&self) -> Result<(), PolicyError> {
        if !self.is_public(&self.login_path) {
            return Err(PolicyError::LoginNotPublic(self.login_path.clone()));
        }

        for role in Role::ALL {
            let landing = self.landing.get(&role).ok_or(PolicyError::MissingLanding(role))?;
            if !self.is_allowed(role, landing) {
                return Err(PolicyError::LandingNotAllowed {
                    role,
                    path: landing.clone(),
                });
            }
            if !self.is_allowed(role, &self.forbidden_path) {
                return Err(PolicyError::ForbiddenNotReachable {
                    role,
                    path: self.forbidden_path.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn forbidden_path(&self) -> &str {
        &self.forbidden_path
    }

    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    pub fn public_patterns(&self) -> &[RoutePattern] {
        &self.public
    }

    pub fn landing_for(&self, role: Role) -> &str {
        // Every role has a landing path; `validate` refuses policies without one.
        self.landing.get(&role).map_or(self.root_path.as_str(), String::as_str)
    }

    pub fn allow_list(&self, role: Role) -> &[RoutePattern] {
        self.allow.get(&role).map_or(&[], Vec::as_slice)
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.public.iter().any(|p| p.matches(path))
    }

    /// Public paths are open to every role.
    pub fn is_allowed(&self, role: Role, path: &str) -> bool {
        self.is_public(path) || self.allow_list(role).iter().any(|p| p.matches(path))
    }

    /// The pattern that grants `role` access to `path`, if any.
    pub fn matching_pattern(&self, role: Option<Role>, path: &str) -> Option<&RoutePattern> {
        let allowed = role.map_or(&[][..], |r| self.allow_list(r));
        self.public.iter().chain(allowed).find(|p| p.matches(path))
    }
}

#[derive(Debug, Default)]
pub struct RoutePolicyBuilder {
    login_path: Option<String>,
    forbidden_path: Option<String>,
    root_path: Option<String>,
    public: Vec<String>,
    landing: BTreeMap<Role, String>,
    allow: BTreeMap<Role, Vec<String>>,
}

impl RoutePolicyBuilder {
    pub fn login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = Some(path.into());
        self
    }

    pub fn forbidden_path(mut self, path: impl Into<String>) -> Self {
        self.forbidden_path = Some(path.into());
        self
    }

    pub fn root_path(mut self, path: impl Into<String>) -> Self {
        self.root_path = Some(path.into());
        self
    }

    pub fn public<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.public.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn landing(mut self, role: Role, path: impl Into<String>) -> Self {
        self.landing.insert(role, path.into());
        self
    }

    pub fn allow<I, S>(mut self, role: Role, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow
            .entry(role)
            .or_default()
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> Result<RoutePolicy, PolicyError> {
        let parse_all = |raw: Vec<String>| -> Result<Vec<RoutePattern>, PolicyError> {
            raw.iter().map(|r| RoutePattern::parse(r)).collect()
        };

        let allow = self
            .allow
            .into_iter()
            .map(|(role, raw)| Ok((role, parse_all(raw)?)))
            .collect::<Result<BTreeMap<_, _>, PolicyError>>()?;

        RoutePolicy::from_document(PolicyDocument {
            login_path: self.login_path.unwrap_or_else(|| "/Login".to_string()),
            forbidden_path: self.forbidden_path.unwrap_or_else(|| "/403".to_string()),
            root_path: self.root_path.unwrap_or_else(default_root),
            public: parse_all(self.public)?,
            landing: self.landing,
            allow,
        })
    }
}
