//! Mask policy resolution from caller identity.

use crate::types::{DocType, UserIdentity};
use ragdesk_core::config::{MaskingConfig, RoleRuleConfig};
use ragdesk_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

pub const PERMISSION_COST: &str = "cost:view";
pub const PERMISSION_PROFIT: &str = "profit:view";
pub const PERMISSION_RATES: &str = "rates:view";
const DOCS_PERMISSION_PREFIX: &str = "docs:";
const ALL_DOC_TYPES: &str = "*";

/// Visibility and redaction rules for one request.
///
/// `allowed_doc_types` is always explicit: an empty set grants no document
/// types at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskPolicy {
    pub mask_cost_data: bool,
    pub mask_profit_data: bool,
    pub mask_contractor_rates: bool,
    pub allowed_doc_types: BTreeSet<DocType>,
}

impl MaskPolicy {
    /// Nothing masked, every document type visible.
    pub fn unrestricted() -> Self {
        Self {
            mask_cost_data: false,
            mask_profit_data: false,
            mask_contractor_rates: false,
            allowed_doc_types: DocType::all(),
        }
    }

    pub fn allows(&self, doc_type: DocType) -> bool {
        self.allowed_doc_types.contains(&doc_type)
    }

    pub fn masks_anything(&self) -> bool {
        self.mask_cost_data || self.mask_profit_data || self.mask_contractor_rates
    }
}

/// Baseline rule for a role before permissions are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRule {
    pub mask_cost_data: bool,
    pub mask_profit_data: bool,
    pub mask_contractor_rates: bool,
    pub allowed_doc_types: BTreeSet<DocType>,
}

impl RoleRule {
    fn new(cost: bool, profit: bool, rates: bool, allowed: &[DocType]) -> Self {
        Self {
            mask_cost_data: cost,
            mask_profit_data: profit,
            mask_contractor_rates: rates,
            allowed_doc_types: allowed.iter().copied().collect(),
        }
    }

    fn from_config(role: &str, config: &RoleRuleConfig) -> AppResult<Self> {
        let mut allowed = BTreeSet::new();
        for name in &config.allowed_doc_types {
            if name == ALL_DOC_TYPES {
                allowed.extend(DocType::ALL);
            } else {
                let doc_type = name.parse::<DocType>().map_err(|_| {
                    AppError::Config(format!(
                        "Unknown document type '{}' in masking rule for role '{}'",
                        name, role
                    ))
                })?;
                allowed.insert(doc_type);
            }
        }

        Ok(Self {
            mask_cost_data: config.mask_cost_data,
            mask_profit_data: config.mask_profit_data,
            mask_contractor_rates: config.mask_contractor_rates,
            allowed_doc_types: allowed,
        })
    }
}

/// Resolves a [`MaskPolicy`] for each request from a role table.
///
/// Policies are computed on every call; nothing is cached between requests.
#[derive(Debug, Clone)]
pub struct MaskPolicyResolver {
    roles: HashMap<String, RoleRule>,
    fallback: RoleRule,
}

impl Default for MaskPolicyResolver {
    fn default() -> Self {
        use DocType::*;

        let mut roles = HashMap::new();
        let all = DocType::ALL;
        roles.insert("executive".to_string(), RoleRule::new(false, false, false, &all));
        roles.insert("manager".to_string(), RoleRule::new(false, false, false, &all));
        roles.insert("accounting".to_string(), RoleRule::new(false, false, true, &all));
        roles.insert(
            "site_manager".to_string(),
            RoleRule::new(
                false,
                true,
                false,
                &[EstimatePdf, ContractPdf, InventoryCsv, ManualMd, CostPdf],
            ),
        );
        roles.insert(
            "sales".to_string(),
            RoleRule::new(true, true, true, &[EstimatePdf, ContractPdf, ManualMd]),
        );
        roles.insert(
            "staff".to_string(),
            RoleRule::new(true, true, true, &[EstimatePdf, ManualMd]),
        );

        Self {
            roles,
            fallback: RoleRule::new(true, true, true, &[ManualMd]),
        }
    }
}

impl MaskPolicyResolver {
    /// Built-in role table with configured roles replacing or extending it.
    pub fn from_config(config: &MaskingConfig) -> AppResult<Self> {
        let mut resolver = Self::default();
        for (role, rule) in &config.roles {
            let role = role.to_lowercase();
            tracing::debug!(role = %role, "Overriding masking rule from configuration");
            let rule = RoleRule::from_config(&role, rule)?;
            resolver.roles.insert(role, rule);
        }
        Ok(resolver)
    }

    /// Rule for a role name (case-insensitive); unknown roles get the most
    /// restrictive rule.
    pub fn rule_for(&self, role: &str) -> &RoleRule {
        self.roles
            .get(&role.to_lowercase())
            .unwrap_or(&self.fallback)
    }

    pub fn resolve(&self, identity: &UserIdentity) -> MaskPolicy {
        if identity.is_admin {
            return MaskPolicy::unrestricted();
        }

        let rule = self.rule_for(&identity.role);
        let mut policy = MaskPolicy {
            mask_cost_data: rule.mask_cost_data,
            mask_profit_data: rule.mask_profit_data,
            mask_contractor_rates: rule.mask_contractor_rates,
            allowed_doc_types: rule.allowed_doc_types.clone(),
        };

        for permission in &identity.permissions {
            match permission.as_str() {
                PERMISSION_COST => policy.mask_cost_data = false,
                PERMISSION_PROFIT => policy.mask_profit_data = false,
                PERMISSION_RATES => policy.mask_contractor_rates = false,
                other => {
                    let Some(doc) = other.strip_prefix(DOCS_PERMISSION_PREFIX) else {
                        continue;
                    };
                    if doc == ALL_DOC_TYPES {
                        policy.allowed_doc_types.extend(DocType::ALL);
                    } else if let Ok(doc_type) = doc.parse::<DocType>() {
                        policy.allowed_doc_types.insert(doc_type);
                    } else {
                        tracing::debug!(permission = %other, "Ignoring unknown document permission");
                    }
                }
            }
        }

        policy
    }
}
