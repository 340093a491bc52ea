//! Virtual-dispatch metadata normalization.
//!
//! [`DispatchNormalizer`] takes every method carrying a "make virtual" marker
//! and rewrites its dispatch-control bits so calls resolve dynamically,
//! in three ordered passes:
//!
//! 1. **Promotion** - each eligible candidate gets the virtual and new-slot
//!    bits set and joins the altered set. One priority rule precedes the
//!    eligibility checks: a method that is simultaneously sealed and virtual
//!    on a non-sealed type is unsealed instead, and still joins the altered
//!    set. The four runtime serialization callback hooks are never altered;
//!    the runtime invokes them by exact non-virtual contract.
//! 2. **Call-site upgrade** - [`CallSiteUpgrader`] rewrites direct calls
//!    across the altered set to virtual dispatch.
//! 3. **Demotion** - an altered method that hides (new-slot) a matching
//!    method declared on the immediate base type, where that base method is
//!    also in the altered set, becomes an override instead (new-slot
//!    cleared), so base-typed references dispatch to the most derived
//!    implementation.
//!
//! The altered set must be fully computed by promotion before demotion
//! inspects it: a derived method's demotion depends on its base counterpart
//! being present with updated bits. Candidate enumeration order is the
//! caller's and must be stable; [`crate::metadata::typesystem::TypeRegistry::methods_with_attribute`]
//! provides token order.

use crate::{
    metadata::{method::MethodRc, token::Token, typesystem::CilType},
    weave::{CallSiteUpgrader, WeaveContext, WeavePass},
    Result,
};

/// Full names of the four runtime serialization callback hook attributes.
///
/// Methods carrying any of these keep static dispatch.
pub const SERIALIZATION_HOOKS: [&str; 4] = [
    "System.Runtime.Serialization.OnSerializingAttribute",
    "System.Runtime.Serialization.OnSerializedAttribute",
    "System.Runtime.Serialization.OnDeserializingAttribute",
    "System.Runtime.Serialization.OnDeserializedAttribute",
];

/// Is `base_token` the immediate base type of `derived`?
///
/// Pure structural check over declaring-type identities; an unresolvable or
/// absent base reference is simply "no".
#[must_use]
pub fn is_immediate_base(base_token: Token, derived: &CilType) -> bool {
    derived.base().and_then(|b| b.token()) == Some(base_token)
}

/// The dispatch normalization pass.
pub struct DispatchNormalizer {
    marker: String,
}

impl DispatchNormalizer {
    /// Creates a normalizer seeded by methods carrying the given marker
    /// attribute.
    #[must_use]
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// Runs the three normalization passes over `candidates`, in the given
    /// order, and returns the altered-method set.
    ///
    /// # Errors
    ///
    /// Returns an error if the call-site upgrade hits a malformed body.
    /// Ineligible candidates are skipped silently; unresolvable base-type
    /// references yield no demotion match rather than an error.
    pub fn normalize(
        &self,
        candidates: &[MethodRc],
        ctx: &WeaveContext,
    ) -> Result<Vec<MethodRc>> {
        let altered = Self::promote(candidates);
        CallSiteUpgrader::new().upgrade_dispatch(&altered, ctx)?;
        Self::demote(&altered);
        Ok(altered)
    }

    /// Pass 1: eligibility and promotion, in enumeration order.
    fn promote(candidates: &[MethodRc]) -> Vec<MethodRc> {
        let mut altered = Vec::new();
        for method in candidates {
            let declaring_sealed = method
                .declaring_type()
                .map(|t| t.is_sealed())
                .unwrap_or(false);

            // priority rule, checked before the general skip list: a sealed
            // virtual method on an unsealed type is unsealed and kept
            if method.is_final() && method.is_virtual() && !declaring_sealed {
                method.set_final(false);
                altered.push(method.clone());
                continue;
            }

            if method.is_constructor()
                || method.is_final()
                || method.is_virtual()
                || method.is_static()
                || declaring_sealed
                || !method.is_public()
            {
                continue;
            }

            if Self::is_serialization_hook(method) {
                continue;
            }

            method.set_virtual(true);
            method.set_new_slot(true);
            altered.push(method.clone());
        }
        altered
    }

    /// Pass 3: hiding-to-overriding demotion within the altered set.
    fn demote(altered: &[MethodRc]) {
        for method in altered {
            if method.is_abstract() || !method.has_body() || !method.is_new_slot() {
                continue;
            }
            let Some(declaring) = method.declaring_type() else {
                continue;
            };

            let base_in_set = altered.iter().any(|candidate| {
                candidate.token != method.token
                    && candidate
                        .declaring_type()
                        .map(|t| is_immediate_base(t.token, &declaring))
                        .unwrap_or(false)
                    && candidate.name == method.name
                    && candidate.signature.matches(&method.signature)
            });

            if base_in_set {
                method.set_new_slot(false);
            }
        }
    }

    fn is_serialization_hook(method: &MethodRc) -> bool {
        SERIALIZATION_HOOKS
            .iter()
            .any(|hook| method.has_custom_attribute(hook))
    }
}

impl WeavePass for DispatchNormalizer {
    fn name(&self) -> &'static str {
        "dispatch-normalization"
    }

    fn run(&self, ctx: &WeaveContext) -> Result<()> {
        let candidates = ctx.registry.methods_with_attribute(&self.marker);
        self.normalize(&candidates, ctx).map(|_| ())
    }

    fn description(&self) -> &'static str {
        "Promotes marker-annotated methods to virtual dispatch and repairs the override chain"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::metadata::{
        method::{CilMethod, MethodSignature},
        token::{TABLE_METHOD_DEF, TABLE_TYPE_DEF},
        typesystem::{CilTypeRc, TypeSource},
    };

    fn test_type(row: u32, attributes: u32) -> CilTypeRc {
        Arc::new(CilType::new(
            Token::from_parts(TABLE_TYPE_DEF, row),
            "Test",
            format!("T{row}"),
            TypeSource::CurrentModule,
            attributes,
            Vec::new(),
        ))
    }

    fn attach(declaring: &CilTypeRc, row: u32, flags: u32, attrs: Vec<String>) -> MethodRc {
        let method = Arc::new(CilMethod::new(
            Token::from_parts(TABLE_METHOD_DEF, row),
            "M",
            MethodSignature::void(),
            flags,
            attrs,
        ));
        CilType::attach_method(declaring, method.clone()).unwrap();
        method
    }

    #[test]
    fn test_is_immediate_base() {
        let base = test_type(1, 0);
        let derived = test_type(2, 0);
        derived.set_base(&base).unwrap();

        assert!(is_immediate_base(base.token, &derived));
        assert!(!is_immediate_base(derived.token, &base));
        assert!(!is_immediate_base(
            Token::from_parts(TABLE_TYPE_DEF, 99),
            &derived
        ));
    }

    #[test]
    fn test_promote_sets_virtual_newslot() {
        let ty = test_type(1, 0);
        let method = attach(&ty, 1, 0x0006, Vec::new());

        let altered = DispatchNormalizer::promote(std::slice::from_ref(&method));
        assert_eq!(altered.len(), 1);
        assert!(method.is_virtual());
        assert!(method.is_new_slot());
    }

    #[test]
    fn test_priority_unseal_rule_precedes_skips() {
        let ty = test_type(1, 0);
        // sealed virtual on an unsealed type: would be skipped as "sealed" and
        // as "already virtual" if the priority rule did not come first
        let method = attach(&ty, 1, 0x0006 | 0x0020 | 0x0040, Vec::new());

        let altered = DispatchNormalizer::promote(std::slice::from_ref(&method));
        assert_eq!(altered.len(), 1);
        assert!(!method.is_final());
        assert!(method.is_virtual());
    }

    #[test]
    fn test_sealed_type_skips_even_sealed_virtual_methods() {
        let sealed_type = test_type(1, 0x0100);
        let method = attach(&sealed_type, 1, 0x0006 | 0x0020 | 0x0040, Vec::new());

        let altered = DispatchNormalizer::promote(std::slice::from_ref(&method));
        assert!(altered.is_empty());
        assert!(method.is_final());
    }

    #[test]
    fn test_ineligible_candidates_are_skipped() {
        let ty = test_type(1, 0);
        let static_method = attach(&ty, 1, 0x0006 | 0x0010, Vec::new());
        let private_method = attach(&ty, 2, 0x0001, Vec::new());

        let altered =
            DispatchNormalizer::promote(&[static_method.clone(), private_method.clone()]);
        assert!(altered.is_empty());
        assert!(!static_method.is_virtual());
        assert!(!private_method.is_virtual());
    }

    #[test]
    fn test_demote_requires_immediate_base_in_set() {
        let base = test_type(1, 0);
        let derived = test_type(2, 0);
        let unrelated = test_type(3, 0);
        derived.set_base(&base).unwrap();

        let m_base = attach(&base, 1, 0x0006, Vec::new());
        let m_derived = attach(&derived, 2, 0x0006, Vec::new());
        let m_unrelated = attach(&unrelated, 3, 0x0006, Vec::new());
        for method in [&m_base, &m_derived, &m_unrelated] {
            method
                .set_body(crate::assembly::BodyScaffold::for_signature(&MethodSignature::void()).build())
                .unwrap();
        }

        let altered =
            DispatchNormalizer::promote(&[m_base.clone(), m_derived.clone(), m_unrelated.clone()]);
        DispatchNormalizer::demote(&altered);

        // base defines the slot, derived overrides it
        assert!(m_base.is_new_slot());
        assert!(!m_derived.is_new_slot());
        // no base relation, no demotion
        assert!(m_unrelated.is_new_slot());
    }

    #[test]
    fn test_serialization_hooks_are_never_altered() {
        let ty = test_type(1, 0);
        for (i, hook) in SERIALIZATION_HOOKS.iter().enumerate() {
            let method = attach(&ty, 10 + i as u32, 0x0006, vec![(*hook).to_string()]);
            let before = method.flags_raw();

            let altered = DispatchNormalizer::promote(std::slice::from_ref(&method));
            assert!(altered.is_empty());
            assert_eq!(method.flags_raw(), before);
        }
    }
}
