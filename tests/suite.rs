// Centralized integration suite for the composite binding core; exercises
// manifest loading, the build pass's aggregated validation, and dispatcher
// fan-out so contract changes surface in one place.
mod support;

use anyhow::Result;
use serde_json::{Value, json};
use std::sync::Arc;
use support::{RecordingDelegate, call_log, delegate_table, manifest, write_manifest};
use tandem::{
    BuildError, CREATION_ERROR_HEADER, CapabilityId, CapabilityInterface, ClassCatalog,
    CompositeDeclaration, DiscoveryError, DispatchError, Dispatcher, ImplementationDescriptor,
    ManifestCatalog, MethodId, RegistryBuilder, Tier,
};

fn notification_capability() -> Value {
    json!([{
        "id": "notification_service",
        "description": "sends notifications through interchangeable gateways",
        "methods": [
            {"id": "send_sms", "propagate": "primary"},
            {"id": "send_push", "propagate": "secondary"},
            {"id": "broadcast", "propagate": "both"},
            {"id": "describe"}
        ]
    }])
}

fn load(manifest_value: &Value) -> Result<ManifestCatalog> {
    let file = write_manifest(manifest_value)?;
    ManifestCatalog::load(file.path())
}

fn creation_lines(err: BuildError) -> Vec<String> {
    let BuildError::Creation(creation) = err else {
        panic!("expected aggregated creation error, got {err:?}");
    };
    creation.message().lines().map(str::to_string).collect()
}

// The concrete scenario from the contract: one primary implementation of
// NotificationService, no secondary, and no secondary-requiring methods.
#[test]
fn single_primary_activates_cleanly() -> Result<()> {
    let catalog = load(&manifest(
        json!([{
            "id": "notification_service",
            "methods": [{"id": "send_sms", "propagate": "primary"}]
        }]),
        json!([{"id": "notification_composite", "capability": "notification_service"}]),
        json!([{"id": "sms_gateway", "tier": "primary", "implements": ["notification_service"]}]),
    ))?;

    let registry = RegistryBuilder::new().build(&catalog)?;
    let capability = CapabilityId("notification_service".to_string());
    let group = registry.group(&capability).expect("group committed");
    assert_eq!(group.tier_bindings(Tier::Primary).len(), 1);
    assert_eq!(group.tier_bindings(Tier::Secondary).len(), 0);
    assert_eq!(registry.capabilities().count(), 1);
    Ok(())
}

#[test]
fn zero_bindings_fail_with_exactly_one_line() -> Result<()> {
    let catalog = load(&manifest(
        notification_capability(),
        json!([{"id": "notification_composite", "capability": "notification_service"}]),
        json!([]),
    ))?;

    let lines = creation_lines(RegistryBuilder::new().build(&catalog).unwrap_err());
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], CREATION_ERROR_HEADER);
    assert_eq!(
        lines[1],
        "No implementations found for notification_composite"
    );
    Ok(())
}

#[test]
fn missing_secondaries_name_exactly_the_requiring_methods() -> Result<()> {
    let catalog = load(&manifest(
        notification_capability(),
        json!([{"id": "notification_composite", "capability": "notification_service"}]),
        json!([{"id": "sms_gateway", "tier": "primary", "implements": ["notification_service"]}]),
    ))?;

    let lines = creation_lines(RegistryBuilder::new().build(&catalog).unwrap_err());
    assert_eq!(lines.len(), 2);
    // send_push requires secondary, broadcast routes to both tiers; send_sms
    // and the undeclared describe method must not appear.
    assert!(lines[1].contains("notification_composite"));
    assert!(lines[1].contains("[send_push, broadcast]"), "{}", lines[1]);
    assert!(!lines[1].contains("send_sms"));
    assert!(!lines[1].contains("describe"));
    Ok(())
}

// Validates the else-if precedence: zero bindings in both tiers never
// reports method-level detail, even when requiring methods exist.
#[test]
fn empty_tiers_suppress_method_detail() -> Result<()> {
    let catalog = load(&manifest(
        notification_capability(),
        json!([{"id": "notification_composite", "capability": "notification_service"}]),
        json!([]),
    ))?;

    let lines = creation_lines(RegistryBuilder::new().build(&catalog).unwrap_err());
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("No implementations found"));
    assert!(!lines[1].contains("send_push"));
    Ok(())
}

// One misconfigured composite must not mask or block its siblings.
#[test]
fn only_the_misconfigured_composite_reports() -> Result<()> {
    let catalog = load(&manifest(
        json!([
            {"id": "cap_a", "methods": [{"id": "run", "propagate": "primary"}]},
            {"id": "cap_b", "methods": [{"id": "run", "propagate": "primary"}]},
            {"id": "cap_c", "methods": [{"id": "run", "propagate": "primary"}]}
        ]),
        json!([
            {"id": "composite_a", "capability": "cap_a"},
            {"id": "composite_b", "capability": "cap_b"},
            {"id": "composite_c", "capability": "cap_c"}
        ]),
        json!([
            {"id": "impl_a", "tier": "primary", "implements": ["cap_a"]},
            {"id": "impl_c", "tier": "primary", "implements": ["cap_c"]}
        ]),
    ))?;

    let lines = creation_lines(RegistryBuilder::new().build(&catalog).unwrap_err());
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1], "No implementations found for composite_b");
    Ok(())
}

// A catalog that cannot enumerate at all; every query fails.
struct UnenumerableCatalog;

impl ClassCatalog for UnenumerableCatalog {
    fn composites(&self) -> Result<Vec<CompositeDeclaration>, DiscoveryError> {
        Err(DiscoveryError::new("catalog backend unreachable"))
    }

    fn implementations(
        &self,
        _tier: Tier,
    ) -> Result<Vec<ImplementationDescriptor>, DiscoveryError> {
        Err(DiscoveryError::new("catalog backend unreachable"))
    }

    fn interface(
        &self,
        _id: &CapabilityId,
    ) -> Result<Option<CapabilityInterface>, DiscoveryError> {
        Err(DiscoveryError::new("catalog backend unreachable"))
    }
}

// Enumeration failure is fatal on its own; it must surface as a discovery
// error, never folded into an aggregated creation error.
#[test]
fn enumeration_failure_aborts_as_discovery_error() {
    let err = RegistryBuilder::new()
        .build(&UnenumerableCatalog)
        .unwrap_err();
    assert!(matches!(err, BuildError::Discovery(_)), "{err:?}");
    assert!(err.to_string().contains("catalog backend unreachable"));
}

#[test]
fn autodiscover_false_contributes_nothing() -> Result<()> {
    let catalog = load(&manifest(
        notification_capability(),
        json!([{
            "id": "notification_composite",
            "capability": "notification_service",
            "autodiscover": false
        }]),
        json!([]),
    ))?;

    // Zero implementations would fail validation if the composite were
    // processed; skipping must make the pass succeed with an empty registry.
    let registry = RegistryBuilder::new().build(&catalog)?;
    assert!(registry.is_empty());
    Ok(())
}

#[test]
fn rebuild_over_unchanged_catalog_is_identical() -> Result<()> {
    let catalog = load(&manifest(
        json!([{"id": "cap", "methods": [{"id": "run", "propagate": "primary"}]}]),
        json!([{"id": "composite", "capability": "cap"}]),
        json!([
            {"id": "impl_one", "tier": "primary", "implements": ["cap"]},
            {"id": "impl_two", "tier": "secondary", "implements": ["cap"]}
        ]),
    ))?;

    let first = RegistryBuilder::new().build(&catalog)?;
    let second = RegistryBuilder::new().build(&catalog)?;
    let capability = CapabilityId("cap".to_string());
    let group_first = first.group(&capability).expect("group committed");
    let group_second = second.group(&capability).expect("group committed");
    assert_eq!(group_first.primary(), group_second.primary());
    assert_eq!(group_first.secondary(), group_second.secondary());
    Ok(())
}

#[test]
fn validation_disabled_commits_despite_missing_tier() -> Result<()> {
    let catalog = load(&manifest(
        notification_capability(),
        json!([{"id": "notification_composite", "capability": "notification_service"}]),
        json!([{"id": "sms_gateway", "tier": "primary", "implements": ["notification_service"]}]),
    ))?;

    let registry = RegistryBuilder::new().validating(false).build(&catalog)?;
    let capability = CapabilityId("notification_service".to_string());
    let group = registry.group(&capability).expect("group committed");
    assert_eq!(group.primary().len(), 1);
    Ok(())
}

// === manifest loading ===

#[test]
fn manifest_rejects_unexpected_schema_version() -> Result<()> {
    let mut bad = manifest(json!([]), json!([]), json!([]));
    bad["schema_version"] = json!("composite_manifest_v2");
    assert!(load(&bad).is_err());
    Ok(())
}

#[test]
fn manifest_rejects_duplicate_capability_ids() -> Result<()> {
    let bad = manifest(
        json!([{"id": "cap"}, {"id": "cap"}]),
        json!([]),
        json!([]),
    );
    assert!(load(&bad).is_err());
    Ok(())
}

#[test]
fn manifest_rejects_composite_with_unknown_capability() -> Result<()> {
    let bad = manifest(
        json!([{"id": "cap"}]),
        json!([{"id": "composite", "capability": "missing"}]),
        json!([]),
    );
    assert!(load(&bad).is_err());
    Ok(())
}

#[test]
fn malformed_implementation_entries_do_not_block_siblings() -> Result<()> {
    let catalog = load(&manifest(
        json!([{"id": "cap", "methods": [{"id": "run", "propagate": "primary"}]}]),
        json!([{"id": "composite", "capability": "cap"}]),
        json!([
            {"id": "broken_entry"},
            {"id": "good_entry", "tier": "primary", "implements": ["cap"]}
        ]),
    ))?;

    let registry = RegistryBuilder::new().build(&catalog)?;
    let group = registry
        .group(&CapabilityId("cap".to_string()))
        .expect("group committed");
    assert_eq!(group.primary().len(), 1);
    assert_eq!(group.primary()[0].0, "good_entry");
    Ok(())
}

// === dispatcher fan-out ===

fn dispatch_fixture() -> Result<(ManifestCatalog, CapabilityId)> {
    let catalog = load(&manifest(
        notification_capability(),
        json!([{"id": "notification_composite", "capability": "notification_service"}]),
        json!([
            {"id": "sms_gateway", "tier": "primary", "implements": ["notification_service"]},
            {"id": "voice_gateway", "tier": "primary", "implements": ["notification_service"]},
            {"id": "push_gateway", "tier": "secondary", "implements": ["notification_service"]}
        ]),
    ))?;
    Ok((catalog, CapabilityId("notification_service".to_string())))
}

#[test]
fn dispatch_fans_out_in_registration_order() -> Result<()> {
    let (catalog, capability) = dispatch_fixture()?;
    let registry = Arc::new(RegistryBuilder::new().build(&catalog)?);

    let log = call_log();
    let dispatcher = Dispatcher::bind(
        registry,
        delegate_table(vec![
            ("sms_gateway", RecordingDelegate::new("sms_gateway", &log)),
            (
                "voice_gateway",
                RecordingDelegate::new("voice_gateway", &log),
            ),
            ("push_gateway", RecordingDelegate::new("push_gateway", &log)),
        ]),
    )?;

    // `broadcast` routes to both tiers: the full primary tier first, then
    // the secondary tier, each in registration order.
    let results = dispatcher.dispatch(
        &capability,
        &MethodId("broadcast".to_string()),
        &json!({"text": "hello"}),
    )?;
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["handled_by"], "sms_gateway");
    assert_eq!(results[2]["handled_by"], "push_gateway");
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "sms_gateway::broadcast",
            "voice_gateway::broadcast",
            "push_gateway::broadcast"
        ]
    );

    log.lock().unwrap().clear();
    let secondary_only = dispatcher.dispatch(
        &capability,
        &MethodId("send_push".to_string()),
        &json!({}),
    )?;
    assert_eq!(secondary_only.len(), 1);
    assert_eq!(*log.lock().unwrap(), vec!["push_gateway::send_push"]);
    Ok(())
}

#[test]
fn dispatch_aborts_on_first_delegate_failure() -> Result<()> {
    let (catalog, capability) = dispatch_fixture()?;
    let registry = Arc::new(RegistryBuilder::new().build(&catalog)?);

    let log = call_log();
    let dispatcher = Dispatcher::bind(
        registry,
        delegate_table(vec![
            ("sms_gateway", RecordingDelegate::new("sms_gateway", &log)),
            (
                "voice_gateway",
                RecordingDelegate::failing("voice_gateway", &log),
            ),
            ("push_gateway", RecordingDelegate::new("push_gateway", &log)),
        ]),
    )?;

    let err = dispatcher
        .dispatch(&capability, &MethodId("broadcast".to_string()), &json!({}))
        .unwrap_err();
    let DispatchError::Delegate { implementation, .. } = err else {
        panic!("expected delegate failure, got {err:?}");
    };
    assert_eq!(implementation.0, "voice_gateway");
    // The failing delegate was reached but nothing after it ran.
    assert_eq!(
        *log.lock().unwrap(),
        vec!["sms_gateway::broadcast", "voice_gateway::broadcast"]
    );
    Ok(())
}

#[test]
fn dispatch_rejects_undeclared_and_unrouted_methods() -> Result<()> {
    let (catalog, capability) = dispatch_fixture()?;
    let registry = Arc::new(RegistryBuilder::new().build(&catalog)?);
    let log = call_log();
    let dispatcher = Dispatcher::bind(
        registry,
        delegate_table(vec![
            ("sms_gateway", RecordingDelegate::new("sms_gateway", &log)),
            (
                "voice_gateway",
                RecordingDelegate::new("voice_gateway", &log),
            ),
            ("push_gateway", RecordingDelegate::new("push_gateway", &log)),
        ]),
    )?;

    let unknown = dispatcher
        .dispatch(&capability, &MethodId("missing".to_string()), &json!({}))
        .unwrap_err();
    assert!(matches!(unknown, DispatchError::UnknownMethod { .. }));

    // `describe` is declared but carries no propagation declaration.
    let unrouted = dispatcher
        .dispatch(&capability, &MethodId("describe".to_string()), &json!({}))
        .unwrap_err();
    assert!(matches!(unrouted, DispatchError::Unrouted { .. }));

    let unknown_capability = dispatcher
        .dispatch(
            &CapabilityId("billing_service".to_string()),
            &MethodId("broadcast".to_string()),
            &json!({}),
        )
        .unwrap_err();
    assert!(matches!(
        unknown_capability,
        DispatchError::UnknownCapability(_)
    ));

    assert!(log.lock().unwrap().is_empty());
    Ok(())
}

#[test]
fn bind_requires_an_instance_for_every_bound_implementation() -> Result<()> {
    let (catalog, _) = dispatch_fixture()?;
    let registry = Arc::new(RegistryBuilder::new().build(&catalog)?);

    let log = call_log();
    let err = Dispatcher::bind(
        registry,
        delegate_table(vec![(
            "sms_gateway",
            RecordingDelegate::new("sms_gateway", &log),
        )]),
    )
    .unwrap_err();
    assert!(matches!(err, DispatchError::MissingDelegate(_)));
    Ok(())
}
