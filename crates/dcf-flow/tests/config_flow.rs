//! Config flow behavior

mod common;

use common::*;
use dcf_flow::{
    ConfigFlow, FieldKind, FlowError, FlowResult, ABORT_ALREADY_CONFIGURED,
    CONF_DISABLED_DOMAINS, CONF_EXTRA_DOMAINS, ENTRY_TITLE, ERROR_INVALID_FORMAT,
    FMT_FAILED_DOMAINS,
};
use serde_json::json;
use std::collections::BTreeSet;

fn flow(dependencies: &[&str]) -> ConfigFlow {
    ConfigFlow::new(MockManifestSource::new(dependencies), FixedLookup::empty())
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_base_dependencies_drop_config() {
    let mut flow = flow(&["http", "person", "config"]);
    assert_eq!(flow.base_dependencies().await.unwrap(), set(&["http", "person"]));
}

#[tokio::test]
async fn test_base_dependencies_are_cached() {
    let manifests = MockManifestSource::sequence(vec![
        manifest(&["http", "config"]),
        manifest(&["http", "person", "zeroconf"]),
    ]);
    let mut flow = ConfigFlow::new(manifests.clone(), FixedLookup::empty());

    let first = flow.base_dependencies().await.unwrap();
    let second = flow.base_dependencies().await.unwrap();

    assert_eq!(first, set(&["http"]));
    assert_eq!(first, second);
    assert_eq!(manifests.reads(), 1);
}

#[tokio::test]
async fn test_manifest_failure_propagates_and_is_not_cached() {
    let manifests = MockManifestSource::failing();
    let mut flow = ConfigFlow::new(manifests.clone(), FixedLookup::empty());

    assert!(matches!(
        flow.step_user(None).await,
        Err(FlowError::Manifest(_))
    ));
    assert!(flow.base_dependencies().await.is_err());
    assert_eq!(manifests.reads(), 2);
}

#[tokio::test]
async fn test_currently_disabled_is_empty() {
    let flow = flow(&["http"]);
    assert!(flow.currently_disabled_domains().is_empty());
}

#[tokio::test]
async fn test_user_step_shows_form() {
    let mut flow = flow(&["person", "http", "config"]);

    let result = flow.step_user(None).await.unwrap();
    let form = result.as_form().unwrap();

    assert_eq!(form.step_id, "user");
    assert!(form.errors.is_empty());

    let domains = form.field(CONF_DISABLED_DOMAINS).unwrap();
    assert_eq!(domains.options().unwrap(), ["http", "person"]);
    assert_eq!(domains.default, Some(json!([])));

    let extra = form.field(CONF_EXTRA_DOMAINS).unwrap();
    assert_eq!(extra.kind, FieldKind::String);
    assert_eq!(extra.default, Some(json!("")));

    assert_eq!(flow.unique_id(), Some("default_config_filter"));
}

#[tokio::test]
async fn test_empty_input_shows_form() {
    let mut flow = flow(&["http"]);
    let result = flow.step_user(Some(json!({}))).await.unwrap();
    assert!(result.as_form().is_some());
}

#[tokio::test]
async fn test_selection_and_extra_domains_create_entry() {
    let mut flow = flow(&["http", "person", "config"]);
    flow.step_user(None).await.unwrap();

    let result = flow
        .step_user(Some(json!({
            "disabled_domains": ["http"],
            "extra_domains": "foo, bar",
        })))
        .await
        .unwrap();

    let created = result.as_created().unwrap();
    assert_eq!(created.title, ENTRY_TITLE);
    assert!(created.data.is_empty());
    assert_eq!(
        json!(created.options),
        json!({"http": true, "foo": true, "bar": true})
    );
}

#[tokio::test]
async fn test_selection_only_creates_entry() {
    let mut flow = flow(&["http", "person"]);

    let result = flow
        .step_user(Some(json!({"disabled_domains": ["person"], "extra_domains": ""})))
        .await
        .unwrap();

    assert_eq!(json!(result.as_created().unwrap().options), json!({"person": true}));
}

#[tokio::test]
async fn test_nothing_selected_creates_empty_options() {
    let mut flow = flow(&["http"]);

    let result = flow
        .step_user(Some(json!({"disabled_domains": []})))
        .await
        .unwrap();

    assert!(result.as_created().unwrap().options.is_empty());
}

#[tokio::test]
async fn test_invalid_extra_domain_rejects_everything() {
    let mut flow = flow(&["http", "person", "config"]);

    let result = flow
        .step_user(Some(json!({
            "disabled_domains": ["http"],
            "extra_domains": "foo,!!bad",
        })))
        .await
        .unwrap();

    let form = result.as_form().unwrap();
    assert_eq!(
        form.errors.get(CONF_EXTRA_DOMAINS).map(String::as_str),
        Some(ERROR_INVALID_FORMAT)
    );
    assert_eq!(
        form.description_placeholders
            .get(FMT_FAILED_DOMAINS)
            .map(String::as_str),
        Some("!!bad")
    );

    // Input survives the round trip
    let domains = form.field(CONF_DISABLED_DOMAINS).unwrap();
    assert_eq!(domains.default, Some(json!(["http"])));
    let extra = form.field(CONF_EXTRA_DOMAINS).unwrap();
    assert_eq!(extra.default, Some(json!("foo,!!bad")));
}

#[tokio::test]
async fn test_selected_unknown_domain_stays_selectable_after_error() {
    let mut flow = flow(&["http"]);

    let result = flow
        .step_user(Some(json!({
            "disabled_domains": ["custom_thing"],
            "extra_domains": "a b",
        })))
        .await
        .unwrap();

    let domains = result.as_form().unwrap().field(CONF_DISABLED_DOMAINS).unwrap();
    assert_eq!(domains.options().unwrap(), ["custom_thing", "http"]);
}

#[tokio::test]
async fn test_correcting_after_error_creates_entry() {
    let mut flow = flow(&["http", "person"]);

    let first = flow
        .step_user(Some(json!({"disabled_domains": ["http"], "extra_domains": "foo,"})))
        .await
        .unwrap();
    assert!(first.as_form().is_some());

    let second = flow
        .step_user(Some(json!({"disabled_domains": ["http"], "extra_domains": "foo"})))
        .await
        .unwrap();
    assert_eq!(
        json!(second.as_created().unwrap().options),
        json!({"http": true, "foo": true})
    );
}

#[tokio::test]
async fn test_already_configured_aborts_user_step() {
    let mut flow = ConfigFlow::new(MockManifestSource::new(&["http"]), FixedLookup::configured());

    let result = flow.step_user(None).await.unwrap();
    assert_eq!(result.abort_reason(), Some(ABORT_ALREADY_CONFIGURED));
}

#[tokio::test]
async fn test_import_stores_raw_mapping() {
    let mut flow = flow(&["http"]);

    let input = json!({"zeroconf": true, "ssdp": false, "not-a-domain": true});
    let result = flow
        .step_import(input.as_object().cloned().unwrap())
        .await
        .unwrap();

    let created = result.as_created().unwrap();
    assert_eq!(created.title, ENTRY_TITLE);
    assert_eq!(json!(created.options), input);
    assert_eq!(flow.unique_id(), Some("default_config_filter"));
}

#[tokio::test]
async fn test_import_aborts_when_configured() {
    let mut flow = ConfigFlow::new(MockManifestSource::new(&["http"]), FixedLookup::configured());

    let result = flow
        .step_import(json!({"zeroconf": true}).as_object().cloned().unwrap())
        .await
        .unwrap();
    assert!(matches!(result, FlowResult::Abort { .. }));
}

#[tokio::test]
async fn test_malformed_input_is_an_error() {
    let mut flow = flow(&["http"]);

    let result = flow
        .step_user(Some(json!({"disabled_domains": "http"})))
        .await;
    assert!(matches!(result, Err(FlowError::InvalidInput(_))));
}

#[tokio::test]
async fn test_selecting_unofferable_domains_is_rejected() {
    let mut flow = flow(&["http", "config"]);

    let result = flow
        .step_user(Some(json!({
            "disabled_domains": ["not a domain!", "config"],
            "extra_domains": "",
        })))
        .await;
    assert!(matches!(result, Err(FlowError::InvalidInput(_))));

    let result = flow
        .step_user(Some(json!({"disabled_domains": ["config"]})))
        .await;
    assert!(matches!(result, Err(FlowError::InvalidInput(_))));

    let result = flow
        .step_user(Some(json!({"disabled_domains": ["http"]})))
        .await
        .unwrap();
    assert_eq!(json!(result.as_created().unwrap().options), json!({"http": true}));
}
