// SPDX-FileCopyrightText: 2026 Plexus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests: registry, bus and endpoints running together.
//!
//! Each test builds an isolated TestHarness. Tests are order-insensitive.

use std::sync::Arc;
use std::time::Duration;

use plexus_bus::Filter;
use plexus_core::{
    Category, ComponentAddress, DataRecord, Descriptor, Features, Kind, PreferenceStore,
};
use plexus_test_utils::{
    LifecycleCall, RecordingHandler, RecordingReceiver, TestHarness, eventually,
};

const WAIT: Duration = Duration::from_secs(2);

fn addr(s: &str) -> ComponentAddress {
    ComponentAddress::from(s)
}

/// Spawn A (DATA receiver) and B (ACTION), discovered in that order.
async fn two_plugin_harness() -> (TestHarness, Arc<RecordingReceiver>, Arc<RecordingHandler>) {
    let mut harness = TestHarness::builder().build().await.unwrap();
    let receiver = Arc::new(RecordingReceiver::new());
    let handler = Arc::new(RecordingHandler::new("p.B"));

    let a_receiver = receiver.clone();
    harness.spawn_plugin(Descriptor::new("A", "p.A"), move |b| b.data_receiver(a_receiver));
    let b_handler = handler.clone();
    harness.spawn_plugin(Descriptor::new("B", "p.B"), move |b| b.action(b_handler));

    for (component, expected) in [("p.A", 1), ("p.B", 2)] {
        harness.registry.identify(&addr(component));
        let registry = harness.registry.clone();
        assert!(
            eventually(WAIT, || {
                let registry = registry.clone();
                async move { registry.len().await == expected }
            })
            .await,
            "{component} was not discovered"
        );
    }
    (harness, receiver, handler)
}

#[tokio::test]
async fn plugins_are_discovered_in_response_order() {
    let (harness, _receiver, _handler) = two_plugin_harness().await;
    let entries = harness.registry.snapshot().await;
    let summary: Vec<(&str, Features, bool)> = entries
        .iter()
        .map(|d| (d.component.as_str(), d.features, d.enabled))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("p.A", Features::DATA, true),
            ("p.B", Features::ACTION, true),
        ]
    );
    harness.shutdown().await;
}

#[tokio::test]
async fn broadcast_discovery_lists_each_plugin_once() {
    let mut harness = TestHarness::builder().build().await.unwrap();
    let receiver = Arc::new(RecordingReceiver::new());
    let handler = Arc::new(RecordingHandler::new("p.B"));
    let r = receiver.clone();
    harness.spawn_plugin(Descriptor::new("A", "p.A"), move |b| b.data_receiver(r));
    let h = handler.clone();
    harness.spawn_plugin(Descriptor::new("B", "p.B"), move |b| b.action(h));

    let entries = harness.discover(2).await.unwrap();
    assert_eq!(entries.len(), 2);
    for (component, features) in [("p.A", Features::DATA), ("p.B", Features::ACTION)] {
        let matching: Vec<&Descriptor> = entries
            .iter()
            .filter(|d| d.component.as_str() == component)
            .collect();
        assert_eq!(matching.len(), 1, "{component} listed {} times", matching.len());
        assert_eq!(matching[0].features, features);
        assert!(matching[0].enabled);
    }

    assert_eq!(harness.registry.distribute_update("rpm", "900").await, 1);
    assert!(receiver.wait_for(1, WAIT).await);
    harness.shutdown().await;
}

#[tokio::test]
async fn start_request_reaches_launched_plugin() {
    let mut harness = TestHarness::builder()
        .delivering_start_requests()
        .build()
        .await
        .unwrap();
    let mut responses = harness
        .bus
        .subscribe(None, Filter::only(Kind::Identify, Category::Response));
    let sensor = harness.spawn_plugin(Descriptor::new("Sensor", "p.Sensor"), |b| b.data_provider());
    let s = addr("p.Sensor");

    // One reply to the broadcast, one to the start request.
    harness.discover(1).await.unwrap();
    for _ in 0..2 {
        tokio::time::timeout(WAIT, responses.recv())
            .await
            .expect("identify response timed out")
            .unwrap();
    }
    assert_eq!(harness.lifecycle.count(&LifecycleCall::Start(s.clone())).await, 1);
    assert_eq!(sensor.host_info().unwrap().component, harness.registry.host().component);

    let records = vec![DataRecord::new("oil", "Oil pressure", "0", "10", "bar")];
    assert!(sensor.send_data_list(&records).unwrap());
    assert!(sensor.header_sent());

    // Re-enabling starts the plugin again; the delivered request re-arms the list.
    harness.registry.set_enabled(&s, false).await;
    harness.registry.set_enabled(&s, true).await;
    tokio::time::timeout(WAIT, responses.recv())
        .await
        .expect("start request was not delivered")
        .unwrap();
    assert!(!sensor.header_sent());
    assert_eq!(harness.lifecycle.count(&LifecycleCall::Start(s.clone())).await, 2);
    assert_eq!(harness.registry.len().await, 1);

    harness.shutdown().await;
}

#[tokio::test]
async fn data_fan_out_reaches_only_enabled_data_plugins() {
    let (harness, receiver, handler) = two_plugin_harness().await;

    let issued = harness
        .registry
        .distribute_list("rpm;Engine speed;0;8000;rpm")
        .await;
    assert_eq!(issued, 1);
    assert_eq!(harness.registry.distribute_update("rpm", "2400").await, 1);
    assert!(receiver.wait_for(2, WAIT).await);

    let lists = receiver.lists().await;
    assert_eq!(lists.len(), 1);
    assert_eq!(
        lists[0],
        vec![DataRecord::new("rpm", "Engine speed", "0", "8000", "rpm")]
    );
    assert_eq!(
        receiver.updates().await,
        vec![("rpm".to_string(), "2400".to_string())]
    );
    // B only ever saw the ACTION sent when it was enabled.
    assert!(handler.wait_for_actions(1, WAIT).await);
    assert_eq!(handler.action_count(), 1);

    assert!(harness.registry.set_enabled(&addr("p.A"), false).await);
    assert_eq!(harness.registry.distribute_list("k;d;0;1;u").await, 0);
    assert_eq!(harness.registry.distribute_update("rpm", "2500").await, 0);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(receiver.deliveries().await, 2);

    harness.shutdown().await;
}

#[tokio::test]
async fn enabling_action_plugin_triggers_it() {
    let (harness, _receiver, handler) = two_plugin_harness().await;
    assert!(handler.wait_for_actions(1, WAIT).await);

    assert!(harness.registry.trigger_action(&addr("p.B")).await);
    assert!(handler.wait_for_actions(2, WAIT).await);

    // B declared no CONFIGURE; A declared no ACTION.
    assert!(!harness.registry.trigger_configure(&addr("p.B")).await);
    assert!(!harness.registry.trigger_action(&addr("p.A")).await);
    assert_eq!(handler.configure_count(), 0);

    harness.shutdown().await;
}

#[tokio::test]
async fn disable_and_reenable_drive_lifecycle() {
    let (harness, _receiver, _handler) = two_plugin_harness().await;
    let a = addr("p.A");
    assert_eq!(
        harness.lifecycle.calls_for(&a).await,
        vec![LifecycleCall::Start(a.clone()), LifecycleCall::Bind(a.clone())]
    );

    harness.lifecycle.clear().await;
    harness.registry.set_enabled(&a, false).await;
    harness.registry.set_enabled(&a, true).await;
    assert_eq!(
        harness.lifecycle.calls_for(&a).await,
        vec![
            LifecycleCall::Unbind(a.clone()),
            LifecycleCall::Stop(a.clone()),
            LifecycleCall::Start(a.clone()),
            LifecycleCall::Bind(a.clone()),
        ]
    );
    assert!(harness.preferences.get_enabled(&a, false).await.unwrap());

    harness.shutdown().await;
}

#[tokio::test]
async fn reannouncement_keeps_disabled_flag() {
    let (harness, _receiver, _handler) = two_plugin_harness().await;
    harness.registry.set_enabled(&addr("p.A"), false).await;

    harness.registry.identify_all();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(harness.registry.len().await, 2);
    assert!(!harness.registry.get(&addr("p.A")).await.unwrap().enabled);
    harness.shutdown().await;
}

#[tokio::test]
async fn stored_preference_is_applied_on_discovery() {
    let mut harness = TestHarness::builder()
        .with_sqlite()
        .with_preference("p.A", false)
        .build()
        .await
        .unwrap();
    let receiver = Arc::new(RecordingReceiver::new());
    let r = receiver.clone();
    harness.spawn_plugin(Descriptor::new("A", "p.A"), move |b| b.data_receiver(r));

    let entries = harness.discover(1).await.unwrap();
    assert!(!entries[0].enabled);
    assert_eq!(harness.registry.distribute_update("rpm", "1").await, 0);
    assert!(harness.lifecycle.calls().await.contains(&LifecycleCall::Stop(addr("p.A"))));
    harness.shutdown().await;
}

#[tokio::test]
async fn plugin_data_reaches_host_bridge() {
    let mut harness = TestHarness::builder().build().await.unwrap();
    let sensor = harness.spawn_plugin(Descriptor::new("Sensor", "p.Sensor"), |b| b.data_provider());
    let entries = harness.discover(1).await.unwrap();
    assert_eq!(entries[0].features, Features::DATALIST);

    let records = vec![DataRecord::new("coolant", "Coolant temperature", "-40", "150", "C")];
    assert!(sensor.send_data_list(&records).unwrap());
    assert!(!sensor.send_data_list(&records).unwrap());
    sensor.send_data_update("coolant", "87").unwrap();

    assert!(harness.host_receiver.wait_for(2, WAIT).await);
    assert_eq!(harness.host_receiver.lists().await, vec![records.clone()]);
    assert_eq!(
        harness.host_receiver.updates().await,
        vec![("coolant".to_string(), "87".to_string())]
    );

    // A new IDENTIFY request re-arms the one-shot data list.
    harness.registry.identify(&addr("p.Sensor"));
    let s = sensor.clone();
    assert!(eventually(WAIT, || {
        let s = s.clone();
        async move { !s.header_sent() }
    })
    .await);
    assert!(sensor.send_data_list(&records).unwrap());

    harness.shutdown().await;
}

#[tokio::test]
async fn stopped_endpoint_stays_listed() {
    let (mut harness, _receiver, _handler) = two_plugin_harness().await;
    assert!(harness.stop_plugin(&addr("p.A")).await);

    // No auto-eviction: the entry remains and fan-out still issues a message.
    assert_eq!(harness.registry.len().await, 2);
    assert_eq!(harness.registry.distribute_update("rpm", "1").await, 1);
    assert!(!harness.bus.is_reachable(&addr("p.A")));
    harness.shutdown().await;
}

#[tokio::test]
async fn shutdown_stops_all_plugins() {
    let (harness, _receiver, _handler) = two_plugin_harness().await;
    let lifecycle = harness.lifecycle.clone();
    let registry = harness.registry.clone();
    harness.shutdown().await;

    assert!(registry.is_empty().await);
    let calls = lifecycle.calls().await;
    assert!(calls.contains(&LifecycleCall::Stop(addr("p.A"))));
    assert!(calls.contains(&LifecycleCall::Stop(addr("p.B"))));
}
