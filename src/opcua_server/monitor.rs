use opcua::client::prelude::*;
use std::sync::Arc;

use crate::config::MonitorSettings;
use crate::error::SimulatorError;
use crate::sink::MonitoringSink;

/// Build the monitored item sampling the value attribute of `node_id`.
pub fn monitored_item_request(settings: &MonitorSettings, node_id: &NodeId) -> MonitoredItemCreateRequest {
    MonitoredItemCreateRequest {
        item_to_monitor: ReadValueId::from(node_id.clone()),
        monitoring_mode: MonitoringMode::Reporting,
        requested_parameters: MonitoringParameters {
            client_handle: settings.client_handle,
            sampling_interval: settings.sampling_interval_ms,
            filter: ExtensionObject::null(),
            queue_size: settings.queue_size,
            discard_oldest: settings.discard_oldest,
        },
    }
}

pub fn temperature_from(data_value: &DataValue) -> Option<i32> {
    match data_value.value {
        Some(Variant::Int32(value)) => Some(value),
        _ => None,
    }
}

/// Log a data change notification and forward its value to `sink`.
pub fn report_change(node_id: &NodeId, data_value: &DataValue, sink: &dyn MonitoringSink) -> Option<i32> {
    match temperature_from(data_value) {
        Some(value) => {
            tracing::info!("Temperature value changed: {}", value);
            sink.send(value);
            Some(value)
        }
        None => {
            tracing::warn!(
                "Data change on {} without Int32 value: {:?} (status {:?})",
                node_id,
                data_value.value,
                data_value.status
            );
            None
        }
    }
}

/// Subscribe to `node_id` on the server at `endpoint_url` and report every
/// change to `sink`.
///
/// Blocks the calling thread for as long as the session runs.
pub fn run_monitor(
    settings: MonitorSettings,
    endpoint_url: String,
    node_id: NodeId,
    sink: Arc<dyn MonitoringSink>,
) -> Result<(), SimulatorError> {
    tracing::info!("Starting temperature monitor against {}", endpoint_url);

    // Create client for the local server
    let mut client = ClientBuilder::new()
        .application_name(settings.application_name.clone())
        .application_uri(settings.application_uri.clone())
        .pki_dir(settings.pki_dir.clone())
        .create_sample_keypair(true)
        .trust_server_certs(true)
        .session_retry_limit(3)
        .client()
        .ok_or(SimulatorError::ClientConfig)?;

    // Connect anonymously without security
    let session = client.connect_to_endpoint(
        (
            endpoint_url.as_str(),
            SecurityPolicy::None.to_str(),
            MessageSecurityMode::None,
            UserTokenPolicy::anonymous(),
        ),
        IdentityToken::Anonymous,
    )?;

    {
        let session = session.read();

        // Create subscription, changes go to the sink
        let subscription_id = session.create_subscription(
            settings.publishing_interval_ms,
            settings.lifetime_count,
            settings.max_keep_alive_count,
            settings.max_notifications_per_publish,
            settings.priority,
            settings.publishing_enabled,
            DataChangeCallback::new(move |changed_monitored_items| {
                for item in changed_monitored_items.iter() {
                    report_change(&item.item_to_monitor().node_id, item.last_value(), sink.as_ref());
                }
            }),
        )?;
        tracing::info!("Created subscription {}", subscription_id);

        // Monitor the temperature value attribute
        let results = session.create_monitored_items(
            subscription_id,
            TimestampsToReturn::Both,
            &[monitored_item_request(&settings, &node_id)],
        )?;
        for result in results {
            if result.status_code.is_good() {
                tracing::info!(
                    "Monitoring {} every {} ms, queue size {}",
                    node_id,
                    result.revised_sampling_interval,
                    result.revised_queue_size
                );
            } else {
                tracing::error!("Failed to monitor {}: {}", node_id, result.status_code);
            }
        }
    }

    // Run publish cycle until the session ends
    Session::run(session);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    use crate::config::{AddressSpaceSettings, ServerSettings, ValueStrategy};
    use crate::opcua_server::address_space::{initialize, refresh_loop};
    use crate::opcua_server::server::build_server;
    use crate::simulator::{TemperatureGenerator, TemperatureRange};

    #[test]
    fn request_uses_monitor_settings() {
        let node_id = NodeId::new(2, "Simulations.Temperature");
        let request = monitored_item_request(&MonitorSettings::default(), &node_id);

        assert_eq!(request.item_to_monitor.node_id, node_id);
        assert_eq!(request.item_to_monitor.attribute_id, AttributeId::Value as u32);
        assert_eq!(request.monitoring_mode, MonitoringMode::Reporting);

        let parameters = &request.requested_parameters;
        assert_eq!(parameters.client_handle, 1);
        assert_eq!(parameters.sampling_interval, 1000.0);
        assert_eq!(parameters.queue_size, 10);
        assert!(parameters.discard_oldest);
    }

    #[test]
    fn report_change_forwards_int32() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let inner = received.clone();
        let sink = move |value: i32| inner.lock().unwrap().push(value);
        let node_id = NodeId::new(2, "Simulations.Temperature");

        let value = report_change(&node_id, &DataValue::new_now(Variant::Int32(812)), &sink);

        assert_eq!(value, Some(812));
        assert_eq!(*received.lock().unwrap(), vec![812]);
    }

    #[test]
    fn report_change_ignores_other_types() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let inner = received.clone();
        let sink = move |value: i32| inner.lock().unwrap().push(value);
        let node_id = NodeId::new(2, "Simulations.Temperature");

        assert_eq!(report_change(&node_id, &DataValue::new_now(Variant::Double(812.5)), &sink), None);
        assert_eq!(report_change(&node_id, &DataValue::null(), &sink), None);
        assert!(received.lock().unwrap().is_empty());
    }

    /// Serve the temperature variable on `port`, subscribe to it and collect
    /// the notified values until `wanted` arrived or the deadline passed.
    fn collect_notifications(port: u16, strategy: ValueStrategy, wanted: usize) -> Vec<i32> {
        let pki = tempfile::tempdir().unwrap();

        let server_settings = ServerSettings {
            port,
            pki_dir: pki.path().join("server"),
            ..ServerSettings::default()
        };
        let server = build_server(&server_settings).unwrap();
        let address_space = server.address_space();
        let nodes = initialize(
            &mut address_space.write(),
            &AddressSpaceSettings::default(),
            strategy,
            TemperatureRange::default(),
        )
        .unwrap();

        std::thread::spawn(move || server.run());

        if strategy == ValueStrategy::OnTimer {
            let address_space = address_space.clone();
            let node_id = nodes.temperature_id.clone();
            std::thread::spawn(move || {
                let runtime = tokio::runtime::Runtime::new().unwrap();
                runtime.block_on(refresh_loop(
                    address_space,
                    node_id,
                    TemperatureGenerator::new(TemperatureRange::default()),
                    200,
                ));
            });
        }

        let received = Arc::new(Mutex::new(Vec::new()));
        let inner = received.clone();
        let sink: Arc<dyn MonitoringSink> = Arc::new(move |value: i32| inner.lock().unwrap().push(value));

        let monitor_settings = MonitorSettings {
            pki_dir: pki.path().join("monitor"),
            ..MonitorSettings::default()
        };
        let endpoint_url = server_settings.local_endpoint_url();
        let temperature_id = nodes.temperature_id.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(500));
            let _ = run_monitor(monitor_settings, endpoint_url, temperature_id, sink);
        });

        let deadline = Instant::now() + Duration::from_secs(15);
        while Instant::now() < deadline && received.lock().unwrap().len() < wanted {
            std::thread::sleep(Duration::from_millis(250));
        }

        let values = received.lock().unwrap().clone();
        values
    }

    #[test]
    fn live_values_reach_the_sink() {
        let values = collect_notifications(48417, ValueStrategy::OnRead, 3);

        assert!(values.len() >= 2, "received {:?}", values);
        for value in values {
            assert!((600..1000).contains(&value), "{} out of range", value);
        }
    }

    #[test]
    fn timer_values_reach_the_sink() {
        let values = collect_notifications(48418, ValueStrategy::OnTimer, 3);

        assert!(values.len() >= 2, "received {:?}", values);
        for value in values {
            assert!((600..1000).contains(&value), "{} out of range", value);
        }
    }
}
