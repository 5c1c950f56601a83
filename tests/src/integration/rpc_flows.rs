//! # RPC Flows
//!
//! Drives [`GrpcBackend`](vss_client::GrpcBackend) against the in-process
//! `kuksa.val.v1.VAL` server:
//!
//! ```text
//! test ──▶ GrpcBackend ──(Bearer header)──▶ VAL mock
//!             ▲                                │
//!             └── forwarder task ◀── stream ◀──┘
//! ```

#[cfg(test)]
mod tests {
    use crate::support::eventually;
    use crate::support::mock_val::{self, ValHandle, SERVER_NAME, SERVER_VERSION};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tokio::time::timeout;
    use vss_client::rpc::proto::{
        datapoint, DataEntry, DataType, Datapoint, EntryType, EntryUpdate, Field, Int32Array,
        SubscribeResponse, View,
    };
    use vss_client::{
        Attribute, ClientConfig, ClientError, GrpcBackend, Protocol, SignalUpdate, Subscription,
        VssBackend,
    };

    const RECV_DEADLINE: Duration = Duration::from_secs(2);

    async fn next_update(subscription: &mut Subscription) -> Option<SignalUpdate> {
        timeout(RECV_DEADLINE, subscription.updates.recv())
            .await
            .expect("no update within deadline")
    }

    async fn connected_with(config: &ClientConfig) -> GrpcBackend {
        let backend = GrpcBackend::connect(config).await.unwrap();
        backend.authorize(None).await.unwrap();
        backend
    }

    /// Authorized backend plus the usual signals
    async fn connected() -> (GrpcBackend, ValHandle) {
        let (config, server) = mock_val::start().await;
        server.add_signal(
            "Vehicle.Speed",
            DataType::Float,
            EntryType::Sensor,
            Some(datapoint::Value::Float(42.5)),
        );
        server.add_signal(
            "Vehicle.ADAS.ABS.IsEnabled",
            DataType::Boolean,
            EntryType::Actuator,
            Some(datapoint::Value::Bool(false)),
        );
        (connected_with(&config).await, server)
    }

    fn speed_update(value: f32) -> EntryUpdate {
        EntryUpdate {
            entry: Some(DataEntry {
                path: "Vehicle.Speed".into(),
                value: Some(Datapoint {
                    value: Some(datapoint::Value::Float(value)),
                }),
                ..Default::default()
            }),
            fields: vec![Field::Value as i32],
        }
    }

    // =========================================================================
    // AUTHORIZATION
    // =========================================================================

    #[tokio::test]
    async fn test_bearer_header_attached_after_authorize() {
        let (config, server) = mock_val::start().await;
        server.add_signal(
            "Vehicle.Speed",
            DataType::Float,
            EntryType::Sensor,
            Some(datapoint::Value::Float(1.0)),
        );
        let backend = GrpcBackend::connect(&config).await.unwrap();
        assert_eq!(backend.protocol(), Protocol::Grpc);

        let err = backend
            .get_value("Vehicle.Speed", Attribute::Value)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Authorization(_)), "{:?}", err);

        backend.authorize(None).await.unwrap();
        backend
            .get_value("Vehicle.Speed", Attribute::Value)
            .await
            .unwrap();

        let headers: Vec<Option<String>> =
            server.calls().into_iter().map(|c| c.authorization).collect();
        assert_eq!(
            headers,
            vec![None, Some(format!("Bearer {}", mock_val::VALID_TOKEN))]
        );
    }

    #[tokio::test]
    async fn test_server_info() {
        let (backend, _server) = connected().await;
        let (name, version) = backend.server_info().await.unwrap();
        assert_eq!(name, SERVER_NAME);
        assert_eq!(version, SERVER_VERSION);
    }

    // =========================================================================
    // GET
    // =========================================================================

    #[tokio::test]
    async fn test_get_renders_entries_as_text() {
        let (backend, server) = connected().await;
        server.add_signal(
            "Vehicle.Cabin.SeatPositions",
            DataType::Int16Array,
            EntryType::Sensor,
            Some(datapoint::Value::Int32Array(Int32Array {
                values: vec![3, -4],
            })),
        );

        assert_eq!(
            backend
                .get_value("Vehicle.Speed", Attribute::Value)
                .await
                .unwrap(),
            vec!["42.5".to_string()]
        );
        assert_eq!(
            backend
                .get_value("Vehicle.Cabin.SeatPositions", Attribute::Value)
                .await
                .unwrap(),
            vec!["[3,-4]".to_string()]
        );

        let views: Vec<View> = server.calls().iter().flat_map(|c| c.views.clone()).collect();
        assert_eq!(views, vec![View::CurrentValue, View::CurrentValue]);
    }

    #[tokio::test]
    async fn test_get_metadata_renders_json() {
        let (backend, server) = connected().await;
        server.set_unit("Vehicle.Speed", "km/h");

        let documents = backend.get_metadata("Vehicle.Speed").await.unwrap();
        assert_eq!(documents.len(), 1);
        let parsed: Value = serde_json::from_str(&documents[0]).unwrap();
        assert_eq!(
            parsed,
            json!({"Vehicle.Speed": {"datatype": "float", "type": "sensor", "unit": "km/h"}})
        );
        assert_eq!(server.calls()[0].views, vec![View::Metadata]);
    }

    #[tokio::test]
    async fn test_unknown_path_is_server_error() {
        let (backend, _server) = connected().await;

        let err = backend
            .get_value("Vehicle.Nope", Attribute::Value)
            .await
            .unwrap_err();
        match err {
            ClientError::Server(e) => {
                assert_eq!(e.code, Some(404));
                assert!(e.message.contains("Vehicle.Nope"), "{}", e.message);
            }
            other => panic!("expected server error, got {:?}", other),
        }
    }

    // =========================================================================
    // SET
    // =========================================================================

    #[tokio::test]
    async fn test_set_reads_datatype_then_encodes() {
        let (backend, server) = connected().await;

        backend
            .set_value("Vehicle.Speed", "88.5", Attribute::Value)
            .await
            .unwrap();

        assert_eq!(server.methods(), vec!["Get", "Set"]);
        assert_eq!(server.calls()[0].views, vec![View::Metadata]);

        let sets = server.sets();
        let update = &sets[0].updates[0];
        assert_eq!(update.fields, vec![Field::Value as i32]);
        let entry = update.entry.as_ref().unwrap();
        assert_eq!(
            entry.value.as_ref().unwrap().value,
            Some(datapoint::Value::Float(88.5))
        );
        assert!(entry.actuator_target.is_none());

        assert_eq!(
            backend
                .get_value("Vehicle.Speed", Attribute::Value)
                .await
                .unwrap(),
            vec!["88.5".to_string()]
        );
    }

    #[tokio::test]
    async fn test_set_target_value() {
        let (backend, server) = connected().await;
        let path = "Vehicle.ADAS.ABS.IsEnabled";

        backend
            .set_value(path, "true", Attribute::TargetValue)
            .await
            .unwrap();

        let update = &server.sets()[0].updates[0];
        assert_eq!(update.fields, vec![Field::ActuatorTarget as i32]);
        let stored = server.entry(path).unwrap();
        assert_eq!(
            stored.actuator_target.unwrap().value,
            Some(datapoint::Value::Bool(true))
        );
        // Current value untouched
        assert_eq!(stored.value.unwrap().value, Some(datapoint::Value::Bool(false)));

        assert_eq!(
            backend.get_value(path, Attribute::TargetValue).await.unwrap(),
            vec!["true".to_string()]
        );
    }

    #[tokio::test]
    async fn test_set_array_uses_element_type() {
        let (backend, server) = connected().await;
        server.add_signal(
            "Vehicle.Cabin.SeatPositions",
            DataType::Int8Array,
            EntryType::Actuator,
            None,
        );

        backend
            .set_value("Vehicle.Cabin.SeatPositions", "[1, -2]", Attribute::Value)
            .await
            .unwrap();

        let stored = server.entry("Vehicle.Cabin.SeatPositions").unwrap();
        assert_eq!(
            stored.value.unwrap().value,
            Some(datapoint::Value::Int32Array(Int32Array {
                values: vec![1, -2]
            }))
        );
    }

    #[tokio::test]
    async fn test_bad_value_fails_before_set() {
        let (backend, server) = connected().await;
        server.add_signal("Vehicle.Gear", DataType::Uint8, EntryType::Sensor, None);

        let err = backend
            .set_value("Vehicle.Gear", "300", Attribute::Value)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Parse(_)), "{:?}", err);

        let err = backend
            .set_value("Vehicle.Gear", "1", Attribute::Metadata)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::UnsupportedAttribute(_)), "{:?}", err);

        assert!(server.sets().is_empty());
        assert_eq!(server.methods(), vec!["Get"]);
    }

    // =========================================================================
    // SUBSCRIBE
    // =========================================================================

    #[tokio::test]
    async fn test_stream_updates_are_forwarded() {
        let (backend, server) = connected().await;
        let mut subscription = backend
            .subscribe("Vehicle.Speed", Attribute::Value)
            .await
            .unwrap();
        assert_eq!(backend.active_subscriptions(), 1);
        assert_eq!(server.calls()[0].views, vec![View::CurrentValue]);

        server
            .push(SubscribeResponse {
                updates: vec![speed_update(50.0)],
            })
            .await;

        let update = next_update(&mut subscription).await.unwrap();
        assert_eq!(update.path.as_deref(), Some("Vehicle.Speed"));
        assert_eq!(update.value, "50");
    }

    #[tokio::test]
    async fn test_full_queue_drops_updates() {
        let (mut config, server) = mock_val::start().await;
        config.subscription_buffer = 2;
        let backend = connected_with(&config).await;
        let mut subscription = backend
            .subscribe("Vehicle.Speed", Attribute::Value)
            .await
            .unwrap();

        // One message carrying ten updates; the forwarder hands them over
        // without yielding, so only the first two fit
        server
            .push(SubscribeResponse {
                updates: (0..10).map(|i| speed_update(i as f32)).collect(),
            })
            .await;

        assert_eq!(next_update(&mut subscription).await.unwrap().value, "0");
        assert_eq!(next_update(&mut subscription).await.unwrap().value, "1");
        assert!(subscription.updates.try_recv().is_err());

        // The stream is still live after dropping
        server
            .push(SubscribeResponse {
                updates: vec![speed_update(99.0)],
            })
            .await;
        assert_eq!(next_update(&mut subscription).await.unwrap().value, "99");
    }

    #[tokio::test]
    async fn test_unsubscribe_ends_stream_and_cancels_call() {
        let (backend, server) = connected().await;
        let mut subscription = backend
            .subscribe("Vehicle.Speed", Attribute::Value)
            .await
            .unwrap();
        assert_eq!(server.open_streams(), 1);

        backend.unsubscribe(&subscription.id).await.unwrap();

        assert_eq!(next_update(&mut subscription).await, None);
        assert_eq!(backend.active_subscriptions(), 0);
        eventually(|| server.open_streams() == 0).await;

        // Second unsubscribe is a no-op
        backend.unsubscribe(&subscription.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_server_ending_stream_releases_subscription() {
        let (backend, server) = connected().await;
        let mut subscription = backend
            .subscribe("Vehicle.Speed", Attribute::Value)
            .await
            .unwrap();
        assert_eq!(backend.active_subscriptions(), 1);

        server.end_streams();

        assert_eq!(next_update(&mut subscription).await, None);
        eventually(|| backend.active_subscriptions() == 0).await;
        backend.unsubscribe(&subscription.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_close_ends_all_streams() {
        let (backend, _server) = connected().await;
        let mut speed = backend
            .subscribe("Vehicle.Speed", Attribute::Value)
            .await
            .unwrap();
        let mut abs = backend
            .subscribe("Vehicle.ADAS.ABS.IsEnabled", Attribute::TargetValue)
            .await
            .unwrap();
        assert_eq!(backend.active_subscriptions(), 2);

        backend.close().await;

        assert_eq!(next_update(&mut speed).await, None);
        assert_eq!(next_update(&mut abs).await, None);
        assert_eq!(backend.active_subscriptions(), 0);
    }
}
