// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the HTTP device source using wiremock.

#![cfg(feature = "http")]

use std::time::Duration;

use meshwatch_lib::engine::{EngineConfig, SyncEngine};
use meshwatch_lib::error::FetchError;
use meshwatch_lib::rules::RuleType;
use meshwatch_lib::source::{DeviceSource, HttpSource, HttpSourceBuilder};
use meshwatch_lib::types::{ConnectionType, MacAddress, PresenceState};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn source_for(server: &MockServer) -> HttpSource {
    HttpSourceBuilder::new()
        .base_url(server.uri())
        .build()
        .unwrap()
}

fn mac(s: &str) -> MacAddress {
    s.parse().unwrap()
}

async fn mount_json(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

// ============================================================================
// Snapshot Endpoint Tests
// ============================================================================

mod endpoints {
    use super::*;

    #[tokio::test]
    async fn fetch_clients() {
        let mock_server = MockServer::start().await;
        mount_json(
            &mock_server,
            "/clients",
            serde_json::json!({
                "clients": {
                    "aa:bb:cc:dd:ee:01": {
                        "ip": "192.168.1.20",
                        "name": "Phone",
                        "isWL": 1,
                        "isOnline": "1"
                    },
                    "aa:bb:cc:dd:ee:02": {"isWL": 0, "isOnline": "0"}
                }
            }),
        )
        .await;

        let clients = source_for(&mock_server).fetch_clients().await.unwrap();

        assert_eq!(clients.len(), 2);
        let phone = &clients[&mac("aa:bb:cc:dd:ee:01")];
        assert_eq!(phone.name.as_deref(), Some("Phone"));
        assert_eq!(phone.connection_type, ConnectionType::Wlan);
        assert_eq!(phone.state, PresenceState::Connected);
        assert_eq!(
            clients[&mac("aa:bb:cc:dd:ee:02")].state,
            PresenceState::Disconnected
        );
    }

    #[tokio::test]
    async fn fetch_nodes() {
        let mock_server = MockServer::start().await;
        mount_json(
            &mock_server,
            "/nodes",
            serde_json::json!({
                "aa:bb:cc:dd:ee:10": {"alias": "Living room", "role": "router", "online": true},
                "aa:bb:cc:dd:ee:11": {"model": "RP-AX56", "online": false}
            }),
        )
        .await;

        let nodes = source_for(&mock_server).fetch_nodes().await.unwrap();

        assert_eq!(nodes.len(), 2);
        assert!(nodes[&mac("aa:bb:cc:dd:ee:10")].online);
        assert!(!nodes[&mac("aa:bb:cc:dd:ee:11")].online);
    }

    #[tokio::test]
    async fn fetch_rules() {
        let mock_server = MockServer::start().await;
        mount_json(
            &mock_server,
            "/rules",
            serde_json::json!({
                "rules": {
                    "aa:bb:cc:dd:ee:01": {"name": "Kids tablet", "type": 2},
                    "aa:bb:cc:dd:ee:02": {"type": "time", "timemap": "W03E21000700"}
                }
            }),
        )
        .await;

        let rules = source_for(&mock_server).fetch_rules().await.unwrap();

        assert_eq!(rules.rules.len(), 2);
        assert_eq!(
            rules.rules["aa:bb:cc:dd:ee:01"].rule_type,
            RuleType::Block
        );
        assert_eq!(
            rules.rules["aa:bb:cc:dd:ee:02"].timemap.as_deref(),
            Some("W03E21000700")
        );
    }

    #[tokio::test]
    async fn fetch_available_groups() {
        let mock_server = MockServer::start().await;
        mount_json(
            &mock_server,
            "/groups",
            serde_json::json!({
                "cpu": {"sensors": ["cpu1_usage", "cpu2_usage"], "method": "get_cpu_usage"},
                "devices": {"sensors": ["count"], "method": "get_clients"}
            }),
        )
        .await;

        let groups = source_for(&mock_server)
            .fetch_available_sensor_groups()
            .await
            .unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups["cpu"].poll_method, "get_cpu_usage");
        assert_eq!(groups["cpu"].sensor_keys.len(), 2);
    }

    #[tokio::test]
    async fn fetch_sensor_group_passes_method() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/groups/cpu"))
            .and(query_param("method", "get_cpu_usage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "cpu1_usage": 12,
                "cpu2_usage": 7
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let values = source_for(&mock_server)
            .fetch_sensor_group("cpu", "get_cpu_usage")
            .await
            .unwrap();

        assert_eq!(values.get("cpu1_usage"), Some(&serde_json::json!(12)));
    }
}

// ============================================================================
// Transport Error Tests
// ============================================================================

mod errors {
    use super::*;

    #[tokio::test]
    async fn unauthorized_maps_to_authentication_failed() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&mock_server)
            .await;

        let err = source_for(&mock_server).fetch_clients().await.unwrap_err();

        assert!(matches!(err, FetchError::AuthenticationFailed));
    }

    #[tokio::test]
    async fn server_error_maps_to_connection_failed() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let err = source_for(&mock_server).fetch_nodes().await.unwrap_err();

        match err {
            FetchError::ConnectionFailed(message) => {
                assert_eq!(message, "HTTP 500 - Internal Server Error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_object_body_is_a_parse_error() {
        let mock_server = MockServer::start().await;
        mount_json(&mock_server, "/rules", serde_json::json!([1, 2, 3])).await;

        let err = source_for(&mock_server).fetch_rules().await.unwrap_err();

        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[tokio::test]
    async fn slow_response_times_out() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;

        let source = HttpSourceBuilder::new()
            .base_url(mock_server.uri())
            .timeout(Duration::from_millis(100))
            .build()
            .unwrap();

        let err = source.fetch_clients().await.unwrap_err();

        assert!(matches!(err, FetchError::Timeout(100)));
    }

    #[test]
    fn builder_requires_base_url() {
        let result = HttpSourceBuilder::new().build();
        assert!(matches!(result, Err(FetchError::ConnectionFailed(_))));
    }
}

// ============================================================================
// Authentication Tests
// ============================================================================

mod authentication {
    use super::*;

    #[tokio::test]
    async fn credentials_are_sent_as_basic_auth() {
        let mock_server = MockServer::start().await;
        // admin:secret
        Mock::given(method("GET"))
            .and(path("/clients"))
            .and(header("authorization", "Basic YWRtaW46c2VjcmV0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let source = HttpSourceBuilder::new()
            .base_url(mock_server.uri())
            .credentials("admin", "secret")
            .build()
            .unwrap();

        let clients = source.fetch_clients().await.unwrap();
        assert!(clients.is_empty());
    }
}

// ============================================================================
// Engine Over HTTP Tests
// ============================================================================

mod engine {
    use super::*;

    #[tokio::test]
    async fn engine_reconciles_http_snapshots() {
        let mock_server = MockServer::start().await;
        mount_json(
            &mock_server,
            "/clients",
            serde_json::json!({
                "aa:bb:cc:dd:ee:01": {"name": "Phone", "isWL": 2, "isOnline": true}
            }),
        )
        .await;
        mount_json(
            &mock_server,
            "/nodes",
            serde_json::json!({"aa:bb:cc:dd:ee:10": {"alias": "Office", "online": true}}),
        )
        .await;
        mount_json(
            &mock_server,
            "/rules",
            serde_json::json!({"aa:bb:cc:dd:ee:01": {"type": 1}}),
        )
        .await;

        let engine = SyncEngine::new(source_for(&mock_server), EngineConfig::default()).unwrap();
        let outcome = engine.poll().await;

        assert!(outcome.is_reconciled());
        assert_eq!(engine.current_clients().len(), 1);
        assert_eq!(engine.current_nodes()[0].display_name(), "Office");
        assert_eq!(engine.current_rules()[0].rule_type, RuleType::Time);
        assert!(engine.is_available());
    }

    #[tokio::test]
    async fn engine_reports_unreachable_router() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let engine = SyncEngine::new(source_for(&mock_server), EngineConfig::default()).unwrap();
        let outcome = engine.poll().await;

        assert!(!outcome.is_reconciled());
        assert!(!engine.is_available());
    }
}
