//! 注册器与适配器契约的集成测试

use edge_adapter::{
    AdapterConfig, AdapterDeps, AdapterError, DataSourceAdapter, OpcUaDriver, build_adapter,
    build_adapters,
};
use std::sync::Arc;

fn mock_config(source_name: &str) -> AdapterConfig {
    AdapterConfig::from_json(&format!(
        r#"{{
            "source_name": "{source_name}",
            "category": "plc",
            "protocol": "mock",
            "field_mappings": {{
                "kind": "mock",
                "values": {{"temperature": 95.0, "vibration": 2.1}}
            }}
        }}"#
    ))
    .unwrap()
}

#[tokio::test]
async fn mock_adapter_reads_configured_values() {
    let mut adapter = build_adapter(mock_config("plc-sim"), &AdapterDeps::default()).unwrap();
    assert!(adapter.connect().await);
    let fields = adapter.read("line1-press").await;
    assert_eq!(fields["temperature"].as_f64(), Some(95.0));
    assert!(fields.contains_key("timestamp"));
}

#[tokio::test]
async fn disconnect_is_idempotent() {
    let mut adapter = build_adapter(mock_config("plc-sim"), &AdapterDeps::default()).unwrap();
    assert!(adapter.connect().await);
    assert!(adapter.disconnect().await);
    assert!(adapter.disconnect().await);
    assert!(!adapter.health_check());
    // 断开后读取返回空 map
    assert!(adapter.read("line1-press").await.is_empty());
}

#[test]
fn registry_rejects_disabled_config() {
    let mut config = mock_config("plc-sim");
    config.enabled = false;
    let result = build_adapter(config, &AdapterDeps::default());
    assert!(matches!(result, Err(AdapterError::Disabled(_))));
}

#[test]
fn registry_rejects_duplicate_source_names() {
    let configs = vec![mock_config("plc-sim"), mock_config("plc-sim")];
    let result = build_adapters(configs, &AdapterDeps::default());
    assert!(matches!(result, Err(AdapterError::DuplicateSource(_))));
}

#[test]
fn registry_rejects_category_protocol_mismatch() {
    let mut config = mock_config("mes-bad");
    config.category = domain::SourceCategory::Mes;
    config.protocol = "modbus_tcp".to_string();
    let result = build_adapter(config, &AdapterDeps::default());
    assert!(matches!(result, Err(AdapterError::ConfigMismatch(_))));
}

#[test]
fn registry_requires_driver_for_driver_protocols() {
    let config = AdapterConfig::from_json(
        r#"{
            "source_name": "plc-opcua",
            "category": "plc",
            "protocol": "opcua",
            "field_mappings": {
                "kind": "opc_ua",
                "map": {"temperature": {"node_id": "ns=2;s=Temp", "data_type": "float32"}}
            }
        }"#,
    )
    .unwrap();
    let result = build_adapter(config, &AdapterDeps::default());
    assert!(matches!(result, Err(AdapterError::DriverMissing(_))));
}

struct FixedOpcUaDriver;

#[async_trait::async_trait]
impl OpcUaDriver for FixedOpcUaDriver {
    async fn connect(&self) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn read_node(&self, node_id: &str) -> Result<Vec<u8>, AdapterError> {
        match node_id {
            "ns=2;s=Temp" => Ok(91.5f32.to_be_bytes().to_vec()),
            other => Err(AdapterError::Driver(format!("unknown node {}", other))),
        }
    }

    async fn write_node(&self, _node_id: &str, _value: f64) -> Result<(), AdapterError> {
        Ok(())
    }
}

#[tokio::test]
async fn opcua_adapter_decodes_and_skips_failed_fields() {
    let config = AdapterConfig::from_json(
        r#"{
            "source_name": "plc-opcua",
            "category": "plc",
            "protocol": "opcua",
            "field_mappings": {
                "kind": "opc_ua",
                "map": {
                    "temperature": {"node_id": "ns=2;s=Temp", "data_type": "float32"},
                    "missing": {"node_id": "ns=2;s=Nope", "data_type": "float32"}
                }
            }
        }"#,
    )
    .unwrap();
    let deps = AdapterDeps {
        opcua: Some(Arc::new(FixedOpcUaDriver)),
        ..Default::default()
    };
    let mut adapter = build_adapter(config, &deps).unwrap();
    assert!(adapter.connect().await);
    let fields = adapter.read("line1-press").await;
    assert_eq!(fields["temperature"].as_f64(), Some(91.5f32 as f64));
    assert!(!fields.contains_key("missing"));
}
