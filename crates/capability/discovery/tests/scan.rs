//! 网络扫描与连接验证的集成测试

use edge_adapter::{AdapterConfig, AdapterDeps};
use edge_discovery::{DiscoveryError, NetworkScanner, ProbePorts, test_connection};
use tokio::net::TcpListener;

#[tokio::test]
async fn slash_30_scan_finds_exactly_the_listening_host() {
    // 127.0.0.0/30 的可用主机为 127.0.0.1 和 127.0.0.2，
    // 只在 127.0.0.1 上开一个模拟 Modbus 监听
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let accept_loop = tokio::spawn(async move {
        loop {
            let _ = listener.accept().await;
        }
    });

    let scanner = NetworkScanner::new(500).with_ports(ProbePorts {
        modbus: port,
        ..Default::default()
    });
    let devices = scanner
        .scan_network("127.0.0.0/30", &["modbus_tcp".to_string()])
        .await
        .unwrap();

    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].ip, "127.0.0.1");
    assert_eq!(devices[0].protocol, "modbus_tcp");
    assert_eq!(devices[0].device_type, "plc");
    assert_eq!(devices[0].recommended_template, "modbus_generic");
    accept_loop.abort();
}

#[tokio::test]
async fn invalid_range_is_rejected_before_probing() {
    let scanner = NetworkScanner::new(100);
    let result = scanner.scan_network("not-a-subnet", &[]).await;
    assert!(matches!(result, Err(DiscoveryError::InvalidRange(_))));
}

#[tokio::test]
async fn unknown_protocol_filter_is_rejected() {
    let scanner = NetworkScanner::new(100);
    let result = scanner
        .scan_network("127.0.0.0/30", &["profinet".to_string()])
        .await;
    assert!(matches!(result, Err(DiscoveryError::UnknownProtocol(_))));
}

#[tokio::test]
async fn scan_of_silent_range_returns_empty_list() {
    // 192.0.2.0/30 (TEST-NET-1) 不可路由，探测全部超时
    let scanner = NetworkScanner::new(100);
    let devices = scanner
        .scan_network("192.0.2.0/30", &["opcua".to_string()])
        .await
        .unwrap();
    assert!(devices.is_empty());
}

#[tokio::test]
async fn test_connection_reads_sample_fields_without_persisting() {
    let config = AdapterConfig::from_json(
        r#"{
            "source_name": "candidate-plc",
            "category": "plc",
            "protocol": "mock",
            "field_mappings": {
                "kind": "mock",
                "values": {
                    "temperature": 72.0,
                    "vibration": 2.1,
                    "pressure": 101.0,
                    "cycle_time": 19.5
                }
            }
        }"#,
    )
    .unwrap();

    let outcome = test_connection(config, &AdapterDeps::default(), "line1-press")
        .await
        .unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.sample_data.len(), 3);
    assert!(!outcome.sample_data.contains_key("timestamp"));
}
