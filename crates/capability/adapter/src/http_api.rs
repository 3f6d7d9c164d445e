//! 业务系统 HTTP 适配器（MES / ERP / SCADA / Historian）
//!
//! 四类业务数据源共用同一个 HTTP 通道：共享 reqwest 客户端、
//! bearer（api_key）或 basic（用户名密码）鉴权、健康端点探活。
//! 每类有固定的业务投影：响应 JSON 中未映射的字段一律丢弃。

use crate::error::AdapterError;
use crate::traits::{ConnectBackoff, DataSourceAdapter};
use crate::types::{AdapterConfig, FieldMappings};
use async_trait::async_trait;
use domain::{FieldMap, FieldValue, SourceCategory, now_epoch_ms};
use std::time::Duration;
use tracing::{info, warn};

/// 默认聚合时间窗口（分钟）
const DEFAULT_TIME_WINDOW_MINUTES: u64 = 60;

/// 业务系统 HTTP 适配器
pub struct HttpApiAdapter {
    config: AdapterConfig,
    client: reqwest::Client,
    data_endpoint: String,
    health_endpoint: String,
    tags: Vec<String>,
    time_window_minutes: u64,
    connected: bool,
}

fn default_data_endpoint(category: SourceCategory) -> &'static str {
    match category {
        SourceCategory::Mes => "/api/production/current",
        SourceCategory::Erp => "/api/workorders",
        SourceCategory::Scada => "/api/tags/read",
        SourceCategory::Historian => "/api/history/summary",
        SourceCategory::Plc => "/api/data",
    }
}

fn identifier_param(category: SourceCategory) -> &'static str {
    match category {
        SourceCategory::Mes => "station_id",
        SourceCategory::Erp => "work_order",
        SourceCategory::Scada => "equipment_id",
        SourceCategory::Historian => "asset_id",
        SourceCategory::Plc => "device_id",
    }
}

impl HttpApiAdapter {
    pub fn new(config: AdapterConfig, client: reqwest::Client) -> Result<Self, AdapterError> {
        let FieldMappings::Http {
            data_endpoint,
            health_endpoint,
            tags,
            time_window_minutes,
        } = config.field_mappings.clone()
        else {
            return Err(AdapterError::ConfigMismatch(format!(
                "source {} is http but field_mappings are not",
                config.source_name
            )));
        };
        if config.connection.base_url.is_none() {
            return Err(AdapterError::ConfigParse(format!(
                "source {} missing base_url",
                config.source_name
            )));
        }
        let data_endpoint =
            data_endpoint.unwrap_or_else(|| default_data_endpoint(config.category).to_string());
        let health_endpoint = health_endpoint.unwrap_or_else(|| "/api/health".to_string());
        let time_window_minutes = time_window_minutes.unwrap_or(DEFAULT_TIME_WINDOW_MINUTES);
        Ok(Self {
            config,
            client,
            data_endpoint,
            health_endpoint,
            tags,
            time_window_minutes,
            connected: false,
        })
    }

    fn base_url(&self) -> &str {
        self.config
            .connection
            .base_url
            .as_deref()
            .unwrap_or_default()
    }

    fn with_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let connection = &self.config.connection;
        if let Some(api_key) = &connection.api_key {
            request.bearer_auth(api_key)
        } else if let (Some(username), Some(password)) = (&connection.username, &connection.password)
        {
            request.basic_auth(username, Some(password.as_str()))
        } else {
            request
        }
    }

    async fn probe_health(&self) -> bool {
        let url = format!("{}{}", self.base_url(), self.health_endpoint);
        let request = self
            .with_auth(self.client.get(&url))
            .timeout(Duration::from_millis(self.config.connect_timeout_ms));
        match request.send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!(
                    target: "edge.adapter",
                    source = %self.config.source_name,
                    status = %response.status(),
                    "health probe rejected"
                );
                false
            }
            Err(e) => {
                warn!(target: "edge.adapter", source = %self.config.source_name, error = %e, "health probe failed");
                false
            }
        }
    }

    async fn fetch(&self, identifier: &str) -> Result<serde_json::Value, AdapterError> {
        let url = format!("{}{}", self.base_url(), self.data_endpoint);
        let timeout = Duration::from_millis(self.config.read_timeout_ms);
        let request = if self.config.category == SourceCategory::Historian {
            // Historian 用 POST 提交聚合查询
            self.with_auth(self.client.post(&url)).timeout(timeout).json(
                &serde_json::json!({
                    "tags": self.tags,
                    "time_window_minutes": self.time_window_minutes,
                    "aggregation": "summary",
                }),
            )
        } else {
            self.with_auth(self.client.get(&url))
                .timeout(timeout)
                .query(&[(identifier_param(self.config.category), identifier)])
        };
        let response = request
            .send()
            .await
            .map_err(|e| AdapterError::Http(e.to_string()))?;
        if !response.status().is_success() {
            return Err(AdapterError::Http(format!(
                "status {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| AdapterError::Http(e.to_string()))
    }
}

fn put_str(fields: &mut FieldMap, name: &str, json: &serde_json::Value) {
    if let Some(value) = json.get(name).and_then(|v| v.as_str()) {
        fields.insert(name.to_string(), FieldValue::Text(value.to_string()));
    }
}

fn put_f64(fields: &mut FieldMap, name: &str, json: &serde_json::Value) {
    if let Some(value) = json.get(name).and_then(|v| v.as_f64()) {
        fields.insert(name.to_string(), FieldValue::F64(value));
    }
}

fn put_f64_or(fields: &mut FieldMap, name: &str, json: &serde_json::Value, default: f64) {
    let value = json.get(name).and_then(|v| v.as_f64()).unwrap_or(default);
    fields.insert(name.to_string(), FieldValue::F64(value));
}

fn put_i64_or(fields: &mut FieldMap, name: &str, json: &serde_json::Value, default: i64) {
    let value = json.get(name).and_then(|v| v.as_i64()).unwrap_or(default);
    fields.insert(name.to_string(), FieldValue::I64(value));
}

fn put_bool_or(fields: &mut FieldMap, name: &str, json: &serde_json::Value, default: bool) {
    let value = json.get(name).and_then(|v| v.as_bool()).unwrap_or(default);
    fields.insert(name.to_string(), FieldValue::Bool(value));
}

fn json_to_field(value: &serde_json::Value) -> Option<FieldValue> {
    match value {
        serde_json::Value::Bool(v) => Some(FieldValue::Bool(*v)),
        serde_json::Value::Number(n) => n.as_f64().map(FieldValue::F64),
        serde_json::Value::String(s) => Some(FieldValue::Text(s.clone())),
        _ => None,
    }
}

/// MES 生产数据投影
pub fn project_mes(json: &serde_json::Value) -> FieldMap {
    let mut fields = FieldMap::new();
    put_str(&mut fields, "work_order", json);
    put_str(&mut fields, "product_id", json);
    put_str(&mut fields, "batch_number", json);
    put_i64_or(&mut fields, "production_count", json, 0);
    put_i64_or(&mut fields, "target_count", json, 0);
    put_f64_or(&mut fields, "oee", json, 0.0);
    put_f64_or(&mut fields, "availability", json, 0.0);
    put_f64_or(&mut fields, "performance", json, 0.0);
    put_f64_or(&mut fields, "quality", json, 0.0);
    put_f64(&mut fields, "cycle_time_actual", json);
    put_f64(&mut fields, "cycle_time_target", json);
    put_i64_or(&mut fields, "downtime_minutes", json, 0);
    put_i64_or(&mut fields, "defect_count", json, 0);
    fields
}

/// ERP 工单数据投影
pub fn project_erp(json: &serde_json::Value) -> FieldMap {
    let mut fields = FieldMap::new();
    put_str(&mut fields, "work_order", json);
    put_str(&mut fields, "material_number", json);
    put_str(&mut fields, "material_description", json);
    put_str(&mut fields, "batch_number", json);
    put_str(&mut fields, "production_version", json);
    put_str(&mut fields, "bom_version", json);
    put_str(&mut fields, "routing_version", json);
    put_f64(&mut fields, "planned_quantity", json);
    if let Some(value) = json.get("unit_of_measure").and_then(|v| v.as_str()) {
        fields.insert("uom".to_string(), FieldValue::Text(value.to_string()));
    }
    put_str(&mut fields, "quality_inspection_plan", json);
    put_str(&mut fields, "supplier_code", json);
    put_f64(&mut fields, "material_cost", json);
    put_str(&mut fields, "priority", json);
    put_str(&mut fields, "planned_start_date", json);
    put_str(&mut fields, "planned_end_date", json);
    put_str(&mut fields, "customer_order", json);
    fields
}

/// SCADA 设备状态投影 + 配置标签透传
pub fn project_scada(json: &serde_json::Value, tags: &[String]) -> FieldMap {
    let mut fields = FieldMap::new();
    put_str(&mut fields, "equipment_status", json);
    put_bool_or(&mut fields, "running", json, false);
    put_bool_or(&mut fields, "alarm_active", json, false);
    put_i64_or(&mut fields, "alarm_count", json, 0);
    put_str(&mut fields, "mode", json);
    put_f64(&mut fields, "setpoint", json);
    put_f64(&mut fields, "process_value", json);
    put_f64(&mut fields, "output", json);
    for tag in tags {
        if let Some(value) = json.get(tag).and_then(json_to_field) {
            fields.insert(tag.clone(), value);
        }
    }
    fields
}

/// Historian 聚合投影：每个标签展开为 _avg/_min/_max/_stddev/_count
pub fn project_historian(
    json: &serde_json::Value,
    tags: &[String],
    time_window_minutes: u64,
) -> FieldMap {
    let mut fields = FieldMap::new();
    fields.insert(
        "time_window_minutes".to_string(),
        FieldValue::I64(time_window_minutes as i64),
    );
    let Some(tag_stats) = json.get("tags").and_then(|v| v.as_object()) else {
        return fields;
    };
    for tag in tags {
        let Some(stats) = tag_stats.get(tag) else {
            continue;
        };
        for (suffix, key) in [
            ("_avg", "average"),
            ("_min", "minimum"),
            ("_max", "maximum"),
            ("_stddev", "std_dev"),
            ("_count", "count"),
        ] {
            if let Some(value) = stats.get(key).and_then(|v| v.as_f64()) {
                fields.insert(format!("{}{}", tag, suffix), FieldValue::F64(value));
            }
        }
    }
    fields
}

#[async_trait]
impl DataSourceAdapter for HttpApiAdapter {
    fn source_name(&self) -> &str {
        &self.config.source_name
    }

    fn category(&self) -> SourceCategory {
        self.config.category
    }

    async fn connect(&mut self) -> bool {
        if self.connected {
            return true;
        }
        let source_name = self.config.source_name.clone();
        let mut backoff =
            ConnectBackoff::new(self.config.max_connect_attempts, self.config.backoff_base_ms);
        loop {
            if self.probe_health().await {
                self.connected = true;
                info!(target: "edge.adapter", source = %self.config.source_name, "http adapter connected");
                return true;
            }
            if !backoff.retry_after_failure(&source_name).await {
                return false;
            }
        }
    }

    async fn disconnect(&mut self) -> bool {
        self.connected = false;
        true
    }

    async fn read(&mut self, identifier: &str) -> FieldMap {
        if !self.connected {
            warn!(target: "edge.adapter", source = %self.config.source_name, "http read while disconnected");
            return FieldMap::new();
        }
        let json = match self.fetch(identifier).await {
            Ok(json) => json,
            Err(e) => {
                warn!(target: "edge.adapter", source = %self.config.source_name, error = %e, "http read failed");
                return FieldMap::new();
            }
        };
        let mut fields = match self.config.category {
            SourceCategory::Mes => project_mes(&json),
            SourceCategory::Erp => project_erp(&json),
            SourceCategory::Scada => project_scada(&json, &self.tags),
            SourceCategory::Historian => {
                project_historian(&json, &self.tags, self.time_window_minutes)
            }
            SourceCategory::Plc => FieldMap::new(),
        };
        if !fields.is_empty() {
            fields.insert("timestamp".to_string(), FieldValue::I64(now_epoch_ms()));
        }
        fields
    }

    fn health_check(&self) -> bool {
        self.connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mes_projection_drops_unmapped_fields() {
        let json = serde_json::json!({
            "work_order": "WO-1001",
            "production_count": 128,
            "oee": 0.87,
            "internal_secret": "nope"
        });
        let fields = project_mes(&json);
        assert_eq!(fields.get("work_order"), Some(&FieldValue::Text("WO-1001".to_string())));
        assert_eq!(fields.get("production_count"), Some(&FieldValue::I64(128)));
        assert_eq!(fields.get("oee"), Some(&FieldValue::F64(0.87)));
        assert!(!fields.contains_key("internal_secret"));
        // 缺省字段按原系统约定补零
        assert_eq!(fields.get("defect_count"), Some(&FieldValue::I64(0)));
    }

    #[test]
    fn erp_projection_renames_unit_of_measure() {
        let json = serde_json::json!({
            "work_order": "WO-1001",
            "material_number": "MAT-77",
            "unit_of_measure": "EA",
            "planned_quantity": 500.0
        });
        let fields = project_erp(&json);
        assert_eq!(fields.get("uom"), Some(&FieldValue::Text("EA".to_string())));
        assert_eq!(fields.get("planned_quantity"), Some(&FieldValue::F64(500.0)));
    }

    #[test]
    fn scada_projection_passes_configured_tags() {
        let json = serde_json::json!({
            "running": true,
            "setpoint": 75.0,
            "line1.motor.rpm": 1420.0,
            "line1.valve.open": true
        });
        let tags = vec!["line1.motor.rpm".to_string(), "line1.valve.open".to_string()];
        let fields = project_scada(&json, &tags);
        assert_eq!(fields.get("running"), Some(&FieldValue::Bool(true)));
        assert_eq!(fields.get("line1.motor.rpm"), Some(&FieldValue::F64(1420.0)));
        assert_eq!(fields.get("line1.valve.open"), Some(&FieldValue::Bool(true)));
    }

    #[test]
    fn historian_projection_expands_aggregates() {
        let json = serde_json::json!({
            "tags": {
                "temperature": {"average": 72.5, "minimum": 65.0, "maximum": 96.0, "std_dev": 4.1, "count": 360.0}
            }
        });
        let tags = vec!["temperature".to_string()];
        let fields = project_historian(&json, &tags, 60);
        assert_eq!(fields.get("temperature_avg"), Some(&FieldValue::F64(72.5)));
        assert_eq!(fields.get("temperature_max"), Some(&FieldValue::F64(96.0)));
        assert_eq!(fields.get("temperature_stddev"), Some(&FieldValue::F64(4.1)));
        assert_eq!(fields.get("time_window_minutes"), Some(&FieldValue::I64(60)));
    }
}
