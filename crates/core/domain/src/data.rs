//! 融合领域模型
//!
//! 定义一次触发事件从多源采集到打分输出所流经的数据结构：
//! - `CategorizedData`：按数据源类别归并的采集结果
//! - `FusedRecord`：上下文 + 多源快照的融合记录（构建后不可变）
//! - `Prediction`：打分输出
//! - `RecommendationDraft`：规则产出的建议草稿

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 融合格式版本标签，随 FusedRecord 一起落库。
pub const FUSION_VERSION: &str = "v2.0-multi-source";

/// 数据源类别。
///
/// 枚举声明顺序即类别的固定遍历顺序。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceCategory {
    /// 可编程控制器（Modbus/OPC UA/EtherNet-IP/S7）
    Plc,
    /// 制造执行系统
    Mes,
    /// 企业资源系统
    Erp,
    /// 监控系统
    Scada,
    /// 时序历史库
    Historian,
}

impl SourceCategory {
    pub const ALL: [SourceCategory; 5] = [
        SourceCategory::Plc,
        SourceCategory::Mes,
        SourceCategory::Erp,
        SourceCategory::Scada,
        SourceCategory::Historian,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceCategory::Plc => "plc",
            SourceCategory::Mes => "mes",
            SourceCategory::Erp => "erp",
            SourceCategory::Scada => "scada",
            SourceCategory::Historian => "historian",
        }
    }

    pub fn parse(value: &str) -> Option<SourceCategory> {
        match value {
            "plc" => Some(SourceCategory::Plc),
            "mes" => Some(SourceCategory::Mes),
            "erp" => Some(SourceCategory::Erp),
            "scada" => Some(SourceCategory::Scada),
            "historian" => Some(SourceCategory::Historian),
            _ => None,
        }
    }
}

impl std::fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 采集字段值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    I64(i64),
    F64(f64),
    Text(String),
}

impl FieldValue {
    /// 规则评估使用的数值视图（文本字段无数值）。
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::F64(v) => Some(*v),
            FieldValue::I64(v) => Some(*v as f64),
            FieldValue::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            FieldValue::Text(_) => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::F64(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::I64(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

/// 字段名到字段值的映射（BTreeMap 保证确定性遍历顺序）。
pub type FieldMap = BTreeMap<String, FieldValue>;

/// 按类别归并的多源采集结果。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorizedData {
    pub categories: BTreeMap<SourceCategory, FieldMap>,
}

impl CategorizedData {
    pub fn new() -> Self {
        Self::default()
    }

    /// 将一个适配器的读取结果并入对应类别。
    ///
    /// 同类别字段键冲突时后写入者覆盖先写入者；调用方负责按配置
    /// 快照的适配器顺序合并，保证覆盖行为可复现。
    pub fn merge_into(&mut self, category: SourceCategory, fields: FieldMap) {
        if fields.is_empty() {
            return;
        }
        self.categories.entry(category).or_default().extend(fields);
    }

    /// 所有类别均为空（触发兜底数据的条件）。
    pub fn is_all_empty(&self) -> bool {
        self.categories.values().all(|fields| fields.is_empty())
    }

    pub fn category(&self, category: SourceCategory) -> Option<&FieldMap> {
        self.categories.get(&category)
    }

    /// 读取 PLC 类别的数值字段（建议规则和打分器的主要输入）。
    pub fn plc_field(&self, name: &str) -> Option<f64> {
        self.categories
            .get(&SourceCategory::Plc)
            .and_then(|fields| fields.get(name))
            .and_then(FieldValue::as_f64)
    }

    /// 参与合并的类别名列表（用于日志与落库元数据）。
    pub fn source_names(&self) -> Vec<&'static str> {
        self.categories
            .iter()
            .filter(|(_, fields)| !fields.is_empty())
            .map(|(category, _)| category.as_str())
            .collect()
    }
}

/// 融合记录：一次触发事件的上下文 + 多源快照。构建后不可变。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusedRecord {
    /// 扫码得到的上下文标识
    pub context_id: String,
    /// 触发设备标识
    pub device_id: String,
    /// 触发时间戳（毫秒）
    pub trigger_ts_ms: i64,
    /// 上下文元数据（来自上下文查询，整体透传）
    pub context: serde_json::Map<String, serde_json::Value>,
    /// 多源采集数据
    pub sensor_data: CategorizedData,
    /// 可选制品引用（如视频文件名）
    pub artifact_ref: Option<String>,
    /// 融合时间戳（毫秒）
    pub fusion_ts_ms: i64,
    /// 融合格式版本
    pub fusion_version: String,
}

/// 打分输出。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub model_version: String,
    /// 分类结果（如 "good" / "defective"）
    pub result: String,
    /// 置信度，构造时收敛到 [0, 1]
    pub confidence: f64,
    pub inference_ts_ms: i64,
}

impl Prediction {
    pub fn new(
        model_version: impl Into<String>,
        result: impl Into<String>,
        confidence: f64,
        inference_ts_ms: i64,
    ) -> Self {
        Self {
            model_version: model_version.into(),
            result: result.into(),
            confidence: confidence.clamp(0.0, 1.0),
            inference_ts_ms,
        }
    }
}

/// 建议草稿：规则引擎的输出，经安全校验后才成为正式建议。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationDraft {
    /// 动作类型（如 "adjust_temperature"）
    pub action_type: String,
    /// 目标参数名
    pub target_parameter: String,
    /// 当前读数
    pub current_value: Option<f64>,
    /// 建议目标值
    pub recommended_value: f64,
    /// 单位
    pub unit: String,
    /// 规则给出的理由文本
    pub reasoning: String,
    /// 置信度
    pub confidence: f64,
    /// 优先级（数值越小越紧急）
    pub priority: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_later_writer_wins() {
        let mut data = CategorizedData::new();
        let mut first = FieldMap::new();
        first.insert("temperature".to_string(), FieldValue::F64(70.0));
        let mut second = FieldMap::new();
        second.insert("temperature".to_string(), FieldValue::F64(82.5));
        data.merge_into(SourceCategory::Plc, first);
        data.merge_into(SourceCategory::Plc, second);
        assert_eq!(data.plc_field("temperature"), Some(82.5));
    }

    #[test]
    fn empty_merge_keeps_category_absent() {
        let mut data = CategorizedData::new();
        data.merge_into(SourceCategory::Mes, FieldMap::new());
        assert!(data.is_all_empty());
        assert!(data.category(SourceCategory::Mes).is_none());
    }

    #[test]
    fn category_serializes_as_snake_case_key() {
        let mut data = CategorizedData::new();
        let mut fields = FieldMap::new();
        fields.insert("oee".to_string(), FieldValue::F64(0.91));
        data.merge_into(SourceCategory::Mes, fields);
        let json = serde_json::to_value(&data).expect("serialize");
        assert!(json["categories"]["mes"]["oee"].is_number());
    }

    #[test]
    fn confidence_is_clamped() {
        let prediction = Prediction::new("v1", "good", 1.4, 0);
        assert_eq!(prediction.confidence, 1.0);
    }
}
