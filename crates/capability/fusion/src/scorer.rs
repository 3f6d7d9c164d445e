//! 打分器
//!
//! 打分器是可插拔的：引擎只依赖 `Scorer` 接口。参考实现
//! `ThresholdScorer` 用 PLC 阈值做缺陷判定，置信度随违例数量增长。

use domain::{FusedRecord, Prediction, now_epoch_ms};

/// 参考模型版本标签
pub const THRESHOLD_MODEL_VERSION: &str = "v0.3-heuristic-multisource";

/// 打分接口。纯计算，不做 I/O。
pub trait Scorer: Send + Sync {
    fn score(&self, record: &FusedRecord) -> Prediction;
}

/// 阈值打分器。
///
/// 缺陷条件（任一成立）：temperature > 90、vibration > 5.0、
/// pressure < 80、cycle_time > 30。
pub struct ThresholdScorer;

impl ThresholdScorer {
    fn violations(record: &FusedRecord) -> u32 {
        let data = &record.sensor_data;
        let mut violations = 0;
        if data.plc_field("temperature").is_some_and(|v| v > 90.0) {
            violations += 1;
        }
        if data.plc_field("vibration").is_some_and(|v| v > 5.0) {
            violations += 1;
        }
        if data.plc_field("pressure").is_some_and(|v| v < 80.0) {
            violations += 1;
        }
        if data.plc_field("cycle_time").is_some_and(|v| v > 30.0) {
            violations += 1;
        }
        violations
    }
}

impl Scorer for ThresholdScorer {
    fn score(&self, record: &FusedRecord) -> Prediction {
        let violations = Self::violations(record);
        let (result, confidence) = if violations == 0 {
            ("good", 0.92)
        } else {
            ("defective", (0.75 + 0.05 * violations as f64).min(0.95))
        };
        Prediction::new(THRESHOLD_MODEL_VERSION, result, confidence, now_epoch_ms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{CategorizedData, FUSION_VERSION, FieldMap, FieldValue, SourceCategory};

    fn record_with_plc(fields: &[(&str, f64)]) -> FusedRecord {
        let mut plc = FieldMap::new();
        for (name, value) in fields {
            plc.insert(name.to_string(), FieldValue::F64(*value));
        }
        let mut data = CategorizedData::new();
        data.merge_into(SourceCategory::Plc, plc);
        FusedRecord {
            context_id: "ctx-1".to_string(),
            device_id: "line1-press".to_string(),
            trigger_ts_ms: 0,
            context: serde_json::Map::new(),
            sensor_data: data,
            artifact_ref: None,
            fusion_ts_ms: 0,
            fusion_version: FUSION_VERSION.to_string(),
        }
    }

    #[test]
    fn nominal_readings_are_good() {
        let record = record_with_plc(&[
            ("temperature", 72.0),
            ("vibration", 2.5),
            ("pressure", 100.0),
            ("cycle_time", 20.0),
        ]);
        let prediction = ThresholdScorer.score(&record);
        assert_eq!(prediction.result, "good");
        assert!(prediction.confidence >= 0.9);
    }

    #[test]
    fn high_temperature_is_defective() {
        let record = record_with_plc(&[("temperature", 95.0)]);
        let prediction = ThresholdScorer.score(&record);
        assert_eq!(prediction.result, "defective");
    }

    #[test]
    fn low_pressure_is_defective() {
        let record = record_with_plc(&[("pressure", 70.0)]);
        let prediction = ThresholdScorer.score(&record);
        assert_eq!(prediction.result, "defective");
    }

    #[test]
    fn confidence_grows_with_violations() {
        let one = ThresholdScorer.score(&record_with_plc(&[("temperature", 95.0)]));
        let all = ThresholdScorer.score(&record_with_plc(&[
            ("temperature", 95.0),
            ("vibration", 6.5),
            ("pressure", 60.0),
            ("cycle_time", 35.0),
        ]));
        assert!(all.confidence > one.confidence);
    }
}
