//! 建议规则
//!
//! 基于 PLC 读数的阈值规则，输出建议草稿。草稿不落库，由建议服务
//! 做安全校验后才成为待审批建议。每条规则两档：临界档优先级 1，
//! 预警档优先级 2（周期时间只有单档，优先级 3）。

use domain::{FusedRecord, RecommendationDraft};

/// 对一条融合记录评估全部规则，返回建议草稿列表。
///
/// 输出顺序固定（温度、振动、压力、周期时间），同一参数最多一条。
pub fn derive_recommendations(record: &FusedRecord) -> Vec<RecommendationDraft> {
    let mut drafts = Vec::new();
    let data = &record.sensor_data;

    if let Some(t) = data.plc_field("temperature") {
        if t >= 95.0 {
            drafts.push(RecommendationDraft {
                action_type: "adjust_temperature".to_string(),
                target_parameter: "temperature".to_string(),
                current_value: Some(t),
                recommended_value: 75.0,
                unit: "celsius".to_string(),
                reasoning: format!("temperature {:.1} is critically high, reduce to safe setpoint", t),
                confidence: 0.9,
                priority: 1,
            });
        } else if t > 85.0 {
            drafts.push(RecommendationDraft {
                action_type: "adjust_temperature".to_string(),
                target_parameter: "temperature".to_string(),
                current_value: Some(t),
                recommended_value: 75.0,
                unit: "celsius".to_string(),
                reasoning: format!("temperature {:.1} is above warning threshold", t),
                confidence: 0.8,
                priority: 2,
            });
        }
    }

    if let Some(v) = data.plc_field("vibration") {
        if v >= 6.0 {
            drafts.push(RecommendationDraft {
                action_type: "reduce_speed".to_string(),
                target_parameter: "speed".to_string(),
                current_value: None,
                recommended_value: 80.0,
                unit: "percent".to_string(),
                reasoning: format!("vibration {:.2} is critically high, reduce line speed", v),
                confidence: 0.9,
                priority: 1,
            });
        } else if v > 4.0 {
            drafts.push(RecommendationDraft {
                action_type: "reduce_speed".to_string(),
                target_parameter: "speed".to_string(),
                current_value: None,
                recommended_value: 80.0,
                unit: "percent".to_string(),
                reasoning: format!("vibration {:.2} is above warning threshold", v),
                confidence: 0.8,
                priority: 2,
            });
        }
    }

    if let Some(p) = data.plc_field("pressure") {
        if p <= 75.0 {
            drafts.push(RecommendationDraft {
                action_type: "adjust_pressure".to_string(),
                target_parameter: "pressure".to_string(),
                current_value: Some(p),
                recommended_value: 100.0,
                unit: "kPa".to_string(),
                reasoning: format!("pressure {:.1} is critically low, restore to nominal", p),
                confidence: 0.9,
                priority: 1,
            });
        } else if p < 85.0 {
            drafts.push(RecommendationDraft {
                action_type: "adjust_pressure".to_string(),
                target_parameter: "pressure".to_string(),
                current_value: Some(p),
                recommended_value: 100.0,
                unit: "kPa".to_string(),
                reasoning: format!("pressure {:.1} is below warning threshold", p),
                confidence: 0.8,
                priority: 2,
            });
        }
    }

    if let Some(c) = data.plc_field("cycle_time") {
        if c > 28.0 {
            drafts.push(RecommendationDraft {
                action_type: "adjust_cycle_time".to_string(),
                target_parameter: "cycle_time".to_string(),
                current_value: Some(c),
                recommended_value: 25.0,
                unit: "seconds".to_string(),
                reasoning: format!("cycle time {:.1} is drifting above target", c),
                confidence: 0.7,
                priority: 3,
            });
        }
    }

    drafts
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
    fn critical_temperature_yields_priority_one_draft() {
        let drafts = derive_recommendations(&record_with_plc(&[("temperature", 95.0)]));
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].action_type, "adjust_temperature");
        assert_eq!(drafts[0].recommended_value, 75.0);
        assert_eq!(drafts[0].priority, 1);
    }

    #[test]
    fn warning_temperature_yields_priority_two_draft() {
        let drafts = derive_recommendations(&record_with_plc(&[("temperature", 88.0)]));
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].priority, 2);
        assert_eq!(drafts[0].confidence, 0.8);
    }

    #[test]
    fn nominal_readings_yield_no_drafts() {
        let drafts = derive_recommendations(&record_with_plc(&[
            ("temperature", 72.0),
            ("vibration", 2.0),
            ("pressure", 100.0),
            ("cycle_time", 20.0),
        ]));
        assert!(drafts.is_empty());
    }

    #[test]
    fn multiple_violations_yield_one_draft_per_parameter() {
        let drafts = derive_recommendations(&record_with_plc(&[
            ("temperature", 96.0),
            ("vibration", 6.5),
            ("pressure", 70.0),
            ("cycle_time", 30.0),
        ]));
        assert_eq!(drafts.len(), 4);
        let params: Vec<&str> = drafts.iter().map(|d| d.target_parameter.as_str()).collect();
        assert_eq!(params, ["temperature", "speed", "pressure", "cycle_time"]);
        assert!(drafts[..3].iter().all(|d| d.priority == 1));
        assert_eq!(drafts[3].priority, 3);
    }

    #[test]
    fn missing_fields_are_skipped() {
        let drafts = derive_recommendations(&record_with_plc(&[("vibration", 4.5)]));
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].action_type, "reduce_speed");
    }
}
