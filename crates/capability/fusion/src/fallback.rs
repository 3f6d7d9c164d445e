//! 兜底数据生成
//!
//! 所有数据源都读不到数据时，生成带合理分布的模拟快照，让下游流程
//! 在断网或演示环境下仍可走通。生成的数据只用于标记了
//! `mock_fallback` 的记录，不会与真实读数混合。

use domain::{CategorizedData, FieldMap, FieldValue, SourceCategory};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// 兜底数据生成器。内部持有独立 RNG，可注入种子以便测试复现。
pub struct FallbackGenerator {
    rng: Mutex<StdRng>,
}

impl FallbackGenerator {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// 生成一份覆盖 PLC / MES / ERP 类别的模拟快照。
    pub fn generate(&self) -> CategorizedData {
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        // 区间取在正常工况内，离群采样不得越过打分阈值
        let mut plc = FieldMap::new();
        plc.insert(
            "temperature".into(),
            round2(gauss_in(&mut rng, 72.0, 8.0, 55.0, 88.0)).into(),
        );
        plc.insert(
            "vibration".into(),
            round2(gauss_in(&mut rng, 2.5, 0.8, 0.5, 4.5)).into(),
        );
        plc.insert(
            "pressure".into(),
            round2(gauss_in(&mut rng, 100.0, 5.0, 85.0, 115.0)).into(),
        );
        plc.insert(
            "humidity".into(),
            round2(gauss_in(&mut rng, 45.0, 10.0, 20.0, 70.0)).into(),
        );
        plc.insert(
            "cycle_time".into(),
            round2(gauss_in(&mut rng, 20.0, 3.0, 12.0, 28.0)).into(),
        );

        let mut mes = FieldMap::new();
        mes.insert(
            "work_order".into(),
            format!("WO-{}", rng.gen_range(10000..=99999)).into(),
        );
        mes.insert(
            "production_count".into(),
            FieldValue::I64(rng.gen_range(50..=200)),
        );
        mes.insert("oee".into(), round2(rng.gen_range(0.75..0.95)).into());

        let mut erp = FieldMap::new();
        erp.insert(
            "material_number".into(),
            format!("MAT-{}", rng.gen_range(1000..=9999)).into(),
        );
        erp.insert(
            "batch_number".into(),
            format!("BATCH-{}", rng.gen_range(100..=999)).into(),
        );

        let mut data = CategorizedData::new();
        data.merge_into(SourceCategory::Plc, plc);
        data.merge_into(SourceCategory::Mes, mes);
        data.merge_into(SourceCategory::Erp, erp);
        data
    }
}

impl Default for FallbackGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Box-Muller 正态采样，截断到 [min, max]。
fn gauss_in(rng: &mut StdRng, mean: f64, std_dev: f64, min: f64, max: f64) -> f64 {
    let u1: f64 = 1.0 - rng.r#gen::<f64>();
    let u2: f64 = rng.r#gen();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    (mean + std_dev * z).clamp(min, max)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_snapshot_covers_expected_fields() {
        let generator = FallbackGenerator::with_seed(42);
        let data = generator.generate();
        assert!(!data.is_all_empty());
        assert!(data.plc_field("temperature").is_some());
        assert!(data.plc_field("cycle_time").is_some());
        let mes = data.category(SourceCategory::Mes).unwrap();
        assert!(matches!(mes.get("work_order"), Some(FieldValue::Text(_))));
        let erp = data.category(SourceCategory::Erp).unwrap();
        assert!(matches!(erp.get("batch_number"), Some(FieldValue::Text(_))));
    }

    #[test]
    fn generated_values_never_cross_defect_thresholds() {
        for seed in 0..200 {
            let data = FallbackGenerator::with_seed(seed).generate();
            let temperature = data.plc_field("temperature").unwrap();
            assert!((55.0..=90.0).contains(&temperature), "temperature {temperature}");
            let vibration = data.plc_field("vibration").unwrap();
            assert!((0.0..=5.0).contains(&vibration), "vibration {vibration}");
            let pressure = data.plc_field("pressure").unwrap();
            assert!((80.0..=120.0).contains(&pressure), "pressure {pressure}");
            let cycle_time = data.plc_field("cycle_time").unwrap();
            assert!((0.0..=30.0).contains(&cycle_time), "cycle_time {cycle_time}");
        }
    }

    #[test]
    fn seeded_generator_is_reproducible() {
        let a = FallbackGenerator::with_seed(7).generate();
        let b = FallbackGenerator::with_seed(7).generate();
        assert_eq!(a, b);
    }
}
