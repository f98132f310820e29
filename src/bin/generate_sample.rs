use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use coil_thickness::data::loader::THICKNESS_COLUMN;

const NOMINAL_MM: f64 = 0.100;
const POINTS: usize = 12;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Readings around the circumference: a slight crown (thicker on one side)
/// plus gauge noise, rounded to the meter's 5 decimals.
fn simulate_readings(rng: &mut SimpleRng) -> Vec<f64> {
    (0..POINTS)
        .map(|i| {
            let angle = std::f64::consts::TAU * i as f64 / POINTS as f64;
            let crown = 0.0015 * angle.cos();
            let v = rng.gauss(NOMINAL_MM + crown, 0.0008);
            (v * 1e5).round() / 1e5
        })
        .collect()
}

fn write_parquet(path: &str, readings: &[f64]) -> anyhow::Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("Ponto", DataType::Int64, false),
        Field::new(THICKNESS_COLUMN, DataType::Float64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from_iter_values(1..=readings.len() as i64)),
            Arc::new(Float64Array::from(readings.to_vec())),
        ],
    )?;
    let file = std::fs::File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn write_csv(path: &str, readings: &[f64]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["Ponto", THICKNESS_COLUMN])?;
    for (i, v) in readings.iter().enumerate() {
        writer.write_record([(i + 1).to_string(), format!("{v:.5}")])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let mut rng = SimpleRng::new(42);
    let readings = simulate_readings(&mut rng);

    write_parquet("sample_points.parquet", &readings)?;
    write_csv("sample_points.csv", &readings)?;

    println!(
        "Wrote {} readings around {NOMINAL_MM:.3} mm to sample_points.parquet and sample_points.csv",
        readings.len()
    );
    Ok(())
}
