use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use wbplot::data::model::{N_VERTICES_BILATERAL, N_VERTICES_LEFT};
use wbplot::data::parcellation::GLASSER;

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
}

/// Smooth anterior→posterior gradient with noise, one value per region.
fn parcel_values(rng: &mut SimpleRng) -> Vec<f64> {
    let half = GLASSER.n_regions / 2;
    (0..GLASSER.n_regions)
        .map(|i| {
            let pos = (i % half) as f64 / half as f64;
            (0.8 * pos + 0.2 * rng.next_f64()).clamp(0.0, 1.0)
        })
        .collect()
}

/// Two sinusoids over the vertex index, different per hemisphere.
fn dense_values(rng: &mut SimpleRng) -> Vec<f64> {
    (0..N_VERTICES_BILATERAL)
        .map(|i| {
            let (freq, idx) = if i < N_VERTICES_LEFT {
                (3.0, i)
            } else {
                (5.0, i - N_VERTICES_LEFT)
            };
            let phase = idx as f64 / N_VERTICES_LEFT as f64 * std::f64::consts::TAU * freq;
            phase.sin() + 0.1 * (rng.next_f64() - 0.5)
        })
        .collect()
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);

    // Parcel scalars → Parquet
    let pscalars = parcel_values(&mut rng);
    let schema = Arc::new(Schema::new(vec![
        Field::new("region", DataType::Int64, false),
        Field::new("value", DataType::Float64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from_iter_values(1..=pscalars.len() as i64)),
            Arc::new(Float64Array::from(pscalars.clone())),
        ],
    )
    .context("building record batch")?;

    let parquet_path = "sample_pscalars.parquet";
    let file = std::fs::File::create(parquet_path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    println!("Wrote {} Glasser parcel scalars to {parquet_path}", pscalars.len());

    // Dense scalars → CSV
    let dscalars = dense_values(&mut rng);
    let csv_path = "sample_dscalars.csv";
    let mut csv = csv::Writer::from_path(csv_path).context("creating CSV file")?;
    csv.write_record(["value"])?;
    for v in &dscalars {
        csv.write_record([format!("{v:.6}")])?;
    }
    csv.flush()?;
    println!("Wrote {} dense scalars to {csv_path}", dscalars.len());

    Ok(())
}
