use std::path::PathBuf;

use anyhow::{Context, Result};

/// Small deterministic PRNG (splitmix64), enough for reproducible sample rows.
struct SampleRng(u64);

impl SampleRng {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len() as u64) as usize]
    }
}

const FIRST_NAMES: &[&str] = &[
    "John", "Jane", "Alice", "Bob", "Carla", "Dmitri", "Emeka", "Fatima", "Goran", "Hana",
];
const CITIES: &[&str] = &["New York", "London", "Oslo", "Lima", "Nairobi", "São Paulo"];
const DEPARTMENTS: &[&str] = &["Sales", "Engineering", "Support", "Finance"];

fn main() -> Result<()> {
    env_logger::init();

    let output = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_data.csv"));
    let n_rows = 200;

    let mut rng = SampleRng(42);
    let mut writer = csv::Writer::from_path(&output)
        .with_context(|| format!("creating {}", output.display()))?;

    writer.write_record(["name", "age", "city", "department", "salary", "start_date"])?;
    for _ in 0..n_rows {
        let age = 22 + rng.below(40);
        // Some salaries are left blank to exercise missing values.
        let salary = match rng.below(20) {
            0 => String::new(),
            _ => format!("{:.2}", 35_000.0 + rng.below(90_000) as f64 + age as f64 * 250.0),
        };
        let start_date = format!(
            "{}-{:02}-{:02}",
            2010 + rng.below(15),
            1 + rng.below(12),
            1 + rng.below(28)
        );
        // A city with a comma to exercise quoting.
        let city = match rng.below(15) {
            0 => "Washington, D.C.",
            _ => rng.pick(CITIES),
        };

        let name = rng.pick(FIRST_NAMES);
        let department = rng.pick(DEPARTMENTS);
        let age = age.to_string();
        writer.write_record([
            name,
            age.as_str(),
            city,
            department,
            salary.as_str(),
            start_date.as_str(),
        ])?;
    }
    writer.flush().context("flushing sample CSV")?;

    log::info!("Wrote {n_rows} rows to {}", output.display());
    println!("Wrote {n_rows} rows to {}", output.display());
    Ok(())
}
