/// Data layer: core types, CSV codec, uploading, filtering and statistics.
///
/// Architecture:
/// ```text
///   uploaded .csv
///        │
///        ▼
///   ┌──────────┐
///   │  upload   │  extension gate, worker-thread read → PendingUpload
///   └──────────┘
///        │ bytes
///        ▼
///   ┌──────────┐
///   │  codec    │  decode → Dataset            encode ← filtered rows
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  model    │  Vec<DataRow>, columns, unique-value index
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐      ┌──────────┐
///   │  filter   │ ───▶ │  stats    │  column summaries, KPIs
///   └──────────┘      └──────────┘
/// ```

pub mod codec;
pub mod filter;
pub mod model;
pub mod stats;
pub mod upload;
