/// データ保存モジュール
pub mod scan_writer;

pub use scan_writer::{read_scan_file, ScanRow, ScanWriter, StorageError};
