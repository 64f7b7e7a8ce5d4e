pub mod peaks;

pub use peaks::{detect_filtered_peaks, detect_peaks, filter_min_interval};
