use indicatif::{ProgressBar, ProgressStyle};

const SIZED_TEMPLATE: &str =
    "{msg:.bold} {percent:>3}% [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";
const UNSIZED_TEMPLATE: &str = "{msg:.bold} {spinner:.blue} {bytes} ({bytes_per_sec})";

/// Progress display for downloading `filename`. Without a known length only the running byte
/// count is shown.
pub fn download_progress(content_length: Option<u64>, filename: &str) -> ProgressBar {
    let bar = match content_length {
        Some(length) => ProgressBar::new(length).with_style(
            ProgressStyle::with_template(SIZED_TEMPLATE)
                .map(|s| s.progress_chars("=> "))
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        ),
        None => ProgressBar::new_spinner().with_style(
            ProgressStyle::with_template(UNSIZED_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        ),
    };
    bar.set_message(filename.to_string());
    bar
}
