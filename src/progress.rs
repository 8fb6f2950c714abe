use indicatif::{ProgressBar, ProgressBarIter, ProgressStyle};
use tokio_util::io::ReaderStream;

/// Size of each chunk read from disk and handed to the HTTP body
pub const CHUNK_SIZE: usize = 64 * 1024;

const BYTES_TEMPLATE: &str =
    "{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})";

/// Creates a progress bar for a single transfer of `total_bytes`
pub fn bytes_bar(total_bytes: u64, msg: &'static str) -> ProgressBar {
    let style = ProgressStyle::with_template(BYTES_TEMPLATE)
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());

    ProgressBar::new(total_bytes)
        .with_style(style)
        .with_message(msg)
}

/// Turns a reader into a stream of chunks, advancing `bar` by every byte read
pub fn reader_stream<R>(reader: R, bar: ProgressBar) -> ReaderStream<ProgressBarIter<R>>
where
    R: tokio::io::AsyncRead + Unpin,
{
    ReaderStream::with_capacity(bar.wrap_async_read(reader), CHUNK_SIZE)
}

/// Formats a byte count with binary prefixes, eg. `1.5 MiB`
pub fn human_bytes(bytes: u64) -> String {
    use number_prefix::NumberPrefix;

    match NumberPrefix::binary(bytes as f64) {
        NumberPrefix::Standalone(b) => format!("{b} B"),
        NumberPrefix::Prefixed(prefix, n) => format!("{n:.1} {prefix}B"),
    }
}
