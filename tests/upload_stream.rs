use futures_util::StreamExt;
use gcscli::progress;
use indicatif::ProgressBar;
use std::io::Write;

async fn stream_file(contents: &[u8]) -> (Vec<u8>, ProgressBar) {
    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.write_all(contents).unwrap();
    tmp.flush().unwrap();

    let file = tokio::fs::File::open(tmp.path()).await.unwrap();
    let bar = ProgressBar::hidden();
    bar.set_length(contents.len() as u64);

    let mut stream = progress::reader_stream(file, bar.clone());

    let mut streamed = Vec::with_capacity(contents.len());
    while let Some(chunk) = stream.next().await {
        streamed.extend_from_slice(&chunk.unwrap());
    }

    (streamed, bar)
}

#[tokio::test]
async fn streams_file_verbatim() {
    // Larger than a single chunk, and not a multiple of it
    let contents: Vec<u8> = (0..(progress::CHUNK_SIZE * 3 + 17))
        .map(|i| (i % 251) as u8)
        .collect();

    let (streamed, bar) = stream_file(&contents).await;

    assert_eq!(streamed, contents);
    assert_eq!(bar.position(), contents.len() as u64);
}

#[tokio::test]
async fn empty_file_streams_nothing() {
    let (streamed, bar) = stream_file(&[]).await;

    assert!(streamed.is_empty());
    assert_eq!(bar.position(), 0);
}
